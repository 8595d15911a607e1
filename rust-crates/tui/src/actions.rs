//! Issues state-changing calls. Every action checks its preconditions
//! locally before touching the network, surfaces the pending hash as soon as
//! the node accepts the submission, and treats a non-success receipt as an
//! error. Callers re-aggregate from chain state after confirmation; nothing
//! here mutates local state.

use crate::{
    aggregator::EventSummary,
    rules::PermissionSet,
};
use alloy::primitives::{
    Address,
    U256,
};
use color_eyre::eyre::{
    Result,
    ensure,
    eyre,
};
use deployments::TokenConfig;
use raffyl_abi::{
    boundary::{
        ContractGateway,
        EventWriter,
        FactoryWriter,
        PendingTx,
        TokenReader,
        TokenWriter,
        TxStatus,
    },
    parse_token_amount,
};
use std::str::FromStr;
use tracing::info;

pub async fn register<G: ContractGateway>(
    gateway: &G,
    event: Address,
    permissions: &PermissionSet,
) -> Result<impl PendingTx + use<G>> {
    ensure!(
        permissions.can_register,
        "registration is closed for this event"
    );
    let writer = gateway.event_writer(event).map_err(|e| eyre!(e))?;
    writer.register().await.map_err(|e| eyre!(e))
}

/// Funds an event with its full prize amount. For a token-denominated prize
/// the current allowance is checked first and, when short, an approval is
/// submitted and confirmed strictly before the funding call: the funding
/// transaction depends on the approval's on-chain effect.
pub async fn fund_event<G: ContractGateway>(
    gateway: &G,
    event: &EventSummary,
    permissions: &PermissionSet,
) -> Result<impl PendingTx + use<G>> {
    ensure!(
        permissions.can_fund,
        "only the organizer of an unfunded event can fund it"
    );
    let caller = gateway
        .caller()
        .ok_or_else(|| eyre!("no signing wallet is connected"))?;
    let amount = event.prize_amount;
    let writer = gateway.event_writer(event.address).map_err(|e| eyre!(e))?;

    if event.is_native_prize() {
        return writer.fund_event(amount, Some(amount)).await.map_err(|e| eyre!(e));
    }

    let token = gateway.token_reader(event.token_address);
    let allowance = token
        .allowance(caller, event.address)
        .await
        .map_err(|e| eyre!(e))?;
    if allowance < amount {
        info!(event = %event.address, %allowance, %amount, "raising token allowance before funding");
        let token_writer =
            gateway.token_writer(event.token_address).map_err(|e| eyre!(e))?;
        let approval = token_writer
            .approve(event.address, amount)
            .await
            .map_err(|e| eyre!(e))?;
        let status = approval.confirm().await.map_err(|e| eyre!(e))?;
        ensure!(
            status.success,
            "token approval {} reverted on-chain",
            status.hash
        );
    }

    writer.fund_event(amount, None).await.map_err(|e| eyre!(e))
}

pub async fn select_winners<G: ContractGateway>(
    gateway: &G,
    event: Address,
    permissions: &PermissionSet,
) -> Result<impl PendingTx + use<G>> {
    ensure!(
        permissions.can_select_winners,
        "winner selection needs an open event with enough participants"
    );
    let writer = gateway.event_writer(event).map_err(|e| eyre!(e))?;
    writer.select_winners().await.map_err(|e| eyre!(e))
}

pub async fn disburse_prizes<G: ContractGateway>(
    gateway: &G,
    event: Address,
    permissions: &PermissionSet,
) -> Result<impl PendingTx + use<G>> {
    ensure!(
        permissions.can_disburse,
        "prizes can only be disbursed from a funded event with selected winners"
    );
    let writer = gateway.event_writer(event).map_err(|e| eyre!(e))?;
    writer.disburse_prizes().await.map_err(|e| eyre!(e))
}

pub async fn withdraw_balance<G: ContractGateway>(
    gateway: &G,
    event: Address,
    permissions: &PermissionSet,
) -> Result<impl PendingTx + use<G>> {
    ensure!(
        permissions.can_withdraw,
        "withdrawal needs a completed, funded event with a residual balance"
    );
    let writer = gateway.event_writer(event).map_err(|e| eyre!(e))?;
    writer.withdraw_balance().await.map_err(|e| eyre!(e))
}

#[derive(Clone, Debug)]
pub struct CreateEventRequest {
    pub name: String,
    pub token: TokenConfig,
    pub prize_amount: String,
    pub winner_count: u64,
}

pub async fn create_event<G: ContractGateway>(
    gateway: &G,
    request: &CreateEventRequest,
) -> Result<impl PendingTx + use<G>> {
    let name = request.name.trim();
    ensure!(!name.is_empty(), "event name is required");
    ensure!(
        (1..=100).contains(&request.winner_count),
        "winner count must be between 1 and 100"
    );
    let amount = parse_token_amount(&request.prize_amount, request.token.decimals)
        .map_err(|e| eyre!(e))?;
    ensure!(amount > U256::ZERO, "prize amount must be greater than 0");
    let token_address = Address::from_str(&request.token.address)
        .map_err(|e| eyre!("token table holds an invalid address: {e}"))?;

    let factory = gateway.factory_writer().map_err(|e| eyre!(e))?;
    factory
        .create_event(name.to_string(), token_address, amount, request.winner_count)
        .await
        .map_err(|e| eyre!(e))
}

/// Awaits block inclusion and converts a failure receipt into an error.
pub async fn confirm<T: PendingTx>(tx: T) -> Result<TxStatus> {
    let status = tx.confirm().await.map_err(|e| eyre!(e))?;
    ensure!(
        status.success,
        "transaction {} reverted on-chain",
        status.hash
    );
    Ok(status)
}
