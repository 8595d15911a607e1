//! Reads one or many event contracts and normalizes them into the display
//! model. Reads within one event run concurrently and only the fully
//! resolved summary is published; a failing event is dropped from the batch
//! so one bad contract cannot take down a listing.

use crate::rules::EventState;
use alloy::primitives::{
    Address,
    U256,
};
use color_eyre::eyre::{
    Result,
    eyre,
};
use deployments::TokenTable;
use futures::future::join_all;
use raffyl_abi::boundary::{
    ContractGateway,
    EventReader,
    FactoryReader,
    NATIVE_TOKEN,
    TokenReader,
};
use tracing::{
    error,
    warn,
};

const FALLBACK_TOKEN_SYMBOL: &str = "TOKEN";
const DEFAULT_TOKEN_DECIMALS: u8 = 18;

#[derive(Clone, Debug)]
pub struct EventSummary {
    pub address: Address,
    pub name: String,
    pub organizer: Address,
    pub token_address: Address,
    pub prize_amount: U256,
    pub winner_count: u64,
    pub state: EventState,
    pub is_funded: bool,
    pub participants: Vec<Address>,
    pub winners: Vec<Address>,
    pub contract_balance: U256,
    pub is_user_registered: bool,
    pub is_user_winner: bool,
    pub token_symbol: String,
    pub token_decimals: u8,
}

impl EventSummary {
    pub fn participant_count(&self) -> u64 {
        self.participants.len() as u64
    }

    pub fn is_native_prize(&self) -> bool {
        self.token_address == NATIVE_TOKEN
    }

    pub fn prize_per_winner(&self) -> U256 {
        if self.winner_count == 0 {
            self.prize_amount
        } else {
            self.prize_amount / U256::from(self.winner_count)
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventSource {
    All,
    Organizer(Address),
}

/// Loads and normalizes every event the source names. Individual event
/// failures are logged and skipped; the listing is sorted actionable-first
/// (ascending lifecycle state, then name).
pub async fn load_events<G: ContractGateway>(
    gateway: &G,
    source: EventSource,
    viewer: Option<Address>,
    tokens: &TokenTable,
) -> Result<Vec<EventSummary>> {
    let factory = gateway.factory_reader();
    let addresses = match source {
        EventSource::All => factory.all_events().await,
        EventSource::Organizer(organizer) => {
            factory.events_by_organizer(organizer).await
        }
    }
    .map_err(|e| eyre!(e))?;

    let loads = addresses
        .iter()
        .map(|address| load_event(gateway, *address, viewer, tokens));
    let mut events: Vec<EventSummary> = join_all(loads)
        .await
        .into_iter()
        .zip(addresses)
        .filter_map(|(result, address)| match result {
            Ok(event) => Some(event),
            Err(err) => {
                error!(%address, %err, "dropping event that failed to load");
                None
            }
        })
        .collect();

    events.sort_by(|a, b| a.state.cmp(&b.state).then_with(|| a.name.cmp(&b.name)));
    Ok(events)
}

pub async fn load_event<G: ContractGateway>(
    gateway: &G,
    address: Address,
    viewer: Option<Address>,
    tokens: &TokenTable,
) -> Result<EventSummary> {
    let reader = gateway.event_reader(address);
    let (info, contract_balance, participants, winners) = tokio::try_join!(
        reader.info(),
        reader.contract_balance(),
        reader.participants(),
        reader.winners(),
    )
    .map_err(|e| eyre!(e))?;

    let (is_user_registered, is_user_winner) = match viewer {
        Some(viewer) => {
            tokio::try_join!(reader.is_registered(viewer), reader.is_winner(viewer))
                .map_err(|e| eyre!(e))?
        }
        None => (false, false),
    };

    let state = EventState::from_raw(info.state).ok_or_else(|| {
        eyre!("event {address} reports unknown lifecycle state {}", info.state)
    })?;
    let (token_symbol, token_decimals) =
        resolve_token_metadata(gateway, info.token_address, tokens).await;

    Ok(EventSummary {
        address,
        name: info.name,
        organizer: info.organizer,
        token_address: info.token_address,
        prize_amount: info.prize_amount,
        winner_count: info.winner_count,
        state,
        is_funded: info.is_funded,
        participants,
        winners,
        contract_balance,
        is_user_registered,
        is_user_winner,
        token_symbol,
        token_decimals,
    })
}

/// Known-token table first (no round trip for well-known tokens), then a
/// live metadata read; a non-standard or unresponsive token degrades to
/// placeholders rather than failing the whole event.
async fn resolve_token_metadata<G: ContractGateway>(
    gateway: &G,
    token: Address,
    tokens: &TokenTable,
) -> (String, u8) {
    if let Some(known) = tokens.by_address(&token.to_string()) {
        return (known.symbol.clone(), known.decimals);
    }
    if token == NATIVE_TOKEN {
        return ("ETH".to_string(), DEFAULT_TOKEN_DECIMALS);
    }

    let reader = gateway.token_reader(token);
    match tokio::try_join!(reader.symbol(), reader.decimals()) {
        Ok((symbol, decimals)) => (symbol, decimals),
        Err(err) => {
            warn!(%token, %err, "token metadata unavailable; using placeholders");
            (FALLBACK_TOKEN_SYMBOL.to_string(), DEFAULT_TOKEN_DECIMALS)
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use raffyl_abi::test_helpers::{
        MockChain,
        addr,
    };

    #[tokio::test]
    async fn load_event__prefers_the_known_token_table_over_live_reads() {
        // given: a token whose live metadata reads always fail, but which is
        // listed in the table
        let chain = MockChain::new();
        let token = chain.add_token("XYZ", 9);
        chain.set_fail_token_metadata(token, true);
        let event =
            chain.add_event("Tabled", addr(1), token, U256::from(10u64), 1);
        let table = TokenTable::from_tokens(vec![deployments::TokenConfig {
            symbol: "XYZ".to_string(),
            name: "Xyz Coin".to_string(),
            address: token.to_string(),
            decimals: 9,
        }]);

        // when
        let summary = load_event(&chain.gateway(None), event, None, &table)
            .await
            .unwrap();

        // then
        assert_eq!(summary.token_symbol, "XYZ");
        assert_eq!(summary.token_decimals, 9);
    }

    #[tokio::test]
    async fn load_event__substitutes_placeholders_for_broken_tokens() {
        // given: an unknown token whose metadata reads fail
        let chain = MockChain::new();
        let token = chain.add_token("BAD", 6);
        chain.set_fail_token_metadata(token, true);
        let event =
            chain.add_event("Broken", addr(1), token, U256::from(10u64), 1);

        // when
        let summary =
            load_event(&chain.gateway(None), event, None, &TokenTable::builtin())
                .await
                .unwrap();

        // then
        assert_eq!(summary.token_symbol, FALLBACK_TOKEN_SYMBOL);
        assert_eq!(summary.token_decimals, DEFAULT_TOKEN_DECIMALS);
    }

    #[tokio::test]
    async fn load_event__native_prize_resolves_without_token_reads() {
        // given: the zero-address sentinel as the prize token
        let chain = MockChain::new();
        let event = chain.add_event(
            "Native",
            addr(1),
            alloy::primitives::Address::ZERO,
            U256::from(10u64),
            1,
        );

        // when
        let summary =
            load_event(&chain.gateway(None), event, None, &TokenTable::builtin())
                .await
                .unwrap();

        // then
        assert!(summary.is_native_prize());
        assert_eq!(summary.token_symbol, "ETH");
        assert_eq!(summary.token_decimals, 18);
    }
}
