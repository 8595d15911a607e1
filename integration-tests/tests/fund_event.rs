#![allow(non_snake_case)]

use alloy::primitives::{
    Address,
    U256,
};
use deployments::TokenTable;
use raffyl::{
    actions,
    aggregator,
    rules,
};
use raffyl_abi::test_helpers::{
    ChainOp,
    OpRecord,
    TestContext,
};

async fn organizer_view(
    ctx: &TestContext,
) -> (raffyl::aggregator::EventSummary, raffyl::rules::PermissionSet) {
    let summary = aggregator::load_event(
        &ctx.organizer_gateway(),
        ctx.event,
        Some(ctx.organizer),
        &TokenTable::builtin(),
    )
    .await
    .unwrap();
    let permissions = rules::permissions(&summary, Some(ctx.organizer));
    (summary, permissions)
}

fn ops(records: &[OpRecord]) -> Vec<&OpRecord> {
    records
        .iter()
        .filter(|record| {
            !matches!(
                record,
                OpRecord::Submitted(ChainOp::Register { .. })
                    | OpRecord::Confirmed(ChainOp::Register { .. })
            )
        })
        .collect()
}

#[tokio::test]
async fn fund__zero_allowance_approves_before_funding() {
    // given: an ERC-20 prize and no prior allowance
    let ctx = TestContext::new();
    let (summary, permissions) = organizer_view(&ctx).await;

    // when
    let tx = actions::fund_event(&ctx.organizer_gateway(), &summary, &permissions)
        .await
        .unwrap();
    actions::confirm(tx).await.unwrap();

    // then: approval submitted and confirmed strictly before the funding call
    let records = ctx.chain.records();
    let sequence = ops(&records);
    let amount = summary.prize_amount;
    assert_eq!(
        sequence,
        vec![
            &OpRecord::Submitted(ChainOp::Approve {
                token: ctx.token,
                spender: ctx.event,
                amount,
            }),
            &OpRecord::Confirmed(ChainOp::Approve {
                token: ctx.token,
                spender: ctx.event,
                amount,
            }),
            &OpRecord::Submitted(ChainOp::Fund {
                event: ctx.event,
                amount,
                native: false,
            }),
            &OpRecord::Confirmed(ChainOp::Fund {
                event: ctx.event,
                amount,
                native: false,
            }),
        ]
    );
    assert!(ctx.chain.event(ctx.event).is_funded);
}

#[tokio::test]
async fn fund__sufficient_allowance_skips_the_approval() {
    // given: an allowance already covering the prize
    let ctx = TestContext::new();
    let (summary, permissions) = organizer_view(&ctx).await;
    ctx.chain.set_allowance(
        ctx.token,
        ctx.organizer,
        ctx.event,
        summary.prize_amount,
    );

    // when
    let tx = actions::fund_event(&ctx.organizer_gateway(), &summary, &permissions)
        .await
        .unwrap();
    actions::confirm(tx).await.unwrap();

    // then: no approval op anywhere
    let records = ctx.chain.records();
    assert!(!records.iter().any(|record| matches!(
        record,
        OpRecord::Submitted(ChainOp::Approve { .. })
            | OpRecord::Confirmed(ChainOp::Approve { .. })
    )));
    assert!(ctx.chain.event(ctx.event).is_funded);
}

#[tokio::test]
async fn fund__native_prize_attaches_value_and_touches_no_token() {
    // given: an event whose prize is the chain's base asset
    let ctx = TestContext::new();
    let event = ctx.chain.add_event(
        "Native Raffle",
        ctx.organizer,
        Address::ZERO,
        U256::from(5_000u64),
        1,
    );
    let gateway = ctx.organizer_gateway();
    let summary =
        aggregator::load_event(&gateway, event, Some(ctx.organizer), &TokenTable::builtin())
            .await
            .unwrap();
    let permissions = rules::permissions(&summary, Some(ctx.organizer));

    // when
    let tx = actions::fund_event(&gateway, &summary, &permissions).await.unwrap();
    actions::confirm(tx).await.unwrap();

    // then
    let records = ctx.chain.records();
    assert!(records.contains(&OpRecord::Confirmed(ChainOp::Fund {
        event,
        amount: U256::from(5_000u64),
        native: true,
    })));
    assert!(!records.iter().any(|record| matches!(
        record,
        OpRecord::Submitted(ChainOp::Approve { .. })
    )));
    assert_eq!(ctx.chain.event(event).balance, U256::from(5_000u64));
}

#[tokio::test]
async fn fund__a_funded_event_fails_fast_without_a_transaction() {
    // given: an already funded event
    let ctx = TestContext::new();
    let (summary, permissions) = organizer_view(&ctx).await;
    let tx = actions::fund_event(&ctx.organizer_gateway(), &summary, &permissions)
        .await
        .unwrap();
    actions::confirm(tx).await.unwrap();
    let submissions_before = ctx.chain.records().len();

    // when: permissions are re-derived from fresh chain state
    let (summary, permissions) = organizer_view(&ctx).await;
    let result =
        actions::fund_event(&ctx.organizer_gateway(), &summary, &permissions).await;

    // then: rejected locally, nothing submitted
    assert!(result.is_err());
    assert!(!permissions.can_fund);
    assert_eq!(ctx.chain.records().len(), submissions_before);
    assert_eq!(summary.state, raffyl::rules::EventState::Open);
}

#[tokio::test]
async fn fund__stale_permissions_surface_the_on_chain_revert() {
    // given: an event funded behind the caller's back, with a stale summary
    // still claiming it is fundable
    let ctx = TestContext::new();
    let (stale_summary, stale_permissions) = organizer_view(&ctx).await;
    let tx = actions::fund_event(
        &ctx.organizer_gateway(),
        &stale_summary,
        &stale_permissions,
    )
    .await
    .unwrap();
    actions::confirm(tx).await.unwrap();

    // when: funding again from the stale view
    let tx = actions::fund_event(
        &ctx.organizer_gateway(),
        &stale_summary,
        &stale_permissions,
    )
    .await
    .unwrap();
    let outcome = actions::confirm(tx).await;

    // then: the second funding reverts on-chain and is reported as an error
    assert!(outcome.is_err());
    let balance = ctx.chain.event(ctx.event).balance;
    assert_eq!(balance, stale_summary.prize_amount);
}

#[tokio::test]
async fn fund__without_a_signer_is_rejected_before_any_network_call() {
    // given: a read-only gateway but permissions claiming fundability
    let ctx = TestContext::new();
    let (summary, _) = organizer_view(&ctx).await;
    let forged = raffyl::rules::PermissionSet {
        is_organizer: true,
        can_fund: true,
        ..Default::default()
    };

    // when
    let result =
        actions::fund_event(&ctx.viewer_gateway(), &summary, &forged).await;

    // then
    assert!(result.is_err());
    let records = ctx.chain.records();
    assert!(records.is_empty());
}
