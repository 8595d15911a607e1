#![allow(non_snake_case)]

use alloy::primitives::{
    Address,
    U256,
};
use deployments::TokenTable;
use raffyl::{
    actions,
    aggregator::{
        self,
        EventSource,
    },
    rules,
};
use raffyl_abi::test_helpers::{
    MockChain,
    TestContext,
    addr,
};

#[tokio::test]
async fn aggregate__one_broken_event_does_not_block_the_listing() {
    // given: three events where the middle one fails every read
    let chain = MockChain::new();
    let token = chain.add_token("USDC", 6);
    let first = chain.add_event("First", addr(1), token, U256::from(10u64), 1);
    let broken = chain.add_event("Broken", addr(1), token, U256::from(10u64), 1);
    let third = chain.add_event("Third", addr(1), token, U256::from(10u64), 1);
    chain.set_fail_reads(broken, true);

    // when
    let events = aggregator::load_events(
        &chain.gateway(None),
        EventSource::All,
        None,
        &TokenTable::builtin(),
    )
    .await
    .unwrap();

    // then: exactly the first and third, normally formed
    let addresses: Vec<Address> = events.iter().map(|event| event.address).collect();
    assert_eq!(addresses.len(), 2);
    assert!(addresses.contains(&first));
    assert!(addresses.contains(&third));
    for event in &events {
        assert_eq!(event.token_symbol, "USDC");
        assert_eq!(event.token_decimals, 6);
    }
}

#[tokio::test]
async fn aggregate__sorts_by_lifecycle_state_then_name() {
    // given: a completed "B" and open "A" and "Z", created out of order
    let ctx = TestContext::new();
    let native = Address::ZERO;
    let completed = ctx.chain.add_event(
        "B",
        ctx.organizer,
        native,
        U256::from(100u64),
        1,
    );
    ctx.chain.add_event("Z", ctx.organizer, native, U256::from(5u64), 1);
    ctx.chain.add_event("A", ctx.organizer, native, U256::from(5u64), 1);

    // Drive "B" through its whole lifecycle.
    {
        let alice = ctx.alice_gateway();
        let tokens = TokenTable::builtin();
        let summary = aggregator::load_event(&alice, completed, Some(ctx.alice), &tokens)
            .await
            .unwrap();
        let permissions = rules::permissions(&summary, Some(ctx.alice));
        let tx = actions::register(&alice, completed, &permissions).await.unwrap();
        actions::confirm(tx).await.unwrap();
    }
    {
        let organizer = ctx.organizer_gateway();
        let tokens = TokenTable::builtin();
        let summary = aggregator::load_event(&organizer, completed, Some(ctx.organizer), &tokens)
            .await
            .unwrap();
        let permissions = rules::permissions(&summary, Some(ctx.organizer));
        let tx = actions::fund_event(&organizer, &summary, &permissions).await.unwrap();
        actions::confirm(tx).await.unwrap();

        let summary = aggregator::load_event(&organizer, completed, Some(ctx.organizer), &tokens)
            .await
            .unwrap();
        let permissions = rules::permissions(&summary, Some(ctx.organizer));
        let tx = actions::select_winners(&organizer, completed, &permissions)
            .await
            .unwrap();
        actions::confirm(tx).await.unwrap();

        let summary = aggregator::load_event(&organizer, completed, Some(ctx.organizer), &tokens)
            .await
            .unwrap();
        let permissions = rules::permissions(&summary, Some(ctx.organizer));
        let tx = actions::disburse_prizes(&organizer, completed, &permissions)
            .await
            .unwrap();
        actions::confirm(tx).await.unwrap();
    }

    // when
    let events = aggregator::load_events(
        &ctx.viewer_gateway(),
        EventSource::All,
        None,
        &TokenTable::builtin(),
    )
    .await
    .unwrap();

    // then: open events first in name order, completed events last
    let names: Vec<&str> = events
        .iter()
        .filter(|event| ["A", "B", "Z"].contains(&event.name.as_str()))
        .map(|event| event.name.as_str())
        .collect();
    assert_eq!(names, vec!["A", "Z", "B"]);
}

#[tokio::test]
async fn aggregate__viewer_flags_are_specific_to_the_connected_account() {
    // given: alice registered for the default event, bob did not
    let ctx = TestContext::new();
    let alice = ctx.alice_gateway();
    let tokens = TokenTable::builtin();
    let summary = aggregator::load_event(&alice, ctx.event, Some(ctx.alice), &tokens)
        .await
        .unwrap();
    let permissions = rules::permissions(&summary, Some(ctx.alice));
    let tx = actions::register(&alice, ctx.event, &permissions).await.unwrap();
    actions::confirm(tx).await.unwrap();

    // when
    let as_alice =
        aggregator::load_event(&alice, ctx.event, Some(ctx.alice), &tokens)
            .await
            .unwrap();
    let as_bob = aggregator::load_event(
        &ctx.bob_gateway(),
        ctx.event,
        Some(ctx.bob),
        &tokens,
    )
    .await
    .unwrap();
    let as_nobody =
        aggregator::load_event(&ctx.viewer_gateway(), ctx.event, None, &tokens)
            .await
            .unwrap();

    // then
    assert!(as_alice.is_user_registered);
    assert!(!as_bob.is_user_registered);
    assert!(!as_nobody.is_user_registered);
    assert_eq!(as_alice.participant_count(), 1);
}

#[tokio::test]
async fn aggregate__by_organizer_lists_only_that_organizers_events() {
    // given
    let ctx = TestContext::new();
    let other = addr(0xB0);
    ctx.chain
        .add_event("Other", other, ctx.token, U256::from(5u64), 1);

    // when
    let mine = aggregator::load_events(
        &ctx.organizer_gateway(),
        EventSource::Organizer(ctx.organizer),
        Some(ctx.organizer),
        &TokenTable::builtin(),
    )
    .await
    .unwrap();

    // then
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].organizer, ctx.organizer);
    assert_eq!(mine[0].name, "Launch Party");
}
