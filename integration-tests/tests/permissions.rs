#![allow(non_snake_case)]

use deployments::TokenTable;
use raffyl::{
    actions::{
        self,
        CreateEventRequest,
    },
    aggregator,
    rules,
};
use raffyl_abi::test_helpers::TestContext;

async fn view(
    ctx: &TestContext,
    viewer: alloy::primitives::Address,
) -> (raffyl::aggregator::EventSummary, raffyl::rules::PermissionSet) {
    let summary = aggregator::load_event(
        &ctx.chain.gateway(Some(viewer)),
        ctx.event,
        Some(viewer),
        &TokenTable::builtin(),
    )
    .await
    .unwrap();
    let permissions = rules::permissions(&summary, Some(viewer));
    (summary, permissions)
}

#[tokio::test]
async fn register__organizers_cannot_enter_their_own_raffle() {
    // given
    let ctx = TestContext::new();
    let (_, permissions) = view(&ctx, ctx.organizer).await;

    // when
    let result =
        actions::register(&ctx.organizer_gateway(), ctx.event, &permissions).await;

    // then: rejected locally, nothing submitted
    assert!(!permissions.can_register);
    assert!(result.is_err());
    assert!(ctx.chain.records().is_empty());
}

#[tokio::test]
async fn register__disconnected_viewers_cannot_register() {
    let ctx = TestContext::new();
    let summary = aggregator::load_event(
        &ctx.viewer_gateway(),
        ctx.event,
        None,
        &TokenTable::builtin(),
    )
    .await
    .unwrap();
    let permissions = rules::permissions(&summary, None);

    let result = actions::register(&ctx.viewer_gateway(), ctx.event, &permissions).await;

    assert!(!permissions.can_register);
    assert!(result.is_err());
    assert!(ctx.chain.records().is_empty());
}

#[tokio::test]
async fn register__twice_is_rejected_locally_the_second_time() {
    // given: alice registered once
    let ctx = TestContext::new();
    let (_, permissions) = view(&ctx, ctx.alice).await;
    let tx = actions::register(&ctx.alice_gateway(), ctx.event, &permissions)
        .await
        .unwrap();
    actions::confirm(tx).await.unwrap();
    let submissions_before = ctx.chain.records().len();

    // when
    let (_, permissions) = view(&ctx, ctx.alice).await;
    let result =
        actions::register(&ctx.alice_gateway(), ctx.event, &permissions).await;

    // then
    assert!(!permissions.can_register);
    assert!(result.is_err());
    assert_eq!(ctx.chain.records().len(), submissions_before);
}

#[tokio::test]
async fn select_winners__needs_enough_participants() {
    // given: one entrant for a two-winner event
    let ctx = TestContext::new();
    let (_, permissions) = view(&ctx, ctx.alice).await;
    let tx = actions::register(&ctx.alice_gateway(), ctx.event, &permissions)
        .await
        .unwrap();
    actions::confirm(tx).await.unwrap();

    // when
    let (_, permissions) = view(&ctx, ctx.organizer).await;
    let result =
        actions::select_winners(&ctx.organizer_gateway(), ctx.event, &permissions)
            .await;

    // then
    assert!(!permissions.can_select_winners);
    assert!(result.is_err());

    // and with a second entrant the same call goes through
    let (_, permissions) = view(&ctx, ctx.bob).await;
    let tx = actions::register(&ctx.bob_gateway(), ctx.event, &permissions)
        .await
        .unwrap();
    actions::confirm(tx).await.unwrap();

    let (_, permissions) = view(&ctx, ctx.organizer).await;
    assert!(permissions.can_select_winners);
    let tx =
        actions::select_winners(&ctx.organizer_gateway(), ctx.event, &permissions)
            .await
            .unwrap();
    actions::confirm(tx).await.unwrap();
    assert_eq!(ctx.chain.event(ctx.event).winners.len(), 2);
}

#[tokio::test]
async fn create_event__input_validation_fails_fast() {
    let ctx = TestContext::new();
    let gateway = ctx.organizer_gateway();
    let usdc = TokenTable::builtin().by_symbol("USDC").unwrap().clone();
    let valid = CreateEventRequest {
        name: "Valid".to_string(),
        token: usdc.clone(),
        prize_amount: "100".to_string(),
        winner_count: 3,
    };

    let cases = [
        CreateEventRequest {
            name: "   ".to_string(),
            ..valid.clone()
        },
        CreateEventRequest {
            winner_count: 0,
            ..valid.clone()
        },
        CreateEventRequest {
            winner_count: 101,
            ..valid.clone()
        },
        CreateEventRequest {
            prize_amount: "0".to_string(),
            ..valid.clone()
        },
        CreateEventRequest {
            prize_amount: "12notanumber".to_string(),
            ..valid.clone()
        },
    ];

    for request in cases {
        let result = actions::create_event(&gateway, &request).await;
        assert!(result.is_err(), "expected rejection of {request:?}");
    }
    assert!(ctx.chain.records().is_empty());

    // the valid request does submit
    let tx = actions::create_event(&gateway, &valid).await.unwrap();
    actions::confirm(tx).await.unwrap();
    assert!(!ctx.chain.records().is_empty());
}

#[tokio::test]
async fn create_event__without_a_signer_is_rejected() {
    let ctx = TestContext::new();
    let usdc = TokenTable::builtin().by_symbol("USDC").unwrap().clone();
    let request = CreateEventRequest {
        name: "No signer".to_string(),
        token: usdc,
        prize_amount: "1".to_string(),
        winner_count: 1,
    };

    let result = actions::create_event(&ctx.viewer_gateway(), &request).await;

    assert!(result.is_err());
    assert!(ctx.chain.records().is_empty());
}
