mod common;

use std::sync::Arc;
use std::time::Duration;

use atm_match::application::MatchingService;
use atm_match::config::MatchingConfig;
use atm_match::domain::{RequestKind, RequestStatus, RetireReason};
use atm_match::error::AppError;
use atm_match::infrastructure::repositories::{InMemoryRequestRepository, RequestRepository};
use rust_decimal::Decimal;

use common::fixtures::{seed, NEARBY, ONE_KM_LAT, ORIGIN};
use common::mocks::{FailingRequestRepo, RecordingNotifier, SlowRequestRepo};
use common::test_matching_config;

fn matcher(repo: Arc<dyn RequestRepository>) -> MatchingService {
    MatchingService::new(repo, &test_matching_config())
}

#[tokio::test]
async fn deposit_half_a_kilometre_away_is_found_both_ways() {
    let repo = Arc::new(InMemoryRequestRepository::new());
    let deposit = seed(repo.as_ref(), RequestKind::Deposit, 500, "dev", ORIGIN).await;
    seed(repo.as_ref(), RequestKind::Withdrawal, 500, "wen", NEARBY).await;
    let matcher = matcher(repo);

    let exact = matcher
        .find_exact_match(RequestKind::Withdrawal, Some(Decimal::new(500, 0)))
        .await
        .unwrap();
    assert_eq!(exact.map(|r| r.id), Some(deposit.id));

    let nearby = matcher
        .find_nearby(RequestKind::Withdrawal, ORIGIN.0, ORIGIN.1, Some(3.0))
        .await
        .unwrap();
    assert_eq!(nearby.len(), 1);
    assert_eq!(nearby[0].request.id, deposit.id);
    assert!(nearby[0].distance_km < 0.01);

    let from_withdrawal = matcher
        .find_nearby(RequestKind::Withdrawal, NEARBY.0, NEARBY.1, None)
        .await
        .unwrap();
    assert!((from_withdrawal[0].distance_km - 0.5).abs() < 0.05);
}

#[tokio::test]
async fn no_exact_match_for_a_different_amount() {
    let repo = Arc::new(InMemoryRequestRepository::new());
    seed(repo.as_ref(), RequestKind::Deposit, 1000, "dev", ORIGIN).await;

    let result = matcher(repo)
        .find_exact_match(RequestKind::Withdrawal, Some(Decimal::new(500, 0)))
        .await
        .unwrap();

    assert!(result.is_none());
}

#[tokio::test]
async fn nearby_orders_nearest_first() {
    let repo = Arc::new(InMemoryRequestRepository::new());
    let far = seed(
        repo.as_ref(),
        RequestKind::Withdrawal,
        300,
        "far",
        (ORIGIN.0 + 2.0 * ONE_KM_LAT, ORIGIN.1),
    )
    .await;
    let near = seed(
        repo.as_ref(),
        RequestKind::Withdrawal,
        700,
        "near",
        (ORIGIN.0 + ONE_KM_LAT, ORIGIN.1),
    )
    .await;

    let results = matcher(repo)
        .find_nearby(RequestKind::Deposit, ORIGIN.0, ORIGIN.1, Some(3.0))
        .await
        .unwrap();

    let ids: Vec<_> = results.iter().map(|r| r.request.id).collect();
    assert_eq!(ids, vec![near.id, far.id]);
    assert!((results[0].distance_km - 1.0).abs() < 0.01);
    assert!((results[1].distance_km - 2.0).abs() < 0.01);
}

#[tokio::test]
async fn nearby_excludes_same_kind_retired_and_distant_requests() {
    let repo = Arc::new(InMemoryRequestRepository::new());
    seed(repo.as_ref(), RequestKind::Withdrawal, 500, "same-kind", ORIGIN).await;
    let retired = seed(repo.as_ref(), RequestKind::Deposit, 500, "gone", ORIGIN).await;
    repo.retire(retired.id, RetireReason::Cancelled).await.unwrap();
    seed(
        repo.as_ref(),
        RequestKind::Deposit,
        500,
        "distant",
        (ORIGIN.0 + 10.0 * ONE_KM_LAT, ORIGIN.1),
    )
    .await;

    let results = matcher(repo)
        .find_nearby(RequestKind::Withdrawal, ORIGIN.0, ORIGIN.1, None)
        .await
        .unwrap();

    assert!(results.is_empty());
}

#[tokio::test]
async fn equal_distances_keep_queue_order() {
    let repo = Arc::new(InMemoryRequestRepository::new());
    let first = seed(repo.as_ref(), RequestKind::Deposit, 100, "a", NEARBY).await;
    let second = seed(repo.as_ref(), RequestKind::Deposit, 200, "b", NEARBY).await;
    let third = seed(repo.as_ref(), RequestKind::Deposit, 300, "c", NEARBY).await;

    let results = matcher(repo)
        .find_nearby(RequestKind::Withdrawal, ORIGIN.0, ORIGIN.1, None)
        .await
        .unwrap();

    let ids: Vec<_> = results.iter().map(|r| r.request.id).collect();
    assert_eq!(ids, vec![first.id, second.id, third.id]);
}

#[tokio::test]
async fn exact_match_ignores_retired_requests() {
    let repo = Arc::new(InMemoryRequestRepository::new());
    let matched = seed(repo.as_ref(), RequestKind::Deposit, 500, "a", ORIGIN).await;
    let waiting = seed(repo.as_ref(), RequestKind::Deposit, 500, "b", ORIGIN).await;
    repo.retire(matched.id, RetireReason::Matched).await.unwrap();

    let result = matcher(repo)
        .find_exact_match(RequestKind::Withdrawal, Some(Decimal::new(500, 0)))
        .await
        .unwrap();

    assert_eq!(result.map(|r| r.id), Some(waiting.id));
}

#[tokio::test]
async fn match_request_publishes_match_and_retirements() {
    let repo = Arc::new(InMemoryRequestRepository::new());
    let withdrawal = seed(repo.as_ref(), RequestKind::Withdrawal, 500, "wen", NEARBY).await;
    let deposit = seed(repo.as_ref(), RequestKind::Deposit, 500, "dev", ORIGIN).await;
    let notifier = Arc::new(RecordingNotifier::default());
    let matcher = matcher(repo.clone()).with_notifier(notifier.clone());

    let pair = matcher
        .match_request("wen", withdrawal.id)
        .await
        .unwrap()
        .expect("deposit should match");

    assert_eq!(pair.request.id, withdrawal.id);
    assert_eq!(pair.counterparty.id, deposit.id);
    assert_eq!(pair.request.status, RequestStatus::Matched);
    assert_eq!(
        notifier.event_types(),
        vec!["match_found", "request_retired", "request_retired"]
    );
    assert!(repo.list_pending(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn unavailable_store_surfaces_retryable_error() {
    let matcher = matcher(Arc::new(FailingRequestRepo));

    let error = matcher
        .find_exact_match(RequestKind::Withdrawal, Some(Decimal::new(500, 0)))
        .await
        .unwrap_err();

    assert!(matches!(error, AppError::ServiceUnavailable { .. }));
    assert!(error.is_retryable());
}

#[tokio::test]
async fn slow_store_times_out_as_retryable_error() {
    let repo: Arc<dyn RequestRepository> =
        Arc::new(SlowRequestRepo::new(Duration::from_millis(300)));
    let config = MatchingConfig {
        store_timeout_ms: 20,
        ..MatchingConfig::default()
    };
    let matcher = MatchingService::new(repo, &config);

    let error = matcher
        .find_nearby(RequestKind::Withdrawal, ORIGIN.0, ORIGIN.1, None)
        .await
        .unwrap_err();

    assert!(matches!(error, AppError::ServiceUnavailable { .. }));
    assert!(error.is_retryable());
}
