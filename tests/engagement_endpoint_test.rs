use axum::http::StatusCode;
use dealrank::api::{self, AppState};
use dealrank::db::init_db;
use dealrank::domain::{Deal, DealId, DealStatus, Decimal, Role, TimeMs, UserId};
use dealrank::engagement::EngagementService;
use dealrank::engine::HeatParams;
use dealrank::identity::{IdentityGate, MockIdentityProvider};
use dealrank::ledger::VoteLedger;
use dealrank::moderation::ModerationService;
use dealrank::ranking::RankingService;
use dealrank::Repository;
use std::str::FromStr;
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

struct TestApp {
    app: axum::Router,
    repo: Arc<Repository>,
    _temp: TempDir,
}

async fn setup_test_app(dedup_window_ms: i64) -> TestApp {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();
    let pool = init_db(&db_path).await.expect("init_db failed");
    let repo = Arc::new(Repository::new(pool));

    let provider = MockIdentityProvider::new().with_identity("tok-alice", "alice", Role::Member);
    let gate = IdentityGate::new(Arc::new(provider));

    let ledger = Arc::new(VoteLedger::new(repo.clone(), gate.clone()));
    let moderation = Arc::new(ModerationService::new(repo.clone(), gate.clone()));
    let engagement = Arc::new(EngagementService::new(repo.clone(), dedup_window_ms));
    let ranking = Arc::new(RankingService::new(
        repo.clone(),
        gate.clone(),
        HeatParams::default(),
        100,
    ));

    let state = AppState::new(ledger, moderation, engagement, ranking, gate);
    TestApp {
        app: api::create_router(state),
        repo,
        _temp: temp_dir,
    }
}

async fn insert_published_deal(repo: &Repository, id: &str) -> DealId {
    let deal = Deal {
        id: DealId::new(id.to_string()),
        title: "deal".to_string(),
        description: "desc".to_string(),
        price: Decimal::from_str("5").unwrap(),
        original_price: None,
        category: "misc".to_string(),
        shop: "acme".to_string(),
        submitter: UserId::new("carol".to_string()),
        status: DealStatus::Published,
        created_at: TimeMs::new(1000),
        published_at: Some(TimeMs::new(1000)),
        expires_at: None,
    };
    repo.insert_deal(&deal).await.unwrap();
    deal.id
}

async fn send(
    app: axum::Router,
    method: &str,
    uri: &str,
    headers: &[(&str, &str)],
) -> StatusCode {
    let mut builder = axum::http::Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let req = builder.body(axum::body::Body::empty()).unwrap();
    app.oneshot(req).await.unwrap().status()
}

async fn views(repo: &Repository, deal_id: &DealId) -> i64 {
    repo.get_snapshot(deal_id).await.unwrap().unwrap().views
}

#[tokio::test]
async fn test_member_views_dedup_within_window() {
    let test_app = setup_test_app(30 * 60_000).await;
    let deal_id = insert_published_deal(&test_app.repo, "d1").await;
    let uri = format!("/v1/deals/{}/views", deal_id);
    let auth = [("authorization", "Bearer tok-alice")];

    for _ in 0..3 {
        let status = send(test_app.app.clone(), "POST", &uri, &auth).await;
        assert_eq!(status, StatusCode::ACCEPTED);
    }

    assert_eq!(views(&test_app.repo, &deal_id).await, 1);
}

#[tokio::test]
async fn test_anonymous_views_dedup_by_fingerprint() {
    let test_app = setup_test_app(30 * 60_000).await;
    let deal_id = insert_published_deal(&test_app.repo, "d1").await;
    let uri = format!("/v1/deals/{}/views", deal_id);

    send(test_app.app.clone(), "POST", &uri, &[("x-fingerprint", "fp-1")]).await;
    send(test_app.app.clone(), "POST", &uri, &[("x-fingerprint", "fp-1")]).await;
    send(test_app.app.clone(), "POST", &uri, &[("x-fingerprint", "fp-2")]).await;

    assert_eq!(views(&test_app.repo, &deal_id).await, 2);
}

#[tokio::test]
async fn test_view_without_any_identity_is_accepted_but_not_counted() {
    let test_app = setup_test_app(0).await;
    let deal_id = insert_published_deal(&test_app.repo, "d1").await;
    let uri = format!("/v1/deals/{}/views", deal_id);

    let status = send(test_app.app.clone(), "POST", &uri, &[]).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(views(&test_app.repo, &deal_id).await, 0);
}

#[tokio::test]
async fn test_view_failures_are_swallowed() {
    let test_app = setup_test_app(0).await;

    // Unknown deal: recording fails internally, the client still gets 202.
    let status = send(
        test_app.app.clone(),
        "POST",
        "/v1/deals/missing/views",
        &[("x-fingerprint", "fp-1")],
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
}

#[tokio::test]
async fn test_comment_count_follows_create_and_delete() {
    let test_app = setup_test_app(0).await;
    let deal_id = insert_published_deal(&test_app.repo, "d1").await;
    let uri = format!("/v1/deals/{}/comments", deal_id);

    assert_eq!(
        send(test_app.app.clone(), "POST", &uri, &[]).await,
        StatusCode::NO_CONTENT
    );
    assert_eq!(
        send(test_app.app.clone(), "POST", &uri, &[]).await,
        StatusCode::NO_CONTENT
    );
    assert_eq!(
        send(test_app.app.clone(), "DELETE", &uri, &[]).await,
        StatusCode::NO_CONTENT
    );

    let snapshot = test_app
        .repo
        .get_snapshot(&deal_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(snapshot.comments, 1);
}

#[tokio::test]
async fn test_comment_on_unknown_deal_is_404() {
    let test_app = setup_test_app(0).await;
    let status = send(test_app.app.clone(), "POST", "/v1/deals/missing/comments", &[]).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
