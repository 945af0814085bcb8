//! Per-client submission rate limiting through the HTTP stack.
//!
//! Run with: `cargo test -p portal-api --test rate_limit_test`

mod helpers;

use axum::http::StatusCode;
use helpers::fixtures;
use helpers::{setup_test_app, setup_test_app_with};
use serde_json::{json, Value};

#[tokio::test]
async fn test_eleventh_submission_is_rate_limited() {
    let app = setup_test_app().await;
    let client = app.client();

    let mut statuses = Vec::new();
    let mut remaining = Vec::new();
    for _ in 0..11 {
        let response = client
            .post("/api/submit")
            .add_header("X-Forwarded-For", "198.51.100.23")
            .json(&fixtures::valid_submission())
            .await;
        statuses.push(response.status_code());
        remaining.push(
            response
                .header("X-RateLimit-Remaining")
                .to_str()
                .unwrap()
                .to_string(),
        );

        if response.status_code() == StatusCode::TOO_MANY_REQUESTS {
            let retry_after: u64 = response
                .header("Retry-After")
                .to_str()
                .unwrap()
                .parse()
                .unwrap();
            assert!((1..=60).contains(&retry_after));
            assert_eq!(response.header("X-RateLimit-Limit"), "10");
            assert_eq!(response.json::<Value>()["error"]["code"], "RATE_LIMIT");
        }
    }

    let created = statuses.iter().filter(|s| **s == StatusCode::CREATED).count();
    assert_eq!(created, 10);
    assert_eq!(statuses[10], StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(remaining[0], "9");
    assert_eq!(remaining[9], "0");
    assert_eq!(app.repository.all().await.len(), 10);
}

#[tokio::test]
async fn test_clients_are_limited_independently() {
    let app = setup_test_app_with(|config| config.rate_limit.max_requests = 1).await;
    let client = app.client();

    let first = client
        .post("/api/submit")
        .add_header("X-Forwarded-For", "198.51.100.1")
        .json(&fixtures::valid_submission())
        .await;
    let repeat = client
        .post("/api/submit")
        .add_header("X-Forwarded-For", "198.51.100.1")
        .json(&fixtures::valid_submission())
        .await;
    let other = client
        .post("/api/submit")
        .add_header("X-Forwarded-For", "198.51.100.2")
        .json(&fixtures::valid_submission())
        .await;

    assert_eq!(first.status_code(), StatusCode::CREATED);
    assert_eq!(repeat.status_code(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(other.status_code(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_rotating_forged_forwarded_entries_share_one_bucket() {
    let app = setup_test_app_with(|config| config.rate_limit.max_requests = 1).await;
    let client = app.client();

    let mut statuses = Vec::new();
    for i in 0..5 {
        let response = client
            .post("/api/submit")
            .add_header("X-Forwarded-For", format!("10.9.9.{}, 198.51.100.9", i))
            .json(&fixtures::valid_submission())
            .await;
        statuses.push(response.status_code());
    }

    assert_eq!(statuses[0], StatusCode::CREATED);
    assert!(statuses[1..]
        .iter()
        .all(|s| *s == StatusCode::TOO_MANY_REQUESTS));
    assert_eq!(app.repository.all().await.len(), 1);
}

#[tokio::test]
async fn test_rejected_submissions_count_toward_limit() {
    let app = setup_test_app_with(|config| config.rate_limit.max_requests = 2).await;
    let client = app.client();

    for _ in 0..2 {
        let response = client
            .post("/api/submit")
            .json(&json!({ "contact": "98", "message": "short" }))
            .await;
        assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    let response = client
        .post("/api/submit")
        .json(&fixtures::valid_submission())
        .await;
    assert_eq!(response.status_code(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_locales_share_one_limit() {
    let app = setup_test_app_with(|config| config.rate_limit.max_requests = 1).await;

    let en = app
        .client()
        .post("/api/submit")
        .json(&fixtures::valid_submission())
        .await;
    let ne = app
        .client()
        .post("/ne/api/submit")
        .json(&fixtures::valid_submission())
        .await;

    assert_eq!(en.status_code(), StatusCode::CREATED);
    assert_eq!(ne.status_code(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_disabled_limiter_outside_production() {
    let app = setup_test_app_with(|config| {
        config.rate_limit.max_requests = 1;
        config.rate_limit.disabled_requested = true;
    })
    .await;

    for _ in 0..3 {
        let response = app
            .client()
            .post("/api/submit")
            .json(&fixtures::valid_submission())
            .await;
        assert_eq!(response.status_code(), StatusCode::CREATED);
    }

    let health = app.client().get("/health").await.json::<Value>();
    assert_eq!(health["rate_limit_backend"], "disabled");
}
