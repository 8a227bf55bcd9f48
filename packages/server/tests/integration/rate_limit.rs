use serde_json::json;

use crate::common::{TestApp, TestOptions, routes};

async fn strict_app() -> TestApp {
    TestApp::spawn_with(TestOptions {
        requests_per_second: 0.01,
        burst: 2,
        ..Default::default()
    })
    .await
}

#[tokio::test]
async fn requests_beyond_the_burst_are_rejected_with_retry_after() {
    let app = strict_app().await;
    let alice = app.create_user("alice").await;

    for _ in 0..2 {
        let res = app.post_with_token(routes::SEARCH, &json!({}), &alice.token).await;
        assert_eq!(res.status, 200, "{}", res.text);
    }
    let res = app.post_with_token(routes::SEARCH, &json!({}), &alice.token).await;

    assert_eq!(res.status, 429);
    assert_eq!(res.body["code"], "RATE_LIMITED");
    let retry_after: u64 = res.retry_after.expect("Retry-After header").parse().unwrap();
    assert!(retry_after >= 1);
}

#[tokio::test]
async fn each_user_has_an_independent_budget() {
    let app = strict_app().await;
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;

    for _ in 0..3 {
        app.get_with_token(routes::SHARED_BY_ME, &alice.token).await;
    }
    let res = app.get_with_token(routes::SHARED_BY_ME, &bob.token).await;

    assert_eq!(res.status, 200);
}

#[tokio::test]
async fn auth_routes_are_not_limited() {
    let app = strict_app().await;
    let alice = app.create_user("alice").await;

    for _ in 0..5 {
        let res = app.get_with_token(routes::ME, &alice.token).await;
        assert_eq!(res.status, 200);
    }
}
