use serde_json::json;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn actions_are_recorded_in_the_users_history() {
    let app = TestApp::spawn().await;
    let alice = app.create_user("alice").await;
    app.create_user("bob").await;
    let id = app.upload_one(&alice.token, "a.txt", b"hello").await;
    app.post_with_token(
        &routes::share(id),
        &json!({"shareWithUsername": "bob"}),
        &alice.token,
    )
    .await;

    let upload = app.wait_for_audit(Some(alice.id), "FILE_UPLOAD").await;
    assert_eq!(upload.target_id, Some(id));
    assert_eq!(upload.details["filename"], "a.txt");
    assert_eq!(upload.details["deduplicated"], false);
    app.wait_for_audit(Some(alice.id), "FILE_SHARE_USER").await;

    let res = app.get_with_token(routes::LOGS, &alice.token).await;

    assert_eq!(res.status, 200, "{}", res.text);
    let entries = res.body.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["action"], "FILE_SHARE_USER");
    assert_eq!(entries[1]["action"], "FILE_UPLOAD");
    assert_eq!(entries[1]["targetId"], id);
}

#[tokio::test]
async fn history_is_private_to_each_user() {
    let app = TestApp::spawn().await;
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;
    app.upload_one(&alice.token, "a.txt", b"hello").await;
    app.wait_for_audit(Some(alice.id), "FILE_UPLOAD").await;

    let res = app.get_with_token(routes::LOGS, &bob.token).await;

    assert_eq!(res.status, 200);
    assert_eq!(res.body.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn deletion_is_audited() {
    let app = TestApp::spawn().await;
    let alice = app.create_user("alice").await;
    let id = app.upload_one(&alice.token, "a.txt", b"hello").await;

    app.delete_with_token(&routes::file(id), &alice.token).await;

    let entry = app.wait_for_audit(Some(alice.id), "FILE_DELETE").await;
    assert_eq!(entry.target_id, Some(id));
}
