use serde_json::json;

use server::entity::user_file;
use sea_orm::EntityTrait;

use crate::common::{TestApp, routes};

async fn download_count(app: &TestApp, id: i32) -> i64 {
    user_file::Entity::find_by_id(id)
        .one(&app.db)
        .await
        .unwrap()
        .unwrap()
        .download_count
}

#[tokio::test]
async fn owner_download_redirects_and_counts() {
    let app = TestApp::spawn().await;
    let alice = app.create_user("alice").await;
    let id = app.upload_one(&alice.token, "a.txt", b"hello").await;
    let physical = app.physical_for(id).await;

    let res = app.get_with_token(&routes::download(id), &alice.token).await;

    assert_eq!(res.status, 302);
    assert_eq!(res.location.as_deref(), Some(physical.remote_url.as_str()));
    assert_eq!(download_count(&app, id).await, 1);
}

#[tokio::test]
async fn token_can_be_passed_as_query_parameter() {
    let app = TestApp::spawn().await;
    let alice = app.create_user("alice").await;
    let id = app.upload_one(&alice.token, "a.txt", b"hello").await;

    let res = app
        .get_without_token(&format!("{}?token={}", routes::download(id), alice.token))
        .await;

    assert_eq!(res.status, 302);
}

#[tokio::test]
async fn recipient_can_download_but_stranger_cannot() {
    let app = TestApp::spawn().await;
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;
    let carol = app.create_user("carol").await;
    let id = app.upload_one(&alice.token, "a.txt", b"hello").await;
    app.post_with_token(
        &routes::share(id),
        &json!({"shareWithUsername": "bob"}),
        &alice.token,
    )
    .await;

    let bob_res = app.get_with_token(&routes::download(id), &bob.token).await;
    let carol_res = app.get_with_token(&routes::download(id), &carol.token).await;

    assert_eq!(bob_res.status, 302);
    assert_eq!(carol_res.status, 403);
    assert_eq!(download_count(&app, id).await, 1);
}

#[tokio::test]
async fn admin_can_download_any_file() {
    let app = TestApp::spawn().await;
    let alice = app.create_user("alice").await;
    let admin = app.create_admin("root").await;
    let id = app.upload_one(&alice.token, "a.txt", b"hello").await;

    let res = app.get_with_token(&routes::download(id), &admin.token).await;

    assert_eq!(res.status, 302);
}

#[tokio::test]
async fn public_download_needs_no_token_and_is_audited_anonymously() {
    let app = TestApp::spawn().await;
    let alice = app.create_user("alice").await;
    let id = app.upload_one(&alice.token, "a.txt", b"hello").await;
    app.post_with_token(&routes::share_public(id), &json!({}), &alice.token)
        .await;

    let res = app.get_without_token(&routes::public_download(id)).await;

    assert_eq!(res.status, 302);
    assert_eq!(download_count(&app, id).await, 1);
    let entry = app.wait_for_audit(None, "FILE_DOWNLOAD_PUBLIC").await;
    assert_eq!(entry.target_id, Some(id));
}

#[tokio::test]
async fn private_file_is_not_publicly_downloadable() {
    let app = TestApp::spawn().await;
    let alice = app.create_user("alice").await;
    let id = app.upload_one(&alice.token, "a.txt", b"hello").await;

    let res = app.get_without_token(&routes::public_download(id)).await;

    assert_eq!(res.status, 403);
    assert_eq!(download_count(&app, id).await, 0);
}

#[tokio::test]
async fn missing_file_is_not_found() {
    let app = TestApp::spawn().await;

    let res = app.get_without_token(&routes::public_download(777)).await;

    assert_eq!(res.status, 404);
}
