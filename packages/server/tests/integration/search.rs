use serde_json::json;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn returns_own_and_shared_files_newest_first() {
    let app = TestApp::spawn().await;
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;
    let own = app.upload_one(&bob.token, "mine.txt", b"bob's").await;
    let shared = app.upload_one(&alice.token, "theirs.txt", b"alice's").await;
    app.upload_one(&alice.token, "hidden.txt", b"secret").await;
    app.post_with_token(
        &routes::share(shared),
        &json!({"shareWithUsername": "bob"}),
        &alice.token,
    )
    .await;

    let res = app.post_with_token(routes::SEARCH, &json!({}), &bob.token).await;

    assert_eq!(res.status, 200, "{}", res.text);
    let items = res.body.as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["id"], shared);
    assert_eq!(items[0]["sharedBy"], "alice display");
    assert_eq!(items[0]["ownerName"], "alice display");
    assert_eq!(items[1]["id"], own);
    assert!(items[1].get("sharedBy").is_none());
    assert_eq!(items[1]["refCount"], 1);
}

#[tokio::test]
async fn filters_by_filename_mime_and_size() {
    let app = TestApp::spawn().await;
    let alice = app.create_user("alice").await;
    app.upload_one(&alice.token, "Report-2024.pdf", b"%PDF-1.7 report").await;
    app.upload_one(&alice.token, "notes.txt", b"short").await;
    app.upload_one(&alice.token, "longer-notes.txt", b"a considerably longer note").await;

    let by_name = app
        .post_with_token(
            routes::SEARCH,
            &json!({"filters": {"filename": "report"}}),
            &alice.token,
        )
        .await;
    assert_eq!(by_name.body.as_array().unwrap().len(), 1);
    assert_eq!(by_name.body[0]["filename"], "Report-2024.pdf");

    let by_mime = app
        .post_with_token(
            routes::SEARCH,
            &json!({"filters": {"mimeType": "text/plain; charset=utf-8"}}),
            &alice.token,
        )
        .await;
    assert_eq!(by_mime.body.as_array().unwrap().len(), 2);

    let by_size = app
        .post_with_token(
            routes::SEARCH,
            &json!({"filters": {"mimeType": "text/plain; charset=utf-8", "minSize": 10}}),
            &alice.token,
        )
        .await;
    assert_eq!(by_size.body.as_array().unwrap().len(), 1);
    assert_eq!(by_size.body[0]["filename"], "longer-notes.txt");
}

#[tokio::test]
async fn like_wildcards_in_filters_match_literally() {
    let app = TestApp::spawn().await;
    let alice = app.create_user("alice").await;
    app.upload_one(&alice.token, "100%_done.txt", b"one").await;
    app.upload_one(&alice.token, "100 done.txt", b"two").await;

    let res = app
        .post_with_token(
            routes::SEARCH,
            &json!({"filters": {"filename": "100%_"}}),
            &alice.token,
        )
        .await;

    assert_eq!(res.body.as_array().unwrap().len(), 1);
    assert_eq!(res.body[0]["filename"], "100%_done.txt");
}

#[tokio::test]
async fn filters_by_owner_name_and_date() {
    let app = TestApp::spawn().await;
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;
    let id = app.upload_one(&alice.token, "a.txt", b"hello").await;
    app.upload_one(&bob.token, "b.txt", b"world").await;
    app.post_with_token(
        &routes::share(id),
        &json!({"shareWithUsername": "bob"}),
        &alice.token,
    )
    .await;

    let res = app
        .post_with_token(
            routes::SEARCH,
            &json!({"filters": {"ownerName": "ALICE"}}),
            &bob.token,
        )
        .await;
    assert_eq!(res.body.as_array().unwrap().len(), 1);
    assert_eq!(res.body[0]["id"], id);

    let future = app
        .post_with_token(
            routes::SEARCH,
            &json!({"filters": {"startDate": "2999-01-01T00:00:00Z"}}),
            &bob.token,
        )
        .await;
    assert_eq!(future.body.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn inverted_size_range_is_rejected() {
    let app = TestApp::spawn().await;
    let alice = app.create_user("alice").await;

    let res = app
        .post_with_token(
            routes::SEARCH,
            &json!({"filters": {"minSize": 10, "maxSize": 1}}),
            &alice.token,
        )
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn public_files_of_others_are_not_listed() {
    let app = TestApp::spawn().await;
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;
    let id = app.upload_one(&alice.token, "a.txt", b"hello").await;
    app.post_with_token(&routes::share_public(id), &json!({}), &alice.token)
        .await;

    let res = app.post_with_token(routes::SEARCH, &json!({}), &bob.token).await;

    assert_eq!(res.body.as_array().unwrap().len(), 0);
}

mod admin {
    use super::*;

    #[tokio::test]
    async fn admin_lists_every_file() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;
        let bob = app.create_user("bob").await;
        let admin = app.create_admin("root").await;
        app.upload_one(&alice.token, "a.txt", b"same").await;
        app.upload_one(&bob.token, "b.txt", b"same").await;

        let res = app
            .post_with_token(routes::ADMIN_FILES, &json!({}), &admin.token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        let items = res.body.as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["filename"], "b.txt");
        assert_eq!(items[0]["ownerName"], "bob display");
        assert_eq!(items[0]["refCount"], 2);
    }

    #[tokio::test]
    async fn regular_users_are_forbidden() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;

        let res = app
            .post_with_token(routes::ADMIN_FILES, &json!({}), &alice.token)
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }
}
