use std::time::Duration;

use crate::common::{MB, TestApp, TestOptions, routes};

mod single_file {
    use super::*;

    #[tokio::test]
    async fn upload_returns_stored_file_details() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;

        let res = app.upload(&alice.token, &[("notes.txt", b"hello")]).await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["message"], "Files uploaded successfully");
        assert_eq!(res.body["uploadedCount"], 1);
        let file = &res.body["files"][0];
        assert_eq!(file["filename"], "notes.txt");
        assert_eq!(file["sizeBytes"], 5);
        assert_eq!(file["mimeType"], "text/plain; charset=utf-8");
        assert_eq!(file["deduplicated"], false);
        assert!(file["uploadedAt"].is_string());

        let physical = app.physical_files().await;
        assert_eq!(physical.len(), 1);
        assert_eq!(physical[0].ref_count, 1);
        assert_eq!(physical[0].size_bytes, 5);
        assert!(app.store.object_exists(&physical[0].remote_object_id));
    }

    #[tokio::test]
    async fn client_path_components_are_stripped_from_the_filename() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;

        let res = app
            .upload(&alice.token, &[("C:\\Users\\alice\\report.pdf", b"%PDF-1.7")])
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["files"][0]["filename"], "report.pdf");
        assert_eq!(res.body["files"][0]["mimeType"], "application/pdf");
    }

    #[tokio::test]
    async fn mime_type_is_sniffed_when_extension_is_unknown() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;

        let res = app
            .upload(&alice.token, &[("picture", b"\x89PNG\r\n\x1a\n\x00\x00\x00\x0dIHDR")])
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["files"][0]["mimeType"], "image/png");
        let physical = app.physical_files().await;
        assert!(physical[0].remote_object_id.starts_with("image/"));
    }

    #[tokio::test]
    async fn empty_file_is_rejected() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;

        let res = app.upload(&alice.token, &[("empty.txt", b"")]).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert_eq!(app.user_file_count().await, 0);
    }

    #[tokio::test]
    async fn request_without_files_is_rejected() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;

        let res = app.upload(&alice.token, &[]).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn upload_requires_authentication() {
        let app = TestApp::spawn().await;

        let res = app.upload("", &[("a.txt", b"hello")]).await;

        assert_eq!(res.status, 401);
        assert_eq!(app.store.uploads(), 0);
    }
}

mod deduplication {
    use super::*;

    #[tokio::test]
    async fn identical_content_from_two_users_is_stored_once() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;
        let bob = app.create_user("bob").await;

        let a = app.upload_one(&alice.token, "A.txt", b"hello").await;
        let res = app.upload(&bob.token, &[("B.txt", b"hello")]).await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["files"][0]["deduplicated"], true);
        let b = res.body["files"][0]["userFileId"].as_i64().unwrap() as i32;

        assert_eq!(app.store.uploads(), 1);
        let physical = app.physical_files().await;
        assert_eq!(physical.len(), 1);
        assert_eq!(physical[0].ref_count, 2);
        assert_eq!(app.physical_for(a).await.id, app.physical_for(b).await.id);
    }

    #[tokio::test]
    async fn duplicates_inside_one_batch_share_content() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;

        let res = app
            .upload(&alice.token, &[("one.txt", b"same"), ("two.txt", b"same")])
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["uploadedCount"], 2);
        assert_eq!(res.body["files"][0]["deduplicated"], false);
        assert_eq!(res.body["files"][1]["deduplicated"], true);
        assert_eq!(app.store.uploads(), 1);
        assert_eq!(app.user_file_count().await, 2);
        assert_eq!(app.physical_files().await[0].ref_count, 2);
    }

    #[tokio::test]
    async fn filename_does_not_affect_deduplication() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;

        app.upload_one(&alice.token, "a.txt", b"content").await;
        app.upload_one(&alice.token, "b.bin", b"content").await;
        app.upload_one(&alice.token, "a.txt", b"other content").await;

        assert_eq!(app.physical_files().await.len(), 2);
        assert_eq!(app.user_file_count().await, 3);
    }

    #[tokio::test]
    async fn concurrent_uploads_of_new_content_register_one_physical_file() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;
        let bob = app.create_user("bob").await;
        let content = vec![7u8; 256 * 1024];
        // Both requests miss the registry and upload before either inserts,
        // so one insert must lose on the unique content hash.
        app.store.gate_uploads(2);

        let alice_files: [(&str, &[u8]); 1] = [("race.bin", &content)];
        let bob_files: [(&str, &[u8]); 1] = [("race.bin", &content)];
        let (a, b) = tokio::join!(
            app.upload(&alice.token, &alice_files),
            app.upload(&bob.token, &bob_files),
        );

        assert_eq!(a.status, 201, "{}", a.text);
        assert_eq!(b.status, 201, "{}", b.text);
        let deduplicated: Vec<bool> = [&a, &b]
            .iter()
            .map(|res| res.body["files"][0]["deduplicated"].as_bool().unwrap())
            .collect();
        assert_eq!(deduplicated.iter().filter(|d| **d).count(), 1);

        let physical = app.physical_files().await;
        assert_eq!(physical.len(), 1);
        assert_eq!(physical[0].ref_count, 2);
        assert_eq!(app.store.uploads(), 2);
        assert_eq!(app.store.destroys(), 1);
        assert!(app.store.object_exists(&physical[0].remote_object_id));
        assert_eq!(app.user_file_count().await, 2);
    }
}

mod quota {
    use super::*;

    async fn app_with_quota() -> TestApp {
        TestApp::spawn_with(TestOptions {
            quota_bytes: (10 * MB) as u64,
            ..Default::default()
        })
        .await
    }

    #[tokio::test]
    async fn new_content_over_quota_is_rejected() {
        let app = app_with_quota().await;
        let alice = app.create_user("alice").await;
        app.upload_one(&alice.token, "big.bin", &vec![1u8; 9 * MB]).await;

        let res = app.upload(&alice.token, &[("more.bin", &vec![2u8; 2 * MB])]).await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "QUOTA_EXCEEDED");
        assert_eq!(
            res.body["message"],
            "Storage quota exceeded. Current: 9.00 MB, Limit: 10.00 MB"
        );
        assert_eq!(app.user_file_count().await, 1);
        assert_eq!(app.store.uploads(), 1);
    }

    #[tokio::test]
    async fn duplicate_content_is_free_even_at_the_limit() {
        let app = app_with_quota().await;
        let alice = app.create_user("alice").await;
        let big = vec![1u8; 9 * MB];
        app.upload_one(&alice.token, "big.bin", &big).await;

        let res = app.upload(&alice.token, &[("copy.bin", &big)]).await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["files"][0]["deduplicated"], true);
    }

    #[tokio::test]
    async fn content_owned_by_someone_else_does_not_count_as_new() {
        let app = app_with_quota().await;
        let alice = app.create_user("alice").await;
        let bob = app.create_user("bob").await;
        let shared = vec![3u8; 6 * MB];
        app.upload_one(&alice.token, "a.bin", &shared).await;
        app.upload_one(&bob.token, "b.bin", &vec![4u8; 6 * MB]).await;

        let res = app.upload(&bob.token, &[("a-copy.bin", &shared)]).await;

        assert_eq!(res.status, 201, "{}", res.text);
    }

    #[tokio::test]
    async fn batch_is_rejected_as_a_whole() {
        let app = app_with_quota().await;
        let alice = app.create_user("alice").await;

        let res = app
            .upload(
                &alice.token,
                &[("a.bin", &vec![1u8; 6 * MB]), ("b.bin", &vec![2u8; 6 * MB])],
            )
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "QUOTA_EXCEEDED");
        assert_eq!(app.user_file_count().await, 0);
        assert_eq!(app.store.uploads(), 0);
    }

    #[tokio::test]
    async fn repeated_content_in_a_batch_is_counted_once() {
        let app = app_with_quota().await;
        let alice = app.create_user("alice").await;
        let content = vec![1u8; 6 * MB];

        let res = app
            .upload(&alice.token, &[("a.bin", &content), ("b.bin", &content)])
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["uploadedCount"], 2);
    }
}

mod remote_failures {
    use super::*;

    #[tokio::test]
    async fn failed_remote_upload_stores_nothing() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;
        app.store.fail_uploads_after(0);

        let res = app.upload(&alice.token, &[("a.txt", b"hello")]).await;

        assert_eq!(res.status, 502);
        assert_eq!(res.body["code"], "REMOTE_STORE_ERROR");
        assert_eq!(app.user_file_count().await, 0);
        assert!(app.physical_files().await.is_empty());
    }

    #[tokio::test]
    async fn failure_mid_batch_keeps_earlier_files() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;
        app.store.fail_uploads_after(1);

        let res = app
            .upload(&alice.token, &[("first.txt", b"first"), ("second.txt", b"second")])
            .await;

        assert_eq!(res.status, 502);
        assert!(
            res.body["message"]
                .as_str()
                .unwrap()
                .ends_with("(1 file(s) were stored before the failure)"),
            "{}",
            res.text
        );
        assert_eq!(app.user_file_count().await, 1);
        let physical = app.physical_files().await;
        assert_eq!(physical.len(), 1);
        assert_eq!(physical[0].ref_count, 1);
    }

    #[tokio::test]
    async fn stalled_remote_upload_times_out_and_stores_nothing() {
        let app = TestApp::spawn_with(TestOptions {
            remote_timeout_ms: 200,
            ..Default::default()
        })
        .await;
        let alice = app.create_user("alice").await;
        app.store.set_delay(Duration::from_secs(30));

        let res = app.upload(&alice.token, &[("slow.txt", b"slow")]).await;

        assert_eq!(res.status, 502, "{}", res.text);
        assert_eq!(res.body["code"], "REMOTE_STORE_ERROR");
        assert_eq!(app.user_file_count().await, 0);
        assert!(app.physical_files().await.is_empty());
    }

    #[tokio::test]
    async fn deduplicated_upload_does_not_touch_the_remote_store() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;
        app.upload_one(&alice.token, "a.txt", b"hello").await;
        app.store.fail_uploads_after(0);

        let res = app.upload(&alice.token, &[("again.txt", b"hello")]).await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(app.physical_files().await[0].ref_count, 2);
    }
}

#[tokio::test]
async fn uploaded_object_is_served_from_the_object_route() {
    let app = TestApp::spawn().await;
    let alice = app.create_user("alice").await;
    let id = app.upload_one(&alice.token, "hello.txt", b"hello").await;

    let download = app.get_with_token(&routes::download(id), &alice.token).await;
    let location = download.location.expect("redirect location");
    let body = app
        .client
        .get(&location)
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert_eq!(body, "hello");
}
