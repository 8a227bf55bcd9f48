use serde_json::json;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn reports_deduplication_savings_and_activity() {
    let app = TestApp::spawn().await;
    let alice = app.create_user("alice").await;
    app.create_user("bob").await;
    let big = app.upload_one(&alice.token, "big.txt", &[b'x'; 1000]).await;
    app.upload_one(&alice.token, "copy.txt", &[b'x'; 1000]).await;
    app.upload_one(&alice.token, "small.txt", b"small").await;

    app.post_with_token(
        &routes::share(big),
        &json!({"shareWithUsername": "bob"}),
        &alice.token,
    )
    .await;
    app.get_with_token(&routes::download(big), &alice.token).await;

    let res = app.get_with_token(routes::ANALYTICS, &alice.token).await;

    assert_eq!(res.status, 200, "{}", res.text);
    let stats = &res.body["storageStatistics"];
    assert_eq!(stats["originalUsageBytes"], 2005);
    assert_eq!(stats["deduplicatedUsageBytes"], 1005);
    assert_eq!(stats["savingsBytes"], 1000);
    assert!(stats["savingsPercentage"].as_f64().unwrap() > 49.0);

    assert_eq!(res.body["uploadsByDay"][0]["count"], 3);
    assert_eq!(res.body["fileTypeBreakdown"][0]["count"], 3);
    assert_eq!(res.body["topDownloadedFiles"][0]["filename"], "big.txt");
    assert_eq!(res.body["topDownloadedFiles"].as_array().unwrap().len(), 1);
    assert_eq!(
        res.body["sharingAnalytics"]["mostSharedFiles"][0]["shareCount"],
        1
    );
    assert_eq!(
        res.body["sharingAnalytics"]["topCollaborators"][0]["recipientName"],
        "bob display"
    );
    assert_eq!(
        res.body["fileSizeAnalytics"]["largestFiles"]
            .as_array()
            .unwrap()
            .len(),
        3
    );
}

#[tokio::test]
async fn empty_account_has_zeroed_statistics() {
    let app = TestApp::spawn().await;
    let alice = app.create_user("alice").await;

    let res = app.get_with_token(routes::ANALYTICS, &alice.token).await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["storageStatistics"]["originalUsageBytes"], 0);
    assert_eq!(res.body["storageStatistics"]["savingsPercentage"], 0.0);
    assert_eq!(res.body["uploadsByDay"].as_array().unwrap().len(), 0);
}
