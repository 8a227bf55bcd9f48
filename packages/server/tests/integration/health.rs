use crate::common::{TestApp, routes};

#[tokio::test]
async fn reports_healthy_database() {
    let app = TestApp::spawn().await;

    let res = app.get_without_token(routes::HEALTH).await;

    assert_eq!(res.status, 200);
    assert_eq!(res.body["status"], "healthy");
    assert!(res.body["time"].is_string());
}

#[tokio::test]
async fn openapi_document_lists_file_routes() {
    let app = TestApp::spawn().await;

    let res = app.get_without_token("/api-docs/openapi.json").await;

    assert_eq!(res.status, 200);
    assert!(res.body["paths"]["/api/v1/files/upload"].is_object());
    assert!(res.body["paths"]["/api/v1/files/public/{id}"].is_object());
}
