//! End-to-end tests for API key protection

mod common;

use common::{TestClient, TestServer, TestServerOptions};
use reqwest::StatusCode;

#[tokio::test]
async fn test_home_requires_api_key() {
    let server = TestServer::spawn().await;

    let response = TestClient::new(server.base_url.clone()).home().await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = TestClient::authenticated(server.base_url.clone()).home().await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["uptime"].is_string());
    assert!(body["hash"].is_string());
}

#[tokio::test]
async fn test_missing_api_key_is_unauthorized() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    assert_eq!(client.list_songs().await.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        client.get_stats("whatever").await.status(),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        client.stream_song("whatever").await.status(),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        client.get_path("/media/whatever.mp3").await.status(),
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_wrong_api_key_is_unauthorized() {
    let server = TestServer::spawn().await;
    let client = TestClient::with_api_key(server.base_url.clone(), Some("not-the-key"));

    let response = client.list_songs().await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Invalid API key");
}

#[tokio::test]
async fn test_rejected_upload_leaves_no_file() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client
        .upload_song(vec![1, 2, 3], "a.mp3", "audio/mpeg", None, None)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(server.media_files().is_empty());
}

#[tokio::test]
async fn test_unconfigured_api_key_is_server_error() {
    let server = TestServer::spawn_with(TestServerOptions {
        api_key: None,
        ..Default::default()
    })
    .await;
    let client = TestClient::authenticated(server.base_url.clone());

    let response = client.list_songs().await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "API key not configured");
}
