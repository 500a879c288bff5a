//! Release client against a mock registry.

use mockito::Server;
use serde_json::json;
use tagsync::config::RegistryConfig;
use tagsync::core::UpdaterError;
use tagsync::git::RepositoryIdentity;
use tagsync::release::{ReleaseClient, ReleaseDescriptor};

fn acme_app() -> RepositoryIdentity {
    RepositoryIdentity {
        owner: "acme".to_string(),
        name: "app".to_string(),
    }
}

#[tokio::test]
async fn test_client_from_config_sends_token_and_user_agent() {
    tagsync::test_utils::init_test_logging(None);
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/repos/acme/app/releases/latest")
        .match_header("authorization", "Bearer s3cret")
        .match_header("user-agent", "tagsync-tests")
        .match_header("accept", "application/vnd.github+json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "tag_name": "v3.1.0",
                "name": "Spring release",
                "author": {"login": "release-bot"}
            })
            .to_string(),
        )
        .create_async()
        .await;

    let config = RegistryConfig {
        base_url: server.url(),
        token: Some("s3cret".to_string()),
        user_agent: "tagsync-tests".to_string(),
        ..RegistryConfig::default()
    };
    let client = ReleaseClient::from_config(&config).unwrap();

    let release = client.fetch_latest_release(&acme_app()).await.unwrap();
    assert_eq!(
        release,
        ReleaseDescriptor {
            tag: "v3.1.0".to_string(),
            author: "release-bot".to_string(),
            summary: "Spring release".to_string(),
        }
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn test_server_error_is_not_retried() {
    tagsync::test_utils::init_test_logging(None);
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/repos/acme/app/releases/latest")
        .with_status(503)
        .expect(1)
        .create_async()
        .await;

    let client = ReleaseClient::new(server.url()).unwrap();
    let err = client.fetch_latest_release(&acme_app()).await.unwrap_err();
    assert!(
        matches!(err, UpdaterError::RegistryError { status_code: 503, .. }),
        "unexpected error: {err:?}"
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn test_non_json_body_is_malformed() {
    tagsync::test_utils::init_test_logging(None);
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/repos/acme/app/releases/latest")
        .with_status(200)
        .with_body("<html>maintenance</html>")
        .create_async()
        .await;

    let client = ReleaseClient::new(server.url()).unwrap();
    let err = client.fetch_latest_release(&acme_app()).await.unwrap_err();
    assert!(matches!(err, UpdaterError::MalformedResponse { .. }), "unexpected error: {err:?}");
}
