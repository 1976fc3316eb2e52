//! End-to-end token refresh scenarios through the public client

use futures::future::join_all;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use stockroom::{
    ApiClient, BroadcastRedirect, ClientConfig, ClientError, FileSessionStore, LoginRequest,
    MemorySessionStore, SessionCookieJar, SessionStore, TerminalReason,
};
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const REFRESH_PATH: &str = "/api/auth/refresh-token";
const MATERIALS: &str = "/api/rawMaterial/all";

fn client(server: &MockServer, store: Arc<dyn SessionStore>, redirect: BroadcastRedirect) -> ApiClient {
    ApiClient::builder(ClientConfig::new(server.uri()))
        .with_session_store(store)
        .with_login_redirect(Arc::new(redirect))
        .no_proxy()
        .build()
        .unwrap()
}

async fn mount_materials(server: &MockServer, token: &str, status: u16, expected: u64) {
    Mock::given(method("GET"))
        .and(path(MATERIALS))
        .and(header("authorization", format!("Bearer {}", token).as_str()))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!([{ "name": "Flour" }])))
        .expect(expected)
        .mount(server)
        .await;
}

#[tokio::test]
async fn expired_token_is_refreshed_and_request_retried() {
    let server = MockServer::start().await;
    mount_materials(&server, "A", 401, 1).await;
    mount_materials(&server, "B", 200, 1).await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true, "accessToken": "B" })))
        .expect(1)
        .mount(&server)
        .await;

    let redirect = BroadcastRedirect::default();
    let mut rx = redirect.subscribe();
    let store = Arc::new(MemorySessionStore::with_token("A"));
    let client = client(&server, store.clone(), redirect);

    let materials: Vec<serde_json::Value> = client.get_json(MATERIALS).await.unwrap();

    assert_eq!(materials.len(), 1);
    assert_eq!(store.token().unwrap().as_deref(), Some("B"));
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn failed_refresh_ends_the_session() {
    let server = MockServer::start().await;
    mount_materials(&server, "A", 401, 1).await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "success": false })))
        .expect(1)
        .mount(&server)
        .await;

    let redirect = BroadcastRedirect::default();
    let mut rx = redirect.subscribe();
    let store = Arc::new(MemorySessionStore::with_token("A"));
    let client = client(&server, store.clone(), redirect);

    let err = client.get(MATERIALS).await.unwrap_err();

    assert!(matches!(
        err,
        ClientError::AuthExpired {
            reason: TerminalReason::RefreshEndpointRejected
        }
    ));
    assert!(!client.session().unwrap().is_authenticated());
    assert_eq!(rx.try_recv().unwrap(), TerminalReason::RefreshEndpointRejected);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn concurrent_expiries_share_one_refresh() {
    let server = MockServer::start().await;
    mount_materials(&server, "A", 401, 4).await;
    mount_materials(&server, "B", 200, 4).await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "success": true, "accessToken": "B" }))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemorySessionStore::with_token("A"));
    let client = client(&server, store, BroadcastRedirect::default());

    let calls = (0..4).map(|_| client.get(MATERIALS));
    for result in join_all(calls).await {
        assert_eq!(result.unwrap().status().as_u16(), 200);
    }
}

#[tokio::test]
async fn session_survives_restart() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "refreshToken=r1; HttpOnly; Path=/")
                .set_body_json(json!({
                    "success": true,
                    "accessToken": "A",
                    "user": { "id": "u-1", "name": "Asha", "email": "asha@example.com" }
                })),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_materials(&server, "A", 401, 1).await;
    mount_materials(&server, "B", 200, 1).await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .and(header("cookie", "refreshToken=r1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true, "accessToken": "B" })))
        .expect(1)
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let open = |dir: &TempDir| {
        ApiClient::builder(ClientConfig::new(server.uri()))
            .with_session_store(Arc::new(FileSessionStore::new(dir.path())))
            .with_cookie_jar(Arc::new(SessionCookieJar::persistent(dir.path())))
            .no_proxy()
            .build()
            .unwrap()
    };

    open(&temp_dir)
        .login(&LoginRequest::new("asha@example.com", "pw"))
        .await
        .unwrap();

    // a fresh process only has what was written to disk
    let restarted = open(&temp_dir);
    assert_eq!(restarted.current_user().unwrap().unwrap().name, "Asha");
    let response = restarted.get(MATERIALS).await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(restarted.session().unwrap().access_token.as_deref(), Some("B"));
}
