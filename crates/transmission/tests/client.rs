//! Integration tests for the RPC client against a mock daemon, covering the
//! session-token handshake, retry exhaustion, and wire shapes.

use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

use transmission::{TorrentStatus, TransClient, TransmissionError};

const RPC_PATH: &str = "/transmission/rpc";
const SESSION_HEADER: &str = "x-transmission-session-id";

/// Matches requests carrying the given session token.
struct WithSession(&'static str);

impl Match for WithSession {
    fn matches(&self, request: &Request) -> bool {
        request
            .headers
            .get(SESSION_HEADER)
            .and_then(|value| value.to_str().ok())
            == Some(self.0)
    }
}

/// Matches requests without the given session token.
struct WithoutSession(&'static str);

impl Match for WithoutSession {
    fn matches(&self, request: &Request) -> bool {
        !WithSession(self.0).matches(request)
    }
}

fn client(server: &MockServer) -> TransClient {
    TransClient::new(format!("{}{}", server.uri(), RPC_PATH), None, None)
}

fn success_torrents() -> serde_json::Value {
    json!({
        "result": "success",
        "arguments": {
            "torrents": [{
                "id": 1,
                "name": "linux.iso",
                "downloadDir": "/srv/seed",
                "percentDone": 1.0,
                "sizeWhenDone": 1024,
                "status": 6,
                "activityDate": 1700000000,
                "files": [{"name": "linux.iso", "length": 1024}]
            }]
        }
    })
}

#[tokio::test]
async fn session_token_is_fetched_and_reused() {
    let server = MockServer::start().await;

    // The daemon hands the token out on the probe, itself a 409.
    Mock::given(method("GET"))
        .and(path(RPC_PATH))
        .respond_with(ResponseTemplate::new(409).insert_header(SESSION_HEADER, "tok-1"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(RPC_PATH))
        .and(WithoutSession("tok-1"))
        .respond_with(ResponseTemplate::new(409))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(RPC_PATH))
        .and(WithSession("tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(success_torrents()))
        .expect(2)
        .mount(&server)
        .await;

    let client = client(&server);
    let torrents = client
        .torrent_get(&["id", "name", "files"], None)
        .await
        .unwrap();
    assert_eq!(torrents.len(), 1);
    assert_eq!(torrents[0].name, "linux.iso");
    assert_eq!(torrents[0].status, TorrentStatus::Seed);
    assert_eq!(torrents[0].files[0].length, 1024);

    // The second call reuses the token without another probe.
    client.torrent_get(&["id"], None).await.unwrap();
}

#[tokio::test]
async fn persistent_conflict_exhausts_the_attempt_budget() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(RPC_PATH))
        .respond_with(ResponseTemplate::new(409).insert_header(SESSION_HEADER, "stale"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(RPC_PATH))
        .respond_with(ResponseTemplate::new(409))
        .expect(4)
        .mount(&server)
        .await;

    let err = client(&server).torrent_start().await.unwrap_err();
    match err {
        TransmissionError::Connection { attempts, status } => {
            assert_eq!(attempts, 4);
            assert_eq!(status, 409);
        }
        other => panic!("expected connection error, got {other}"),
    }
}

#[tokio::test]
async fn auth_rejection_fails_without_retry() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(RPC_PATH))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server).torrent_start().await.unwrap_err();
    assert!(matches!(err, TransmissionError::Auth(401)));
}

#[tokio::test]
async fn non_success_result_is_an_rpc_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(RPC_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"result": "invalid argument"})),
        )
        .mount(&server)
        .await;

    let err = client(&server).torrent_start().await.unwrap_err();
    match err {
        TransmissionError::Rpc(reason) => assert_eq!(reason, "invalid argument"),
        other => panic!("expected rpc error, got {other}"),
    }
}

#[tokio::test]
async fn remove_sends_the_exact_wire_shape() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(RPC_PATH))
        .and(body_json(json!({
            "method": "torrent-remove",
            "arguments": {"ids": [3, 8], "delete-local-data": true}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": "success"})))
        .expect(1)
        .mount(&server)
        .await;

    client(&server).torrent_remove(&[3, 8], true).await.unwrap();
}

#[tokio::test]
async fn set_location_sends_the_exact_wire_shape() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(RPC_PATH))
        .and(body_json(json!({
            "method": "torrent-set-location",
            "arguments": {"ids": [5], "location": "/srv/seed", "move": false}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": "success"})))
        .expect(1)
        .mount(&server)
        .await;

    client(&server)
        .torrent_set_location(&[5], "/srv/seed", false)
        .await
        .unwrap();
}

#[tokio::test]
async fn missing_torrent_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(RPC_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": "success",
            "arguments": {"torrents": []}
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .torrent_get_one(&["id"], 99)
        .await
        .unwrap_err();
    assert!(matches!(err, TransmissionError::NotFound(99)));
}
