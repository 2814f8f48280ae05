use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::RwLock;

use crate::error::TransmissionError;
use crate::models::Torrent;
use crate::Result;

const SESSION_HEADER: &str = "X-Transmission-Session-Id";
const MAX_ATTEMPTS: u32 = 4;

/// A client for one Transmission RPC endpoint.
///
/// The daemon rejects requests that do not carry the current session token
/// with HTTP 409; the client refreshes the token and retries, giving each
/// RPC a bounded attempt budget.
pub struct TransClient {
    client: Client,
    url: String,
    auth: Option<(String, String)>,
    session_id: RwLock<Option<String>>,
}

#[derive(Deserialize)]
struct RpcResponse {
    result: String,
    #[serde(default)]
    arguments: Value,
}

impl TransClient {
    /// Create a client for `url` (the full RPC endpoint, e.g.
    /// `http://127.0.0.1:9091/transmission/rpc`).
    pub fn new(url: impl Into<String>, username: Option<String>, password: Option<String>) -> Self {
        let auth = match (username, password) {
            (Some(user), Some(pass)) if !user.is_empty() => Some((user, pass)),
            _ => None,
        };
        Self {
            client: Client::new(),
            url: url.into(),
            auth,
            session_id: RwLock::new(None),
        }
    }

    /// List torrents. `ids` of `None` means every torrent the daemon knows.
    pub async fn torrent_get(&self, fields: &[&str], ids: Option<&[i64]>) -> Result<Vec<Torrent>> {
        let mut arguments = json!({ "fields": fields });
        if let Some(ids) = ids {
            arguments["ids"] = json!(ids);
        }
        let reply = self.call("torrent-get", Some(arguments)).await?;
        let torrents = reply.get("torrents").cloned().unwrap_or_else(|| json!([]));
        Ok(serde_json::from_value(torrents)?)
    }

    /// Fetch a single torrent by id.
    pub async fn torrent_get_one(&self, fields: &[&str], id: i64) -> Result<Torrent> {
        self.torrent_get(fields, Some(&[id]))
            .await?
            .into_iter()
            .next()
            .ok_or(TransmissionError::NotFound(id))
    }

    /// Point the daemon at a new location for the given torrents. With
    /// `move_data` false the data is expected to already be there.
    pub async fn torrent_set_location(
        &self,
        ids: &[i64],
        location: &str,
        move_data: bool,
    ) -> Result<()> {
        self.call(
            "torrent-set-location",
            Some(json!({ "ids": ids, "location": location, "move": move_data })),
        )
        .await
        .map(drop)
    }

    /// Remove torrents, optionally deleting their payload from disk.
    pub async fn torrent_remove(&self, ids: &[i64], delete_local_data: bool) -> Result<()> {
        self.call(
            "torrent-remove",
            Some(json!({ "ids": ids, "delete-local-data": delete_local_data })),
        )
        .await
        .map(drop)
    }

    /// Resume all torrents.
    pub async fn torrent_start(&self) -> Result<()> {
        self.call("torrent-start", None).await.map(drop)
    }

    async fn call(&self, method: &str, arguments: Option<Value>) -> Result<Value> {
        let mut body = json!({ "method": method });
        if let Some(arguments) = arguments {
            body["arguments"] = arguments;
        }

        let mut last_status = 0;
        for attempt in 1..=MAX_ATTEMPTS {
            tracing::debug!(method, attempt, "rpc request");
            let mut request = self.client.post(&self.url).json(&body);
            if let Some((user, pass)) = &self.auth {
                request = request.basic_auth(user, Some(pass));
            }
            if let Some(token) = self.session_id.read().await.clone() {
                request = request.header(SESSION_HEADER, token);
            }

            let response = match request.send().await {
                Ok(response) => response,
                Err(err) if attempt < MAX_ATTEMPTS => {
                    tracing::debug!(method, error = %err, "transport error, retrying");
                    continue;
                }
                Err(err) => return Err(err.into()),
            };

            let status = response.status();
            last_status = status.as_u16();
            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                return Err(TransmissionError::Auth(last_status));
            }
            if status == StatusCode::CONFLICT {
                // Stale or missing session token.
                self.refresh_session().await?;
                continue;
            }
            if !status.is_success() {
                tracing::debug!(method, status = last_status, "rpc http error");
                continue;
            }

            let reply: RpcResponse = response.json().await?;
            if reply.result == "success" {
                return Ok(reply.arguments);
            }
            return Err(TransmissionError::Rpc(reply.result));
        }

        Err(TransmissionError::Connection {
            attempts: MAX_ATTEMPTS,
            status: last_status,
        })
    }

    /// Fetch a fresh session token. The daemon hands it out in a response
    /// header no matter the status code of the probe request.
    async fn refresh_session(&self) -> Result<()> {
        let mut request = self.client.get(&self.url);
        if let Some((user, pass)) = &self.auth {
            request = request.basic_auth(user, Some(pass));
        }
        let response = request.send().await?;
        if let Some(token) = response
            .headers()
            .get(SESSION_HEADER)
            .and_then(|value| value.to_str().ok())
        {
            tracing::debug!("session token refreshed");
            *self.session_id.write().await = Some(token.to_owned());
        }
        Ok(())
    }
}
