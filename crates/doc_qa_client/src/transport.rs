//! HTTP client: POST the multipart payload and hand back the streaming body.

use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::compose::Payload;
use crate::config::Config;
use crate::error::{describe, TransportError};

/// Error body returned by the service on a rejected request.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Extract the `error` field from a JSON error body, if there is one.
fn error_detail(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .map(|b| b.error)
        .filter(|e| !e.trim().is_empty())
}

/// Most of a rejection body that is kept for the failure message.
const MAX_ERROR_BODY: usize = 4 * 1024;

/// Read at most [`MAX_ERROR_BODY`] bytes of a rejection body. A body that
/// breaks off early yields whatever arrived.
async fn read_error_body(mut response: reqwest::Response) -> String {
    let mut body = Vec::new();
    while body.len() < MAX_ERROR_BODY {
        match response.chunk().await {
            Ok(Some(chunk)) => body.extend_from_slice(&chunk),
            Ok(None) => break,
            Err(e) => {
                debug!(error = %e, "error body read failed");
                break;
            }
        }
    }
    body.truncate(MAX_ERROR_BODY);
    String::from_utf8_lossy(&body).into_owned()
}

/// Single-endpoint HTTP transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    url: String,
    response_timeout: Option<Duration>,
}

impl HttpTransport {
    pub fn new(config: &Config) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.client.connect_timeout())
            .build()
            .map_err(|e| TransportError::Request(describe(&e)))?;
        Ok(Self {
            http,
            url: config.server.endpoint_url(),
            response_timeout: config.client.response_timeout(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send `payload` and wait for the response headers.
    ///
    /// Returns the response only for a success status; its body has not been
    /// read yet.
    pub async fn dispatch(&self, payload: Payload) -> Result<reqwest::Response, TransportError> {
        let parts = payload.parts.len();
        let form = payload
            .into_form()
            .map_err(|e| TransportError::Request(describe(&e)))?;
        debug!(url = %self.url, parts, "dispatching request");

        // One deadline covers the headers and, on a rejection, the error body.
        let deadline = self
            .response_timeout
            .map(|limit| (limit, tokio::time::Instant::now() + limit));
        let send = self.http.post(&self.url).multipart(form).send();
        let result = match deadline {
            Some((limit, at)) => tokio::time::timeout_at(at, send)
                .await
                .map_err(|_| TransportError::TimedOut(limit))?,
            None => send.await,
        };
        let response = result.map_err(|e| {
            if e.is_connect() {
                TransportError::Connect(describe(&e))
            } else {
                TransportError::Request(describe(&e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let read = read_error_body(response);
            let body = match deadline {
                Some((_, at)) => tokio::time::timeout_at(at, read).await.ok(),
                None => Some(read.await),
            };
            if body.is_none() {
                debug!(status = status.as_u16(), "error body not received in time");
            }
            let detail = body.as_deref().and_then(error_detail);
            warn!(status = status.as_u16(), ?detail, "server rejected request");
            return Err(TransportError::Status {
                status: status.as_u16(),
                detail,
            });
        }

        debug!(status = status.as_u16(), "response headers received");
        Ok(response)
    }
}
