//! HTTP execution seams.
//!
//! `jobo-core` only describes requests and interprets responses; a transport
//! moves them over the wire. Non-2xx statuses are returned as data so the
//! core's error translator sees them. Only failures that produced no response
//! at all (DNS, TLS, timeouts) become `JoboError::Transport`.

use std::time::Duration;

use async_trait::async_trait;
use jobo_core::{HttpMethod, HttpRequest, HttpResponse, JoboError};
use tracing::debug;

/// Upper bound on a response body. Full feed batches are large.
const MAX_BODY_BYTES: u64 = 64 * 1024 * 1024;

/// Executes requests for the blocking client.
pub trait Transport: Send + Sync {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, JoboError>;
}

/// Executes requests for the async client.
#[async_trait]
pub trait AsyncTransport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, JoboError>;
}

// ---------------------------------------------------------------------------
// ureq
// ---------------------------------------------------------------------------

/// Blocking transport backed by a ureq agent.
///
/// The agent pools connections, so one transport should be shared by every
/// call a client makes.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .new_agent();
        Self { agent }
    }

    /// Wrap a pre-configured agent. It must be built with
    /// `http_status_as_error(false)`, otherwise error bodies are lost.
    pub fn from_agent(agent: ureq::Agent) -> Self {
        Self { agent }
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

impl Transport for UreqTransport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, JoboError> {
        debug!(method = %request.method, url = %request.url, "sending request");

        let result = match request.method {
            HttpMethod::Get => with_headers(self.agent.get(&request.url), &request.headers).call(),
            HttpMethod::Delete => {
                with_headers(self.agent.delete(&request.url), &request.headers).call()
            }
            HttpMethod::Post => {
                let builder = with_headers(self.agent.post(&request.url), &request.headers);
                match &request.body {
                    Some(body) => builder.send(body.as_bytes()),
                    None => builder.send_empty(),
                }
            }
        };

        let mut response = match result {
            Ok(response) => response,
            // Only reachable with an agent that treats statuses as errors.
            Err(ureq::Error::StatusCode(status)) => {
                debug!(status, url = %request.url, "received response without body");
                return Ok(HttpResponse::new(status, ""));
            }
            Err(err) => return Err(JoboError::transport(err)),
        };

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .with_config()
            .limit(MAX_BODY_BYTES)
            .read_to_string()
            .map_err(JoboError::transport)?;

        debug!(status, url = %request.url, bytes = body.len(), "received response");
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

// ---------------------------------------------------------------------------
// reqwest
// ---------------------------------------------------------------------------

/// Async transport backed by a `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, JoboError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(JoboError::transport)?;
        Ok(Self { client })
    }

    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AsyncTransport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, JoboError> {
        debug!(method = %request.method, url = %request.url, "sending request");

        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };
        let mut builder = self.client.request(method, request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(JoboError::transport)?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response.text().await.map_err(JoboError::transport)?;

        debug!(status, url = %request.url, bytes = body.len(), "received response");
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
