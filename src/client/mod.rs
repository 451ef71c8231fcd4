//! Client for the coverage agent registry
//!
//! Lists the instrumented processes registered with a goc server and renders
//! them as a table.
//!
//! # Example
//!
//! ```no_run
//! use gocbox::client::{render_agents, AgentClient, TerminalWidth};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = AgentClient::new("http://127.0.0.1:7777", Duration::from_secs(30))?;
//! let agents = client.list_agents().await?;
//! print!("{}", render_agents(&agents, false, &TerminalWidth));
//! # Ok(())
//! # }
//! ```

pub mod table;

pub use table::{render_agents, simple_cmdline, FixedWidth, TerminalWidth, WidthProvider};

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Path of the agent listing endpoint
pub const AGENTS_LIST_API: &str = "/v2/rpcagents";

/// Errors from the agent listing client
#[derive(Debug, Error)]
pub enum ListError {
    /// The server address is not a valid absolute URL
    #[error("parse url {host} failed: {reason}")]
    InvalidHost { host: String, reason: String },

    /// Connection, timeout or transport failure that may succeed on retry
    #[error("goc list failed: {0}")]
    NetworkTransient(String),

    /// Any other request failure
    #[error("goc list failed: {0}")]
    Network(String),

    /// The response body was not the expected JSON
    #[error("goc list failed: json unmarshal failed: {0}")]
    ResponseDecode(String),
}

/// A covered process registered with the server
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Agent {
    pub id: String,
    #[serde(rename = "remoteip")]
    pub remote_ip: String,
    pub hostname: String,
    #[serde(rename = "cmdline")]
    pub cmd_line: String,
    pub pid: String,
}

/// Body of the listing response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentList {
    pub items: Vec<Agent>,
}

/// Fetches raw response bodies
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<Vec<u8>, ListError>;
}

/// reqwest backed transport
pub struct HttpTransport {
    http_client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, ListError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ListError::Network(format!("cannot build HTTP client: {}", e)))?;
        Ok(Self { http_client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<Vec<u8>, ListError> {
        let response = self.http_client.get(url).send().await.map_err(classify)?;
        let status = response.status();
        let body = response.bytes().await.map_err(classify)?;
        debug!(%status, bytes = body.len(), "agent list response");
        Ok(body.to_vec())
    }
}

fn classify(e: reqwest::Error) -> ListError {
    if e.is_connect() || e.is_timeout() || e.is_request() || e.is_body() {
        ListError::NetworkTransient(e.to_string())
    } else {
        ListError::Network(e.to_string())
    }
}

/// Talks to the agent registry at `host`
pub struct AgentClient<T: Transport = HttpTransport> {
    host: String,
    transport: T,
}

impl AgentClient<HttpTransport> {
    pub fn new(host: &str, timeout: Duration) -> Result<Self, ListError> {
        Self::with_transport(host, HttpTransport::new(timeout)?)
    }
}

impl<T: Transport> AgentClient<T> {
    /// Creates a client with a custom transport; `host` must be an absolute URL
    pub fn with_transport(host: &str, transport: T) -> Result<Self, ListError> {
        Url::parse(host).map_err(|e| ListError::InvalidHost {
            host: host.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            host: host.trim_end_matches('/').to_string(),
            transport,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Lists all registered agents.
    ///
    /// A transient network failure is retried exactly once; every other
    /// failure is returned as is.
    pub async fn list_agents(&self) -> Result<Vec<Agent>, ListError> {
        let url = format!("{}{}", self.host, AGENTS_LIST_API);
        debug!(url = %url, "listing agents");

        let body = match self.transport.get(&url).await {
            Err(ListError::NetworkTransient(reason)) => {
                warn!(error = %reason, "agent list request failed, retrying once");
                self.transport.get(&url).await?
            }
            other => other?,
        };

        let list: AgentList = serde_json::from_slice(&body)
            .map_err(|e| ListError::ResponseDecode(e.to_string()))?;
        Ok(list.items)
    }
}
