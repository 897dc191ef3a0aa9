//! Typed HTTP client for the swarm audit server.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::config::{Config, DirectoryEndpoint};
use crate::domain::{CheckResult, NodeId};
use crate::error::{Result, WatchError};
use crate::token::Token;
use crate::transport::AuditApi;

pub struct AuditClient {
    base_url: String,
    directory: DirectoryEndpoint,
    http: Client,
}

impl AuditClient {
    pub fn new(base_url: &str, directory: DirectoryEndpoint) -> Result<Self> {
        Self::build(base_url, directory, Duration::from_secs(10), false)
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::build(
            &config.server_url,
            config.directory,
            Duration::from_secs(config.request_timeout_secs),
            config.accept_invalid_certs,
        )
    }

    fn build(
        base_url: &str,
        directory: DirectoryEndpoint,
        timeout: Duration,
        accept_invalid_certs: bool,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()
            .map_err(|e| WatchError::Config(format!("building HTTP client: {e}")))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            directory,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Split the directory body (`"id1 id2 "`) into node ids.
pub fn parse_node_list(body: &str) -> Vec<NodeId> {
    body.split_whitespace().map(NodeId::from).collect()
}

/// Interpret a readiness answer.
///
/// The server writes `true` once per stored submission for the node, so a
/// node that reported twice answers `truetrue`.
pub fn parse_readiness(body: &str) -> Option<bool> {
    match body.trim() {
        "false" => Some(false),
        "" => None,
        answer if answer.len() % 4 == 0 && answer.as_bytes().chunks(4).all(|c| c == b"true") => {
            Some(true)
        }
        _ => None,
    }
}

#[async_trait]
impl AuditApi for AuditClient {
    async fn list_nodes(&self) -> Result<Vec<NodeId>> {
        let url = self.url(self.directory.path());
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| WatchError::Directory(format!("GET {url}: {e}")))?;

        if !resp.status().is_success() {
            return Err(WatchError::Directory(format!(
                "{url} returned {}",
                resp.status()
            )));
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| WatchError::Directory(format!("reading response from {url}: {e}")))?;
        let body = std::str::from_utf8(&body)
            .map_err(|e| WatchError::Directory(format!("{url} returned a non-text body: {e}")))?;
        let nodes = parse_node_list(body);
        debug!(count = nodes.len(), "node directory resolved");
        Ok(nodes)
    }

    async fn check_ready(&self, node: &NodeId) -> Result<bool> {
        let url = self.url("/checkNode");
        let poll_err = |message: String| WatchError::Poll {
            node: node.clone(),
            message,
        };

        let resp = self
            .http
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "text/html")
            .body(node.as_str().to_string())
            .send()
            .await
            .map_err(|e| poll_err(format!("POST {url}: {e}")))?;

        if !resp.status().is_success() {
            return Err(poll_err(format!("{url} returned {}", resp.status())));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| poll_err(format!("reading response from {url}: {e}")))?;
        parse_readiness(&body).ok_or_else(|| poll_err(format!("unexpected answer {body:?}")))
    }

    async fn fetch_results(&self, node: &NodeId, token: &Token) -> Result<Vec<CheckResult>> {
        let url = self.url("/result");
        let fetch_err = |message: String| WatchError::Fetch {
            node: node.clone(),
            message,
        };

        let resp = self
            .http
            .get(&url)
            .query(&[("nodeID", node.as_str())])
            .header(reqwest::header::AUTHORIZATION, token.bearer())
            .send()
            .await
            .map_err(|e| fetch_err(format!("GET {url}: {e}")))?;

        if resp.status() != StatusCode::OK {
            return Err(fetch_err(format!("{url} returned {}", resp.status())));
        }

        resp.json()
            .await
            .map_err(|e| fetch_err(format!("parsing response from {url}: {e}")))
    }
}
