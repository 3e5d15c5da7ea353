//! Collector client
//!
//! Both exchanges go through one generic POST-JSON call. Every failure, a
//! transport error or a non-2xx status, maps to `Error::Network`. Nothing
//! is retried; the caller decides what the user sees.

use super::payload::{BehaviorSnapshotPayload, ChallengeResultPayload, ChallengeVerdict, CollectResponse, Decision};
use crate::{Error, Result};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Behavior snapshot endpoint
pub const COLLECT_PATH: &str = "/collect";
/// Challenge result endpoint
pub const CHALLENGE_PATH: &str = "/challenge";
/// Collector used when nothing else is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
/// Environment variable overriding the configured collector base
pub const BASE_URL_VAR: &str = "LIVENESS_COLLECTOR_BASE";

/// POST a JSON body and read a JSON response
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn post_json(&self, url: &str, body: Value) -> Result<Value>;
}

impl<T: Transport + ?Sized> Transport for &T {
    async fn post_json(&self, url: &str, body: Value) -> Result<Value> {
        (**self).post_json(url, body).await
    }
}

/// reqwest-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    async fn post_json(&self, url: &str, body: Value) -> Result<Value> {
        let response = self.client.post(url).json(&body).send().await.map_err(|e| {
            warn!("{}: request failed: {}", url, e);
            Error::Network(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!("{}: non-success status ({})", url, status);
            return Err(Error::Network(format!("HTTP {}", status.as_u16())));
        }

        response.json::<Value>().await.map_err(|e| {
            warn!("{}: unreadable response body: {}", url, e);
            Error::Network(format!("invalid response body: {}", e))
        })
    }
}

/// Pick the collector base: `LIVENESS_COLLECTOR_BASE` wins over the configured value.
pub fn resolve_base_url(configured: &str) -> String {
    std::env::var(BASE_URL_VAR)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| configured.to_string())
}

/// Submits snapshots and challenge results to one collector
#[derive(Debug, Clone)]
pub struct CollectorClient<T> {
    transport: T,
    base: String,
}

impl<T: Transport> CollectorClient<T> {
    pub fn new(transport: T, base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            transport,
            base: base.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// `POST /collect`, returning the risk decision
    pub async fn submit_behavior_snapshot(&self, payload: &BehaviorSnapshotPayload) -> Result<Decision> {
        debug!(
            session_id = %payload.session_id,
            mouse = payload.behavior.mouse.len(),
            keys = payload.behavior.keys.len(),
            "Submitting behavior snapshot"
        );
        let body = serde_json::to_value(payload)?;
        let raw = self.transport.post_json(&self.endpoint(COLLECT_PATH), body).await?;
        let response: CollectResponse = serde_json::from_value(raw)
            .map_err(|e| Error::Network(format!("malformed /collect response: {}", e)))?;
        Ok(response.decision)
    }

    /// `POST /challenge`, returning whether the trail passed
    pub async fn submit_challenge_result(&self, payload: &ChallengeResultPayload) -> Result<ChallengeVerdict> {
        debug!(
            session_id = %payload.session_id,
            trail_len = payload.trail.len(),
            "Submitting challenge result"
        );
        let body = serde_json::to_value(payload)?;
        let raw = self.transport.post_json(&self.endpoint(CHALLENGE_PATH), body).await?;
        serde_json::from_value(raw)
            .map_err(|e| Error::Network(format!("malformed /challenge response: {}", e)))
    }
}
