use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use shoe_core::{ToolHandler, ToolRecord};
use thiserror::Error;
use tracing::{info, warn};

pub const DEFAULT_FAQ_URL: &str = "https://shoe-faq-agent-production.up.railway.app/lookup";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(12);

/// Returned when the service answers without an `answer` field.
pub const NO_MATCH: &str = "No matching answer found.";

pub const TOOL_NAME: &str = "lookup_faq";

#[derive(Debug, Error)]
pub enum LookupFailure {
    #[error("failed to build FAQ lookup client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("FAQ lookup request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("FAQ lookup returned HTTP {status}")]
    Status { status: StatusCode },
    #[error("FAQ lookup returned a body that is not JSON: {0}")]
    Decode(#[source] serde_json::Error),
}

impl LookupFailure {
    pub fn is_timeout(&self) -> bool {
        matches!(self, LookupFailure::Transport(e) if e.is_timeout())
    }
}

#[derive(Debug, Serialize)]
struct LookupRequest<'a> {
    question: &'a str,
}

#[derive(Debug, Deserialize)]
struct LookupArgs {
    question: String,
}

/// Client for the hosted FAQ sheet. One POST per lookup, no retries.
#[derive(Debug, Clone)]
pub struct FaqLookup {
    http: reqwest::Client,
    url: String,
}

impl FaqLookup {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, LookupFailure> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(LookupFailure::Client)?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }

    /// Reads `FAQ_LOOKUP_URL` and `FAQ_LOOKUP_TIMEOUT_SECS`, falling back to
    /// the hosted service and a 12 second timeout.
    pub fn from_env() -> anyhow::Result<Self> {
        let url = std::env::var("FAQ_LOOKUP_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FAQ_URL.to_string());
        let timeout = match std::env::var("FAQ_LOOKUP_TIMEOUT_SECS") {
            Ok(raw) => Duration::from_secs(
                raw.trim()
                    .parse()
                    .with_context(|| format!("FAQ_LOOKUP_TIMEOUT_SECS is not a number: {raw}"))?,
            ),
            Err(_) => DEFAULT_TIMEOUT,
        };

        Ok(Self::new(url, timeout)?)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn lookup(&self, question: &str) -> Result<String, LookupFailure> {
        info!("Looking up FAQ answer at {}", self.url);

        let response = self
            .http
            .post(&self.url)
            .json(&LookupRequest { question })
            .send()
            .await
            .map_err(|e| {
                warn!("FAQ lookup transport failure: {}", e);
                LookupFailure::Transport(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!("FAQ lookup rejected with HTTP {}", status);
            return Err(LookupFailure::Status { status });
        }

        let body = response.bytes().await.map_err(LookupFailure::Transport)?;
        let data: Value = serde_json::from_slice(&body).map_err(LookupFailure::Decode)?;

        Ok(match data.get("answer") {
            Some(Value::String(answer)) => answer.clone(),
            None | Some(Value::Null) => NO_MATCH.to_string(),
            Some(other) => other.to_string(),
        })
    }
}

#[async_trait]
impl ToolHandler for FaqLookup {
    async fn call(&self, arguments: Value) -> anyhow::Result<String> {
        let args: LookupArgs = serde_json::from_value(arguments)
            .context("lookup_faq expects arguments of the form {\"question\": string}")?;
        Ok(self.lookup(&args.question).await?)
    }
}

/// Wraps the client as the `lookup_faq` tool.
pub fn lookup_faq_tool(client: FaqLookup) -> ToolRecord {
    ToolRecord::new(
        TOOL_NAME,
        "Fetch a live FAQ answer from our Google Sheet via the hosted API.",
        json!({
            "type": "object",
            "properties": {
                "question": {
                    "type": "string",
                    "description": "The customer's question to look up."
                }
            },
            "required": ["question"],
            "additionalProperties": false
        }),
        Arc::new(client),
    )
}
