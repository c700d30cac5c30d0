//! HTTP riddle generator
//!
//! POSTs `{"difficulty": "..."}` to a configured endpoint and decodes the
//! JSON response. The blocking client runs on tokio's blocking pool; callers
//! bound the overall call with their own timeout.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;

use super::generator::{Difficulty, GeneratedRiddle, RiddleGenerator, parse_payload};

/// Riddle generator backed by a remote JSON endpoint
#[derive(Clone)]
pub struct HttpRiddleGenerator {
    endpoint: String,
    client: ureq::Agent,
}

impl HttpRiddleGenerator {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        let client = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(5))
            .timeout(timeout)
            .build();

        Self {
            endpoint: endpoint.into(),
            client,
        }
    }
}

#[async_trait]
impl RiddleGenerator for HttpRiddleGenerator {
    async fn generate(&self, difficulty: Difficulty) -> Result<GeneratedRiddle> {
        let client = self.client.clone();
        let url = self.endpoint.clone();

        let body = tokio::task::spawn_blocking(move || -> Result<serde_json::Value> {
            client
                .post(&url)
                .send_json(serde_json::json!({ "difficulty": difficulty.as_str() }))
                .with_context(|| format!("Riddle request to {url} failed"))?
                .into_json()
                .context("Failed to parse riddle response")
        })
        .await
        .context("Riddle request task failed")??;

        parse_payload(body)
    }

    fn id(&self) -> &str {
        "http"
    }
}
