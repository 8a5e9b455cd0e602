use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::env;
use std::time::Duration;

const INNGEST_BASE: &str = "https://inn.gs";

/// Emitted after a batch of shows has been persisted.
pub const SHOW_ADDED_EVENT: &str = "app/show.added";

#[async_trait]
pub trait EventSink: Send + Sync {
    async fn send(&self, name: &str, data: Value) -> Result<()>;
}

pub struct InngestClient {
    client: reqwest::Client,
    base_url: String,
    event_key: String,
}

impl InngestClient {
    pub fn from_env() -> Result<Self> {
        let event_key = env::var("INNGEST_EVENT_KEY").context("INNGEST_EVENT_KEY not set")?;
        let base_url =
            env::var("INNGEST_BASE_URL").unwrap_or_else(|_| INNGEST_BASE.to_string());
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("showtime/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url,
            event_key,
        })
    }
}

#[async_trait]
impl EventSink for InngestClient {
    async fn send(&self, name: &str, data: Value) -> Result<()> {
        let url = format!("{}/e/{}", self.base_url.trim_end_matches('/'), self.event_key);
        let res = self
            .client
            .post(&url)
            .json(&json!({ "name": name, "data": data }))
            .send()
            .await
            .with_context(|| format!("Event request to {url} failed"))?;
        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(anyhow!("Event '{}' rejected: {} {}", name, status, text));
        }
        Ok(())
    }
}
