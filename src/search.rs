use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use crate::config::Config;
use crate::verify::types::Evidence;

/// Web search returning ranked evidence for a query.
#[async_trait]
pub trait EvidenceSearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<Evidence>>;
}

/// Tavily search API client.
pub struct SearchClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    max_results: u32,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Evidence>,
}

impl SearchClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.search_base_url.clone(),
            api_key: config.search_api_key.clone(),
            max_results: config.search_max_results,
        })
    }

    fn endpoint(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if base.ends_with("/search") {
            base.to_string()
        } else {
            format!("{}/search", base)
        }
    }
}

#[async_trait]
impl EvidenceSearch for SearchClient {
    async fn search(&self, query: &str) -> Result<Vec<Evidence>> {
        let body = serde_json::json!({
            "query": query,
            "max_results": self.max_results,
        });

        let resp = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("Search request failed")?;

        let status = resp.status();
        let text = resp.text().await.context("Failed to read search response")?;
        if !status.is_success() {
            bail!("Search returned {}: {}", status, text);
        }

        parse_results(&text)
    }
}

fn parse_results(text: &str) -> Result<Vec<Evidence>> {
    let parsed: SearchResponse =
        serde_json::from_str(text).context("Failed to parse search JSON")?;
    Ok(parsed.results)
}
