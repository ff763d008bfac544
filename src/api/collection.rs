use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{Error, Result};

const HF_HUB_BASE: &str = "https://huggingface.co";
const HF_TOKEN_ENV: &str = "HF_TOKEN";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct CollectionResponse {
    #[serde(default)]
    items: Vec<CollectionItem>,
}

#[derive(Debug, Deserialize)]
struct CollectionItem {
    #[serde(rename = "type")]
    item_type: String,
    id: String,
}

/// Resolves Hugging Face collections into model repo ids
pub struct CollectionClient {
    hub_url: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl Default for CollectionClient {
    fn default() -> Self {
        Self::new(HF_HUB_BASE, std::env::var(HF_TOKEN_ENV).ok())
    }
}

impl CollectionClient {
    pub fn new(hub_url: &str, token: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            hub_url: hub_url.trim_end_matches('/').to_string(),
            token,
            client,
        }
    }

    /// Model ids in the collection, in collection order
    pub async fn model_ids(&self, collection: &str) -> Result<Vec<String>> {
        let url = format!("{}/api/collections/{}", self.hub_url, collection);
        debug!(url = %url, "fetching collection");

        let mut request = self.client.get(&url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(Error::Status {
                endpoint: format!("api/collections/{}", collection),
                status: status.as_u16(),
                body,
            });
        }

        let parsed: CollectionResponse =
            serde_json::from_str(&body).map_err(|e| Error::InvalidResponse {
                endpoint: format!("api/collections/{}", collection),
                reason: e.to_string(),
            })?;

        let models: Vec<String> = parsed
            .items
            .into_iter()
            .filter(|item| item.item_type == "model")
            .map(|item| item.id)
            .collect();

        info!(collection, count = models.len(), "Resolved Hugging Face collection");
        Ok(models)
    }
}
