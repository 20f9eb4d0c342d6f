use crate::config::PinningConfig;
use crate::errors::{ContestApiError, Result};
use crate::models::PinResponse;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use tracing::{error, info};

#[async_trait]
pub trait PinningClient: Send + Sync {
    /// Pin raw file bytes to IPFS
    async fn pin_file(&self, bytes: Vec<u8>, filename: &str) -> Result<PinResponse>;
}

/// Pinata `pinFileToIPFS` client
pub struct PinataClient {
    api_url: String,
    jwt: String,
    client: Client,
}

impl PinataClient {
    pub fn new(config: &PinningConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ContestApiError::Internal(format!("Failed to build pinning client: {}", e)))?;

        Ok(PinataClient {
            api_url: config.api_url.trim_end_matches('/').to_string(),
            jwt: config.jwt.clone(),
            client,
        })
    }
}

#[async_trait]
impl PinningClient for PinataClient {
    async fn pin_file(&self, bytes: Vec<u8>, filename: &str) -> Result<PinResponse> {
        if self.jwt.is_empty() {
            return Err(ContestApiError::PinningError("Pinning JWT is not configured".to_string()));
        }

        let size = bytes.len();
        let form = Form::new()
            .part("file", Part::bytes(bytes).file_name(filename.to_string()))
            .text("pinataMetadata", json!({ "name": filename }).to_string())
            .text("pinataOptions", json!({ "cidVersion": 0 }).to_string());

        let url = format!("{}/pinning/pinFileToIPFS", self.api_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.jwt)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to pin file: {}", e);
                ContestApiError::PinningError(format!("Pin request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ContestApiError::PinningError(format!(
                "Pin failed with status {}: {}",
                status, error_text
            )));
        }

        let pin = response.json::<PinResponse>().await.map_err(|e| {
            ContestApiError::PinningError(format!("Failed to parse response: {}", e))
        })?;

        info!(filename = %filename, bytes = size, ipfs_hash = %pin.ipfs_hash, "File pinned");

        Ok(pin)
    }
}
