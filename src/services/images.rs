//! Client for the external image-hosting service.
//!
//! Accepts base64 image data, forwards it to the hosting API and returns the
//! publicly retrievable URL. Failures surface as an external-service error;
//! there is no retry.

use base64::Engine as _;
use reqwest::multipart::Form;
use serde::Deserialize;
use tracing::{info, instrument};

use crate::config::ImageHostConfig;
use crate::errors::ServiceError;

#[derive(Debug, Deserialize)]
struct UploadBody {
    data: UploadData,
}

#[derive(Debug, Deserialize)]
struct UploadData {
    url: String,
}

#[derive(Clone)]
pub struct ImageService {
    client: reqwest::Client,
    config: ImageHostConfig,
}

impl ImageService {
    pub fn new(config: ImageHostConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Uploads base64-encoded image bytes, returning the hosted URL.
    #[instrument(skip(self, image_base64))]
    pub async fn upload(&self, image_base64: &str) -> Result<String, ServiceError> {
        let api_key = self.config.api_key.as_deref().ok_or_else(|| {
            ServiceError::InvalidOperation(
                "image hosting is not configured; set APP__IMAGE_HOST__API_KEY".to_string(),
            )
        })?;

        // Reject payloads that are not valid base64 before going external.
        base64::engine::general_purpose::STANDARD
            .decode(image_base64)
            .map_err(|_| ServiceError::InvalidInput("image must be base64 encoded".to_string()))?;

        let form = Form::new().text("image", image_base64.to_string());
        let response = self
            .client
            .post(&self.config.api_url)
            .query(&[("key", api_key)])
            .multipart(form)
            .send()
            .await
            .map_err(|e| ServiceError::ExternalServiceError(format!("image upload failed: {e}")))?;

        if !response.status().is_success() {
            return Err(ServiceError::ExternalServiceError(format!(
                "image host returned {}",
                response.status()
            )));
        }

        let body: UploadBody = response.json().await.map_err(|e| {
            ServiceError::ExternalServiceError(format!("malformed image host response: {e}"))
        })?;

        info!(url = %body.data.url, "image uploaded");
        Ok(body.data.url)
    }
}
