use crate::config::ImageryConfig;
use crate::services::prompts::generate_image_prompt;
use std::time::Duration;
use tracing::warn;
use uuid::Uuid;

/// Client for the image synthesis collaborator. Thumbnails are decorative:
/// every failure degrades to "no image" and the client falls back to a
/// procedural gradient rendered from the same seed.
pub struct ImageSynthesizer {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl ImageSynthesizer {
    pub fn new(http: reqwest::Client, config: &ImageryConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate an abstract gradient thumbnail for the given seed.
    pub async fn generate(&self, seed: i64) -> Option<String> {
        let api_key = self.api_key.as_ref()?;
        let prompt = generate_image_prompt(seed);

        let payload = serde_json::json!([{
            "taskType": "imageInference",
            "taskUUID": Uuid::new_v4(),
            "positivePrompt": prompt,
            "model": "runware:101@1",
            "width": 512,
            "height": 512,
            "numberResults": 1,
            "outputFormat": "WEBP",
            "outputType": "URL",
        }]);

        let result = self
            .http
            .post(&self.base_url)
            .bearer_auth(api_key)
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await;

        let response = match result {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                warn!(status = %response.status(), "image synthesis returned an error");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "image synthesis request failed");
                return None;
            }
        };

        let body: serde_json::Value = response.json().await.ok()?;
        body["data"]
            .as_array()?
            .iter()
            .find(|task| task["taskType"] == "imageInference")
            .and_then(|task| task["imageURL"].as_str())
            .map(|url| url.to_string())
    }
}
