use super::{Caption, CaptionModel};
use crate::config::CaptioningConfig;
use crate::error::{DatasetError, Result};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Caption model served over HTTP.
///
/// Raw image bytes are POSTed to `{endpoint}/v1/caption?checkpoint=<path>` and
/// the service answers with `{"captions": [{"sentence": [..], "logprob": ..}]}`,
/// best candidate first.
pub struct HttpCaptionModel {
    client: Client,
    url: String,
    checkpoint: String,
}

#[derive(Debug, Deserialize)]
struct BeamSearchResponse {
    captions: Vec<Caption>,
}

impl HttpCaptionModel {
    pub fn new(endpoint: &str, checkpoint_path: &Path, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: format!("{}/v1/caption", endpoint.trim_end_matches('/')),
            checkpoint: checkpoint_path.display().to_string(),
        })
    }

    pub fn from_config(config: &CaptioningConfig) -> Result<Self> {
        Self::new(
            &config.endpoint,
            &config.checkpoint_path,
            Duration::from_secs(config.timeout_seconds),
        )
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl CaptionModel for HttpCaptionModel {
    fn beam_search(&self, image: &[u8]) -> Result<Vec<Caption>> {
        debug!(bytes = image.len(), url = %self.url, "Requesting captions");
        let response = self
            .client
            .post(&self.url)
            .query(&[("checkpoint", self.checkpoint.as_str())])
            .header("Content-Type", "application/octet-stream")
            .body(image.to_vec())
            .send()?;

        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(DatasetError::Model {
                message: format!("caption service returned {}: {}", status.as_u16(), body),
            });
        }
        parse_response(&body)
    }
}

fn parse_response(body: &str) -> Result<Vec<Caption>> {
    let parsed: BeamSearchResponse =
        serde_json::from_str(body).map_err(|e| DatasetError::Model {
            message: format!("unreadable caption response: {}", e),
        })?;
    Ok(parsed.captions)
}
