//! Speech-to-text collaborator

use async_trait::async_trait;

use crate::{Error, Result};

/// Speech-to-text service contract
///
/// Consumes a WAV-encoded utterance, returns the recognized text. Transport
/// and API failures surface as errors; recognition of silence comes back as
/// an empty string.
#[async_trait]
pub trait SttClient: Send + Sync {
    /// Transcribe WAV audio to text
    ///
    /// # Errors
    ///
    /// Returns an error when the service is unreachable or rejects the
    /// request.
    async fn transcribe(&self, wav: Vec<u8>) -> Result<String>;
}

#[derive(serde::Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// HTTP transcription client (OpenAI-compatible audio endpoint)
pub struct HttpStt {
    client: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl HttpStt {
    /// Create a client against the standard endpoint
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the API key is empty.
    pub fn new(api_key: String, model: String) -> Result<Self> {
        Self::with_endpoint(
            api_key,
            model,
            "https://api.openai.com/v1/audio/transcriptions".to_string(),
        )
    }

    /// Create a client against a custom endpoint (self-hosted gateways)
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the API key is empty.
    pub fn with_endpoint(api_key: String, model: String, endpoint: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config("STT API key required".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            endpoint,
        })
    }
}

#[async_trait]
impl SttClient for HttpStt {
    async fn transcribe(&self, wav: Vec<u8>) -> Result<String> {
        tracing::debug!(audio_bytes = wav.len(), "starting transcription");

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(wav)
                    .file_name("utterance.wav")
                    .mime_str("audio/wav")
                    .map_err(|e| Error::Stt(e.to_string()))?,
            )
            .text("model", self.model.clone());

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "transcription request failed");
                e
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "transcription API error");
            return Err(Error::Stt(format!("transcription error {status}: {body}")));
        }

        let result: TranscriptionResponse = response.json().await?;
        tracing::info!(transcript = %result.text, "transcription complete");
        Ok(result.text)
    }
}
