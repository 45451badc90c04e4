//! Text-to-speech synthesis
//!
//! Backed by `reqwest::blocking`, so instances must be created and driven on
//! a plain thread (the speech sink's consumer thread), never inside the
//! async runtime.

use crate::{Error, Result};

/// Synthesizes speech from text via an OpenAI-compatible endpoint
pub struct TextToSpeech {
    client: reqwest::blocking::Client,
    api_key: String,
    model: String,
    voice: String,
    speed: f32,
}

impl TextToSpeech {
    /// Create a new TTS client
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the API key is empty.
    pub fn new(api_key: String, model: String, voice: String, speed: f32) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config("TTS API key required".to_string()));
        }

        Ok(Self {
            client: reqwest::blocking::Client::new(),
            api_key,
            model,
            voice,
            speed,
        })
    }

    /// Synthesize text to MP3 bytes
    ///
    /// # Errors
    ///
    /// Returns `Error::Tts` if the service rejects the request.
    pub fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct TtsRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
            speed: f32,
        }

        let request = TtsRequest {
            model: &self.model,
            input: text,
            voice: &self.voice,
            speed: self.speed,
        };

        let response = self
            .client
            .post("https://api.openai.com/v1/audio/speech")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(Error::Tts(format!("TTS error {status}: {body}")));
        }

        let audio = response.bytes()?;
        tracing::debug!(bytes = audio.len(), "speech synthesized");
        Ok(audio.to_vec())
    }
}
