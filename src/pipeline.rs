//! Client for the upstream conversational pipeline
//!
//! The backend turns microphone audio into text, text into a reply, the
//! reply into a WAV, and the WAV into a cue document. This client is plain
//! request/response forwarding over that boundary; no retries, no state.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::asset::{AssetError, Utterance};

/// Timeout for pipeline calls; TTS and phoneme extraction are slow
const PIPELINE_TIMEOUT: Duration = Duration::from_secs(120);

/// Error type for pipeline operations
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Transport-level failure
    #[error("network error: {0}")]
    Network(String),
    /// Endpoint answered with a non-success status
    #[error("{endpoint} returned status {status}")]
    Status {
        endpoint: &'static str,
        status: u16,
    },
    /// Response body did not have the expected shape
    #[error("{endpoint} returned a malformed response: {detail}")]
    Malformed {
        endpoint: &'static str,
        detail: String,
    },
    /// Pipeline produced an unusable utterance name
    #[error(transparent)]
    Asset(#[from] AssetError),
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// A transcribed recording
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcription {
    /// Recognized text
    pub text: String,
    /// Server-side filename of the stored recording
    pub filename: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    reply: String,
}

#[derive(Debug, Deserialize)]
struct AudioResponse {
    text: String,
    filename: String,
}

#[derive(Debug, Deserialize)]
struct TtsResponse {
    filename: String,
}

/// HTTP client for the conversational backend
pub struct PipelineClient {
    http: reqwest::blocking::Client,
    base_url: String,
}

impl PipelineClient {
    /// Create a client rooted at `base_url` (e.g. `http://localhost:5000`)
    pub fn new(base_url: &str) -> PipelineResult<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(PIPELINE_TIMEOUT)
            .build()
            .map_err(|e| PipelineError::Network(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Exchange one message with the language model
    pub fn chat(&self, message: &str) -> PipelineResult<String> {
        let response: ChatResponse = self.post_json(
            "/api/chat",
            &serde_json::json!({ "message": message }),
        )?;
        Ok(response.reply)
    }

    /// Transcribe a recorded audio blob
    pub fn transcribe(&self, audio: Vec<u8>, filename: &str) -> PipelineResult<Transcription> {
        const ENDPOINT: &str = "/api/audio";
        let part = reqwest::blocking::multipart::Part::bytes(audio)
            .file_name(filename.to_string())
            .mime_str("audio/webm")
            .map_err(|e| PipelineError::Network(e.to_string()))?;
        let form = reqwest::blocking::multipart::Form::new().part("audio", part);

        let response = self
            .http
            .post(format!("{}{}", self.base_url, ENDPOINT))
            .multipart(form)
            .send()
            .map_err(|e| PipelineError::Network(e.to_string()))?;
        let response = Self::check_status(ENDPOINT, response)?;
        let body: AudioResponse = response.json().map_err(|e| PipelineError::Malformed {
            endpoint: ENDPOINT,
            detail: e.to_string(),
        })?;
        Ok(Transcription {
            text: body.text,
            filename: body.filename,
        })
    }

    /// Synthesize speech; returns the server-side WAV filename
    pub fn synthesize(&self, text: &str) -> PipelineResult<String> {
        let response: TtsResponse =
            self.post_json("/api/tts", &serde_json::json!({ "text": text }))?;
        Ok(response.filename)
    }

    /// Generate the cue document for a synthesized WAV
    pub fn generate_cues(&self, filename: &str) -> PipelineResult<()> {
        const ENDPOINT: &str = "/api/lipsync";
        let response = self
            .http
            .post(format!("{}{}", self.base_url, ENDPOINT))
            .json(&serde_json::json!({ "filename": filename }))
            .send()
            .map_err(|e| PipelineError::Network(e.to_string()))?;
        Self::check_status(ENDPOINT, response)?;
        Ok(())
    }

    /// Run `text` through TTS and cue generation, yielding an utterance
    /// ready for playback
    pub fn say(&self, text: &str) -> PipelineResult<Utterance> {
        let filename = self.synthesize(text)?;
        self.generate_cues(&filename)?;
        let utterance = Utterance::new(utterance_name(&filename))?;
        info!(utterance = %utterance, "pipeline produced utterance");
        Ok(utterance)
    }

    fn post_json<T: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &'static str,
        body: &serde_json::Value,
    ) -> PipelineResult<T> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, endpoint))
            .json(body)
            .send()
            .map_err(|e| PipelineError::Network(e.to_string()))?;
        let response = Self::check_status(endpoint, response)?;
        response.json().map_err(|e| PipelineError::Malformed {
            endpoint,
            detail: e.to_string(),
        })
    }

    fn check_status(
        endpoint: &'static str,
        response: reqwest::blocking::Response,
    ) -> PipelineResult<reqwest::blocking::Response> {
        if !response.status().is_success() {
            return Err(PipelineError::Status {
                endpoint,
                status: response.status().as_u16(),
            });
        }
        Ok(response)
    }
}

/// Utterance identifier for a synthesized filename (extension stripped)
pub fn utterance_name(filename: &str) -> &str {
    filename.strip_suffix(".wav").unwrap_or(filename)
}
