//! Speech API trait and wire types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::voice::Voice;

/// Text shown in the input before the user types anything
pub const DEFAULT_TEXT: &str = "Hello, how are you today?";

/// Body of `POST /polly`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpeechRequest {
    #[serde(rename = "voiceId")]
    pub voice_id: Voice,
    pub text: String,
}

impl SpeechRequest {
    pub fn new(voice_id: Voice, text: impl Into<String>) -> Self {
        Self {
            voice_id,
            text: text.into(),
        }
    }
}

/// Successful response body from the gateway
///
/// Only `audio` matters for playback. The gateway also reports the raw and
/// encoded lengths, which are useful for spotting truncated payloads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechResponse {
    #[serde(default)]
    pub audio: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub audio_length: Option<u64>,
    #[serde(default)]
    pub encoded_length: Option<u64>,
}

impl SpeechResponse {
    pub fn with_audio(audio: impl Into<String>) -> Self {
        Self {
            audio: Some(audio.into()),
            ..Default::default()
        }
    }

    /// The base64 payload, or None when it is absent or empty
    pub fn audio(&self) -> Option<&str> {
        self.audio.as_deref().filter(|a| !a.is_empty())
    }
}

/// Anything that can turn a speech request into a speech response
#[async_trait]
pub trait SpeechApi: Send + Sync {
    async fn synthesize(&self, request: &SpeechRequest) -> Result<SpeechResponse>;

    /// Short name for log output
    fn name(&self) -> &str;
}
