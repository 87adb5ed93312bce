use speech_client::ApiError;
use thiserror::Error;

pub const NO_AUDIO_MESSAGE: &str = "No audio data received from API";

/// Everything that can end a speak request early
///
/// The first error short-circuits the rest of the pipeline, and its
/// Display text is what the user sees.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{0}")]
    Network(String),

    #[error("{0}")]
    MalformedResponse(String),

    #[error("No audio data received from API")]
    NoAudio,

    #[error("Error processing audio: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("Error preparing audio: {0}")]
    Resource(String),

    #[error("Error playing audio: {0}")]
    Playback(String),
}

impl From<ApiError> for PipelineError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::MalformedResponse(_) => PipelineError::MalformedResponse(err.to_string()),
            ApiError::Network { .. } | ApiError::Config(_) => {
                PipelineError::Network(err.to_string())
            }
        }
    }
}
