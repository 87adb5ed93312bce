//! Client for the Polly text-to-speech API gateway
//!
//! The gateway accepts `POST /polly` with a voice and text and answers with
//! base64-encoded MP3 audio. This crate owns the wire types, the voice list,
//! and the HTTP implementation; turning the audio into sound is left to the
//! caller.

pub mod api_gateway;
pub mod config;
pub mod error;
pub mod mock;
pub mod provider;
pub mod voice;

pub use api_gateway::ApiGatewayClient;
pub use config::ClientConfig;
pub use error::{ApiError, Result};
pub use mock::MockSpeechApi;
pub use provider::{SpeechApi, SpeechRequest, SpeechResponse};
pub use voice::{Gender, UnknownVoice, Voice};
