//! vocalize: speak text with Amazon Polly voices
//!
//! The pipeline is API response -> [`audio::decode_audio`] ->
//! [`audio::ResourceBuilder`] -> [`audio::PlaybackController`], sequenced by
//! [`coordinator::Coordinator`].

pub mod audio;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod interactive;
