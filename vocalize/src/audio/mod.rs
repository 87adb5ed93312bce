//! Audio pipeline: base64 payload to playable file to running player

pub mod decoder;
pub mod playback;
pub mod player;
pub mod resource;

pub use decoder::decode_audio;
pub use playback::{PlaybackController, PlaybackElement, PlaybackEvent, PlaybackStatus};
pub use player::CommandPlayer;
pub use resource::{AUDIO_MIME, AudioBlob, PlaybackHandle, ResourceBuilder};
