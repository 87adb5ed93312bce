use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};

use crate::error::PipelineError;

/// Decode the base64 audio payload returned by the API
///
/// Strict standard alphabet with padding. The gateway always pads its
/// output, so unpadded or URL-safe input is reported as a decode error.
/// Surrounding whitespace is ignored.
pub fn decode_audio(encoded: &str) -> Result<Vec<u8>, PipelineError> {
    Ok(BASE64.decode(encoded.trim())?)
}
