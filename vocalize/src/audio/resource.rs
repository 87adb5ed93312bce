//! Playable resources: decoded audio bytes behind a file:// URL
//!
//! A handle owns a temporary `.mp3` file. The file lives exactly as long as
//! the handle, so dropping (or revoking) the handle releases the audio.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use url::Url;

use crate::error::PipelineError;

pub const AUDIO_MIME: &str = "audio/mpeg";

/// Binary audio tagged with its MIME type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioBlob {
    pub bytes: Vec<u8>,
    pub mime: &'static str,
}

impl AudioBlob {
    pub fn mp3(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            mime: AUDIO_MIME,
        }
    }

    fn extension(&self) -> &'static str {
        match self.mime {
            "audio/mpeg" => ".mp3",
            _ => ".bin",
        }
    }
}

/// Dereferenceable reference to a blob, valid until revoked or dropped
#[derive(Debug)]
pub struct PlaybackHandle {
    file: Option<NamedTempFile>,
    path: PathBuf,
    url: String,
    mime: &'static str,
    len: usize,
}

impl PlaybackHandle {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mime(&self) -> &'static str {
        self.mime
    }

    /// Size of the audio in bytes
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Copy the audio somewhere permanent; the handle itself stays temporary
    pub fn save_to(&self, dest: &Path) -> std::io::Result<u64> {
        std::fs::copy(&self.path, dest)
    }

    /// Release the backing file now and report any error doing so
    pub fn revoke(mut self) -> std::io::Result<()> {
        match self.file.take() {
            Some(file) => {
                log::debug!("Revoked {}", self.url);
                file.close()
            }
            None => Ok(()),
        }
    }
}

impl Drop for PlaybackHandle {
    fn drop(&mut self) {
        if self.file.take().is_some() {
            log::debug!("Released {}", self.url);
        }
    }
}

/// Turns decoded bytes into playback handles
#[derive(Debug, Clone)]
pub struct ResourceBuilder {
    dir: PathBuf,
}

impl Default for ResourceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceBuilder {
    /// Builder that writes into the system temp directory
    pub fn new() -> Self {
        Self {
            dir: std::env::temp_dir(),
        }
    }

    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Wrap the bytes as `audio/mpeg` and return a fresh handle to them
    pub fn build(&self, bytes: Vec<u8>) -> Result<PlaybackHandle, PipelineError> {
        let blob = AudioBlob::mp3(bytes);

        let mut file = tempfile::Builder::new()
            .prefix("vocalize-")
            .suffix(blob.extension())
            .tempfile_in(&self.dir)
            .map_err(|e| PipelineError::Resource(format!("Failed to create audio file: {}", e)))?;

        file.write_all(&blob.bytes)
            .and_then(|_| file.flush())
            .map_err(|e| PipelineError::Resource(format!("Failed to write audio file: {}", e)))?;

        let path = file.path().to_path_buf();
        let url = file_url(&path)?;
        log::debug!("Created {} ({} bytes, {})", url, blob.bytes.len(), blob.mime);

        Ok(PlaybackHandle {
            file: Some(file),
            path,
            url,
            mime: blob.mime,
            len: blob.bytes.len(),
        })
    }
}

fn file_url(path: &Path) -> Result<String, PipelineError> {
    let absolute = std::path::absolute(path)
        .map_err(|e| PipelineError::Resource(format!("Failed to resolve audio path: {}", e)))?;
    Url::from_file_path(&absolute)
        .map(String::from)
        .map_err(|_| PipelineError::Resource(format!("Not a file path: {}", absolute.display())))
}
