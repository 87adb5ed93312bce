//! Playback state tracking
//!
//! The controller owns a playback element (anything that can play a file)
//! and enforces the status machine:
//!
//! ```text
//! Idle --play--> Playing --pause--> Paused --resume--> Playing
//!                Playing --end----> Ended
//! ```
//!
//! A new request always goes back through Idle before playing again.

use std::fmt;
use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;

use super::resource::PlaybackHandle;
use crate::error::PipelineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackStatus {
    #[default]
    Idle,
    Playing,
    Paused,
    Ended,
}

impl fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PlaybackStatus::Idle => "idle",
            PlaybackStatus::Playing => "playing",
            PlaybackStatus::Paused => "paused",
            PlaybackStatus::Ended => "ended",
        };
        f.write_str(s)
    }
}

/// Things a playback element reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEvent {
    Started,
    Paused,
    Resumed,
    Ended,
}

impl PlaybackStatus {
    /// Status after `event`, or None if the event is not valid here
    pub fn next(self, event: PlaybackEvent) -> Option<PlaybackStatus> {
        use PlaybackEvent as E;
        use PlaybackStatus as S;

        match (self, event) {
            (S::Idle, E::Started) => Some(S::Playing),
            (S::Playing, E::Paused) => Some(S::Paused),
            (S::Paused, E::Resumed) => Some(S::Playing),
            (S::Playing, E::Ended) => Some(S::Ended),
            _ => None,
        }
    }

    /// Whether a player is currently holding the source
    pub fn is_active(self) -> bool {
        matches!(self, PlaybackStatus::Playing | PlaybackStatus::Paused)
    }
}

/// Something that can play an audio file
#[async_trait]
pub trait PlaybackElement: Send {
    /// Point the element at a new source; any current playback is abandoned
    fn set_source(&mut self, path: &Path) -> Result<()>;

    /// Start playing the current source
    fn play(&mut self) -> Result<()>;

    fn pause(&mut self) -> Result<()>;

    fn resume(&mut self) -> Result<()>;

    fn stop(&mut self) -> Result<()>;

    /// Non-blocking check for natural end of playback
    fn try_finished(&mut self) -> Result<bool>;

    /// Wait until playback ends on its own
    async fn wait_finished(&mut self) -> Result<()>;
}

/// Binds handles to an element and tracks playback status
pub struct PlaybackController<E: PlaybackElement> {
    element: E,
    status: PlaybackStatus,
    source: Option<String>,
}

impl<E: PlaybackElement> PlaybackController<E> {
    pub fn new(element: E) -> Self {
        Self {
            element,
            status: PlaybackStatus::Idle,
            source: None,
        }
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    /// URL of the attached handle, if any
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn element(&self) -> &E {
        &self.element
    }

    pub fn element_mut(&mut self) -> &mut E {
        &mut self.element
    }

    /// Apply an element event. Returns false (and changes nothing) for
    /// events that are not valid in the current status.
    pub fn apply(&mut self, event: PlaybackEvent) -> bool {
        match self.status.next(event) {
            Some(next) => {
                log::debug!("Playback {} -> {}", self.status, next);
                self.status = next;
                true
            }
            None => {
                log::debug!("Ignoring {:?} while {}", event, self.status);
                false
            }
        }
    }

    /// Halt the element and go back to Idle. The source stays attached.
    pub fn stop(&mut self) {
        if self.status.is_active() {
            if let Err(e) = self.element.stop() {
                log::warn!("Failed to stop playback: {:#}", e);
            }
        }
        self.status = PlaybackStatus::Idle;
    }

    /// Stop and detach the source, ready for a new handle
    pub fn reset(&mut self) {
        self.stop();
        self.source = None;
    }

    /// Attach the handle and start playing it
    ///
    /// On failure the status stays Idle and the error is returned for display.
    pub fn attach_and_play(&mut self, handle: &PlaybackHandle) -> Result<(), PipelineError> {
        self.reset();

        self.element
            .set_source(handle.path())
            .and_then(|_| self.element.play())
            .map_err(|e| PipelineError::Playback(format!("{:#}", e)))?;

        self.source = Some(handle.url().to_string());
        self.apply(PlaybackEvent::Started);
        Ok(())
    }

    /// Pause if playing. Returns whether anything changed.
    pub fn pause(&mut self) -> Result<bool, PipelineError> {
        if self.status != PlaybackStatus::Playing {
            return Ok(false);
        }
        self.element
            .pause()
            .map_err(|e| PipelineError::Playback(format!("{:#}", e)))?;
        Ok(self.apply(PlaybackEvent::Paused))
    }

    /// Resume if paused. Returns whether anything changed.
    pub fn resume(&mut self) -> Result<bool, PipelineError> {
        if self.status != PlaybackStatus::Paused {
            return Ok(false);
        }
        self.element
            .resume()
            .map_err(|e| PipelineError::Playback(format!("{:#}", e)))?;
        Ok(self.apply(PlaybackEvent::Resumed))
    }

    /// Pick up a natural end of playback. Returns true if the status changed.
    pub fn poll(&mut self) -> bool {
        if self.status != PlaybackStatus::Playing {
            return false;
        }
        match self.element.try_finished() {
            Ok(true) => self.apply(PlaybackEvent::Ended),
            Ok(false) => false,
            Err(e) => {
                log::warn!("Failed to check playback: {:#}", e);
                false
            }
        }
    }

    /// Wait for the current playback to end
    pub async fn wait_until_done(&mut self) -> Result<PlaybackStatus, PipelineError> {
        if self.status == PlaybackStatus::Playing {
            self.element
                .wait_finished()
                .await
                .map_err(|e| PipelineError::Playback(format!("{:#}", e)))?;
            self.apply(PlaybackEvent::Ended);
        }
        Ok(self.status)
    }
}
