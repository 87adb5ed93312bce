//! View state and the speak sequence
//!
//! One speak action runs: begin (reject while loading, reset state) ->
//! API call -> finish (decode, build handle, play). Every state change is
//! pushed to subscribed observers.

use speech_client::provider::DEFAULT_TEXT;
use speech_client::{ApiError, SpeechApi, SpeechRequest, SpeechResponse, Voice};

use crate::audio::{
    PlaybackController, PlaybackElement, PlaybackHandle, PlaybackStatus, ResourceBuilder,
    decode_audio,
};
use crate::error::PipelineError;

/// Everything the front end needs to render
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub loading: bool,
    pub error: Option<String>,
    pub audio_url: Option<String>,
    pub voice: Voice,
    pub text: String,
    pub playback: PlaybackStatus,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            loading: false,
            error: None,
            audio_url: None,
            voice: Voice::default(),
            text: DEFAULT_TEXT.to_string(),
            playback: PlaybackStatus::Idle,
        }
    }
}

impl ViewState {
    /// Label of the trigger control
    pub fn button_label(&self) -> &'static str {
        if self.loading { "Loading..." } else { "Speak" }
    }
}

/// Identifies one in-flight request
#[derive(Debug)]
pub struct Ticket {
    seq: u64,
    request: SpeechRequest,
}

impl Ticket {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn request(&self) -> &SpeechRequest {
        &self.request
    }
}

pub type Observer = Box<dyn FnMut(&ViewState) + Send>;

pub struct Coordinator<A: SpeechApi, E: PlaybackElement> {
    api: A,
    builder: ResourceBuilder,
    player: PlaybackController<E>,
    handle: Option<PlaybackHandle>,
    state: ViewState,
    seq: u64,
    autoplay: bool,
    observers: Vec<Observer>,
}

impl<A: SpeechApi, E: PlaybackElement> Coordinator<A, E> {
    pub fn new(api: A, element: E, builder: ResourceBuilder) -> Self {
        Self {
            api,
            builder,
            player: PlaybackController::new(element),
            handle: None,
            state: ViewState::default(),
            seq: 0,
            autoplay: true,
            observers: Vec::new(),
        }
    }

    /// Whether finished requests start playing right away (default true)
    pub fn with_autoplay(mut self, autoplay: bool) -> Self {
        self.autoplay = autoplay;
        self
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// The live playback handle, if the last request produced one
    pub fn handle(&self) -> Option<&PlaybackHandle> {
        self.handle.as_ref()
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn player(&self) -> &PlaybackController<E> {
        &self.player
    }

    pub fn subscribe(&mut self, observer: Observer) {
        self.observers.push(observer);
    }

    fn notify(&mut self) {
        for observer in &mut self.observers {
            observer(&self.state);
        }
    }

    fn sync_playback(&mut self) {
        let status = self.player.status();
        if self.state.playback != status {
            self.state.playback = status;
            self.notify();
        }
    }

    fn release_handle(&mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.revoke() {
                log::warn!("Failed to release audio: {}", e);
            }
        }
    }

    pub fn set_voice(&mut self, voice: Voice) {
        self.state.voice = voice;
        self.notify();
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.state.text = text.into();
        self.notify();
    }

    /// Start a request from the current form values.
    ///
    /// Returns None without touching anything while another request is loading.
    pub fn begin(&mut self) -> Option<Ticket> {
        if self.state.loading {
            log::debug!("Ignoring speak while request {} is in flight", self.seq);
            return None;
        }

        self.seq += 1;
        self.player.reset();
        self.release_handle();

        self.state.loading = true;
        self.state.error = None;
        self.state.audio_url = None;
        self.state.playback = PlaybackStatus::Idle;
        self.notify();

        let request = SpeechRequest::new(self.state.voice, self.state.text.clone());
        log::info!(
            "Requesting speech #{} (voice: {}, {} chars)",
            self.seq,
            request.voice_id,
            request.text.chars().count()
        );

        Some(Ticket {
            seq: self.seq,
            request,
        })
    }

    /// Send the ticket's request to the API
    pub async fn request(&self, ticket: &Ticket) -> Result<SpeechResponse, ApiError> {
        self.api.synthesize(&ticket.request).await
    }

    /// Give up on the in-flight request. A late `finish` for it is discarded.
    pub fn abandon(&mut self) {
        if !self.state.loading {
            return;
        }
        log::info!("Abandoned speech request #{}", self.seq);
        self.seq += 1;
        self.state.loading = false;
        self.notify();
    }

    /// Apply the outcome of a request.
    ///
    /// Returns None for stale tickets, which leave the state untouched.
    /// Otherwise loading is always cleared, and any error is also recorded
    /// in the view state.
    pub fn finish(
        &mut self,
        ticket: Ticket,
        outcome: Result<SpeechResponse, ApiError>,
    ) -> Option<Result<(), PipelineError>> {
        if ticket.seq != self.seq || !self.state.loading {
            log::debug!(
                "Discarding stale response #{} (latest is #{})",
                ticket.seq,
                self.seq
            );
            return None;
        }

        let result = self.process(outcome);

        if let Err(e) = &result {
            log::error!("Speech request #{} failed: {}", ticket.seq, e);
            self.state.error = Some(e.to_string());
        }
        self.state.loading = false;
        self.state.playback = self.player.status();
        self.notify();

        Some(result)
    }

    fn process(&mut self, outcome: Result<SpeechResponse, ApiError>) -> Result<(), PipelineError> {
        let response = outcome?;
        if let Some(message) = &response.message {
            log::debug!("API says: {}", message);
        }

        let encoded = response.audio().ok_or(PipelineError::NoAudio)?;
        let bytes = decode_audio(encoded)?;
        log::debug!("Decoded {} bytes of audio", bytes.len());

        if let Some(expected) = response.audio_length {
            if expected != bytes.len() as u64 {
                log::warn!(
                    "API reported {} bytes of audio but {} were decoded",
                    expected,
                    bytes.len()
                );
            }
        }

        self.release_handle();
        let handle = self.handle.insert(self.builder.build(bytes)?);
        self.state.audio_url = Some(handle.url().to_string());

        if self.autoplay {
            self.player.attach_and_play(handle)?;
        }
        Ok(())
    }

    /// Run one complete speak action. Returns None if it was rejected because
    /// a request is already loading.
    pub async fn speak(&mut self) -> Option<Result<(), PipelineError>> {
        let ticket = self.begin()?;
        let outcome = self.api.synthesize(&ticket.request).await;
        self.finish(ticket, outcome)
    }

    /// Start playing the current handle again
    pub fn replay(&mut self) -> Result<bool, PipelineError> {
        let Some(handle) = self.handle.as_ref() else {
            return Ok(false);
        };
        let result = self.player.attach_and_play(handle);
        self.state.error = result.as_ref().err().map(|e| e.to_string());
        self.state.playback = self.player.status();
        self.notify();
        result.map(|_| true)
    }

    pub fn pause(&mut self) -> Result<bool, PipelineError> {
        let changed = self.player.pause()?;
        self.sync_playback();
        Ok(changed)
    }

    pub fn resume(&mut self) -> Result<bool, PipelineError> {
        let changed = self.player.resume()?;
        self.sync_playback();
        Ok(changed)
    }

    /// Stop playback; the audio stays available for replay
    pub fn stop(&mut self) {
        self.player.stop();
        self.sync_playback();
    }

    /// Pick up a natural end of playback
    pub fn poll_playback(&mut self) -> PlaybackStatus {
        self.player.poll();
        self.sync_playback();
        self.state.playback
    }

    /// Wait until the current playback ends on its own
    pub async fn wait_playback(&mut self) -> Result<PlaybackStatus, PipelineError> {
        let result = self.player.wait_until_done().await;
        self.sync_playback();
        result
    }
}
