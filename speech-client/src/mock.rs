//! Scripted speech API for tests

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{ApiError, Result};
use crate::provider::{SpeechApi, SpeechRequest, SpeechResponse};

/// Mock API that replays queued outcomes, repeating the last one when the queue runs dry
pub struct MockSpeechApi {
    outcomes: Mutex<VecDeque<Result<SpeechResponse>>>,
    last: Mutex<Option<Result<SpeechResponse>>>,
    requests: Mutex<Vec<SpeechRequest>>,
    calls: AtomicUsize,
}

impl MockSpeechApi {
    pub fn new(outcomes: Vec<Result<SpeechResponse>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            last: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Always answer with the given base64 audio
    pub fn always_returns(audio: &str) -> Self {
        Self::new(vec![Ok(SpeechResponse::with_audio(audio))])
    }

    pub fn always_fails(error: ApiError) -> Self {
        Self::new(vec![Err(error)])
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requests received so far, oldest first
    pub fn requests(&self) -> Vec<SpeechRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl SpeechApi for MockSpeechApi {
    async fn synthesize(&self, request: &SpeechRequest) -> Result<SpeechResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        let poisoned = || ApiError::network("mock state poisoned");
        let next = self.outcomes.lock().map_err(|_| poisoned())?.pop_front();
        let mut last = self.last.lock().map_err(|_| poisoned())?;

        match next {
            Some(outcome) => {
                *last = Some(outcome.clone());
                outcome
            }
            None => last
                .clone()
                .unwrap_or_else(|| Err(ApiError::network("mock has no scripted responses"))),
        }
    }

    fn name(&self) -> &str {
        "Mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voice::Voice;

    #[tokio::test]
    async fn test_replays_then_repeats_last() {
        let mock = MockSpeechApi::new(vec![
            Err(ApiError::network("boom")),
            Ok(SpeechResponse::with_audio("AA==")),
        ]);
        let request = SpeechRequest::new(Voice::Matthew, "hi");

        assert!(mock.synthesize(&request).await.is_err());
        assert!(mock.synthesize(&request).await.is_ok());
        assert!(mock.synthesize(&request).await.is_ok());
        assert_eq!(mock.call_count(), 3);
        assert_eq!(mock.requests()[0].voice_id, Voice::Matthew);
    }
}
