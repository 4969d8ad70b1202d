//! Voice input: a listening state machine over recognizer events.
//!
//! ```text
//! Idle --start--> Listening --end/error/stop--> Idle
//! ```
//!
//! Finalized segments are accumulated for the whole session. After every
//! result event the pending query buffer is overwritten with the finalized
//! text followed by the current interim segment.

use std::fmt;

use serde::Deserialize;
use tracing::{debug, warn};

use super::context::AppState;
use super::input_source::SpeechCapability;
use crate::error::{SpeechError, VoiceError};

pub const RECOGNITION_LANG: &str = "en-US";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionConfig {
    /// Keep listening across utterances.
    pub continuous: bool,
    /// Deliver not-yet-final transcripts while the user speaks.
    pub interim_results: bool,
    pub lang: String,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            continuous: false,
            interim_results: true,
            lang: RECOGNITION_LANG.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TranscriptSegment {
    pub transcript: String,
    #[serde(default)]
    pub is_final: bool,
}

impl TranscriptSegment {
    #[cfg(test)]
    pub fn interim(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            is_final: false,
        }
    }

    #[cfg(test)]
    pub fn finalized(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            is_final: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SpeechEvent {
    /// Segments that changed since the previous result event.
    Result { segments: Vec<TranscriptSegment> },
    Error { error: SpeechError },
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListeningState {
    Idle,
    Listening,
}

impl fmt::Display for ListeningState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListeningState::Idle => write!(f, "Idle"),
            ListeningState::Listening => write!(f, "Listening"),
        }
    }
}

/// What the caller should do after an event was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechOutcome {
    /// The buffer now holds this text.
    Updated(String),
    /// Speech ended with text in the buffer; submit it.
    Submit(String),
    /// Speech ended with nothing to submit.
    Ended,
    Failed(SpeechError),
    /// Event arrived while idle.
    Ignored,
}

#[derive(Debug)]
pub struct SpeechCapture {
    state: ListeningState,
    finalized: String,
}

impl Default for SpeechCapture {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeechCapture {
    pub fn new() -> Self {
        Self {
            state: ListeningState::Idle,
            finalized: String::new(),
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> ListeningState {
        self.state
    }

    pub fn is_listening(&self) -> bool {
        self.state == ListeningState::Listening
    }

    /// Enters `Listening` with an empty buffer.
    pub fn start(&mut self, buffer: &mut String) -> Result<(), VoiceError> {
        if self.is_listening() {
            return Err(VoiceError::AlreadyListening);
        }
        buffer.clear();
        self.finalized.clear();
        self.transition(ListeningState::Listening);
        Ok(())
    }

    /// Manual stop. Leaves the buffer as it is and never submits.
    pub fn stop(&mut self) {
        self.transition(ListeningState::Idle);
    }

    pub fn handle(&mut self, event: SpeechEvent, buffer: &mut String) -> SpeechOutcome {
        if !self.is_listening() {
            debug!(?event, "Ignoring speech event while idle");
            return SpeechOutcome::Ignored;
        }

        match event {
            SpeechEvent::Result { segments } => {
                let mut interim = String::new();
                for segment in segments {
                    if segment.is_final {
                        self.finalized.push_str(&segment.transcript);
                    } else {
                        interim.push_str(&segment.transcript);
                    }
                }

                buffer.clear();
                buffer.push_str(&self.finalized);
                buffer.push_str(&interim);
                SpeechOutcome::Updated(buffer.clone())
            }
            SpeechEvent::Error { error } => {
                warn!("Speech recognition error: {}", error);
                self.transition(ListeningState::Idle);
                SpeechOutcome::Failed(error)
            }
            SpeechEvent::End => {
                self.transition(ListeningState::Idle);
                if buffer.trim().is_empty() {
                    SpeechOutcome::Ended
                } else {
                    SpeechOutcome::Submit(buffer.clone())
                }
            }
        }
    }

    fn transition(&mut self, target: ListeningState) {
        if self.state != target {
            debug!("Speech state: {} -> {}", self.state, target);
        }
        self.state = target;
    }
}

/// Voice input bound to the speech capability detected at startup.
pub struct VoiceInput {
    capability: SpeechCapability,
    capture: SpeechCapture,
    config: RecognitionConfig,
}

impl VoiceInput {
    pub fn new(capability: SpeechCapability) -> Self {
        Self {
            capability,
            capture: SpeechCapture::new(),
            config: RecognitionConfig::default(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.capability.is_available()
    }

    #[cfg(test)]
    pub fn is_listening(&self) -> bool {
        self.capture.is_listening()
    }

    pub fn start(&mut self, state: &mut AppState) -> Result<(), VoiceError> {
        if state.is_loading() {
            return Err(VoiceError::Busy);
        }
        if self.capture.is_listening() {
            return Err(VoiceError::AlreadyListening);
        }
        let recognizer = match &mut self.capability {
            SpeechCapability::Available(recognizer) => recognizer,
            SpeechCapability::Unavailable => return Err(VoiceError::Unsupported),
        };

        state.clear_pending_query();
        recognizer
            .start(&self.config)
            .map_err(VoiceError::Recognizer)?;
        self.capture.start(state.pending_query_mut())
    }

    pub fn stop(&mut self) {
        if let SpeechCapability::Available(recognizer) = &mut self.capability {
            recognizer.stop();
        }
        self.capture.stop();
    }

    /// Waits for the next recognizer event and applies it to the pending query.
    ///
    /// Returns `None` once the recognizer has nothing more to deliver.
    pub async fn next_outcome(&mut self, state: &mut AppState) -> Option<SpeechOutcome> {
        let recognizer = match &mut self.capability {
            SpeechCapability::Available(recognizer) => recognizer,
            SpeechCapability::Unavailable => return None,
        };
        let event = recognizer.next_event().await?;
        let outcome = self.capture.handle(event, state.pending_query_mut());
        if !self.capture.is_listening() {
            recognizer.stop();
        }
        Some(outcome)
    }
}
