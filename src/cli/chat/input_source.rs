use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use eyre::{Result, eyre};
use tracing::{debug, info};

use super::speech::{RecognitionConfig, SpeechEvent};
use crate::error::SpeechError;

/// A source of speech recognition events.
#[async_trait]
pub trait SpeechRecognizer: Send {
    /// Begins a recognition session.
    fn start(&mut self, config: &RecognitionConfig) -> Result<(), SpeechError>;

    /// Ends the current session. No further events are delivered for it.
    fn stop(&mut self);

    /// Next event of the current session, or `None` when there is no session.
    async fn next_event(&mut self) -> Option<SpeechEvent>;
}

/// Whether speech recognition can be used at all in this environment.
pub enum SpeechCapability {
    Available(Box<dyn SpeechRecognizer>),
    Unavailable,
}

impl SpeechCapability {
    /// Detects the capability once at startup.
    ///
    /// A recognizer exists only when an event script was configured.
    pub fn detect(speech_script: Option<&Path>) -> Result<Self> {
        match speech_script {
            Some(path) => {
                let recognizer = ScriptedRecognizer::from_file(path)?;
                info!("Speech recognition replays {}", path.display());
                Ok(Self::Available(Box::new(recognizer)))
            }
            None => {
                info!("Speech recognition is not supported in this environment");
                Ok(Self::Unavailable)
            }
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }
}

/// Replays a fixed list of events for every session.
///
/// A session whose script has no `end` event gets one appended, so every
/// session terminates.
pub struct ScriptedRecognizer {
    script: Vec<SpeechEvent>,
    queue: VecDeque<SpeechEvent>,
    delay: Duration,
    active: bool,
}

impl ScriptedRecognizer {
    pub fn new(script: Vec<SpeechEvent>) -> Self {
        Self {
            script,
            queue: VecDeque::new(),
            delay: Duration::ZERO,
            active: false,
        }
    }

    /// Reads a JSON array of events, e.g.
    /// `[{"type":"result","segments":[{"transcript":"hi","is_final":true}]},{"type":"end"}]`.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| eyre!("Failed to read speech script {}: {}", path.display(), e))?;
        let script: Vec<SpeechEvent> = serde_json::from_str(&content)
            .map_err(|e| eyre!("Invalid speech script {}: {}", path.display(), e))?;
        Ok(Self::new(script).with_delay(Duration::from_millis(300)))
    }

    /// Pause before each event, to mimic someone speaking.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl SpeechRecognizer for ScriptedRecognizer {
    fn start(&mut self, config: &RecognitionConfig) -> Result<(), SpeechError> {
        if self.active {
            return Err(SpeechError::Aborted);
        }
        debug!(?config, events = self.script.len(), "Starting scripted speech session");

        self.queue = self.script.iter().cloned().collect();
        if !self.queue.iter().any(|e| matches!(e, SpeechEvent::End)) {
            self.queue.push_back(SpeechEvent::End);
        }
        self.active = true;
        Ok(())
    }

    fn stop(&mut self) {
        self.queue.clear();
        self.active = false;
    }

    async fn next_event(&mut self) -> Option<SpeechEvent> {
        if !self.active {
            return None;
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let event = self.queue.pop_front();
        if matches!(event, None | Some(SpeechEvent::End)) {
            self.active = false;
            self.queue.clear();
        }
        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::chat::speech::TranscriptSegment;
    use std::io::Write;

    fn hello() -> SpeechEvent {
        SpeechEvent::Result {
            segments: vec![TranscriptSegment::finalized("hello")],
        }
    }

    #[tokio::test]
    async fn test_replays_script_then_stops() {
        let mut recognizer = ScriptedRecognizer::new(vec![hello(), SpeechEvent::End]);
        assert!(recognizer.next_event().await.is_none());

        recognizer.start(&RecognitionConfig::default()).unwrap();
        assert_eq!(recognizer.next_event().await, Some(hello()));
        assert_eq!(recognizer.next_event().await, Some(SpeechEvent::End));
        assert_eq!(recognizer.next_event().await, None);
    }

    #[tokio::test]
    async fn test_missing_end_is_appended() {
        let mut recognizer = ScriptedRecognizer::new(vec![hello()]);
        recognizer.start(&RecognitionConfig::default()).unwrap();

        assert_eq!(recognizer.next_event().await, Some(hello()));
        assert_eq!(recognizer.next_event().await, Some(SpeechEvent::End));
    }

    #[tokio::test]
    async fn test_every_session_replays_from_the_start() {
        let mut recognizer = ScriptedRecognizer::new(vec![hello(), SpeechEvent::End]);

        for _ in 0..2 {
            recognizer.start(&RecognitionConfig::default()).unwrap();
            assert_eq!(recognizer.next_event().await, Some(hello()));
            assert_eq!(recognizer.next_event().await, Some(SpeechEvent::End));
        }
    }

    #[test]
    fn test_start_while_active_is_aborted() {
        let mut recognizer = ScriptedRecognizer::new(vec![SpeechEvent::End]);
        recognizer.start(&RecognitionConfig::default()).unwrap();
        assert_eq!(
            recognizer.start(&RecognitionConfig::default()),
            Err(SpeechError::Aborted)
        );
    }

    #[test]
    fn test_detect_without_script_is_unavailable() {
        let capability = SpeechCapability::detect(None).unwrap();
        assert!(!capability.is_available());
    }

    #[test]
    fn test_detect_reads_script_file() {
        let path = std::env::temp_dir().join(format!("speech-script-{}.json", std::process::id()));
        let mut file = fs::File::create(&path).unwrap();
        write!(file, r#"[{{"type":"result","segments":[{{"transcript":"hi"}}]}}]"#).unwrap();

        let capability = SpeechCapability::detect(Some(&path)).unwrap();
        assert!(capability.is_available());

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_detect_rejects_invalid_script() {
        let path = std::env::temp_dir().join(format!("bad-speech-script-{}.json", std::process::id()));
        fs::write(&path, "not json").unwrap();

        let result = SpeechCapability::detect(Some(&path));
        assert!(result.is_err());

        fs::remove_file(&path).unwrap();
    }
}
