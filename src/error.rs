use serde::Deserialize;
use thiserror::Error;

/// Failure of a single call to the chat endpoint.
///
/// Every variant is treated the same way by the submission flow: it is logged
/// and replaced by a fixed bot reply.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("request to chat endpoint failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("chat endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response from chat endpoint: {0}")]
    Malformed(String),

    #[error("request to chat endpoint was interrupted")]
    Interrupted,
}

/// Error kinds reported by a speech recognizer during a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Deserialize)]
pub enum SpeechError {
    #[error("not-allowed")]
    #[serde(rename = "not-allowed")]
    PermissionDenied,

    #[error("no-speech")]
    #[serde(rename = "no-speech")]
    NoSpeech,

    #[error("aborted")]
    #[serde(rename = "aborted")]
    Aborted,

    #[error("audio-capture")]
    #[serde(rename = "audio-capture")]
    AudioCapture,

    #[error("network")]
    #[serde(rename = "network")]
    Network,
}

/// Reasons a voice input session could not be started.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VoiceError {
    #[error("Speech recognition is not supported in this environment.")]
    Unsupported,

    #[error("Voice input is disabled while a reply is pending.")]
    Busy,

    #[error("Voice input is already listening.")]
    AlreadyListening,

    #[error("Speech recognition error: {0}")]
    Recognizer(SpeechError),
}

/// Slash command parse failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Unknown command: /{0}. Type /help for the list of commands.")]
    Unknown(String),

    #[error("/{0} needs an argument")]
    MissingArgument(&'static str),
}

/// Raised when a message is appended to a conversation id the store does not hold.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no conversation with id {0}")]
pub struct UnknownConversation(pub String);
