//! Voice search on top of a platform speech recognizer.
//!
//! The recognizer delivers events asynchronously; the UI forwards each one
//! to [`VoiceSearch::handle_event`], which keeps the listening flag and
//! transcript in step and turns failures into toasts.

use crate::notice::Notice;
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_LANGUAGE: &str = "en-IN";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpeechError {
    #[error("speech recognition is not supported")]
    Unsupported,
    #[error("microphone permission denied")]
    NotAllowed,
    #[error("no speech detected")]
    NoSpeech,
    #[error("no microphone found")]
    AudioCapture,
    #[error("network error during recognition")]
    Network,
    #[error("recognition failed: {0}")]
    Other(String),
}

impl SpeechError {
    fn notice(&self) -> Notice {
        let message = match self {
            SpeechError::Unsupported => "Voice search is not supported in this browser",
            SpeechError::NotAllowed => {
                "Microphone access denied. Please allow microphone access to use voice search"
            }
            SpeechError::NoSpeech => "No speech detected. Please try again",
            SpeechError::AudioCapture => "No microphone found. Please check your device",
            SpeechError::Network => "Network error during voice search. Please try again",
            SpeechError::Other(_) => "Voice search failed. Please try again",
        };
        Notice::error(message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechEvent {
    Interim(String),
    Final(String),
    Error(SpeechError),
    End,
}

/// Platform speech-recognition capability
pub trait SpeechRecognizer {
    fn is_supported(&self) -> bool;

    fn start(&mut self, language: &str) -> Result<(), SpeechError>;

    fn stop(&mut self);
}

pub struct VoiceSearch<R: SpeechRecognizer> {
    recognizer: R,
    language: String,
    is_listening: bool,
    transcript: String,
}

impl<R: SpeechRecognizer> VoiceSearch<R> {
    pub fn new(recognizer: R) -> Self {
        Self::with_language(recognizer, DEFAULT_LANGUAGE)
    }

    pub fn with_language(recognizer: R, language: &str) -> Self {
        Self {
            recognizer,
            language: language.to_string(),
            is_listening: false,
            transcript: String::new(),
        }
    }

    pub fn is_supported(&self) -> bool {
        self.recognizer.is_supported()
    }

    pub fn is_listening(&self) -> bool {
        self.is_listening
    }

    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    pub fn start(&mut self) -> Result<(), Notice> {
        if !self.recognizer.is_supported() {
            return Err(SpeechError::Unsupported.notice());
        }
        if self.is_listening {
            return Ok(());
        }
        self.transcript.clear();
        match self.recognizer.start(&self.language) {
            Ok(()) => {
                debug!("Voice search listening ({})", self.language);
                self.is_listening = true;
                Ok(())
            }
            Err(e) => {
                warn!("Voice search failed to start: {}", e);
                Err(e.notice())
            }
        }
    }

    pub fn stop(&mut self) {
        if self.is_listening {
            self.recognizer.stop();
            self.is_listening = false;
        }
    }

    /// Apply a recognizer event. `on_final` runs once with the final
    /// transcript. Returns a toast for failures.
    pub fn handle_event(
        &mut self,
        event: SpeechEvent,
        on_final: impl FnOnce(&str),
    ) -> Option<Notice> {
        match event {
            SpeechEvent::Interim(text) => {
                if self.is_listening {
                    self.transcript = text;
                }
                None
            }
            SpeechEvent::Final(text) => {
                if !self.is_listening {
                    return None;
                }
                self.transcript = text.trim().to_string();
                self.stop();
                debug!("Voice search result {:?}", self.transcript);
                on_final(&self.transcript);
                None
            }
            SpeechEvent::Error(e) => {
                warn!("Voice search error: {}", e);
                self.stop();
                Some(e.notice())
            }
            SpeechEvent::End => {
                self.is_listening = false;
                None
            }
        }
    }
}
