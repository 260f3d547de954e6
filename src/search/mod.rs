pub mod filter;
pub mod store;
pub mod voice;

pub use filter::apply_filters;
pub use store::{SearchState, SearchStore};
pub use voice::{SpeechError, SpeechEvent, SpeechRecognizer, VoiceSearch};
