pub mod replies;
pub mod store;

pub use replies::canned_reply;
pub use store::{MessageStore, MessagingState, ReplySettings};
