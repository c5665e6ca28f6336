//! Engine Process Management
//!
//! Owns the engine subprocess and its stdin/stdout, and implements the two
//! ways of deciding that the engine has finished answering: quiescence
//! polling and predicate-gated listening.

pub mod channel;
pub mod reader;
pub mod spawn;

// Re-exports for convenience
pub use channel::{ProcessChannel, StreamEvent, StreamStats};
pub use reader::{drain, read, trim_response, wait_until, EndCondition};
pub use spawn::spawn_engine;
