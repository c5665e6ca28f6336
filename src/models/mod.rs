//! Core data models for ucidriver
//!
//! Plain data describing an engine session: the lifecycle state machine
//! and the bookkeeping record for the spawned engine process.

pub mod engine_process;

// Re-exports for convenience
pub use engine_process::{EngineProcess, SessionState};
