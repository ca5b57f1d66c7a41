//! Scenario exploration for Android applications.
//!
//! A free-text scenario is split into actions, each target element is
//! located on the live screen with the help of a language-model oracle, and
//! every step is recorded into a replayable trace.

pub mod cli;
pub mod device;
pub mod engine;
pub mod executor;
pub mod hierarchy;
pub mod oracle;
pub mod resolver;
pub mod scenario;
pub mod trace;
