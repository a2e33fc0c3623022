//! Posting engine.
//!
//! Atomic draft-to-posted transitions, line-by-line balance application,
//! and reversal with bidirectional linkage.

pub mod engine;
pub mod error;

pub use engine::PostingEngine;
pub use error::PostingError;
