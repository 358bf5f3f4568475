//! Alert rendering hook
//!
//! Turns scan output into human-readable text. Delivery (terminal, chat,
//! file) is left to the caller.

use crate::domain::{Candidate, ScoreResult, WhaleEvent};

#[cfg_attr(test, mockall::automock)]
pub trait AlertRenderer: Send + Sync {
    fn render_whale(&self, event: &WhaleEvent) -> String;

    fn render_score(&self, candidate: &Candidate, result: &ScoreResult) -> String;
}
