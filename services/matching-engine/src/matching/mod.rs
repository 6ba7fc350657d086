//! Matching logic
//!
//! Price-time priority: the cross predicate plus the queue-match subroutine
//! that consumes the best level.

pub mod crossing;
pub(crate) mod queue;

pub use crossing::crosses;
pub(crate) use queue::{match_best_level, MatchState};
