//! Single-instrument limit order book engine
//!
//! An in-memory continuous limit order book with strict price-time priority
//! matching. Accepts limit orders, market orders by quantity, market buys by
//! notional, and cancellations; produces fill reports and a two-sided depth
//! snapshot; serializes to and from a JSON snapshot.
//!
//! Every mutating operation returns a compensating inverse
//! ([`engine::Rollback`]) that restores the pre-operation state exactly,
//! including the identity of partially consumed head orders.
//!
//! **Key invariants:**
//! - Price-time priority strictly enforced; all arithmetic is exact decimal
//! - Best-price retrieval is O(1), cancellation by id is O(1),
//!   price lookup is O(log P)
//! - Single-writer: callers serialize mutating operations externally;
//!   nothing here blocks, suspends, or performs I/O

pub mod book;
pub mod engine;
pub mod matching;
pub mod snapshot;

mod index;

pub use engine::{LimitResult, MarketResult, NotionalResult, OrderBook, Rollback};
pub use snapshot::{Depth, DepthLevel, LevelSnapshot};
