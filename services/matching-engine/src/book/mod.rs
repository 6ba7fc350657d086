//! Book-side data structures
//!
//! Contains the node arena, the FIFO price level, and the per-side level
//! map.

pub mod arena;
pub mod price_level;
pub mod side;

pub use price_level::PriceLevel;
pub use side::BookSide;
