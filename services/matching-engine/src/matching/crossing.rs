//! Crossing detection
//!
//! Determines when an incoming limit order can trade against a resting
//! level.

use types::numeric::Price;
use types::order::Side;

/// True when an incoming `taker_side` order limited at `taker_price` crosses
/// a resting level at `maker_price`.
///
/// A buy crosses when its limit is at or above the ask; a sell crosses when
/// its limit is at or below the bid.
pub fn crosses(taker_side: Side, taker_price: Price, maker_price: Price) -> bool {
    match taker_side {
        Side::Buy => taker_price >= maker_price,
        Side::Sell => taker_price <= maker_price,
    }
}
