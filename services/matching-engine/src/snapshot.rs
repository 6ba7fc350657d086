//! Snapshot codec and depth ladder
//!
//! The book serializes as:
//!
//! ```json
//! {
//!   "asks": [{"price": "100", "volume": "2", "orders": [
//!       {"id": "sell-100", "side": "sell", "quantity": "2", "price": "100", "time": 0}]}],
//!   "bids": []
//! }
//! ```
//!
//! Sides list their levels best-first (asks ascending, bids descending),
//! each level carrying its orders in time priority. Decoding rebuilds both
//! sides and the id index, rejecting malformed structure, unknown side
//! strings, duplicate ids, zero quantities, and orders whose price or side
//! disagree with their level.

use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use types::numeric::{Price, Quantity};
use types::order::{Order, Side};

use crate::book::side::BookSide;
use crate::engine::OrderBook;

/// One serialized price level: aggregate plus the resting queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSnapshot {
    pub price: Price,
    pub volume: Quantity,
    pub orders: Vec<Order>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct BookSnapshot {
    asks: Vec<LevelSnapshot>,
    bids: Vec<LevelSnapshot>,
}

/// Aggregate (price, volume) of one level in a depth ladder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthLevel {
    pub price: Price,
    pub volume: Quantity,
}

/// Two-sided depth ladder, best-first on both sides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Depth {
    pub bids: Vec<DepthLevel>,
    pub asks: Vec<DepthLevel>,
}

impl OrderBook {
    /// Aggregate (price, volume) ladder, capped at `max_levels` per side
    /// (0 = unbounded). Read-only.
    pub fn depth(&self, max_levels: usize) -> Depth {
        Depth {
            bids: ladder(self.bids(), max_levels),
            asks: ladder(self.asks(), max_levels),
        }
    }
}

fn ladder(side: &BookSide, max_levels: usize) -> Vec<DepthLevel> {
    let cap = if max_levels == 0 {
        usize::MAX
    } else {
        max_levels
    };
    side.levels_best_first()
        .take(cap)
        .map(|level| DepthLevel {
            price: level.price(),
            volume: level.volume(),
        })
        .collect()
}

fn side_levels(side: &BookSide) -> Vec<LevelSnapshot> {
    side.levels_best_first()
        .map(|level| LevelSnapshot {
            price: level.price(),
            volume: level.volume(),
            orders: level.orders(side.arena()).cloned().collect(),
        })
        .collect()
}

impl Serialize for OrderBook {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        BookSnapshot {
            asks: side_levels(self.asks()),
            bids: side_levels(self.bids()),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for OrderBook {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let snapshot = BookSnapshot::deserialize(deserializer)?;
        let mut book = OrderBook::new();

        let sides = [
            (Side::Sell, &snapshot.asks),
            (Side::Buy, &snapshot.bids),
        ];
        for (side, levels) in sides {
            for level in levels {
                for order in &level.orders {
                    if order.side != side {
                        return Err(D::Error::custom(format!(
                            "order {} on the {} side carries side {}",
                            order.id, side, order.side
                        )));
                    }
                    if order.price != level.price {
                        return Err(D::Error::custom(format!(
                            "order {} price {} does not match level price {}",
                            order.id, order.price, level.price
                        )));
                    }
                    if order.quantity.is_zero() {
                        return Err(D::Error::custom(format!(
                            "order {} has zero quantity",
                            order.id
                        )));
                    }
                    book.insert_resting(order.clone())
                        .map_err(|err| D::Error::custom(err.to_string()))?;
                }
            }
        }
        Ok(book)
    }
}
