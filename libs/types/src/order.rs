//! Order record and side

use crate::ids::OrderId;
use crate::numeric::{Price, Quantity};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Order side (buyer or seller)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Buy order (bid)
    Buy,
    /// Sell order (ask)
    Sell,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

/// A resting or incoming order.
///
/// Value-like by convention: the book never mutates a resting order in
/// place. A partial fill swaps the queue node for a reduced-quantity copy
/// built with [`Order::with_quantity`], so the pre-fill image stays intact
/// for rollback. `time` records arrival and is never used for ordering;
/// priority within a level is insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub side: Side,
    pub quantity: Quantity,
    pub price: Price,
    /// Caller-supplied timestamp, Unix nanoseconds
    pub time: i64,
}

impl Order {
    /// Create a new order
    pub fn new(id: OrderId, side: Side, quantity: Quantity, price: Price, time: i64) -> Self {
        Self {
            id,
            side,
            quantity,
            price,
            time,
        }
    }

    /// Copy of this order with a different quantity, same identity otherwise
    pub fn with_quantity(&self, quantity: Quantity) -> Self {
        Self {
            id: self.id.clone(),
            quantity,
            ..*self
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}@{}",
            self.id, self.side, self.quantity, self.price
        )
    }
}
