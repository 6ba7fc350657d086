//! Error taxonomy for book operations
//!
//! Every variant is a precondition failure reported before any state
//! mutation; an `Err` return means the book is unchanged.

use crate::ids::OrderId;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors surfaced by the order book operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookError {
    /// An order with this id is already resting on the book
    #[error("order already exists: {id}")]
    OrderExists { id: OrderId },

    /// Quantity was zero or negative
    #[error("invalid quantity: {value}")]
    InvalidQuantity { value: Decimal },

    /// Price (or notional amount) was zero or negative
    #[error("invalid price: {value}")]
    InvalidPrice { value: Decimal },

    /// The book held less volume than the requested quantity; `available`
    /// carries the notional value of everything that was on the side.
    #[error("insufficient volume on the book: {available} notional available")]
    InsufficientQuantity { available: Decimal },

    /// No level rests at the queried price
    #[error("no price level at {price}")]
    PriceNotFound { price: Decimal },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BookError::OrderExists {
            id: OrderId::new("o-1"),
        };
        assert_eq!(err.to_string(), "order already exists: o-1");

        let err = BookError::InvalidQuantity {
            value: Decimal::from(-1),
        };
        assert_eq!(err.to_string(), "invalid quantity: -1");
    }

    #[test]
    fn test_error_equality() {
        let a = BookError::InvalidPrice {
            value: Decimal::ZERO,
        };
        let b = BookError::InvalidPrice {
            value: Decimal::ZERO,
        };
        assert_eq!(a, b);
    }
}
