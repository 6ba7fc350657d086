//! Identifier types for book entities
//!
//! Order ids are opaque strings chosen by the caller. The book only requires
//! them to be non-empty; uniqueness among resting orders is enforced by the
//! engine's order index, not here.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an order.
///
/// Wraps the caller-supplied string so it cannot be confused with other
/// string-shaped values at the engine surface.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    /// Create a new OrderId from a string
    ///
    /// # Panics
    /// Panics if the id is empty
    pub fn new(id: impl Into<String>) -> Self {
        let s = id.into();
        assert!(!s.is_empty(), "order id must be non-empty");
        Self(s)
    }

    /// Try to create an OrderId, returning None if the string is empty
    pub fn try_new(id: impl Into<String>) -> Option<Self> {
        let s = id.into();
        if s.is_empty() {
            None
        } else {
            Some(Self(s))
        }
    }

    /// Get the id string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for OrderId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::try_new(s).ok_or_else(|| serde::de::Error::custom("order id must be non-empty"))
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_id_creation() {
        let id = OrderId::new("order-42");
        assert_eq!(id.as_str(), "order-42");
    }

    #[test]
    #[should_panic(expected = "order id must be non-empty")]
    fn test_order_id_empty_panics() {
        OrderId::new("");
    }

    #[test]
    fn test_order_id_try_new() {
        assert!(OrderId::try_new("o-1").is_some());
        assert!(OrderId::try_new("").is_none());
    }

    #[test]
    fn test_order_id_serialization() {
        let id = OrderId::new("sell-100");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"sell-100\"");

        let deserialized: OrderId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }

    #[test]
    fn test_order_id_rejects_empty_on_decode() {
        let result: Result<OrderId, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }
}
