//! Queue matching against the best level
//!
//! The inner subroutine shared by all three order-entry operations: consume
//! orders from the head of the best level on one side, in time priority,
//! until the incoming quantity is exhausted or the level is.

use rust_decimal::Decimal;
use tracing::trace;
use types::numeric::Quantity;
use types::order::Order;

use crate::book::side::BookSide;
use crate::index::OrderIndex;

/// Fill accounting accumulated across one operation's matching loop.
///
/// `restore` holds the pre-operation image of the order currently resting
/// in reduced form, captured the first time the operation touches it. The
/// notional-buy loop can reduce the same head repeatedly, or reduce it and
/// later consume it; measuring `partial_filled` against the first image, and
/// promoting that image into `done` on full consumption, keeps both the
/// conservation properties and the inverse exact.
#[derive(Debug, Default)]
pub(crate) struct MatchState {
    pub done: Vec<Order>,
    pub partial: Option<Order>,
    pub partial_filled: Decimal,
    pub restore: Option<Order>,
}

/// Consume up to `remaining` quantity from the best level of `book`,
/// removing filled makers from `index` as they go. Returns the unmatched
/// leftover. Stops at the level boundary; the caller decides whether the
/// next level is still eligible.
pub(crate) fn match_best_level(
    book: &mut BookSide,
    index: &mut OrderIndex,
    mut remaining: Decimal,
    state: &mut MatchState,
) -> Decimal {
    let Some(level_price) = book.best_price() else {
        return remaining;
    };

    while remaining > Decimal::ZERO {
        let Some(head) = book.level(level_price).and_then(|level| level.head()) else {
            break;
        };
        let head_order = book.order(head).clone();

        if remaining < head_order.quantity.as_decimal() {
            let reduced = head_order
                .with_quantity(Quantity::new(head_order.quantity.as_decimal() - remaining));
            book.replace(head, reduced.clone());

            let original = match state.restore.take() {
                Some(original) if original.id == head_order.id => original,
                _ => head_order,
            };
            state.partial_filled =
                original.quantity.as_decimal() - reduced.quantity.as_decimal();
            trace!(order = %reduced.id, filled = %state.partial_filled, "maker partially filled");
            state.restore = Some(original);
            state.partial = Some(reduced);
            remaining = Decimal::ZERO;
        } else {
            remaining -= head_order.quantity.as_decimal();
            index.remove(&head_order.id);
            let removed = book.remove(head);

            let done_entry = match state.restore.take() {
                Some(original) if original.id == removed.id => {
                    // The whole pre-operation image is consumed now.
                    state.partial = None;
                    state.partial_filled = Decimal::ZERO;
                    original
                }
                restore => {
                    state.restore = restore;
                    removed
                }
            };
            trace!(order = %done_entry.id, quantity = %done_entry.quantity, "maker filled");
            state.done.push(done_entry);
        }
    }

    remaining
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::ids::OrderId;
    use types::numeric::{Price, Quantity};
    use types::order::Side;

    fn seed(book: &mut BookSide, index: &mut OrderIndex, id: &str, qty: u64, price: u64) {
        let order = Order::new(
            OrderId::new(id),
            Side::Sell,
            Quantity::from_u64(qty),
            Price::from_u64(price),
            0,
        );
        let node = book.append(order);
        index.insert(
            OrderId::new(id),
            crate::index::Handle {
                side: Side::Sell,
                node,
            },
        );
    }

    #[test]
    fn test_consumes_in_time_priority() {
        let mut book = BookSide::new(Side::Sell);
        let mut index = OrderIndex::new();
        seed(&mut book, &mut index, "a", 1, 100);
        seed(&mut book, &mut index, "b", 2, 100);

        let mut state = MatchState::default();
        let left = match_best_level(&mut book, &mut index, Decimal::from(3), &mut state);

        assert_eq!(left, Decimal::ZERO);
        let ids: Vec<&str> = state.done.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
        assert!(state.partial.is_none());
        assert!(book.is_empty());
        assert!(index.is_empty());
    }

    #[test]
    fn test_partial_head_replaced_in_place() {
        let mut book = BookSide::new(Side::Sell);
        let mut index = OrderIndex::new();
        seed(&mut book, &mut index, "a", 2, 100);

        let mut state = MatchState::default();
        let left = match_best_level(&mut book, &mut index, Decimal::from(1), &mut state);

        assert_eq!(left, Decimal::ZERO);
        assert!(state.done.is_empty());
        let partial = state.partial.unwrap();
        assert_eq!(partial.id.as_str(), "a");
        assert_eq!(partial.quantity, Quantity::from_u64(1));
        assert_eq!(state.partial_filled, Decimal::from(1));
        // The original image is retained for the inverse.
        assert_eq!(state.restore.unwrap().quantity, Quantity::from_u64(2));
        // Still resting and indexed.
        assert!(index.lookup(&OrderId::new("a")).is_some());
        assert_eq!(book.volume(), Quantity::from_u64(1));
    }

    #[test]
    fn test_stops_at_level_boundary() {
        let mut book = BookSide::new(Side::Sell);
        let mut index = OrderIndex::new();
        seed(&mut book, &mut index, "a", 1, 100);
        seed(&mut book, &mut index, "b", 1, 110);

        let mut state = MatchState::default();
        let left = match_best_level(&mut book, &mut index, Decimal::from(5), &mut state);

        assert_eq!(left, Decimal::from(4));
        assert_eq!(state.done.len(), 1);
        assert_eq!(book.best_price(), Some(Price::from_u64(110)));
    }

    #[test]
    fn test_repeated_reduction_tracks_first_image() {
        let mut book = BookSide::new(Side::Sell);
        let mut index = OrderIndex::new();
        seed(&mut book, &mut index, "a", 10, 100);

        let mut state = MatchState::default();
        match_best_level(&mut book, &mut index, Decimal::from(3), &mut state);
        match_best_level(&mut book, &mut index, Decimal::from(2), &mut state);

        // Cumulative fill measured against the pre-operation image.
        assert_eq!(state.partial_filled, Decimal::from(5));
        assert_eq!(
            state.partial.as_ref().unwrap().quantity,
            Quantity::from_u64(5)
        );
        assert_eq!(state.restore.as_ref().unwrap().quantity, Quantity::from_u64(10));

        // Consuming the remainder promotes the original into done.
        let left = match_best_level(&mut book, &mut index, Decimal::from(5), &mut state);
        assert_eq!(left, Decimal::ZERO);
        assert!(state.partial.is_none());
        assert_eq!(state.partial_filled, Decimal::ZERO);
        assert!(state.restore.is_none());
        assert_eq!(state.done.len(), 1);
        assert_eq!(state.done[0].quantity, Quantity::from_u64(10));
    }
}
