//! Order book engine
//!
//! Composes the two book halves and the id index, and implements the public
//! operation surface: limit orders, market orders by quantity, market buys
//! by notional, cancellation, lookups, and market price estimation.
//!
//! Every mutating operation returns a [`Rollback`] describing its
//! compensating inverse. The engine is a single-writer structure: callers
//! serialize all mutating operations externally, and apply rollbacks
//! strictly in reverse order of the operations that produced them.
//!
//! **Key invariants** (hold at every return from a public operation):
//! - No two resting orders share an id.
//! - Every indexed handle resolves to an order with that id, on that side,
//!   at a level whose price equals the order's price.
//! - Level and side volumes equal the sum of their orders' quantities.
//! - If both sides are non-empty, best bid < best ask.

use rust_decimal::Decimal;
use tracing::debug;
use types::errors::BookError;
use types::ids::OrderId;
use types::numeric::{Price, Quantity};
use types::order::{Order, Side};

use crate::book::side::BookSide;
use crate::index::{Handle, OrderIndex};
use crate::matching::{crosses, match_best_level, MatchState};

/// Single-instrument limit order book with price-time priority matching.
#[derive(Debug, Clone)]
pub struct OrderBook {
    bids: BookSide,
    asks: BookSide,
    index: OrderIndex,
}

/// Outcome of a limit order.
#[derive(Debug)]
pub struct LimitResult {
    /// Fully executed counter-orders in consumption order. When the
    /// incoming order filled completely, the last entry is a synthetic
    /// report of it at its volume-weighted average execution price.
    pub done: Vec<Order>,
    /// The counter-order left resting in reduced form, or the incoming
    /// order's residue when it partially filled and rested.
    pub partial: Option<Order>,
    /// Quantity executed against `partial`.
    pub partial_filled: Quantity,
    /// Compensating inverse of this operation.
    pub rollback: Rollback,
}

/// Outcome of a market-by-quantity order.
#[derive(Debug)]
pub struct MarketResult {
    /// Fully executed counter-orders in consumption order.
    pub done: Vec<Order>,
    /// The counter-order left resting in reduced form, if the last level
    /// was consumed only partially.
    pub partial: Option<Order>,
    /// Quantity executed against `partial`.
    pub partial_filled: Quantity,
    /// Quantity that could not be matched before the side ran dry.
    pub quantity_left: Quantity,
    /// Compensating inverse of this operation.
    pub rollback: Rollback,
}

/// Outcome of a market-by-notional buy.
#[derive(Debug)]
pub struct NotionalResult {
    /// Fully executed counter-orders in consumption order.
    pub done: Vec<Order>,
    /// The ask left resting in reduced form, if any.
    pub partial: Option<Order>,
    /// Quantity executed against `partial`.
    pub partial_filled: Quantity,
    /// Notional that was not spent: the asks ran dry, or the rounding scale
    /// could not express another quantum at the best price. Can dip
    /// marginally below zero when the final rounded quantity overshoots the
    /// remaining notional by up to half a quantum.
    pub notional_left: Decimal,
    /// Compensating inverse of this operation.
    pub rollback: Rollback,
}

/// Compensating inverse of one mutating operation.
///
/// Captures the inverse as data: the resting residue to cancel, the
/// pre-consumption image of a partially consumed head order (re-applied in
/// place through the id index), and the fully consumed makers to re-append
/// in their original arrival order. Apply with [`OrderBook::rollback`].
///
/// Rollbacks compose LIFO: after `op1..opk`, apply `rk..r1`. Applying a
/// rollback after unrelated mutations leaves the book in an unspecified
/// state; avoiding that is the caller's responsibility.
#[derive(Debug, Default)]
#[must_use = "dropping a rollback forfeits the ability to undo the operation"]
pub struct Rollback {
    cancel: Option<OrderId>,
    restore: Option<Order>,
    reappend: Vec<Order>,
}

impl Rollback {
    /// True when applying this rollback would change nothing.
    pub fn is_empty(&self) -> bool {
        self.cancel.is_none() && self.restore.is_none() && self.reappend.is_empty()
    }
}

impl OrderBook {
    pub fn new() -> Self {
        Self {
            bids: BookSide::new(Side::Buy),
            asks: BookSide::new(Side::Sell),
            index: OrderIndex::new(),
        }
    }

    /// The buy side of the book
    pub fn bids(&self) -> &BookSide {
        &self.bids
    }

    /// The sell side of the book
    pub fn asks(&self) -> &BookSide {
        &self.asks
    }

    /// Look up a resting order by id.
    pub fn order(&self, id: &OrderId) -> Option<&Order> {
        let handle = self.index.lookup(id)?;
        Some(self.side(handle.side).order(handle.node))
    }

    /// Resting volume at an exact price on one side.
    pub fn volume_at(&self, side: Side, price: Decimal) -> Result<Quantity, BookError> {
        Price::try_new(price)
            .and_then(|price| self.side(side).level(price))
            .map(|level| level.volume())
            .ok_or(BookError::PriceNotFound { price })
    }

    /// Place a good-till-cancel limit order.
    ///
    /// Matches against the opposite side while the limit price crosses,
    /// then rests any remainder on `side`. When the order fills completely,
    /// `done` additionally carries a synthetic report order with the full
    /// original quantity priced at the volume-weighted average execution
    /// price (exact decimal division, no rounding).
    pub fn process_limit(
        &mut self,
        side: Side,
        id: OrderId,
        quantity: Decimal,
        price: Decimal,
        time: i64,
    ) -> Result<LimitResult, BookError> {
        if self.index.contains(&id) {
            return Err(BookError::OrderExists { id });
        }
        let quantity =
            Quantity::try_new(quantity).ok_or(BookError::InvalidQuantity { value: quantity })?;
        let price = Price::try_new(price).ok_or(BookError::InvalidPrice { value: price })?;

        let mut state = MatchState::default();
        let mut remaining = quantity.as_decimal();

        while remaining > Decimal::ZERO {
            let (opposite, index) = match side {
                Side::Buy => (&mut self.asks, &mut self.index),
                Side::Sell => (&mut self.bids, &mut self.index),
            };
            let Some(best) = opposite.best_price() else {
                break;
            };
            if !crosses(side, price, best) {
                break;
            }
            remaining = match_best_level(opposite, index, remaining, &mut state);
        }

        let MatchState {
            mut done,
            mut partial,
            mut partial_filled,
            restore,
        } = state;

        let mut rollback = Rollback {
            cancel: None,
            restore,
            reappend: done.clone(),
        };

        if remaining > Decimal::ZERO {
            let residue = Order::new(id.clone(), side, Quantity::new(remaining), price, time);
            let node = self.side_mut(side).append(residue.clone());
            self.index.insert(id.clone(), Handle { side, node });
            rollback.cancel = Some(id.clone());
            if !done.is_empty() {
                partial_filled = quantity.as_decimal() - remaining;
                partial = Some(residue);
            }
            debug!(%id, %side, quantity = %remaining, %price, "limit order resting");
        } else {
            // Fully filled: synthesize the volume-weighted summary report.
            let mut total_quantity = Decimal::ZERO;
            let mut total_notional = Decimal::ZERO;
            for order in &done {
                total_quantity += order.quantity.as_decimal();
                total_notional += order.quantity * order.price;
            }
            if partial_filled > Decimal::ZERO {
                if let Some(partial) = &partial {
                    total_quantity += partial_filled;
                    total_notional += partial.price.as_decimal() * partial_filled;
                }
            }
            let vwap = Price::new(total_notional / total_quantity);
            debug!(%id, %side, %quantity, %vwap, "limit order fully filled");
            done.push(Order::new(id, side, quantity, vwap, time));
        }

        Ok(LimitResult {
            done,
            partial,
            partial_filled: quantity_or_zero(partial_filled),
            rollback,
        })
    }

    /// Execute a market order for a fixed quantity.
    ///
    /// Sweeps the opposite side unconditionally, best level first. Whatever
    /// the book could not supply comes back as `quantity_left`.
    pub fn process_market_quantity(
        &mut self,
        side: Side,
        quantity: Decimal,
    ) -> Result<MarketResult, BookError> {
        let quantity =
            Quantity::try_new(quantity).ok_or(BookError::InvalidQuantity { value: quantity })?;

        let mut state = MatchState::default();
        let mut remaining = quantity.as_decimal();

        while remaining > Decimal::ZERO {
            let (opposite, index) = match side {
                Side::Buy => (&mut self.asks, &mut self.index),
                Side::Sell => (&mut self.bids, &mut self.index),
            };
            if opposite.best_price().is_none() {
                break;
            }
            remaining = match_best_level(opposite, index, remaining, &mut state);
        }

        let MatchState {
            done,
            partial,
            partial_filled,
            restore,
        } = state;

        debug!(%side, %quantity, left = %remaining, filled = done.len(), "market order executed");

        Ok(MarketResult {
            rollback: Rollback {
                cancel: None,
                restore,
                reappend: done.clone(),
            },
            done,
            partial,
            partial_filled: quantity_or_zero(partial_filled),
            quantity_left: quantity_or_zero(remaining),
        })
    }

    /// Spend up to `notional` (price × quantity units) buying from the
    /// asks.
    ///
    /// Per level, the purchasable quantity is `notional / price` rounded
    /// half away from zero at `scale` decimal places. A scale too coarse to
    /// express one quantum at the current best price stops the sweep with
    /// the remainder reported in `notional_left`, which is not an error.
    pub fn process_market_notional_buy(
        &mut self,
        notional: Decimal,
        scale: u32,
    ) -> Result<NotionalResult, BookError> {
        if notional <= Decimal::ZERO {
            return Err(BookError::InvalidPrice { value: notional });
        }

        let mut state = MatchState::default();
        let mut notional_left = notional;

        while notional_left > Decimal::ZERO {
            let Some(level_price) = self.asks.best_price() else {
                break;
            };
            let quantity = level_price.quantity_for_notional(notional_left, scale);
            if quantity <= Decimal::ZERO {
                break;
            }
            let left = match_best_level(&mut self.asks, &mut self.index, quantity, &mut state);
            notional_left -= (quantity - left) * level_price.as_decimal();
        }

        let MatchState {
            done,
            partial,
            partial_filled,
            restore,
        } = state;

        debug!(%notional, left = %notional_left, filled = done.len(), "notional buy executed");

        Ok(NotionalResult {
            rollback: Rollback {
                cancel: None,
                restore,
                reappend: done.clone(),
            },
            done,
            partial,
            partial_filled: quantity_or_zero(partial_filled),
            notional_left,
        })
    }

    /// Remove a resting order. Returns the removed order and the inverse
    /// that re-appends it, or None when the id is not resting.
    pub fn cancel_order(&mut self, id: &OrderId) -> Option<(Order, Rollback)> {
        let order = self.remove_resting(id)?;
        debug!(%id, "order canceled");
        let rollback = Rollback {
            cancel: None,
            restore: None,
            reappend: vec![order.clone()],
        };
        Some((order, rollback))
    }

    /// Notional cost of taking `quantity` from the opposite side at current
    /// depth, walking levels best-first. Read-only.
    ///
    /// When the side holds less than `quantity`, the error carries the
    /// notional value of everything that was available.
    pub fn market_price_estimate(
        &self,
        side: Side,
        quantity: Decimal,
    ) -> Result<Decimal, BookError> {
        let opposite = match side {
            Side::Buy => &self.asks,
            Side::Sell => &self.bids,
        };

        let mut remaining = quantity;
        let mut price = Decimal::ZERO;
        let mut level = opposite.best();

        while remaining > Decimal::ZERO {
            let Some(current) = level else {
                break;
            };
            let volume = current.volume().as_decimal();
            if remaining >= volume {
                price += current.price().as_decimal() * volume;
                remaining -= volume;
                level = opposite.strict_next(current.price());
            } else {
                price += current.price().as_decimal() * remaining;
                remaining = Decimal::ZERO;
            }
        }

        if remaining > Decimal::ZERO {
            return Err(BookError::InsufficientQuantity { available: price });
        }
        Ok(price)
    }

    /// Apply a compensating inverse produced by an earlier operation.
    ///
    /// Restores the operation's effects: cancels the resting residue,
    /// reinstates the partially consumed head order to its pre-operation
    /// image, and re-appends the fully consumed makers (at the tail of
    /// their levels, in original arrival order).
    pub fn rollback(&mut self, rollback: Rollback) {
        let Rollback {
            cancel,
            restore,
            reappend,
        } = rollback;

        if let Some(id) = cancel {
            let _ = self.remove_resting(&id);
            debug!(%id, "rollback: residue canceled");
        }
        if let Some(original) = restore {
            if let Some(handle) = self.index.lookup(&original.id) {
                debug!(id = %original.id, quantity = %original.quantity, "rollback: partial restored");
                self.side_mut(handle.side).replace(handle.node, original);
            }
        }
        for order in reappend {
            let side = order.side;
            let id = order.id.clone();
            debug!(%id, "rollback: maker re-appended");
            let node = self.side_mut(side).append(order);
            self.index.insert(id, Handle { side, node });
        }
    }

    /// Insert an order as resting without matching; snapshot decode path.
    pub(crate) fn insert_resting(&mut self, order: Order) -> Result<(), BookError> {
        if self.index.contains(&order.id) {
            return Err(BookError::OrderExists { id: order.id });
        }
        let side = order.side;
        let id = order.id.clone();
        let node = self.side_mut(side).append(order);
        self.index.insert(id, Handle { side, node });
        Ok(())
    }

    /// Validate the cross-component invariants; test and debugging aid.
    ///
    /// # Panics
    /// Panics on the first violated invariant.
    pub fn assert_invariants(&self) {
        self.bids.assert_invariants();
        self.asks.assert_invariants();

        assert_eq!(
            self.index.len(),
            self.bids.num_orders() + self.asks.num_orders(),
            "index does not cover exactly the resting orders"
        );
        for (id, handle) in self.index.iter() {
            let order = self.side(handle.side).order(handle.node);
            assert_eq!(&order.id, id, "index id does not match order id");
            assert_eq!(order.side, handle.side, "index side does not match order");
            assert!(
                self.side(handle.side).level(order.price).is_some(),
                "indexed order {id} has no level at its price"
            );
        }

        if let (Some(bid), Some(ask)) = (self.bids.best_price(), self.asks.best_price()) {
            assert!(bid < ask, "book is crossed: best bid {bid} >= best ask {ask}");
        }
    }

    fn side(&self, side: Side) -> &BookSide {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut BookSide {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }

    fn remove_resting(&mut self, id: &OrderId) -> Option<Order> {
        let handle = self.index.remove(id)?;
        Some(self.side_mut(handle.side).remove(handle.node))
    }
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new()
    }
}

fn quantity_or_zero(value: Decimal) -> Quantity {
    Quantity::try_new(value).unwrap_or(Quantity::ZERO)
}
