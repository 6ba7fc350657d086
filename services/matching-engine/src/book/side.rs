//! One half of the book
//!
//! Holds every price level on the buy or sell side, keyed by price in a
//! `BTreeMap` for deterministic ordered iteration. The best price is cached
//! and repaired on removal, so the matching hot path reads it without a tree
//! descent; strict predecessor/successor walk the map in O(log P).

use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Unbounded};

use types::numeric::{Price, Quantity};
use types::order::{Order, Side};

use super::arena::{Arena, NodeId};
use super::price_level::PriceLevel;

/// All levels on one side of the book, plus side-wide aggregates.
#[derive(Debug, Clone)]
pub struct BookSide {
    side: Side,
    levels: BTreeMap<Price, PriceLevel>,
    arena: Arena,
    best: Option<Price>,
    volume: Quantity,
    num_orders: usize,
}

impl BookSide {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            levels: BTreeMap::new(),
            arena: Arena::new(),
            best: None,
            volume: Quantity::ZERO,
            num_orders: 0,
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Append an order at the tail of its price level, creating the level on
    /// first arrival at that price. Returns the order's node handle.
    pub fn append(&mut self, order: Order) -> NodeId {
        debug_assert_eq!(order.side, self.side);
        let price = order.price;
        let quantity = order.quantity;

        let level = self
            .levels
            .entry(price)
            .or_insert_with(|| PriceLevel::new(price));
        let node = level.append(&mut self.arena, order);

        self.volume += quantity;
        self.num_orders += 1;
        match self.best {
            Some(best) if !self.improves(price, best) => {}
            _ => self.best = Some(price),
        }
        node
    }

    /// Unlink the node, dropping its level when it empties. Returns the
    /// removed order.
    pub fn remove(&mut self, node: NodeId) -> Order {
        let price = self.arena.get(node).order.price;
        let level = self
            .levels
            .get_mut(&price)
            .expect("node refers to a missing level");
        let order = level.remove(&mut self.arena, node);

        if level.is_empty() {
            self.levels.remove(&price);
            if self.best == Some(price) {
                self.recompute_best();
            }
        }
        self.volume -= order.quantity;
        self.num_orders -= 1;
        order
    }

    /// Swap the order at `node` for `new` in place (same id, same price),
    /// returning the previous image. Used by the partial-fill protocol and
    /// its inverse.
    pub fn replace(&mut self, node: NodeId, new: Order) -> Order {
        debug_assert_eq!(new.side, self.side);
        let new_quantity = new.quantity;
        let level = self
            .levels
            .get_mut(&new.price)
            .expect("replacement at a missing level");
        let old = level.replace(&mut self.arena, node, new);
        self.volume = (self.volume + new_quantity) - old.quantity;
        old
    }

    /// The level at the top of the book: highest bid or lowest ask.
    pub fn best(&self) -> Option<&PriceLevel> {
        self.best.map(|price| &self.levels[&price])
    }

    /// Price at the top of the book, O(1) via the cache.
    pub fn best_price(&self) -> Option<Price> {
        self.best
    }

    /// Next level walking away from the top of the book: the greatest price
    /// strictly below `price` for bids, the smallest strictly above it for
    /// asks. None when `price` is the last level.
    pub fn strict_next(&self, price: Price) -> Option<&PriceLevel> {
        match self.side {
            Side::Buy => self.levels.range(..price).next_back().map(|(_, l)| l),
            Side::Sell => self
                .levels
                .range((Excluded(price), Unbounded))
                .next()
                .map(|(_, l)| l),
        }
    }

    /// Level at an exact price, if any
    pub fn level(&self, price: Price) -> Option<&PriceLevel> {
        self.levels.get(&price)
    }

    /// Iterate levels best-first: descending prices for bids, ascending for
    /// asks.
    pub fn levels_best_first(&self) -> Box<dyn Iterator<Item = &PriceLevel> + '_> {
        match self.side {
            Side::Buy => Box::new(self.levels.values().rev()),
            Side::Sell => Box::new(self.levels.values()),
        }
    }

    /// Order referenced by a live node handle
    pub fn order(&self, node: NodeId) -> &Order {
        &self.arena.get(node).order
    }

    pub(crate) fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Number of price levels
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// Number of resting orders across all levels
    pub fn num_orders(&self) -> usize {
        self.num_orders
    }

    /// Total resting quantity across all levels
    pub fn volume(&self) -> Quantity {
        self.volume
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    fn improves(&self, price: Price, best: Price) -> bool {
        match self.side {
            Side::Buy => price > best,
            Side::Sell => price < best,
        }
    }

    fn recompute_best(&mut self) {
        self.best = match self.side {
            Side::Buy => self.levels.keys().next_back().copied(),
            Side::Sell => self.levels.keys().next().copied(),
        };
    }

    /// Validate side-local invariants; test and debugging aid.
    pub fn assert_invariants(&self) {
        let mut volume = Quantity::ZERO;
        let mut num_orders = 0;

        for (price, level) in &self.levels {
            assert!(!level.is_empty(), "empty level at {price}");
            assert_eq!(level.price(), *price, "level keyed under wrong price");

            let mut level_volume = Quantity::ZERO;
            let mut level_len = 0;
            for order in level.orders(&self.arena) {
                assert_eq!(order.price, *price, "order {} off its level", order.id);
                assert_eq!(order.side, self.side, "order {} on wrong side", order.id);
                assert!(!order.quantity.is_zero(), "zero-quantity order {}", order.id);
                level_volume += order.quantity;
                level_len += 1;
            }
            assert_eq!(level.volume(), level_volume, "level volume drift at {price}");
            assert_eq!(level.len(), level_len, "level length drift at {price}");

            volume += level_volume;
            num_orders += level_len;
        }

        assert_eq!(self.volume, volume, "side volume drift");
        assert_eq!(self.num_orders, num_orders, "side order count drift");
        assert_eq!(self.arena.len(), num_orders, "arena leaks nodes");

        let expected_best = match self.side {
            Side::Buy => self.levels.keys().next_back().copied(),
            Side::Sell => self.levels.keys().next().copied(),
        };
        assert_eq!(self.best, expected_best, "stale best price cache");
    }
}
