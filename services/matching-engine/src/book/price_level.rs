//! Price level with FIFO queue
//!
//! A price level holds all orders resting at one exact price, oldest at the
//! head, to enforce time priority. The queue is a doubly-linked list
//! threaded through the side's arena, so removal and in-place replacement by
//! handle are O(1). Cancellation by id and the partial-fill replacement
//! protocol both rely on this.

use types::numeric::{Price, Quantity};
use types::order::Order;

use super::arena::{Arena, Node, NodeId};

/// All resting orders at a single price on one side of the book.
///
/// `volume` is kept equal to the sum of the queued orders' quantities on
/// every append, remove and replace.
#[derive(Debug, Clone)]
pub struct PriceLevel {
    price: Price,
    head: Option<NodeId>,
    tail: Option<NodeId>,
    len: usize,
    volume: Quantity,
}

impl PriceLevel {
    pub fn new(price: Price) -> Self {
        Self {
            price,
            head: None,
            tail: None,
            len: 0,
            volume: Quantity::ZERO,
        }
    }

    /// Append an order at the tail of the queue; returns its node handle.
    pub fn append(&mut self, arena: &mut Arena, order: Order) -> NodeId {
        debug_assert_eq!(order.price, self.price);
        let quantity = order.quantity;
        let node = arena.insert(Node {
            order,
            prev: self.tail,
            next: None,
        });
        match self.tail {
            Some(tail) => arena.get_mut(tail).next = Some(node),
            None => self.head = Some(node),
        }
        self.tail = Some(node);
        self.len += 1;
        self.volume += quantity;
        node
    }

    /// Unlink the node and return its order.
    pub fn remove(&mut self, arena: &mut Arena, node: NodeId) -> Order {
        let Node { order, prev, next } = arena.remove(node);
        match prev {
            Some(prev) => arena.get_mut(prev).next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => arena.get_mut(next).prev = prev,
            None => self.tail = prev,
        }
        self.len -= 1;
        self.volume -= order.quantity;
        order
    }

    /// Swap the order at `node` for `new`, returning the previous image.
    ///
    /// The caller keeps id and price unchanged; this is the partial-fill
    /// replacement protocol, and the handle stays valid.
    pub fn replace(&mut self, arena: &mut Arena, node: NodeId, new: Order) -> Order {
        debug_assert_eq!(new.price, self.price);
        let slot = &mut arena.get_mut(node).order;
        debug_assert_eq!(slot.id, new.id);
        self.volume = (self.volume + new.quantity) - slot.quantity;
        std::mem::replace(slot, new)
    }

    /// Handle of the oldest order, None when the level is empty
    pub fn head(&self) -> Option<NodeId> {
        self.head
    }

    pub fn price(&self) -> Price {
        self.price
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn volume(&self) -> Quantity {
        self.volume
    }

    /// Iterate the queued orders oldest to newest.
    pub fn orders<'a>(&self, arena: &'a Arena) -> LevelOrders<'a> {
        LevelOrders {
            arena,
            cursor: self.head,
        }
    }
}

/// Iterator over one level's orders in time priority.
pub struct LevelOrders<'a> {
    arena: &'a Arena,
    cursor: Option<NodeId>,
}

impl<'a> Iterator for LevelOrders<'a> {
    type Item = &'a Order;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.arena.get(self.cursor?);
        self.cursor = node.next;
        Some(&node.order)
    }
}
