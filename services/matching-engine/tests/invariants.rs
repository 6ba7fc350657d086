//! Deterministic randomized soak
//!
//! Drives a few thousand mixed operations from a seeded RNG, validating the
//! book invariants and the per-operation conservation properties after
//! every step, then unwinds the entire history in LIFO order and checks the
//! book comes back empty.

use matching_engine::{OrderBook, Rollback};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rust_decimal::Decimal;
use types::ids::OrderId;
use types::order::Side;
use uuid::Uuid;

const STEPS: usize = 2_000;

fn random_side(rng: &mut ChaCha8Rng) -> Side {
    if rng.gen_bool(0.5) {
        Side::Buy
    } else {
        Side::Sell
    }
}

#[test]
fn test_randomized_soak_and_full_unwind() {
    let mut rng = ChaCha8Rng::seed_from_u64(0xB001);
    let mut book = OrderBook::new();
    let mut history: Vec<Rollback> = Vec::new();
    let mut placed: Vec<OrderId> = Vec::new();

    for step in 0..STEPS {
        match rng.gen_range(0..100) {
            0..=69 => {
                let id = OrderId::new(format!("ord-{}", Uuid::now_v7()));
                let side = random_side(&mut rng);
                let quantity = Decimal::from(rng.gen_range(1..=5u64));
                let price = Decimal::from(rng.gen_range(90..=110u64));
                let result = book
                    .process_limit(side, id.clone(), quantity, price, step as i64)
                    .unwrap();

                if result.partial.is_some() {
                    assert!(
                        !result.partial_filled.is_zero(),
                        "a partial fill must report its filled quantity"
                    );
                }
                placed.push(id);
                history.push(result.rollback);
            }
            70..=84 => {
                let side = random_side(&mut rng);
                let quantity = Decimal::from(rng.gen_range(1..=8u64));
                let result = book.process_market_quantity(side, quantity).unwrap();

                // Conservation: done + partial + leftover == requested.
                let done: Decimal = result.done.iter().map(|o| o.quantity.as_decimal()).sum();
                assert_eq!(
                    done + result.partial_filled.as_decimal()
                        + result.quantity_left.as_decimal(),
                    quantity
                );
                history.push(result.rollback);
            }
            85..=92 => {
                let notional = Decimal::from(rng.gen_range(50..=500u64));
                let result = book.process_market_notional_buy(notional, 2).unwrap();

                // Conservation up to the rounding at scale 2.
                let mut spent = Decimal::ZERO;
                for order in &result.done {
                    spent += order.quantity * order.price;
                }
                if let Some(partial) = &result.partial {
                    spent += result.partial_filled.as_decimal() * partial.price.as_decimal();
                }
                assert_eq!(spent + result.notional_left, notional);
                history.push(result.rollback);
            }
            _ => {
                if placed.is_empty() {
                    continue;
                }
                let victim = placed[rng.gen_range(0..placed.len())].clone();
                // The id may have been consumed already; cancel is a no-op
                // then and contributes nothing to the history.
                if let Some((order, rollback)) = book.cancel_order(&victim) {
                    assert_eq!(order.id, victim);
                    history.push(rollback);
                }
            }
        }

        book.assert_invariants();

        // Periodic snapshot round-trip: decode must reproduce the exact
        // queues, not just the aggregates.
        if step % 500 == 250 {
            let json = serde_json::to_string(&book).unwrap();
            let decoded: OrderBook = serde_json::from_str(&json).unwrap();
            decoded.assert_invariants();
            assert_eq!(serde_json::to_string(&decoded).unwrap(), json);
        }
    }

    // Unwind the entire history; every intermediate state must be coherent
    // and the book must come back empty.
    for rollback in history.into_iter().rev() {
        book.rollback(rollback);
        book.assert_invariants();
    }

    assert!(book.bids().is_empty());
    assert!(book.asks().is_empty());
    assert_eq!(
        serde_json::to_string(&book).unwrap(),
        r#"{"asks":[],"bids":[]}"#
    );
}
