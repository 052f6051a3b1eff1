//! Cost estimation against per-backend rate cards.
//!
//! Each metered backend has an input and an output rate in USD per million
//! tokens; the local backend is 0/0. The table is built once at startup and
//! shared read-only. Lookup for a backend with no rate entry returns `None`
//! so the router excludes it from selection by the same comparison it uses
//! for normal pricing.

use crate::backend::Backend;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Default output-token estimate used before a response exists.
pub const DEFAULT_OUTPUT_TOKENS: u32 = 800;

/// Pricing for a single backend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rate {
    /// Input (prompt) cost in USD per million tokens.
    pub input_per_mtok: f64,
    /// Output (completion) cost in USD per million tokens.
    pub output_per_mtok: f64,
}

/// Immutable rate card for all backends, loaded at startup.
#[derive(Debug, Clone)]
pub struct RateCard {
    rates: Arc<HashMap<Backend, Rate>>,
}

impl RateCard {
    /// Build a rate card from explicit entries.
    pub fn new(rates: HashMap<Backend, Rate>) -> Self {
        Self {
            rates: Arc::new(rates),
        }
    }

    /// Built-in defaults: local is free, provider small models are cheap,
    /// provider large models are an order of magnitude more expensive.
    pub fn builtin() -> Self {
        let mut rates = HashMap::new();
        rates.insert(
            Backend::Local,
            Rate {
                input_per_mtok: 0.0,
                output_per_mtok: 0.0,
            },
        );
        rates.insert(
            Backend::RemoteSmallA,
            Rate {
                input_per_mtok: 0.15,
                output_per_mtok: 0.60,
            },
        );
        rates.insert(
            Backend::RemoteLargeA,
            Rate {
                input_per_mtok: 2.50,
                output_per_mtok: 10.00,
            },
        );
        rates.insert(
            Backend::RemoteSmallB,
            Rate {
                input_per_mtok: 0.25,
                output_per_mtok: 1.25,
            },
        );
        rates.insert(
            Backend::RemoteLargeB,
            Rate {
                input_per_mtok: 3.00,
                output_per_mtok: 15.00,
            },
        );
        Self::new(rates)
    }

    /// Price a request against a backend's rates, rounded to 6 decimals.
    ///
    /// Returns `None` when the backend has no rate entry; callers must
    /// treat such backends as unaffordable rather than free.
    pub fn price(&self, backend: Backend, input_tokens: u32, output_tokens: u32) -> Option<f64> {
        self.rates.get(&backend).map(|rate| {
            let cost = (input_tokens as f64 / 1_000_000.0) * rate.input_per_mtok
                + (output_tokens as f64 / 1_000_000.0) * rate.output_per_mtok;
            round6(cost)
        })
    }

    /// Price with the default output-token estimate.
    pub fn price_estimated(&self, backend: Backend, input_tokens: u32) -> Option<f64> {
        self.price(backend, input_tokens, DEFAULT_OUTPUT_TOKENS)
    }

    pub fn rate(&self, backend: Backend) -> Option<Rate> {
        self.rates.get(&backend).copied()
    }

    /// Cheapest remote backend for a given request size, if any remote has
    /// a rate entry. Used as the last-resort and forced-substitution pick.
    pub fn cheapest_remote(&self, input_tokens: u32) -> Option<(Backend, f64)> {
        Backend::ALL
            .iter()
            .filter(|b| !b.is_local())
            .filter_map(|&b| self.price_estimated(b, input_tokens).map(|cost| (b, cost)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }
}

impl Default for RateCard {
    fn default() -> Self {
        Self::builtin()
    }
}

fn round6(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn local_is_always_free() {
        let card = RateCard::builtin();
        assert_eq!(card.price(Backend::Local, 0, 0), Some(0.0));
        assert_eq!(card.price(Backend::Local, 1_000_000, 1_000_000), Some(0.0));
    }

    #[test]
    fn prices_small_a() {
        let card = RateCard::builtin();
        // 1M input at 0.15 + 800 output at 0.60/Mtok = 0.15 + 0.00048
        let cost = card.price_estimated(Backend::RemoteSmallA, 1_000_000).unwrap();
        assert!((cost - 0.15048).abs() < 1e-9);
    }

    #[test]
    fn rounds_to_six_decimals() {
        let card = RateCard::builtin();
        let cost = card.price(Backend::RemoteSmallA, 1, 1).unwrap();
        assert_eq!(cost, 0.000001);
    }

    #[test]
    fn missing_backend_prices_to_none() {
        let card = RateCard::new(HashMap::new());
        assert_eq!(card.price(Backend::RemoteLargeA, 1000, 800), None);
    }

    #[test]
    fn cheapest_remote_is_small_a_by_default() {
        let card = RateCard::builtin();
        let (backend, cost) = card.cheapest_remote(10_000).unwrap();
        assert_eq!(backend, Backend::RemoteSmallA);
        assert!(cost > 0.0);
    }

    #[test]
    fn cheapest_remote_none_when_card_empty() {
        let card = RateCard::new(HashMap::new());
        assert!(card.cheapest_remote(10_000).is_none());
    }

    #[test]
    fn pricing_is_idempotent() {
        let card = RateCard::builtin();
        let a = card.price(Backend::RemoteLargeB, 12_345, 800);
        let b = card.price(Backend::RemoteLargeB, 12_345, 800);
        assert_eq!(a, b);
    }

    proptest! {
        #[test]
        fn price_is_monotonic_in_input_tokens(
            t1 in 0u32..2_000_000,
            extra in 0u32..2_000_000,
            out in 0u32..100_000,
        ) {
            let card = RateCard::builtin();
            let low = card.price(Backend::RemoteLargeA, t1, out).unwrap();
            let high = card.price(Backend::RemoteLargeA, t1.saturating_add(extra), out).unwrap();
            prop_assert!(high >= low);
        }
    }
}
