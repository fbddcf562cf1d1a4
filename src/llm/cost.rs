//! Cost accounting for LLM usage across a game.
//!
//! Costs are tracked internally in hundredths of a cent to avoid
//! floating-point drift when summing many small calls. Public methods accept
//! and return dollar amounts.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use crate::llm::client::Usage;

const MILLICENTS_PER_DOLLAR: f64 = 100_000.0;

/// Per-million-token pricing for a model.
#[derive(Debug, Clone, Copy)]
pub struct ModelPricing {
    /// Dollars per 1M input tokens.
    pub per_1m_input: f64,
    /// Dollars per 1M output tokens.
    pub per_1m_output: f64,
}

impl Default for ModelPricing {
    fn default() -> Self {
        Self {
            per_1m_input: 1.0,
            per_1m_output: 3.0,
        }
    }
}

impl ModelPricing {
    /// Dollar cost of one call.
    pub fn cost(&self, usage: Usage) -> f64 {
        (usage.prompt_tokens as f64 / 1_000_000.0) * self.per_1m_input
            + (usage.completion_tokens as f64 / 1_000_000.0) * self.per_1m_output
    }
}

/// Accumulates per-seat and per-model spend for one game.
#[derive(Debug, Default)]
pub struct CostTracker {
    total_millicents: AtomicU64,
    by_seat: RwLock<HashMap<usize, u64>>,
    by_model: RwLock<HashMap<String, u64>>,
}

/// End-of-game cost summary.
#[derive(Debug, Clone)]
pub struct CostReport {
    /// Total spend in dollars.
    pub total: f64,
    /// Spend per seat in dollars, seat-ordered.
    pub by_seat: Vec<(usize, f64)>,
    /// Spend per model in dollars.
    pub by_model: HashMap<String, f64>,
}

impl CostTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the cost of one call.
    pub fn record(&self, seat: usize, model: &str, dollars: f64) {
        let millicents = (dollars * MILLICENTS_PER_DOLLAR).round().max(0.0) as u64;
        self.total_millicents.fetch_add(millicents, Ordering::Relaxed);
        *self
            .by_seat
            .write()
            .expect("cost lock poisoned")
            .entry(seat)
            .or_insert(0) += millicents;
        *self
            .by_model
            .write()
            .expect("cost lock poisoned")
            .entry(model.to_string())
            .or_insert(0) += millicents;
    }

    /// Total spend so far in dollars.
    pub fn total_dollars(&self) -> f64 {
        self.total_millicents.load(Ordering::Relaxed) as f64 / MILLICENTS_PER_DOLLAR
    }

    /// Build the end-of-game report.
    pub fn report(&self) -> CostReport {
        let mut by_seat: Vec<(usize, f64)> = self
            .by_seat
            .read()
            .expect("cost lock poisoned")
            .iter()
            .map(|(seat, mc)| (*seat, *mc as f64 / MILLICENTS_PER_DOLLAR))
            .collect();
        by_seat.sort_by_key(|(seat, _)| *seat);

        let by_model = self
            .by_model
            .read()
            .expect("cost lock poisoned")
            .iter()
            .map(|(model, mc)| (model.clone(), *mc as f64 / MILLICENTS_PER_DOLLAR))
            .collect();

        CostReport {
            total: self.total_dollars(),
            by_seat,
            by_model,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pricing_computes_dollar_cost() {
        let pricing = ModelPricing {
            per_1m_input: 3.0,
            per_1m_output: 15.0,
        };
        let usage = Usage {
            prompt_tokens: 1_000_000,
            completion_tokens: 200_000,
        };
        assert!((pricing.cost(usage) - 6.0).abs() < 1e-9);
    }

    #[test]
    fn tracker_accumulates_per_seat_and_model() {
        let tracker = CostTracker::new();
        tracker.record(0, "model-a", 0.05);
        tracker.record(0, "model-a", 0.05);
        tracker.record(1, "model-b", 0.20);

        let report = tracker.report();
        assert!((report.total - 0.30).abs() < 1e-6);
        assert_eq!(report.by_seat, vec![(0, 0.10), (1, 0.20)]);
        assert!((report.by_model["model-a"] - 0.10).abs() < 1e-6);
    }
}
