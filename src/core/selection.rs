//! Target selection for rotations
//!
//! Policies:
//! - SEQUENTIAL: stay on a label while it is eligible, then the first eligible one
//! - ROUND_ROBIN: next eligible label after the previous one, in list order
//! - RANDOM_NO_REPEAT: uniform among eligible labels, never the previous one
//!   when an alternative exists (bounded retries, then a deterministic pick)
//!
//! An empty eligible set falls back to the full label set.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::types::SelectionPolicy;
use crate::SELECTION_RETRIES;

/// Seeded RNG, or entropy-seeded when no seed is given
pub fn rng_from_seed(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Shuffled copy of `items`
pub fn shuffled<T: Clone>(items: &[T], rng: &mut StdRng) -> Vec<T> {
    let mut out = items.to_vec();
    out.shuffle(rng);
    out
}

/// Draw `count` items without replacement; repeats only to fill a short pool
pub fn draw(items: &[String], count: usize, rng: &mut StdRng) -> Vec<String> {
    let mut out = Vec::with_capacity(count);
    if items.is_empty() {
        return out;
    }
    while out.len() < count {
        let round = shuffled(items, rng);
        out.extend(round.into_iter().take(count - out.len()));
    }
    out
}

#[derive(Debug, Clone)]
pub struct TargetSelector {
    labels: Vec<String>,
    policy: SelectionPolicy,
    previous: Option<String>,
    rng: StdRng,
}

impl TargetSelector {
    pub fn new(labels: Vec<String>, policy: SelectionPolicy, seed: Option<u64>) -> Self {
        Self {
            labels,
            policy,
            previous: None,
            rng: rng_from_seed(seed),
        }
    }

    /// Pick the next target among `eligible` (labels still in play)
    pub fn select(&mut self, eligible: &[String]) -> Option<String> {
        let pool: Vec<String> = self
            .labels
            .iter()
            .filter(|l| eligible.is_empty() || eligible.contains(l))
            .cloned()
            .collect();
        if pool.is_empty() {
            return None;
        }

        let choice = match self.policy {
            SelectionPolicy::Sequential => self.sequential(&pool),
            SelectionPolicy::RoundRobin => self.round_robin(&pool),
            SelectionPolicy::RandomNoRepeat => self.random_no_repeat(&pool),
        };
        debug!(policy = ?self.policy, choice = %choice, "target selected");
        self.previous = Some(choice.clone());
        Some(choice)
    }

    fn sequential(&self, pool: &[String]) -> String {
        match &self.previous {
            Some(prev) if pool.contains(prev) => prev.clone(),
            _ => pool[0].clone(),
        }
    }

    fn round_robin(&self, pool: &[String]) -> String {
        let start = self
            .previous
            .as_ref()
            .and_then(|prev| self.labels.iter().position(|l| l == prev))
            .map_or(0, |i| i + 1);
        (0..self.labels.len())
            .map(|offset| &self.labels[(start + offset) % self.labels.len()])
            .find(|l| pool.contains(l))
            .unwrap_or(&pool[0])
            .clone()
    }

    fn random_no_repeat(&mut self, pool: &[String]) -> String {
        if pool.len() == 1 {
            return pool[0].clone();
        }
        for _ in 0..SELECTION_RETRIES {
            let candidate = &pool[self.rng.gen_range(0..pool.len())];
            if self.previous.as_ref() != Some(candidate) {
                return candidate.clone();
            }
        }
        pool.iter()
            .find(|l| self.previous.as_ref() != Some(*l))
            .unwrap_or(&pool[0])
            .clone()
    }

    pub fn previous(&self) -> Option<&str> {
        self.previous.as_deref()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}
