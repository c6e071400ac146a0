//! Time budgeting for one turn.
//!
//! Two mechanisms keep the engine inside its clock. Before searching, a cost
//! model picks the deepest iteration expected to fit a slice of the remaining
//! time; the model self-corrects through an overshoot factor learned from
//! recent turns. During the search, every node polls the clock and the search
//! unwinds once the hard cutoff is crossed.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::config::TimeConfig;

/// What the engine knows about the clock while thinking.
pub trait TimeSource {
    /// Time spent on the current turn so far.
    fn elapsed(&self) -> Duration;
    /// Time left on the game clock, already net of `elapsed`.
    fn remaining(&self) -> Duration;
}

/// Wall clock for one turn, started when constructed.
#[derive(Clone, Copy, Debug)]
pub struct TurnClock {
    started: Instant,
    remaining_at_start: Duration,
}

impl TurnClock {
    pub fn start(remaining: Duration) -> Self {
        Self {
            started: Instant::now(),
            remaining_at_start: remaining,
        }
    }
}

impl TimeSource for TurnClock {
    fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    fn remaining(&self) -> Duration {
        self.remaining_at_start.saturating_sub(self.elapsed())
    }
}

/// A clock that never runs out; used for fixed-depth searches.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unlimited;

impl TimeSource for Unlimited {
    fn elapsed(&self) -> Duration {
        Duration::ZERO
    }

    fn remaining(&self) -> Duration {
        Duration::MAX
    }
}

/// Deadline rules, in the form the search polls them.
#[derive(Clone, Copy, Debug)]
pub struct Cutoffs {
    hard_divisor: u32,
    soft_divisor: u32,
}

impl Cutoffs {
    pub fn new(config: &TimeConfig) -> Self {
        Self {
            hard_divisor: config.hard_divisor,
            soft_divisor: config.soft_divisor,
        }
    }

    /// The running search must stop now.
    pub fn hard_expired(&self, clock: &impl TimeSource) -> bool {
        clock.elapsed().saturating_mul(self.hard_divisor) >= clock.remaining()
    }

    /// No new iteration should start.
    pub fn soft_expired(&self, clock: &impl TimeSource) -> bool {
        clock.elapsed().saturating_mul(self.soft_divisor) >= clock.remaining()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TurnPlan {
    /// Deepest iteration (in plies) the cost model expects to afford.
    pub target_depth: u32,
    pub predicted: Duration,
}

pub struct TimeManager {
    config: TimeConfig,
    max_depth: u32,
    // actual / predicted for the most recent turns
    ratios: VecDeque<f64>,
}

impl TimeManager {
    pub fn new(config: TimeConfig, max_depth: u32) -> Self {
        Self {
            ratios: VecDeque::with_capacity(config.overshoot_window),
            config,
            max_depth,
        }
    }

    pub fn reset(&mut self) {
        self.ratios.clear();
    }

    pub fn cutoffs(&self) -> Cutoffs {
        Cutoffs::new(&self.config)
    }

    fn branching(&self, pieces: u32) -> f64 {
        self.config.base_branching + self.config.branching_per_piece * pieces as f64
    }

    /// Model cost of a full iteration to `depth`, before the overshoot correction.
    fn raw_cost_micros(&self, depth: u32, pieces: u32) -> f64 {
        self.config.unit_cost_micros * self.branching(pieces).powi(depth as i32)
    }

    pub fn overshoot(&self) -> f64 {
        if self.ratios.is_empty() {
            return 1.0;
        }
        let mean = self.ratios.iter().sum::<f64>() / self.ratios.len() as f64;
        mean.clamp(0.05, 20.0)
    }

    pub fn predict(&self, depth: u32, pieces: u32) -> Duration {
        micros(self.raw_cost_micros(depth, pieces) * self.overshoot())
    }

    /// Walks down from the maximum depth until the predicted cost fits in
    /// `remaining / budget_divisor`. Never plans less than one ply.
    pub fn plan(&self, pieces: u32, remaining: Duration) -> TurnPlan {
        let budget = remaining / self.config.budget_divisor;
        let mut depth = self.max_depth;
        while depth > 1 && self.predict(depth, pieces) > budget {
            depth -= 1;
        }
        TurnPlan {
            target_depth: depth,
            predicted: self.predict(depth, pieces),
        }
    }

    /// Feeds back how long a turn that completed `depth` actually took.
    pub fn record(&mut self, depth: u32, pieces: u32, actual: Duration) {
        if depth == 0 {
            return;
        }
        let predicted = self.raw_cost_micros(depth, pieces);
        if predicted <= 0.0 || !predicted.is_finite() {
            return;
        }
        let ratio = actual.as_secs_f64() * 1_000_000.0 / predicted;
        if self.ratios.len() == self.config.overshoot_window.max(1) {
            self.ratios.pop_front();
        }
        self.ratios.push_back(ratio);
        log::trace!(
            "time model: depth {depth} took {actual:?}, ratio {ratio:.3}, overshoot {:.3}",
            self.overshoot()
        );
    }
}

fn micros(value: f64) -> Duration {
    if !value.is_finite() || value >= Duration::MAX.as_secs_f64() * 1_000_000.0 {
        return Duration::MAX;
    }
    Duration::from_secs_f64(value.max(0.0) / 1_000_000.0)
}
