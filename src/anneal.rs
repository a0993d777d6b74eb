//! Simulated annealing over the order in which pieces are fed to the greedy
//! placement rule. Each piece keeps the orientation it was last packed in,
//! so a neighbour starts from the current layout rather than the demand shapes.

use std::time::Instant;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::config::{AnnealConfig, SearchLimits};
use crate::greedy::{Piece, expand, pack_in_order};
use crate::types::{Demand, Placement};

#[derive(Debug, Clone)]
pub struct AnnealOutcome {
    pub length: u32,
    pub placements: Vec<Placement>,
    pub iterations: u64,
    pub accepted: u64,
    pub improvements: u64,
}

pub struct Annealer<R: Rng> {
    width: u32,
    config: AnnealConfig,
    deadline: Option<Instant>,
    rng: R,
}

impl Annealer<ChaCha8Rng> {
    /// Seeded from `config.seed`, or from the thread RNG when unset.
    pub fn new(width: u32, config: AnnealConfig, limits: SearchLimits) -> Self {
        let seed = config.seed.unwrap_or_else(rand::random);
        Self::with_rng(width, config, limits, ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<R: Rng> Annealer<R> {
    pub fn with_rng(width: u32, config: AnnealConfig, limits: SearchLimits, rng: R) -> Self {
        Self {
            width,
            config,
            deadline: limits.time_limit().map(|limit| Instant::now() + limit),
            rng,
        }
    }

    pub fn run(mut self, demands: &[Demand]) -> AnnealOutcome {
        let mut order = expand(demands);
        order.shuffle(&mut self.rng);

        let (mut current, mut best_placements) = pack_in_order(self.width, &order);
        adopt_orientations(&mut order, &best_placements);
        let mut best = current;
        let mut temperature = self.config.initial_temperature;
        let mut outcome = AnnealOutcome {
            length: best,
            placements: Vec::new(),
            iterations: 0,
            accepted: 0,
            improvements: 0,
        };
        info!(
            width = self.width,
            pieces = order.len(),
            initial = current,
            "starting simulated annealing"
        );

        let n = order.len();
        if n >= 2 {
            for _ in 0..=self.config.iterations {
                if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                    break;
                }
                outcome.iterations += 1;

                let (i, j) = self.pick_pair(n);
                order.swap(i, j);
                let (length, placements) = pack_in_order(self.width, &order);

                if length < current || self.accept_worse(length - current, temperature) {
                    current = length;
                    adopt_orientations(&mut order, &placements);
                    outcome.accepted += 1;
                    if current < best {
                        best = current;
                        best_placements = placements;
                        outcome.improvements += 1;
                        debug!(length = best, iteration = outcome.iterations, "new best packing");
                    }
                } else {
                    order.swap(i, j);
                }
                temperature *= self.config.cooling;
            }
        }

        info!(
            length = best,
            iterations = outcome.iterations,
            accepted = outcome.accepted,
            improvements = outcome.improvements,
            "simulated annealing finished"
        );
        outcome.length = best;
        outcome.placements = best_placements;
        outcome
    }

    /// Two distinct positions in `0..n`.
    fn pick_pair(&mut self, n: usize) -> (usize, usize) {
        let i = self.rng.random_range(0..n);
        let mut j = self.rng.random_range(0..n - 1);
        if j >= i {
            j += 1;
        }
        (i, j)
    }

    /// Boltzmann criterion for a non-improving move of `delta` units.
    fn accept_worse(&mut self, delta: u32, temperature: f64) -> bool {
        let p = if delta == 0 {
            1.0
        } else {
            (-(delta as f64) / temperature).exp()
        };
        self.rng.random::<f64>() < p
    }
}

/// Turns every piece the way `placements` packed it. `pack_in_order` emits one
/// placement per piece, in order.
fn adopt_orientations(order: &mut [Piece], placements: &[Placement]) {
    for (piece, p) in order.iter_mut().zip(placements) {
        piece.rect = p.rect;
        piece.rotated = p.rotated;
    }
}
