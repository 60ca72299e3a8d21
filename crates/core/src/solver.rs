//! Multi-start solve driver.
//!
//! One optimizer instance owns the immutable problem data for a single
//! bundle layer. Each multi-start call generates one spiral guess plus
//! randomized starts, solves them independently (in parallel when the
//! configuration allows), and keeps the feasible attempt with the
//! smallest enclosing radius.

use rand::prelude::*;
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::nlp::{NlpBackend, SlsqpBackend};
use crate::problem::{PackingProblem, FEASIBILITY_TOL};
use crate::result::{AttemptResult, BundleLayout};

/// Progress callback for multi-start solves.
///
/// Invoked with `(completed, total)` after each finished attempt, from
/// whichever worker thread completed it. Completion order is not
/// related to start order when attempts run in parallel.
pub type ProgressCallback = Box<dyn Fn(usize, usize) + Send + Sync>;

/// Configuration for a multi-start solve.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SolverConfig {
    /// Number of starts: one spiral guess plus `n_starts - 1` random ones.
    pub n_starts: usize,

    /// Iteration budget per attempt.
    pub max_iterations: usize,

    /// Number of worker threads (0 = rayon's global pool).
    pub threads: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            n_starts: 8,
            max_iterations: 2000,
            threads: 0,
        }
    }
}

impl SolverConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of starts (at least 1).
    pub fn with_starts(mut self, n_starts: usize) -> Self {
        self.n_starts = n_starts.max(1);
        self
    }

    /// Sets the per-attempt iteration budget (at least 1).
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    /// Sets the worker thread count (0 = auto).
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }
}

/// Circle-packing optimizer for one wire bundle layer.
///
/// Construction fixes the radii, margin, and inner exclusion radius;
/// the instance can then be queried any number of times. Calls are
/// independent of each other except that the last best layout is
/// cached for introspection.
pub struct WireBundleOptimizer {
    problem: PackingProblem,
    backend: Box<dyn NlpBackend + Send + Sync>,
    best: Option<BundleLayout>,
}

impl WireBundleOptimizer {
    /// Creates an optimizer for the given wire radii, manufacturing
    /// margin fraction, and inner exclusion radius.
    ///
    /// # Errors
    ///
    /// Propagates the input validation of [`PackingProblem::new`].
    pub fn new(radii: &[f64], margin: f64, inner_radius: f64) -> Result<Self> {
        Ok(Self {
            problem: PackingProblem::new(radii, margin, inner_radius)?,
            backend: Box::new(SlsqpBackend::default()),
            best: None,
        })
    }

    /// Replaces the nonlinear solver backend.
    pub fn with_backend(mut self, backend: Box<dyn NlpBackend + Send + Sync>) -> Self {
        self.backend = backend;
        self
    }

    /// The underlying problem formulation.
    pub fn problem(&self) -> &PackingProblem {
        &self.problem
    }

    /// Best layout of the most recent multi-start call, if any.
    pub fn best_layout(&self) -> Option<&BundleLayout> {
        self.best.as_ref()
    }

    /// Runs one constrained solve from `x0` (the spiral guess when
    /// `None`) with the given iteration budget.
    ///
    /// The attempt is feasible only when the backend reports
    /// convergence and the final point independently passes the
    /// constraint check at [`FEASIBILITY_TOL`].
    pub fn solve(&self, x0: Option<&[f64]>, max_iterations: usize) -> AttemptResult {
        let spiral;
        let x0 = match x0 {
            Some(x) => x,
            None => {
                spiral = self.problem.spiral_guess();
                &spiral
            }
        };

        let outcome = self.backend.solve(&self.problem, x0, max_iterations);
        let feasible = outcome.converged && self.problem.is_feasible(&outcome.x, FEASIBILITY_TOL);

        let (coords, outer_radius) = PackingProblem::unpack(&outcome.x);
        let positions = coords.chunks_exact(2).map(|c| [c[0], c[1]]).collect();

        AttemptResult {
            positions,
            outer_radius,
            feasible,
        }
    }

    /// Runs a multi-start solve and returns the best feasible layout,
    /// or the infeasible sentinel when every attempt fails.
    pub fn solve_multi(&mut self, config: &SolverConfig) -> BundleLayout {
        self.solve_multi_inner(config, None)
    }

    /// Like [`solve_multi`], reporting `(completed, total)` after each
    /// finished attempt.
    ///
    /// [`solve_multi`]: WireBundleOptimizer::solve_multi
    pub fn solve_multi_with_progress(
        &mut self,
        config: &SolverConfig,
        callback: ProgressCallback,
    ) -> BundleLayout {
        self.solve_multi_inner(config, Some(callback))
    }

    fn solve_multi_inner(
        &mut self,
        config: &SolverConfig,
        callback: Option<ProgressCallback>,
    ) -> BundleLayout {
        let n_starts = config.n_starts.max(1);
        let max_iterations = config.max_iterations.max(1);

        let spiral = self.problem.spiral_guess();
        let seed_radius = spiral[self.problem.dim() - 1];

        let mut guesses = Vec::with_capacity(n_starts);
        guesses.push(spiral);
        let mut rng = thread_rng();
        for _ in 1..n_starts {
            guesses.push(self.problem.random_guess(seed_radius, &mut rng));
        }

        let completed = AtomicUsize::new(0);
        let run = || {
            guesses
                .par_iter()
                .map(|x0| {
                    let attempt = self.solve(Some(x0), max_iterations);
                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    log::debug!(
                        "attempt {}/{}: R = {:.6}, feasible = {}",
                        done,
                        n_starts,
                        attempt.outer_radius,
                        attempt.feasible
                    );
                    if let Some(cb) = &callback {
                        cb(done, n_starts);
                    }
                    attempt
                })
                .collect::<Vec<AttemptResult>>()
        };

        let attempts = if config.threads > 0 {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(config.threads)
                .build()
            {
                Ok(pool) => pool.install(run),
                Err(e) => {
                    log::warn!("failed to build thread pool ({}), using global pool", e);
                    run()
                }
            }
        } else {
            run()
        };

        let layout = self.reduce(attempts);
        self.best = Some(layout.clone());
        layout
    }

    /// Reduces a batch of attempts to the feasible one with the
    /// smallest enclosing radius (first found wins exact ties).
    fn reduce(&self, attempts: Vec<AttemptResult>) -> BundleLayout {
        let total = attempts.len();
        let mut feasible_attempts = 0;
        let mut best: Option<AttemptResult> = None;

        for attempt in attempts {
            if !attempt.feasible {
                continue;
            }
            feasible_attempts += 1;
            let better = match &best {
                None => true,
                Some(b) => attempt.outer_radius < b.outer_radius,
            };
            if better {
                best = Some(attempt);
            }
        }

        match best {
            Some(attempt) => {
                log::debug!(
                    "multi-start: {}/{} attempts feasible, best R = {:.6}",
                    feasible_attempts,
                    total,
                    attempt.outer_radius
                );
                BundleLayout {
                    positions: attempt.positions,
                    radii: self.problem.radii().to_vec(),
                    outer_radius: attempt.outer_radius,
                    attempts: total,
                    feasible_attempts,
                }
            }
            None => {
                log::warn!("multi-start: no feasible layout in {} attempts", total);
                BundleLayout::infeasible(self.problem.radii().to_vec(), total)
            }
        }
    }
}
