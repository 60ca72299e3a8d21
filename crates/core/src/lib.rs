//! # Wire Bundle Core
//!
//! Constrained circle-packing optimizer for wire bundle cross-sections.
//!
//! Given a multiset of wire radii, this crate finds non-overlapping
//! 2D placements that minimize the radius of a single enclosing
//! circle. Each wire may be inflated by a manufacturing margin, and an
//! annular exclusion zone around the origin (a frozen inner layer of a
//! shielded bundle) can be kept clear.
//!
//! ## Core Components
//!
//! - **Problem formulation**: [`PackingProblem`] - objective,
//!   constraints, and exact analytic Jacobians over the `2n + 1`
//!   decision vector (centers + radius)
//! - **Initial guesses**: a deterministic spiral layout plus
//!   randomized, exclusion-aware perturbations of it
//! - **Multi-start driver**: [`WireBundleOptimizer`] - fans
//!   independent SLSQP solves out over rayon and keeps the best
//!   feasible layout
//! - **Solver seam**: [`NlpBackend`] - isolates the nonlinear solver
//!   so the algorithm is swappable without touching formulation or
//!   driver
//!
//! ## Quick Start
//!
//! ```rust
//! use wire_bundle_core::{SolverConfig, WireBundleOptimizer};
//!
//! // Two unit wires, no margin, no exclusion zone.
//! let mut optimizer = WireBundleOptimizer::new(&[1.0, 1.0], 0.0, 0.0).unwrap();
//!
//! let config = SolverConfig::new().with_starts(4).with_max_iterations(500);
//! let layout = optimizer.solve_multi(&config);
//!
//! assert!(layout.is_feasible());
//! assert!((layout.outer_radius - 2.0).abs() < 1e-3);
//! ```
//!
//! An infeasible batch is reported through a sentinel layout
//! (`outer_radius == f64::INFINITY`), never through an error or a
//! panic; construction is the only fallible operation.
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization support for
//!   configuration and result types

pub mod error;
mod guess;
pub mod nlp;
pub mod problem;
pub mod result;
pub mod solver;

// Re-exports
pub use error::{Error, Result};
pub use nlp::{NlpBackend, NlpOutcome, SlsqpBackend};
pub use problem::{PackingProblem, FEASIBILITY_TOL};
pub use result::{AttemptResult, BundleLayout};
pub use solver::{ProgressCallback, SolverConfig, WireBundleOptimizer};
