//! Solve result representation.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Result of one single-start solve attempt.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AttemptResult {
    /// Wire center positions, input order.
    pub positions: Vec<[f64; 2]>,
    /// Optimized enclosing radius.
    pub outer_radius: f64,
    /// Whether the attempt converged to a feasible layout.
    pub feasible: bool,
}

impl AttemptResult {
    /// Rebuilds the decision vector this attempt ended on.
    pub fn decision_vector(&self) -> Vec<f64> {
        let mut x = Vec::with_capacity(2 * self.positions.len() + 1);
        for p in &self.positions {
            x.push(p[0]);
            x.push(p[1]);
        }
        x.push(self.outer_radius);
        x
    }
}

/// Best layout across a multi-start solve.
///
/// When no attempt was feasible the layout carries no positions and an
/// infinite outer radius; this sentinel is the single failure path of
/// the driver, there is no error variant for it.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BundleLayout {
    /// Wire center positions, input order (empty when infeasible).
    pub positions: Vec<[f64; 2]>,
    /// Margin-free echo of the input radii, for rendering.
    pub radii: Vec<f64>,
    /// Achieved enclosing radius (`f64::INFINITY` when infeasible).
    pub outer_radius: f64,
    /// Number of starts attempted.
    pub attempts: usize,
    /// Number of attempts that converged to a feasible layout.
    pub feasible_attempts: usize,
}

impl BundleLayout {
    /// Creates the sentinel layout for a batch with no feasible attempt.
    pub fn infeasible(radii: Vec<f64>, attempts: usize) -> Self {
        Self {
            positions: Vec::new(),
            radii,
            outer_radius: f64::INFINITY,
            attempts,
            feasible_attempts: 0,
        }
    }

    /// Returns true if at least one attempt produced a feasible layout.
    pub fn is_feasible(&self) -> bool {
        self.outer_radius.is_finite()
    }

    /// Bundle outer diameter (`2R`).
    pub fn diameter(&self) -> f64 {
        2.0 * self.outer_radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infeasible_sentinel() {
        let layout = BundleLayout::infeasible(vec![1.0, 2.0], 8);
        assert!(!layout.is_feasible());
        assert!(layout.positions.is_empty());
        assert!(layout.outer_radius.is_infinite());
        assert!(layout.diameter().is_infinite());
        assert_eq!(layout.attempts, 8);
        assert_eq!(layout.feasible_attempts, 0);
        assert_eq!(layout.radii, vec![1.0, 2.0]);
    }

    #[test]
    fn test_attempt_decision_vector_round_trip() {
        let attempt = AttemptResult {
            positions: vec![[1.0, -2.0], [3.0, 4.0]],
            outer_radius: 6.5,
            feasible: true,
        };
        assert_eq!(attempt.decision_vector(), vec![1.0, -2.0, 3.0, 4.0, 6.5]);
    }
}
