//! Constrained problem formulation for circle packing.
//!
//! A bundle of `n` wires is packed by minimizing the radius `R` of an
//! origin-centered enclosing circle over the decision vector
//! `x = [c0_x, c0_y, ..., c(n-1)_x, c(n-1)_y, R]` of length `2n + 1`,
//! subject to smooth inequality constraints (feasible when `>= 0`):
//!
//! - containment: `R - (‖c_i‖ + r_eff_i) >= 0` for every wire,
//! - separation: `‖c_i - c_j‖ - (r_eff_i + r_eff_j) >= 0` for every
//!   unordered pair `i < j`,
//! - exclusion: `‖c_i‖ - (inner + r_eff_i) >= 0` for every wire, only
//!   when an inner exclusion radius is set.
//!
//! The objective is linear in this parameterization, so all gradients
//! and constraint Jacobian rows are analytic and exact. Evaluation is
//! read-only: the per-instance data (radii, effective radii, pair
//! index list, exclusion radius) is immutable after construction and
//! can be shared across parallel solve attempts without locking.

use crate::error::{Error, Result};

/// Tolerance used to accept a solved layout as feasible.
///
/// The same value must be used when re-checking a returned layout
/// against [`PackingProblem::is_feasible`], so that solver output and
/// independent constraint evaluation agree.
pub const FEASIBILITY_TOL: f64 = 1e-6;

/// Immutable formulation of one bundle's packing problem.
///
/// Holds the per-instance precomputed data and evaluates the
/// objective, constraints, and their gradients as pure functions of a
/// decision vector. Construction validates the input; evaluation never
/// fails.
#[derive(Debug, Clone)]
pub struct PackingProblem {
    /// Raw wire radii, caller order.
    radii: Vec<f64>,
    /// Margin-inflated radii: `radius * (1 + margin)`.
    effective: Vec<f64>,
    /// Unordered pair indices, lexicographic over `i < j`.
    pairs: Vec<(usize, usize)>,
    /// Forbidden central disk radius (0 = disabled).
    inner_radius: f64,
    /// Margin fraction the effective radii were derived with.
    margin: f64,
}

impl PackingProblem {
    /// Creates a problem from raw radii, a margin fraction, and an
    /// inner exclusion radius.
    ///
    /// # Errors
    ///
    /// Returns an error when the radii list is empty, any radius is
    /// non-positive or non-finite, or the margin / exclusion radius is
    /// negative or non-finite.
    pub fn new(radii: &[f64], margin: f64, inner_radius: f64) -> Result<Self> {
        if radii.is_empty() {
            return Err(Error::EmptyBundle);
        }
        for (index, &value) in radii.iter().enumerate() {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::InvalidRadius { index, value });
            }
        }
        if !margin.is_finite() || margin < 0.0 {
            return Err(Error::InvalidMargin(margin));
        }
        if !inner_radius.is_finite() || inner_radius < 0.0 {
            return Err(Error::InvalidInnerRadius(inner_radius));
        }

        let n = radii.len();
        let effective: Vec<f64> = radii.iter().map(|r| r * (1.0 + margin)).collect();

        let mut pairs = Vec::with_capacity(n * (n - 1) / 2);
        for i in 0..n {
            for j in (i + 1)..n {
                pairs.push((i, j));
            }
        }

        Ok(Self {
            radii: radii.to_vec(),
            effective,
            pairs,
            inner_radius,
            margin,
        })
    }

    /// Number of wires.
    pub fn n(&self) -> usize {
        self.radii.len()
    }

    /// Length of the decision vector (`2n + 1`).
    pub fn dim(&self) -> usize {
        2 * self.n() + 1
    }

    /// Raw (margin-free) wire radii in caller order.
    pub fn radii(&self) -> &[f64] {
        &self.radii
    }

    /// Margin-inflated radii in caller order.
    pub fn effective_radii(&self) -> &[f64] {
        &self.effective
    }

    /// Unordered pair index list, lexicographic over `i < j`.
    pub fn pairs(&self) -> &[(usize, usize)] {
        &self.pairs
    }

    /// Number of pairwise separation constraints.
    pub fn pair_count(&self) -> usize {
        self.pairs.len()
    }

    /// Inner exclusion radius (0 when disabled).
    pub fn inner_radius(&self) -> f64 {
        self.inner_radius
    }

    /// Margin fraction.
    pub fn margin(&self) -> f64 {
        self.margin
    }

    /// Whether the exclusion constraint family is active.
    pub fn has_inner_exclusion(&self) -> bool {
        self.inner_radius > 0.0
    }

    /// Total number of inequality constraints.
    pub fn constraint_count(&self) -> usize {
        let inner = if self.has_inner_exclusion() {
            self.n()
        } else {
            0
        };
        self.n() + self.pair_count() + inner
    }

    /// Largest effective radius in the bundle.
    pub fn max_effective_radius(&self) -> f64 {
        self.effective.iter().copied().fold(0.0, f64::max)
    }

    /// Splits a decision vector into flattened coordinates and the
    /// enclosing radius. Wire `i`'s center is `(coords[2i], coords[2i+1])`.
    pub fn unpack(x: &[f64]) -> (&[f64], f64) {
        let (coords, tail) = x.split_at(x.len() - 1);
        (coords, tail[0])
    }

    /// Objective value: the enclosing radius.
    pub fn objective(x: &[f64]) -> f64 {
        x[x.len() - 1]
    }

    /// Exact objective gradient: zero everywhere except a unit entry
    /// in the enclosing-radius slot.
    pub fn objective_gradient(x: &[f64], grad: &mut [f64]) {
        grad.fill(0.0);
        grad[x.len() - 1] = 1.0;
    }

    /// Containment constraint for wire `i`:
    /// `R - (‖c_i‖ + r_eff_i)`, feasible when `>= 0`.
    ///
    /// When `grad` is provided it is overwritten with the full-length
    /// gradient. At a degenerate point (`‖c_i‖ = 0`) the coordinate
    /// entries of the gradient are left at zero; the radius entry is
    /// always 1.
    pub fn outer_constraint(&self, i: usize, x: &[f64], grad: Option<&mut [f64]>) -> f64 {
        let (coords, r) = Self::unpack(x);
        let (cx, cy) = (coords[2 * i], coords[2 * i + 1]);
        let norm = cx.hypot(cy);

        if let Some(g) = grad {
            g.fill(0.0);
            if norm > 0.0 {
                g[2 * i] = -cx / norm;
                g[2 * i + 1] = -cy / norm;
            }
            g[x.len() - 1] = 1.0;
        }

        r - (norm + self.effective[i])
    }

    /// Separation constraint for pair `k` (as ordered by [`pairs`]):
    /// `‖c_i - c_j‖ - (r_eff_i + r_eff_j)`, feasible when `>= 0`.
    ///
    /// Coincident centers yield a zero gradient row.
    ///
    /// [`pairs`]: PackingProblem::pairs
    pub fn pair_constraint(&self, k: usize, x: &[f64], grad: Option<&mut [f64]>) -> f64 {
        let (coords, _) = Self::unpack(x);
        let (i, j) = self.pairs[k];
        let dx = coords[2 * i] - coords[2 * j];
        let dy = coords[2 * i + 1] - coords[2 * j + 1];
        let norm = dx.hypot(dy);

        if let Some(g) = grad {
            g.fill(0.0);
            if norm > 0.0 {
                g[2 * i] = dx / norm;
                g[2 * i + 1] = dy / norm;
                g[2 * j] = -dx / norm;
                g[2 * j + 1] = -dy / norm;
            }
        }

        norm - (self.effective[i] + self.effective[j])
    }

    /// Exclusion constraint for wire `i`:
    /// `‖c_i‖ - (inner + r_eff_i)`, feasible when `>= 0`.
    ///
    /// Only meaningful when [`has_inner_exclusion`] is true; the driver
    /// omits this family entirely otherwise, so a zero exclusion radius
    /// leaves the feasible region untouched.
    ///
    /// [`has_inner_exclusion`]: PackingProblem::has_inner_exclusion
    pub fn inner_constraint(&self, i: usize, x: &[f64], grad: Option<&mut [f64]>) -> f64 {
        let (coords, _) = Self::unpack(x);
        let (cx, cy) = (coords[2 * i], coords[2 * i + 1]);
        let norm = cx.hypot(cy);

        if let Some(g) = grad {
            g.fill(0.0);
            if norm > 0.0 {
                g[2 * i] = cx / norm;
                g[2 * i + 1] = cy / norm;
            }
        }

        norm - (self.inner_radius + self.effective[i])
    }

    /// Largest constraint violation at `x` (0 when fully feasible).
    pub fn worst_violation(&self, x: &[f64]) -> f64 {
        let mut worst = 0.0f64;
        for i in 0..self.n() {
            worst = worst.max(-self.outer_constraint(i, x, None));
        }
        for k in 0..self.pair_count() {
            worst = worst.max(-self.pair_constraint(k, x, None));
        }
        if self.has_inner_exclusion() {
            for i in 0..self.n() {
                worst = worst.max(-self.inner_constraint(i, x, None));
            }
        }
        worst
    }

    /// Whether `x` satisfies every active constraint within `tol`.
    pub fn is_feasible(&self, x: &[f64], tol: f64) -> bool {
        self.worst_violation(x) <= tol
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn problem() -> PackingProblem {
        PackingProblem::new(&[1.0, 0.5, 0.75], 0.1, 0.25).unwrap()
    }

    #[test]
    fn test_validation() {
        assert!(matches!(
            PackingProblem::new(&[], 0.0, 0.0),
            Err(Error::EmptyBundle)
        ));
        assert!(matches!(
            PackingProblem::new(&[1.0, -2.0], 0.0, 0.0),
            Err(Error::InvalidRadius { index: 1, .. })
        ));
        assert!(matches!(
            PackingProblem::new(&[1.0, 0.0], 0.0, 0.0),
            Err(Error::InvalidRadius { index: 1, .. })
        ));
        assert!(matches!(
            PackingProblem::new(&[1.0], -0.1, 0.0),
            Err(Error::InvalidMargin(_))
        ));
        assert!(matches!(
            PackingProblem::new(&[1.0], 0.0, -1.0),
            Err(Error::InvalidInnerRadius(_))
        ));
        assert!(matches!(
            PackingProblem::new(&[1.0, f64::NAN], 0.0, 0.0),
            Err(Error::InvalidRadius { index: 1, .. })
        ));
    }

    #[test]
    fn test_effective_radii_scaled_once() {
        let p = problem();
        assert!((p.effective_radii()[0] - 1.1).abs() < 1e-12);
        assert!((p.effective_radii()[1] - 0.55).abs() < 1e-12);
        assert!((p.effective_radii()[2] - 0.825).abs() < 1e-12);
    }

    #[test]
    fn test_pairs_lexicographic() {
        let p = problem();
        assert_eq!(p.pairs(), &[(0, 1), (0, 2), (1, 2)]);
        assert_eq!(p.constraint_count(), 3 + 3 + 3);

        let no_inner = PackingProblem::new(&[1.0, 1.0], 0.0, 0.0).unwrap();
        assert!(!no_inner.has_inner_exclusion());
        assert_eq!(no_inner.constraint_count(), 2 + 1);
    }

    #[test]
    fn test_unpack_and_objective() {
        let x = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 9.0];
        let (coords, r) = PackingProblem::unpack(&x);
        assert_eq!(coords, &x[..6]);
        assert_eq!(r, 9.0);
        assert_eq!(PackingProblem::objective(&x), 9.0);

        let mut g = vec![f64::NAN; 7];
        PackingProblem::objective_gradient(&x, &mut g);
        assert_eq!(&g[..6], &[0.0; 6]);
        assert_eq!(g[6], 1.0);
    }

    #[test]
    fn test_constraint_values() {
        let p = PackingProblem::new(&[1.0, 1.0], 0.0, 0.0).unwrap();
        // Two unit wires at (-1, 0) and (1, 0) inside R = 2: tight.
        let x = vec![-1.0, 0.0, 1.0, 0.0, 2.0];
        assert!(p.outer_constraint(0, &x, None).abs() < 1e-12);
        assert!(p.outer_constraint(1, &x, None).abs() < 1e-12);
        assert!(p.pair_constraint(0, &x, None).abs() < 1e-12);
        assert!(p.is_feasible(&x, 1e-9));

        // Shrinking R violates containment.
        let x = vec![-1.0, 0.0, 1.0, 0.0, 1.9];
        assert!(!p.is_feasible(&x, 1e-9));
        assert!((p.worst_violation(&x) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_inner_constraint_value() {
        let p = PackingProblem::new(&[1.0], 0.0, 5.0).unwrap();
        let x = vec![6.0, 0.0, 7.0];
        assert!(p.inner_constraint(0, &x, None).abs() < 1e-12);
        assert!(p.is_feasible(&x, 1e-9));

        let x = vec![5.5, 0.0, 7.0];
        assert!(!p.is_feasible(&x, 1e-9));
    }

    /// Central finite differences against every analytic gradient row.
    #[test]
    fn test_jacobians_match_finite_differences() {
        let p = problem();
        let x = vec![0.9, -1.3, 2.1, 0.4, -0.7, 1.8, 4.2];
        let h = 1e-6;

        let families: Vec<Box<dyn Fn(&[f64], Option<&mut [f64]>) -> f64>> = {
            let mut fams: Vec<Box<dyn Fn(&[f64], Option<&mut [f64]>) -> f64>> = Vec::new();
            for i in 0..p.n() {
                let p = p.clone();
                fams.push(Box::new(move |x, g| p.outer_constraint(i, x, g)));
            }
            for k in 0..p.pair_count() {
                let p = p.clone();
                fams.push(Box::new(move |x, g| p.pair_constraint(k, x, g)));
            }
            for i in 0..p.n() {
                let p = p.clone();
                fams.push(Box::new(move |x, g| p.inner_constraint(i, x, g)));
            }
            fams
        };

        for f in &families {
            let mut analytic = vec![0.0; x.len()];
            f(&x, Some(&mut analytic));
            for d in 0..x.len() {
                let mut xp = x.clone();
                let mut xm = x.clone();
                xp[d] += h;
                xm[d] -= h;
                let numeric = (f(&xp, None) - f(&xm, None)) / (2.0 * h);
                assert!(
                    (analytic[d] - numeric).abs() < 1e-5,
                    "gradient mismatch at dim {}: analytic {} vs numeric {}",
                    d,
                    analytic[d],
                    numeric
                );
            }
        }
    }

    #[test]
    fn test_degenerate_points_yield_zero_gradient_rows() {
        let p = PackingProblem::new(&[1.0, 1.0], 0.0, 1.0).unwrap();
        // Both centers at the origin: every norm is zero.
        let x = vec![0.0, 0.0, 0.0, 0.0, 3.0];
        let mut g = vec![f64::NAN; 5];

        p.pair_constraint(0, &x, Some(&mut g));
        assert_eq!(g, vec![0.0; 5]);

        p.outer_constraint(0, &x, Some(&mut g));
        assert_eq!(&g[..4], &[0.0; 4]);
        assert_eq!(g[4], 1.0);

        p.inner_constraint(0, &x, Some(&mut g));
        assert_eq!(g, vec![0.0; 5]);
    }
}
