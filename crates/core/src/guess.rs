//! Initial layout generation for the multi-start solve.
//!
//! Two kinds of starting points are produced: a deterministic spiral
//! layout that spaces wires out by decreasing size, and random
//! perturbations of its bounding box repaired to clear the inner
//! exclusion ring. Neither is guaranteed feasible; they only give the
//! constrained solve a start that avoids zero-distance degeneracies
//! and the guaranteed-infeasible core region.

use rand::prelude::*;
use std::f64::consts::TAU;

use crate::problem::PackingProblem;

/// Distance below which a random draw counts as sitting on the origin
/// and gets a fresh random direction instead of a radial projection.
const ORIGIN_EPS: f64 = 1e-12;

impl PackingProblem {
    /// Deterministic spiral starting layout.
    ///
    /// Wires are ordered by decreasing raw radius and placed along an
    /// outward spiral with an angle step of `2π/n`. The running radius
    /// starts at `inner + max(r_eff)` so even the first placement
    /// clears the exclusion ring, and grows by `1.5 · r_eff` before
    /// each placement. The enclosing-radius seed is the final spiral
    /// radius plus the largest effective radius.
    pub fn spiral_guess(&self) -> Vec<f64> {
        let n = self.n();
        let effective = self.effective_radii();
        let max_eff = self.max_effective_radius();

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| {
            self.radii()[b]
                .partial_cmp(&self.radii()[a])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut x = vec![0.0; self.dim()];
        let step = TAU / n as f64;
        let mut angle = 0.0f64;
        let mut radius = self.inner_radius() + max_eff;

        for idx in order {
            radius += 1.5 * effective[idx];
            x[2 * idx] = radius * angle.cos();
            x[2 * idx + 1] = radius * angle.sin();
            angle += step;
        }

        x[self.dim() - 1] = radius + max_eff;
        x
    }

    /// Random starting layout within `[-seed_radius, seed_radius]²`.
    ///
    /// Any wire drawn closer to the origin than its minimum ring
    /// `inner + r_eff` is projected radially outward onto that ring
    /// (with a random direction when the draw landed on the origin),
    /// so no solver iterations are wasted escaping the core region.
    /// The enclosing-radius entry is seeded with `seed_radius`.
    pub fn random_guess<R: Rng>(&self, seed_radius: f64, rng: &mut R) -> Vec<f64> {
        let mut x = vec![0.0; self.dim()];

        for i in 0..self.n() {
            let mut cx = rng.gen_range(-seed_radius..seed_radius);
            let mut cy = rng.gen_range(-seed_radius..seed_radius);

            let min_ring = self.inner_radius() + self.effective_radii()[i];
            let norm = cx.hypot(cy);
            if norm < min_ring {
                if norm < ORIGIN_EPS {
                    let theta = rng.gen_range(0.0..TAU);
                    cx = min_ring * theta.cos();
                    cy = min_ring * theta.sin();
                } else {
                    let scale = min_ring / norm;
                    cx *= scale;
                    cy *= scale;
                }
            }

            x[2 * i] = cx;
            x[2 * i + 1] = cy;
        }

        x[self.dim() - 1] = seed_radius;
        x
    }
}
