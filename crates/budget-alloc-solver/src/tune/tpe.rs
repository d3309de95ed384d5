// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! Tree-structured Parzen estimator over the unit cube.
//!
//! Completed observations are split into a good set (top `gamma` fraction by
//! score) and a bad set. Each set gets a Gaussian kernel density with a uniform
//! prior component; the next point is the candidate drawn from the good density
//! that maximises `l(x) / g(x)`.

use rand::Rng;
use rand_distr::{Distribution, Normal};
use std::f64::consts::PI;

const MIN_BANDWIDTH: f64 = 0.05;
const MAX_BANDWIDTH: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub point: Vec<f64>,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeParzen {
    pub gamma: f64,
    pub candidates: usize,
    pub startup_trials: usize,
}

impl TreeParzen {
    pub fn propose<R: Rng + ?Sized>(
        &self,
        dims: usize,
        history: &[Observation],
        rng: &mut R,
    ) -> Vec<f64> {
        if history.len() < self.startup_trials.max(2) {
            return uniform(dims, rng);
        }

        let mut sorted: Vec<&Observation> = history.iter().collect();
        sorted.sort_by(|a, b| b.score.total_cmp(&a.score));
        let n = sorted.len();
        let n_good = ((self.gamma * n as f64).ceil() as usize).clamp(1, n - 1);
        let (good, bad) = sorted.split_at(n_good);

        let l = Parzen::fit(good, dims);
        let g = Parzen::fit(bad, dims);

        let mut best = uniform(dims, rng);
        let mut best_ratio = f64::NEG_INFINITY;
        for _ in 0..self.candidates.max(1) {
            let x = l.sample(rng);
            let ratio = l.log_density(&x) - g.log_density(&x);
            if ratio > best_ratio {
                best_ratio = ratio;
                best = x;
            }
        }
        best
    }
}

fn uniform<R: Rng + ?Sized>(dims: usize, rng: &mut R) -> Vec<f64> {
    (0..dims).map(|_| rng.random::<f64>()).collect()
}

#[derive(Debug, Clone)]
struct Parzen {
    centers: Vec<Vec<f64>>,
    bandwidth: Vec<f64>,
}

impl Parzen {
    fn fit(observations: &[&Observation], dims: usize) -> Self {
        let centers: Vec<Vec<f64>> = observations.iter().map(|o| o.point.clone()).collect();
        let n = centers.len().max(1) as f64;

        // Scott's rule per dimension.
        let bandwidth = (0..dims)
            .map(|d| {
                let mean = centers.iter().map(|c| c[d]).sum::<f64>() / n;
                let var = centers.iter().map(|c| (c[d] - mean).powi(2)).sum::<f64>() / n;
                (1.06 * var.sqrt() * n.powf(-0.2)).clamp(MIN_BANDWIDTH, MAX_BANDWIDTH)
            })
            .collect();

        Self { centers, bandwidth }
    }

    /// Log density of the kernel mixture blended with the uniform prior (weight `1/(n+1)`).
    fn log_density(&self, x: &[f64]) -> f64 {
        let kernels: f64 = self
            .centers
            .iter()
            .map(|c| {
                c.iter()
                    .zip(x)
                    .zip(&self.bandwidth)
                    .map(|((&mu, &xi), &h)| {
                        let z = (xi - mu) / h;
                        (-0.5 * z * z).exp() / (h * (2.0 * PI).sqrt())
                    })
                    .product::<f64>()
            })
            .sum();
        ((kernels + 1.0) / (self.centers.len() as f64 + 1.0)).ln()
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<f64> {
        let n = self.centers.len();
        let pick = rng.random_range(0..=n);
        if pick == n {
            return uniform(self.bandwidth.len(), rng);
        }
        self.centers[pick]
            .iter()
            .zip(&self.bandwidth)
            .map(|(&mu, &h)| {
                let x = match Normal::new(mu, h) {
                    Ok(dist) => dist.sample(rng),
                    Err(_) => mu,
                };
                x.clamp(0.0, 1.0)
            })
            .collect()
    }
}
