//! Hierarchical log-linear models fitted by iterative proportional fitting.
//!
//! The position effect of a combination is the highest-order interaction
//! between the mutation flag (and group, if any) and the member positions.
//! The null model keeps every lower-order interaction; its deviance measures
//! the information carried by the tested term.

use itertools::Itertools;
use log::{debug, warn};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::motif::counts::CombinedCounts;
use crate::stats;

const MAX_ITERATIONS: usize = 1000;
const TOLERANCE: f64 = 1.0e-10;

/// Statistics of one cell of a fitted position-effect table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaseStat {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(rename = "mut")]
    pub mut_flag: String,
    /// One base per combination member
    pub bases: String,
    pub count: f64,
    pub fitted: f64,
    /// Relative entropy term of the cell
    pub ret: f64,
}

/// Output of a position-effect fit.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionEffect {
    pub rel_entropy: f64,
    pub deviance: f64,
    pub df: usize,
    pub stats: Vec<BaseStat>,
    pub formula: String,
}

/// A model estimating the effect of a combination of positions on mutation.
pub trait PositionEffectModel {
    fn fit(&self, counts: &CombinedCounts) -> Result<PositionEffect>;
}

/// Fitted cell counts with the number of sweeps they took.
#[derive(Debug, Clone)]
pub struct IpfFit {
    pub fitted: Vec<f64>,
    pub iterations: usize,
    pub converged: bool,
}

/// Dense contingency table in row-major order; the last factor varies fastest.
#[derive(Debug, Clone)]
pub struct Contingency {
    dims: Vec<usize>,
    counts: Vec<f64>,
}

impl Contingency {
    pub fn new(dims: Vec<usize>, counts: Vec<f64>) -> Result<Contingency> {
        let n: usize = dims.iter().product();
        if n != counts.len() || n == 0 {
            return Err(Error::config(format!(
                "contingency table of dims {:?} cannot hold {} cells", dims, counts.len())));
        }
        Ok(Contingency { dims: dims, counts: counts })
    }

    #[inline]
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    #[inline]
    pub fn counts(&self) -> &[f64] {
        &self.counts
    }

    pub fn total(&self) -> f64 {
        self.counts.iter().sum()
    }

    /// Coordinates of every cell.
    fn coordinates(&self) -> Vec<Vec<usize>> {
        (0 .. self.counts.len())
            .map(|mut flat| {
                let mut coord = vec![0; self.dims.len()];
                for a in (0 .. self.dims.len()).rev() {
                    coord[a] = flat % self.dims[a];
                    flat /= self.dims[a];
                }
                coord
            })
            .collect()
    }

    /// For each cell, its index into the margin over `axes`.
    fn margin_keys(&self, coords: &[Vec<usize>], axes: &[usize]) -> Vec<usize> {
        coords.iter()
            .map(|c| axes.iter().fold(0, |key, &a| key * self.dims[a] + c[a]))
            .collect()
    }

    fn margin_size(&self, axes: &[usize]) -> usize {
        axes.iter().map(|&a| self.dims[a]).product()
    }

    /// Fit the hierarchical model generated by `margins` with iterative
    /// proportional fitting; returns the fitted cell counts.
    pub fn fit_margins(&self, margins: &[Vec<usize>]) -> Vec<f64> {
        let fit = self.ipf(margins);
        if !fit.converged {
            warn!("IPF did not converge after {} iterations", fit.iterations);
        }
        fit.fitted
    }

    /// Iterative proportional fitting of the margins over each of `margins`.
    ///
    /// A sweep converges once no cell moves by more than `TOLERANCE`
    /// relative to `max(1, |cell|)`.
    pub fn ipf(&self, margins: &[Vec<usize>]) -> IpfFit {
        let coords = self.coordinates();
        let keys: Vec<Vec<usize>> = margins.iter().map(|m| self.margin_keys(&coords, m)).collect();
        let observed: Vec<Vec<f64>> = margins.iter().zip(keys.iter())
            .map(|(m, k)| sum_by_key(&self.counts, k, self.margin_size(m)))
            .collect();

        let mut fitted = vec![1.0; self.counts.len()];
        for iteration in 0 .. MAX_ITERATIONS {
            let previous = fitted.clone();
            for (j, m) in margins.iter().enumerate() {
                let current = sum_by_key(&fitted, &keys[j], self.margin_size(m));
                for (i, f) in fitted.iter_mut().enumerate() {
                    let k = keys[j][i];
                    *f = if current[k] > 0.0 { *f * observed[j][k] / current[k] } else { 0.0 };
                }
            }

            let delta = fitted.iter().zip(previous.iter())
                .map(|(a, b)| (a - b).abs() / b.abs().max(1.0))
                .fold(0.0, f64::max);
            if delta < TOLERANCE {
                debug!("IPF converged after {} iterations", iteration + 1);
                return IpfFit { fitted: fitted, iterations: iteration + 1, converged: true };
            }
        }

        IpfFit { fitted: fitted, iterations: MAX_ITERATIONS, converged: false }
    }

    /// Fit the model holding every interaction except the one among all factors.
    pub fn fit_without_highest_interaction(&self) -> Vec<f64> {
        let m = self.dims.len();
        let margins: Vec<Vec<usize>> = if m == 1 {
            vec![Vec::new()]
        } else {
            (0 .. m).combinations(m - 1).collect()
        };
        self.fit_margins(&margins)
    }
}

fn sum_by_key(values: &[f64], keys: &[usize], size: usize) -> Vec<f64> {
    let mut sums = vec![0.0; size];
    for (v, &k) in values.iter().zip(keys.iter()) {
        sums[k] += v;
    }
    sums
}

/// Relative entropy terms (o / n) * log2(o / e) of a fitted table.
pub fn relative_entropy_terms(observed: &[f64], fitted: &[f64]) -> Vec<f64> {
    let n: f64 = observed.iter().sum();
    observed.iter().zip(fitted.iter())
        .map(|(&o, &e)| if o > 0.0 && n > 0.0 { (o / n) * (o / e).log2() } else { 0.0 })
        .collect()
}

/// Model formula in the usual `response ~ terms` notation.
pub fn formula(factors: &[String]) -> String {
    let full = factors.join("*");
    let highest = factors.join(":");
    if factors.len() > 1 {
        format!("count ~ {} - {}", full, highest)
    } else {
        "count ~ 1".to_owned()
    }
}

/// Position-effect model testing the highest-order interaction with
/// iterative proportional fitting.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogLinearModel;

impl PositionEffectModel for LogLinearModel {
    fn fit(&self, counts: &CombinedCounts) -> Result<PositionEffect> {
        let dims = counts.dims();
        let table = Contingency::new(dims.clone(), counts.counts())?;
        let fitted = table.fit_without_highest_interaction();

        let deviance = stats::g_statistic(table.counts(), &fitted);
        let df = dims.iter().map(|&d| d - 1).product();
        let ret = relative_entropy_terms(table.counts(), &fitted);
        let rel_entropy = ret.iter().sum();

        let stats = counts.cells.iter().zip(fitted.iter()).zip(ret.iter())
            .map(|((cell, &e), &r)| BaseStat {
                group: cell.group.clone(),
                mut_flag: cell.mut_flag.clone(),
                bases: cell.bases.clone(),
                count: cell.count as f64,
                fitted: e,
                ret: r,
            })
            .collect();

        Ok(PositionEffect {
            rel_entropy: rel_entropy,
            deviance: deviance,
            df: df,
            stats: stats,
            formula: formula(&counts.factors()),
        })
    }
}
