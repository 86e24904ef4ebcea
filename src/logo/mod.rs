//! Sequence-logo heights for position-effect results.
//!
//! Logos span the analyzed positions plus the focal (mutated) position, which
//! sits in the middle slot and is never populated.

pub mod draw;

use std::cmp::Ordering;
use std::collections::BTreeSet;

use ndarray::Array2;

use crate::constants::*;
use crate::effect::EffectResult;
use crate::error::{Error, Result};
use crate::loglin::BaseStat;
use crate::motif::Combination;
use crate::seq;

/// Which stats rows feed the logo when results are stratified by group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub group_label: Option<String>,
    pub group_ref: Option<String>,
}

impl Selection {
    pub fn new(group_label: Option<&str>, group_ref: Option<&str>) -> Selection {
        Selection {
            group_label: group_label.map(String::from),
            group_ref: group_ref.map(String::from),
        }
    }

    /// Group value shown, if results are grouped.
    pub fn reference(&self) -> Option<&str> {
        match (&self.group_label, &self.group_ref) {
            (None, _) => None,
            (Some(_), Some(r)) => Some(r.as_str()),
            (Some(label), None) if label == STRAND_COLUMN => Some("+"),
            (Some(_), None) => Some("1"),
        }
    }

    pub fn matches(&self, stat: &BaseStat) -> bool {
        if stat.mut_flag != MUTATED {
            return false;
        }
        match self.reference() {
            None => true,
            Some(r) => stat.group.as_deref() == Some(r),
        }
    }
}

/// Indices of the mutated rows of `stats` selected for display.
pub fn selected_rows(stats: &[BaseStat], selection: &Selection) -> Vec<usize> {
    stats.iter().enumerate()
        .filter(|&(_, s)| selection.matches(s))
        .map(|(i, _)| i)
        .collect()
}

/// Number of logo slots: every position plus the focal one.
#[inline]
pub fn n_slots(n_positions: usize) -> usize {
    n_positions + 1
}

/// Slot of the focal position.
#[inline]
pub fn focal_slot(n_positions: usize) -> usize {
    n_slots(n_positions) / 2
}

/// Map position indices to logo slots, skipping the focal slot.
pub fn adjusted_indices(indices: &[usize], n_positions: usize) -> Vec<usize> {
    let mid = focal_slot(n_positions);
    indices.iter().map(|&i| if i >= mid { i + 1 } else { i }).collect()
}

/// Character heights: each column's relative entropy shared out among its
/// symbols in proportion to the magnitude of their terms.
pub fn char_heights(rets: &Array2<f64>, position_re: &[f64]) -> Array2<f64> {
    let mut heights = Array2::zeros(rets.dim());
    for (j, col) in rets.columns().into_iter().enumerate() {
        let total: f64 = col.iter().map(|r| r.abs()).sum();
        if total <= 0.0 || j >= position_re.len() {
            continue;
        }
        for (i, r) in col.iter().enumerate() {
            heights[[i, j]] = position_re[j] * r.abs() / total;
        }
    }
    heights
}

/// Upper y limit for a set of relative entropies: the maximum rounded up at
/// its second significant digit.
pub fn est_ylim(values: &[f64]) -> f64 {
    let max = values.iter().cloned().filter(|v| v.is_finite()).fold(0.0, f64::max);
    if max <= 0.0 {
        return 1.0e-3;
    }
    let step = 10f64.powf(max.log10().floor() - 1.0);
    let ylim = (max / step).ceil() * step;
    if ylim > max { ylim } else { ylim + step }
}

/// Drawable content of one logo panel.
#[derive(Debug, Clone)]
pub struct LogoPanel {
    /// Populated slots
    pub indices: Vec<usize>,
    /// Symbol labels per slot, bottom to top
    pub characters: Vec<Vec<char>>,
    /// Relative entropy terms, (symbols x slots)
    pub rets: Array2<f64>,
    /// Character heights, (symbols x slots)
    pub heights: Array2<f64>,
}

/// Accumulates logo content across the combinations of one order.
///
/// Characters, per-slot relative entropy and terms are shared by every
/// combination of the order; a combination overwrites only its own slots.
pub struct HeightAssembler {
    order: usize,
    n_positions: usize,
    characters: Vec<Vec<char>>,
    position_re: Vec<f64>,
    rets: Array2<f64>,
    written: BTreeSet<usize>,
}

impl HeightAssembler {
    pub fn new(n_positions: usize, order: usize) -> HeightAssembler {
        let n_rows = seq::n_tuples(order);
        let n = n_slots(n_positions);
        let blank: Vec<char> = if order == 1 { NUCLEOTIDES.iter().map(|&b| b as char).collect() } else { vec![' '; n_rows] };
        HeightAssembler {
            order: order,
            n_positions: n_positions,
            characters: vec![blank; n],
            position_re: vec![0.0; n],
            rets: Array2::zeros((n_rows, n)),
            written: BTreeSet::new(),
        }
    }

    #[inline]
    pub fn position_re(&self) -> &[f64] {
        &self.position_re
    }

    #[inline]
    pub fn characters(&self) -> &[Vec<char>] {
        &self.characters
    }

    /// Add one combination's result; returns its panel.
    pub fn add(&mut self, positions: &[String], combination: &Combination, result: &EffectResult, selection: &Selection) -> Result<LogoPanel> {
        let k = self.order;
        if combination.order() != k || positions.len() != self.n_positions {
            return Err(Error::config(format!(
                "{} does not belong to an order {} logo over {} positions",
                combination, k, self.n_positions)));
        }
        let raw = combination.indices(positions)
            .ok_or_else(|| Error::config(format!("{} is not drawn from {:?}", combination, positions)))?;
        let indices = adjusted_indices(&raw, self.n_positions);

        let mut rows: Vec<&BaseStat> = selected_rows(&result.stats, selection).into_iter()
            .map(|i| &result.stats[i])
            .collect();
        let n_rows = seq::n_tuples(k);
        if rows.len() != n_rows {
            return Err(Error::config(format!(
                "{}: selected {} rows for display, expected {} (group reference {:?})",
                combination, rows.len(), n_rows, selection.reference())));
        }
        if rows.iter().any(|s| s.bases.len() != k) {
            return Err(Error::config(format!("{}: stats rows do not have {} bases", combination, k)));
        }
        rows.sort_by(|a, b| a.ret.partial_cmp(&b.ret).unwrap_or(Ordering::Equal));

        let mut rets = Array2::zeros((n_rows, n_slots(self.n_positions)));
        for (m, &slot) in indices.iter().enumerate() {
            self.position_re[slot] = result.rel_entropy;
            self.characters[slot] = rows.iter().map(|s| s.bases.as_bytes()[m] as char).collect();
            for (r, s) in rows.iter().enumerate() {
                rets[[r, slot]] = s.ret;
                self.rets[[r, slot]] = s.ret;
            }
            self.written.insert(slot);
        }

        let heights = char_heights(&rets, &self.position_re);
        Ok(LogoPanel {
            indices: indices,
            characters: self.characters.clone(),
            rets: rets,
            heights: heights,
        })
    }

    /// Panel holding every slot written so far.
    pub fn overview(&self) -> LogoPanel {
        LogoPanel {
            indices: self.written.iter().cloned().collect(),
            characters: self.characters.clone(),
            rets: self.rets.clone(),
            heights: char_heights(&self.rets, &self.position_re),
        }
    }
}
