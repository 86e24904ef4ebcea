//! Compact grid placement of position combinations for trellis figures.
//!
//! A naive layout indexes panels by member positions, leaving most of a
//! P x P (or P x P x P) grid empty. The layouts here keep only occupied rows
//! and columns so each combination gets exactly one panel of a dense grid.

use std::collections::BTreeSet;

use linked_hash_map::LinkedHashMap;

use crate::error::{Error, Result};
use crate::motif::Combination;

/// Zero-based (row, column) of a panel.
pub type GridCoord = (usize, usize);

#[derive(Debug, Clone)]
pub struct TrellisLayout {
    nrows: usize,
    ncols: usize,
    coords: LinkedHashMap<Combination, GridCoord>,
}

impl TrellisLayout {
    #[inline]
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    #[inline]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    pub fn coord(&self, combination: &Combination) -> Option<GridCoord> {
        self.coords.get(combination).cloned()
    }

    pub fn iter(&self) -> linked_hash_map::Iter<Combination, GridCoord> {
        self.coords.iter()
    }

    /// Layout for combinations of any supported order.
    pub fn for_order(order: usize, positions: &[String], combinations: &[Combination]) -> Result<TrellisLayout> {
        match order {
            1 => single_panel_layout(combinations),
            2 => pair_layout(positions, combinations),
            3 => triple_layout(combinations),
            4 => quadruple_layout(combinations),
            _ => Err(Error::UnsupportedLayout(format!("no layout for order {}", order))),
        }
    }
}

fn member_indices(positions: &[String], combination: &Combination) -> Result<Vec<usize>> {
    combination.indices(positions)
        .ok_or_else(|| Error::config(format!("{} is not drawn from {:?}", combination, positions)))
}

/// Rank of each occupied index, e.g. {1, 3, 4} -> 1:0, 3:1, 4:2.
fn dense_rank(occupied: &BTreeSet<usize>, index: usize) -> usize {
    occupied.range(.. index).count()
}

/// Pairs are indexed by (second member, first member) so they fill the lower
/// triangle; empty rows then empty columns are dropped.
pub fn pair_layout(positions: &[String], combinations: &[Combination]) -> Result<TrellisLayout> {
    let mut cells = Vec::with_capacity(combinations.len());
    for c in combinations {
        let mut idx = member_indices(positions, c)?;
        if idx.len() != 2 {
            return Err(Error::UnsupportedLayout(format!("{} is not a pair", c)));
        }
        idx.reverse();
        cells.push((c, idx[0], idx[1]));
    }

    // dropping empty rows cannot empty a column, so occupancy of both axes
    // can be taken from the full grid
    let rows: BTreeSet<usize> = cells.iter().map(|&(_, r, _)| r).collect();
    let cols: BTreeSet<usize> = cells.iter().map(|&(_, _, c)| c).collect();

    let mut coords = LinkedHashMap::new();
    for (c, r, col) in cells {
        let coord = (dense_rank(&rows, r), dense_rank(&cols, col));
        if coords.values().any(|&x| x == coord) {
            return Err(Error::UnsupportedLayout(format!("{} shares a panel with another pair", c)));
        }
        coords.insert(c.clone(), coord);
    }

    Ok(TrellisLayout { nrows: rows.len(), ncols: cols.len(), coords: coords })
}

/// Triples are sorted and placed row-major in a 2 x 2 grid; only the four
/// triples drawn from four positions fit.
pub fn triple_layout(combinations: &[Combination]) -> Result<TrellisLayout> {
    if combinations.len() != 4 {
        return Err(Error::UnsupportedLayout(format!(
            "triple layout needs exactly 4 combinations, got {}", combinations.len())));
    }
    if let Some(c) = combinations.iter().find(|c| c.order() != 3) {
        return Err(Error::UnsupportedLayout(format!("{} is not a triple", c)));
    }

    let mut sorted: Vec<&Combination> = combinations.iter().collect();
    sorted.sort();
    sorted.dedup();
    if sorted.len() != 4 {
        return Err(Error::UnsupportedLayout("triple layout needs distinct combinations".to_owned()));
    }

    let coords = sorted.into_iter().enumerate()
        .map(|(i, c)| (c.clone(), (i / 2, i % 2)))
        .collect();

    Ok(TrellisLayout { nrows: 2, ncols: 2, coords: coords })
}

/// The single combination of all four positions fills the figure.
pub fn quadruple_layout(combinations: &[Combination]) -> Result<TrellisLayout> {
    if combinations.len() != 1 {
        return Err(Error::UnsupportedLayout(format!(
            "quadruple layout needs exactly 1 combination, got {}", combinations.len())));
    }
    let mut coords = LinkedHashMap::new();
    coords.insert(combinations[0].clone(), (0, 0));
    Ok(TrellisLayout { nrows: 1, ncols: 1, coords: coords })
}

/// All single positions share one panel.
fn single_panel_layout(combinations: &[Combination]) -> Result<TrellisLayout> {
    let coords = combinations.iter().map(|c| (c.clone(), (0, 0))).collect();
    Ok(TrellisLayout { nrows: 1, ncols: 1, coords: coords })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motif::combinations;

    fn positions(n: usize) -> Vec<String> {
        (0 .. n).map(|i| format!("pos{}", i)).collect()
    }

    #[test]
    fn test_pair_layout_is_dense_lower_triangle() {
        let pos = positions(4);
        let combos = combinations(&pos, 2);
        let layout = pair_layout(&pos, &combos).unwrap();

        assert_eq!((layout.nrows(), layout.ncols()), (3, 3));
        let expected = [((0, 0), "pos0:pos1"), ((1, 0), "pos0:pos2"), ((2, 0), "pos0:pos3"),
                        ((1, 1), "pos1:pos2"), ((2, 1), "pos1:pos3"), ((2, 2), "pos2:pos3")];
        for &(coord, label) in expected.iter() {
            let c = combos.iter().find(|c| c.label() == label).unwrap();
            assert_eq!(layout.coord(c), Some(coord));
        }
    }

    #[test]
    fn test_pair_layout_has_no_blank_row_or_column() {
        for n in 2 .. 7 {
            let pos = positions(n);
            let combos = combinations(&pos, 2);
            let layout = pair_layout(&pos, &combos).unwrap();
            assert_eq!(layout.len(), combos.len());

            let coords: BTreeSet<GridCoord> = layout.iter().map(|(_, &c)| c).collect();
            // bijection onto the occupied set
            assert_eq!(coords.len(), combos.len());
            for r in 0 .. layout.nrows() {
                assert!(coords.iter().any(|&(i, _)| i == r));
            }
            for c in 0 .. layout.ncols() {
                assert!(coords.iter().any(|&(_, j)| j == c));
            }
        }
    }

    #[test]
    fn test_pair_layout_of_subset() {
        let pos = positions(4);
        let combos = vec![Combination::new(&["pos0", "pos3"]), Combination::new(&["pos1", "pos3"])];
        let layout = pair_layout(&pos, &combos).unwrap();
        assert_eq!((layout.nrows(), layout.ncols()), (1, 2));
        assert_eq!(layout.coord(&combos[0]), Some((0, 0)));
        assert_eq!(layout.coord(&combos[1]), Some((0, 1)));
    }

    #[test]
    fn test_triple_layout() {
        let pos = positions(4);
        let combos = combinations(&pos, 3);
        let layout = triple_layout(&combos).unwrap();
        assert_eq!((layout.nrows(), layout.ncols()), (2, 2));
        assert_eq!(layout.coord(&combos[0]), Some((0, 0)));
        assert_eq!(layout.coord(&combos[1]), Some((0, 1)));
        assert_eq!(layout.coord(&combos[2]), Some((1, 0)));
        assert_eq!(layout.coord(&combos[3]), Some((1, 1)));

        // placement follows combination identity, not input order
        let reversed: Vec<Combination> = combos.iter().rev().cloned().collect();
        let layout = triple_layout(&reversed).unwrap();
        assert_eq!(layout.coord(&combos[0]), Some((0, 0)));
    }

    #[test]
    fn test_triple_layout_rejects_other_counts() {
        let pos = positions(5);
        let combos = combinations(&pos, 3);
        match triple_layout(&combos) {
            Err(Error::UnsupportedLayout(_)) => {},
            other => panic!("expected unsupported layout, got {:?}", other),
        }
    }

    #[test]
    fn test_quadruple_layout() {
        let pos = positions(4);
        let combos = combinations(&pos, 4);
        let layout = TrellisLayout::for_order(4, &pos, &combos).unwrap();
        assert_eq!(layout.coord(&combos[0]), Some((0, 0)));
        assert!(quadruple_layout(&combinations(&positions(5), 4)).is_err());
    }
}
