//! Counts of base tuples at a combination of positions.

use multimap::MultiMap;

use crate::constants::*;
use crate::error::{Error, Result};
use crate::io::counts::{CountRecord, CountsTable};
use crate::motif::Combination;
use crate::seq;

/// Count of one (group, mutation flag, base tuple) cell.
#[derive(Debug, Clone, PartialEq)]
pub struct CountCell {
    pub group: Option<String>,
    pub mut_flag: String,
    /// One base per member of the combination
    pub bases: String,
    pub count: u64,
}

/// Fully enumerated counts for one combination.
///
/// Cells are ordered by group, then mutation flag, then base tuple, with the
/// last member's base varying fastest; every possible tuple is present.
#[derive(Debug, Clone)]
pub struct CombinedCounts {
    pub combination: Combination,
    pub group_label: Option<String>,
    pub group_levels: Vec<String>,
    pub mut_levels: Vec<String>,
    pub cells: Vec<CountCell>,
}

impl CombinedCounts {
    /// Level counts of each factor: `[group], mut, members...`.
    pub fn dims(&self) -> Vec<usize> {
        let mut dims = Vec::new();
        if self.group_label.is_some() {
            dims.push(self.group_levels.len());
        }
        dims.push(self.mut_levels.len());
        dims.extend(std::iter::repeat(N_NUCLEOTIDES).take(self.combination.order()));
        dims
    }

    /// Factor names matching `dims`.
    pub fn factors(&self) -> Vec<String> {
        let mut factors = Vec::new();
        if let Some(ref label) = self.group_label {
            factors.push(label.clone());
        }
        factors.push(MUT_COLUMN.to_owned());
        factors.extend(self.combination.iter().cloned());
        factors
    }

    pub fn counts(&self) -> Vec<f64> {
        self.cells.iter().map(|c| c.count as f64).collect()
    }

    pub fn total(&self) -> u64 {
        self.cells.iter().map(|c| c.count).sum()
    }
}

/// Mutation flags of a table: exactly two, one of them the mutated flag.
pub fn mut_levels(table: &CountsTable) -> Result<Vec<String>> {
    let flags = table.mut_flags();
    if flags.len() != 2 || !flags.iter().any(|f| f == MUTATED) {
        return Err(Error::config(format!(
            "'{}' column must hold '{}' and one control flag, found {:?}",
            MUT_COLUMN, MUTATED, flags)));
    }
    Ok(flags)
}

fn tally<'a, I>(records: I, indices: &[usize], mut_levels: &[String]) -> Vec<u64>
    where I: Iterator<Item = &'a CountRecord>
{
    let n_tuples = seq::n_tuples(indices.len());
    let mut counts = vec![0u64; mut_levels.len() * n_tuples];
    for r in records {
        let bases: Vec<u8> = indices.iter().map(|&i| r.bases[i]).collect();
        let m = mut_levels.iter().position(|f| *f == r.mut_flag);
        if let (Some(m), Some(t)) = (m, seq::tuple_index(&bases)) {
            counts[m * n_tuples + t] += r.count;
        }
    }
    counts
}

fn push_cells(cells: &mut Vec<CountCell>, group: Option<&str>, counts: &[u64], k: usize, mut_levels: &[String]) {
    let n_tuples = seq::n_tuples(k);
    for (m, flag) in mut_levels.iter().enumerate() {
        for t in 0 .. n_tuples {
            cells.push(CountCell {
                group: group.map(String::from),
                mut_flag: flag.clone(),
                bases: seq::base_tuple(t, k),
                count: counts[m * n_tuples + t],
            });
        }
    }
}

/// Combined counts for `combination`, optionally stratified by the extra
/// column `group_label`, which must hold exactly two distinct values.
pub fn combined_counts(table: &CountsTable, combination: &Combination, group_label: Option<&str>) -> Result<CombinedCounts> {
    let indices = combination.indices(table.positions())
        .ok_or_else(|| Error::config(format!("count table lacks positions of {}", combination)))?;
    let k = indices.len();
    let mut_levels = mut_levels(table)?;

    let mut cells = Vec::with_capacity(2 * mut_levels.len() * seq::n_tuples(k));
    let mut group_levels = Vec::new();

    match group_label {
        None => {
            let counts = tally(table.records().iter(), &indices, &mut_levels);
            push_cells(&mut cells, None, &counts, k, &mut_levels);
        },
        Some(label) => {
            let j = table.extra_index(label)?;
            let mut by_group: MultiMap<&str, &CountRecord> = MultiMap::new();
            for r in table.records() {
                by_group.insert(r.extra[j].as_str(), r);
            }
            let mut levels: Vec<&str> = by_group.keys().cloned().collect();
            levels.sort();
            if levels.len() != 2 {
                return Err(Error::config(format!(
                    "group column '{}' must have exactly two values, found {:?}", label, levels)));
            }

            for level in levels {
                let records = by_group.get_vec(level).map(|v| v.as_slice()).unwrap_or(&[]);
                let counts = tally(records.iter().cloned(), &indices, &mut_levels);
                push_cells(&mut cells, Some(level), &counts, k, &mut_levels);
                group_levels.push(level.to_owned());
            }
        },
    }

    Ok(CombinedCounts {
        combination: combination.clone(),
        group_label: group_label.map(String::from),
        group_levels: group_levels,
        mut_levels: mut_levels,
        cells: cells,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::counts::Reader;

    const COUNTS_FILE: &'static [u8] = b"count\tpos0\tpos1\tpos2\tpos3\tstrand\tmut
3\tA\tC\tG\tT\t+\tM
2\tC\tC\tA\tA\t-\tM
4\tA\tC\tG\tT\t+\tR
1\tT\tG\tA\tA\t-\tR
5\tA\tA\tA\tA\t+\tR
";

    fn table() -> CountsTable {
        Reader::new(COUNTS_FILE).read_table().unwrap()
    }

    #[test]
    fn test_single_position_counts() {
        let t = table();
        let cc = combined_counts(&t, &Combination::new(&["pos0"]), None).unwrap();
        assert_eq!(cc.cells.len(), 8);
        assert_eq!(cc.dims(), vec![2, 4]);
        assert_eq!(cc.mut_levels, vec!["M", "R"]);

        let counts: Vec<u64> = cc.cells.iter().map(|c| c.count).collect();
        assert_eq!(counts, vec![3, 2, 0, 0, 9, 0, 0, 1]);
        assert_eq!(cc.cells[4].bases, "A");
        assert_eq!(cc.cells[4].mut_flag, "R");
        assert_eq!(cc.total(), 15);
    }

    #[test]
    fn test_pair_counts_are_zero_filled() {
        let t = table();
        let cc = combined_counts(&t, &Combination::new(&["pos1", "pos3"]), None).unwrap();
        assert_eq!(cc.cells.len(), 32);
        assert_eq!(cc.factors(), vec!["mut", "pos1", "pos3"]);

        // C at pos1, T at pos3 mutated
        let ct = cc.cells.iter().find(|c| c.mut_flag == "M" && c.bases == "CT").unwrap();
        assert_eq!(ct.count, 3);
        let ca = cc.cells.iter().find(|c| c.mut_flag == "M" && c.bases == "CA").unwrap();
        assert_eq!(ca.count, 2);
        assert_eq!(cc.cells.iter().filter(|c| c.count > 0).count(), 5);
    }

    #[test]
    fn test_grouped_counts() {
        let t = table();
        let cc = combined_counts(&t, &Combination::new(&["pos0"]), Some("strand")).unwrap();
        assert_eq!(cc.group_levels, vec!["+", "-"]);
        assert_eq!(cc.dims(), vec![2, 2, 4]);
        assert_eq!(cc.cells.len(), 16);
        assert_eq!(cc.cells[0].group.as_deref(), Some("+"));
        assert_eq!(cc.cells[0].count, 3);
        assert_eq!(cc.cells[4].count, 9);
        assert_eq!(cc.cells[8].group.as_deref(), Some("-"));
        assert_eq!(cc.cells[9].count, 2);
    }

    #[test]
    fn test_grouped_counts_require_two_values() {
        let t = table().with_constant_column("group", "1").unwrap();
        assert!(combined_counts(&t, &Combination::new(&["pos0"]), Some("group")).is_err());
        assert!(combined_counts(&t, &Combination::new(&["pos0"]), Some("missing")).is_err());
    }

    #[test]
    fn test_mut_flags_checked() {
        let data: &[u8] = b"count\tpos0\tmut\n1\tA\tM\n1\tC\tX\n1\tG\tY\n";
        let t = Reader::new(data).read_table().unwrap();
        assert!(combined_counts(&t, &Combination::new(&["pos0"]), None).is_err());
    }
}
