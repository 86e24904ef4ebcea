//! Tab-delimited motif count tables.
//!
//! A count table has a header naming a `count` column, one `pos*` column per
//! sequence position, a `mut` flag column and any number of extra columns
//! (e.g. `strand`). Each record counts the observations sharing one base at
//! every position.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::Path;

use log::debug;
use ndarray::Array2;

use crate::constants::*;
use crate::error::{Error, Result};
use crate::io::GroupedTable;
use crate::seq::{self, Nucleotide};

/// A count table record.
#[derive(Debug, Clone, PartialEq)]
pub struct CountRecord {
    /// Number of observations
    pub count: u64,
    /// Base at each position, in table position order
    pub bases: Vec<Nucleotide>,
    /// Mutation flag, `M` for mutated observations
    pub mut_flag: String,
    /// Values of the extra columns, aligned with `CountsTable::extra_columns`
    pub extra: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CountsTable {
    positions: Vec<String>,
    extra_columns: Vec<String>,
    records: Vec<CountRecord>,
}

/// A count table reader.
pub struct Reader<R: io::Read> {
    inner: csv::Reader<R>,
}

impl Reader<fs::File> {
    /// Read from a given file path.
    pub fn from_file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        fs::File::open(path).map(Reader::new)
    }
}

impl<R: io::Read> Reader<R> {
    /// Read from a given reader.
    pub fn new(reader: R) -> Self {
        Reader {
            inner: csv::ReaderBuilder::new()
                .delimiter(b'\t')
                .comment(Some(b'#'))
                .has_headers(true)
                .trim(csv::Trim::All)
                .from_reader(reader),
        }
    }

    /// Read the whole table.
    /// Stop reading as soon as a problematic record is encountered.
    pub fn read_table(&mut self) -> Result<CountsTable> {
        let header: Vec<String> = self.inner.headers()?.iter().map(String::from).collect();

        let find = |name: &str| header.iter().position(|h| h == name)
            .ok_or_else(|| Error::config(format!("count table has no '{}' column", name)));
        let count_idx = find(COUNT_COLUMN)?;
        let mut_idx = find(MUT_COLUMN)?;

        let position_idx: Vec<usize> = header.iter().enumerate()
            .filter(|&(_, h)| h.starts_with(POSITION_PREFIX))
            .map(|(i, _)| i)
            .collect();
        if position_idx.is_empty() {
            return Err(Error::config("count table has no position columns"));
        }

        let extra_idx: Vec<usize> = (0 .. header.len())
            .filter(|i| *i != count_idx && *i != mut_idx && !position_idx.contains(i))
            .collect();

        let mut records = Vec::new();
        for res in self.inner.records() {
            let record = res?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            let field = |i: usize| record.get(i).ok_or_else(|| Error::Parse {
                line: line,
                msg: format!("missing field '{}'", header[i]),
            });

            let count = field(count_idx)?.parse::<u64>()
                .map_err(|e| Error::Parse { line: line, msg: format!("invalid count: {}", e) })?;

            let mut bases = Vec::with_capacity(position_idx.len());
            for &i in position_idx.iter() {
                let value = field(i)?;
                match value.as_bytes() {
                    [b] if seq::base_index(*b).is_some() => bases.push(b.to_ascii_uppercase()),
                    _ => return Err(Error::Parse {
                        line: line,
                        msg: format!("invalid base '{}' in column '{}'", value, header[i]),
                    }),
                }
            }

            let mut extra = Vec::with_capacity(extra_idx.len());
            for &i in extra_idx.iter() {
                extra.push(field(i)?.to_owned());
            }

            records.push(CountRecord {
                count: count,
                bases: bases,
                mut_flag: field(mut_idx)?.to_owned(),
                extra: extra,
            });
        }

        let table = CountsTable {
            positions: position_idx.iter().map(|&i| header[i].clone()).collect(),
            extra_columns: extra_idx.iter().map(|&i| header[i].clone()).collect(),
            records: records,
        };
        debug!("read count table: {} records, positions {:?}", table.len(), table.positions);

        Ok(table)
    }
}

/// Load a count table from a tab-delimited file.
pub fn load<P: AsRef<Path>>(path: P) -> Result<CountsTable> {
    Reader::from_file(path)?.read_table()
}

impl CountsTable {
    pub fn new(positions: Vec<String>, extra_columns: Vec<String>, records: Vec<CountRecord>) -> Result<CountsTable> {
        for r in records.iter() {
            if r.bases.len() != positions.len() || r.extra.len() != extra_columns.len() {
                return Err(Error::config("record does not match the table columns"));
            }
        }
        Ok(CountsTable { positions: positions, extra_columns: extra_columns, records: records })
    }

    #[inline]
    pub fn positions(&self) -> &[String] {
        &self.positions
    }

    #[inline]
    pub fn extra_columns(&self) -> &[String] {
        &self.extra_columns
    }

    #[inline]
    pub fn records(&self) -> &[CountRecord] {
        &self.records
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Column names in output order.
    pub fn header(&self) -> Vec<String> {
        let mut header: Vec<String> = self.extra_columns.clone();
        header.push(COUNT_COLUMN.to_owned());
        header.extend(self.positions.iter().cloned());
        header.push(MUT_COLUMN.to_owned());
        header
    }

    pub fn has_column(&self, name: &str) -> bool {
        name == COUNT_COLUMN || name == MUT_COLUMN
            || self.positions.iter().any(|p| p == name)
            || self.extra_columns.iter().any(|c| c == name)
    }

    /// Index of an extra (non count, position or mut) column.
    pub fn extra_index(&self, name: &str) -> Result<usize> {
        self.extra_columns.iter().position(|c| c == name)
            .ok_or_else(|| Error::config(format!("no column named '{}'", name)))
    }

    /// Sorted distinct values of an extra column.
    pub fn distinct_values(&self, name: &str) -> Result<Vec<String>> {
        let j = self.extra_index(name)?;
        let values: BTreeSet<&str> = self.records.iter().map(|r| r.extra[j].as_str()).collect();
        Ok(values.into_iter().map(String::from).collect())
    }

    /// Sorted distinct mutation flags.
    pub fn mut_flags(&self) -> Vec<String> {
        let flags: BTreeSet<&str> = self.records.iter().map(|r| r.mut_flag.as_str()).collect();
        flags.into_iter().map(String::from).collect()
    }

    /// Add a column holding the same value on every record.
    pub fn with_constant_column(mut self, name: &str, value: &str) -> Result<CountsTable> {
        if self.has_column(name) {
            return Err(Error::config(format!("column '{}' already exists", name)));
        }
        self.extra_columns.insert(0, name.to_owned());
        for r in self.records.iter_mut() {
            r.extra.insert(0, value.to_owned());
        }
        Ok(self)
    }

    /// Append the records of `other`, matching extra columns by name.
    pub fn concat(mut self, other: CountsTable) -> Result<CountsTable> {
        if self.positions != other.positions {
            return Err(Error::config(format!(
                "count tables have different positions: {:?} and {:?}",
                self.positions, other.positions)));
        }

        let mut order = Vec::with_capacity(self.extra_columns.len());
        for c in self.extra_columns.iter() {
            order.push(other.extra_index(c)?);
        }
        if other.extra_columns.len() != order.len() {
            return Err(Error::config("count tables have different columns"));
        }

        for mut r in other.records.into_iter() {
            r.extra = order.iter().map(|&j| r.extra[j].clone()).collect();
            self.records.push(r);
        }
        Ok(self)
    }

    /// Expand records carrying `mut_flag` into a base observation matrix,
    /// one row per counted observation, bases recoded to 0..4.
    pub fn observation_matrix(&self, mut_flag: &str) -> Array2<u8> {
        let n: usize = self.records.iter()
            .filter(|r| r.mut_flag == mut_flag)
            .map(|r| r.count as usize)
            .sum();
        let n_pos = self.positions.len();

        let mut data = Array2::zeros((n, n_pos));
        let mut i = 0;
        for r in self.records.iter().filter(|r| r.mut_flag == mut_flag) {
            for _ in 0 .. r.count {
                for (j, &b) in r.bases.iter().enumerate() {
                    // bases were validated on load
                    data[[i, j]] = seq::base_index(b).unwrap_or(N_NUCLEOTIDES) as u8;
                }
                i += 1;
            }
        }
        data
    }

    /// Write as a tab-delimited table.
    pub fn write<W: io::Write>(&self, writer: W) -> Result<()> {
        let mut out = csv::WriterBuilder::new().delimiter(b'\t').from_writer(writer);
        out.write_record(self.header())?;
        for r in self.records.iter() {
            let mut row: Vec<String> = r.extra.clone();
            row.push(r.count.to_string());
            row.extend(r.bases.iter().map(|&b| (b as char).to_string()));
            row.push(r.mut_flag.clone());
            out.write_record(&row)?;
        }
        out.flush()?;
        Ok(())
    }

    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.write(fs::File::create(path)?)
    }
}

impl GroupedTable for CountsTable {
    fn len(&self) -> usize {
        CountsTable::len(self)
    }

    fn has_column(&self, name: &str) -> bool {
        CountsTable::has_column(self, name)
    }

    fn with_constant_column(self, name: &str, value: &str) -> Result<Self> {
        CountsTable::with_constant_column(self, name, value)
    }

    fn concat(self, other: Self) -> Result<Self> {
        CountsTable::concat(self, other)
    }
}
