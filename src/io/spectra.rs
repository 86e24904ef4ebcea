//! Tab-delimited mutation spectra tables.
//!
//! A spectra table counts mutations by direction (e.g. `CtoT`), optionally
//! split by extra columns such as `strand`.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::Path;

use log::debug;

use crate::constants::*;
use crate::error::{Error, Result};
use crate::io::GroupedTable;
use crate::seq;

#[derive(Debug, Clone, PartialEq)]
pub struct SpectraRecord {
    pub count: u64,
    /// Mutation direction, `<from>to<to>`
    pub direction: String,
    pub extra: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SpectraTable {
    extra_columns: Vec<String>,
    records: Vec<SpectraRecord>,
}

/// Whether `direction` names a point mutation between two distinct bases.
pub fn is_direction(direction: &str) -> bool {
    match direction.as_bytes() {
        [from, b't', b'o', to] => {
            seq::base_index(*from).is_some() && seq::base_index(*to).is_some()
                && !from.eq_ignore_ascii_case(to)
        },
        _ => false,
    }
}

pub struct Reader<R: io::Read> {
    inner: csv::Reader<R>,
}

impl Reader<fs::File> {
    pub fn from_file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        fs::File::open(path).map(Reader::new)
    }
}

impl<R: io::Read> Reader<R> {
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

    pub fn read_table(&mut self) -> Result<SpectraTable> {
        let header: Vec<String> = self.inner.headers()?.iter().map(String::from).collect();

        let find = |name: &str| header.iter().position(|h| h == name)
            .ok_or_else(|| Error::config(format!("spectra table has no '{}' column", name)));
        let count_idx = find(COUNT_COLUMN)?;
        let direction_idx = find(DIRECTION_COLUMN)?;
        let extra_idx: Vec<usize> = (0 .. header.len())
            .filter(|&i| i != count_idx && i != direction_idx)
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
            let direction = field(direction_idx)?;
            if !is_direction(direction) {
                return Err(Error::Parse { line: line, msg: format!("invalid direction '{}'", direction) });
            }

            let mut extra = Vec::with_capacity(extra_idx.len());
            for &i in extra_idx.iter() {
                extra.push(field(i)?.to_owned());
            }

            records.push(SpectraRecord { count: count, direction: direction.to_owned(), extra: extra });
        }

        let table = SpectraTable {
            extra_columns: extra_idx.iter().map(|&i| header[i].clone()).collect(),
            records: records,
        };
        debug!("read spectra table: {} records", table.records.len());
        Ok(table)
    }
}

pub fn load<P: AsRef<Path>>(path: P) -> Result<SpectraTable> {
    Reader::from_file(path)?.read_table()
}

impl SpectraTable {
    #[inline]
    pub fn records(&self) -> &[SpectraRecord] {
        &self.records
    }

    #[inline]
    pub fn extra_columns(&self) -> &[String] {
        &self.extra_columns
    }

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

    /// Sorted distinct mutation directions.
    pub fn directions(&self) -> Vec<String> {
        let values: BTreeSet<&str> = self.records.iter().map(|r| r.direction.as_str()).collect();
        values.into_iter().map(String::from).collect()
    }
}

impl GroupedTable for SpectraTable {
    fn len(&self) -> usize {
        self.records.len()
    }

    fn has_column(&self, name: &str) -> bool {
        name == COUNT_COLUMN || name == DIRECTION_COLUMN
            || self.extra_columns.iter().any(|c| c == name)
    }

    fn with_constant_column(mut self, name: &str, value: &str) -> Result<Self> {
        if self.has_column(name) {
            return Err(Error::config(format!("column '{}' already exists", name)));
        }
        self.extra_columns.insert(0, name.to_owned());
        for r in self.records.iter_mut() {
            r.extra.insert(0, value.to_owned());
        }
        Ok(self)
    }

    fn concat(mut self, other: Self) -> Result<Self> {
        let mut order = Vec::with_capacity(self.extra_columns.len());
        for c in self.extra_columns.iter() {
            order.push(other.extra_index(c)?);
        }
        if other.extra_columns.len() != order.len() {
            return Err(Error::config("spectra tables have different columns"));
        }
        for mut r in other.records.into_iter() {
            r.extra = order.iter().map(|&j| r.extra[j].clone()).collect();
            self.records.push(r);
        }
        Ok(self)
    }
}
