pub mod counts;
pub mod spectra;

use crate::error::Result;

/// A table whose records can be tagged with a group and pooled with another
/// table of the same layout.
pub trait GroupedTable: Sized {
    fn len(&self) -> usize;

    fn has_column(&self, name: &str) -> bool;

    /// Add a column holding the same value on every record.
    fn with_constant_column(self, name: &str, value: &str) -> Result<Self>;

    /// Append the records of `other`.
    fn concat(self, other: Self) -> Result<Self>;
}
