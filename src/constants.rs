pub const NUCLEOTIDES: [u8; 4] = [b'A', b'C', b'G', b'T'];
pub const N_NUCLEOTIDES: usize = 4;

/// Highest interaction order analyzed.
pub const MAX_ORDER: usize = 4;

/// Number of positions required for the full order 1..4 analysis.
pub const N_FULL_POSITIONS: usize = 4;

/// Flag in the `mut` column marking mutated observations.
pub const MUTATED: &str = "M";

pub const COUNT_COLUMN: &str = "count";
pub const MUT_COLUMN: &str = "mut";
pub const POSITION_PREFIX: &str = "pos";
pub const STRAND_COLUMN: &str = "strand";
pub const DIRECTION_COLUMN: &str = "direction";
pub const DEFAULT_GROUP_COLUMN: &str = "group";

/// Maximum relative-entropy contribution of one symbol under uniformity (2 bits / 4 symbols).
pub const MAX_SYMBOL_INFORMATION: f64 = 0.5;
