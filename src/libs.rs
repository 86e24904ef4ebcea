pub mod constants;
pub mod error;
pub mod seq;
pub mod entropy;
pub mod stats;
pub mod io;
pub mod motif;
pub mod loglin;
pub mod effect;
pub mod trellis;
pub mod logo;
pub mod config;
pub mod runlog;
pub mod analysis;
pub mod spectra;

pub use error::{Error, Result};
