//! Entropy measures for DNA observations recoded as integers.
//!
//! Each row of a base observation matrix is one observed sequence and each
//! column one position; bases are recoded to `0 <= b < 4` (A, C, G, T).
//! Every measure is computed independently per column.

use ndarray::{Array2, ArrayView2, Zip};

use crate::constants::*;
use crate::error::{Error, Result};

/// Pseudocount for relative entropy; non-zero so that no frequency is zero.
pub const DEFAULT_RE_PSEUDOCOUNT: f64 = 1.0;

/// Pseudocount for Shannon entropy and mutual information terms.
/// Unobserved symbols yield NaN terms at this default.
pub const DEFAULT_ENTROPY_PSEUDOCOUNT: f64 = 0.0;

/// Check that every observation is a recoded base.
pub fn validate(data: ArrayView2<u8>) -> Result<()> {
    match data.iter().find(|&&x| x as usize >= N_NUCLEOTIDES) {
        Some(&x) => Err(Error::InvalidBase(x)),
        None => Ok(()),
    }
}

/// Frequency matrix of shape (4, positions), adjusted by `pseudocount`.
pub fn frequency_matrix(data: ArrayView2<u8>, pseudocount: f64, check: bool) -> Result<Array2<f64>> {
    if check {
        validate(data)?;
    }

    let (n, n_pos) = data.dim();
    let mut p = Array2::from_elem((N_NUCLEOTIDES, n_pos), pseudocount);
    for row in data.rows() {
        for (j, &b) in row.iter().enumerate() {
            if (b as usize) < N_NUCLEOTIDES {
                p[[b as usize, j]] += 1.0;
            }
        }
    }

    let total = n as f64 + pseudocount * N_NUCLEOTIDES as f64;
    p.mapv_inplace(|x| x / total);

    Ok(p)
}

/// Relative entropy terms `p * log2(p / q)` of `reference` against `control`.
/// Column sums are the per-position KL divergences in bits.
pub fn relative_entropy_terms(reference: ArrayView2<u8>, control: ArrayView2<u8>, pseudocount: f64, check: bool) -> Result<Array2<f64>> {
    let p = frequency_matrix(reference, pseudocount, check)?;
    let q = frequency_matrix(control, pseudocount, check)?;
    if p.dim() != q.dim() {
        return Err(Error::config(format!(
            "reference has {} positions but control has {}", p.ncols(), q.ncols())));
    }

    let mut ret = Array2::<f64>::zeros(p.dim());
    Zip::from(&mut ret).and(&p).and(&q)
        .for_each(|r, &p, &q| *r = p * (p / q).log2());

    Ok(ret)
}

/// Shannon entropy terms `-p * log2(p)`.
pub fn shannon_entropy_terms(data: ArrayView2<u8>, pseudocount: f64, check: bool) -> Result<Array2<f64>> {
    let p = frequency_matrix(data, pseudocount, check)?;
    Ok(p.mapv(|p| -p * p.log2()))
}

/// Mutual information terms: deviation of each entropy term from the
/// per-symbol contribution of a uniform distribution.
pub fn mutual_information_terms(data: ArrayView2<u8>, pseudocount: f64, check: bool) -> Result<Array2<f64>> {
    let et = shannon_entropy_terms(data, pseudocount, check)?;
    Ok(et.mapv(|e| MAX_SYMBOL_INFORMATION - e))
}

/// Per-position relative entropy: the column sums of `relative_entropy_terms`.
pub fn positional_relative_entropy(reference: ArrayView2<u8>, control: ArrayView2<u8>) -> Result<Vec<f64>> {
    let ret = relative_entropy_terms(reference, control, DEFAULT_RE_PSEUDOCOUNT, true)?;
    Ok(ret.columns().into_iter().map(|c| c.sum()).collect())
}
