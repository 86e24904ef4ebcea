use crate::constants::*;

pub type Nucleotide = u8;

/// Index of a nucleotide in A, C, G, T order.
pub fn base_index(x: Nucleotide) -> Option<usize> {
    match x {
        b'A' | b'a' => Some(0),
        b'C' | b'c' => Some(1),
        b'G' | b'g' => Some(2),
        b'T' | b't' => Some(3),
        _ => None,
    }
}

#[inline]
pub fn base_from_index(i: usize) -> Nucleotide {
    NUCLEOTIDES[i]
}

/// Base tuple of length `k` for a flat index, with the last base varying fastest.
pub fn base_tuple(mut index: usize, k: usize) -> String {
    let mut bases = vec![b'A'; k];
    for i in (0 .. k).rev() {
        bases[i] = base_from_index(index % N_NUCLEOTIDES);
        index /= N_NUCLEOTIDES;
    }
    // bases are drawn from NUCLEOTIDES, which are ASCII
    bases.into_iter().map(|b| b as char).collect()
}

/// Flat index of a base tuple, the inverse of `base_tuple`.
pub fn tuple_index(bases: &[Nucleotide]) -> Option<usize> {
    let mut idx = 0;
    for &b in bases {
        idx = idx * N_NUCLEOTIDES + base_index(b)?;
    }
    Some(idx)
}

#[inline]
pub fn n_tuples(k: usize) -> usize {
    N_NUCLEOTIDES.pow(k as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_tuple() {
        assert_eq!(base_tuple(0, 2), "AA");
        assert_eq!(base_tuple(1, 2), "AC");
        assert_eq!(base_tuple(4, 2), "CA");
        assert_eq!(base_tuple(15, 2), "TT");
        assert_eq!(base_tuple(27, 3), "CGT");
    }

    #[test]
    fn test_tuple_index() {
        for i in 0 .. n_tuples(3) {
            let t = base_tuple(i, 3);
            assert_eq!(tuple_index(t.as_bytes()), Some(i));
        }
        assert_eq!(tuple_index(b"AN"), None);
    }
}
