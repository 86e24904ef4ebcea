use std::cmp;
use std::f64;

use statrs::distribution::{ChiSquared, ContinuousCDF};

/// Chi-square survival function, P(X > x) for `df` degrees of freedom.
/// Zero degrees of freedom leave nothing to test, so the probability is 1.
pub fn chisq_sf(x: f64, df: usize) -> f64 {
    if df == 0 || x.is_nan() {
        return 1.0;
    }
    match ChiSquared::new(df as f64) {
        Ok(dist) => dist.sf(x.max(0.0)).clamp(0.0, 1.0),
        Err(_) => 1.0,
    }
}

/// Likelihood-ratio statistic 2 * sum(o * ln(o / e)); cells with o == 0 contribute nothing.
pub fn g_statistic(observed: &[f64], expected: &[f64]) -> f64 {
    let n = cmp::min(observed.len(), expected.len());
    let mut g = 0.0;
    for i in 0..n {
        if observed[i] > 0.0 {
            g += observed[i] * (observed[i] / expected[i]).ln();
        }
    }
    2.0 * g
}

pub fn scale(xs: &[f64]) -> Vec<f64> {
    let s: f64 = xs.iter().sum();
    if s == 1.0 || s == 0.0 {
        xs.to_owned()
    } else {
        xs.iter().map(|x| x / s).collect()
    }
}

/// Kullback-Leibler Divergence using log2
pub fn kl_divergence(p: &[f64], q: &[f64]) -> f64 {
    let n = cmp::min(p.len(), q.len());
    let p = &p[..n];
    let q = &q[..n];

    let mut d = 0.0;
    for i in 0..n {
        if p[i] != 0.0 {
            d += p[i] * (p[i].log2() - q[i].log2())
        }
    }

    d
}

/// Jensen-Shannon Divergence using log2
/// bounded in [0, 1]
pub fn js_divergence(p: &[f64], q: &[f64]) -> f64 {
    // ensure that p and q are proper distributions
    let p = scale(p);
    let q = scale(q);

    let m: Vec<f64> = p.iter().zip(q.iter()).map(|(&x, &y)| 0.5 * (x + y)).collect();

    0.5 * (kl_divergence(&p, &m) + kl_divergence(&q, &m))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1.0e-6;

    #[test]
    fn test_chisq_sf() {
        assert!((chisq_sf(3.841459, 1) - 0.05).abs() < EPS);
        assert!((chisq_sf(5.991465, 2) - 0.05).abs() < EPS);
        assert!((chisq_sf(0.0, 3) - 1.0).abs() < EPS);
        assert!(chisq_sf(1.0e4, 3) < EPS);
        assert_eq!(chisq_sf(2.0, 0), 1.0);
    }

    #[test]
    fn test_g_statistic() {
        assert_eq!(g_statistic(&vec![1.0, 2.0, 3.0], &vec![1.0, 2.0, 3.0]), 0.0);
        assert!((g_statistic(&vec![10.0, 0.0], &vec![5.0, 5.0]) - 20.0 * 2f64.ln()).abs() < EPS);
    }

    #[test]
    fn test_js_divergence() {
        assert!(js_divergence(&vec![0.0, 0.1, 0.9], &vec![0.0, 0.1, 0.9]) == 0.0);
        assert!((js_divergence(&vec![0.0, 0.1, 0.9], &vec![0.1, 0.2, 0.7]) - 0.0712961).abs() < EPS);
        assert!((js_divergence(&vec![0.1, 0.2, 0.7], &vec![0.0, 0.1, 0.9]) - 0.0712961).abs() < EPS);
        assert!((js_divergence(&vec![2.0, 0.0], &vec![0.0, 5.0]) - 1.0).abs() < EPS);
    }

    #[test]
    fn test_kl_divergence() {
        assert!(kl_divergence(&vec![0.0, 0.1, 0.9], &vec![0.0, 0.1, 0.9]) == 0.0);
        assert!((kl_divergence(&vec![0.1, 0.1, 0.8], &vec![0.1, 0.2, 0.7]) - 0.05411606).abs() < EPS);
        assert!((kl_divergence(&vec![0.1, 0.2, 0.7], &vec![0.1, 0.1, 0.8]) - 0.06514845).abs() < EPS);
    }
}
