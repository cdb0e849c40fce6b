//! Rank statistics used by the correlation engine and the cluster-quality
//! analyzer: average ranking, Pearson/Spearman correlation, and a
//! two-sample rank-sum test (normal approximation with tie correction).

use statrs::distribution::{ContinuousCDF, Normal};

/// Assign 1-based ranks to `values`, averaging the ranks of tied entries.
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap_or(std::cmp::Ordering::Equal));

    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        // extend over the tie run [i, j)
        let mut j = i + 1;
        while j < n && values[order[j]] == values[order[i]] {
            j += 1;
        }
        let avg_rank = (i + j + 1) as f64 / 2.0;
        for &idx in &order[i..j] {
            ranks[idx] = avg_rank;
        }
        i = j;
    }

    ranks
}

/// Pearson product-moment correlation. Returns NaN when either side has
/// zero variance, matching the behavior expected by the pair sort (NaN
/// pairs keep their first-computed position).
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (&xi, &yi) in x.iter().zip(y.iter()) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    cov / (var_x.sqrt() * var_y.sqrt())
}

/// Spearman rank correlation: Pearson correlation of the average ranks.
pub fn spearman(x: &[f64], y: &[f64]) -> f64 {
    pearson(&average_ranks(x), &average_ranks(y))
}

/// Two-sided p-value of the Wilcoxon rank-sum (Mann-Whitney) test comparing
/// two independent samples, using the normal approximation with tie
/// correction and continuity correction.
///
/// Callers are expected to gate on sample sizes themselves; with fewer than
/// two observations on either side the approximation is meaningless.
pub fn rank_sum_test(xs: &[f64], ys: &[f64]) -> f64 {
    let n1 = xs.len() as f64;
    let n2 = ys.len() as f64;
    let n = n1 + n2;

    let mut pooled: Vec<f64> = Vec::with_capacity(xs.len() + ys.len());
    pooled.extend_from_slice(xs);
    pooled.extend_from_slice(ys);
    let ranks = average_ranks(&pooled);

    let r1: f64 = ranks[..xs.len()].iter().sum();
    let u1 = r1 - n1 * (n1 + 1.0) / 2.0;

    // tie correction term: sum over tie groups of (t^3 - t)
    let mut sorted = pooled.clone();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mut tie_term = 0.0;
    let mut i = 0;
    while i < sorted.len() {
        let mut j = i + 1;
        while j < sorted.len() && sorted[j] == sorted[i] {
            j += 1;
        }
        let t = (j - i) as f64;
        tie_term += t * t * t - t;
        i = j;
    }

    let mean_u = n1 * n2 / 2.0;
    let var_u = n1 * n2 / 12.0 * ((n + 1.0) - tie_term / (n * (n - 1.0)));
    if var_u <= 0.0 {
        // all observations identical
        return 1.0;
    }

    // continuity correction, clamped for the dead-center case
    let distance = ((u1 - mean_u).abs() - 0.5).max(0.0);
    let z = distance / var_u.sqrt();

    let normal = Normal::new(0.0, 1.0).unwrap();
    2.0 * (1.0 - normal.cdf(z))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_without_ties_are_positions() {
        let r = average_ranks(&[10.0, 30.0, 20.0]);
        assert_eq!(r, vec![1.0, 3.0, 2.0]);
    }

    #[test]
    fn tied_values_share_average_rank() {
        let r = average_ranks(&[5.0, 1.0, 5.0, 9.0]);
        // ties at 5.0 occupy ranks 2 and 3
        assert_eq!(r, vec![2.5, 1.0, 2.5, 4.0]);
    }

    #[test]
    fn pearson_of_linear_data_is_one() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [2.0, 4.0, 6.0, 8.0];
        assert!((pearson(&x, &y) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn spearman_detects_monotone_relation() {
        // monotone but nonlinear
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [1.0, 8.0, 27.0, 64.0, 125.0];
        assert!((spearman(&x, &y) - 1.0).abs() < 1e-12);

        let y_rev = [125.0, 64.0, 27.0, 8.0, 1.0];
        assert!((spearman(&x, &y_rev) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn pearson_of_constant_column_is_nan() {
        let x = [3.0, 3.0, 3.0];
        let y = [1.0, 2.0, 3.0];
        assert!(pearson(&x, &y).is_nan());
    }

    #[test]
    fn rank_sum_separated_samples_is_significant() {
        let lo: Vec<f64> = (0..20).map(|i| i as f64 / 100.0).collect();
        let hi: Vec<f64> = (0..20).map(|i| 10.0 + i as f64 / 100.0).collect();
        let p = rank_sum_test(&hi, &lo);
        assert!(p < 0.001, "p = {p}");
    }

    #[test]
    fn rank_sum_identical_samples_is_not_significant() {
        let a: Vec<f64> = (0..15).map(|i| (i % 5) as f64).collect();
        let p = rank_sum_test(&a, &a);
        assert!(p > 0.5, "p = {p}");
    }
}
