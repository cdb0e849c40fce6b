//! Pairwise attribute correlation and class-relevance scoring.
//!
//! The engine produces the symmetric Spearman correlation matrix over all
//! attribute columns, the full list of attribute pairs sorted by descending
//! absolute correlation, and one mutual-information relevance score per
//! attribute against the binarized class label.

use std::collections::HashMap;

use log;
use ndarray::Array2;
use rayon::prelude::*;

use crate::data::{Dataset, LabelBinarizer};
use crate::error::Result;
use crate::stats;

/// Unordered pair of attributes with their correlation. Attribute ids are
/// normalized so `a < b`; equality and hashing ignore the correlation.
#[derive(Debug, Clone)]
pub struct AttributePair {
    pub a: u32,
    pub b: u32,
    pub correlation: f64,
}

impl AttributePair {
    pub fn new(a: u32, b: u32, correlation: f64) -> Self {
        let (a, b) = if a <= b { (a, b) } else { (b, a) };
        Self { a, b, correlation }
    }
}

impl PartialEq for AttributePair {
    fn eq(&self, other: &Self) -> bool {
        self.a == other.a && self.b == other.b
    }
}

impl Eq for AttributePair {}

impl std::hash::Hash for AttributePair {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.a.hash(state);
        self.b.hash(state);
    }
}

/// Output of [`CorrelationEngine::analyze`].
#[derive(Debug, Clone)]
pub struct CorrelationReport {
    /// Symmetric `A x A` Spearman correlation matrix. The diagonal is not
    /// computed; it is fixed at 1.0 by definition.
    pub matrix: Array2<f64>,
    /// All `A*(A-1)/2` pairs, sorted by descending `|correlation|`. Ties
    /// keep their first-computed order.
    pub pairs: Vec<AttributePair>,
}

pub struct CorrelationEngine;

impl CorrelationEngine {
    /// Compute the correlation matrix, the sorted pair list, and write the
    /// class-relevance score of every attribute into the dataset catalog.
    ///
    /// Fails with a configuration error before any computation if the
    /// binarizer does not cover every class label in the dataset.
    pub fn analyze(dataset: &mut Dataset, binarizer: &LabelBinarizer) -> Result<CorrelationReport> {
        let class_bits = binarizer.encode_all(dataset.labels())?;
        let num_attr = dataset.num_attributes();

        log::info!(
            "Computing {} attribute pair correlations over {} instances",
            num_attr * num_attr.saturating_sub(1) / 2,
            dataset.num_instances()
        );

        // Rank each column once; Spearman over a pair is then Pearson over
        // the two rank vectors.
        let columns: Vec<Vec<f64>> = (0..num_attr)
            .map(|i| dataset.column(i as u32).to_vec())
            .collect();
        let ranked: Vec<Vec<f64>> = columns
            .par_iter()
            .map(|col| stats::average_ranks(col))
            .collect();

        // Pair generation order is the stable tie-break for the sort below.
        let mut index_pairs = Vec::with_capacity(num_attr * num_attr.saturating_sub(1) / 2);
        for j in 1..num_attr {
            for i in 0..j {
                index_pairs.push((i, j));
            }
        }

        let correlations: Vec<f64> = index_pairs
            .par_iter()
            .map(|&(i, j)| stats::pearson(&ranked[i], &ranked[j]))
            .collect();

        let mut matrix = Array2::zeros((num_attr, num_attr));
        for i in 0..num_attr {
            matrix[[i, i]] = 1.0;
        }

        let mut pairs = Vec::with_capacity(index_pairs.len());
        for (&(i, j), &r) in index_pairs.iter().zip(correlations.iter()) {
            matrix[[i, j]] = r;
            matrix[[j, i]] = r;
            pairs.push(AttributePair::new(i as u32, j as u32, r));
        }

        // Stable by-|r| sort keeps the generation order on ties; NaN
        // correlations (constant columns) compare equal and stay put.
        pairs.sort_by(|p, q| {
            q.correlation
                .abs()
                .partial_cmp(&p.correlation.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        for i in 0..num_attr {
            let mi = mutual_information(&columns[i], &class_bits);
            dataset.catalog_mut().set_relevance(i as u32, mi);
        }

        Ok(CorrelationReport { matrix, pairs })
    }
}

/// Discrete mutual information (base-2) between two value sequences.
/// Values are discretized by flooring, so integer-coded and binary columns
/// keep one state per code.
fn mutual_information(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len();
    if n == 0 {
        return 0.0;
    }

    let mut joint: HashMap<(i64, i64), usize> = HashMap::new();
    let mut px: HashMap<i64, usize> = HashMap::new();
    let mut py: HashMap<i64, usize> = HashMap::new();
    for (&x, &y) in xs.iter().zip(ys.iter()) {
        let xs_state = x.floor() as i64;
        let ys_state = y.floor() as i64;
        *joint.entry((xs_state, ys_state)).or_insert(0) += 1;
        *px.entry(xs_state).or_insert(0) += 1;
        *py.entry(ys_state).or_insert(0) += 1;
    }

    let n = n as f64;
    let mut mi = 0.0;
    for (&(x_state, y_state), &count) in &joint {
        let p_xy = count as f64 / n;
        let p_x = px[&x_state] as f64 / n;
        let p_y = py[&y_state] as f64 / n;
        mi += p_xy * (p_xy / (p_x * p_y)).log2();
    }

    mi
}
