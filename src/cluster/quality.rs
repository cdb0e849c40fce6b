//! Scoring an externally supplied partition of the correlation network.

use std::collections::HashMap;

use itertools::Itertools;
use log;

use crate::cluster::{ClusteringQuality, Partition};
use crate::error::{FcnError, Result};
use crate::graph::CorrelationGraph;
use crate::stats;

/// Significance level for the intra/inter weight comparison.
const ALPHA: f64 = 0.05;

/// Score a partition against the network it was computed from.
///
/// Fails with a data-integrity error if the partition omits any network
/// vertex, or if it uses more distinct cluster ids than its header
/// declared.
pub fn analyze(graph: &CorrelationGraph, partition: &Partition) -> Result<ClusteringQuality> {
    // cluster id per arena vertex, checked up front
    let mut vertex_cluster: Vec<&str> = Vec::with_capacity(graph.vertex_count());
    for vertex in graph.vertices() {
        let cluster = partition.cluster_of(&vertex.name).ok_or_else(|| {
            FcnError::DataIntegrity(format!(
                "partition does not cover network vertex '{}'",
                vertex.name
            ))
        })?;
        vertex_cluster.push(cluster);
    }

    let mut members: HashMap<&str, Vec<usize>> = HashMap::new();
    for (idx, &cluster) in vertex_cluster.iter().enumerate() {
        members.entry(cluster).or_default().push(idx);
    }
    if members.len() > partition.declared_clusters() {
        return Err(FcnError::DataIntegrity(format!(
            "partition assigns {} distinct clusters but declares {}",
            members.len(),
            partition.declared_clusters()
        )));
    }

    // classify every edge, collecting the two weight distributions
    let mut intra_weights = Vec::new();
    let mut inter_weights = Vec::new();
    for edge in graph.edges() {
        let w = edge.correlation.abs();
        if vertex_cluster[edge.a] == vertex_cluster[edge.b] {
            intra_weights.push(w);
        } else {
            inter_weights.push(w);
        }
    }

    // per-cluster representativeness
    let mut weight_dominant = 0;
    let mut representative_stable = 0;
    let mut largest = 0;
    for (cluster, vertices) in &members {
        let mut total_intra = 0.0;
        let mut total_inter = 0.0;
        let mut stable = true;
        largest = largest.max(vertices.len());

        for &v in vertices {
            let mut local_intra = 0.0;
            let mut local_inter = 0.0;
            for &(neighbor, r) in graph.neighbors(v) {
                if vertex_cluster[neighbor] == *cluster {
                    local_intra += r.abs();
                } else {
                    local_inter += r.abs();
                }
            }
            total_intra += local_intra;
            total_inter += local_inter;
            if local_inter > local_intra {
                stable = false;
            }
        }

        if total_intra > total_inter {
            weight_dominant += 1;
        }
        if stable {
            representative_stable += 1;
        }
    }

    let largest_fraction = if graph.vertex_count() > 0 {
        largest as f64 / graph.vertex_count() as f64
    } else {
        0.0
    };

    let (superiority, significant) = compare_weights(&intra_weights, &inter_weights);

    let quality = ClusteringQuality {
        num_clusters: partition.declared_clusters(),
        modularity: partition.modularity(),
        intra_links: intra_weights.len(),
        inter_links: inter_weights.len(),
        intra_weight: intra_weights.iter().sum(),
        inter_weight: inter_weights.iter().sum(),
        weight_dominant_clusters: weight_dominant,
        representative_stable_clusters: representative_stable,
        largest_fraction,
        superiority,
        significant,
    };

    log::debug!(
        "Partition quality: {} clusters, ps = {:.4}, significant = {}, value = {:.4}",
        quality.num_clusters,
        quality.superiority,
        quality.significant,
        quality.quality_value()
    );
    Ok(quality)
}

/// Stochastic superiority of intra over inter weights, and whether the two
/// distributions separate under the rank-sum test. With an empty side the
/// superiority degenerates (1.0 when nothing leaves the clusters, 0.0 when
/// nothing stays); with fewer than two observations on either side the
/// significance flag is forced false without running the test.
fn compare_weights(intra: &[f64], inter: &[f64]) -> (f64, bool) {
    let superiority = if intra.is_empty() {
        0.0
    } else if inter.is_empty() {
        1.0
    } else {
        let favorable = intra
            .iter()
            .cartesian_product(inter.iter())
            .filter(|(i, j)| i >= j)
            .count();
        favorable as f64 / (intra.len() * inter.len()) as f64
    };

    if intra.len() < 2 || inter.len() < 2 {
        return (superiority, false);
    }

    let p = stats::rank_sum_test(intra, inter);
    (superiority, p < ALPHA)
}
