//! Cluster (community) structure over the correlation network

pub mod detection;
pub mod quality;

use std::collections::HashMap;

use serde::Serialize;

/// An externally produced partition of the network vertices: one cluster
/// identifier per attribute name, plus the modularity and cluster count
/// reported by the community-detection collaborator.
#[derive(Debug, Clone)]
pub struct Partition {
    modularity: f64,
    declared_clusters: usize,
    assignments: HashMap<String, String>,
}

impl Partition {
    pub fn new(
        modularity: f64,
        declared_clusters: usize,
        assignments: HashMap<String, String>,
    ) -> Self {
        Self {
            modularity,
            declared_clusters,
            assignments,
        }
    }

    pub fn modularity(&self) -> f64 {
        self.modularity
    }

    pub fn declared_clusters(&self) -> usize {
        self.declared_clusters
    }

    /// Cluster id assigned to an attribute name, if any.
    pub fn cluster_of(&self, name: &str) -> Option<&str> {
        self.assignments.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

/// Aggregate quality record for one partition of the network.
#[derive(Debug, Clone, Serialize)]
pub struct ClusteringQuality {
    /// Cluster count reported by the collaborator.
    pub num_clusters: usize,
    /// Modularity `Q` reported by the collaborator.
    pub modularity: f64,
    pub intra_links: usize,
    pub inter_links: usize,
    /// Summed `|correlation|` over intra-cluster edges.
    pub intra_weight: f64,
    /// Summed `|correlation|` over inter-cluster edges.
    pub inter_weight: f64,
    /// Clusters whose total intra weight exceeds their total inter weight.
    pub weight_dominant_clusters: usize,
    /// Clusters where every vertex keeps at least as much weight inside
    /// the cluster as it sends outside.
    pub representative_stable_clusters: usize,
    /// Vertex-count fraction of the largest cluster.
    pub largest_fraction: f64,
    /// Stochastic superiority of intra-cluster weights over inter-cluster
    /// weights.
    pub superiority: f64,
    /// Whether the intra/inter weight distributions differ significantly
    /// under the rank-sum test (p < 0.05).
    pub significant: bool,
}

impl ClusteringQuality {
    /// Overall quality score: `Q` unchanged for a single-cluster
    /// partition, otherwise `Q` damped by the intra-weight fraction.
    pub fn quality_value(&self) -> f64 {
        if self.num_clusters == 1 {
            return self.modularity;
        }

        let total = self.intra_weight + self.inter_weight;
        let intra_fraction = if total > 0.0 {
            self.intra_weight / total
        } else {
            0.0
        };
        self.modularity * intra_fraction
    }
}
