//! Correlation graph representation.
//!
//! Vertices live in an arena addressed by stable index; consumers that
//! need to "remove" vertices (the greedy selector) flip bits in their own
//! active set instead of mutating the graph, so a built graph can be
//! inspected, re-selected, and analyzed any number of times.

use std::collections::HashMap;

use crate::data::Attribute;

/// One undirected edge between two arena vertex indices, weighted by the
/// signed pairwise correlation.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphEdge {
    pub a: usize,
    pub b: usize,
    pub correlation: f64,
}

/// Undirected feature correlation network: vertices are attributes whose
/// absolute class relevance exceeded the admission threshold, edges carry
/// pairwise correlation. No self-loops, no parallel edges.
#[derive(Debug, Clone)]
pub struct CorrelationGraph {
    vertices: Vec<Attribute>,
    index_by_id: HashMap<u32, usize>,
    adjacency: Vec<Vec<(usize, f64)>>,
    edges: Vec<GraphEdge>,
    min_observed_correlation: Option<f64>,
}

impl CorrelationGraph {
    pub(crate) fn with_vertices(vertices: Vec<Attribute>) -> Self {
        let index_by_id = vertices
            .iter()
            .enumerate()
            .map(|(idx, a)| (a.id, idx))
            .collect();
        let adjacency = vec![Vec::new(); vertices.len()];
        Self {
            vertices,
            index_by_id,
            adjacency,
            edges: Vec::new(),
            min_observed_correlation: None,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn vertex(&self, index: usize) -> &Attribute {
        &self.vertices[index]
    }

    pub fn vertices(&self) -> &[Attribute] {
        &self.vertices
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    /// Arena index of the vertex holding the attribute with this id.
    pub fn index_of_id(&self, id: u32) -> Option<usize> {
        self.index_by_id.get(&id).copied()
    }

    pub fn index_of_name(&self, name: &str) -> Option<usize> {
        self.vertices.iter().position(|a| a.name == name)
    }

    /// Neighbors of a vertex as `(vertex index, signed correlation)`.
    pub fn neighbors(&self, index: usize) -> &[(usize, f64)] {
        &self.adjacency[index]
    }

    pub fn degree(&self, index: usize) -> usize {
        self.adjacency[index].len()
    }

    /// Absolute correlation of the last edge inserted during growth; `None`
    /// until an edge has been added.
    pub fn min_observed_correlation(&self) -> Option<f64> {
        self.min_observed_correlation
    }

    pub fn average_degree(&self) -> f64 {
        if self.vertices.is_empty() {
            return 0.0;
        }
        2.0 * self.edges.len() as f64 / self.vertices.len() as f64
    }

    pub(crate) fn add_edge(&mut self, a: usize, b: usize, correlation: f64) {
        debug_assert!(a != b, "self-loops are not admitted");
        self.adjacency[a].push((b, correlation));
        self.adjacency[b].push((a, correlation));
        self.edges.push(GraphEdge { a, b, correlation });
        self.min_observed_correlation = Some(correlation.abs());
    }

    /// Log a one-line structural summary of the network.
    pub fn log_summary(&self) {
        let max_edge_r = self
            .edges
            .iter()
            .map(|e| e.correlation.abs())
            .fold(0.0, f64::max);
        let max_relevance = self
            .vertices
            .iter()
            .map(|a| a.class_relevance.abs())
            .fold(0.0, f64::max);

        log::info!(
            "Network: {} nodes, {} links, avg degree {:.4}, min |r| {:.4}, max |r| {:.4}, max |relevance| {:.4}",
            self.vertex_count(),
            self.edge_count(),
            self.average_degree(),
            self.min_observed_correlation.unwrap_or(0.0),
            max_edge_r,
            max_relevance
        );
    }
}
