//! Correlation network construction.
//!
//! Vertex admission happens at builder creation: an attribute becomes a
//! vertex iff its absolute class relevance exceeds the relevance threshold.
//! Edges are then grown by exactly one of two policies over the globally
//! sorted pair list: grow-until-connected or fixed-threshold prefix.

use log;

use crate::data::{AttributeCatalog, AttributePair};
use crate::error::{FcnError, Result};
use crate::graph::algorithms::{is_connected, DisjointSets};
use crate::graph::CorrelationGraph;

/// Default feature relevance threshold for vertex admission.
pub const DEFAULT_RELEVANCE_THRESHOLD: f64 = 0.05;

pub struct NetworkBuilder {
    graph: CorrelationGraph,
    pairs: Vec<AttributePair>,
    relevance_threshold: f64,
    built: bool,
}

impl NetworkBuilder {
    /// Admit vertices from the catalog and stage the sorted pair list.
    /// The pair list must already be sorted by descending `|correlation|`
    /// (the correlation engine's output order).
    pub fn new(
        catalog: &AttributeCatalog,
        pairs: &[AttributePair],
        relevance_threshold: f64,
    ) -> Result<Self> {
        if !relevance_threshold.is_finite()
            || !(0.0..1.0).contains(&relevance_threshold)
        {
            return Err(FcnError::Configuration(format!(
                "relevance threshold must be in [0, 1), got {relevance_threshold}"
            )));
        }

        let vertices = catalog
            .iter()
            .filter(|a| a.class_relevance.abs() > relevance_threshold)
            .cloned()
            .collect();

        Ok(Self {
            graph: CorrelationGraph::with_vertices(vertices),
            pairs: pairs.to_vec(),
            relevance_threshold,
            built: false,
        })
    }

    pub fn with_default_threshold(
        catalog: &AttributeCatalog,
        pairs: &[AttributePair],
    ) -> Result<Self> {
        Self::new(catalog, pairs, DEFAULT_RELEVANCE_THRESHOLD)
    }

    pub fn relevance_threshold(&self) -> f64 {
        self.relevance_threshold
    }

    fn ensure_not_built(&mut self) -> Result<()> {
        if self.built {
            return Err(FcnError::IllegalState(
                "network edges have already been grown; build a fresh network instead".to_string(),
            ));
        }
        self.built = true;
        Ok(())
    }

    /// Insert edges from the sorted pair list, keeping every pair whose
    /// endpoints are both vertices, until the first insertion that makes
    /// the graph connected. Exhausting the list without reaching
    /// connectivity leaves the graph disconnected; that is a legitimate
    /// terminal state.
    pub fn grow_until_connected(&mut self) -> Result<()> {
        self.ensure_not_built()?;

        let vertex_count = self.graph.vertex_count();
        if vertex_count <= 1 {
            // trivially connected, no edges
            return Ok(());
        }

        let mut sets = DisjointSets::new(vertex_count);
        for pair in &self.pairs {
            let (Some(a), Some(b)) = (
                self.graph.index_of_id(pair.a),
                self.graph.index_of_id(pair.b),
            ) else {
                continue;
            };

            // every qualifying edge is kept, not just component-merging ones
            self.graph.add_edge(a, b, pair.correlation);
            sets.union(a, b);
            if sets.components() == 1 {
                debug_assert!(is_connected(&self.graph));
                return Ok(());
            }
        }

        log::debug!(
            "Pair list exhausted with {} components remaining",
            sets.components()
        );
        Ok(())
    }

    /// Insert the maximal prefix of the sorted pair list whose pairs carry
    /// `|correlation| >= t`; the scan stops at the first failing pair.
    pub fn grow_to_threshold(&mut self, t: f64) -> Result<()> {
        if !t.is_finite() {
            return Err(FcnError::Configuration(format!(
                "correlation threshold must be finite, got {t}"
            )));
        }
        self.ensure_not_built()?;

        for pair in &self.pairs {
            if !(pair.correlation.abs() >= t) {
                break;
            }
            let (Some(a), Some(b)) = (
                self.graph.index_of_id(pair.a),
                self.graph.index_of_id(pair.b),
            ) else {
                continue;
            };
            self.graph.add_edge(a, b, pair.correlation);
        }

        Ok(())
    }

    pub fn graph(&self) -> &CorrelationGraph {
        &self.graph
    }

    pub fn finish(self) -> CorrelationGraph {
        self.graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::AttributeCatalog;

    fn catalog(relevances: &[f64]) -> AttributeCatalog {
        let names: Vec<String> = (0..relevances.len()).map(|i| format!("a{i}")).collect();
        let mut catalog = AttributeCatalog::from_names(&names).unwrap();
        for (i, &r) in relevances.iter().enumerate() {
            catalog.set_relevance(i as u32, r);
        }
        catalog
    }

    #[test]
    fn admission_is_strict_absolute_threshold() {
        let c = catalog(&[0.9, -0.8, 0.05, 0.01]);
        let builder = NetworkBuilder::new(&c, &[], 0.05).unwrap();
        // |0.05| is not > 0.05; negative relevance admits by magnitude
        assert_eq!(builder.graph().vertex_count(), 2);
        assert!(builder.graph().index_of_name("a1").is_some());
    }

    #[test]
    fn invalid_relevance_threshold_is_rejected() {
        let c = catalog(&[0.5]);
        assert!(NetworkBuilder::new(&c, &[], -0.1).is_err());
        assert!(NetworkBuilder::new(&c, &[], 1.0).is_err());
        assert!(NetworkBuilder::new(&c, &[], f64::NAN).is_err());
    }

    #[test]
    fn growth_cannot_be_repeated() {
        let c = catalog(&[0.9, 0.8]);
        let pairs = vec![AttributePair::new(0, 1, 0.7)];
        let mut builder = NetworkBuilder::new(&c, &pairs, 0.05).unwrap();
        builder.grow_until_connected().unwrap();
        let err = builder.grow_to_threshold(0.5).unwrap_err();
        assert!(matches!(err, FcnError::IllegalState(_)));
    }

    #[test]
    fn single_vertex_network_is_trivially_connected() {
        let c = catalog(&[0.9]);
        let mut builder = NetworkBuilder::new(&c, &[], 0.05).unwrap();
        builder.grow_until_connected().unwrap();
        let graph = builder.finish();
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.min_observed_correlation(), None);
        assert!(is_connected(&graph));
    }
}
