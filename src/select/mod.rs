//! Greedy representative-feature selection.
//!
//! Iterative peeling of the correlation network into an independent
//! dominating set: repeatedly take the most class-relevant remaining
//! vertex and retire it together with its direct neighbors. The result is
//! independent (no two selected vertices were adjacent) and dominating
//! (every unselected vertex neighbored a selected one when retired).

use log;

use crate::error::{FcnError, Result};
use crate::graph::CorrelationGraph;

/// Select representative attributes from a built network. Returns attribute
/// ids in selection order.
///
/// Vertices are taken in order of signed class relevance, descending, with
/// ties broken by arena insertion order. This is deliberately different
/// from the catalog ranking, which orders by absolute relevance.
///
/// The graph itself is not mutated; peeling flips bits in a private active
/// set, so the caller can reuse the graph afterwards.
pub fn select_representatives(graph: &CorrelationGraph) -> Result<Vec<u32>> {
    let n = graph.vertex_count();
    if n == 0 && graph.edge_count() > 0 {
        return Err(FcnError::IllegalState(
            "selector invoked on a network with edges but no vertices".to_string(),
        ));
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        graph
            .vertex(b)
            .class_relevance
            .partial_cmp(&graph.vertex(a).class_relevance)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut active = vec![true; n];
    let mut selection = Vec::new();
    for v in order {
        if !active[v] {
            continue;
        }
        selection.push(graph.vertex(v).id);
        active[v] = false;
        for &(neighbor, _) in graph.neighbors(v) {
            active[neighbor] = false;
        }
    }

    log::debug!(
        "Selected {} of {} network vertices",
        selection.len(),
        n
    );
    Ok(selection)
}

/// Translate a selection into full-matrix column indices: feature ids are
/// shifted by one (the class label occupies column 0) and the class column
/// itself is appended.
pub fn full_matrix_columns(selection: &[u32]) -> Vec<u32> {
    let mut columns: Vec<u32> = selection.iter().map(|&id| id + 1).collect();
    columns.push(0);
    columns
}
