//! File formats at the system boundaries.
//!
//! Three line-oriented formats are exchanged with external collaborators:
//! the network export (vertices, a literal `links` separator, edges), the
//! selection files (`featureId,featureName` per line, feature ids 0-based
//! against non-class attributes), and the partition files produced by the
//! community detector (modularity, cluster count, then one assignment per
//! line). A JSON quality summary is written for human consumption.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use log;
use serde_json::{json, to_string_pretty};

use crate::cluster::{ClusteringQuality, Partition};
use crate::data::{Attribute, AttributeCatalog};
use crate::error::{FcnError, Result};
use crate::graph::CorrelationGraph;

/// Separator between the vertex and edge sections of a network file.
const LINKS_SEPARATOR: &str = "links";

/// Write the network export: one `id,name,classRelevance` line per vertex,
/// the `links` separator, then one `id1,id2,correlation` line per edge.
pub fn save_network(graph: &CorrelationGraph, path: &Path) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);

    for vertex in graph.vertices() {
        writeln!(out, "{},{},{}", vertex.id, vertex.name, vertex.class_relevance)?;
    }
    writeln!(out, "{LINKS_SEPARATOR}")?;
    for edge in graph.edges() {
        writeln!(
            out,
            "{},{},{}",
            graph.vertex(edge.a).id,
            graph.vertex(edge.b).id,
            edge.correlation
        )?;
    }
    out.flush()?;

    log::debug!(
        "Exported network with {} vertices and {} edges to {}",
        graph.vertex_count(),
        graph.edge_count(),
        path.display()
    );
    Ok(())
}

/// Parse a network export back into a graph. Vertex and edge sets round-
/// trip exactly; the growth bookkeeping (`min_observed_correlation`)
/// reflects file order rather than the original construction.
pub fn load_network(path: &Path) -> Result<CorrelationGraph> {
    let file_name = path.display().to_string();
    let content = fs::read_to_string(path)?;

    let mut vertices: Vec<Attribute> = Vec::new();
    let mut in_links = false;
    let mut edge_lines: Vec<&str> = Vec::new();
    for line in content.lines() {
        if line.is_empty() {
            continue;
        }
        if !in_links && line == LINKS_SEPARATOR {
            in_links = true;
            continue;
        }
        if in_links {
            edge_lines.push(line);
            continue;
        }

        let tokens: Vec<&str> = line.split(',').collect();
        if tokens.len() != 3 {
            return Err(FcnError::parse(&file_name, line, "expected id,name,relevance"));
        }
        let id: u32 = tokens[0]
            .parse()
            .map_err(|_| FcnError::parse(&file_name, line, "invalid vertex id"))?;
        let relevance: f64 = tokens[2]
            .parse()
            .map_err(|_| FcnError::parse(&file_name, line, "invalid relevance score"))?;

        let mut attribute = Attribute::new(id, tokens[1]);
        attribute.class_relevance = relevance;
        vertices.push(attribute);
    }

    if !in_links {
        return Err(FcnError::parse(
            &file_name,
            "",
            "missing 'links' separator line",
        ));
    }

    let mut graph = CorrelationGraph::with_vertices(vertices);
    for line in edge_lines {
        let tokens: Vec<&str> = line.split(',').collect();
        if tokens.len() != 3 {
            return Err(FcnError::parse(&file_name, line, "expected id1,id2,correlation"));
        }
        let id1: u32 = tokens[0]
            .parse()
            .map_err(|_| FcnError::parse(&file_name, line, "invalid endpoint id"))?;
        let id2: u32 = tokens[1]
            .parse()
            .map_err(|_| FcnError::parse(&file_name, line, "invalid endpoint id"))?;
        let correlation: f64 = tokens[2]
            .parse()
            .map_err(|_| FcnError::parse(&file_name, line, "invalid correlation"))?;

        let (Some(a), Some(b)) = (graph.index_of_id(id1), graph.index_of_id(id2)) else {
            return Err(FcnError::DataIntegrity(format!(
                "edge {id1}-{id2} references a vertex missing from {file_name}"
            )));
        };
        graph.add_edge(a, b, correlation);
    }

    Ok(graph)
}

/// Write a selection file: one `featureId,featureName` line per selected
/// attribute, in selection order. Consumers add 1 to each id and append
/// the class column (index 0) themselves.
pub fn save_selection(selection: &[u32], catalog: &AttributeCatalog, path: &Path) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    for &id in selection {
        let attribute = catalog.get(id).ok_or_else(|| {
            FcnError::DataIntegrity(format!("selection references unknown attribute id {id}"))
        })?;
        writeln!(out, "{},{}", attribute.id, attribute.name)?;
    }
    out.flush()?;

    log::info!("Wrote {} selected features to {}", selection.len(), path.display());
    Ok(())
}

/// Parse a selection file into `(featureId, featureName)` pairs.
pub fn load_selection(path: &Path) -> Result<Vec<(u32, String)>> {
    let file_name = path.display().to_string();
    let content = fs::read_to_string(path)?;

    let mut selection = Vec::new();
    for line in content.lines() {
        if line.is_empty() {
            continue;
        }
        let tokens: Vec<&str> = line.split(',').collect();
        if tokens.len() != 2 {
            return Err(FcnError::parse(&file_name, line, "expected featureId,featureName"));
        }
        let id: u32 = tokens[0]
            .parse()
            .map_err(|_| FcnError::parse(&file_name, line, "invalid feature id"))?;
        selection.push((id, tokens[1].to_string()));
    }

    Ok(selection)
}

/// Parse a partition file: line 1 modularity, line 2 cluster count, then
/// `someId,attributeName,clusterId` per remaining line.
pub fn load_partition(path: &Path) -> Result<Partition> {
    let file_name = path.display().to_string();
    let content = fs::read_to_string(path)?;
    let mut lines = content.lines();

    let modularity: f64 = lines
        .next()
        .ok_or_else(|| FcnError::parse(&file_name, "", "missing modularity line"))?
        .trim()
        .parse()
        .map_err(|_| FcnError::parse(&file_name, "", "invalid modularity value"))?;
    let declared_clusters: usize = lines
        .next()
        .ok_or_else(|| FcnError::parse(&file_name, "", "missing cluster count line"))?
        .trim()
        .parse()
        .map_err(|_| FcnError::parse(&file_name, "", "invalid cluster count"))?;

    let mut assignments = HashMap::new();
    for line in lines {
        if line.is_empty() {
            continue;
        }
        let tokens: Vec<&str> = line.split(',').collect();
        if tokens.len() != 3 {
            return Err(FcnError::parse(
                &file_name,
                line,
                "expected id,attributeName,clusterId",
            ));
        }
        assignments.insert(tokens[1].to_string(), tokens[2].to_string());
    }

    Ok(Partition::new(modularity, declared_clusters, assignments))
}

/// Write the per-variant clustering-quality summary as pretty JSON.
pub fn save_quality_summary(
    results: &[(String, ClusteringQuality)],
    graph: &CorrelationGraph,
    path: &Path,
) -> Result<()> {
    let mut variants = serde_json::Map::new();
    for (name, quality) in results {
        variants.insert(
            name.clone(),
            json!({
                "quality": quality,
                "quality_value": quality.quality_value(),
            }),
        );
    }

    let summary = json!({
        "network": {
            "vertex_count": graph.vertex_count(),
            "edge_count": graph.edge_count(),
            "avg_degree": graph.average_degree(),
            "min_observed_correlation": graph.min_observed_correlation(),
        },
        "variants": variants,
    });

    let mut file = File::create(path)?;
    file.write_all(to_string_pretty(&summary)?.as_bytes())?;

    log::info!("Saved clustering quality summary to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::AttributePair;
    use crate::graph::NetworkBuilder;

    fn network() -> CorrelationGraph {
        let mut catalog = AttributeCatalog::from_names(&["alpha", "beta", "gamma"]).unwrap();
        catalog.set_relevance(0, 0.9);
        catalog.set_relevance(1, -0.8);
        catalog.set_relevance(2, 0.3);

        let pairs = vec![
            AttributePair::new(0, 1, 0.9),
            AttributePair::new(0, 2, -0.5),
        ];
        let mut builder = NetworkBuilder::new(&catalog, &pairs, 0.05).unwrap();
        builder.grow_until_connected().unwrap();
        builder.finish()
    }

    #[test]
    fn network_export_round_trips() {
        let graph = network();
        let file = tempfile::NamedTempFile::new().unwrap();
        save_network(&graph, file.path()).unwrap();

        let loaded = load_network(file.path()).unwrap();
        assert_eq!(loaded.vertex_count(), graph.vertex_count());
        assert_eq!(loaded.edge_count(), graph.edge_count());
        for (orig, read) in graph.vertices().iter().zip(loaded.vertices()) {
            assert_eq!(orig.id, read.id);
            assert_eq!(orig.name, read.name);
            assert_eq!(orig.class_relevance, read.class_relevance);
        }
        for (orig, read) in graph.edges().iter().zip(loaded.edges()) {
            assert_eq!(graph.vertex(orig.a).id, loaded.vertex(read.a).id);
            assert_eq!(graph.vertex(orig.b).id, loaded.vertex(read.b).id);
            assert_eq!(orig.correlation, read.correlation);
        }
    }

    #[test]
    fn malformed_vertex_line_is_a_parse_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        fs::write(file.path(), "0,alpha\nlinks\n").unwrap();
        assert!(matches!(
            load_network(file.path()),
            Err(FcnError::Parse { .. })
        ));
    }

    #[test]
    fn edge_with_unknown_vertex_is_an_integrity_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        fs::write(file.path(), "0,alpha,0.9\nlinks\n0,7,0.5\n").unwrap();
        assert!(matches!(
            load_network(file.path()),
            Err(FcnError::DataIntegrity(_))
        ));
    }

    #[test]
    fn selection_file_round_trips() {
        let mut catalog = AttributeCatalog::from_names(&["alpha", "beta", "gamma"]).unwrap();
        catalog.set_relevance(0, 0.9);

        let file = tempfile::NamedTempFile::new().unwrap();
        save_selection(&[2, 0], &catalog, file.path()).unwrap();

        let selection = load_selection(file.path()).unwrap();
        assert_eq!(
            selection,
            vec![(2, "gamma".to_string()), (0, "alpha".to_string())]
        );
    }

    #[test]
    fn partition_file_parses_header_and_assignments() {
        let file = tempfile::NamedTempFile::new().unwrap();
        fs::write(file.path(), "0.35\n2\n0,alpha,0\n1,beta,0\n2,gamma,1\n").unwrap();

        let partition = load_partition(file.path()).unwrap();
        assert_eq!(partition.modularity(), 0.35);
        assert_eq!(partition.declared_clusters(), 2);
        assert_eq!(partition.len(), 3);
        assert_eq!(partition.cluster_of("gamma"), Some("1"));
    }

    #[test]
    fn partition_line_with_wrong_arity_is_a_parse_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        fs::write(file.path(), "0.35\n1\nalpha,0\n").unwrap();
        assert!(matches!(
            load_partition(file.path()),
            Err(FcnError::Parse { .. })
        ));
    }
}
