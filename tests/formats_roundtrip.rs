//! End-to-end pipeline test: CSV dataset -> correlation engine -> network
//! -> export/import round trip -> selection file -> external detector ->
//! quality summary.

use std::fs;
use std::io::Write;
use std::time::Duration;

use correlation_network_selector::cluster::detection::{
    CommunityDetector, ExternalProcessDetector,
};
use correlation_network_selector::cluster::quality;
use correlation_network_selector::data::{csv, CorrelationEngine, LabelBinarizer};
use correlation_network_selector::graph::algorithms::is_connected;
use correlation_network_selector::graph::NetworkBuilder;
use correlation_network_selector::{select, storage};

const DATASET: &str = "\
CLASS,g1,g2,g3,g4
x,0,0.2,1,1
x,0,0.2,1,2
x,0,0.2,1,3
x,0,0.2,1,4
x,0,0.2,1,5
y,1,1.2,0,6
y,1,1.2,0,7
y,1,1.2,0,8
y,1,1.2,0,9
y,1,1.2,0,10
";

fn temp_dataset() -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    f.write_all(DATASET.as_bytes()).unwrap();
    f
}

#[test]
fn pipeline_from_csv_to_selection_file() {
    let input = temp_dataset();
    let mut dataset = csv::load_instance_rows(input.path()).unwrap();
    let binarizer = LabelBinarizer::infer(dataset.labels()).unwrap();
    let report = CorrelationEngine::analyze(&mut dataset, &binarizer).unwrap();

    // pair list is non-increasing in |r|
    for window in report.pairs.windows(2) {
        assert!(window[0].correlation.abs() >= window[1].correlation.abs());
    }

    // g1/g2/g3 separate the classes perfectly: 1 bit of relevance each
    for id in 0..3 {
        let r = dataset.catalog().get(id).unwrap().class_relevance;
        assert!((r - 1.0).abs() < 1e-9, "attribute {id} relevance {r}");
    }

    let mut builder = NetworkBuilder::with_default_threshold(dataset.catalog(), &report.pairs)
        .unwrap();
    builder.grow_until_connected().unwrap();
    let graph = builder.finish();

    assert!(is_connected(&graph));
    assert_eq!(graph.vertex_count(), 4);
    // the recorded minimum matches the weakest edge actually inserted
    let weakest = graph
        .edges()
        .iter()
        .map(|e| e.correlation.abs())
        .fold(f64::INFINITY, f64::min);
    assert_eq!(graph.min_observed_correlation(), Some(weakest));

    let selection = select::select_representatives(&graph).unwrap();
    assert!(!selection.is_empty());

    let out = tempfile::NamedTempFile::new().unwrap();
    storage::save_selection(&selection, dataset.catalog(), out.path()).unwrap();
    let loaded = storage::load_selection(out.path()).unwrap();
    assert_eq!(loaded.len(), selection.len());
    for ((id, name), &selected) in loaded.iter().zip(selection.iter()) {
        assert_eq!(*id, selected);
        assert_eq!(name, &dataset.catalog().get(selected).unwrap().name);
    }

    // the full-matrix translation shifts past the class column
    let columns = select::full_matrix_columns(&selection);
    assert_eq!(columns.last(), Some(&0));
    assert!(columns[..columns.len() - 1].iter().all(|&c| c >= 1));
}

#[test]
fn network_file_round_trips_bit_for_bit() {
    let input = temp_dataset();
    let mut dataset = csv::load_instance_rows(input.path()).unwrap();
    let binarizer = LabelBinarizer::two_class("x", "y");
    let report = CorrelationEngine::analyze(&mut dataset, &binarizer).unwrap();

    let mut builder = NetworkBuilder::with_default_threshold(dataset.catalog(), &report.pairs)
        .unwrap();
    builder.grow_until_connected().unwrap();
    let graph = builder.finish();

    let file = tempfile::NamedTempFile::new().unwrap();
    storage::save_network(&graph, file.path()).unwrap();
    let loaded = storage::load_network(file.path()).unwrap();

    assert_eq!(loaded.vertex_count(), graph.vertex_count());
    assert_eq!(loaded.edge_count(), graph.edge_count());
    for (orig, read) in graph.vertices().iter().zip(loaded.vertices()) {
        assert_eq!(orig.id, read.id);
        assert_eq!(orig.name, read.name);
        assert_eq!(orig.class_relevance, read.class_relevance);
    }
    for (orig, read) in graph.edges().iter().zip(loaded.edges()) {
        assert_eq!(orig.correlation, read.correlation);
    }

    // saving the re-parsed graph reproduces the file exactly
    let second = tempfile::NamedTempFile::new().unwrap();
    storage::save_network(&loaded, second.path()).unwrap();
    assert_eq!(
        fs::read_to_string(file.path()).unwrap(),
        fs::read_to_string(second.path()).unwrap()
    );
}

#[test]
fn detector_and_quality_summary_end_to_end() {
    let input = temp_dataset();
    let mut dataset = csv::load_instance_rows(input.path()).unwrap();
    let binarizer = LabelBinarizer::infer(dataset.labels()).unwrap();
    let report = CorrelationEngine::analyze(&mut dataset, &binarizer).unwrap();

    let mut builder = NetworkBuilder::with_default_threshold(dataset.catalog(), &report.pairs)
        .unwrap();
    builder.grow_until_connected().unwrap();
    let graph = builder.finish();

    // fake collaborator: puts g1,g2,g3 in one cluster, g4 in another
    let workdir = tempfile::tempdir().unwrap();
    let script = "printf '0.41\\n2\\n0,g1,0\\n1,g2,0\\n2,g3,0\\n3,g4,1\\n' > net.cl && echo OK";
    let detector = ExternalProcessDetector::new(
        "sh",
        &["-c".to_string(), script.to_string()],
        workdir.path(),
        "fcn.net",
        "net.cl",
        Duration::from_secs(10),
    );

    let partition = detector.partition(&graph).unwrap();
    assert_eq!(partition.declared_clusters(), 2);

    // the exported network file fed to the collaborator parses back
    let exported = storage::load_network(&workdir.path().join("fcn.net")).unwrap();
    assert_eq!(exported.vertex_count(), graph.vertex_count());

    let q = quality::analyze(&graph, &partition).unwrap();
    assert!((0.0..=1.0).contains(&q.superiority));
    assert!(q.quality_value() <= q.modularity);
    assert_eq!(
        q.intra_links + q.inter_links,
        graph.edge_count(),
        "every edge is classified exactly once"
    );

    let summary = tempfile::NamedTempFile::new().unwrap();
    storage::save_quality_summary(&[("wt".to_string(), q)], &graph, summary.path()).unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(summary.path()).unwrap()).unwrap();
    assert_eq!(
        json["network"]["vertex_count"],
        serde_json::json!(graph.vertex_count())
    );
    assert!(json["variants"]["wt"]["quality_value"].is_number());
}
