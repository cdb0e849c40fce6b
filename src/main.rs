use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};

use correlation_network_selector::cluster::detection::ExternalProcessDetector;
use correlation_network_selector::cluster::{quality, ClusteringQuality};
use correlation_network_selector::config::{self, Config};
use correlation_network_selector::data::{csv, CorrelationEngine, Dataset, LabelBinarizer};
use correlation_network_selector::graph::{CorrelationGraph, NetworkBuilder};
use correlation_network_selector::{select, storage};

#[derive(Parser, Debug)]
#[clap(
    name = "correlation-network-selector",
    about = "Feature selection over feature correlation networks"
)]
struct Cli {
    #[clap(subcommand)]
    command: Action,

    /// Number of worker threads (0 = use all available cores)
    #[clap(long, default_value = "0")]
    threads: usize,

    /// Verbose logging
    #[clap(long, short)]
    verbose: bool,
}

#[derive(Parser, Debug)]
struct DatasetArgs {
    /// Path to the input CSV dataset
    #[clap(long)]
    input: PathBuf,

    /// Input uses the transposed layout (rows are attributes, the header
    /// carries per-instance class labels)
    #[clap(long)]
    transposed: bool,

    /// Class label mapped to 0 (inferred from the data when omitted)
    #[clap(long)]
    label_zero: Option<String>,

    /// Class label mapped to 1 (inferred from the data when omitted)
    #[clap(long)]
    label_one: Option<String>,
}

#[derive(Parser, Debug)]
struct NetworkArgs {
    /// Minimum |classRelevance| for an attribute to enter the network
    #[clap(long, default_value = "0.05")]
    relevance_threshold: f64,

    /// Keep edges with |correlation| at or above this value instead of
    /// growing until the network is connected
    #[clap(long)]
    correlation_threshold: Option<f64>,
}

#[derive(Parser, Debug)]
struct DetectorArgs {
    /// Command line that runs the external community detector
    #[clap(long, default_value = "python clusterer.py")]
    detector_command: String,

    /// Working directory shared with the community detector
    #[clap(long, default_value = ".")]
    workdir: PathBuf,

    /// Bounded wait for the community detector, in seconds
    #[clap(long, default_value = "300")]
    timeout_secs: u64,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Select representative features without community detection
    Select {
        #[clap(flatten)]
        dataset: DatasetArgs,

        #[clap(flatten)]
        network: NetworkArgs,

        /// Output selection file (featureId,featureName per line)
        #[clap(long, default_value = "selection.cfg")]
        output: PathBuf,
    },

    /// Export the correlation network for an external collaborator
    Export {
        #[clap(flatten)]
        dataset: DatasetArgs,

        #[clap(flatten)]
        network: NetworkArgs,

        /// Output network file
        #[clap(long, default_value = "fcn.net")]
        output: PathBuf,
    },

    /// Run community detection and score every partition variant
    Analyze {
        #[clap(flatten)]
        dataset: DatasetArgs,

        #[clap(flatten)]
        network: NetworkArgs,

        #[clap(flatten)]
        detector: DetectorArgs,

        /// Output JSON summary
        #[clap(long, default_value = "quality_summary.json")]
        output: PathBuf,
    },

    /// Sweep the relevance threshold and report per-variant quality
    Sweep {
        #[clap(flatten)]
        dataset: DatasetArgs,

        #[clap(flatten)]
        detector: DetectorArgs,

        /// Relevance-threshold increment
        #[clap(long, default_value = "0.01")]
        step: f64,
    },

    /// Restrict a dataset to the attributes listed in a selection file
    Subset {
        #[clap(flatten)]
        dataset: DatasetArgs,

        /// Selection file to apply
        #[clap(long)]
        selection: PathBuf,

        /// Output CSV in the instance-rows layout
        #[clap(long)]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let args = Cli::parse();

    // Configure logging
    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp_millis()
        .init();

    // Set number of threads
    let num_threads = if args.threads > 0 {
        args.threads
    } else {
        num_cpus::get()
    };

    log::info!("Using {} worker threads", num_threads);
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()?;

    match args.command {
        Action::Select {
            dataset,
            network,
            output,
        } => {
            let (ds, graph) = build_network(&dataset, &network)?;
            graph.log_summary();

            let selection = select::select_representatives(&graph)?;
            storage::save_selection(&selection, ds.catalog(), &output)?;
        }

        Action::Export {
            dataset,
            network,
            output,
        } => {
            let (_, graph) = build_network(&dataset, &network)?;
            graph.log_summary();
            storage::save_network(&graph, &output)?;
            log::info!("Network exported to {}", output.display());
        }

        Action::Analyze {
            dataset,
            network,
            detector,
            output,
        } => {
            let (_, graph) = build_network(&dataset, &network)?;
            graph.log_summary();

            let results = score_variants(&graph, &detector)?;
            for (variant, quality) in &results {
                log::info!(
                    "{variant}: {} clusters, ps = {:.4}, significant = {}, quality = {:.4}",
                    quality.num_clusters,
                    quality.superiority,
                    quality.significant,
                    quality.quality_value()
                );
            }
            storage::save_quality_summary(&results, &graph, &output)?;
        }

        Action::Sweep { dataset, detector, step } => {
            sweep(&dataset, &detector, step)?;
        }

        Action::Subset {
            dataset,
            selection,
            output,
        } => {
            let ds = load_dataset(&dataset)?;
            let names: Vec<String> = storage::load_selection(&selection)?
                .into_iter()
                .map(|(_, name)| name)
                .collect();
            csv::write_subset(&ds, &names, &output)?;
        }
    }

    log::info!("Done");
    Ok(())
}

fn load_dataset(args: &DatasetArgs) -> Result<Dataset> {
    let dataset = if args.transposed {
        csv::load_transposed(&args.input)?
    } else {
        csv::load_instance_rows(&args.input)?
    };
    dataset.describe();
    Ok(dataset)
}

fn binarizer(args: &DatasetArgs, dataset: &Dataset) -> Result<LabelBinarizer> {
    match (&args.label_zero, &args.label_one) {
        (Some(zero), Some(one)) => Ok(LabelBinarizer::two_class(zero, one)),
        (None, None) => Ok(LabelBinarizer::infer(dataset.labels())?),
        _ => anyhow::bail!("--label-zero and --label-one must be given together"),
    }
}

fn build_network(
    dataset_args: &DatasetArgs,
    network_args: &NetworkArgs,
) -> Result<(Dataset, CorrelationGraph)> {
    let mut dataset = load_dataset(dataset_args)?;
    let binarizer = binarizer(dataset_args, &dataset)?;
    let report = CorrelationEngine::analyze(&mut dataset, &binarizer)?;

    let mut builder = NetworkBuilder::new(
        dataset.catalog(),
        &report.pairs,
        network_args.relevance_threshold,
    )?;
    match network_args.correlation_threshold {
        Some(t) => builder.grow_to_threshold(t)?,
        None => builder.grow_until_connected()?,
    }

    Ok((dataset, builder.finish()))
}

fn score_variants(
    graph: &CorrelationGraph,
    detector_args: &DetectorArgs,
) -> Result<Vec<(String, ClusteringQuality)>> {
    let cfg = Config::default();
    let detector = ExternalProcessDetector::from_command_line(
        &detector_args.detector_command,
        &detector_args.workdir,
        &cfg.network_file,
        &config::partition_file(config::DETECTOR_VARIANTS[0]),
        Duration::from_secs(detector_args.timeout_secs),
    )?;

    let partition_files: Vec<String> = config::DETECTOR_VARIANTS
        .iter()
        .map(|v| config::partition_file(v))
        .collect();
    let partitions = detector.partition_all(graph, &partition_files)?;

    let mut results = Vec::with_capacity(partitions.len());
    for (variant, partition) in config::DETECTOR_VARIANTS.iter().zip(partitions) {
        results.push((variant.to_string(), quality::analyze(graph, &partition)?));
    }
    Ok(results)
}

fn sweep(dataset_args: &DatasetArgs, detector_args: &DetectorArgs, step: f64) -> Result<()> {
    anyhow::ensure!(step > 0.0, "sweep step must be positive");

    let mut dataset = load_dataset(dataset_args)?;
    let binarizer = binarizer(dataset_args, &dataset)?;
    let report = CorrelationEngine::analyze(&mut dataset, &binarizer)?;

    println!("threshold,nodes,links,variant,clusters,ps,significant,quality");
    let mut threshold = 0.0;
    while threshold < 1.0 {
        let mut builder = NetworkBuilder::new(dataset.catalog(), &report.pairs, threshold)?;
        builder.grow_until_connected()?;
        let graph = builder.finish();
        if graph.edge_count() == 0 {
            break;
        }

        let results = score_variants(&graph, detector_args)?;
        for (variant, quality) in &results {
            println!(
                "{},{},{},{},{},{},{},{}",
                threshold,
                graph.vertex_count(),
                graph.edge_count(),
                variant,
                quality.num_clusters,
                quality.superiority,
                quality.significant,
                quality.quality_value()
            );
        }

        threshold += step;
    }

    Ok(())
}
