//! Configuration for the feature selection pipeline

/// Community-detection variants the external collaborator computes in one
/// invocation. Each variant leaves one selection file and one partition
/// file behind.
pub const DETECTOR_VARIANTS: [&str; 4] = ["wt", "fg", "lv", "im"];

/// Selection file written by the collaborator for a variant.
pub fn selection_file(variant: &str) -> String {
    format!("{variant}.cfg")
}

/// Partition file written by the collaborator for a variant.
pub fn partition_file(variant: &str) -> String {
    format!("{variant}.cfg.cl")
}

/// Default configuration for the selection pipeline
pub struct Config {
    /// Minimum `|classRelevance|` for an attribute to become a vertex
    pub relevance_threshold: f64,

    /// Command line that runs the external community detector
    pub detector_command: String,

    /// Bounded wait for the community detector, in seconds
    pub detector_timeout_secs: u64,

    /// Network export file handed to the community detector
    pub network_file: String,

    /// Relevance-threshold increment for sweep runs
    pub sweep_step: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            relevance_threshold: 0.05,
            detector_command: "python clusterer.py".to_string(),
            detector_timeout_secs: 300,
            network_file: "fcn.net".to_string(),
            sweep_step: 0.01,
        }
    }
}

impl Config {
    /// Create a new configuration with custom values
    pub fn new(
        relevance_threshold: f64,
        detector_command: &str,
        detector_timeout_secs: u64,
        network_file: &str,
        sweep_step: f64,
    ) -> Self {
        Self {
            relevance_threshold,
            detector_command: detector_command.to_string(),
            detector_timeout_secs,
            network_file: network_file.to_string(),
            sweep_step,
        }
    }
}
