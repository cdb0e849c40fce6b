//! Boundary to the external community-detection collaborator.
//!
//! The core serializes the network to a file, invokes an external process
//! in a working directory, and parses the partition file(s) the process
//! leaves behind. Success requires exit code 0 and the literal `OK` as the
//! first line of the process output; anything else is a collaborator
//! failure. The wait is bounded: a collaborator that exceeds the timeout
//! is killed and reported instead of hanging the pipeline.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use log;

use crate::cluster::Partition;
use crate::error::{FcnError, Result};
use crate::graph::CorrelationGraph;
use crate::storage;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Produces a partition of the network vertices. Implementations own the
/// invocation policy (process boundary, timeout) so graph algorithms can
/// be tested without a live collaborator.
pub trait CommunityDetector {
    fn partition(&self, network: &CorrelationGraph) -> Result<Partition>;
}

/// Community detection delegated to an external process.
pub struct ExternalProcessDetector {
    program: String,
    args: Vec<String>,
    workdir: PathBuf,
    network_file: String,
    partition_file: String,
    timeout: Duration,
}

impl ExternalProcessDetector {
    pub fn new(
        program: &str,
        args: &[String],
        workdir: &Path,
        network_file: &str,
        partition_file: &str,
        timeout: Duration,
    ) -> Self {
        Self {
            program: program.to_string(),
            args: args.to_vec(),
            workdir: workdir.to_path_buf(),
            network_file: network_file.to_string(),
            partition_file: partition_file.to_string(),
            timeout,
        }
    }

    /// Parse a whitespace-separated command line (`python clusterer.py`)
    /// into program and arguments.
    pub fn from_command_line(
        command: &str,
        workdir: &Path,
        network_file: &str,
        partition_file: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let mut tokens = command.split_whitespace();
        let program = tokens.next().ok_or_else(|| {
            FcnError::Configuration("empty community-detector command".to_string())
        })?;
        let args: Vec<String> = tokens.map(str::to_string).collect();
        Ok(Self::new(
            program,
            &args,
            workdir,
            network_file,
            partition_file,
            timeout,
        ))
    }

    /// Export the network and run the collaborator once.
    fn run(&self, network: &CorrelationGraph) -> Result<()> {
        let network_path = self.workdir.join(&self.network_file);
        storage::save_network(network, &network_path)?;

        log::info!(
            "Invoking community detector: {} {}",
            self.program,
            self.args.join(" ")
        );

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .current_dir(&self.workdir)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                FcnError::Collaborator(format!("failed to spawn '{}': {e}", self.program))
            })?;

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait()? {
                Some(status) => break status,
                None if Instant::now() >= deadline => {
                    child.kill().ok();
                    child.wait().ok();
                    return Err(FcnError::Collaborator(format!(
                        "community detector exceeded the {}s timeout",
                        self.timeout.as_secs()
                    )));
                }
                None => std::thread::sleep(POLL_INTERVAL),
            }
        };

        if !status.success() {
            return Err(FcnError::Collaborator(format!(
                "community detector exited with {status}"
            )));
        }

        let mut output = String::new();
        if let Some(mut stdout) = child.stdout.take() {
            stdout.read_to_string(&mut output)?;
        }
        let first_line = output.lines().next().unwrap_or("");
        if first_line != "OK" {
            return Err(FcnError::Collaborator(format!(
                "community detector reported '{first_line}' instead of OK"
            )));
        }

        Ok(())
    }

    /// Run the collaborator once and parse several partition files it
    /// produced (one per detection variant).
    pub fn partition_all(
        &self,
        network: &CorrelationGraph,
        partition_files: &[String],
    ) -> Result<Vec<Partition>> {
        self.run(network)?;
        partition_files
            .iter()
            .map(|f| storage::load_partition(&self.workdir.join(f)))
            .collect()
    }
}

impl CommunityDetector for ExternalProcessDetector {
    fn partition(&self, network: &CorrelationGraph) -> Result<Partition> {
        self.run(network)?;
        storage::load_partition(&self.workdir.join(&self.partition_file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{AttributeCatalog, AttributePair};
    use crate::graph::NetworkBuilder;

    fn small_network() -> CorrelationGraph {
        let mut catalog = AttributeCatalog::from_names(&["a0", "a1"]).unwrap();
        catalog.set_relevance(0, 0.9);
        catalog.set_relevance(1, 0.8);
        let pairs = vec![AttributePair::new(0, 1, 0.7)];
        let mut builder = NetworkBuilder::new(&catalog, &pairs, 0.05).unwrap();
        builder.grow_until_connected().unwrap();
        builder.finish()
    }

    fn detector(dir: &Path, script: &str) -> ExternalProcessDetector {
        // the fake collaborator is a shell one-liner
        ExternalProcessDetector::new(
            "sh",
            &["-c".to_string(), script.to_string()],
            dir,
            "fcn.net",
            "out.cl",
            Duration::from_secs(5),
        )
    }

    #[test]
    fn successful_collaborator_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let script = "printf '0.42\\n2\\n0,a0,1\\n1,a1,2\\n' > out.cl && echo OK";
        let d = detector(dir.path(), script);

        let partition = d.partition(&small_network()).unwrap();
        assert_eq!(partition.modularity(), 0.42);
        assert_eq!(partition.declared_clusters(), 2);
        assert_eq!(partition.cluster_of("a0"), Some("1"));
        assert_eq!(partition.cluster_of("a1"), Some("2"));

        // the exported network file is present for the collaborator
        assert!(dir.path().join("fcn.net").exists());
    }

    #[test]
    fn nonzero_exit_is_a_collaborator_failure() {
        let dir = tempfile::tempdir().unwrap();
        let d = detector(dir.path(), "echo OK && exit 3");
        assert!(matches!(
            d.partition(&small_network()),
            Err(FcnError::Collaborator(_))
        ));
    }

    #[test]
    fn missing_ok_line_is_a_collaborator_failure() {
        let dir = tempfile::tempdir().unwrap();
        let script = "printf '0.1\\n1\\n0,a0,1\\n1,a1,1\\n' > out.cl && echo NOPE";
        let d = detector(dir.path(), script);
        assert!(matches!(
            d.partition(&small_network()),
            Err(FcnError::Collaborator(_))
        ));
    }

    #[test]
    fn slow_collaborator_hits_the_bounded_wait() {
        let dir = tempfile::tempdir().unwrap();
        let mut d = detector(dir.path(), "sleep 30 && echo OK");
        d.timeout = Duration::from_millis(200);

        let start = Instant::now();
        let err = d.partition(&small_network()).unwrap_err();
        assert!(matches!(err, FcnError::Collaborator(_)));
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}
