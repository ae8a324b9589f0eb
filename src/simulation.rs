//! Boundary to the external aeroelastic solver.
//!
//! The solver is a black box: it gets the design's files and identifier, and
//! is only considered successful when it exits cleanly and leaves every
//! expected result file behind.

use std::{
    fs, io,
    path::{Path, PathBuf},
    process::{Child, Command, ExitStatus},
    thread,
    time::{Duration, Instant},
};

use log::{debug, info, warn};
use serde::Deserialize;

use crate::{BladeError, Result, SimulationError};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A written design, ready to be simulated.
#[derive(Debug, Clone, PartialEq)]
pub struct DesignFiles {
    /// design identifier, e.g. `WDR_10_MW`
    pub name: String,
    pub ae_path: PathBuf,
    pub htc_path: PathBuf,
}

/// Result files of one simulation run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationOutputs {
    pub design: String,
    pub files: Vec<PathBuf>,
}

pub trait SimulationAdapter {
    /// Run the solver for `design` and locate its result files.
    fn run(&self, design: &DesignFiles) -> Result<SimulationOutputs>;
}

/// Solver settings of a run configuration.
///
/// `args` and `outputs` may contain `{design}`, `{htc}` and `{ae}`, which
/// are replaced by the design name and the two file paths.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimulationConfig {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Directory the solver runs in; result paths are relative to it.
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Result files the solver must produce.
    #[serde(default)]
    pub outputs: Vec<String>,
}

/// Runs the solver as a child process and waits for it.
#[derive(Debug, Clone)]
pub struct ProcessSimulation {
    config: SimulationConfig,
}

impl ProcessSimulation {
    pub fn new(config: SimulationConfig) -> Self {
        ProcessSimulation { config }
    }

    fn working_dir(&self) -> &Path {
        self.config.working_dir.as_deref().unwrap_or(Path::new("."))
    }

    fn timeout(&self) -> Option<Duration> {
        self.config.timeout_secs.map(Duration::from_secs)
    }

    /// wait for `child`, killing it once the timeout has passed
    fn wait(&self, child: &mut Child, design: &str) -> Result<ExitStatus> {
        let program = &self.config.program;
        let Some(timeout) = self.timeout() else {
            return child.wait().map_err(|e| BladeError::io(program, e));
        };
        let start = Instant::now();
        loop {
            if let Some(status) = child.try_wait().map_err(|e| BladeError::io(program, e))? {
                return Ok(status);
            }
            if start.elapsed() >= timeout {
                warn!("killing solver for {design} after {} s", timeout.as_secs());
                if let Err(e) = child.kill() {
                    warn!("failed to kill solver: {e}");
                }
                if let Err(e) = child.wait() {
                    warn!("failed to reap solver: {e}");
                }
                return Err(SimulationError::Timeout {
                    design: design.to_string(),
                    secs: timeout.as_secs(),
                }
                .into());
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl SimulationAdapter for ProcessSimulation {
    fn run(&self, design: &DesignFiles) -> Result<SimulationOutputs> {
        let args: Vec<String> = self
            .config
            .args
            .iter()
            .map(|a| substitute(a, design))
            .collect();
        info!(
            "running {} {} for design {}",
            self.config.program,
            args.join(" "),
            design.name
        );

        // results of an earlier run of the same design must not count
        let outputs: Vec<PathBuf> = self
            .config
            .outputs
            .iter()
            .map(|output| self.working_dir().join(substitute(output, design)))
            .collect();
        for path in &outputs {
            match fs::remove_file(path) {
                Ok(()) => debug!("removed stale result {}", path.display()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(BladeError::io(path, e)),
            }
        }

        let started = Instant::now();
        let mut child = Command::new(&self.config.program)
            .args(&args)
            .current_dir(self.working_dir())
            .spawn()
            .map_err(|source| SimulationError::Spawn {
                program: self.config.program.clone(),
                source,
            })?;

        let status = self.wait(&mut child, &design.name)?;
        if !status.success() {
            return Err(SimulationError::Failed {
                design: design.name.clone(),
                status: status.to_string(),
            }
            .into());
        }
        info!(
            "solver finished for {} in {:.1} s",
            design.name,
            started.elapsed().as_secs_f64()
        );

        let mut files = Vec::with_capacity(outputs.len());
        for path in outputs {
            if !path.is_file() {
                return Err(SimulationError::MissingOutput {
                    design: design.name.clone(),
                    path,
                }
                .into());
            }
            debug!("found result {}", path.display());
            files.push(path);
        }

        Ok(SimulationOutputs {
            design: design.name.clone(),
            files,
        })
    }
}

fn substitute(template: &str, design: &DesignFiles) -> String {
    template
        .replace("{design}", &design.name)
        .replace("{htc}", &design.htc_path.to_string_lossy())
        .replace("{ae}", &design.ae_path.to_string_lossy())
}
