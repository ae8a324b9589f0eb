//! TOML run configuration.
//!
//! ```toml
//! design_name = "WDR_10_MW"
//!
//! [baseline]
//! ae_file = "data/DTU_10MW_RWT_ae.dat"
//! htc_file = "DTU_10MW_rigid_hawc2s.htc"
//!
//! [layout]
//! ae_header_lines = 2
//! [layout.twist]
//! start_line = 110
//! rows = 27
//!
//! [[modifier]]
//! kind = "linear_root_chord"
//! amount = -1.0
//! threshold = 0.25
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{
    modifier::ModifierStack, reader::GeometryLayout, simulation::SimulationConfig, BladeError,
    Result,
};

/// Top-level run configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    /// Identifier of the new design, used in every derived file name.
    pub design_name: String,
    pub baseline: BaselineConfig,
    #[serde(default)]
    pub layout: GeometryLayout,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub simulation: Option<SimulationConfig>,
    /// Modifiers in the order they are applied.
    #[serde(default, rename = "modifier")]
    pub modifiers: ModifierStack,
}

/// Reference blade files; never written to.
#[derive(Debug, Clone, Deserialize)]
pub struct BaselineConfig {
    pub ae_file: PathBuf,
    pub htc_file: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving `<design>.htc` and the other artifacts.
    pub directory: PathBuf,
    /// Element table directory, relative to `directory`, as referenced from the `.htc` file.
    pub ae_dir: String,
    /// Save the finalized geometry as `<design>.geo`.
    pub save_design: bool,
    /// Save `<design>_comparison.csv` against the baseline.
    pub comparison: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            directory: PathBuf::from("."),
            ae_dir: "data".into(),
            save_design: true,
            comparison: true,
        }
    }
}

impl RunConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: RunConfig =
            toml::from_str(content).map_err(|e| BladeError::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let name = self.design_name.trim();
        if name.is_empty() || name.contains(['/', '\\']) {
            return Err(BladeError::Configuration(format!(
                "design_name must be a plain file stem, got `{}`",
                self.design_name
            )));
        }
        if let Some(sim) = &self.simulation {
            if sim.program.trim().is_empty() {
                return Err(BladeError::Configuration(
                    "simulation.program must not be empty".into(),
                ));
            }
        }
        Ok(())
    }

    /// Make relative paths relative to `base` instead of the working directory.
    pub fn resolve_relative_to(&mut self, base: &Path) {
        fn resolve(path: &mut PathBuf, base: &Path) {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        resolve(&mut self.baseline.ae_file, base);
        resolve(&mut self.baseline.htc_file, base);
        resolve(&mut self.output.directory, base);
        if let Some(dir) = self.simulation.as_mut().and_then(|s| s.working_dir.as_mut()) {
            resolve(dir, base);
        }
    }

    /// The `.htc` file of the new design.
    pub fn design_htc_path(&self) -> PathBuf {
        self.output
            .directory
            .join(format!("{}.htc", self.design_name))
    }

    /// The element table of the new design.
    pub fn design_ae_path(&self) -> PathBuf {
        self.output
            .directory
            .join(&self.output.ae_dir)
            .join(self.ae_file_name())
    }

    /// How the new `.htc` file refers to its element table.
    pub fn ae_reference(&self) -> String {
        format!("./{}/{}", self.output.ae_dir, self.ae_file_name())
    }

    pub fn geo_path(&self) -> PathBuf {
        self.output
            .directory
            .join(format!("{}.geo", self.design_name))
    }

    pub fn comparison_path(&self) -> PathBuf {
        self.output
            .directory
            .join(format!("{}_comparison.csv", self.design_name))
    }

    fn ae_file_name(&self) -> String {
        format!("{}_ae.dat", self.design_name)
    }
}

/// Load a run configuration file. Relative paths inside it are taken
/// relative to the file's directory.
pub fn load_config(path: &Path) -> Result<RunConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| BladeError::io(path, e))?;
    let mut config = RunConfig::from_toml(&content)?;
    if let Some(dir) = path.parent() {
        config.resolve_relative_to(dir);
    }
    Ok(config)
}
