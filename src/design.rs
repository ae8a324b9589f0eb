//! One design iteration: read the baseline, modify it, write the new design
//! files, run the solver and keep the artifacts.

use std::{fs, path::Path};

use log::{info, warn};

use crate::{
    bundle,
    config::RunConfig,
    reader::read_geometry,
    simulation::{DesignFiles, SimulationAdapter, SimulationOutputs},
    writer::write_geometry,
    BladeError, BladeGeometry, Result,
};

/// Baseline and modified geometry of one design.
#[derive(Debug, Clone, PartialEq)]
pub struct DesignGeometry {
    pub baseline: BladeGeometry,
    pub design: BladeGeometry,
}

/// A design whose files have been written.
#[derive(Debug, Clone, PartialEq)]
pub struct WrittenDesign {
    pub geometry: DesignGeometry,
    pub files: DesignFiles,
}

/// Read the baseline and apply the configured modifiers.
pub fn build_design(config: &RunConfig) -> Result<DesignGeometry> {
    let baseline = read_geometry(
        &config.baseline.ae_file,
        &config.baseline.htc_file,
        &config.layout,
    )?;
    let design = config.modifiers.apply(&baseline)?;
    design.warn_implausible(&config.design_name);
    Ok(DesignGeometry { baseline, design })
}

fn copy(from: &Path, to: &Path) -> Result<()> {
    if let Some(dir) = to.parent() {
        fs::create_dir_all(dir).map_err(|e| BladeError::io(dir, e))?;
    }
    fs::copy(from, to).map_err(|e| BladeError::io(from, e))?;
    Ok(())
}

/// Build the design and write it next to the baseline files under the
/// design's own name. The baseline files are only read.
pub fn write_design(config: &RunConfig) -> Result<WrittenDesign> {
    let geometry = build_design(config)?;

    let files = DesignFiles {
        name: config.design_name.clone(),
        ae_path: config.design_ae_path(),
        htc_path: config.design_htc_path(),
    };
    if files.ae_path == config.baseline.ae_file || files.htc_path == config.baseline.htc_file {
        return Err(BladeError::Configuration(format!(
            "design `{}` would overwrite the baseline files",
            files.name
        )));
    }

    // the working copies must keep the baseline's shape until they are written
    let mut layout = config.layout.clone();
    if layout.htc_lines.is_none() {
        let baseline_htc = fs::read_to_string(&config.baseline.htc_file)
            .map_err(|e| BladeError::io(&config.baseline.htc_file, e))?;
        layout.htc_lines = Some(baseline_htc.lines().count());
    }

    copy(&config.baseline.htc_file, &files.htc_path)?;
    if let Err(e) = copy(&config.baseline.ae_file, &files.ae_path) {
        if let Err(cleanup) = fs::remove_file(&files.htc_path) {
            warn!("failed to remove {}: {cleanup}", files.htc_path.display());
        }
        return Err(e);
    }
    info!(
        "copied baseline to {} and {}",
        files.htc_path.display(),
        files.ae_path.display()
    );

    write_geometry(
        &geometry.design,
        &files.ae_path,
        &files.htc_path,
        &layout,
        &config.ae_reference(),
    )?;

    if config.output.comparison {
        bundle::save_comparison(&config.comparison_path(), &geometry.baseline, &geometry.design)?;
    }
    Ok(WrittenDesign { geometry, files })
}

/// Everything one full iteration produced.
#[derive(Debug, Clone, PartialEq)]
pub struct DesignOutcome {
    pub written: WrittenDesign,
    pub outputs: SimulationOutputs,
}

/// Write the design, simulate it and save the finalized geometry.
///
/// The geometry bundle is only saved once the solver has succeeded.
pub fn run_design(config: &RunConfig, solver: &dyn SimulationAdapter) -> Result<DesignOutcome> {
    let written = write_design(config)?;
    let outputs = solver.run(&written.files)?;
    info!(
        "design {} produced {} result files",
        outputs.design,
        outputs.files.len()
    );
    if config.output.save_design {
        bundle::save_geo(&config.geo_path(), &written.geometry.design)?;
    }
    Ok(DesignOutcome { written, outputs })
}
