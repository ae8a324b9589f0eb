//! Flat-file artifacts of a design: the finalized geometry (`.geo`) and the
//! baseline comparison table used for plotting.

use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};
use log::info;
use ndarray::{stack, Array2, Axis};
use ndarray_csv::{Array2Reader, Array2Writer};

use crate::{BladeError, BladeGeometry, Result};

const GEO_HEADER: [&str; 4] = ["radius", "twist", "chord", "rel_thickness"];
const COMPARISON_HEADER: [&str; 7] = [
    "r_R",
    "chord_baseline",
    "chord_design",
    "twist_baseline",
    "twist_design",
    "rel_thickness_baseline",
    "rel_thickness_design",
];

fn csv_error(path: &Path, err: csv::Error) -> BladeError {
    BladeError::io(path, err.into())
}

fn write_table(path: &Path, header: &[&str], data: &Array2<f64>) -> Result<()> {
    // the header row is written by hand, rows are plain number sequences
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .delimiter(b'\t')
        .from_path(path)
        .map_err(|e| csv_error(path, e))?;
    writer.write_record(header).map_err(|e| csv_error(path, e))?;
    writer.serialize_array2(data).map_err(|e| csv_error(path, e))?;
    writer.flush().map_err(|e| BladeError::io(path, e))
}

/// Save the geometry as a tab separated `radius twist chord rel_thickness` table.
pub fn save_geo(path: &Path, geometry: &BladeGeometry) -> Result<()> {
    write_table(path, &GEO_HEADER, &geometry.geo_matrix())?;
    info!("saved {} sections to {}", geometry.len(), path.display());
    Ok(())
}

/// Load a geometry saved with [`save_geo`].
pub fn load_geo(path: &Path) -> Result<BladeGeometry> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .delimiter(b'\t')
        .from_path(path)
        .map_err(|e| csv_error(path, e))?;

    let mat: Array2<f64> = reader
        .deserialize_array2_dynamic()
        .map_err(|e| BladeError::malformed(path, 0, e.to_string()))?;
    BladeGeometry::from_geo_matrix(&mat).map_err(|e| BladeError::malformed(path, 0, e.to_string()))
}

/// Save baseline and design columns side by side over `r/R`.
pub fn save_comparison(path: &Path, baseline: &BladeGeometry, design: &BladeGeometry) -> Result<()> {
    if baseline.radius() != design.radius() {
        return Err(BladeError::Configuration(
            "baseline and design must share the same sections".into(),
        ));
    }
    let r = baseline.normalized_radius();
    let columns = [
        r.view(),
        baseline.chord(),
        design.chord(),
        baseline.twist(),
        design.twist(),
        baseline.rel_thickness(),
        design.rel_thickness(),
    ];
    let table = stack(Axis(1), &columns).map_err(|e| BladeError::Configuration(e.to_string()))?;
    write_table(path, &COMPARISON_HEADER, &table)?;
    info!("saved comparison to {}", path.display());
    Ok(())
}
