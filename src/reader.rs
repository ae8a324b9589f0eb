//! Combine the element table and the twist sub-table into one [`BladeGeometry`].

use std::path::Path;

use log::info;
use serde::Deserialize;

use crate::{
    ae::{self, AeTable},
    htc::{self, TwistTable, TwistTableLayout},
    interpolate::{resample, IsMonotonic},
    BladeError, BladeGeometry, Result,
};

/// Fixed layout of the two input formats.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GeometryLayout {
    /// Header lines in front of the element rows.
    pub ae_header_lines: usize,
    /// Section count the element table must have, if known up front.
    pub expected_sections: Option<usize>,
    /// Line count the configuration file must have, if known up front.
    pub htc_lines: Option<usize>,
    pub twist: TwistTableLayout,
}

impl GeometryLayout {
    /// Describe how `content` differs from the expected line count.
    pub(crate) fn htc_line_mismatch(&self, content: &str) -> Option<String> {
        let found = content.lines().count();
        match self.htc_lines {
            Some(expected) if expected != found => {
                Some(format!("expected {expected} lines, found {found}"))
            }
            _ => None,
        }
    }
}

impl Default for GeometryLayout {
    fn default() -> Self {
        GeometryLayout {
            ae_header_lines: 2,
            expected_sections: None,
            htc_lines: None,
            twist: TwistTableLayout::default(),
        }
    }
}

/// Read the baseline geometry from an element table and a configuration file.
///
/// Twist is resampled from the configuration file's radius grid onto the
/// element table's radius grid.
pub fn read_geometry(ae_path: &Path, htc_path: &Path, layout: &GeometryLayout) -> Result<BladeGeometry> {
    let table = ae::read_ae_file(ae_path, layout.ae_header_lines)?;
    let htc_content =
        std::fs::read_to_string(htc_path).map_err(|e| BladeError::io(htc_path, e))?;
    if let Some(message) = layout.htc_line_mismatch(&htc_content) {
        return Err(BladeError::malformed(htc_path, 0, message));
    }
    let twist = htc::parse_twist_table(&htc_content, htc_path, &layout.twist)?;
    let geometry = reconcile(table, &twist, ae_path, htc_path, layout)?;
    info!(
        "read {} sections from {} and {} (R = {} m)",
        geometry.len(),
        ae_path.display(),
        htc_path.display(),
        geometry.max_radius()
    );
    Ok(geometry)
}

/// Build the geometry from already parsed tables.
pub fn reconcile(
    table: AeTable,
    twist: &TwistTable,
    ae_path: &Path,
    htc_path: &Path,
    layout: &GeometryLayout,
) -> Result<BladeGeometry> {
    let header_line = layout.ae_header_lines;
    if table.is_empty() {
        return Err(BladeError::malformed(ae_path, header_line, "no element rows"));
    }
    if let Some(expected) = layout.expected_sections {
        if table.len() != expected {
            return Err(BladeError::malformed(
                ae_path,
                0,
                format!("expected {expected} sections, found {}", table.len()),
            ));
        }
    }
    if let Some(declared) = table.declared_rows {
        if table.len() != declared {
            return Err(BladeError::malformed(
                ae_path,
                header_line,
                format!("header declares {declared} rows, found {}", table.len()),
            ));
        }
    }
    if table.len() > 1 && !table.radius.is_strict_rising() {
        return Err(BladeError::malformed(
            ae_path,
            0,
            "radius must be strict monotonic rising",
        ));
    }

    let twist_on_ae = resample(&twist.radius, &twist.twist, &table.radius).map_err(|e| {
        BladeError::malformed(
            htc_path,
            layout.twist.start_line + 1,
            format!("twist table: {e}"),
        )
    })?;

    let AeTable {
        radius,
        chord,
        rel_thickness,
        ..
    } = table;
    BladeGeometry::new(radius, twist_on_ae, chord, rel_thickness)
        .map_err(|e| BladeError::malformed(ae_path, 0, e.to_string()))
}
