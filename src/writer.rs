//! Write a [`BladeGeometry`] back into working copies of the two input files.

use std::{fs, io::Write, path::Path};

use log::info;
use tempfile::NamedTempFile;

use crate::{
    ae, htc,
    interpolate::resample,
    reader::GeometryLayout,
    BladeError, BladeGeometry, Result,
};

/// Rendered content of both files.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedDesign {
    pub ae: String,
    pub htc: String,
}

/// Render both files in memory from their current content.
///
/// Twist goes back onto the radius grid of the configuration file's own
/// twist table, the inverse of the resampling done when reading.
pub fn render_geometry(
    geometry: &BladeGeometry,
    ae_content: &str,
    ae_path: &Path,
    htc_content: &str,
    htc_path: &Path,
    layout: &GeometryLayout,
    ae_reference: &str,
) -> Result<RenderedDesign> {
    let ae = ae::render_ae(ae_content, ae_path, layout.ae_header_lines, geometry)?;

    if let Some(message) = layout.htc_line_mismatch(htc_content) {
        return Err(BladeError::mismatch(htc_path, message));
    }

    let table = htc::parse_twist_table(htc_content, htc_path, &layout.twist).map_err(into_mismatch)?;
    let twist = resample(&geometry.radius(), &geometry.twist(), &table.radius).map_err(|e| {
        BladeError::mismatch(htc_path, format!("cannot map twist onto the twist table: {e}"))
    })?;
    let htc = htc::render_htc(htc_content, htc_path, &layout.twist, twist.view(), ae_reference)?;

    Ok(RenderedDesign { ae, htc })
}

/// Overwrite the working copies at `ae_path` and `htc_path` with `geometry`.
///
/// Both files are read and rendered completely, then staged next to their
/// targets and renamed into place. A file that does not match the expected
/// layout, or a failure while staging, leaves both untouched. Only a failed
/// rename of the second file after the first one succeeded leaves a new
/// element table next to the old configuration file.
pub fn write_geometry(
    geometry: &BladeGeometry,
    ae_path: &Path,
    htc_path: &Path,
    layout: &GeometryLayout,
    ae_reference: &str,
) -> Result<()> {
    let ae_content = std::fs::read_to_string(ae_path).map_err(|e| BladeError::io(ae_path, e))?;
    let htc_content = std::fs::read_to_string(htc_path).map_err(|e| BladeError::io(htc_path, e))?;

    let rendered = render_geometry(
        geometry,
        &ae_content,
        ae_path,
        &htc_content,
        htc_path,
        layout,
        ae_reference,
    )?;

    let ae_staged = stage(ae_path, &rendered.ae)?;
    let htc_staged = stage(htc_path, &rendered.htc)?;
    ae_staged
        .persist(ae_path)
        .map_err(|e| BladeError::io(ae_path, e.error))?;
    htc_staged
        .persist(htc_path)
        .map_err(|e| BladeError::io(htc_path, e.error))?;
    info!(
        "wrote {} sections to {} and {}",
        geometry.len(),
        ae_path.display(),
        htc_path.display()
    );
    Ok(())
}

/// Write `content` to a temporary file in the directory of `target`, with the
/// permissions of `target`.
fn stage(target: &Path, content: &str) -> Result<NamedTempFile> {
    let dir = match target.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir).map_err(|e| BladeError::io(dir, e))?;
    file.write_all(content.as_bytes())
        .and_then(|()| file.flush())
        .map_err(|e| BladeError::io(target, e))?;
    if let Ok(meta) = fs::metadata(target) {
        file.as_file()
            .set_permissions(meta.permissions())
            .map_err(|e| BladeError::io(target, e))?;
    }
    Ok(file)
}

/// A working copy that no longer parses has changed shape since it was read.
fn into_mismatch(err: BladeError) -> BladeError {
    match err {
        BladeError::MalformedInput {
            path,
            line,
            message,
        } => BladeError::FormatMismatch {
            path,
            message: format!("line {line}: {message}"),
        },
        other => other,
    }
}
