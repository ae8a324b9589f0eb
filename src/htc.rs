//! The simulator configuration file (`.htc`).
//!
//! Only two things are touched: the twist sub-table at a fixed line range,
//! one `sec` row per twist-defining section, and the `ae_filename` line that
//! names the companion element table.

use std::path::Path;

use log::debug;
use ndarray::{Array1, ArrayView1};
use serde::Deserialize;

use crate::{
    fields::{fields, format_value, splice, split_lines, strip_terminator},
    BladeError, Result,
};

/// Token of the line referencing the element table.
pub const AE_REFERENCE_TOKEN: &str = "ae_filename";

/// Where the twist sub-table sits inside the configuration file.
///
/// The file format is owned by the simulator, so this is a parsing contract
/// supplied by the caller rather than something detected from the content.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TwistTableLayout {
    /// 0-based index of the first table line (number of lines in front of it).
    pub start_line: usize,
    /// Number of table rows.
    pub rows: usize,
    /// 0-based field holding the span position. `sec` counts as field 0.
    pub radius_field: usize,
    /// 0-based field holding the twist angle.
    pub twist_field: usize,
}

impl Default for TwistTableLayout {
    /// A `c2_def` block of `sec nr x y z twist;` rows at the position it has in
    /// the reference 10 MW blade's HAWC2S file. Span position is `z`.
    fn default() -> Self {
        TwistTableLayout {
            start_line: 110,
            rows: 27,
            radius_field: 4,
            twist_field: 5,
        }
    }
}

impl TwistTableLayout {
    pub fn end_line(&self) -> usize {
        self.start_line + self.rows
    }

    fn min_fields(&self) -> usize {
        self.radius_field.max(self.twist_field) + 1
    }
}

/// Twist as defined in the configuration file, on its own radius grid.
#[derive(Debug, Clone, PartialEq)]
pub struct TwistTable {
    pub radius: Array1<f64>,
    pub twist: Array1<f64>,
}

/// Parse the twist sub-table from configuration file `content`.
pub fn parse_twist_table(content: &str, path: &Path, layout: &TwistTableLayout) -> Result<TwistTable> {
    let lines: Vec<&str> = content.lines().collect();
    if lines.len() < layout.end_line() {
        return Err(BladeError::malformed(
            path,
            lines.len(),
            format!(
                "twist table expected on lines {}..={}, file has {} lines",
                layout.start_line + 1,
                layout.end_line(),
                lines.len()
            ),
        ));
    }

    let mut radius = Vec::with_capacity(layout.rows);
    let mut twist = Vec::with_capacity(layout.rows);
    for (idx, line) in lines
        .iter()
        .enumerate()
        .skip(layout.start_line)
        .take(layout.rows)
    {
        let f = fields(line);
        if f.len() < layout.min_fields() {
            return Err(BladeError::malformed(
                path,
                idx + 1,
                format!(
                    "expected at least {} fields, found {}",
                    layout.min_fields(),
                    f.len()
                ),
            ));
        }
        let value = |pos: usize, name: &str| {
            f[pos].parse().ok_or_else(|| {
                BladeError::malformed(path, idx + 1, format!("invalid {name}: {}", f[pos].text))
            })
        };
        radius.push(value(layout.radius_field, "radius")?);
        twist.push(value(layout.twist_field, "twist")?);
    }

    debug!("{}: {} twist rows", path.display(), radius.len());
    Ok(TwistTable {
        radius: Array1::from(radius),
        twist: Array1::from(twist),
    })
}

/// Current target of the `ae_filename` line, if there is one.
pub fn ae_reference(content: &str) -> Option<&str> {
    content.lines().find_map(|line| match fields(line).as_slice() {
        [token, target, ..] if token.text == AE_REFERENCE_TOKEN => Some(target.text),
        _ => None,
    })
}

/// Render `content` with the twist field of every table row replaced by
/// `twist` (one value per row, on the file's own radius grid) and every
/// `ae_filename` line pointing at `ae_reference`.
pub fn render_htc(
    content: &str,
    path: &Path,
    layout: &TwistTableLayout,
    twist: ArrayView1<f64>,
    ae_reference: &str,
) -> Result<String> {
    if twist.len() != layout.rows {
        return Err(BladeError::mismatch(
            path,
            format!(
                "{} twist values for a table of {} rows",
                twist.len(),
                layout.rows
            ),
        ));
    }

    let lines = split_lines(content);
    if lines.len() < layout.end_line() {
        return Err(BladeError::mismatch(
            path,
            format!(
                "file has {} lines, twist table ends on line {}",
                lines.len(),
                layout.end_line()
            ),
        ));
    }

    let mut out = String::with_capacity(content.len());
    let mut references = 0;
    for (idx, line) in lines.into_iter().enumerate() {
        let (body, terminator) = strip_terminator(line);
        let f = fields(body);

        if (layout.start_line..layout.end_line()).contains(&idx) {
            if f.len() < layout.min_fields() {
                return Err(BladeError::mismatch(
                    path,
                    format!(
                        "line {}: expected at least {} fields, found {}",
                        idx + 1,
                        layout.min_fields(),
                        f.len()
                    ),
                ));
            }
            let field = &f[layout.twist_field];
            let value = twist[idx - layout.start_line];
            out.push_str(&splice(
                body,
                vec![(field.span.clone(), format_value(field, value))],
            ));
            out.push_str(terminator);
        } else if f.first().map(|t| t.text) == Some(AE_REFERENCE_TOKEN) {
            let target = f.get(1).ok_or_else(|| {
                BladeError::mismatch(path, format!("line {}: {AE_REFERENCE_TOKEN} without a path", idx + 1))
            })?;
            out.push_str(&splice(
                body,
                vec![(target.span.clone(), ae_reference.to_string())],
            ));
            out.push_str(terminator);
            references += 1;
        } else {
            out.push_str(line);
        }
    }

    if references == 0 {
        return Err(BladeError::mismatch(
            path,
            format!("no {AE_REFERENCE_TOKEN} line found"),
        ));
    }
    Ok(out)
}
