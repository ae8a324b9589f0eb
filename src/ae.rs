//! The aerodynamic element table (`ae.dat`).
//!
//! ```text
//! 1                                  <- number of sets
//! 1 27                               <- set number, number of rows
//! 0.0     5.38    100.0   1 ;        <- radius, chord, rel. thickness, profile set
//! ...
//! ```
//!
//! Fields are separated by tabs or spaces; everything after `;` is ignored.

use std::path::Path;

use log::debug;
use ndarray::Array1;

use crate::{
    fields::{fields, format_value, splice, split_lines, strip_terminator},
    BladeError, BladeGeometry, Result,
};

/// Field positions within a data row.
const RADIUS: usize = 0;
const CHORD: usize = 1;
const THICKNESS: usize = 2;

/// Columns read from an element table.
#[derive(Debug, Clone, PartialEq)]
pub struct AeTable {
    pub radius: Array1<f64>,
    pub chord: Array1<f64>,
    pub rel_thickness: Array1<f64>,
    /// Row count announced by the set header line, if it has one.
    pub declared_rows: Option<usize>,
}

impl AeTable {
    pub fn len(&self) -> usize {
        self.radius.len()
    }

    pub fn is_empty(&self) -> bool {
        self.radius.is_empty()
    }
}

/// Read and parse an element table file.
pub fn read_ae_file(path: &Path, header_lines: usize) -> Result<AeTable> {
    let content = std::fs::read_to_string(path).map_err(|e| BladeError::io(path, e))?;
    parse_ae(&content, path, header_lines)
}

/// Parse element table `content`; `path` is only used for error messages.
pub fn parse_ae(content: &str, path: &Path, header_lines: usize) -> Result<AeTable> {
    let mut radius = Vec::new();
    let mut chord = Vec::new();
    let mut rel_thickness = Vec::new();

    let lines: Vec<&str> = content.lines().collect();
    if lines.len() < header_lines {
        return Err(BladeError::malformed(
            path,
            lines.len(),
            format!("expected {header_lines} header lines, file has {}", lines.len()),
        ));
    }

    let declared_rows = header_lines
        .checked_sub(1)
        .and_then(|idx| declared_row_count(lines[idx]));

    for (idx, line) in lines.iter().enumerate().skip(header_lines) {
        let f = fields(line);
        if f.is_empty() {
            continue;
        }
        if f.len() <= THICKNESS {
            return Err(BladeError::malformed(
                path,
                idx + 1,
                format!("expected at least 3 fields, found {}", f.len()),
            ));
        }
        let value = |pos: usize, name: &str| {
            f[pos].parse().ok_or_else(|| {
                BladeError::malformed(path, idx + 1, format!("invalid {name}: {}", f[pos].text))
            })
        };
        radius.push(value(RADIUS, "radius")?);
        chord.push(value(CHORD, "chord")?);
        rel_thickness.push(value(THICKNESS, "relative thickness")?);
    }

    debug!("{}: {} element rows", path.display(), radius.len());
    Ok(AeTable {
        radius: Array1::from(radius),
        chord: Array1::from(chord),
        rel_thickness: Array1::from(rel_thickness),
        declared_rows,
    })
}

/// `set_nr n_rows` header line
fn declared_row_count(line: &str) -> Option<usize> {
    match fields(line).as_slice() {
        [set, rows] if set.text.parse::<usize>().is_ok() => rows.text.parse().ok(),
        _ => None,
    }
}

/// Render `content` with the radius, chord and thickness of every data row
/// replaced from `geometry`. Header lines, other fields, delimiters and line
/// terminators are kept as they are.
pub fn render_ae(
    content: &str,
    path: &Path,
    header_lines: usize,
    geometry: &BladeGeometry,
) -> Result<String> {
    let mut out = String::with_capacity(content.len());
    let mut row = 0;

    for (idx, line) in split_lines(content).into_iter().enumerate() {
        let (body, terminator) = strip_terminator(line);
        let f = fields(body);
        if idx < header_lines || f.is_empty() {
            out.push_str(line);
            continue;
        }
        let section = geometry.section(row).ok_or_else(|| {
            BladeError::mismatch(
                path,
                format!(
                    "line {}: more data rows than the {} sections read",
                    idx + 1,
                    geometry.len()
                ),
            )
        })?;
        if f.len() <= THICKNESS {
            return Err(BladeError::mismatch(
                path,
                format!("line {}: expected at least 3 fields, found {}", idx + 1, f.len()),
            ));
        }
        let edits = vec![
            (f[RADIUS].span.clone(), format_value(&f[RADIUS], section.radius)),
            (f[CHORD].span.clone(), format_value(&f[CHORD], section.chord)),
            (
                f[THICKNESS].span.clone(),
                format_value(&f[THICKNESS], section.rel_thickness),
            ),
        ];
        out.push_str(&splice(body, edits));
        out.push_str(terminator);
        row += 1;
    }

    if row != geometry.len() {
        return Err(BladeError::mismatch(
            path,
            format!("found {row} data rows, geometry has {} sections", geometry.len()),
        ));
    }
    Ok(out)
}
