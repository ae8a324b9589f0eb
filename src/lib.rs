use log::warn;
use ndarray::{s, Array1, Array2, ArrayView1, Axis};

use interpolate::IsMonotonic;

pub mod ae;
pub mod bundle;
pub mod config;
pub mod design;
pub mod error;
pub mod fields;
pub mod htc;
pub mod interpolate;
pub mod modifier;
pub mod reader;
pub mod simulation;
pub mod writer;

pub use error::{BladeError, Result, SimulationError};
pub use modifier::{Modifier, ModifierKind, ModifierStack};

/// Twist beyond this magnitude (degrees) is reported as implausible.
const PLAUSIBLE_TWIST: f64 = 90.0;

/// One span-wise blade section.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Section {
    /// Span position [m]
    pub radius: f64,
    /// Chord length [m]
    pub chord: f64,
    /// Aerodynamic twist [deg]
    pub twist: f64,
    /// Relative thickness [%]
    pub rel_thickness: f64,
}

/// Span-wise aerodynamic geometry of a blade.
///
/// The section count is fixed on construction and the radius is strict
/// monotonic rising. Modifiers return a new geometry, the baseline it was
/// derived from stays untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct BladeGeometry {
    radius: Array1<f64>,
    twist: Array1<f64>,
    chord: Array1<f64>,
    rel_thickness: Array1<f64>,
}

impl BladeGeometry {
    /// create a new geometry from its span-wise columns
    pub fn new(
        radius: Array1<f64>,
        twist: Array1<f64>,
        chord: Array1<f64>,
        rel_thickness: Array1<f64>,
    ) -> Result<Self> {
        let n = radius.len();
        if twist.len() != n || chord.len() != n || rel_thickness.len() != n {
            return Err(BladeError::Configuration(format!(
                "column lengths differ: radius {n}, twist {}, chord {}, thickness {}",
                twist.len(),
                chord.len(),
                rel_thickness.len()
            )));
        }
        if n == 0 {
            return Err(BladeError::Configuration("geometry has no sections".into()));
        }
        if n > 1 && !radius.is_strict_rising() {
            return Err(BladeError::Configuration(
                "radius must be strict monotonic rising".into(),
            ));
        }
        if radius[n - 1] <= 0.0 {
            return Err(BladeError::Configuration(format!(
                "tip radius must be positive, got {}",
                radius[n - 1]
            )));
        }
        Ok(BladeGeometry {
            radius,
            twist,
            chord,
            rel_thickness,
        })
    }

    /// create a geometry from rows of `[radius, twist, chord, rel_thickness]`
    pub fn from_geo_matrix(mat: &Array2<f64>) -> Result<Self> {
        if mat.ncols() != 4 {
            return Err(BladeError::Configuration(format!(
                "geometry matrix needs 4 columns, got {}",
                mat.ncols()
            )));
        }
        BladeGeometry::new(
            mat.column(0).to_owned(),
            mat.column(1).to_owned(),
            mat.column(2).to_owned(),
            mat.column(3).to_owned(),
        )
    }

    /// rows of `[radius, twist, chord, rel_thickness]`
    pub fn geo_matrix(&self) -> Array2<f64> {
        let mut mat = Array2::zeros((self.len(), 4));
        mat.slice_mut(s![.., 0]).assign(&self.radius);
        mat.slice_mut(s![.., 1]).assign(&self.twist);
        mat.slice_mut(s![.., 2]).assign(&self.chord);
        mat.slice_mut(s![.., 3]).assign(&self.rel_thickness);
        mat
    }

    /// Number of sections
    pub fn len(&self) -> usize {
        self.radius.len()
    }

    pub fn is_empty(&self) -> bool {
        self.radius.is_empty()
    }

    pub fn radius(&self) -> ArrayView1<f64> {
        self.radius.view()
    }

    pub fn twist(&self) -> ArrayView1<f64> {
        self.twist.view()
    }

    pub fn chord(&self) -> ArrayView1<f64> {
        self.chord.view()
    }

    pub fn rel_thickness(&self) -> ArrayView1<f64> {
        self.rel_thickness.view()
    }

    /// Radius of the outermost section [m]
    pub fn max_radius(&self) -> f64 {
        self.radius[self.len() - 1]
    }

    /// Non-dimensional radius r/R, the common coordinate of all modifiers.
    pub fn normalized_radius(&self) -> Array1<f64> {
        let r_max = self.max_radius();
        self.radius.mapv(|r| r / r_max)
    }

    pub fn section(&self, idx: usize) -> Option<Section> {
        (idx < self.len()).then(|| Section {
            radius: self.radius[idx],
            chord: self.chord[idx],
            twist: self.twist[idx],
            rel_thickness: self.rel_thickness[idx],
        })
    }

    pub fn sections(&self) -> impl Iterator<Item = Section> + '_ {
        (0..self.len()).filter_map(|idx| self.section(idx))
    }

    /// Indices of sections whose chord is zero or negative.
    pub fn non_positive_chords(&self) -> Vec<usize> {
        self.chord
            .indexed_iter()
            .filter(|&(_, &c)| c <= 0.0)
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Log sections that are physically doubtful. Nothing is rejected, an
    /// exploratory design may go out of range on purpose.
    pub fn warn_implausible(&self, name: &str) {
        for idx in self.non_positive_chords() {
            warn!(
                "{name}: chord {} m at r = {} m is not positive",
                self.chord[idx], self.radius[idx]
            );
        }
        for (idx, twist) in self.twist.indexed_iter() {
            if twist.abs() > PLAUSIBLE_TWIST {
                warn!(
                    "{name}: twist {twist}° at r = {} m exceeds ±{PLAUSIBLE_TWIST}°",
                    self.radius[idx]
                );
            }
        }
    }

    pub(crate) fn chord_mut(&mut self) -> &mut Array1<f64> {
        &mut self.chord
    }

    pub(crate) fn twist_mut(&mut self) -> &mut Array1<f64> {
        &mut self.twist
    }

    pub(crate) fn rel_thickness_mut(&mut self) -> &mut Array1<f64> {
        &mut self.rel_thickness
    }

    /// Largest absolute difference per column `[twist, chord, rel_thickness]`
    /// against another geometry with the same sections.
    pub fn max_difference(&self, other: &BladeGeometry) -> Option<[f64; 3]> {
        if self.radius != other.radius {
            return None;
        }
        let a = self.geo_matrix();
        let b = other.geo_matrix();
        let diff = (&a - &b).mapv(f64::abs);
        let max = diff
            .slice(s![.., 1..])
            .fold_axis(Axis(0), 0.0_f64, |acc, &d| acc.max(d));
        Some([max[0], max[1], max[2]])
    }
}
