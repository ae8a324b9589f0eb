//! Parametric blade modifiers and the ordered stack that applies them.
//!
//! All modifiers work on the non-dimensional radius `r = radius / R` and only
//! touch the sections their selection predicate picks.

use std::f64::consts::PI;
use std::fmt;

use log::{debug, info};
use ndarray::{Array1, Zip};
use serde::Deserialize;

use crate::{BladeError, BladeGeometry, Result};

/// Relative thickness of a cylindrical section [%]
pub const CYLINDER_THICKNESS: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierKind {
    /// `chord -= amount * (r - 1)` for `r <= threshold`
    LinearRootChord,
    /// `chord += amount * -cos(r π)` for `r >= threshold`
    TipCosineChord,
    /// `chord += amount * -cos(r π)` along the whole blade
    CosineChord,
    /// `twist += amount * -(r - 1)` for `r <= threshold`
    LinearRootTwist,
    /// `twist += amount * weights[k]` for the k-th section with `r <= threshold`
    ManualRootTwist,
    /// `rel_thickness = 100` for `r <= threshold`
    CylindricalRoot,
}

impl fmt::Display for ModifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModifierKind::LinearRootChord => "linear root chord",
            ModifierKind::TipCosineChord => "tip cosine chord",
            ModifierKind::CosineChord => "cosine chord",
            ModifierKind::LinearRootTwist => "linear root twist",
            ModifierKind::ManualRootTwist => "manual root twist",
            ModifierKind::CylindricalRoot => "cylindrical root",
        };
        f.write_str(name)
    }
}

fn default_enabled() -> bool {
    true
}

/// One configured modifier.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Modifier {
    pub kind: ModifierKind,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Chord change [m] or twist change [deg]; unused by [`ModifierKind::CylindricalRoot`].
    #[serde(default)]
    pub amount: f64,
    /// Bound on `r` of the selection; unused by [`ModifierKind::CosineChord`].
    #[serde(default)]
    pub threshold: f64,
    /// Per-section weights of [`ModifierKind::ManualRootTwist`], root first.
    #[serde(default)]
    pub weights: Option<Vec<f64>>,
}

impl Modifier {
    pub fn new(kind: ModifierKind, amount: f64, threshold: f64) -> Self {
        Modifier {
            kind,
            enabled: true,
            amount,
            threshold,
            weights: None,
        }
    }

    pub fn linear_root_chord(amount: f64, threshold: f64) -> Self {
        Self::new(ModifierKind::LinearRootChord, amount, threshold)
    }

    pub fn tip_cosine_chord(amount: f64, threshold: f64) -> Self {
        Self::new(ModifierKind::TipCosineChord, amount, threshold)
    }

    pub fn cosine_chord(amount: f64) -> Self {
        Self::new(ModifierKind::CosineChord, amount, 0.0)
    }

    pub fn linear_root_twist(amount: f64, threshold: f64) -> Self {
        Self::new(ModifierKind::LinearRootTwist, amount, threshold)
    }

    pub fn manual_root_twist(amount: f64, threshold: f64, weights: Vec<f64>) -> Self {
        Self::new(ModifierKind::ManualRootTwist, amount, threshold).weights(weights)
    }

    pub fn cylindrical_root(threshold: f64) -> Self {
        Self::new(ModifierKind::CylindricalRoot, 0.0, threshold)
    }

    pub fn weights(mut self, weights: Vec<f64>) -> Self {
        self.weights = Some(weights);
        self
    }

    pub fn enabled(mut self, yes: bool) -> Self {
        self.enabled = yes;
        self
    }

    /// whether the section at non-dimensional radius `r` is modified
    pub fn selects(&self, r: f64) -> bool {
        match self.kind {
            ModifierKind::TipCosineChord => r >= self.threshold,
            ModifierKind::CosineChord => true,
            ModifierKind::LinearRootChord
            | ModifierKind::LinearRootTwist
            | ModifierKind::ManualRootTwist
            | ModifierKind::CylindricalRoot => r <= self.threshold,
        }
    }

    /// Apply this modifier to a copy of `geometry`, ignoring `enabled`.
    pub fn apply(&self, geometry: &BladeGeometry) -> Result<BladeGeometry> {
        let mut out = geometry.clone();
        self.apply_in_place(&mut out, &geometry.normalized_radius())?;
        Ok(out)
    }

    fn validate(&self, r: &Array1<f64>) -> Result<()> {
        if !self.amount.is_finite() || !self.threshold.is_finite() {
            return Err(BladeError::Configuration(format!(
                "{}: amount and threshold must be finite, got {} and {}",
                self.kind, self.amount, self.threshold
            )));
        }
        if self.kind == ModifierKind::ManualRootTwist {
            let weights = self.weights.as_deref().ok_or_else(|| {
                BladeError::Configuration(format!("{}: weights are required", self.kind))
            })?;
            let selected = r.iter().filter(|&&r| self.selects(r)).count();
            if weights.len() < selected {
                return Err(BladeError::Configuration(format!(
                    "{}: {} weights for {selected} sections with r/R <= {}",
                    self.kind,
                    weights.len(),
                    self.threshold
                )));
            }
            if weights.iter().any(|w| !w.is_finite()) {
                return Err(BladeError::Configuration(format!(
                    "{}: weights must be finite",
                    self.kind
                )));
            }
        }
        Ok(())
    }

    /// `r` is the normalized radius of `geometry`.
    fn apply_in_place(&self, geometry: &mut BladeGeometry, r: &Array1<f64>) -> Result<()> {
        self.validate(r)?;
        let amount = self.amount;
        match self.kind {
            ModifierKind::LinearRootChord => {
                Zip::from(geometry.chord_mut()).and(r).for_each(|c, &r| {
                    if self.selects(r) {
                        *c -= amount * (r - 1.0);
                    }
                })
            }
            ModifierKind::TipCosineChord | ModifierKind::CosineChord => {
                Zip::from(geometry.chord_mut()).and(r).for_each(|c, &r| {
                    if self.selects(r) {
                        *c += amount * -(r * PI).cos();
                    }
                })
            }
            ModifierKind::LinearRootTwist => {
                Zip::from(geometry.twist_mut()).and(r).for_each(|t, &r| {
                    if self.selects(r) {
                        *t += amount * -(r - 1.0);
                    }
                })
            }
            ModifierKind::ManualRootTwist => {
                let weights = self.weights.as_deref().unwrap_or_default();
                let selected = geometry
                    .twist_mut()
                    .iter_mut()
                    .zip(r)
                    .filter(|&(_, &r)| self.selects(r));
                for ((t, _), w) in selected.zip(weights) {
                    *t += amount * w;
                }
            }
            ModifierKind::CylindricalRoot => {
                Zip::from(geometry.rel_thickness_mut())
                    .and(r)
                    .for_each(|th, &r| {
                        if self.selects(r) {
                            *th = CYLINDER_THICKNESS;
                        }
                    })
            }
        }
        Ok(())
    }
}

/// An ordered list of modifiers, applied one after another.
///
/// Any subset of kinds in any order is valid, the same kind may appear more
/// than once. The stack does not check that chords stay positive, see
/// [`BladeGeometry::warn_implausible`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct ModifierStack {
    modifiers: Vec<Modifier>,
}

impl ModifierStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, modifier: Modifier) -> &mut Self {
        self.modifiers.push(modifier);
        self
    }

    pub fn len(&self) -> usize {
        self.modifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Modifier> {
        self.modifiers.iter()
    }

    /// Apply all enabled modifiers in order to a copy of `baseline`.
    pub fn apply(&self, baseline: &BladeGeometry) -> Result<BladeGeometry> {
        let r = baseline.normalized_radius();
        let mut working = baseline.clone();
        let mut applied = 0;
        for modifier in &self.modifiers {
            if !modifier.enabled {
                debug!("skipping disabled {} modifier", modifier.kind);
                continue;
            }
            let selected = r.iter().filter(|&&r| modifier.selects(r)).count();
            debug!(
                "applying {} (amount = {}, threshold = {}) to {selected} sections",
                modifier.kind, modifier.amount, modifier.threshold
            );
            modifier.apply_in_place(&mut working, &r)?;
            applied += 1;
        }
        info!("applied {applied} of {} modifiers", self.modifiers.len());
        Ok(working)
    }
}

impl From<Vec<Modifier>> for ModifierStack {
    fn from(modifiers: Vec<Modifier>) -> Self {
        ModifierStack { modifiers }
    }
}

impl FromIterator<Modifier> for ModifierStack {
    fn from_iter<I: IntoIterator<Item = Modifier>>(iter: I) -> Self {
        ModifierStack {
            modifiers: iter.into_iter().collect(),
        }
    }
}
