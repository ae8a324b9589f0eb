//! Monotonicity checks and piecewise-linear resampling between span-wise grids.

use ndarray::{Array1, ArrayBase, Data, Ix1};
use ndarray_interp::{
    interp1d::{Interp1D, Linear},
    BuilderError, InterpolateError,
};
use thiserror::Error;

pub trait IsMonotonic {
    fn is_monotonic(&self) -> bool {
        self.is_rising() || self.is_falling()
    }
    fn is_strict_monotonic(&self) -> bool {
        self.is_strict_rising() || self.is_strict_falling()
    }
    fn is_rising(&self) -> bool;
    fn is_falling(&self) -> bool;
    fn is_strict_rising(&self) -> bool;
    fn is_strict_falling(&self) -> bool;
}

impl<S, T> IsMonotonic for ArrayBase<S, Ix1>
where
    S: Data<Elem = T>,
    T: PartialOrd,
{
    /// is this array monotonic rising
    fn is_rising(&self) -> bool {
        self.len() > 1 && self.windows(2).into_iter().all(|w| w[0] <= w[1])
    }
    /// is this array monotonic falling
    fn is_falling(&self) -> bool {
        self.len() > 1 && self.windows(2).into_iter().all(|w| w[0] >= w[1])
    }

    fn is_strict_rising(&self) -> bool {
        self.len() > 1 && self.windows(2).into_iter().all(|w| w[0] < w[1])
    }

    fn is_strict_falling(&self) -> bool {
        self.len() > 1 && self.windows(2).into_iter().all(|w| w[0] > w[1])
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ResampleError {
    #[error("cannot resample from an empty grid")]
    Empty,
    #[error("grid has {x} points but {y} values")]
    Length { x: usize, y: usize },
    #[error("grid values must be strict monotonic rising")]
    NotRising,
    #[error("{0}")]
    Backend(String),
}

impl From<BuilderError> for ResampleError {
    fn from(value: BuilderError) -> Self {
        ResampleError::Backend(value.to_string())
    }
}

impl From<InterpolateError> for ResampleError {
    fn from(value: InterpolateError) -> Self {
        ResampleError::Backend(value.to_string())
    }
}

/// Resample `y(x)` onto the query grid `xq` by piecewise-linear interpolation.
///
/// `x` must be strict monotonic rising. Queries outside `[x_first, x_last]`
/// take the nearest end value instead of extrapolating, so a twist table that
/// stops short of the blade tip holds its last value.
pub fn resample<Sx, Sy, Sq>(
    x: &ArrayBase<Sx, Ix1>,
    y: &ArrayBase<Sy, Ix1>,
    xq: &ArrayBase<Sq, Ix1>,
) -> Result<Array1<f64>, ResampleError>
where
    Sx: Data<Elem = f64>,
    Sy: Data<Elem = f64>,
    Sq: Data<Elem = f64>,
{
    if x.len() != y.len() {
        return Err(ResampleError::Length {
            x: x.len(),
            y: y.len(),
        });
    }
    match x.len() {
        0 => return Err(ResampleError::Empty),
        1 => return Ok(Array1::from_elem(xq.len(), y[0])),
        _ => {}
    }
    if !x.is_strict_rising() {
        return Err(ResampleError::NotRising);
    }

    let (lo, hi) = (x[0], x[x.len() - 1]);
    let interp = Interp1D::builder(y.view())
        .x(x.view())
        .strategy(Linear::new())
        .build()?;

    let values = xq
        .iter()
        .map(|&q| interp.interp_scalar(q.max(lo).min(hi)))
        .collect::<Result<Vec<f64>, InterpolateError>>()?;
    Ok(Array1::from(values))
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    use super::*;

    #[test]
    fn test_monotonic() {
        assert!(array![0.0, 1.0, 1.0, 2.0].is_rising());
        assert!(!array![0.0, 1.0, 1.0, 2.0].is_strict_rising());
        assert!(array![3.0, 2.0, 1.0].is_strict_falling());
        assert!(!array![1.0].is_monotonic());
        assert!(!array![0.0, 2.0, 1.0].is_monotonic());
    }

    #[test]
    fn test_resample_midpoint() {
        let x = array![0.0, 1.0];
        let y = array![10.0, 0.0];
        let out = resample(&x, &y, &array![0.0, 0.5, 1.0]).unwrap();
        assert_abs_diff_eq!(out, array![10.0, 5.0, 0.0], epsilon = 1e-12);
    }

    #[test]
    fn test_resample_clamps_outside_grid() {
        let x = array![1.0, 2.0, 4.0];
        let y = array![2.0, 4.0, 0.0];
        let out = resample(&x, &y, &array![0.0, 3.0, 9.0]).unwrap();
        assert_abs_diff_eq!(out, array![2.0, 2.0, 0.0], epsilon = 1e-12);
    }

    #[test]
    fn test_resample_rejects_unsorted_grid() {
        let x = array![0.0, 2.0, 1.0];
        let y = array![0.0, 0.0, 0.0];
        assert_eq!(
            resample(&x, &y, &array![0.5]),
            Err(ResampleError::NotRising)
        );
    }

    #[test]
    fn test_resample_single_point() {
        let out = resample(&array![3.0], &array![-2.5], &array![0.0, 10.0]).unwrap();
        assert_eq!(out, array![-2.5, -2.5]);
    }
}
