//! Per-column standardization (zero mean, unit variance).

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::ports::ModelError;

/// Columns whose standard deviation falls below this are left unscaled.
const MIN_STD: f64 = 1e-12;

/// Fitted standard scaler.
///
/// Statistics come from the training set only and are applied unchanged to
/// any later input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    /// Population standard deviation per column; 1.0 for constant columns
    pub scale: Vec<f64>,
}

impl StandardScaler {
    /// Fit column means and standard deviations.
    ///
    /// # Errors
    /// Returns error on an empty matrix or non-finite values.
    pub fn fit(x: &Array2<f64>) -> Result<Self, ModelError> {
        if x.nrows() == 0 {
            return Err(ModelError::EmptyTrainingSet);
        }
        if x.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::NonFinite);
        }

        let mean = x.mean_axis(Axis(0)).ok_or(ModelError::EmptyTrainingSet)?;
        let std = x.std_axis(Axis(0), 0.0);
        let scale = std.mapv(|s| if s < MIN_STD { 1.0 } else { s });

        Ok(Self {
            mean: mean.to_vec(),
            scale: scale.to_vec(),
        })
    }

    #[must_use]
    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    /// Standardize a design matrix.
    ///
    /// # Errors
    /// Returns `DimensionMismatch` if the column count differs from fit time.
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>, ModelError> {
        if x.ncols() != self.n_features() {
            return Err(ModelError::DimensionMismatch {
                expected: self.n_features(),
                got: x.ncols(),
            });
        }
        let mean = Array1::from(self.mean.clone());
        let scale = Array1::from(self.scale.clone());
        Ok((x - &mean) / &scale)
    }

    /// Standardize a single row.
    ///
    /// # Errors
    /// Returns `DimensionMismatch` if the length differs from fit time.
    pub fn transform_row(&self, row: &[f64]) -> Result<Array2<f64>, ModelError> {
        let x = Array2::from_shape_vec((1, row.len()), row.to_vec()).map_err(|_| {
            ModelError::DimensionMismatch {
                expected: self.n_features(),
                got: row.len(),
            }
        })?;
        self.transform(&x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_fit_transform() {
        let x = array![[1.0, 10.0], [3.0, 10.0], [5.0, 10.0]];
        let scaler = StandardScaler::fit(&x).expect("fit");
        assert!((scaler.mean[0] - 3.0).abs() < 1e-12);
        // constant column keeps unit scale
        assert!((scaler.scale[1] - 1.0).abs() < 1e-12);

        let z = scaler.transform(&x).expect("transform");
        assert!(z.column(0).sum().abs() < 1e-12);
        assert!(z.column(1).iter().all(|v| v.abs() < 1e-12));
        let var = z.column(0).mapv(|v| v * v).mean().expect("non-empty");
        assert!((var - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_dimension_mismatch() {
        let scaler = StandardScaler::fit(&array![[1.0, 2.0], [2.0, 3.0]]).expect("fit");
        let err = scaler.transform_row(&[1.0, 2.0, 3.0]).unwrap_err();
        assert_eq!(
            err,
            ModelError::DimensionMismatch {
                expected: 2,
                got: 3
            }
        );
    }

    #[test]
    fn test_empty_fit_fails() {
        assert!(StandardScaler::fit(&Array2::zeros((0, 3))).is_err());
    }
}
