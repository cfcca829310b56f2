//! Стандартизация признаков

#![allow(non_snake_case)]

use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{HealthError, Result};

/// (x - mean) / std по каждому признаку, std считается по генеральной совокупности
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Option<Array1<f64>>,
    std: Option<Array1<f64>>,
    is_fitted: bool,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self {
            mean: None,
            std: None,
            is_fitted: false,
        }
    }

    pub fn fit(&mut self, X: &Array2<f64>) -> Result<()> {
        if X.nrows() == 0 {
            return Err(HealthError::Model("Empty dataset".to_string()));
        }

        self.mean = Some(
            X.mean_axis(Axis(0))
                .ok_or_else(|| HealthError::Model("Failed to compute mean".to_string()))?,
        );
        self.std = Some(X.std_axis(Axis(0), 0.0));

        // Постоянный признак не масштабируем
        if let Some(ref mut std) = self.std {
            for val in std.iter_mut() {
                if *val < 1e-10 {
                    *val = 1.0;
                }
            }
        }

        self.is_fitted = true;
        Ok(())
    }

    pub fn n_features(&self) -> Option<usize> {
        self.mean.as_ref().map(|m| m.len())
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    pub fn transform(&self, X: &Array2<f64>) -> Result<Array2<f64>> {
        let (mean, std) = self.parameters()?;
        if X.ncols() != mean.len() {
            return Err(HealthError::InvalidInput(format!(
                "Expected {} features, got {}",
                mean.len(),
                X.ncols()
            )));
        }

        let mut normalized = X.clone();
        for mut row in normalized.rows_mut() {
            for (i, val) in row.iter_mut().enumerate() {
                *val = (*val - mean[i]) / std[i];
            }
        }

        Ok(normalized)
    }

    /// Масштабирование одной строки
    pub fn transform_row(&self, row: ArrayView1<f64>) -> Result<Array1<f64>> {
        let X = row.insert_axis(Axis(0)).to_owned();
        Ok(self.transform(&X)?.row(0).to_owned())
    }

    pub fn fit_transform(&mut self, X: &Array2<f64>) -> Result<Array2<f64>> {
        self.fit(X)?;
        self.transform(X)
    }

    fn parameters(&self) -> Result<(&Array1<f64>, &Array1<f64>)> {
        if !self.is_fitted {
            return Err(HealthError::Model("Scaler not fitted".to_string()));
        }
        let mean = self
            .mean
            .as_ref()
            .ok_or_else(|| HealthError::Model("Mean not computed".to_string()))?;
        let std = self
            .std
            .as_ref()
            .ok_or_else(|| HealthError::Model("Std not computed".to_string()))?;
        Ok((mean, std))
    }
}

impl Default for StandardScaler {
    fn default() -> Self {
        Self::new()
    }
}
