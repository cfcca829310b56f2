//! Пара артефактов (scaler + classifier) одного запуска обучения

use std::path::Path;

use chrono::{DateTime, Utc};
use ndarray::{Array1, Axis};
use serde::{Deserialize, Serialize};

use super::random_forest::{argmax, RandomForest};
use crate::dataset::DatasetKind;
use crate::error::{HealthError, Result};
use crate::preprocessing::StandardScaler;
use crate::storage;
use crate::types::PredictionResult;

/// Формат файла на диске: метаданные запуска + сам объект
#[derive(Serialize, Deserialize)]
struct Stored<T> {
    run_id: String,
    kind: DatasetKind,
    trained_at: DateTime<Utc>,
    payload: T,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactPair {
    pub run_id: String,
    pub kind: DatasetKind,
    pub trained_at: DateTime<Utc>,
    pub scaler: StandardScaler,
    pub classifier: RandomForest,
}

impl ArtifactPair {
    pub fn new(kind: DatasetKind, scaler: StandardScaler, classifier: RandomForest) -> Self {
        let trained_at = Utc::now();
        let run_id = format!(
            "{}-{:08x}",
            trained_at.format("%Y%m%dT%H%M%S"),
            rand::random::<u32>()
        );
        Self {
            run_id,
            kind,
            trained_at,
            scaler,
            classifier,
        }
    }

    /// Оба файла пишутся вместе и несут один run_id
    pub fn save(&self, model_path: &Path, scaler_path: &Path) -> Result<()> {
        let scaler = Stored {
            run_id: self.run_id.clone(),
            kind: self.kind,
            trained_at: self.trained_at,
            payload: &self.scaler,
        };
        let classifier = Stored {
            run_id: self.run_id.clone(),
            kind: self.kind,
            trained_at: self.trained_at,
            payload: &self.classifier,
        };

        storage::write_atomic(scaler_path, &serde_json::to_vec(&scaler)?)?;
        storage::write_atomic(model_path, &serde_json::to_vec(&classifier)?)?;
        Ok(())
    }

    /// None, если файлов нет или они от разных запусков
    pub fn load(kind: DatasetKind, model_path: &Path, scaler_path: &Path) -> Result<Option<Self>> {
        if !model_path.exists() || !scaler_path.exists() {
            return Ok(None);
        }

        let scaler: Stored<StandardScaler> = serde_json::from_slice(&std::fs::read(scaler_path)?)?;
        let classifier: Stored<RandomForest> = serde_json::from_slice(&std::fs::read(model_path)?)?;

        if scaler.run_id != classifier.run_id {
            tracing::warn!(
                "{} artifacts come from different runs ({} vs {}), ignoring them",
                kind,
                scaler.run_id,
                classifier.run_id
            );
            return Ok(None);
        }

        let width_ok = scaler.payload.n_features() == Some(kind.n_features())
            && classifier.payload.n_features() == kind.n_features();
        if scaler.kind != kind || classifier.kind != kind || !width_ok {
            tracing::warn!("{} artifacts do not match the {} schema, ignoring them", scaler.run_id, kind);
            return Ok(None);
        }

        Ok(Some(Self {
            run_id: classifier.run_id,
            kind,
            trained_at: classifier.trained_at,
            scaler: scaler.payload,
            classifier: classifier.payload,
        }))
    }

    /// Масштабирование строки, argmax вероятностей, уверенность в %
    pub fn predict(&self, row: &[f64]) -> Result<PredictionResult> {
        validate_row(self.kind, row)?;

        let scaled = self.scaler.transform_row(Array1::from(row.to_vec()).view())?;
        let proba = self.classifier.predict_proba(&scaled.insert_axis(Axis(0)))?;
        let proba = proba.row(0);

        let label = argmax(&proba);
        let confidence = (proba[label] * 100.0 * 100.0).round() / 100.0;

        Ok(PredictionResult { label, confidence })
    }
}

/// Ширина по схеме и конечные значения; диапазоны не проверяются
pub fn validate_row(kind: DatasetKind, row: &[f64]) -> Result<()> {
    if row.len() != kind.n_features() {
        return Err(HealthError::InvalidInput(format!(
            "{} expects {} features, got {}",
            kind,
            kind.n_features(),
            row.len()
        )));
    }
    if let Some((i, value)) = row.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(HealthError::InvalidInput(format!(
            "'{}' must be a finite number, got {}",
            kind.feature_names()[i],
            value
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array2};

    fn fitted_pair() -> ArtifactPair {
        let x = Array2::from_shape_fn((30, 8), |(i, j)| {
            let base = if i < 15 { 1.0 } else { 50.0 };
            base + (i * 8 + j) as f64 * 0.1
        });
        let y = Array1::from_shape_fn(30, |i| usize::from(i >= 15));

        let mut scaler = StandardScaler::new();
        let scaled = scaler.fit_transform(&x).unwrap();
        let mut forest = RandomForest::new(15, 42);
        forest.fit(&scaled, &y).unwrap();

        ArtifactPair::new(DatasetKind::Diabetes, scaler, forest)
    }

    #[test]
    fn save_then_load_reproduces_predictions() {
        let dir = tempfile::tempdir().unwrap();
        let model_path = dir.path().join("model.json");
        let scaler_path = dir.path().join("scaler.json");
        let pair = fitted_pair();
        pair.save(&model_path, &scaler_path).unwrap();

        let loaded = ArtifactPair::load(DatasetKind::Diabetes, &model_path, &scaler_path)
            .unwrap()
            .unwrap();
        assert_eq!(loaded, pair);

        let row = [3.0, 110.0, 70.0, 25.0, 90.0, 30.0, 0.5, 40.0];
        assert_eq!(loaded.predict(&row).unwrap(), pair.predict(&row).unwrap());
    }

    #[test]
    fn missing_files_mean_no_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = ArtifactPair::load(
            DatasetKind::Diabetes,
            &dir.path().join("model.json"),
            &dir.path().join("scaler.json"),
        )
        .unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn mismatched_runs_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let model_path = dir.path().join("model.json");
        let scaler_path = dir.path().join("scaler.json");
        let other_scaler = dir.path().join("other_scaler.json");

        let mut first = fitted_pair();
        first.run_id = "first".to_string();
        let mut second = fitted_pair();
        second.run_id = "second".to_string();
        first.save(&model_path, &scaler_path).unwrap();
        second.save(&dir.path().join("other_model.json"), &other_scaler).unwrap();
        std::fs::rename(&other_scaler, &scaler_path).unwrap();

        let loaded = ArtifactPair::load(DatasetKind::Diabetes, &model_path, &scaler_path).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn wrong_schema_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let model_path = dir.path().join("model.json");
        let scaler_path = dir.path().join("scaler.json");
        fitted_pair().save(&model_path, &scaler_path).unwrap();

        let loaded = ArtifactPair::load(DatasetKind::HeartDisease, &model_path, &scaler_path).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn confidence_is_rounded_percentage_of_predicted_class() {
        let pair = fitted_pair();
        let result = pair.predict(&[500.0; 8]).unwrap();
        assert_eq!(result.label, 1);
        assert_eq!(result.confidence, 100.0);

        let result = pair.predict(&[1.0; 8]).unwrap();
        assert_eq!(result.label, 0);
        assert!(result.confidence >= 50.0 && result.confidence <= 100.0);
        assert_eq!((result.confidence * 100.0).round() / 100.0, result.confidence);
    }

    #[test]
    fn confidence_averages_trees_and_rounds_to_two_decimals() {
        let x = Array2::from_shape_fn((4, 8), |(i, j)| (i * 8 + j) as f64);
        let mut scaler = StandardScaler::new();
        scaler.fit(&x).unwrap();

        let forest = RandomForest::from_leaves(8, vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.0, 1.0]]);
        let pair = ArtifactPair::new(DatasetKind::Diabetes, scaler.clone(), forest);
        assert_eq!(
            pair.predict(&[0.0; 8]).unwrap(),
            PredictionResult {
                label: 1,
                confidence: 66.67
            }
        );

        // Равенство: побеждает класс 0
        let forest = RandomForest::from_leaves(8, vec![vec![0.5, 0.5], vec![0.5, 0.5]]);
        let pair = ArtifactPair::new(DatasetKind::Diabetes, scaler, forest);
        assert_eq!(
            pair.predict(&[0.0; 8]).unwrap(),
            PredictionResult {
                label: 0,
                confidence: 50.0
            }
        );
    }

    #[test]
    fn invalid_rows_are_rejected() {
        let pair = fitted_pair();
        assert!(matches!(pair.predict(&[1.0; 3]), Err(HealthError::InvalidInput(_))));

        let mut row = [1.0; 8];
        row[1] = f64::NAN;
        assert!(matches!(pair.predict(&row), Err(HealthError::InvalidInput(_))));
    }
}
