//! Обучение: split 80/20, scaler на train, Random Forest, отчет по test

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::artifacts::ArtifactPair;
use super::evaluation::ClassificationReport;
use super::random_forest::RandomForest;
use crate::config::TrainingConfig;
use crate::dataset::Dataset;
use crate::error::{HealthError, Result};
use crate::preprocessing::StandardScaler;
use crate::types::TrainingSummary;

/// Перемешанные индексы: первые ceil(n * test_fraction) идут в test, остальные в train
pub fn train_test_split(n_samples: usize, test_fraction: f64, seed: u64) -> Result<(Vec<usize>, Vec<usize>)> {
    if n_samples < 2 {
        return Err(HealthError::Model(format!(
            "Need at least 2 rows to split, got {n_samples}"
        )));
    }

    let n_test = ((n_samples as f64 * test_fraction).ceil() as usize).clamp(1, n_samples - 1);

    let mut indices: Vec<usize> = (0..n_samples).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let train = indices.split_off(n_test);
    tracing::debug!("Dataset split: {} train, {} test", train.len(), indices.len());

    Ok((train, indices))
}

/// Полный цикл обучения. Точность только логируется, порога нет.
pub fn fit(dataset: &Dataset, config: &TrainingConfig) -> Result<(ArtifactPair, TrainingSummary)> {
    let (train_idx, test_idx) = train_test_split(dataset.len(), config.test_fraction, config.seed)?;
    let (x_train, y_train) = dataset.select(&train_idx);
    let (x_test, y_test) = dataset.select(&test_idx);

    // Нормализация только по train
    let mut scaler = StandardScaler::new();
    let x_train_scaled = scaler.fit_transform(&x_train)?;
    let x_test_scaled = scaler.transform(&x_test)?;

    let mut forest = RandomForest::new(config.n_trees, config.seed);
    forest.fit(&x_train_scaled, &y_train)?;

    let y_pred = forest.predict(&x_test_scaled)?;
    let report = ClassificationReport::new(&y_test, &y_pred, forest.n_classes())?;
    tracing::info!("{} model accuracy: {:.2}", dataset.kind, report.accuracy);
    tracing::info!("{} classification report:\n{}", dataset.kind, report.render());

    let pair = ArtifactPair::new(dataset.kind, scaler, forest);
    let summary = TrainingSummary {
        model: dataset.kind,
        run_id: pair.run_id.clone(),
        trained_at: pair.trained_at,
        n_train: train_idx.len(),
        n_test: test_idx.len(),
        accuracy: report.accuracy,
        report,
    };

    Ok((pair, summary))
}
