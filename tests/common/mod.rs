//! Синтетические датасеты и источник без сети

#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use health_ml::{DatasetKind, DatasetSource, HealthError, Pipeline, PipelineConfig, TrainingConfig};

pub struct StaticSource {
    raw: String,
    calls: Arc<AtomicUsize>,
}

impl StaticSource {
    pub fn new(raw: String) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                raw,
                calls: calls.clone(),
            },
            calls,
        )
    }
}

impl DatasetSource for StaticSource {
    fn fetch(&self) -> health_ml::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.raw.clone())
    }

    fn location(&self) -> &str {
        "memory"
    }
}

pub struct OfflineSource;

impl DatasetSource for OfflineSource {
    fn fetch(&self) -> health_ml::Result<String> {
        Err(HealthError::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "network disabled in tests",
        )))
    }

    fn location(&self) -> &str {
        "offline"
    }
}

/// 20 здоровых + 20 больных, классы разделимы по каждому признаку
pub fn diabetes_raw() -> String {
    let mut lines = Vec::new();
    for i in 0..20 {
        lines.push(format!(
            "{},{},{},{},{},{:.1},{:.2},{},0",
            1 + i % 3,
            80 + i,
            60 + i % 5,
            20 + i % 4,
            50 + i,
            22.0 + i as f64 * 0.1,
            0.2 + i as f64 * 0.01,
            21 + i
        ));
        lines.push(format!(
            "{},{},{},{},{},{:.1},{:.2},{},1",
            6 + i % 3,
            160 + i,
            85 + i % 5,
            35 + i % 4,
            200 + i,
            35.0 + i as f64 * 0.1,
            0.8 + i as f64 * 0.01,
            50 + i
        ));
    }
    lines.join("\n") + "\n"
}

pub const DIABETES_HIGH_RISK: [f64; 8] = [8.0, 190.0, 95.0, 40.0, 250.0, 40.0, 1.2, 70.0];
pub const DIABETES_LOW_RISK: [f64; 8] = [1.0, 85.0, 61.0, 21.0, 55.0, 22.5, 0.25, 25.0];
/// glucose, skin_thickness и bmi как у больных, остальное как у здоровых
pub const DIABETES_MIXED: [f64; 8] = [2.0, 170.0, 62.0, 36.0, 60.0, 36.0, 0.3, 30.0];

/// 40 полных строк (цели 0..=4) и 3 строки с '?'
pub fn heart_raw() -> String {
    let mut lines = Vec::new();
    for i in 0..40 {
        let sick = i % 2 == 1;
        let offset = if sick { 1000.0 } else { 0.0 };
        let mut fields: Vec<String> = (0..13)
            .map(|j| format!("{:.1}", offset + j as f64 * 10.0 + i as f64 * 0.1))
            .collect();
        let target = if sick { 1 + (i / 2) % 4 } else { 0 };
        fields.push(target.to_string());
        lines.push(fields.join(","));
    }
    for column in [11, 12, 3] {
        let mut fields: Vec<String> = (0..13).map(|j| format!("{}.0", j)).collect();
        fields[column] = "?".to_string();
        fields.push("2".to_string());
        lines.push(fields.join(","));
    }
    lines.join("\n") + "\n"
}

pub fn small_training() -> TrainingConfig {
    TrainingConfig {
        n_trees: 25,
        ..TrainingConfig::default()
    }
}

pub fn pipeline_in(dir: &Path, kind: DatasetKind, source: Box<dyn DatasetSource>) -> Pipeline {
    let config = PipelineConfig::in_dirs(kind, &dir.join("data"), &dir.join("artifacts"));
    Pipeline::with_source(kind, config, small_training(), source)
}

pub fn diabetes_pipeline(dir: &Path) -> (Pipeline, Arc<AtomicUsize>) {
    let (source, calls) = StaticSource::new(diabetes_raw());
    (pipeline_in(dir, DatasetKind::Diabetes, Box::new(source)), calls)
}

pub fn heart_pipeline(dir: &Path) -> (Pipeline, Arc<AtomicUsize>) {
    let (source, calls) = StaticSource::new(heart_raw());
    (pipeline_in(dir, DatasetKind::HeartDisease, Box::new(source)), calls)
}
