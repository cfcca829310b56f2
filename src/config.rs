//! Конфигурация: TOML-файл с дефолтами для каждого поля
//!
//! ```toml
//! [server]
//! port = 8080
//!
//! [diabetes]
//! dataset_path = "/var/lib/health-ml/diabetes.csv"
//! model_path = "/var/lib/health-ml/diabetes_model.json"
//! scaler_path = "/var/lib/health-ml/diabetes_scaler.json"
//! source_url = "https://example.org/pima.csv"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::dataset::DatasetKind;
use crate::error::{HealthError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub training: TrainingConfig,
    #[serde(default = "default_heart_disease")]
    pub heart_disease: PipelineConfig,
    #[serde(default = "default_diabetes")]
    pub diabetes: PipelineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Обучить обе модели до старта сервера
    pub train_on_startup: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub seed: u64,
    pub test_fraction: f64,
    pub n_trees: usize,
}

/// Пути и источник одного пайплайна
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub dataset_path: PathBuf,
    pub model_path: PathBuf,
    pub scaler_path: PathBuf,
    pub source_url: String,
}

fn default_heart_disease() -> PipelineConfig {
    PipelineConfig::for_kind(DatasetKind::HeartDisease)
}

fn default_diabetes() -> PipelineConfig {
    PipelineConfig::for_kind(DatasetKind::Diabetes)
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            training: TrainingConfig::default(),
            heart_disease: default_heart_disease(),
            diabetes: default_diabetes(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            train_on_startup: false,
        }
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            test_fraction: 0.2,
            n_trees: 100,
        }
    }
}

impl PipelineConfig {
    /// data/<dataset>.csv и artifacts/<model>_{model,scaler}.json
    pub fn for_kind(kind: DatasetKind) -> Self {
        Self::in_dirs(kind, Path::new("data"), Path::new("artifacts"))
    }

    pub fn in_dirs(kind: DatasetKind, data_dir: &Path, artifact_dir: &Path) -> Self {
        Self {
            dataset_path: data_dir.join(kind.dataset_file_name()),
            model_path: artifact_dir.join(format!("{}_model.json", kind.file_stem())),
            scaler_path: artifact_dir.join(format!("{}_scaler.json", kind.file_stem())),
            source_url: kind.default_source_url().to_string(),
        }
    }
}

impl AppConfig {
    /// Файл (если указан) + переменная окружения PORT
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|e| {
                    HealthError::Config(format!("Cannot read {}: {}", path.display(), e))
                })?;
                Self::from_toml(&text)?
            }
            None => Self::default(),
        };

        if let Ok(port) = std::env::var("PORT") {
            config.server.port = port
                .parse()
                .map_err(|_| HealthError::Config(format!("Invalid PORT '{port}'")))?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| HealthError::Config(e.to_string()))
    }

    pub fn pipeline(&self, kind: DatasetKind) -> &PipelineConfig {
        match kind {
            DatasetKind::HeartDisease => &self.heart_disease,
            DatasetKind::Diabetes => &self.diabetes,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let t = &self.training;
        if !(t.test_fraction > 0.0 && t.test_fraction < 1.0) {
            return Err(HealthError::Config(format!(
                "training.test_fraction must be in (0, 1), got {}",
                t.test_fraction
            )));
        }
        if t.n_trees == 0 {
            return Err(HealthError::Config("training.n_trees must be positive".to_string()));
        }
        Ok(())
    }
}
