//! Пайплайн одной модели: датасет -> обучение -> артефакты -> предсказание

use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use super::artifacts::ArtifactPair;
use super::trainer;
use crate::config::{PipelineConfig, TrainingConfig};
use crate::dataset::{Dataset, DatasetKind, DatasetLoader, DatasetSource, HttpSource};
use crate::error::Result;
use crate::types::{PredictionResult, TrainingSummary};

/// Отпечаток файла: атомарная запись всегда создает новый inode,
/// mtime и размер дополняют его там, где inode нет
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileStamp {
    modified: SystemTime,
    len: u64,
    inode: u64,
}

impl FileStamp {
    fn read(path: &Path) -> Option<Self> {
        let meta = fs::metadata(path).ok()?;
        #[cfg(unix)]
        let inode = std::os::unix::fs::MetadataExt::ino(&meta);
        #[cfg(not(unix))]
        let inode = 0;

        Some(Self {
            modified: meta.modified().ok()?,
            len: meta.len(),
            inode,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DiskStamp {
    model: FileStamp,
    scaler: FileStamp,
}

impl DiskStamp {
    /// None, если хотя бы одного файла нет
    fn read(config: &PipelineConfig) -> Option<Self> {
        Some(Self {
            model: FileStamp::read(&config.model_path)?,
            scaler: FileStamp::read(&config.scaler_path)?,
        })
    }
}

/// Пара в памяти и отпечаток файлов, из которых она получена
struct Served {
    pair: Arc<ArtifactPair>,
    stamp: Option<DiskStamp>,
}

pub struct Pipeline {
    kind: DatasetKind,
    config: PipelineConfig,
    training: TrainingConfig,
    loader: DatasetLoader,
    /// Под этим мьютексом идет обучение: конкурентные запросы ждут один запуск
    artifacts: Mutex<Option<Served>>,
}

impl Pipeline {
    pub fn new(kind: DatasetKind, config: PipelineConfig, training: TrainingConfig) -> Self {
        let source = Box::new(HttpSource::new(config.source_url.clone()));
        Self::with_source(kind, config, training, source)
    }

    pub fn with_source(
        kind: DatasetKind,
        config: PipelineConfig,
        training: TrainingConfig,
        source: Box<dyn DatasetSource>,
    ) -> Self {
        let loader = DatasetLoader::new(kind, config.dataset_path.clone(), source);
        Self {
            kind,
            config,
            training,
            loader,
            artifacts: Mutex::new(None),
        }
    }

    pub fn kind(&self) -> DatasetKind {
        self.kind
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn load_dataset(&self) -> Result<Dataset> {
        self.loader.load()
    }

    /// Переобучение всегда перезаписывает артефакты
    pub fn train(&self) -> Result<TrainingSummary> {
        let mut slot = self.artifacts.lock().unwrap_or_else(|e| e.into_inner());
        let (pair, summary) = self.train_locked()?;
        *slot = Some(Served {
            pair,
            stamp: DiskStamp::read(&self.config),
        });
        Ok(summary)
    }

    /// Актуальная пара с диска: из памяти, если файлы не менялись,
    /// иначе перечитать; если файлов нет или они негодны, обучить
    pub fn artifacts(&self) -> Result<Arc<ArtifactPair>> {
        let mut slot = self.artifacts.lock().unwrap_or_else(|e| e.into_inner());
        let stamp = DiskStamp::read(&self.config);

        if let Some(served) = slot.as_ref() {
            if stamp.is_some() && served.stamp == stamp {
                return Ok(served.pair.clone());
            }
        }

        // Отпечаток снят до чтения: запись во время чтения даст перечитывание
        let served = match stamp.and_then(|_| self.load_persisted()) {
            Some(pair) => {
                let pair = match slot.as_ref() {
                    Some(served) if served.pair.run_id == pair.run_id => served.pair.clone(),
                    _ => Arc::new(pair),
                };
                Served { pair, stamp }
            }
            None => {
                tracing::info!("No usable {} artifacts on disk, training", self.kind);
                Served {
                    pair: self.train_locked()?.0,
                    stamp: DiskStamp::read(&self.config),
                }
            }
        };

        let pair = served.pair.clone();
        *slot = Some(served);
        Ok(pair)
    }

    pub fn predict(&self, row: &[f64]) -> Result<PredictionResult> {
        let pair = self.artifacts()?;
        pair.predict(row)
    }

    fn load_persisted(&self) -> Option<ArtifactPair> {
        match ArtifactPair::load(self.kind, &self.config.model_path, &self.config.scaler_path) {
            Ok(Some(pair)) => {
                tracing::info!("Loaded {} artifacts (run {})", self.kind, pair.run_id);
                Some(pair)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Unreadable {} artifacts, retraining: {}", self.kind, e);
                None
            }
        }
    }

    /// Вызывается только под мьютексом artifacts
    fn train_locked(&self) -> Result<(Arc<ArtifactPair>, TrainingSummary)> {
        let dataset = self.loader.load()?;
        let (pair, summary) = trainer::fit(&dataset, &self.training)?;
        pair.save(&self.config.model_path, &self.config.scaler_path)?;
        tracing::info!(
            "Saved {} artifacts (run {}) to {}",
            self.kind,
            pair.run_id,
            self.config.model_path.display()
        );
        Ok((Arc::new(pair), summary))
    }
}
