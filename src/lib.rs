//! Health ML - модели риска сердечных заболеваний и диабета

pub mod api;
pub mod config;
pub mod dataset;
pub mod error;
pub mod models;
pub mod preprocessing;
pub mod storage;
pub mod types;

pub use config::{AppConfig, PipelineConfig, TrainingConfig};
pub use dataset::{Dataset, DatasetKind, DatasetSource};
pub use error::{HealthError, Result};
pub use models::*;
pub use preprocessing::StandardScaler;
pub use types::*;
