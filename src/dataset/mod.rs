/// Датасеты: схемы, загрузка и кэш

pub mod loader;
pub mod schema;

pub use loader::{preprocess_raw, DatasetLoader, DatasetSource, HttpSource};
pub use schema::DatasetKind;

use ndarray::{Array1, Array2, Axis};

use crate::error::{HealthError, Result};

/// Таблица признаков и бинарные метки в порядке схемы
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub kind: DatasetKind,
    pub features: Array2<f64>,
    pub labels: Array1<usize>,
}

impl Dataset {
    pub fn new(kind: DatasetKind, features: Array2<f64>, labels: Array1<usize>) -> Result<Self> {
        if features.ncols() != kind.n_features() {
            return Err(HealthError::Schema(format!(
                "{} expects {} features, got {}",
                kind,
                kind.n_features(),
                features.ncols()
            )));
        }
        if features.nrows() != labels.len() {
            return Err(HealthError::Schema(format!(
                "{} feature rows but {} labels",
                features.nrows(),
                labels.len()
            )));
        }
        Ok(Self {
            kind,
            features,
            labels,
        })
    }

    /// Из полной таблицы, где цель в последней колонке и уже бинарная
    pub fn from_table(kind: DatasetKind, table: Array2<f64>) -> Result<Self> {
        let width = kind.n_features() + 1;
        if table.ncols() != width {
            return Err(HealthError::Schema(format!(
                "{} expects {} columns, got {}",
                kind,
                width,
                table.ncols()
            )));
        }

        let target = table.column(kind.n_features());
        let mut labels = Array1::zeros(table.nrows());
        for (i, value) in target.iter().enumerate() {
            labels[i] = match *value {
                v if v == 0.0 => 0,
                v if v == 1.0 => 1,
                v => {
                    return Err(HealthError::Schema(format!(
                        "Row {}: target '{}' is not binary",
                        i + 1,
                        v
                    )))
                }
            };
        }

        let features = table.slice(ndarray::s![.., ..kind.n_features()]).to_owned();
        Self::new(kind, features, labels)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Подвыборка строк по индексам
    pub fn select(&self, indices: &[usize]) -> (Array2<f64>, Array1<usize>) {
        (
            self.features.select(Axis(0), indices),
            self.labels.select(Axis(0), indices),
        )
    }
}
