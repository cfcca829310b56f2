//! Схемы датасетов: порядок признаков, целевая колонка, источники

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::HealthError;

const HEART_DISEASE_FEATURES: [&str; 13] = [
    "age", "sex", "cp", "trestbps", "chol", "fbs", "restecg", "thalach", "exang", "oldpeak",
    "slope", "ca", "thal",
];

const DIABETES_FEATURES: [&str; 8] = [
    "pregnancies",
    "glucose",
    "blood_pressure",
    "skin_thickness",
    "insulin",
    "bmi",
    "diabetes_pedigree",
    "age",
];

/// Колонки диабета, в которых 0 означает пропуск
pub const DIABETES_ZERO_AS_MISSING: [&str; 5] =
    ["glucose", "blood_pressure", "skin_thickness", "insulin", "bmi"];

/// Маркер пропуска в датасете Cleveland
pub const MISSING_SENTINEL: &str = "?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DatasetKind {
    HeartDisease,
    Diabetes,
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 2] = [DatasetKind::HeartDisease, DatasetKind::Diabetes];

    pub fn name(&self) -> &'static str {
        match self {
            DatasetKind::HeartDisease => "heart-disease",
            DatasetKind::Diabetes => "diabetes",
        }
    }

    pub fn feature_names(&self) -> &'static [&'static str] {
        match self {
            DatasetKind::HeartDisease => &HEART_DISEASE_FEATURES,
            DatasetKind::Diabetes => &DIABETES_FEATURES,
        }
    }

    pub fn n_features(&self) -> usize {
        self.feature_names().len()
    }

    pub fn target_name(&self) -> &'static str {
        match self {
            DatasetKind::HeartDisease => "target",
            DatasetKind::Diabetes => "outcome",
        }
    }

    /// Все колонки файла: признаки и цель последней
    pub fn columns(&self) -> Vec<&'static str> {
        let mut columns = self.feature_names().to_vec();
        columns.push(self.target_name());
        columns
    }

    pub fn feature_index(&self, name: &str) -> Option<usize> {
        self.feature_names().iter().position(|f| *f == name)
    }

    pub fn default_source_url(&self) -> &'static str {
        match self {
            DatasetKind::HeartDisease => {
                "https://archive.ics.uci.edu/ml/machine-learning-databases/heart-disease/processed.cleveland.data"
            }
            DatasetKind::Diabetes => {
                "https://raw.githubusercontent.com/jbrownlee/Datasets/master/pima-indians-diabetes.data.csv"
            }
        }
    }

    /// Префикс файлов артефактов
    pub fn file_stem(&self) -> &'static str {
        match self {
            DatasetKind::HeartDisease => "heart_disease",
            DatasetKind::Diabetes => "diabetes",
        }
    }

    pub fn dataset_file_name(&self) -> &'static str {
        match self {
            DatasetKind::HeartDisease => "heart.csv",
            DatasetKind::Diabetes => "diabetes.csv",
        }
    }

    /// Человекочитаемое описание класса
    pub fn describe_label(&self, label: usize) -> &'static str {
        match (self, label) {
            (DatasetKind::HeartDisease, 1) => "Heart Disease",
            (DatasetKind::HeartDisease, _) => "No Heart Disease",
            (DatasetKind::Diabetes, 1) => "Diabetes",
            (DatasetKind::Diabetes, _) => "No Diabetes",
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DatasetKind {
    type Err = HealthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "heart-disease" | "heart_disease" | "heart" => Ok(DatasetKind::HeartDisease),
            "diabetes" => Ok(DatasetKind::Diabetes),
            other => Err(HealthError::Config(format!("Unknown model '{other}'"))),
        }
    }
}
