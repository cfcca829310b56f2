/// Типы данных для API и пайплайнов

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dataset::DatasetKind;
use crate::models::evaluation::ClassificationReport;

/// Признаки для модели сердечных заболеваний (порядок как в схеме)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartDiseaseInput {
    pub age: f64,
    pub sex: f64,
    pub cp: f64,
    pub trestbps: f64,
    pub chol: f64,
    pub fbs: f64,
    pub restecg: f64,
    pub thalach: f64,
    pub exang: f64,
    pub oldpeak: f64,
    pub slope: f64,
    pub ca: f64,
    pub thal: f64,
}

impl HeartDiseaseInput {
    pub fn to_row(&self) -> Vec<f64> {
        vec![
            self.age,
            self.sex,
            self.cp,
            self.trestbps,
            self.chol,
            self.fbs,
            self.restecg,
            self.thalach,
            self.exang,
            self.oldpeak,
            self.slope,
            self.ca,
            self.thal,
        ]
    }
}

/// Признаки для модели диабета. Алиасы: имена полей HTML-формы.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiabetesInput {
    pub pregnancies: f64,
    pub glucose: f64,
    #[serde(alias = "bloodpressure")]
    pub blood_pressure: f64,
    #[serde(alias = "skinthickness")]
    pub skin_thickness: f64,
    pub insulin: f64,
    pub bmi: f64,
    #[serde(alias = "diabetespedigree")]
    pub diabetes_pedigree: f64,
    pub age: f64,
}

impl DiabetesInput {
    pub fn to_row(&self) -> Vec<f64> {
        vec![
            self.pregnancies,
            self.glucose,
            self.blood_pressure,
            self.skin_thickness,
            self.insulin,
            self.bmi,
            self.diabetes_pedigree,
            self.age,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub label: usize,
    pub confidence: f64, // % для предсказанного класса, 2 знака
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub model: DatasetKind,
    pub prediction: usize,
    pub label: String,
    pub probability: f64,
}

impl PredictionResponse {
    pub fn new(kind: DatasetKind, result: PredictionResult) -> Self {
        Self {
            model: kind,
            prediction: result.label,
            label: kind.describe_label(result.label).to_string(),
            probability: result.confidence,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub model: DatasetKind,
    pub run_id: String,
    pub trained_at: DateTime<Utc>,
    pub n_train: usize,
    pub n_test: usize,
    pub accuracy: f64,
    pub report: ClassificationReport,
}
