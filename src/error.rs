//! Ошибки пайплайнов

use thiserror::Error;

pub type Result<T> = std::result::Result<T, HealthError>;

#[derive(Error, Debug)]
pub enum HealthError {
    /// Не удалось скачать датасет
    #[error("Failed to fetch dataset from {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Значение не приводится к числу
    #[error("Line {line}, column '{column}': cannot parse '{value}' as a number")]
    Parse {
        line: usize,
        column: String,
        value: String,
    },

    #[error("Schema mismatch: {0}")]
    Schema(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Model error: {0}")]
    Model(String),

    /// Входная строка не подходит под схему
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
