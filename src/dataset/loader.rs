//! Загрузка датасета: локальный кэш или удаленный источник

use std::path::{Path, PathBuf};

use ndarray::Array2;

use super::schema::{DatasetKind, DIABETES_ZERO_AS_MISSING, MISSING_SENTINEL};
use super::Dataset;
use crate::error::{HealthError, Result};
use crate::preprocessing::cleaning;
use crate::storage;

/// Откуда берутся сырые данные при пустом кэше
pub trait DatasetSource: Send + Sync {
    fn fetch(&self) -> Result<String>;

    fn location(&self) -> &str;
}

/// Скачивание по HTTP, без повторов
pub struct HttpSource {
    url: String,
}

impl HttpSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl DatasetSource for HttpSource {
    fn fetch(&self) -> Result<String> {
        reqwest::blocking::get(&self.url)
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.text())
            .map_err(|source| HealthError::Fetch {
                url: self.url.clone(),
                source,
            })
    }

    fn location(&self) -> &str {
        &self.url
    }
}

pub struct DatasetLoader {
    kind: DatasetKind,
    cache_path: PathBuf,
    source: Box<dyn DatasetSource>,
}

impl DatasetLoader {
    pub fn new(kind: DatasetKind, cache_path: impl Into<PathBuf>, source: Box<dyn DatasetSource>) -> Self {
        Self {
            kind,
            cache_path: cache_path.into(),
            source,
        }
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    /// Кэш, если есть; иначе скачать, очистить и сохранить
    pub fn load(&self) -> Result<Dataset> {
        if self.cache_path.exists() {
            return read_cache(self.kind, &self.cache_path);
        }

        tracing::info!("Fetching {} dataset from {}", self.kind, self.source.location());
        let raw = self.source.fetch()?;
        let dataset = preprocess_raw(self.kind, &raw)?;

        write_cache(&dataset, &self.cache_path)?;
        tracing::info!(
            "Cached {} dataset ({} rows) at {}",
            self.kind,
            dataset.len(),
            self.cache_path.display()
        );

        Ok(dataset)
    }
}

/// Сырой CSV без заголовка -> очищенный датасет
pub fn preprocess_raw(kind: DatasetKind, raw: &str) -> Result<Dataset> {
    let records = read_raw_records(raw)?;
    let columns = kind.columns();

    let table = match kind {
        DatasetKind::HeartDisease => {
            let records = cleaning::drop_rows_with_sentinel(records, MISSING_SENTINEL);
            let mut table = cleaning::coerce_numeric(&records, &columns)?;
            cleaning::binarize_column(&mut table, kind.n_features());
            table
        }
        DatasetKind::Diabetes => {
            let mut table = cleaning::coerce_numeric(&records, &columns)?;
            for name in DIABETES_ZERO_AS_MISSING {
                let column = kind.feature_index(name).ok_or_else(|| {
                    HealthError::Schema(format!("Column '{name}' missing from schema"))
                })?;
                if let Some(fill) = cleaning::impute_zeros_with_median(&mut table, column) {
                    tracing::debug!("Filled zeros in '{}' with median {}", name, fill);
                }
            }
            table
        }
    };

    Dataset::from_table(kind, table)
}

fn read_raw_records(raw: &str) -> Result<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(raw.as_bytes());

    let mut records = Vec::new();
    for record in reader.records() {
        let record = record?;
        records.push(record.iter().map(str::to_string).collect());
    }
    Ok(records)
}

fn read_cache(kind: DatasetKind, path: &Path) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;

    let columns = kind.columns();
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers != columns {
        return Err(HealthError::Schema(format!(
            "{} has columns {:?}, expected {:?}",
            path.display(),
            headers,
            columns
        )));
    }

    let mut values = Vec::new();
    let mut n_rows = 0;
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        for (j, value) in record.iter().enumerate() {
            // строка 1 занята заголовком
            values.push(cleaning::parse_finite(value, i + 2, columns[j])?);
        }
        n_rows += 1;
    }

    let table = Array2::from_shape_vec((n_rows, columns.len()), values)
        .map_err(|e| HealthError::Schema(e.to_string()))?;
    Dataset::from_table(kind, table)
}

fn write_cache(dataset: &Dataset, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(dataset.kind.columns())?;

    for (row, label) in dataset.features.rows().into_iter().zip(dataset.labels.iter()) {
        let mut record: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        record.push(label.to_string());
        writer.write_record(&record)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| HealthError::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string())))?;
    storage::write_atomic(path, &bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingSource {
        raw: String,
        calls: Arc<AtomicUsize>,
    }

    impl DatasetSource for CountingSource {
        fn fetch(&self) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.raw.clone())
        }

        fn location(&self) -> &str {
            "memory"
        }
    }

    struct FailingSource;

    impl DatasetSource for FailingSource {
        fn fetch(&self) -> Result<String> {
            Err(HealthError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "offline",
            )))
        }

        fn location(&self) -> &str {
            "nowhere"
        }
    }

    const HEART_RAW: &str = "\
63.0,1.0,1.0,145.0,233.0,1.0,2.0,150.0,0.0,2.3,3.0,0.0,6.0,0
67.0,1.0,4.0,160.0,286.0,0.0,2.0,108.0,1.0,1.5,2.0,3.0,3.0,2
67.0,1.0,4.0,120.0,229.0,0.0,2.0,129.0,1.0,2.6,2.0,2.0,7.0,1
53.0,0.0,3.0,128.0,216.0,0.0,2.0,115.0,0.0,0.0,1.0,0.0,?,0
37.0,1.0,3.0,130.0,250.0,0.0,0.0,187.0,0.0,3.5,3.0,0.0,3.0,3
41.0,0.0,2.0,130.0,204.0,0.0,2.0,172.0,0.0,1.4,1.0,?,3.0,4
56.0,1.0,2.0,120.0,236.0,0.0,0.0,178.0,0.0,0.8,1.0,0.0,3.0,4
";

    const DIABETES_RAW: &str = "\
6,148,72,35,0,33.6,0.627,50,1
1,85,66,29,0,26.6,0.351,31,0
8,183,64,0,0,23.3,0.672,32,1
1,0,66,23,94,28.1,0.167,21,0
0,137,40,35,168,43.1,2.288,33,1
";

    #[test]
    fn heart_rows_with_sentinel_are_dropped_and_target_binarized() {
        let dataset = preprocess_raw(DatasetKind::HeartDisease, HEART_RAW).unwrap();

        assert_eq!(dataset.len(), 5);
        assert_eq!(dataset.labels.to_vec(), vec![0, 1, 1, 1, 1]);
        // строки 53 и 41 лет содержали '?'
        assert!(dataset.features.column(0).iter().all(|age| *age != 53.0 && *age != 41.0));
    }

    #[test]
    fn diabetes_zero_glucose_gets_median() {
        let dataset = preprocess_raw(DatasetKind::Diabetes, DIABETES_RAW).unwrap();
        let glucose = DatasetKind::Diabetes.feature_index("glucose").unwrap();
        let insulin = DatasetKind::Diabetes.feature_index("insulin").unwrap();
        let pregnancies = DatasetKind::Diabetes.feature_index("pregnancies").unwrap();

        // ненулевые: 85, 137, 148, 183 -> медиана 142.5
        assert_eq!(dataset.features[[3, glucose]], 142.5);
        // ненулевые: 94, 168 -> 131
        assert_eq!(dataset.features[[0, insulin]], 131.0);
        // 0 беременностей не считается пропуском
        assert_eq!(dataset.features[[4, pregnancies]], 0.0);
    }

    #[test]
    fn non_numeric_value_is_a_parse_error() {
        let raw = "6,abc,72,35,0,33.6,0.627,50,1\n";
        assert!(matches!(
            preprocess_raw(DatasetKind::Diabetes, raw),
            Err(HealthError::Parse { .. })
        ));
    }

    #[test]
    fn non_finite_raw_value_is_a_parse_error() {
        let raw = "6,148,72,35,0,nan,0.627,50,1\n1,85,66,29,0,inf,0.351,31,0\n";
        assert!(matches!(
            preprocess_raw(DatasetKind::Diabetes, raw),
            Err(HealthError::Parse { line: 1, .. })
        ));
    }

    #[test]
    fn non_finite_cached_value_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("diabetes.csv");
        let header = DatasetKind::Diabetes.columns().join(",");
        std::fs::write(&path, format!("{header}\n6,148,72,35,0,33.6,0.627,NaN,1\n")).unwrap();

        let loader = DatasetLoader::new(DatasetKind::Diabetes, &path, Box::new(FailingSource));
        assert!(matches!(loader.load(), Err(HealthError::Parse { line: 2, .. })));
    }

    #[test]
    fn cache_is_written_once_and_reused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("diabetes.csv");
        let calls = Arc::new(AtomicUsize::new(0));
        let loader = DatasetLoader::new(
            DatasetKind::Diabetes,
            &path,
            Box::new(CountingSource {
                raw: DIABETES_RAW.to_string(),
                calls: calls.clone(),
            }),
        );

        let first = loader.load().unwrap();
        let second = loader.load().unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(path.exists());
        assert_eq!(first, second);
    }

    #[test]
    fn cache_is_read_without_touching_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("heart.csv");
        let dataset = preprocess_raw(DatasetKind::HeartDisease, HEART_RAW).unwrap();
        write_cache(&dataset, &path).unwrap();

        let loader = DatasetLoader::new(DatasetKind::HeartDisease, &path, Box::new(FailingSource));
        assert_eq!(loader.load().unwrap(), dataset);
    }

    #[test]
    fn fetch_failure_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let loader = DatasetLoader::new(
            DatasetKind::HeartDisease,
            dir.path().join("heart.csv"),
            Box::new(FailingSource),
        );
        assert!(loader.load().is_err());
        assert!(!loader.cache_path().exists());
    }

    #[test]
    fn cache_with_wrong_header_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("diabetes.csv");
        std::fs::write(&path, "a,b\n1,2\n").unwrap();

        let loader = DatasetLoader::new(DatasetKind::Diabetes, &path, Box::new(FailingSource));
        assert!(matches!(loader.load(), Err(HealthError::Schema(_))));
    }
}
