//! Очистка сырых таблиц: пропуски, приведение типов, бинаризация цели

use ndarray::Array2;

use crate::error::{HealthError, Result};

/// Убирает строки, где хотя бы одно поле равно маркеру пропуска или пустое
pub fn drop_rows_with_sentinel(records: Vec<Vec<String>>, sentinel: &str) -> Vec<Vec<String>> {
    let before = records.len();
    let kept: Vec<Vec<String>> = records
        .into_iter()
        .filter(|row| !row.iter().any(|v| v == sentinel || v.is_empty()))
        .collect();

    if kept.len() < before {
        tracing::info!("Dropped {} rows with missing values", before - kept.len());
    }
    kept
}

/// Приводит все поля к f64; номер строки в ошибке считается с 1
pub fn coerce_numeric(records: &[Vec<String>], columns: &[&str]) -> Result<Array2<f64>> {
    let mut table = Array2::zeros((records.len(), columns.len()));

    for (i, row) in records.iter().enumerate() {
        if row.len() != columns.len() {
            return Err(HealthError::Schema(format!(
                "Row {} has {} fields, expected {}",
                i + 1,
                row.len(),
                columns.len()
            )));
        }
        for (j, value) in row.iter().enumerate() {
            table[[i, j]] = parse_finite(value, i + 1, columns[j])?;
        }
    }

    Ok(table)
}

/// Число из CSV-поля; "nan" и "inf" тоже считаются ошибкой
pub fn parse_finite(value: &str, line: usize, column: &str) -> Result<f64> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| HealthError::Parse {
            line,
            column: column.to_string(),
            value: value.to_string(),
        })
}

/// Многоклассовая цель -> бинарная (> 0 -> 1)
pub fn binarize_column(table: &mut Array2<f64>, column: usize) {
    for value in table.column_mut(column).iter_mut() {
        *value = if *value > 0.0 { 1.0 } else { 0.0 };
    }
}

/// Медиана; None для пустого среза
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Заменяет нули в колонке медианой ненулевых значений.
/// Возвращает использованную медиану.
pub fn impute_zeros_with_median(table: &mut Array2<f64>, column: usize) -> Option<f64> {
    let present: Vec<f64> = table
        .column(column)
        .iter()
        .copied()
        .filter(|v| *v != 0.0)
        .collect();

    let fill = median(&present)?;
    for value in table.column_mut(column).iter_mut() {
        if *value == 0.0 {
            *value = fill;
        }
    }
    Some(fill)
}
