//! CSV dataset loading, encoding, and splitting for the fixed health-risk
//! layout. Any malformed row aborts the load with its line number; a model
//! must never be fitted on a silently patched dataset.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use thiserror::Error;

use crate::encoding::{EncoderSet, LabelEncoder};
use crate::schema::{self, ColumnKind};

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: expected {expected} columns, found {found}")]
    ColumnCount {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: invalid numeric value for {column}: {value:?}")]
    InvalidNumber {
        line: usize,
        column: &'static str,
        value: String,
    },

    #[error("line {line}: empty value for {column}")]
    EmptyValue { line: usize, column: &'static str },

    #[error("dataset contains no data rows")]
    Empty,

    #[error("no encoder fitted for column {0}")]
    MissingEncoder(String),

    #[error("unknown {column} value {value:?} during encoding")]
    UnknownCategory { column: String, value: String },
}

/// One parsed feature field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

/// One dataset row with categorical fields still in string form.
#[derive(Debug, Clone)]
pub struct RawRow {
    /// Feature fields in schema order.
    pub fields: Vec<FieldValue>,
    /// Label column value.
    pub label: String,
}

/// Load every data row from `path`. The first line is treated as a header
/// and skipped without inspection; blank lines are ignored.
pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<Vec<RawRow>, DatasetError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut rows = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if i == 0 || line.trim().is_empty() {
            continue;
        }
        rows.push(parse_row(&line, i + 1)?);
    }
    if rows.is_empty() {
        return Err(DatasetError::Empty);
    }
    Ok(rows)
}

fn parse_row(line: &str, lineno: usize) -> Result<RawRow, DatasetError> {
    let parts: Vec<&str> = line.split(',').map(str::trim).collect();
    if parts.len() != schema::DATASET_COLUMNS {
        return Err(DatasetError::ColumnCount {
            line: lineno,
            expected: schema::DATASET_COLUMNS,
            found: parts.len(),
        });
    }

    // parts[0] is the patient identifier; it never reaches the model.
    let mut fields = Vec::with_capacity(schema::FEATURE_COLUMNS.len());
    for (j, column) in schema::FEATURE_COLUMNS.iter().enumerate() {
        let raw = parts[j + 1];
        match column.kind {
            ColumnKind::Numeric => {
                let value: f64 = raw.parse().map_err(|_| DatasetError::InvalidNumber {
                    line: lineno,
                    column: column.name,
                    value: raw.to_string(),
                })?;
                if !value.is_finite() {
                    return Err(DatasetError::InvalidNumber {
                        line: lineno,
                        column: column.name,
                        value: raw.to_string(),
                    });
                }
                fields.push(FieldValue::Number(value));
            }
            ColumnKind::Categorical => {
                if raw.is_empty() {
                    return Err(DatasetError::EmptyValue {
                        line: lineno,
                        column: column.name,
                    });
                }
                fields.push(FieldValue::Text(raw.to_string()));
            }
        }
    }

    let label = parts[schema::DATASET_COLUMNS - 1];
    if label.is_empty() {
        return Err(DatasetError::EmptyValue {
            line: lineno,
            column: schema::LABEL_COLUMN,
        });
    }

    Ok(RawRow {
        fields,
        label: label.to_string(),
    })
}

/// Fit one label encoder per categorical column, label included.
pub fn fit_encoders(rows: &[RawRow]) -> EncoderSet {
    let mut set = EncoderSet::new();
    for (j, column) in schema::FEATURE_COLUMNS.iter().enumerate() {
        if column.kind != ColumnKind::Categorical {
            continue;
        }
        let values = rows.iter().filter_map(|row| match &row.fields[j] {
            FieldValue::Text(s) => Some(s.as_str()),
            FieldValue::Number(_) => None,
        });
        set.insert(column.name, LabelEncoder::fit(values));
    }
    set.insert(
        schema::LABEL_COLUMN,
        LabelEncoder::fit(rows.iter().map(|row| row.label.as_str())),
    );
    set
}

/// Replace categorical fields with encoder codes, yielding the numeric
/// feature matrix and the label code vector.
pub fn encode(
    rows: &[RawRow],
    encoders: &EncoderSet,
) -> Result<(Vec<Vec<f64>>, Vec<usize>), DatasetError> {
    let label_encoder = encoders
        .encoder(schema::LABEL_COLUMN)
        .ok_or_else(|| DatasetError::MissingEncoder(schema::LABEL_COLUMN.to_string()))?;

    let mut x = Vec::with_capacity(rows.len());
    let mut y = Vec::with_capacity(rows.len());
    for row in rows {
        let mut features = Vec::with_capacity(schema::FEATURE_COLUMNS.len());
        for (j, column) in schema::FEATURE_COLUMNS.iter().enumerate() {
            match &row.fields[j] {
                FieldValue::Number(value) => features.push(*value),
                FieldValue::Text(value) => {
                    let encoder = encoders
                        .encoder(column.name)
                        .ok_or_else(|| DatasetError::MissingEncoder(column.name.to_string()))?;
                    let code = encoder.transform(value).ok_or_else(|| {
                        DatasetError::UnknownCategory {
                            column: column.name.to_string(),
                            value: value.clone(),
                        }
                    })?;
                    features.push(code as f64);
                }
            }
        }
        let label = label_encoder
            .transform(&row.label)
            .ok_or_else(|| DatasetError::UnknownCategory {
                column: schema::LABEL_COLUMN.to_string(),
                value: row.label.clone(),
            })?;
        x.push(features);
        y.push(label);
    }
    Ok((x, y))
}

/// Deterministic shuffled index split. The test partition receives
/// `ceil(n * test_fraction)` rows; the remainder trains.
pub fn train_test_split(n: usize, test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);
    let test_len = ((n as f64) * test_fraction).ceil() as usize;
    let test_len = test_len.min(n);
    let split = n - test_len;
    let test = indices.split_off(split);
    (indices, test)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str = "patient_id,age,family_history,smoking,alcohol,diet_score,physical_activity,symptom_score,mri_abnormality,risk_level";

    fn write_csv(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        file
    }

    #[test]
    fn loads_rows_and_skips_the_header() {
        let file = write_csv(&[
            HEADER,
            "P001,45,Yes,No,No,6,3,2,No,Low",
            "P002,61,No,Yes,Yes,3,1,8,Yes,High",
        ]);
        let rows = load_csv(file.path()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].fields[0], FieldValue::Number(45.0));
        assert_eq!(rows[0].fields[1], FieldValue::Text("Yes".to_string()));
        assert_eq!(rows[1].label, "High");
    }

    #[test]
    fn blank_lines_are_ignored() {
        let file = write_csv(&[HEADER, "P001,45,Yes,No,No,6,3,2,No,Low", "", ""]);
        let rows = load_csv(file.path()).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn malformed_numeric_reports_line_and_column() {
        let file = write_csv(&[
            HEADER,
            "P001,45,Yes,No,No,6,3,2,No,Low",
            "P002,old,No,Yes,Yes,3,1,8,Yes,High",
        ]);
        let err = load_csv(file.path()).unwrap_err();
        match err {
            DatasetError::InvalidNumber { line, column, .. } => {
                assert_eq!(line, 3);
                assert_eq!(column, "age");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn wrong_column_count_is_fatal() {
        let file = write_csv(&[HEADER, "P001,45,Yes,No,No,6,3,2,No"]);
        let err = load_csv(file.path()).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::ColumnCount { line: 2, expected: 10, found: 9 }
        ));
    }

    #[test]
    fn header_only_file_is_empty() {
        let file = write_csv(&[HEADER]);
        assert!(matches!(load_csv(file.path()), Err(DatasetError::Empty)));
    }

    #[test]
    fn encoders_cover_categoricals_and_label() {
        let file = write_csv(&[
            HEADER,
            "P001,45,Yes,No,No,6,3,2,No,Low",
            "P002,61,No,Yes,Yes,3,1,8,Yes,High",
        ]);
        let rows = load_csv(file.path()).unwrap();
        let encoders = fit_encoders(&rows);
        assert!(encoders.validate().is_ok());
        let smoking = encoders.encoder("smoking").unwrap();
        assert_eq!(smoking.classes(), ["No".to_string(), "Yes".to_string()]);
        let label = encoders.encoder(schema::LABEL_COLUMN).unwrap();
        assert_eq!(label.classes(), ["High".to_string(), "Low".to_string()]);
    }

    #[test]
    fn encode_produces_numeric_rows_in_schema_order() {
        let file = write_csv(&[
            HEADER,
            "P001,45,Yes,No,No,6,3,2,No,Low",
            "P002,61,No,Yes,Yes,3,1,8,Yes,High",
        ]);
        let rows = load_csv(file.path()).unwrap();
        let encoders = fit_encoders(&rows);
        let (x, y) = encode(&rows, &encoders).unwrap();
        // Row 1: age 45, family Yes=1, smoking No=0, alcohol No=0, diet 6,
        // phys 3, symptom 2, mri No=0; label Low=1.
        assert_eq!(x[0], vec![45.0, 1.0, 0.0, 0.0, 6.0, 3.0, 2.0, 0.0]);
        assert_eq!(y, vec![1, 0]);
    }

    #[test]
    fn split_is_deterministic_for_a_seed() {
        let (train_a, test_a) = train_test_split(50, 0.2, 42);
        let (train_b, test_b) = train_test_split(50, 0.2, 42);
        assert_eq!(train_a, train_b);
        assert_eq!(test_a, test_b);
        assert_eq!(test_a.len(), 10);
        assert_eq!(train_a.len(), 40);
    }

    #[test]
    fn split_rounds_the_test_partition_up() {
        let (train, test) = train_test_split(11, 0.2, 7);
        assert_eq!(test.len(), 3);
        assert_eq!(train.len(), 8);
        let mut all: Vec<usize> = train.iter().chain(test.iter()).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..11).collect::<Vec<_>>());
    }

    #[test]
    fn different_seeds_shuffle_differently() {
        let (train_a, _) = train_test_split(50, 0.2, 1);
        let (train_b, _) = train_test_split(50, 0.2, 2);
        assert_ne!(train_a, train_b);
    }
}
