//! Fixed column layout shared by the dataset loader, the trainer, and the
//! prediction API. Columns are positional: CSV headers are skipped, not read.

/// Kind of a dataset column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

/// A named feature column in the fixed layout.
#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
}

/// Identifier column; dropped before training and absent from requests.
pub const ID_COLUMN: &str = "patient_id";

/// Target column; present in the dataset, never in prediction requests.
pub const LABEL_COLUMN: &str = "risk_level";

/// The eight feature columns, in both CSV order and feature-vector order.
pub const FEATURE_COLUMNS: [Column; 8] = [
    Column { name: "age", kind: ColumnKind::Numeric },
    Column { name: "family_history", kind: ColumnKind::Categorical },
    Column { name: "smoking", kind: ColumnKind::Categorical },
    Column { name: "alcohol", kind: ColumnKind::Categorical },
    Column { name: "diet_score", kind: ColumnKind::Numeric },
    Column { name: "physical_activity", kind: ColumnKind::Numeric },
    Column { name: "symptom_score", kind: ColumnKind::Numeric },
    Column { name: "mri_abnormality", kind: ColumnKind::Categorical },
];

/// Total CSV columns: identifier, features, label.
pub const DATASET_COLUMNS: usize = FEATURE_COLUMNS.len() + 2;

/// Categorical feature columns in schema order.
pub fn categorical_features() -> impl Iterator<Item = &'static Column> {
    FEATURE_COLUMNS
        .iter()
        .filter(|c| c.kind == ColumnKind::Categorical)
}

/// Every column that gets a label encoder: categorical features plus the label.
pub fn encoded_columns() -> impl Iterator<Item = &'static str> {
    categorical_features()
        .map(|c| c.name)
        .chain(std::iter::once(LABEL_COLUMN))
}
