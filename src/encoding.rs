//! Categorical label encoding shared between training and inference.
//!
//! One encoder per categorical column, fitted once at training time,
//! serialized next to the model, and applied verbatim at inference. Codes are
//! assigned in sorted class order; the integers themselves carry no meaning
//! outside the encoder instance that produced them.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TriageError};
use crate::schema;

/// String-to-code bijection for one categorical column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Fit on every observed value. Classes are stored sorted and
    /// deduplicated, so code assignment is deterministic for a given value
    /// set regardless of row order.
    pub fn fit<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let classes: BTreeSet<&str> = values.into_iter().collect();
        Self {
            classes: classes.into_iter().map(str::to_string).collect(),
        }
    }

    pub fn from_classes(mut classes: Vec<String>) -> Self {
        classes.sort();
        classes.dedup();
        Self { classes }
    }

    /// Class names in code order.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Code for a known label; `None` for anything unseen at fit time.
    pub fn transform(&self, label: &str) -> Option<usize> {
        self.classes
            .binary_search_by(|class| class.as_str().cmp(label))
            .ok()
    }

    /// Label for a known code.
    pub fn inverse(&self, code: usize) -> Option<&str> {
        self.classes.get(code).map(String::as_str)
    }

    // Deserialized encoders are only trusted after this passes; transform
    // relies on the sorted-unique invariant.
    fn check(&self) -> std::result::Result<(), String> {
        if self.classes.is_empty() {
            return Err("encoder has no classes".to_string());
        }
        if self.classes.windows(2).any(|w| w[0] >= w[1]) {
            return Err("encoder classes must be sorted and unique".to_string());
        }
        Ok(())
    }
}

/// Encoders for every categorical column, persisted as a single artifact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EncoderSet {
    columns: BTreeMap<String, LabelEncoder>,
}

impl EncoderSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: &str, encoder: LabelEncoder) {
        self.columns.insert(column.to_string(), encoder);
    }

    pub fn encoder(&self, column: &str) -> Option<&LabelEncoder> {
        self.columns.get(column)
    }

    /// Structural check: exactly the schema's encoded columns, each with a
    /// well-formed encoder.
    pub fn validate(&self) -> std::result::Result<(), String> {
        for column in schema::encoded_columns() {
            match self.columns.get(column) {
                None => return Err(format!("missing encoder for column {column}")),
                Some(encoder) => encoder
                    .check()
                    .map_err(|e| format!("column {column}: {e}"))?,
            }
        }
        for column in self.columns.keys() {
            if !schema::encoded_columns().any(|expected| expected == column) {
                return Err(format!("unexpected encoder column {column}"));
            }
        }
        Ok(())
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        let set: Self = serde_json::from_str(&content)?;
        set.validate().map_err(TriageError::Validation)?;
        Ok(set)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let payload = serde_json::to_vec_pretty(self)?;
        std::fs::write(path, payload)?;
        Ok(())
    }
}
