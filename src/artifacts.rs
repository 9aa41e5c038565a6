//! Persisted training artifacts and the read-only bundle the service runs
//! on. The model and the encoder set are separate files produced by the same
//! training run; a fingerprint recorded in the model ties the pair together
//! so a refitted encoder file can never be served against a stale model.

use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::info;

use crate::encoding::EncoderSet;
use crate::error::{Result, TriageError};
use crate::forest::RandomForest;
use crate::schema;

/// File name of the serialized forest.
pub const MODEL_FILE: &str = "forest.json";
/// File name of the serialized encoder set.
pub const ENCODERS_FILE: &str = "encoders.json";

/// Digest of the feature schema plus every fitted class list, in schema
/// order. Recomputed at load time and compared against the value the model
/// recorded at fit time.
pub fn schema_fingerprint(encoders: &EncoderSet) -> String {
    let mut hasher = Sha256::new();
    for column in &schema::FEATURE_COLUMNS {
        hasher.update(column.name.as_bytes());
        hasher.update([0u8]);
    }
    for column in schema::encoded_columns() {
        hasher.update(column.as_bytes());
        hasher.update([1u8]);
        if let Some(encoder) = encoders.encoder(column) {
            for class in encoder.classes() {
                hasher.update(class.as_bytes());
                hasher.update([0u8]);
            }
        }
    }
    hex::encode(hasher.finalize())
}

/// Artifact pair loaded once at service startup and shared read-only.
#[derive(Debug, Clone)]
pub struct ModelBundle {
    pub forest: RandomForest,
    pub encoders: EncoderSet,
}

impl ModelBundle {
    /// Load both artifacts from `dir` and cross-validate them, failing fast
    /// on any structural or fingerprint disagreement.
    pub fn load(dir: &Path) -> Result<Self> {
        let encoders = EncoderSet::from_file(dir.join(ENCODERS_FILE))?;
        let forest = RandomForest::from_file(dir.join(MODEL_FILE))?;

        if forest.n_features != schema::FEATURE_COLUMNS.len() {
            return Err(TriageError::Validation(format!(
                "model expects {} features but the schema has {}",
                forest.n_features,
                schema::FEATURE_COLUMNS.len()
            )));
        }
        let label_encoder = encoders.encoder(schema::LABEL_COLUMN).ok_or_else(|| {
            TriageError::Validation(format!(
                "encoder set is missing the {} column",
                schema::LABEL_COLUMN
            ))
        })?;
        if forest.classes.as_slice() != label_encoder.classes() {
            return Err(TriageError::Validation(
                "model classes disagree with the risk_level encoder".to_string(),
            ));
        }
        let fingerprint = schema_fingerprint(&encoders);
        if fingerprint != forest.encoder_fingerprint {
            return Err(TriageError::Validation(
                "encoder fingerprint mismatch: artifacts come from different training runs"
                    .to_string(),
            ));
        }

        info!(
            "Loaded model bundle: {} trees, classes {:?}",
            forest.trees.len(),
            forest.classes
        );
        Ok(Self { forest, encoders })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{FieldValue, RawRow};
    use crate::forest::{train_forest, TrainDataset, TrainOptions};
    use crate::{dataset, encoding::LabelEncoder};

    fn sample_rows() -> Vec<RawRow> {
        let mut rows = Vec::new();
        for i in 0..12 {
            let high = i % 2 == 0;
            rows.push(RawRow {
                fields: vec![
                    FieldValue::Number(40.0 + i as f64),
                    FieldValue::Text(if high { "Yes" } else { "No" }.to_string()),
                    FieldValue::Text("No".to_string()),
                    FieldValue::Text(if i % 3 == 0 { "Yes" } else { "No" }.to_string()),
                    FieldValue::Number(5.0),
                    FieldValue::Number(3.0),
                    FieldValue::Number(if high { 8.0 } else { 2.0 }),
                    FieldValue::Text(if high { "Yes" } else { "No" }.to_string()),
                ],
                label: if high { "High" } else { "Low" }.to_string(),
            });
        }
        rows
    }

    fn trained_pair() -> (RandomForest, EncoderSet) {
        let rows = sample_rows();
        let encoders = dataset::fit_encoders(&rows);
        let (x, y) = dataset::encode(&rows, &encoders).unwrap();
        let classes = encoders
            .encoder(schema::LABEL_COLUMN)
            .unwrap()
            .classes()
            .to_vec();
        let fingerprint = schema_fingerprint(&encoders);
        let options = TrainOptions {
            trees: 10,
            seed: 42,
            ..TrainOptions::default()
        };
        let forest = train_forest(&TrainDataset { classes, x, y }, &options, &fingerprint).unwrap();
        (forest, encoders)
    }

    #[test]
    fn fingerprint_is_stable_for_the_same_set() {
        let (_, encoders) = trained_pair();
        assert_eq!(schema_fingerprint(&encoders), schema_fingerprint(&encoders));
    }

    #[test]
    fn fingerprint_changes_when_a_class_list_changes() {
        let (_, mut encoders) = trained_pair();
        let before = schema_fingerprint(&encoders);
        encoders.insert(
            "smoking",
            LabelEncoder::fit(["No", "Yes", "Occasionally"]),
        );
        assert_ne!(before, schema_fingerprint(&encoders));
    }

    #[test]
    fn bundle_round_trips_through_a_directory() {
        let (forest, encoders) = trained_pair();
        let dir = tempfile::tempdir().unwrap();
        forest.save(dir.path().join(MODEL_FILE)).unwrap();
        encoders.save(dir.path().join(ENCODERS_FILE)).unwrap();
        let bundle = ModelBundle::load(dir.path()).unwrap();
        assert_eq!(bundle.forest.trees.len(), forest.trees.len());
        assert_eq!(bundle.encoders, encoders);
    }

    #[test]
    fn refitted_encoders_are_rejected_at_load() {
        let (forest, mut encoders) = trained_pair();
        let dir = tempfile::tempdir().unwrap();
        forest.save(dir.path().join(MODEL_FILE)).unwrap();
        // Same columns, different class inventory: a later training run that
        // saw new data.
        encoders.insert(
            "smoking",
            LabelEncoder::fit(["No", "Yes", "Occasionally"]),
        );
        encoders.save(dir.path().join(ENCODERS_FILE)).unwrap();
        let err = ModelBundle::load(dir.path()).unwrap_err();
        assert!(err.to_string().contains("fingerprint"), "{err}");
    }

    #[test]
    fn missing_model_file_fails_the_load() {
        let (_, encoders) = trained_pair();
        let dir = tempfile::tempdir().unwrap();
        encoders.save(dir.path().join(ENCODERS_FILE)).unwrap();
        assert!(ModelBundle::load(dir.path()).is_err());
    }
}
