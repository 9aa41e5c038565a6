//! Fitted forest artifact: flat-array trees, majority voting by averaged
//! leaf distributions, JSON persistence with structural validation on load.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TriageError};

/// Artifact format version accepted by this build.
pub const MODEL_VERSION: u32 = 1;

/// One node in a flattened decision tree. Children always refer to later
/// indices, which keeps traversal cycle-free by construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Node {
    /// Internal split: rows with `feature <= threshold` descend left.
    Split {
        feature: u32,
        threshold: f64,
        left: u32,
        right: u32,
    },
    /// Terminal node holding the class distribution of its training rows.
    Leaf { distribution: Vec<f64> },
}

/// A fitted CART tree stored as a flat node array with the root at index 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<Node>,
}

impl DecisionTree {
    /// Class distribution at the leaf reached by `features`. Assumes the
    /// tree passed validation; indices are then always in bounds.
    pub fn distribution(&self, features: &[f64]) -> &[f64] {
        let mut idx = 0usize;
        loop {
            match &self.nodes[idx] {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if features[*feature as usize] <= *threshold {
                        *left as usize
                    } else {
                        *right as usize
                    };
                }
                Node::Leaf { distribution } => return distribution,
            }
        }
    }
}

/// Random-forest classifier artifact.
///
/// Trees vote by summing their leaf class distributions; `predict` returns
/// the arg-max class code, an index into `classes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    /// Artifact format version.
    pub model_version: u32,
    /// Expected input dimension.
    pub n_features: usize,
    /// Ordered class names; predicted codes index into this list.
    pub classes: Vec<String>,
    /// Digest of the encoder schema this model was fitted against.
    pub encoder_fingerprint: String,
    pub trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Load a forest from a JSON file, rejecting anything structurally
    /// unsound before it can serve a prediction.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        let model: Self = serde_json::from_str(&content)?;
        model.validate().map_err(TriageError::Validation)?;
        Ok(model)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let payload = serde_json::to_vec_pretty(self)?;
        std::fs::write(path, payload)?;
        Ok(())
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.model_version != MODEL_VERSION {
            return Err(format!(
                "unsupported model version {} (expected {})",
                self.model_version, MODEL_VERSION
            ));
        }
        if self.n_features == 0 {
            return Err("model expects zero features".to_string());
        }
        if self.classes.len() < 2 {
            return Err(format!(
                "model declares {} classes, need at least 2",
                self.classes.len()
            ));
        }
        if self.trees.is_empty() {
            return Err("forest has no trees".to_string());
        }
        for (t, tree) in self.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                return Err(format!("tree {t} has no nodes"));
            }
            let len = tree.nodes.len();
            for (i, node) in tree.nodes.iter().enumerate() {
                match node {
                    Node::Split {
                        feature,
                        threshold,
                        left,
                        right,
                    } => {
                        if *feature as usize >= self.n_features {
                            return Err(format!(
                                "tree {t} node {i}: split feature {feature} out of range"
                            ));
                        }
                        if !threshold.is_finite() {
                            return Err(format!("tree {t} node {i}: non-finite threshold"));
                        }
                        // Forward-only children rule out cycles.
                        for child in [*left, *right] {
                            let child = child as usize;
                            if child <= i || child >= len {
                                return Err(format!(
                                    "tree {t} node {i}: child index {child} out of order"
                                ));
                            }
                        }
                    }
                    Node::Leaf { distribution } => {
                        if distribution.len() != self.classes.len() {
                            return Err(format!(
                                "tree {t} node {i}: leaf has {} entries for {} classes",
                                distribution.len(),
                                self.classes.len()
                            ));
                        }
                        if distribution.iter().any(|p| !p.is_finite() || *p < 0.0) {
                            return Err(format!(
                                "tree {t} node {i}: leaf distribution has invalid entries"
                            ));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Mean class distribution across all trees.
    pub fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>> {
        if features.len() != self.n_features {
            return Err(TriageError::Validation(format!(
                "feature vector has {} entries, model expects {}",
                features.len(),
                self.n_features
            )));
        }
        let mut acc = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            for (k, p) in tree.distribution(features).iter().enumerate() {
                acc[k] += p;
            }
        }
        let inv = 1.0 / self.trees.len() as f64;
        for v in &mut acc {
            *v *= inv;
        }
        Ok(acc)
    }

    /// Predicted class code, the index into `classes` with the highest vote.
    /// Ties resolve to the lowest code.
    pub fn predict(&self, features: &[f64]) -> Result<usize> {
        Ok(argmax(&self.predict_proba(features)?))
    }
}

fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate().skip(1) {
        if *v > values[best] {
            best = i;
        }
    }
    best
}
