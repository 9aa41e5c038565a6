use axum::extract::State;
use axum::Json;
use serde_json::Value;

use crate::api::state::AppState;
use crate::api::types::{PredictionResponse, RiskLevel, WelcomeResponse};
use crate::encoding::EncoderSet;
use crate::error::PredictError;
use crate::schema::{self, ColumnKind};

/// GET /
pub async fn home() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: "Welcome to the Health Risk Prediction API!".to_string(),
    })
}

/// POST /predict
pub async fn predict(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Map<String, Value>>,
) -> Result<Json<PredictionResponse>, PredictError> {
    let features = encode_request(&body, &state.bundle.encoders)?;
    let code = state
        .bundle
        .forest
        .predict(&features)
        .map_err(|e| PredictError::Internal(e.to_string()))?;
    Ok(Json(PredictionResponse {
        risk_level: RiskLevel::from_class_code(code),
    }))
}

/// Validate a request body and assemble the feature vector in schema order.
///
/// Validation runs in contract order: every key must be present (the first
/// missing one is reported), then categorical values are looked up, then
/// numeric fields are coerced. A request with both an absent key and an
/// unknown category therefore reports the absent key.
fn encode_request(
    body: &serde_json::Map<String, Value>,
    encoders: &EncoderSet,
) -> Result<Vec<f64>, PredictError> {
    for column in &schema::FEATURE_COLUMNS {
        if !body.contains_key(column.name) {
            return Err(PredictError::MissingFeature(column.name));
        }
    }

    let mut encoded = vec![None::<f64>; schema::FEATURE_COLUMNS.len()];
    for (j, column) in schema::FEATURE_COLUMNS.iter().enumerate() {
        if column.kind != ColumnKind::Categorical {
            continue;
        }
        let value = body
            .get(column.name)
            .ok_or(PredictError::MissingFeature(column.name))?;
        let label = categorical_text(value);
        let encoder = encoders.encoder(column.name).ok_or_else(|| {
            PredictError::Internal(format!("no encoder loaded for {}", column.name))
        })?;
        match encoder.transform(&label) {
            Some(code) => encoded[j] = Some(code as f64),
            None => {
                return Err(PredictError::InvalidValue {
                    column: column.name,
                    value: label,
                })
            }
        }
    }

    let mut features = Vec::with_capacity(schema::FEATURE_COLUMNS.len());
    for (j, column) in schema::FEATURE_COLUMNS.iter().enumerate() {
        match encoded[j] {
            Some(code) => features.push(code),
            None => {
                let value = body
                    .get(column.name)
                    .ok_or(PredictError::MissingFeature(column.name))?;
                let number = value.as_f64().ok_or_else(|| {
                    PredictError::Internal(format!(
                        "invalid numeric value for {}: {}",
                        column.name, value
                    ))
                })?;
                features.push(number);
            }
        }
    }
    Ok(features)
}

/// Render a JSON value the way the error message shows it: bare text for
/// strings, compact JSON for everything else.
fn categorical_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
