use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::PredictError;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WelcomeResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub risk_level: RiskLevel,
}

/// Error payload shared by every failure path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Risk Level
// ============================================================================

/// Binary risk label derived from the model's class prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    High,
    Low,
}

impl RiskLevel {
    /// Class code 1 is the high-risk class; every other code serves as low.
    pub fn from_class_code(code: usize) -> Self {
        if code == 1 {
            Self::High
        } else {
            Self::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Low => "Low",
        }
    }
}

impl IntoResponse for PredictError {
    fn into_response(self) -> Response {
        let status = match self {
            PredictError::MissingFeature(_) | PredictError::InvalidValue { .. } => {
                StatusCode::BAD_REQUEST
            }
            PredictError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_level_mapping_is_one_to_high() {
        assert_eq!(RiskLevel::from_class_code(1), RiskLevel::High);
        assert_eq!(RiskLevel::from_class_code(0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_class_code(7), RiskLevel::Low);
    }

    #[test]
    fn risk_level_serializes_as_bare_strings() {
        assert_eq!(serde_json::to_string(&RiskLevel::High).unwrap(), "\"High\"");
        assert_eq!(serde_json::to_string(&RiskLevel::Low).unwrap(), "\"Low\"");
    }
}
