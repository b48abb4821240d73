use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use harvest::{CanonicalRecord, IntakeError, RawSubmission, ValidationError};
use serde::{Deserialize, Serialize};

pub type ServerResult<T> = Result<T, ServerError>;

/// Server error types
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Access denied: client IP {0} may not submit forms")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Message surfaced verbatim from the normalizer.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("record `{}` was already submitted", .candidate.id())]
    Duplicate {
        candidate: Box<CanonicalRecord>,
        resubmit: Box<ResubmitForm>,
    },

    /// The detail stays in the logs; clients get a generic message.
    #[error("The record could not be saved, please try again")]
    Store(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found")]
    NotFound,
}

/// API error response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// The original form fields plus `force: "true"`, ready to post back to
/// `/submit` once the user confirms the duplicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResubmitForm {
    pub id: String,
    pub variedad: String,
    pub tamano: String,
    pub numero_tallos: String,
    pub etapa: String,
    pub bloque: String,
    pub tipo: String,
    pub force: String,
}

impl ResubmitForm {
    pub fn from_raw(raw: &RawSubmission) -> Self {
        let field = |value: &Option<String>| value.clone().unwrap_or_default();
        Self {
            id: field(&raw.id),
            variedad: field(&raw.variety),
            tamano: field(&raw.size),
            numero_tallos: field(&raw.stem_count),
            etapa: field(&raw.stage),
            bloque: field(&raw.block),
            tipo: field(&raw.record_type),
            force: "true".to_string(),
        }
    }
}

impl ServerError {
    /// Maps an intake failure, keeping what a duplicate resubmission needs.
    pub fn from_intake(err: IntakeError, raw: &RawSubmission) -> Self {
        match err {
            IntakeError::Validation(err) => ServerError::Validation(err),
            IntakeError::Duplicate { candidate } => ServerError::Duplicate {
                candidate,
                resubmit: Box::new(ResubmitForm::from_raw(raw)),
            },
            IntakeError::Store { .. } => ServerError::Store(err.to_string()),
            IntakeError::Config(message) => ServerError::Config(message),
            other => ServerError::Internal(other.to_string()),
        }
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServerError::BadRequest(_) | ServerError::Validation(_) => StatusCode::BAD_REQUEST,
            ServerError::Duplicate { .. } => StatusCode::CONFLICT,
            ServerError::NotFound => StatusCode::NOT_FOUND,
            ServerError::Store(_) | ServerError::Internal(_) | ServerError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            ServerError::Forbidden(_) => "FORBIDDEN",
            ServerError::BadRequest(_) => "BAD_REQUEST",
            ServerError::Validation(_) => "VALIDATION_ERROR",
            ServerError::Duplicate { .. } => "DUPLICATE",
            ServerError::Store(_) => "STORE_ERROR",
            ServerError::Internal(_) => "INTERNAL_ERROR",
            ServerError::Config(_) => "CONFIG_ERROR",
            ServerError::NotFound => "NOT_FOUND",
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            ServerError::Validation(err) => Some(serde_json::json!({
                "reason": err.code(),
                "field": err.field(),
            })),
            ServerError::Duplicate {
                candidate,
                resubmit,
            } => Some(serde_json::json!({
                "candidate": candidate,
                "resubmit": resubmit,
            })),
            _ => None,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if let ServerError::Store(detail) | ServerError::Internal(detail) = &self {
            tracing::error!(code = self.error_code(), detail = %detail, "request failed");
        }

        let body = Json(ErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.to_string(),
                details: self.details(),
            },
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harvest::{Field, StoreError};

    fn raw() -> RawSubmission {
        RawSubmission {
            id: Some("QR-42".into()),
            variety: Some("freedom".into()),
            stem_count: Some("30".into()),
            block: Some("3".into()),
            record_type: Some("fin_corte".into()),
            ..Default::default()
        }
    }

    #[test]
    fn validation_maps_to_bad_request_with_verbatim_message() {
        let err = ServerError::from_intake(
            IntakeError::Validation(ValidationError::MissingField(Field::Id)),
            &raw(),
        );
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        assert_eq!(err.to_string(), "missing required field `id`");
    }

    #[test]
    fn store_failure_hides_the_detail() {
        let err = ServerError::from_intake(
            IntakeError::Store {
                store: "ledger".into(),
                persisted_to: Vec::new(),
                forced: false,
                source: StoreError::backend("disk full at /var/lib"),
            },
            &raw(),
        );
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.to_string().contains("/var/lib"));
    }

    #[test]
    fn resubmit_form_keeps_original_field_names() {
        let form = ResubmitForm::from_raw(&raw());
        let json = serde_json::to_value(&form).unwrap();
        assert_eq!(json["variedad"], "freedom");
        assert_eq!(json["tipo"], "fin_corte");
        assert_eq!(json["tamano"], "");
        assert_eq!(json["force"], "true");
    }
}
