use actix_web::{HttpResponse, http::StatusCode};
use thiserror::Error;

/// Workflow failures surfaced to the caller. Store/transport errors are not
/// part of this taxonomy; handlers map those to 500 directly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("{0} is required")]
    Validation(&'static str),

    #[error("end date cannot be earlier than start date")]
    InvalidRange,

    #[error("{0}")]
    InvalidState(&'static str),

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("request not found")]
    NotFound,
}

impl actix_web::ResponseError for WorkflowError {
    fn status_code(&self) -> StatusCode {
        match self {
            WorkflowError::Validation(_) | WorkflowError::InvalidRange => StatusCode::BAD_REQUEST,
            WorkflowError::InvalidState(_) => StatusCode::CONFLICT,
            WorkflowError::Forbidden(_) => StatusCode::FORBIDDEN,
            WorkflowError::NotFound => StatusCode::NOT_FOUND,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "message": self.to_string()
        }))
    }
}
