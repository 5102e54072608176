use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::json;
use tracing::error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Display)]
pub enum AppError {
    #[display(fmt = "Date of leaving must be after date of joining")]
    InvalidRange,

    #[display(fmt = "No available codes in the {} range of {}", _1, _0)]
    AllocationExhausted(String, String),

    #[display(fmt = "Employee {} is already deleted", _0)]
    AlreadyDeleted(u64),

    #[display(fmt = "Employee {} not found", _0)]
    NotFound(u64),

    #[display(fmt = "Salary for employee {} is not set", _0)]
    MissingRate(String),

    #[display(fmt = "Incomplete attendance data for employee {} for {}", _0, _1)]
    IncompleteAttendance(String, String),

    #[display(fmt = "Invalid organization: {}", _0)]
    InvalidOrganization(String),

    #[display(fmt = "{}", _0)]
    Validation(String),

    #[display(fmt = "{} of {} writes failed", failed, total)]
    PartialWrite { failed: usize, total: usize },

    #[display(fmt = "Storage error: {}", _0)]
    Storage(String),
}

impl std::error::Error for AppError {}

impl AppError {
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::InvalidRange => "InvalidRange",
            AppError::AllocationExhausted(..) => "AllocationExhausted",
            AppError::AlreadyDeleted(_) => "AlreadyDeleted",
            AppError::NotFound(_) => "NotFound",
            AppError::MissingRate(_) => "MissingRate",
            AppError::IncompleteAttendance(..) => "IncompleteAttendance",
            AppError::InvalidOrganization(_) => "InvalidOrganization",
            AppError::Validation(_) => "Validation",
            AppError::PartialWrite { .. } => "PartialWrite",
            AppError::Storage(_) => "Storage",
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidRange | AppError::AlreadyDeleted(_) | AppError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::AllocationExhausted(..) => StatusCode::CONFLICT,
            AppError::MissingRate(_)
            | AppError::IncompleteAttendance(..)
            | AppError::InvalidOrganization(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::PartialWrite { .. } | AppError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AppError::Storage(detail) => {
                error!(error = %detail, "Storage failure");
                "Something went wrong, Contact with system admin".to_string()
            }
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(json!({
            "error": self.kind(),
            "message": message,
        }))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Storage(e.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        AppError::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Storage(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_taxonomy_to_status() {
        assert_eq!(AppError::NotFound(3).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::InvalidRange.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::AllocationExhausted("Mittal Spinners".into(), "Staff".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::IncompleteAttendance("12".into(), "02/2024".into()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn message_names_the_subject() {
        let e = AppError::AllocationExhausted("HRM Spinners".into(), "Labor".into());
        assert_eq!(e.to_string(), "No available codes in the Labor range of HRM Spinners");
        assert_eq!(e.kind(), "AllocationExhausted");
    }
}
