use actix_web::{HttpResponse, ResponseError};
use std::fmt;

use crate::services::{AcquisitionError, SessionError};

#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    Validation(AcquisitionError),
    Template(tera::Error),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::BadRequest(msg) => f.write_str(msg),
            AppError::Conflict(msg) => f.write_str(msg),
            AppError::Validation(e) => write!(f, "{}", e),
            AppError::Template(e) => write!(f, "Template error: {}", e),
        }
    }
}

impl std::error::Error for AppError {}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let body = serde_json::json!({ "error": self.to_string() });
        match self {
            AppError::NotFound(_) => HttpResponse::NotFound().json(body),
            AppError::BadRequest(_) | AppError::Validation(_) => {
                HttpResponse::BadRequest().json(body)
            }
            AppError::Conflict(_) => HttpResponse::Conflict().json(body),
            AppError::Template(_) => {
                log::error!("{}", self);
                HttpResponse::InternalServerError().json(body)
            }
        }
    }
}

impl From<tera::Error> for AppError {
    fn from(err: tera::Error) -> Self {
        AppError::Template(err)
    }
}

impl From<AcquisitionError> for AppError {
    fn from(err: AcquisitionError) -> Self {
        AppError::Validation(err)
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Busy => AppError::Conflict(err.to_string()),
            SessionError::NoFile | SessionError::NotLoading => AppError::BadRequest(err.to_string()),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
