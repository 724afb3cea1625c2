use rocket::http::Status;
use rocket::response::{self, Responder, Response};
use rocket::serde::json::Json;
use rocket::{catch, Request};
use serde::Serialize;
use thiserror::Error;

use std::io;
use std::sync::PoisonError;

use crate::data::UnknownVariant;

#[derive(Debug, Error)]
pub enum InternalError {
    #[error("{0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Import file exceeds the limit of {limit} bytes")]
    TooLarge { limit: u64 },
    #[error("Unsupported file: {0}")]
    UnsupportedFile(String),
    #[error("Column mapping validation failed")]
    Mapping(Vec<String>),
    #[error("Could not read spreadsheet: {0}")]
    Spreadsheet(String),
    #[error("Database error: {0}")]
    Database(String),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Generic internal error: {0}")]
    Internal(String),
}

impl InternalError {
    pub fn kind(&self) -> &'static str {
        match self {
            InternalError::Validation(_) => "validation",
            InternalError::NotFound(_) => "not_found",
            InternalError::Conflict(_) => "conflict",
            InternalError::TooLarge { .. } => "too_large",
            InternalError::UnsupportedFile(_) => "unsupported_file",
            InternalError::Mapping(_) => "mapping",
            InternalError::Spreadsheet(_) => "spreadsheet",
            InternalError::Database(_) => "database",
            InternalError::Io(_) => "io",
            InternalError::Internal(_) => "internal",
        }
    }

    pub fn status(&self) -> Status {
        match self {
            InternalError::Validation(_) => Status::BadRequest,
            InternalError::NotFound(_) => Status::NotFound,
            InternalError::Conflict(_) => Status::Conflict,
            InternalError::TooLarge { .. } => Status::PayloadTooLarge,
            InternalError::UnsupportedFile(_) => Status::UnsupportedMediaType,
            InternalError::Mapping(_) | InternalError::Spreadsheet(_) => Status::UnprocessableEntity,
            InternalError::Database(_) | InternalError::Io(_) | InternalError::Internal(_) => {
                Status::InternalServerError
            }
        }
    }
}

#[derive(Serialize, Debug)]
pub struct ErrorBody {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    details: Vec<String>,
}

impl<'r> Responder<'r, 'static> for InternalError {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();
        if status == Status::InternalServerError {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }

        let details = match &self {
            InternalError::Mapping(messages) => messages.clone(),
            _ => vec![],
        };
        let body = Json(ErrorBody {
            error: self.kind(),
            message: self.to_string(),
            details,
        });

        Response::build_from(body.respond_to(request)?)
            .status(status)
            .ok()
    }
}

/// Failures Rocket raises before a handler runs, such as a body that does not
/// deserialize or an unknown route, get the same JSON body as handler errors.
#[catch(default)]
pub fn json_catcher(status: Status, request: &Request<'_>) -> (Status, Json<ErrorBody>) {
    let error = match status.code {
        400 | 422 => "validation",
        404 => "not_found",
        413 => "too_large",
        415 => "unsupported_file",
        _ => "internal",
    };
    tracing::debug!(status = status.code, uri = %request.uri(), "request caught before handler");

    let body = ErrorBody {
        error,
        message: status.reason().unwrap_or("request failed").to_string(),
        details: vec![],
    };
    (status, Json(body))
}

impl<T> From<PoisonError<T>> for InternalError {
    fn from(e: PoisonError<T>) -> InternalError {
        InternalError::Internal(e.to_string())
    }
}

impl From<rusqlite::Error> for InternalError {
    fn from(e: rusqlite::Error) -> InternalError {
        match &e {
            rusqlite::Error::SqliteFailure(failure, message)
                if failure.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                InternalError::Conflict(
                    message
                        .clone()
                        .unwrap_or_else(|| "constraint violation".to_string()),
                )
            }
            _ => InternalError::Database(e.to_string()),
        }
    }
}

impl From<calamine::Error> for InternalError {
    fn from(e: calamine::Error) -> InternalError {
        InternalError::Spreadsheet(e.to_string())
    }
}

impl From<UnknownVariant> for InternalError {
    fn from(e: UnknownVariant) -> InternalError {
        InternalError::Validation(e.to_string())
    }
}

pub type InternalResult<T> = Result<T, InternalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_violations_become_conflicts() {
        let connection = rusqlite::Connection::open_in_memory().unwrap();
        connection
            .execute_batch("CREATE TABLE t (v INTEGER UNIQUE); INSERT INTO t VALUES (1);")
            .unwrap();

        let err = connection
            .execute("INSERT INTO t VALUES (1)", [])
            .map_err(InternalError::from)
            .unwrap_err();

        assert!(matches!(err, InternalError::Conflict(_)));
        assert_eq!(err.status(), Status::Conflict);
    }

    #[test]
    fn mapping_errors_are_unprocessable() {
        let err = InternalError::Mapping(vec!["Column 'X' was not found for 'Type'.".into()]);
        assert_eq!(err.status(), Status::UnprocessableEntity);
        assert_eq!(err.kind(), "mapping");
    }
}
