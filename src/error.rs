use log::*;

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};

use thiserror::Error;

use crate::forms::ValidationErrors;

#[derive(Error, Debug)]
pub enum Error {
  // 400
  #[error("malformed envelope: {0}")]
  MalformedEnvelope(String),

  // 422
  #[error("validation failed: {0}")]
  Validation(ValidationErrors),

  // 400
  #[error("bad request: {0}")]
  BadRequest(String),

  // Unique tag name collided with a concurrent insert.  Retried by the mapper.
  #[error("duplicate tag race: {0}")]
  DuplicateTagRace(String),

  #[error("storage failure: {0}")]
  StorageFailure(String),

  #[error("disconnected: {0}")]
  DisconnectedError(String),

  #[error("postgres error")]
  PgError {
    #[from]
    source: tokio_postgres::error::Error,
  },

  // Json error
  #[error("Json error: {source}")]
  JsonError {
    #[from]
    source: serde_json::Error,
  },

  #[error("crossbeam recv error")]
  RecvError {
    #[from]
    source: crossbeam_channel::RecvError,
  },

  #[error("std io error")]
  IOError {
    #[from]
    source: std::io::Error,
  },

  #[error("config error")]
  ConfigError {
    #[from]
    source: config::ConfigError,
  },

  #[error(transparent)]
  Other(#[from] anyhow::Error),
}

impl From<ValidationErrors> for Error {
  fn from(errors: ValidationErrors) -> Self {
    Error::Validation(errors)
  }
}

impl Error {
  /// The request itself was wrong; resubmitting it unchanged will fail again.
  pub fn is_invalid_input(&self) -> bool {
    match self {
      Error::MalformedEnvelope(_) | Error::Validation(_) | Error::BadRequest(_) => true,
      _ => false,
    }
  }

  /// The storage backend failed; the same request may succeed later.
  pub fn is_storage_failure(&self) -> bool {
    match self {
      Error::DuplicateTagRace(_) | Error::StorageFailure(_) |
      Error::DisconnectedError(_) | Error::PgError { .. } => true,
      _ => false,
    }
  }

  /// Postgres `unique_violation` (23505).
  pub fn is_unique_violation(&self) -> bool {
    match self {
      Error::PgError { source } => {
        source.code() == Some(&tokio_postgres::error::SqlState::UNIQUE_VIOLATION)
      },
      _ => false,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

// the ResponseError trait lets us convert errors to http responses with appropriate data
// https://actix.rs/docs/errors/
impl ResponseError for Error {
  fn status_code(&self) -> StatusCode {
    match self {
      Error::MalformedEnvelope(_) | Error::BadRequest(_) => StatusCode::BAD_REQUEST,
      Error::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
      Error::DisconnectedError(_) => StatusCode::BAD_GATEWAY,
      _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    match self {
      Error::Validation(ref errors) => {
        HttpResponse::build(StatusCode::UNPROCESSABLE_ENTITY).json(errors)
      },
      Error::MalformedEnvelope(ref message) | Error::BadRequest(ref message) => {
        HttpResponse::build(StatusCode::BAD_REQUEST).json(message)
      },
      Error::DisconnectedError(ref message) => {
        error!("Storage unavailable: {}", message);
        HttpResponse::build(StatusCode::BAD_GATEWAY).json("Storage unavailable, try again")
      },
      ref err => {
        error!("InternalServerError: {:?}", err);
        HttpResponse::InternalServerError().json("Internal Server Error")
      },
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn input_and_storage_errors_are_disjoint() {
    let mut errors = ValidationErrors::new();
    errors.add("title", "Title is required");
    let input = vec![
      Error::MalformedEnvelope("missing field".into()),
      Error::Validation(errors),
      Error::BadRequest("bad".into()),
    ];
    for err in input.iter() {
      assert!(err.is_invalid_input(), "{:?}", err);
      assert!(!err.is_storage_failure(), "{:?}", err);
    }

    let storage = vec![
      Error::StorageFailure("gone".into()),
      Error::DisconnectedError("gone".into()),
      Error::DuplicateTagRace("Crypto".into()),
    ];
    for err in storage.iter() {
      assert!(err.is_storage_failure(), "{:?}", err);
      assert!(!err.is_invalid_input(), "{:?}", err);
    }
  }

  #[test]
  fn status_codes() {
    assert_eq!(Error::MalformedEnvelope("x".into()).status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(Error::Validation(ValidationErrors::new()).status_code(),
      StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(Error::StorageFailure("x".into()).status_code(),
      StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(Error::DisconnectedError("x".into()).status_code(), StatusCode::BAD_GATEWAY);
  }
}
