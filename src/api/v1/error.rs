use crate::api::v1::handler::ApiResponse;
use crate::application_port::*;
use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;
use tracing::warn;
use warp::http::StatusCode;
use warp::{Rejection, reject};

pub async fn recover_error(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    let (code, message) = if let Some(failure) = err.find::<ApiFailure>() {
        (failure.code.clone(), failure.message.clone())
    } else if err.is_not_found() {
        (ApiErrorCode::NotFound, "no such route".to_string())
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (ApiErrorCode::InvalidArgument, e.to_string())
    } else if let Some(e) = err.find::<warp::reject::InvalidQuery>() {
        (ApiErrorCode::InvalidArgument, e.to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (ApiErrorCode::NotFound, "method not allowed".to_string())
    } else {
        (
            ApiErrorCode::InternalError,
            format!("Unhandled error: {:?}", err),
        )
    };

    let status = code.status();
    let json = warp::reply::json(&ApiResponse::<()>::err(code, message));
    Ok(warp::reply::with_status(json, status))
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Error, Serialize)]
pub enum ApiErrorCode {
    #[error("Missing or malformed acting user")]
    Unauthenticated,
    #[error("Invalid argument")]
    InvalidArgument,
    #[error("Conflict")]
    Conflict,
    #[error("Forbidden")]
    Forbidden,
    #[error("Not found")]
    NotFound,
    #[error("Internal error")]
    InternalError,
}

impl ApiErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiErrorCode::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiErrorCode::InvalidArgument => StatusCode::BAD_REQUEST,
            ApiErrorCode::Conflict => StatusCode::CONFLICT,
            ApiErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ApiErrorCode::NotFound => StatusCode::NOT_FOUND,
            ApiErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Rejection carrying the code and a human readable detail.
#[derive(Debug, Error)]
#[error("{code}: {message}")]
pub struct ApiFailure {
    pub code: ApiErrorCode,
    pub message: String,
}

impl ApiFailure {
    pub fn new(code: ApiErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl reject::Reject for ApiFailure {}

impl From<RelationError> for ApiFailure {
    fn from(error: RelationError) -> Self {
        match error {
            RelationError::InvalidArgument(m) => ApiFailure::new(ApiErrorCode::InvalidArgument, m),
            RelationError::Conflict(m) => ApiFailure::new(ApiErrorCode::Conflict, m),
            RelationError::Forbidden(m) => ApiFailure::new(ApiErrorCode::Forbidden, m),
            RelationError::NotFound(m) => ApiFailure::new(ApiErrorCode::NotFound, m),
            RelationError::Store(e) => {
                warn!("Internal error: {}", e);
                // store details stay in the log
                ApiFailure::new(ApiErrorCode::InternalError, ApiErrorCode::InternalError.to_string())
            }
        }
    }
}

/// `map_err` adapter for handlers.
pub fn rejection(error: RelationError) -> Rejection {
    reject::custom(ApiFailure::from(error))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relation_errors_map_to_distinct_statuses() {
        let cases = [
            (RelationError::InvalidArgument("x".into()), StatusCode::BAD_REQUEST),
            (RelationError::Conflict("x".into()), StatusCode::CONFLICT),
            (RelationError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (RelationError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (RelationError::Store("db down".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, status) in cases {
            assert_eq!(ApiFailure::from(error).code.status(), status);
        }
    }

    #[test]
    fn store_details_are_not_leaked() {
        let failure = ApiFailure::from(RelationError::Store("password=hunter2".into()));
        assert!(!failure.message.contains("hunter2"));
    }
}
