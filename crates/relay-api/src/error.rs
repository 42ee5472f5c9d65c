use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use relay_core::error::RelayError;

use crate::types::ErrorBody;

/// Wraps `RelayError` so handlers can just `?` their way out; maps the
/// internal taxonomy to stable HTTP status codes with no stack traces, per
/// the error-handling design.
pub struct ApiError(pub RelayError);

impl From<RelayError> for ApiError {
    fn from(e: RelayError) -> Self {
        Self(e)
    }
}

fn status_for(err: &RelayError) -> StatusCode {
    match err {
        RelayError::InvalidAddress(_)
        | RelayError::InvalidAmount(_)
        | RelayError::InvalidChannelId(_)
        | RelayError::InvalidDenom(_)
        | RelayError::SameChain => StatusCode::BAD_REQUEST,

        RelayError::Conflict => StatusCode::CONFLICT,
        RelayError::HtlcNotFound(_) => StatusCode::NOT_FOUND,

        RelayError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        RelayError::ReputationBlocked(_) => StatusCode::FORBIDDEN,
        RelayError::EmergencyBlocked => StatusCode::SERVICE_UNAVAILABLE,

        RelayError::NoHealthyEndpoint(_)
        | RelayError::Backpressure
        | RelayError::MonitorStalled(_)
        | RelayError::LeaseContended => StatusCode::SERVICE_UNAVAILABLE,

        RelayError::Stale { .. } => StatusCode::CONFLICT,

        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        let body = ErrorBody {
            code: self.0.code(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
