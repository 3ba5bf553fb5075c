use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use serde::Serialize;

/// A general purpose HTTP error type that can be converted into an `IntoResponse`.
#[derive(Debug)]
pub struct HTTPError {
    status: StatusCode,
    message: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

impl HTTPError {
    /// Creates a new HTTP error with the given status code and message.
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        HTTPError {
            status,
            message: message.into(),
        }
    }

    /// The request was abandoned because the server is shutting down.
    pub fn shutting_down() -> Self {
        HTTPError::new(StatusCode::SERVICE_UNAVAILABLE, "Server is shutting down")
    }
}

/// Converts our `HTTPError` into a JSON response.
impl IntoResponse for HTTPError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: &self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

/// Milliseconds since the Unix epoch, as carried in every demo payload.
pub fn epoch_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
