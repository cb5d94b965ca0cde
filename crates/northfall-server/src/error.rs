use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Carries an explicit HTTP 404 through the `anyhow::Error` chain.
#[derive(Debug)]
struct NotFoundError(String);

impl std::fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for NotFoundError {}

// ---------------------------------------------------------------------------
// AppError: error type for the HTTP job routes
// ---------------------------------------------------------------------------

/// Anything not marked otherwise is a 500.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    /// An unknown job id.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self(NotFoundError(msg.into()).into())
    }

    pub fn status(&self) -> StatusCode {
        if self.0.downcast_ref::<NotFoundError>().is_some() {
            StatusCode::NOT_FOUND
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn not_found_maps_to_404_with_message() {
        let resp = AppError::not_found("job not found: j-1").into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let body = resp.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "job not found: j-1");
    }

    #[test]
    fn other_errors_map_to_500() {
        let io = std::io::Error::other("disk full");
        let err = AppError::from(northfall_core::NorthfallError::Io(io));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
