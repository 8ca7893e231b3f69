//! Manifest resolution error to HTTP error conversion.

use batchzip_core::ResolveError;

use super::http_error::{Error as HttpError, ErrorKind};

/// Tracing target for resolution error conversions.
const TRACING_TARGET: &str = "batchzip_server::handler::resolve";

impl From<ResolveError> for HttpError {
    fn from(error: ResolveError) -> Self {
        match &error {
            ResolveError::Backend(source) => tracing::error!(
                target: TRACING_TARGET,
                error = %source,
                "Manifest backend failed"
            ),
            ResolveError::NotFound | ResolveError::Decode(_) => tracing::warn!(
                target: TRACING_TARGET,
                error = %error,
                "Manifest could not be resolved"
            ),
        }

        ErrorKind::Forbidden.with_message(error.client_message())
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use batchzip_core::Manifest;

    use super::*;

    #[test]
    fn every_resolution_failure_is_forbidden() {
        let decode = Manifest::from_json("{").unwrap_err();
        let errors = [
            ResolveError::NotFound,
            ResolveError::from(decode),
            ResolveError::backend("connection refused"),
        ];

        for error in errors {
            let error = HttpError::from(error);
            assert_eq!(error.kind(), ErrorKind::Forbidden);
            assert_eq!(error.into_response().status(), StatusCode::FORBIDDEN);
        }
    }

    #[test]
    fn backend_details_are_not_exposed() {
        let error = HttpError::from(ResolveError::backend("password authentication failed"));
        assert_eq!(error.message(), "Could not load that batch download.");
    }

    #[test]
    fn decode_failure_echoes_payload() {
        let decode = Manifest::from_json("nope").unwrap_err();
        let error = HttpError::from(ResolveError::from(decode));
        assert_eq!(error.message(), "Error decoding json: nope");
    }
}
