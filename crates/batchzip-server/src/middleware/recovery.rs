//! Recovery from panics, timeouts and other middleware errors.
//!
//! The timeout bounds the time until the response head is produced. Once a
//! download starts streaming, its body is not subject to it.

use std::any::Any;
use std::time::Duration;

use axum::Router;
use axum::error_handling::HandleErrorLayer;
use axum::response::{IntoResponse, Response};
#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use tower::timeout::TimeoutLayer;
use tower::timeout::error::Elapsed;
use tower::{BoxError, ServiceBuilder};
use tower_http::catch_panic::CatchPanicLayer;

use crate::handler::{Error, ErrorKind};
use crate::middleware::TRACING_TARGET_RECOVERY;

/// Request timeout for the recovery layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct RecoveryConfig {
    /// Seconds to wait for the response head before answering with a 500
    #[cfg_attr(
        feature = "config",
        arg(long = "request-timeout", env = "REQUEST_TIMEOUT", default_value_t = 30)
    )]
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self::with_timeout_secs(default_request_timeout())
    }
}

impl RecoveryConfig {
    pub fn with_timeout_secs(request_timeout: u64) -> Self {
        Self { request_timeout }
    }

    #[inline]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

/// Adds panic catching and the request timeout to a [`Router`].
pub trait RouterRecoveryExt<S> {
    fn with_recovery(self, config: &RecoveryConfig) -> Self;

    /// [`with_recovery`](Self::with_recovery) using [`RecoveryConfig::default`].
    fn with_default_recovery(self) -> Self;
}

impl<S> RouterRecoveryExt<S> for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_recovery(self, config: &RecoveryConfig) -> Self {
        // Outermost first: the timeout error and panics are both turned into responses.
        self.layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(recover_error))
                .layer(CatchPanicLayer::custom(recover_panic))
                .layer(TimeoutLayer::new(config.request_timeout())),
        )
    }

    fn with_default_recovery(self) -> Self {
        self.with_recovery(&RecoveryConfig::default())
    }
}

async fn recover_error(err: BoxError) -> Error {
    if err.is::<Elapsed>() {
        tracing::warn!(target: TRACING_TARGET_RECOVERY, "Response head not ready in time");
        return ErrorKind::InternalServerError
            .with_message("Request timeout")
            .with_context(err.to_string());
    }

    tracing::error!(target: TRACING_TARGET_RECOVERY, error = %err, "Middleware failed");
    ErrorKind::InternalServerError
        .with_message("An unexpected error occurred")
        .with_context(err.to_string())
}

fn recover_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    if let Some(error) = payload.downcast_ref::<Error>() {
        tracing::error!(target: TRACING_TARGET_RECOVERY, error = %error, "Handler panicked");
        return error.clone().into_response();
    }

    tracing::error!(
        target: TRACING_TARGET_RECOVERY,
        panic = panic_message(payload.as_ref()),
        "Handler panicked"
    );
    ErrorKind::InternalServerError
        .with_message("An unexpected panic occurred")
        .into_response()
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "<non-string panic payload>"
    }
}
