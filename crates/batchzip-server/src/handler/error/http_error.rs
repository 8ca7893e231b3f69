//! Plaintext error responses.

use std::borrow::Cow;
use std::fmt;

use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};

/// Result alias for handlers.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Why a request was answered without an archive.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No `ref` parameter; answered with the usage line.
    MissingReference,
    /// The reference did not resolve to a manifest.
    Forbidden,
    /// Panics, timeouts and middleware failures.
    #[default]
    InternalServerError,
}

impl ErrorKind {
    /// HTTP status answered for this kind; only `Forbidden` is not a 500.
    pub fn status_code(self) -> StatusCode {
        match self {
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::MissingReference | Self::InternalServerError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Body text used when the error carries no message of its own.
    pub fn default_message(self) -> &'static str {
        match self {
            Self::MissingReference => "S3 File Zipper. Pass ?ref= to use.",
            Self::Forbidden => "Forbidden",
            Self::InternalServerError => "Internal Server Error",
        }
    }

    /// Stable snake_case name, shown in the `Display` form of an [`Error`].
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingReference => "missing_reference",
            Self::Forbidden => "forbidden",
            Self::InternalServerError => "internal_server_error",
        }
    }

    /// Wraps the kind in an [`Error`] answered with [`Self::default_message`].
    #[inline]
    pub fn into_error(self) -> Error {
        Error::from(self)
    }

    /// Creates an [`Error`] of this kind answered with `message`.
    #[inline]
    pub fn with_message(self, message: impl Into<Cow<'static, str>>) -> Error {
        self.into_error().with_message(message)
    }

    /// Creates an [`Error`] of this kind carrying log-only `context`.
    #[inline]
    pub fn with_context(self, context: impl Into<String>) -> Error {
        self.into_error().with_context(context)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handler error rendered as `<message>\n` in `text/plain`.
///
/// `context` only reaches the logs.
#[derive(Debug, Clone, Default)]
#[must_use = "errors do nothing unless returned"]
pub struct Error {
    kind: ErrorKind,
    message: Option<Cow<'static, str>>,
    context: Option<String>,
}

impl Error {
    /// Replaces the response body text.
    pub fn with_message(mut self, message: impl Into<Cow<'static, str>>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Attaches detail that is logged but never sent to the client.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The text sent to the client.
    pub fn message(&self) -> &str {
        self.message
            .as_deref()
            .unwrap_or_else(|| self.kind.default_message())
    }

    #[inline]
    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            context: None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = self.kind.status_code().as_u16();
        write!(f, "{status} {}: {}", self.kind, self.message())?;
        match &self.context {
            Some(context) => write!(f, " ({context})"),
            None => Ok(()),
        }
    }
}

impl std::error::Error for Error {}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let mut response = (self.kind.status_code(), format!("{}\n", self.message())).into_response();
        let headers = response.headers_mut();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        headers.insert(header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
        response
    }
}

impl IntoResponse for ErrorKind {
    fn into_response(self) -> Response {
        self.into_error().into_response()
    }
}
