//! Archive download handler.

use std::time::Instant;

use axum::body::Body;
use axum::extract::{RawQuery, State};
use axum::http::{HeaderValue, Method, Uri, header};
use axum::response::{IntoResponse, Response};
use batchzip_core::path::DOWNLOAD_NAME_FALLBACK;
use batchzip_core::{SharedResolver, sanitize};
use tracing::Instrument;

use crate::TRACING_TARGET_DOWNLOAD;
use crate::archive::ArchiveSink;
use crate::handler::{Error, ErrorKind, Result};
use crate::service::ArchiveAssembler;

/// Query parameters of a download request.
///
/// Parsed from the raw query string; when a parameter repeats, the first
/// value wins. An empty `ref=` still counts as present.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DownloadQuery {
    /// Reference token (`ref`).
    pub reference: Option<String>,
    /// Requested archive file name (`downloadas`).
    pub download_as: Option<String>,
}

impl DownloadQuery {
    /// Parses a raw (still percent-encoded) query string.
    pub fn parse(raw: Option<&str>) -> Self {
        let mut query = Self::default();
        let Some(raw) = raw else {
            return query;
        };

        for (name, value) in url::form_urlencoded::parse(raw.as_bytes()) {
            match name.as_ref() {
                "ref" if query.reference.is_none() => {
                    query.reference = Some(value.into_owned());
                }
                "downloadas" if query.download_as.is_none() => {
                    query.download_as = Some(value.into_owned());
                }
                _ => {}
            }
        }

        query
    }

    /// Returns the sanitized archive file name, `download.zip` by default.
    pub fn file_name(&self) -> String {
        sanitize(
            self.download_as.as_deref().unwrap_or_default(),
            DOWNLOAD_NAME_FALLBACK,
        )
        .into_owned()
    }
}

/// Streams the archive for `?ref=<token>[&downloadas=<name>]`.
///
/// Resolution failures are answered before any archive byte is produced.
/// After that the headers are committed and the archive is written by a
/// background task, so later entry failures cannot change the status.
#[tracing::instrument(skip_all, fields(uri = %uri))]
pub async fn download_archive(
    State(resolver): State<SharedResolver>,
    State(assembler): State<ArchiveAssembler>,
    method: Method,
    uri: Uri,
    RawQuery(raw_query): RawQuery,
) -> Result<Response> {
    let started_at = Instant::now();
    let query = DownloadQuery::parse(raw_query.as_deref());

    let Some(reference) = query.reference.as_deref() else {
        let error = ErrorKind::MissingReference.into_error();
        log_rejection(&method, &uri, started_at, &error);
        return Err(error);
    };

    let manifest = match resolver.resolve(reference).await {
        Ok(manifest) => manifest,
        Err(err) => {
            let error = Error::from(err);
            log_rejection(&method, &uri, started_at, &error);
            return Err(error);
        }
    };

    let file_name = query.file_name();
    let disposition = content_disposition(&file_name);
    let (sink, body) = ArchiveSink::channel(assembler.channel_capacity());
    let entries = manifest.len();

    let assembly = async move {
        match assembler.assemble(manifest, sink).await {
            Ok(report) => tracing::info!(
                target: TRACING_TARGET_DOWNLOAD,
                method = %method,
                uri = %uri,
                elapsed = ?started_at.elapsed(),
                entries,
                written = report.written,
                skipped = report.skipped,
                truncated = report.truncated,
                "Download finished"
            ),
            Err(err) => tracing::info!(
                target: TRACING_TARGET_DOWNLOAD,
                method = %method,
                uri = %uri,
                elapsed = ?started_at.elapsed(),
                entries,
                error = %err,
                "Download aborted"
            ),
        }
    };
    tokio::spawn(assembly.instrument(tracing::Span::current()));

    let headers = [
        (header::CONTENT_TYPE, HeaderValue::from_static("application/zip")),
        (header::CONTENT_DISPOSITION, disposition),
    ];
    Ok((headers, Body::from_stream(body)).into_response())
}

/// Builds `attachment; filename="<name>"`.
///
/// Names that cannot be carried in a header (control characters) fall back
/// to the default name.
fn content_disposition(file_name: &str) -> HeaderValue {
    let value = format!("attachment; filename=\"{file_name}\"");
    HeaderValue::from_bytes(value.as_bytes()).unwrap_or_else(|_| {
        HeaderValue::from_static("attachment; filename=\"download.zip\"")
    })
}

fn log_rejection(method: &Method, uri: &Uri, started_at: Instant, error: &Error) {
    tracing::info!(
        target: TRACING_TARGET_DOWNLOAD,
        method = %method,
        uri = %uri,
        elapsed = ?started_at.elapsed(),
        error = %error,
        "Download rejected"
    );
}
