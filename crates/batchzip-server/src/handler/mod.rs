//! HTTP handlers and the router.
//!
//! | Route | Handler |
//! |---|---|
//! | `GET /health` | [`health_check`] |
//! | `GET /?ref=<token>&downloadas=<name>` | [`download_archive`] |
//! | anything else | [`download_archive`] |

mod download;
mod error;
mod health;

use axum::Router;
use axum::routing::get;

pub use crate::handler::download::{DownloadQuery, download_archive};
pub use crate::handler::error::{Error, ErrorKind, Result};
pub use crate::handler::health::health_check;
use crate::service::ServiceState;

/// Returns a [`Router`] with all routes and the state applied.
///
/// Every path other than `/health` serves archives.
pub fn routes(state: ServiceState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/", get(download_archive))
        .fallback(download_archive)
        .with_state(state)
}

#[cfg(test)]
mod test {
    use std::io::{Cursor, Read};
    use std::sync::Arc;

    use axum::http::{StatusCode, header};
    use axum_test::TestServer;
    use batchzip_core::mock::{MockFetcher, MockObject, MockResolver};
    use bytes::Bytes;
    use zip::ZipArchive;

    use super::*;
    use crate::service::ArchiveConfig;

    const TWO_FILES: &str = r#"[
        {"S3Path":"","FileName":"missing.txt","Folder":"","FileId":"1","ProjectId":"0","ProjectName":""},
        {"S3Path":"k2","FileName":"kept.txt","Folder":"docs","FileId":"2","ProjectId":"0","ProjectName":""}
    ]"#;

    const THREE_FILES: &str = r#"[
        {"S3Path":"k1","FileName":"one.txt","FileId":"1","ProjectId":"0"},
        {"S3Path":"k2","FileName":"two.txt","FileId":"2","ProjectId":"0"},
        {"S3Path":"k3","FileName":"three.txt","FileId":"3","ProjectId":"0"}
    ]"#;

    const PROJECT_FILE: &str = r#"[{"S3Path":"k1","FileName":"a<1>.jpg","Folder":"Level 1/Level 2",
        "FileId":"4170","ProjectId":"23216","ProjectName":"Super:man","modified":"2015-07-18T02:05:04Z"}]"#;

    fn create_test_server(resolver: MockResolver, fetcher: MockFetcher) -> TestServer {
        let state = ServiceState::from_parts(
            Arc::new(resolver),
            Arc::new(fetcher),
            &ArchiveConfig::default(),
        );
        TestServer::new(routes(state)).unwrap()
    }

    fn read_archive(bytes: &[u8]) -> Vec<(String, String)> {
        let mut archive = ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
        (0..archive.len())
            .map(|index| {
                let mut file = archive.by_index(index).unwrap();
                let mut contents = String::new();
                file.read_to_string(&mut contents).unwrap();
                (file.name().to_owned(), contents)
            })
            .collect()
    }

    #[tokio::test]
    async fn health_endpoint() -> anyhow::Result<()> {
        let resolver = MockResolver::new();
        let server = create_test_server(resolver.clone(), MockFetcher::new());

        let response = server.get("/health").await;
        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.text(), "ok");
        assert_eq!(resolver.calls(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn missing_reference_returns_usage() -> anyhow::Result<()> {
        let resolver = MockResolver::new();
        let fetcher = MockFetcher::new();
        let server = create_test_server(resolver.clone(), fetcher.clone());

        let response = server.get("/").add_query_param("downloadas", "x.zip").await;
        assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.text(), "S3 File Zipper. Pass ?ref= to use.\n");
        assert_eq!(
            response.header(header::CONTENT_TYPE),
            "text/plain; charset=utf-8"
        );
        assert_eq!(resolver.calls(), 0);
        assert_eq!(fetcher.calls(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn unknown_reference_is_forbidden() -> anyhow::Result<()> {
        let fetcher = MockFetcher::new();
        let server = create_test_server(MockResolver::new(), fetcher.clone());

        let response = server.get("/").add_query_param("ref", "nope").await;
        assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(response.text(), "Could not find that batch download.\n");
        assert!(response.maybe_header(header::CONTENT_DISPOSITION).is_none());
        assert_eq!(fetcher.calls(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn undecodable_manifest_is_forbidden() -> anyhow::Result<()> {
        let resolver = MockResolver::new().with_payload("bad", "{oops");
        let server = create_test_server(resolver, MockFetcher::new());

        let response = server.get("/").add_query_param("ref", "bad").await;
        assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(response.text(), "Error decoding json: {oops\n");
        Ok(())
    }

    #[tokio::test]
    async fn backend_failure_hides_details() -> anyhow::Result<()> {
        let resolver = MockResolver::new().with_backend_error("abc", "password authentication failed");
        let server = create_test_server(resolver, MockFetcher::new());

        let response = server.get("/").add_query_param("ref", "abc").await;
        assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(response.text(), "Could not load that batch download.\n");
        Ok(())
    }

    #[tokio::test]
    async fn empty_reference_reaches_resolver() -> anyhow::Result<()> {
        let resolver = MockResolver::new();
        let server = create_test_server(resolver.clone(), MockFetcher::new());

        let response = server.get("/?ref=").await;
        assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(resolver.calls(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn streams_archive_with_headers() -> anyhow::Result<()> {
        let resolver = MockResolver::new().with_payload("abc", TWO_FILES);
        let fetcher = MockFetcher::new().with_chunks("k2", ["kept ", "contents"]);
        let server = create_test_server(resolver, fetcher.clone());

        let response = server
            .get("/")
            .add_query_param("ref", "abc")
            .add_query_param("downloadas", "Report: 2024.zip")
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.header(header::CONTENT_TYPE), "application/zip");
        assert_eq!(
            response.header(header::CONTENT_DISPOSITION),
            "attachment; filename=\"Report 2024.zip\""
        );
        assert_eq!(
            read_archive(response.as_bytes()),
            vec![("docs/kept.txt".to_owned(), "kept contents".to_owned())]
        );
        assert_eq!(fetcher.fetched(), vec!["k2".to_owned()]);
        Ok(())
    }

    #[tokio::test]
    async fn default_download_name() -> anyhow::Result<()> {
        let resolver = MockResolver::new().with_payload("abc", "[]");
        let server = create_test_server(resolver, MockFetcher::new());

        let response = server.get("/").add_query_param("ref", "abc").await;
        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(
            response.header(header::CONTENT_DISPOSITION),
            "attachment; filename=\"download.zip\""
        );
        assert!(read_archive(response.as_bytes()).is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn fetch_failure_still_succeeds() -> anyhow::Result<()> {
        let resolver = MockResolver::new().with_payload("abc", THREE_FILES);
        let fetcher = MockFetcher::new()
            .with_object("k2", "two")
            .with_object("k3", "three");
        let server = create_test_server(resolver, fetcher.clone());

        let response = server.get("/").add_query_param("ref", "abc").await;
        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(
            read_archive(response.as_bytes()),
            vec![
                ("two.txt".to_owned(), "two".to_owned()),
                ("three.txt".to_owned(), "three".to_owned()),
            ]
        );
        assert_eq!(fetcher.fetched(), vec!["k1", "k2", "k3"]);
        Ok(())
    }

    #[tokio::test]
    async fn every_fetch_failing_yields_empty_archive() -> anyhow::Result<()> {
        let resolver = MockResolver::new().with_payload("abc", THREE_FILES);
        let fetcher = MockFetcher::new()
            .with_failure("k1", "access denied")
            .with_failure("k3", "access denied");
        let server = create_test_server(resolver, fetcher);

        let response = server.get("/").add_query_param("ref", "abc").await;
        assert_eq!(response.status_code(), StatusCode::OK);
        assert!(read_archive(response.as_bytes()).is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn project_paths_are_sanitized() -> anyhow::Result<()> {
        let resolver = MockResolver::new().with_payload("abc", PROJECT_FILE);
        let fetcher = MockFetcher::new().with_object("k1", "jpeg");
        let server = create_test_server(resolver, fetcher);

        let response = server.get("/").add_query_param("ref", "abc").await;
        assert_eq!(
            read_archive(response.as_bytes()),
            vec![(
                "23216.Superman/Level 1/Level 2/a1.jpg".to_owned(),
                "jpeg".to_owned()
            )]
        );
        Ok(())
    }

    #[tokio::test]
    async fn broken_stream_truncates_entry() -> anyhow::Result<()> {
        let resolver = MockResolver::new().with_payload("abc", THREE_FILES);
        let fetcher = MockFetcher::new()
            .with("k1", MockObject::BrokenAfter(vec![Bytes::from_static(b"on")]))
            .with_object("k2", "two")
            .with_object("k3", "three");
        let server = create_test_server(resolver, fetcher);

        let response = server.get("/").add_query_param("ref", "abc").await;
        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(
            read_archive(response.as_bytes()),
            vec![
                ("one.txt".to_owned(), "on".to_owned()),
                ("two.txt".to_owned(), "two".to_owned()),
                ("three.txt".to_owned(), "three".to_owned()),
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn any_path_serves_archives() -> anyhow::Result<()> {
        let resolver = MockResolver::new().with_payload("abc", "[]");
        let server = create_test_server(resolver, MockFetcher::new());

        let response = server.get("/some/other/path").add_query_param("ref", "abc").await;
        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.header(header::CONTENT_TYPE), "application/zip");
        Ok(())
    }
}
