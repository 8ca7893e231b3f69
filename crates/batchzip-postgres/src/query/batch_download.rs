//! Batch download repository.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::{PgConnection, PgError, PgResult, TRACING_TARGET_QUERY, schema};

/// Repository for prepared batch downloads.
pub trait BatchDownloadRepository {
    /// Finds the manifest payload stored under a reference token.
    ///
    /// Returns `None` when no row matches. A matching row with a `NULL`
    /// payload is returned as an empty string.
    fn find_batch_download_files(
        &mut self,
        key: &str,
    ) -> impl Future<Output = PgResult<Option<String>>> + Send;
}

impl BatchDownloadRepository for PgConnection {
    async fn find_batch_download_files(&mut self, key: &str) -> PgResult<Option<String>> {
        use schema::batch_downloads::{self, dsl};

        let files_hash: Option<Option<String>> = batch_downloads::table
            .filter(dsl::key.eq(key))
            .select(dsl::files_hash)
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        tracing::debug!(
            target: TRACING_TARGET_QUERY,
            found = files_hash.is_some(),
            "Looked up batch download"
        );

        Ok(files_hash.map(Option::unwrap_or_default))
    }
}
