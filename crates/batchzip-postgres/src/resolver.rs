use batchzip_core::{Manifest, ManifestResolver, ResolveError};

use crate::query::BatchDownloadRepository;
use crate::{PgClient, TRACING_TARGET_QUERY};

#[async_trait::async_trait]
impl ManifestResolver for PgClient {
    async fn resolve(&self, token: &str) -> Result<Manifest, ResolveError> {
        let mut conn = self.get_connection().await.map_err(ResolveError::backend)?;
        let payload = conn
            .find_batch_download_files(token)
            .await
            .map_err(ResolveError::backend)?;

        match payload {
            Some(payload) if !payload.is_empty() => Ok(Manifest::from_json(&payload)?),
            _ => {
                tracing::debug!(target: TRACING_TARGET_QUERY, "No manifest stored for token");
                Err(ResolveError::NotFound)
            }
        }
    }
}
