//! Application state and dependency injection.

use batchzip_core::{SharedFetcher, SharedResolver};

use crate::TRACING_TARGET_SERVICE;
use crate::service::{ArchiveAssembler, ArchiveConfig, Result, ServiceConfig};

/// Application state.
///
/// Used for the [`State`] extraction (dependency injection). Both handles are
/// shared by every request and are never mutated after startup.
///
/// [`State`]: axum::extract::State
#[must_use = "state does nothing unless you use it"]
#[derive(Clone)]
pub struct ServiceState {
    resolver: SharedResolver,
    assembler: ArchiveAssembler,
}

impl ServiceState {
    /// Initializes application state from configuration.
    ///
    /// Connects the selected manifest backend and the object store.
    pub async fn from_config(config: &ServiceConfig) -> Result<Self> {
        config.validate()?;

        let resolver = config.connect_resolver().await?;
        let fetcher = config.connect_fetcher().await?;

        tracing::info!(
            target: TRACING_TARGET_SERVICE,
            backend = %config.manifest_backend,
            bucket = %config.s3_config.aws_bucket,
            "Service collaborators connected"
        );

        Ok(Self::from_parts(resolver, fetcher, &config.archive_config))
    }

    /// Assembles state from already constructed collaborators.
    pub fn from_parts(
        resolver: SharedResolver,
        fetcher: SharedFetcher,
        archive_config: &ArchiveConfig,
    ) -> Self {
        Self {
            resolver,
            assembler: archive_config.assembler(fetcher),
        }
    }
}

impl std::fmt::Debug for ServiceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceState")
            .field("assembler", &self.assembler)
            .finish_non_exhaustive()
    }
}

macro_rules! impl_di {
    ($($f:ident: $t:ty),+) => {$(
        impl axum::extract::FromRef<ServiceState> for $t {
            fn from_ref(state: &ServiceState) -> Self {
                state.$f.clone()
            }
        }
    )+};
}

impl_di!(resolver: SharedResolver);
impl_di!(assembler: ArchiveAssembler);
