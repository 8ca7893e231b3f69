//! Database query repositories.

mod batch_download;

pub use batch_download::BatchDownloadRepository;
