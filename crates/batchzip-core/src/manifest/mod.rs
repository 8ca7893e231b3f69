//! Manifest data model and wire decoding.
//!
//! A manifest is the ordered list of file descriptors a reference token
//! resolves to. It is stored (in Postgres or the cache) as a JSON array:
//!
//! ```json
//! [{"S3Path":"1/p23216.a1.jpg","FileName":"a1.jpg","Folder":"Level 1",
//!   "FileId":"4170","ProjectId":"23216","ProjectName":"Superman",
//!   "modified":"2015-07-18T02:05:04Z"}]
//! ```

mod entry;
mod number;

pub use entry::ManifestEntry;

use crate::TRACING_TARGET_MANIFEST;

/// Ordered sequence of [`ManifestEntry`] values resolved for one request.
///
/// Entry order is preserved into the produced archive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
}

impl Manifest {
    /// Creates a manifest from already decoded entries.
    pub fn new(entries: Vec<ManifestEntry>) -> Self {
        Self { entries }
    }

    /// Decodes a manifest from its persisted JSON representation.
    ///
    /// A JSON `null` decodes as an empty manifest. Any other payload that is
    /// not an array of entries is rejected along with the raw payload so the
    /// caller can report it.
    pub fn from_json(payload: &str) -> Result<Self, ManifestDecodeError> {
        match serde_json::from_str::<Option<Vec<ManifestEntry>>>(payload) {
            Ok(entries) => {
                let entries = entries.unwrap_or_default();
                tracing::debug!(
                    target: TRACING_TARGET_MANIFEST,
                    entries = entries.len(),
                    "Decoded manifest"
                );
                Ok(Self { entries })
            }
            Err(source) => {
                tracing::debug!(
                    target: TRACING_TARGET_MANIFEST,
                    error = %source,
                    payload_len = payload.len(),
                    "Failed to decode manifest"
                );
                Err(ManifestDecodeError {
                    payload: payload.to_owned(),
                    source,
                })
            }
        }
    }

    /// Returns the entries in manifest order.
    #[inline]
    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    /// Returns the number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the manifest has no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for Manifest {
    type IntoIter = std::vec::IntoIter<ManifestEntry>;
    type Item = ManifestEntry;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl FromIterator<ManifestEntry> for Manifest {
    fn from_iter<T: IntoIterator<Item = ManifestEntry>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// A manifest payload that could not be decoded.
///
/// The display form is the client-facing message and includes the raw payload.
#[derive(Debug, thiserror::Error)]
#[error("Error decoding json: {payload}")]
pub struct ManifestDecodeError {
    payload: String,
    #[source]
    source: serde_json::Error,
}

impl ManifestDecodeError {
    /// Returns the raw payload that failed to decode.
    pub fn payload(&self) -> &str {
        &self.payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[{"S3Path":"1\/p23216.tf_A89A5199.Avis_Rent_A_Car_Print_Reservation.pdf","FileVersionId":"4164","FileName":"Avis Rent A Car_ Print Reservation.pdf","ProjectName":"Superman","ProjectId":"23216","Folder":"","FileId":"4169"},{"modified":"2015-07-18T02:05:04Z","S3Path":"1\/p23216.tf_351310E0.a1.jpg","FileVersionId":"4165","FileName":"a1.jpg","ProjectName":"Superman","ProjectId":"23216","Folder":"Level 1\/Level 2 x\/Level 3","FileId":"4170"}]"#;

    #[test]
    fn decodes_persisted_payload() {
        let manifest = Manifest::from_json(SAMPLE).unwrap();
        assert_eq!(manifest.len(), 2);

        let first = &manifest.entries()[0];
        assert_eq!(first.file_name, "Avis Rent A Car_ Print Reservation.pdf");
        assert_eq!(first.file_id, 4169);
        assert_eq!(first.project_id, 23216);
        assert_eq!(first.folder, "");
        assert_eq!(first.modified, None);

        let second = &manifest.entries()[1];
        assert_eq!(second.folder, "Level 1/Level 2 x/Level 3");
        assert_eq!(second.remote_path, "1/p23216.tf_351310E0.a1.jpg");
        assert_eq!(second.modified.as_deref(), Some("2015-07-18T02:05:04Z"));
    }

    #[test]
    fn preserves_entry_order() {
        let manifest = Manifest::from_json(SAMPLE).unwrap();
        let ids: Vec<i64> = manifest.into_iter().map(|e| e.file_id).collect();
        assert_eq!(ids, vec![4169, 4170]);
    }

    #[test]
    fn null_payload_is_empty() {
        let manifest = Manifest::from_json("null").unwrap();
        assert!(manifest.is_empty());
    }

    #[test]
    fn invalid_payload_reports_raw_text() {
        let err = Manifest::from_json("{not json").unwrap_err();
        assert_eq!(err.payload(), "{not json");
        assert_eq!(err.to_string(), "Error decoding json: {not json");
    }

    #[test]
    fn non_numeric_id_fails_whole_manifest() {
        let payload = r#"[{"FileName":"a","S3Path":"k","FileId":"abc","ProjectId":"1"}]"#;
        assert!(Manifest::from_json(payload).is_err());
    }

    #[test]
    fn collects_from_iterator() {
        let manifest: Manifest = vec![ManifestEntry::default(), ManifestEntry::default()]
            .into_iter()
            .collect();
        assert_eq!(manifest.len(), 2);
    }
}
