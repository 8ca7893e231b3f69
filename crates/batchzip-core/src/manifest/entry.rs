//! A single file descriptor within a manifest.

use std::fmt;

use serde::de::{IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use super::number;

/// One file descriptor within a [`Manifest`].
///
/// Field names follow the persisted wire shape; the object-store key is
/// stored as `S3Path`. Unknown fields are ignored, missing or `null` string
/// fields decode as empty strings and missing ids decode as `0`. A key that
/// appears more than once keeps its last value, and `Modified` and `modified`
/// count as the same key.
///
/// [`Manifest`]: super::Manifest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ManifestEntry {
    /// Display name of the file inside the archive (sanitized before use).
    pub file_name: String,

    /// Folder path inside the project, `/`-separated, possibly empty.
    pub folder: String,

    /// Object-store key. Empty means the entry is unusable.
    #[serde(rename = "S3Path")]
    pub remote_path: String,

    /// Identifier of the file in the preparing application.
    #[serde(serialize_with = "number::serialize")]
    pub file_id: i64,

    /// Identifier of the owning project. Values `<= 0` mean "no project".
    #[serde(serialize_with = "number::serialize")]
    pub project_id: i64,

    /// Display name of the owning project (sanitized before use).
    pub project_name: String,

    /// Raw modification timestamp in `YYYY-MM-DDTHH:MM:SSZ` form.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
}

impl ManifestEntry {
    /// Returns whether the entry carries an object-store key.
    #[inline]
    pub fn has_remote_path(&self) -> bool {
        !self.remote_path.is_empty()
    }

    /// Returns whether the entry belongs to a project.
    #[inline]
    pub fn has_project(&self) -> bool {
        self.project_id > 0
    }
}

impl<'de> Deserialize<'de> for ManifestEntry {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(EntryVisitor)
    }
}

struct EntryVisitor;

impl<'de> Visitor<'de> for EntryVisitor {
    type Value = ManifestEntry;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a manifest entry object")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut entry = ManifestEntry::default();
        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "FileName" => entry.file_name = map.next_value::<StringOrNull>()?.0,
                "Folder" => entry.folder = map.next_value::<StringOrNull>()?.0,
                "S3Path" => entry.remote_path = map.next_value::<StringOrNull>()?.0,
                "FileId" => entry.file_id = map.next_value::<Id>()?.0,
                "ProjectId" => entry.project_id = map.next_value::<Id>()?.0,
                "ProjectName" => entry.project_name = map.next_value::<StringOrNull>()?.0,
                "Modified" | "modified" => entry.modified = map.next_value()?,
                _ => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }
        Ok(entry)
    }
}

/// String field where `null` reads as empty.
struct StringOrNull(String);

impl<'de> Deserialize<'de> for StringOrNull {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Self(Option::<String>::deserialize(deserializer)?.unwrap_or_default()))
    }
}

struct Id(i64);

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        number::deserialize(deserializer).map(Self)
    }
}
