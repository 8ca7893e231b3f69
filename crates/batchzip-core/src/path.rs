//! Archive path construction from untrusted name fragments.

use std::borrow::Cow;

use crate::ManifestEntry;

/// Characters removed from every untrusted name fragment.
pub const UNSAFE_CHARACTERS: [char; 10] = ['#', '<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Substituted when a file name sanitizes to nothing.
pub const FILE_NAME_FALLBACK: &str = "file";

/// Substituted when a project name sanitizes to nothing.
pub const PROJECT_NAME_FALLBACK: &str = "Project";

/// Substituted when the requested download name is absent or sanitizes to nothing.
pub const DOWNLOAD_NAME_FALLBACK: &str = "download.zip";

/// Strips every [`UNSAFE_CHARACTERS`] member from `raw`.
///
/// Returns `fallback` when nothing is left. Borrows `raw` when it is already safe.
pub fn sanitize<'a>(raw: &'a str, fallback: &'a str) -> Cow<'a, str> {
    if raw.is_empty() {
        return Cow::Borrowed(fallback);
    }

    if !raw.contains(&UNSAFE_CHARACTERS[..]) {
        return Cow::Borrowed(raw);
    }

    let cleaned: String = raw
        .chars()
        .filter(|c| !UNSAFE_CHARACTERS.contains(c))
        .collect();

    if cleaned.is_empty() {
        Cow::Borrowed(fallback)
    } else {
        Cow::Owned(cleaned)
    }
}

/// Builds the path of `entry` inside the produced archive.
///
/// The path is `{ProjectId}.{ProjectName}/` when the entry belongs to a
/// project, then the folder (with a trailing `/`), then the file name.
/// Only the project and file names are sanitized; the folder keeps its `/`
/// separators and separators inserted here are never stripped.
pub fn build_archive_path(entry: &ManifestEntry) -> String {
    let file_name = sanitize(&entry.file_name, FILE_NAME_FALLBACK);
    let mut path = String::with_capacity(
        entry.project_name.len() + entry.folder.len() + file_name.len() + 24,
    );

    if entry.has_project() {
        path.push_str(&entry.project_id.to_string());
        path.push('.');
        path.push_str(&sanitize(&entry.project_name, PROJECT_NAME_FALLBACK));
        path.push('/');
    }

    if !entry.folder.is_empty() {
        path.push_str(&entry.folder);
        if !entry.folder.ends_with('/') {
            path.push('/');
        }
    }

    path.push_str(&file_name);
    path
}
