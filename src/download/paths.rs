use std::path::{Path, PathBuf};

use url::Url;

/// Subdirectory holding one directory per photoset.
pub const SETS_DIR: &str = "sets";

/// Directory for photos that belong to no photoset.
pub const NOT_IN_SET_DIR: &str = "not-in-set";

/// Extension used when a URL's last path segment has none.
const FALLBACK_EXTENSION: &str = "jpg";

/// Where a batch of photos is materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination<'a> {
    Photoset(&'a str),
    NotInSet,
}

impl std::fmt::Display for Destination<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Destination::Photoset(id) => write!(f, "photoset {id}"),
            Destination::NotInSet => f.write_str("photos not in any set"),
        }
    }
}

/// Directory for a destination: `root/sets/<id>` or `root/not-in-set`.
pub fn collection_dir(root: &Path, destination: Destination<'_>) -> PathBuf {
    match destination {
        Destination::Photoset(id) => root.join(SETS_DIR).join(clean_component(id)),
        Destination::NotInSet => root.join(NOT_IN_SET_DIR),
    }
}

/// Final path for one photo: `<collection dir>/<photo id>.<ext>`.
pub fn item_path(root: &Path, destination: Destination<'_>, photo_id: &str, url: &Url) -> PathBuf {
    collection_dir(root, destination).join(format!(
        "{}.{}",
        clean_component(photo_id),
        extension_of(url)
    ))
}

/// The final dot-delimited suffix of the URL's last path segment.
///
/// Falls back to `jpg` when there is no usable suffix.
pub fn extension_of(url: &Url) -> &str {
    let segment = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or("");
    match segment.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) => ext,
        _ => FALLBACK_EXTENSION,
    }
}

/// Keep an API-supplied id from escaping its directory.
fn clean_component(id: &str) -> String {
    let cleaned: String = id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '@'))
        .collect();
    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned
    }
}

/// Temporary name a download streams into before being renamed into place.
pub fn part_path(download_path: &Path) -> PathBuf {
    let mut name = download_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    download_path.with_file_name(name)
}
