//! Mapping between collection names and remote file paths.

/// Extension of every collection file.
pub const EXTENSION: &str = "json";

/// The final `.`-separated segment of `path`, or `None` without a `.`.
pub fn file_extension(path: &str) -> Option<&str> {
    path.rsplit_once('.').map(|(_, extension)| extension)
}

/// `path` minus its final extension.
pub fn file_stem(path: &str) -> &str {
    path.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(path)
}

/// Remote path of the collection called `name`.
pub fn collection_path(name: &str) -> String {
    format!("{}.{}", name, EXTENSION)
}

/// Collection name for a remote path, if the path holds a collection.
///
/// Only root-level files are collections.
pub fn collection_name(path: &str) -> Option<&str> {
    if path.contains('/') || file_extension(path)? != EXTENSION {
        return None;
    }
    let stem = file_stem(path);
    (!stem.is_empty()).then_some(stem)
}

/// Whether `name` maps to a file that discovery finds again.
pub fn is_valid_name(name: &str) -> bool {
    collection_name(&collection_path(name)) == Some(name)
}
