//! URL handling for Scrape-Guardrails
//!
//! This module loads the input URL list and maps URLs to snapshot file names.

mod list;

pub use list::{load_url_list, parse_url_list};

/// Prefix shared by every snapshot file
pub const SNAPSHOT_PREFIX: &str = "snap_";

/// Extension shared by every snapshot file
pub const SNAPSHOT_EXTENSION: &str = ".html";

/// Longest sanitized URL kept in a snapshot file name
const MAX_NAME_LEN: usize = 150;

/// Maps a URL to its snapshot file name
///
/// Every character outside `[A-Za-z0-9._-]` becomes `_` and the result is
/// truncated to 150 characters, so the name is safe on every filesystem.
/// Distinct URLs sharing a long common prefix can therefore share a snapshot.
///
/// # Examples
///
/// ```
/// use scrape_guardrails::url::snapshot_file_name;
///
/// assert_eq!(
///     snapshot_file_name("https://example.com/game?id=1"),
///     "snap_https___example.com_game_id_1.html"
/// );
/// ```
pub fn snapshot_file_name(url: &str) -> String {
    let sanitized: String = url
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_NAME_LEN)
        .collect();

    format!("{}{}{}", SNAPSHOT_PREFIX, sanitized, SNAPSHOT_EXTENSION)
}

/// True for names produced by [`snapshot_file_name`]
pub fn is_snapshot_file_name(name: &str) -> bool {
    name.starts_with(SNAPSHOT_PREFIX) && name.ends_with(SNAPSHOT_EXTENSION)
}
