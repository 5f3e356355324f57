use crate::{GuardError, GuardResult};
use std::path::Path;
use url::Url;

/// Parses a URL list: one URL per line
///
/// # Rules
///
/// - Surrounding whitespace is trimmed
/// - Blank lines and lines starting with `#` are skipped
/// - Every remaining line must be an absolute `http`/`https` URL
///
/// The URLs are returned as written (not normalized), in file order,
/// duplicates included: each line is one input and gets one output record.
///
/// # Returns
///
/// * `Ok(Vec<String>)` - The URLs to fetch (possibly empty)
/// * `Err(GuardError::InputList)` - A line is not a valid URL
pub fn parse_url_list(content: &str) -> GuardResult<Vec<String>> {
    let mut urls = Vec::new();

    for (line_no, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let url = Url::parse(line).map_err(|e| {
            GuardError::InputList(format!("line {}: invalid URL '{}': {}", line_no + 1, line, e))
        })?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(GuardError::InputList(format!(
                "line {}: unsupported scheme '{}' in '{}'",
                line_no + 1,
                url.scheme(),
                line
            )));
        }

        urls.push(line.to_string());
    }

    Ok(urls)
}

/// Reads and parses a URL list file
///
/// A missing file is an input error, raised before any fetch begins.
pub fn load_url_list(path: &Path) -> GuardResult<Vec<String>> {
    if !path.exists() {
        return Err(GuardError::InputList(format!(
            "URL file not found: {}",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(path)?;
    parse_url_list(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_skips_blank_and_comment_lines() {
        let content = "\n  https://a.example/game/1  \n# comment\nhttp://b.example/\n\n";
        let urls = parse_url_list(content).unwrap();
        assert_eq!(urls, vec!["https://a.example/game/1", "http://b.example/"]);
    }

    #[test]
    fn test_parse_keeps_duplicates() {
        let urls = parse_url_list("https://a.example/\nhttps://a.example/\n").unwrap();
        assert_eq!(urls.len(), 2);
    }

    #[test]
    fn test_parse_rejects_invalid_url() {
        let err = parse_url_list("https://a.example/\nnot a url\n").unwrap_err();
        assert!(matches!(err, GuardError::InputList(ref m) if m.contains("line 2")));
    }

    #[test]
    fn test_parse_rejects_non_http_scheme() {
        let err = parse_url_list("ftp://a.example/file\n").unwrap_err();
        assert!(matches!(err, GuardError::InputList(_)));
    }

    #[test]
    fn test_empty_list_is_allowed() {
        assert!(parse_url_list("\n# nothing yet\n").unwrap().is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_url_list(Path::new("/nonexistent/urls.txt")).unwrap_err();
        assert!(matches!(err, GuardError::InputList(ref m) if m.contains("not found")));
    }

    #[test]
    fn test_load_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "https://a.example/").unwrap();
        let urls = load_url_list(file.path()).unwrap();
        assert_eq!(urls, vec!["https://a.example/"]);
    }
}
