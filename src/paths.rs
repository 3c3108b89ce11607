//! Helpers for turning file locators into slash-delimited page paths, and page names into the
//! file paths new pages are written to.

use crate::{config::WikiConfig, error::WikiGraphError};
use once_cell::sync::Lazy;
use regex::Regex;
use std::{
    borrow::Cow,
    path::{Component, Path, PathBuf, MAIN_SEPARATOR_STR},
};

static DAILY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}").expect("daily pattern is valid"));

static NON_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\-]").expect("non-word pattern is valid"));

/// Utility function to replace separators and convert to unicode (via to_string_lossy) on os path.
pub fn os_path_to_string<P: AsRef<Path>>(os_path_ref: P) -> String {
    os_path_ref
        .as_ref()
        .components()
        .map(|c| match c {
            Component::RootDir => Cow::from("".to_string()),
            _ => c.as_os_str().to_string_lossy(),
        })
        .collect::<Vec<_>>()
        .join("/")
}

pub fn string_to_os_path(path_string: &str) -> PathBuf {
    PathBuf::from(path_string.replace('/', MAIN_SEPARATOR_STR))
}

/// The slash-delimited path of `locator` relative to the indexed `root`.
pub fn relative_page_path<R: AsRef<Path>, L: AsRef<Path>>(
    root: R,
    locator: L,
) -> Result<String, WikiGraphError> {
    let relative = locator.as_ref().strip_prefix(root.as_ref())?;
    let path = os_path_to_string(relative);
    if path.is_empty() {
        return Err(WikiGraphError::NotFound(format!(
            "{:?} does not name a document under {:?}",
            locator.as_ref(),
            root.as_ref()
        )));
    }
    Ok(path)
}

/// Index of the '.' separating the final segment's stem from its extension, if any.
///
/// A leading dot (hidden file) does not count as an extension separator.
fn extension_separator(path: &str) -> Option<usize> {
    let segment_start = path.rfind('/').map(|idx| idx + 1).unwrap_or(0);
    match path[segment_start..].rfind('.') {
        Some(0) | None => None,
        Some(dot_idx) => Some(segment_start + dot_idx),
    }
}

/// `path` with the final segment's extension removed: `dir/page.md` -> `dir/page`.
pub fn strip_extension(path: &str) -> &str {
    match extension_separator(path) {
        Some(idx) => &path[..idx],
        None => path,
    }
}

/// The page name for a path: its final segment without extension.
pub fn page_name(path: &str) -> &str {
    let stem = strip_extension(path);
    match stem.rfind('/') {
        Some(idx) => &stem[idx + 1..],
        None => stem,
    }
}

/// The directory portion of a page path, or `None` for top-level pages.
pub fn parent_dir(path: &str) -> Option<&str> {
    path.rfind('/').map(|idx| &path[..idx])
}

/// Turn a free-form page name into a file-name-safe slug.
///
/// Whitespace becomes `-`; anything that is not a word character or `-` is dropped.
pub fn sanitize_name(name: &str) -> String {
    let dashed = name.replace(char::is_whitespace, "-");
    NON_WORD.replace_all(&dashed, "").into_owned()
}

/// The relative file path a new page named `name` should be written to.
///
/// Names are sanitized and lowercased and receive the document extension. Date-named pages
/// (`YYYY-MM-DD`) go to the configured daily directory.
pub fn page_file_path(name: &str, config: &WikiConfig) -> String {
    let extension = config.document_extension().unwrap_or("md");
    let suffix = format!(".{extension}");
    let name = name.trim();
    let stem = match name.len().checked_sub(suffix.len()) {
        Some(idx) if name.is_char_boundary(idx) && name[idx..].eq_ignore_ascii_case(&suffix) => {
            &name[..idx]
        }
        _ => name,
    };
    let mut file_name = sanitize_name(stem).to_lowercase();
    file_name.push_str(&suffix);

    match config.daily_directory.as_deref() {
        Some(daily_dir) if !daily_dir.is_empty() && DAILY_PATTERN.is_match(&file_name) => {
            format!("{}/{}", daily_dir.trim_end_matches('/'), file_name)
        }
        _ => file_name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_strip_directories_and_extension() {
        assert_eq!(page_name("a.md"), "a");
        assert_eq!(page_name("dir/sub/c.md"), "c");
        assert_eq!(page_name("dir.v2/readme"), "readme");
        assert_eq!(page_name("notes/.hidden"), ".hidden");
        assert_eq!(page_name("archive.tar.md"), "archive.tar");
    }

    #[test]
    fn strip_extension_only_touches_final_segment() {
        assert_eq!(strip_extension("my-page.md"), "my-page");
        assert_eq!(strip_extension("dir.d/page"), "dir.d/page");
        assert_eq!(strip_extension("dir.d/page.md"), "dir.d/page");
    }

    #[test]
    fn parent_dir_of_nested_and_top_level() {
        assert_eq!(parent_dir("dir/sub/c.md"), Some("dir/sub"));
        assert_eq!(parent_dir("a.md"), None);
    }

    #[test]
    fn relative_paths_are_slash_delimited() {
        let root = PathBuf::from("/wiki");
        let locator = root.join("dir").join("b.md");
        assert_eq!(relative_page_path(&root, &locator).unwrap(), "dir/b.md");
        assert!(relative_page_path(&root, PathBuf::from("/elsewhere/b.md")).is_err());
        assert!(relative_page_path(&root, &root).is_err());
    }

    #[test]
    fn sanitize_replaces_whitespace_and_drops_punctuation() {
        assert_eq!(sanitize_name("My New Page!"), "My-New-Page");
        assert_eq!(sanitize_name("what? why_not"), "what-why_not");
    }

    #[test]
    fn page_file_path_lowercases_and_adds_extension() {
        let config = WikiConfig::default();
        assert_eq!(page_file_path("My Page", &config), "my-page.md");
        assert_eq!(page_file_path("done.md", &config), "done.md");
        assert_eq!(page_file_path("Release Notes.MD", &config), "release-notes.md");
    }

    #[test]
    fn daily_pages_go_to_daily_directory() {
        let config = WikiConfig {
            daily_directory: Some("journal/".to_string()),
            ..Default::default()
        };
        assert_eq!(page_file_path("2024-03-01", &config), "journal/2024-03-01.md");
        assert_eq!(page_file_path("Ideas", &config), "ideas.md");
        assert_eq!(
            page_file_path("2024-03-01", &WikiConfig::default()),
            "2024-03-01.md"
        );
    }
}
