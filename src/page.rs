use crate::{config::WikiConfig, error::WikiGraphError, links::TextRange, paths::page_name};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use titlecase::titlecase;
use std::{
    collections::BTreeMap,
    fmt::Write,
    path::{Path, PathBuf},
};

/// The authoritative page list, keyed by page path.
pub type PageMap = BTreeMap<String, Page>;

static HEADING_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^#+[ \t]*(.+)$").expect("heading pattern is valid"));

/// The title of a document: the text of its first heading line, trimmed.
pub fn extract_title(contents: &str) -> Option<String> {
    HEADING_PATTERN
        .captures(contents)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|title| !title.is_empty())
}

/// Initial text of a newly created page: its name as a title-cased heading. A `YYYY-MM-DD`
/// name is a daily page and gets its date rendered with `config.daily_title_format` instead.
pub fn new_page_contents(name: &str, config: &WikiConfig) -> Result<String, WikiGraphError> {
    let name = name.trim();
    let mut contents = String::from("# ");
    match NaiveDate::parse_from_str(name, "%Y-%m-%d") {
        Ok(date) => write!(contents, "{}", date.format(&config.daily_title_format))?,
        Err(_) => contents.push_str(&titlecase(name)),
    }
    contents.push_str("\n\n");
    Ok(contents)
}

/// Where in some document a reference appears: the document's locator and the range of the
/// referenced text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub locator: PathBuf,
    pub range: TextRange,
}

/// An incoming reference, stored on the referenced page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackLink {
    pub location: Location,
    /// The full line of the referencing document containing the link.
    pub line_preview: String,
}

impl BackLink {
    pub fn is_from(&self, locator: &Path) -> bool {
        self.location.locator == locator
    }
}

/// An indexed document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Absolute location of the backing file.
    pub locator: PathBuf,
    /// Slash-delimited path relative to the indexed root. Unique and immutable.
    pub path: String,
    pub name: String,
    pub title: Option<String>,
    pub contents: Option<String>,
    pub back_links: Vec<BackLink>,
}

impl Page {
    pub fn new(locator: PathBuf, path: String) -> Page {
        let name = page_name(&path).to_string();
        Page {
            locator,
            path,
            name,
            title: None,
            contents: None,
            back_links: Vec::new(),
        }
    }

    /// Replace the page's contents and rederive its title.
    pub fn set_contents(&mut self, contents: String) {
        self.title = extract_title(&contents);
        self.contents = Some(contents);
    }

    pub fn is_loaded(&self) -> bool {
        self.contents.is_some()
    }

    /// Label for tree and list displays: the title, else the name.
    pub fn display_name(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.name)
    }

    /// Label for a page appearing as the source of a backlink: the title, else the path.
    pub fn source_label(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_pages_start_with_a_title_cased_heading() {
        let contents = new_page_contents(" project ideas ", &WikiConfig::default()).unwrap();
        assert_eq!(contents, "# Project Ideas\n\n");
        assert_eq!(extract_title(&contents).as_deref(), Some("Project Ideas"));
    }

    #[test]
    fn daily_pages_get_a_formatted_date_heading() {
        let config = WikiConfig::default();
        assert_eq!(
            new_page_contents("2024-03-01", &config).unwrap(),
            "# March 1, 2024\n\n"
        );
        let iso = WikiConfig {
            daily_title_format: "%A %d.%m.%Y".to_string(),
            ..WikiConfig::default()
        };
        assert_eq!(
            new_page_contents("2024-03-01", &iso).unwrap(),
            "# Friday 01.03.2024\n\n"
        );
        // Not a real date, so it is an ordinary name.
        assert_eq!(
            new_page_contents("2024-13-45", &config).unwrap(),
            "# 2024-13-45\n\n"
        );
    }

    #[test]
    fn invalid_daily_title_format_is_an_error() {
        let config = WikiConfig {
            daily_title_format: "%Q".to_string(),
            ..WikiConfig::default()
        };
        assert!(matches!(
            new_page_contents("2024-03-01", &config),
            Err(WikiGraphError::Config(_))
        ));
    }

    #[test]
    fn title_is_first_heading() {
        assert_eq!(extract_title("# Home\n[[About]]").as_deref(), Some("Home"));
        assert_eq!(
            extract_title("intro\n## Second Level  \n# Later").as_deref(),
            Some("Second Level")
        );
        assert_eq!(extract_title("###NoSpace").as_deref(), Some("NoSpace"));
    }

    #[test]
    fn no_heading_means_no_title() {
        assert_eq!(extract_title("just text\nmore"), None);
        assert_eq!(extract_title("#\n"), None);
        assert_eq!(extract_title(""), None);
    }

    #[test]
    fn new_page_derives_name() {
        let page = Page::new(PathBuf::from("/wiki/dir/My Note.md"), "dir/My Note.md".into());
        assert_eq!(page.name, "My Note");
        assert_eq!(page.display_name(), "My Note");
        assert_eq!(page.source_label(), "dir/My Note.md");
        assert!(!page.is_loaded());
    }

    #[test]
    fn set_contents_updates_title() {
        let mut page = Page::new(PathBuf::from("/wiki/a.md"), "a.md".into());
        page.set_contents("# Alpha\nbody".to_string());
        assert_eq!(page.title.as_deref(), Some("Alpha"));
        assert_eq!(page.display_name(), "Alpha");
        page.set_contents("no heading".to_string());
        assert_eq!(page.title, None);
        assert!(page.is_loaded());
    }
}
