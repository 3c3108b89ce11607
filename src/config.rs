use crate::error::WikiGraphError;
use serde::{Deserialize, Serialize};
use std::{
    fs::{read_to_string, write},
    path::{Path, PathBuf},
};

/// Standard filename for a wiki's configuration, located at the indexed root.
pub const CONFIG_NAME: &str = "wikigraph.toml";

/// Default cap on the number of documents enumerated by a scan.
pub const DEFAULT_MAX_FILES: usize = 500;

/// Settings that shape how a wiki folder is indexed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WikiConfig {
    /// When false, `GraphSynchronizer::init` skips the scan and leaves the graph empty.
    pub enabled: bool,
    /// Glob (relative to the root) selecting document files.
    pub document_glob: String,
    /// Globs (relative to the root) excluded from enumeration and watching.
    pub ignored_files: Vec<String>,
    /// Upper bound on the number of documents indexed.
    pub max_files: usize,
    /// Directory that date-named pages (`YYYY-MM-DD`) are created in.
    pub daily_directory: Option<String>,
    /// `chrono` format for the heading of a new date-named page.
    pub daily_title_format: String,
}

/// Long date heading, e.g. `March 1, 2024`.
pub const DEFAULT_DAILY_TITLE_FORMAT: &str = "%B %-d, %Y";

impl Default for WikiConfig {
    fn default() -> Self {
        WikiConfig {
            enabled: true,
            document_glob: "**/*.md".to_string(),
            ignored_files: vec![
                "**/node_modules/**".to_string(),
                "**/.vscode/**".to_string(),
                "**/.github/**".to_string(),
            ],
            max_files: DEFAULT_MAX_FILES,
            daily_directory: None,
            daily_title_format: DEFAULT_DAILY_TITLE_FORMAT.to_string(),
        }
    }
}

impl WikiConfig {
    /// The extension implied by the document glob, e.g. `md` for `**/*.md`.
    pub fn document_extension(&self) -> Option<&str> {
        let (_, ext) = self.document_glob.rsplit_once("*.")?;
        if ext.is_empty() || ext.contains(['*', '/', '{']) {
            None
        } else {
            Some(ext)
        }
    }

    /// True when `relative_path` matches the document glob and none of the ignore globs, and no
    /// segment of it is hidden (starts with `.`).
    pub fn is_document(&self, relative_path: &str) -> bool {
        !is_hidden_path(relative_path)
            && glob_matches(&self.document_glob, relative_path)
            && !self.is_ignored(relative_path)
    }

    pub fn is_ignored(&self, relative_path: &str) -> bool {
        self.ignored_files
            .iter()
            .any(|glob| glob_matches(glob, relative_path))
    }
}

pub fn is_hidden_path(relative_path: &str) -> bool {
    relative_path
        .split('/')
        .any(|segment| segment.starts_with('.'))
}

/// Glob match where a leading `**/` also matches zero directories.
pub fn glob_matches(glob: &str, relative_path: &str) -> bool {
    glob_match::glob_match(glob, relative_path)
        || glob
            .strip_prefix("**/")
            .is_some_and(|rest| glob_match::glob_match(rest, relative_path))
}

pub trait ConfigProvider: Send + Sync {
    fn get_config(&self) -> Result<WikiConfig, WikiGraphError>;
    fn set_config(&self, config: &WikiConfig) -> Result<(), WikiGraphError>;
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TomlConfigProvider {
    path: PathBuf,
}

impl TomlConfigProvider {
    pub fn new(path: PathBuf) -> Self {
        TomlConfigProvider { path }
    }

    /// Provider for the conventional `wikigraph.toml` under `root`.
    pub fn for_root<P: AsRef<Path>>(root: P) -> Self {
        TomlConfigProvider::new(root.as_ref().join(CONFIG_NAME))
    }
}

impl ConfigProvider for TomlConfigProvider {
    fn get_config(&self) -> Result<WikiConfig, WikiGraphError> {
        tracing::debug!("Attempting to read wiki config from: {:?}", &self.path);
        if !self.path.exists() {
            tracing::debug!("Config file not found, using default configuration.");
            return Ok(WikiConfig::default());
        }
        let content = read_to_string(&self.path)?;
        let config: WikiConfig = toml::from_str(&content)?;
        if config.max_files == 0 {
            return Err(WikiGraphError::Config(
                "max_files must be greater than zero".to_string(),
            ));
        }
        Ok(config)
    }

    fn set_config(&self, config: &WikiConfig) -> Result<(), WikiGraphError> {
        tracing::debug!("Attempting to write wiki config to: {:?}", &self.path);
        let toml_string = toml::to_string(config)?;
        write(&self.path, toml_string)?;
        Ok(())
    }
}

pub fn get_content<P: AsRef<Path>>(path: P) -> Result<String, WikiGraphError> {
    tracing::debug!("Reading {:?}", path.as_ref());
    Ok(read_to_string(path)?)
}

pub async fn set_content<P: AsRef<Path>>(path: P, text: String) -> Result<(), WikiGraphError> {
    Ok(tokio::fs::write(path, text).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use test_log::test;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let provider = TomlConfigProvider::for_root(dir.path());
        assert_eq!(provider.get_config().unwrap(), WikiConfig::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_NAME),
            "daily_directory = \"journal\"\nmax_files = 10\n",
        )
        .unwrap();
        let config = TomlConfigProvider::for_root(dir.path()).get_config().unwrap();
        assert_eq!(config.daily_directory.as_deref(), Some("journal"));
        assert_eq!(config.max_files, 10);
        assert_eq!(config.document_glob, "**/*.md");
        assert!(config.enabled);
    }

    #[test]
    fn zero_max_files_is_rejected() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_NAME), "max_files = 0\n").unwrap();
        let res = TomlConfigProvider::for_root(dir.path()).get_config();
        assert!(matches!(res, Err(WikiGraphError::Config(_))));
    }

    #[test]
    fn set_then_get_preserves_config() {
        let dir = TempDir::new().unwrap();
        let provider = TomlConfigProvider::for_root(dir.path());
        let config = WikiConfig {
            enabled: false,
            ignored_files: vec!["drafts/**".to_string()],
            ..Default::default()
        };
        provider.set_config(&config).unwrap();
        assert_eq!(provider.get_config().unwrap(), config);
    }

    #[test]
    fn document_filter_honors_ignore_globs() {
        let config = WikiConfig::default();
        assert!(config.is_document("index.md"));
        assert!(config.is_document("notes/deep/page.md"));
        assert!(!config.is_document("notes/page.txt"));
        assert!(!config.is_document("web/node_modules/pkg/readme.md"));
        assert_eq!(config.document_extension(), Some("md"));
    }

    #[test]
    fn hidden_segments_are_never_documents() {
        let config = WikiConfig {
            ignored_files: Vec::new(),
            ..WikiConfig::default()
        };
        assert!(!config.is_document(".draft.md"));
        assert!(!config.is_document("notes/.draft.md"));
        assert!(!config.is_document(".obsidian/workspace.md"));
        assert!(config.is_document("notes/draft.md"));
        assert!(config.is_document("v1.2/notes.md"));
    }

    #[test]
    fn daily_title_format_defaults_to_long_date() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_NAME), "daily_title_format = \"%Y/%m/%d\"\n")
            .unwrap();
        let config = TomlConfigProvider::for_root(dir.path()).get_config().unwrap();
        assert_eq!(config.daily_title_format, "%Y/%m/%d");
        assert_eq!(WikiConfig::default().daily_title_format, DEFAULT_DAILY_TITLE_FORMAT);
    }

    #[tokio::test]
    async fn content_helpers_read_and_write_documents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("page.md");
        set_content(&path, "# Page\n".to_string()).await.unwrap();
        assert_eq!(get_content(&path).unwrap(), "# Page\n");
        assert!(matches!(
            get_content(dir.path().join("missing.md")),
            Err(WikiGraphError::NotFound(_))
        ));
    }
}
