use std::{fmt, io, path::StripPrefixError};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::task::JoinError;

#[cfg(feature = "service")]
use notify::{Error as NotifyError, ErrorKind as NotifyErrorKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum WikiGraphError {
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Custom error: {0}")]
    Custom(String),
    #[error("File System error: {0}")]
    Io(String),
    #[error("Item Not Found: {0}")]
    NotFound(String),
    #[error("You do not have permission to access this resource")]
    PermissionDenied,
    #[error("(De)Serialization error: {0}")]
    Serialization(String),
    #[error("File watcher error: {0}")]
    Watch(String),
}

impl From<StripPrefixError> for WikiGraphError {
    fn from(src: StripPrefixError) -> WikiGraphError {
        WikiGraphError::NotFound(format!("Strip prefix failed for path. Error: {src}"))
    }
}

impl From<toml::de::Error> for WikiGraphError {
    fn from(src: toml::de::Error) -> WikiGraphError {
        WikiGraphError::Serialization(format!("Toml deserialization error: {src}"))
    }
}

impl From<toml::ser::Error> for WikiGraphError {
    fn from(src: toml::ser::Error) -> WikiGraphError {
        WikiGraphError::Serialization(format!("Toml serialization error: {src}"))
    }
}

impl From<io::Error> for WikiGraphError {
    fn from(x: io::Error) -> Self {
        match x.kind() {
            io::ErrorKind::NotFound => WikiGraphError::NotFound(format!("{x}")),
            io::ErrorKind::PermissionDenied => WikiGraphError::PermissionDenied,
            _ => WikiGraphError::Io(format!("IOError: {}", x.kind())),
        }
    }
}

impl From<fmt::Error> for WikiGraphError {
    fn from(x: fmt::Error) -> Self {
        WikiGraphError::Config(format!("Formatting failed, check format strings: {x}"))
    }
}

impl From<JoinError> for WikiGraphError {
    fn from(x: JoinError) -> Self {
        WikiGraphError::Custom(format!("Background task failed: {x}"))
    }
}

#[cfg(feature = "service")]
impl From<NotifyError> for WikiGraphError {
    fn from(notify_error: NotifyError) -> Self {
        match notify_error.kind {
            NotifyErrorKind::Generic(msg) => WikiGraphError::Watch(format!(
                "notify-debouncer: {}, paths: {:?}",
                msg, notify_error.paths
            )),
            NotifyErrorKind::Io(io_error) => WikiGraphError::Watch(format!(
                "notify-debouncer: io error {}, paths: {:?}",
                io_error.kind(),
                notify_error.paths
            )),
            NotifyErrorKind::PathNotFound => WikiGraphError::NotFound(format!(
                "notify-debouncer: path(s) not found: {:?}",
                notify_error.paths
            )),
            NotifyErrorKind::WatchNotFound => WikiGraphError::NotFound(format!(
                "notify-debouncer: watch not found, paths: {:?}",
                notify_error.paths
            )),
            NotifyErrorKind::InvalidConfig(_) => {
                WikiGraphError::Watch("notify-debouncer invalid config".to_string())
            }
            NotifyErrorKind::MaxFilesWatch => {
                WikiGraphError::Watch("notify-debouncer max file watch limit reached".to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_not_found_maps_to_not_found() {
        let err: WikiGraphError = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, WikiGraphError::NotFound(_)));
    }

    #[test]
    fn io_permission_maps_to_permission_denied() {
        let err: WikiGraphError = io::Error::new(io::ErrorKind::PermissionDenied, "nope").into();
        assert_eq!(err, WikiGraphError::PermissionDenied);
    }

    #[test]
    fn format_errors_are_config_errors() {
        let err: WikiGraphError = fmt::Error.into();
        assert!(matches!(err, WikiGraphError::Config(_)));
    }

    #[test]
    fn toml_errors_are_serialization_errors() {
        let err: WikiGraphError = toml::from_str::<toml::Table>("= broken").unwrap_err().into();
        assert!(matches!(err, WikiGraphError::Serialization(_)));
    }
}
