//! Error types for `dirgrid-core`.
//!
//! All fallible operations in the core library return [`CoreResult<T>`],
//! which is an alias for `Result<T, CoreError>`.

/// Unified error type for all core operations.
///
/// Each variant captures just enough context for the caller to display
/// a meaningful message or take corrective action.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The capability handle is missing, revoked, or refers to a node that
    /// no longer exists.
    #[error("handle invalid: {0}")]
    HandleInvalid(String),

    /// A path segment does not exist or has the wrong kind.
    #[error("path not found: {0}")]
    PathNotFound(String),

    /// Enumeration, metadata fetch, or byte read failed for a reason other
    /// than non-existence.
    #[error("I/O failure on {name}: {source}")]
    Io {
        /// Name of the entry the failure occurred on.
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// Bytes could not be interpreted as the expected media type.
    #[error("decode failure: {0}")]
    Decode(String),

    /// The requested directory lies outside the grantable area.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// A child name is invalid (empty, contains path separators, etc.).
    #[error("invalid name: {0}")]
    InvalidName(String),

    /// Failed to parse a configuration or state file.
    #[error("config parse error: {0}")]
    ConfigParse(String),

    /// The operation was cancelled before it could complete.
    #[error("operation cancelled")]
    Cancelled,
}

impl CoreError {
    /// Wraps an I/O error, tagging it with the entry it occurred on.
    pub fn io(name: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            name: name.into(),
            source,
        }
    }

    /// Re-tags an [`CoreError::Io`] with `name`; other variants pass through.
    pub fn for_entry(self, name: &str) -> Self {
        match self {
            Self::Io { source, .. } => Self::io(name, source),
            other => other,
        }
    }

    /// Returns `true` for errors that are reported per entry and must not
    /// abort a render pass.
    pub fn is_isolated(&self) -> bool {
        matches!(self, Self::Decode(_) | Self::Io { .. } | Self::Cancelled)
    }
}

/// Convenience alias used throughout `dirgrid-core`.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_invalid_displays_message() {
        let err = CoreError::HandleInvalid("photos".to_string());
        assert_eq!(err.to_string(), "handle invalid: photos");
    }

    #[test]
    fn path_not_found_displays_path() {
        let err = CoreError::PathNotFound("a/b/c.txt".to_string());
        assert_eq!(err.to_string(), "path not found: a/b/c.txt");
    }

    #[test]
    fn io_displays_entry_name() {
        let err = CoreError::io(
            "notes.txt",
            std::io::Error::new(std::io::ErrorKind::Other, "disk on fire"),
        );
        assert_eq!(err.to_string(), "I/O failure on notes.txt: disk on fire");
    }

    #[test]
    fn for_entry_retags_io() {
        let err = CoreError::io("old", std::io::Error::new(std::io::ErrorKind::Other, "x"))
            .for_entry("new.bin");
        assert!(matches!(err, CoreError::Io { ref name, .. } if name == "new.bin"));
    }

    #[test]
    fn for_entry_keeps_other_variants() {
        let err = CoreError::PathNotFound("a".to_string()).for_entry("b");
        assert!(matches!(err, CoreError::PathNotFound(ref p) if p == "a"));
    }

    #[test]
    fn decode_is_isolated_but_handle_invalid_is_not() {
        assert!(CoreError::Decode("bad png".to_string()).is_isolated());
        assert!(!CoreError::HandleInvalid("gone".to_string()).is_isolated());
        assert!(!CoreError::PathNotFound("x".to_string()).is_isolated());
    }

    #[test]
    fn cancelled_displays_message() {
        assert_eq!(CoreError::Cancelled.to_string(), "operation cancelled");
    }

    #[test]
    fn io_has_source() {
        use std::error::Error;
        let err = CoreError::io("f", std::io::Error::new(std::io::ErrorKind::Other, "inner"));
        assert!(err.source().is_some());
    }

    #[test]
    fn error_is_debug() {
        let err = CoreError::PathNotFound("x".to_string());
        assert!(format!("{err:?}").contains("PathNotFound"));
    }
}
