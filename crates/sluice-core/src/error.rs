//! Error taxonomy for configuration resolution and stage execution.
//!
//! Configuration problems are always fatal at assembly time and never
//! silently defaulted. Runtime stage failures end the current run but not
//! the process. End-of-stream, skip, and stop-chain are control values
//! (`Pull`/`Flow`/`Feedback`), not errors.

use thiserror::Error;

/// Fatal configuration error raised while resolving component attributes
/// or loading the configuration document.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("section [{section}] is not defined in the configuration")]
    MissingSection { section: String },

    #[error("[{section}] required attribute '{name}' is not set")]
    MissingRequired { section: String, name: String },

    #[error("[{section}] attribute '{name}': {detail}")]
    InvalidValue {
        section: String,
        name: String,
        detail: String,
    },

    #[error("[{section}] attribute '{name}' was not declared by the component")]
    UndeclaredAttribute { section: String, name: String },

    #[error("missing environment variable(s): {names}")]
    MissingEnvVars { names: String },

    #[error("invalid configuration document: {0}")]
    Document(String),

    #[error("failed to read configuration file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Runtime failure raised by a stage lifecycle hook.
///
/// `Other` wraps opaque causes from component internals, the way
/// infrastructure errors are carried at the engine boundary.
#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid data: {0}")]
    Data(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StageError {
    /// Data-shape error with a formatted message.
    pub fn data(detail: impl Into<String>) -> Self {
        Self::Data(detail.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_names_section_and_attribute() {
        let err = ConfigError::MissingRequired {
            section: "input_lines".to_string(),
            name: "file_path".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("input_lines"));
        assert!(msg.contains("file_path"));
    }

    #[test]
    fn stage_error_wraps_io() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: StageError = io.into();
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn stage_error_wraps_anyhow() {
        let err: StageError = anyhow::anyhow!("backing store unavailable").into();
        assert!(err.to_string().contains("backing store unavailable"));
    }
}
