//! Engine error model: assembly-time and run-time failures.
//!
//! Assembly errors always name the offending chain or section so the
//! operator can find the bad entry without reading engine internals.

use thiserror::Error;

use sluice_core::{ConfigError, Format, StageError};

/// Fatal error while resolving and linking a chain's stages.
#[derive(Debug, Error)]
pub enum ChainAssemblyError {
    #[error("chain '{chain}' has no stages")]
    EmptyChain { chain: String },

    #[error("[{section}] has no 'class' entry naming a component")]
    MissingClass { section: String },

    #[error("[{section}] references unknown component class '{class}'")]
    UnknownClass { section: String, class: String },

    #[error("chain '{chain}': input [{section}] may only appear first")]
    InputNotFirst { chain: String, section: String },

    #[error("chain '{chain}': {role} [{section}] may not follow an output")]
    StageAfterOutput {
        chain: String,
        section: String,
        role: &'static str,
    },

    #[error("chain '{chain}' does not start with an input")]
    MissingInput { chain: String },

    #[error("chain '{chain}' has no output")]
    MissingOutput { chain: String },

    #[error(
        "chain '{chain}': [{producer}] produces {produced} but [{consumer}] consumes {consumed}"
    )]
    FormatMismatch {
        chain: String,
        producer: String,
        produced: Format,
        consumer: String,
        consumed: Format,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Error that ended a chain run, carried in the run result.
#[derive(Debug, Error)]
pub enum ChainRunError {
    #[error("stage [{section}] failed to initialize: {source}")]
    Init {
        section: String,
        #[source]
        source: StageError,
    },

    #[error("stage [{section}] failed: {source}")]
    Stage {
        section: String,
        #[source]
        source: StageError,
    },

    #[error("chain '{chain}' already ran; assemble a new chain to run again")]
    AlreadyRan { chain: String },
}

impl ChainRunError {
    /// The section of the stage that failed, when one is to blame.
    pub fn section(&self) -> Option<&str> {
        match self {
            Self::Init { section, .. } | Self::Stage { section, .. } => Some(section),
            Self::AlreadyRan { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assembly_errors_name_the_offender() {
        let err = ChainAssemblyError::UnknownClass {
            section: "input_lines".to_string(),
            class: "no_such_thing".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("input_lines"));
        assert!(msg.contains("no_such_thing"));
    }

    #[test]
    fn format_mismatch_names_both_sides() {
        let err = ChainAssemblyError::FormatMismatch {
            chain: "a|b".to_string(),
            producer: "a".to_string(),
            produced: Format::Line,
            consumer: "b".to_string(),
            consumed: Format::Record,
        };
        let msg = err.to_string();
        assert!(msg.contains("produces line"));
        assert!(msg.contains("consumes record"));
    }

    #[test]
    fn run_error_reports_failing_section() {
        let err = ChainRunError::Stage {
            section: "filter_match".to_string(),
            source: StageError::data("bad line"),
        };
        assert_eq!(err.section(), Some("filter_match"));
        let already = ChainRunError::AlreadyRan {
            chain: "a|b".to_string(),
        };
        assert_eq!(already.section(), None);
    }
}
