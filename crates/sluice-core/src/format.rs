//! Coarse payload format tags and the adjacent-stage compatibility check.
//!
//! A format is a tag, not a type: the engine checks producer/consumer
//! compatibility once at assembly time and otherwise treats payloads as
//! opaque.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Payload shape tag declared by each stage.
///
/// `Any` is the wildcard: it matches every other format on either side of
/// a producer/consumer pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    Any,
    /// A whole text document.
    Text,
    /// A single line of text.
    Line,
    /// One structured record.
    Record,
    /// A batch of structured records.
    RecordArray,
    /// A filesystem path handed from stage to stage.
    FilePath,
}

impl Format {
    /// Whether a packet produced as `self` may be consumed as `consumed`.
    pub fn accepts(self, consumed: Format) -> bool {
        self == Format::Any || consumed == Format::Any || self == consumed
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Any => "any",
            Self::Text => "text",
            Self::Line => "line",
            Self::Record => "record",
            Self::RecordArray => "record_array",
            Self::FilePath => "file_path",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_formats_are_compatible() {
        assert!(Format::Line.accepts(Format::Line));
        assert!(Format::Record.accepts(Format::Record));
    }

    #[test]
    fn any_matches_both_sides() {
        assert!(Format::Any.accepts(Format::Line));
        assert!(Format::FilePath.accepts(Format::Any));
        assert!(Format::Any.accepts(Format::Any));
    }

    #[test]
    fn distinct_formats_are_incompatible() {
        assert!(!Format::Line.accepts(Format::Record));
        assert!(!Format::Text.accepts(Format::FilePath));
    }

    #[test]
    fn display_is_snake_case() {
        assert_eq!(Format::RecordArray.to_string(), "record_array");
        assert_eq!(Format::FilePath.to_string(), "file_path");
    }
}
