//! Line-oriented text filters.

use regex::Regex;
use sluice_core::{
    AttrKind, AttrSpec, AttrValue, Component, ComponentDescriptor, ConfigError, ConfigStore,
    Filter, Flow, Format, Packet, Payload, Stage, StageError,
};

fn bad_payload(expected: &str, got: Format) -> StageError {
    StageError::data(format!("expected {expected} payload, got {got}"))
}

fn compile_pattern(
    pattern: &str,
    section: &str,
    name: &'static str,
) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|e| ConfigError::InvalidValue {
        section: section.to_string(),
        name: name.to_string(),
        detail: e.to_string(),
    })
}

/// Forwards lines matching a pattern, skips the rest.
pub struct RegexMatchFilter {
    section: String,
    pattern: Regex,
}

impl RegexMatchFilter {
    pub const CLASS: &'static str = "regex_match_filter";

    fn descriptor() -> ComponentDescriptor {
        ComponentDescriptor::new().attr(
            AttrSpec::required("pattern", AttrKind::Text)
                .describe("regex a line must match to be forwarded"),
        )
    }

    pub fn from_config(store: &ConfigStore, section: &str) -> Result<Self, ConfigError> {
        let attrs = Self::descriptor().resolve(store, section)?;
        let pattern = compile_pattern(&attrs.text("pattern")?, section, "pattern")?;
        Ok(Self {
            section: section.to_string(),
            pattern,
        })
    }

    pub fn factory(store: &ConfigStore, section: &str) -> Result<Stage, ConfigError> {
        Ok(Stage::Filter(Box::new(Self::from_config(store, section)?)))
    }
}

impl Component for RegexMatchFilter {
    fn section(&self) -> &str {
        &self.section
    }
}

impl Filter for RegexMatchFilter {
    fn consumes(&self) -> Format {
        Format::Line
    }

    fn produces(&self) -> Format {
        Format::Line
    }

    fn invoke(&mut self, packet: Packet) -> Result<Flow, StageError> {
        let matched = match &packet.data {
            Payload::Line(line) => self.pattern.is_match(line),
            other => return Err(bad_payload("line", other.format())),
        };
        if matched {
            Ok(Flow::Forward(packet))
        } else {
            Ok(Flow::Skip)
        }
    }
}

/// Rewrites each line with a regex replacement.
pub struct RegexReplaceFilter {
    section: String,
    pattern: Regex,
    replacement: String,
}

impl RegexReplaceFilter {
    pub const CLASS: &'static str = "regex_replace_filter";

    fn descriptor() -> ComponentDescriptor {
        ComponentDescriptor::new()
            .attr(AttrSpec::required("pattern", AttrKind::Text).describe("regex to replace"))
            .attr(
                AttrSpec::optional("replacement", AttrKind::Text, AttrValue::Text(String::new()))
                    .describe("replacement text; capture groups via $1, $2, ..."),
            )
    }

    pub fn from_config(store: &ConfigStore, section: &str) -> Result<Self, ConfigError> {
        let attrs = Self::descriptor().resolve(store, section)?;
        let pattern = compile_pattern(&attrs.text("pattern")?, section, "pattern")?;
        Ok(Self {
            section: section.to_string(),
            pattern,
            replacement: attrs.text("replacement")?,
        })
    }

    pub fn factory(store: &ConfigStore, section: &str) -> Result<Stage, ConfigError> {
        Ok(Stage::Filter(Box::new(Self::from_config(store, section)?)))
    }
}

impl Component for RegexReplaceFilter {
    fn section(&self) -> &str {
        &self.section
    }
}

impl Filter for RegexReplaceFilter {
    fn consumes(&self) -> Format {
        Format::Line
    }

    fn produces(&self) -> Format {
        Format::Line
    }

    fn invoke(&mut self, packet: Packet) -> Result<Flow, StageError> {
        let replaced = match &packet.data {
            Payload::Line(line) => self
                .pattern
                .replace_all(line, self.replacement.as_str())
                .into_owned(),
            other => return Err(bad_payload("line", other.format())),
        };
        Ok(Flow::Forward(packet.with(Payload::Line(replaced))))
    }
}

/// Splits a delimited line into a record with named fields.
///
/// Missing trailing fields resolve to null; extra fields are an error.
#[derive(Debug)]
pub struct LineToRecordFilter {
    section: String,
    fields: Vec<String>,
    delimiter: char,
}

impl LineToRecordFilter {
    pub const CLASS: &'static str = "line_to_record_filter";

    fn descriptor() -> ComponentDescriptor {
        ComponentDescriptor::new()
            .attr(
                AttrSpec::required("fields", AttrKind::List)
                    .describe("field names, in column order"),
            )
            .attr(
                AttrSpec::optional("delimiter", AttrKind::Text, AttrValue::Text(",".to_string()))
                    .describe("single-character column delimiter"),
            )
    }

    pub fn from_config(store: &ConfigStore, section: &str) -> Result<Self, ConfigError> {
        let attrs = Self::descriptor().resolve(store, section)?;
        let fields = attrs.list("fields")?;
        if fields.is_empty() {
            return Err(ConfigError::InvalidValue {
                section: section.to_string(),
                name: "fields".to_string(),
                detail: "at least one field name is required".to_string(),
            });
        }
        let delimiter_raw = attrs.text("delimiter")?;
        let mut chars = delimiter_raw.chars();
        let delimiter = match (chars.next(), chars.next()) {
            (Some(c), None) => c,
            _ => {
                return Err(ConfigError::InvalidValue {
                    section: section.to_string(),
                    name: "delimiter".to_string(),
                    detail: format!("expected a single character, got '{delimiter_raw}'"),
                })
            }
        };
        Ok(Self {
            section: section.to_string(),
            fields,
            delimiter,
        })
    }

    pub fn factory(store: &ConfigStore, section: &str) -> Result<Stage, ConfigError> {
        Ok(Stage::Filter(Box::new(Self::from_config(store, section)?)))
    }
}

impl Component for LineToRecordFilter {
    fn section(&self) -> &str {
        &self.section
    }
}

impl Filter for LineToRecordFilter {
    fn consumes(&self) -> Format {
        Format::Line
    }

    fn produces(&self) -> Format {
        Format::Record
    }

    fn invoke(&mut self, packet: Packet) -> Result<Flow, StageError> {
        let record = match &packet.data {
            Payload::Line(line) => {
                let values: Vec<&str> = line.split(self.delimiter).map(str::trim).collect();
                if values.len() > self.fields.len() {
                    return Err(StageError::data(format!(
                        "line has {} fields, expected at most {}",
                        values.len(),
                        self.fields.len()
                    )));
                }
                let mut record = serde_json::Map::new();
                for (i, field) in self.fields.iter().enumerate() {
                    let value = values
                        .get(i)
                        .map(|v| serde_json::Value::String((*v).to_string()))
                        .unwrap_or(serde_json::Value::Null);
                    record.insert(field.clone(), value);
                }
                serde_json::Value::Object(record)
            }
            other => return Err(bad_payload("line", other.format())),
        };
        Ok(Flow::Forward(packet.with(Payload::Record(record))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sluice_core::packet::new_chain_meta;

    fn line_packet(text: &str) -> Packet {
        Packet::new(new_chain_meta()).with(Payload::Line(text.to_string()))
    }

    #[test]
    fn match_filter_forwards_and_skips() {
        let store = ConfigStore::new().with("f", "pattern", "^warn");
        let mut filter = RegexMatchFilter::from_config(&store, "f").unwrap();
        assert!(matches!(
            filter.invoke(line_packet("warn: low disk")).unwrap(),
            Flow::Forward(_)
        ));
        assert!(matches!(
            filter.invoke(line_packet("info: ok")).unwrap(),
            Flow::Skip
        ));
    }

    #[test]
    fn match_filter_rejects_wrong_payload() {
        let store = ConfigStore::new().with("f", "pattern", ".");
        let mut filter = RegexMatchFilter::from_config(&store, "f").unwrap();
        let packet = Packet::new(new_chain_meta()).with(Payload::Text("doc".to_string()));
        assert!(filter.invoke(packet).is_err());
    }

    #[test]
    fn replace_filter_rewrites_lines() {
        let store = ConfigStore::new()
            .with("f", "pattern", r"\d+")
            .with("f", "replacement", "N");
        let mut filter = RegexReplaceFilter::from_config(&store, "f").unwrap();
        match filter.invoke(line_packet("port 8080 open")).unwrap() {
            Flow::Forward(p) => assert_eq!(p.data, Payload::Line("port N open".to_string())),
            Flow::Skip => panic!("expected forward"),
        }
    }

    #[test]
    fn replace_filter_default_replacement_deletes() {
        let store = ConfigStore::new().with("f", "pattern", " +$");
        let mut filter = RegexReplaceFilter::from_config(&store, "f").unwrap();
        match filter.invoke(line_packet("trailing   ")).unwrap() {
            Flow::Forward(p) => assert_eq!(p.data, Payload::Line("trailing".to_string())),
            Flow::Skip => panic!("expected forward"),
        }
    }

    #[test]
    fn record_filter_builds_named_fields() {
        let store = ConfigStore::new().with("f", "fields", "name, age, city");
        let mut filter = LineToRecordFilter::from_config(&store, "f").unwrap();
        match filter.invoke(line_packet("ada, 36, london")).unwrap() {
            Flow::Forward(p) => {
                assert_eq!(p.format, Format::Record);
                assert_eq!(
                    p.data,
                    Payload::Record(serde_json::json!({
                        "name": "ada",
                        "age": "36",
                        "city": "london",
                    }))
                );
            }
            Flow::Skip => panic!("expected forward"),
        }
    }

    #[test]
    fn record_filter_nulls_missing_trailing_fields() {
        let store = ConfigStore::new().with("f", "fields", "name, age");
        let mut filter = LineToRecordFilter::from_config(&store, "f").unwrap();
        match filter.invoke(line_packet("ada")).unwrap() {
            Flow::Forward(p) => assert_eq!(
                p.data,
                Payload::Record(serde_json::json!({"name": "ada", "age": null}))
            ),
            Flow::Skip => panic!("expected forward"),
        }
    }

    #[test]
    fn record_filter_errors_on_extra_fields() {
        let store = ConfigStore::new().with("f", "fields", "name");
        let mut filter = LineToRecordFilter::from_config(&store, "f").unwrap();
        assert!(filter.invoke(line_packet("a,b")).is_err());
    }

    #[test]
    fn record_filter_honors_custom_delimiter() {
        let store = ConfigStore::new()
            .with("f", "fields", "k, v")
            .with("f", "delimiter", "=");
        let mut filter = LineToRecordFilter::from_config(&store, "f").unwrap();
        match filter.invoke(line_packet("lang=rust")).unwrap() {
            Flow::Forward(p) => assert_eq!(
                p.data,
                Payload::Record(serde_json::json!({"k": "lang", "v": "rust"}))
            ),
            Flow::Skip => panic!("expected forward"),
        }
    }

    #[test]
    fn record_filter_rejects_multi_char_delimiter() {
        let store = ConfigStore::new()
            .with("f", "fields", "a")
            .with("f", "delimiter", "::");
        let err = LineToRecordFilter::from_config(&store, "f").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref name, .. } if name == "delimiter"));
    }
}
