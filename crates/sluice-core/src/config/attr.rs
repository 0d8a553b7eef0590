//! Declarative attribute specs and their resolution against a
//! [`ConfigStore`].
//!
//! Each component type declares the attributes it accepts as a
//! [`ComponentDescriptor`]: a static registration table built by plain
//! code, consulted once at construction. Resolution coerces the raw string
//! values to their declared kinds; a missing required attribute or a
//! failed coercion is a fatal [`ConfigError`].

use std::collections::BTreeMap;

use crate::config::store::ConfigStore;
use crate::error::ConfigError;

/// Reserved section key naming the component class; never treated as an
/// attribute.
pub const CLASS_KEY: &str = "class";

/// Semantic type of a declared configuration attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrKind {
    Text,
    Int,
    Float,
    Bool,
    List,
}

impl AttrKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::List => "list",
        }
    }
}

/// Typed value produced by attribute resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    List(Vec<String>),
}

impl AttrValue {
    pub fn kind(&self) -> AttrKind {
        match self {
            Self::Text(_) => AttrKind::Text,
            Self::Int(_) => AttrKind::Int,
            Self::Float(_) => AttrKind::Float,
            Self::Bool(_) => AttrKind::Bool,
            Self::List(_) => AttrKind::List,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(v) => Some(v),
            _ => None,
        }
    }
}

/// One declared configuration attribute of a component type.
///
/// Shared, read-only metadata: declared once per type, never mutated. If
/// `required` is set the default is ignored and absence of the key is a
/// fatal configuration error.
#[derive(Debug, Clone)]
pub struct AttrSpec {
    pub name: &'static str,
    pub kind: AttrKind,
    pub default: Option<AttrValue>,
    pub required: bool,
    pub description: &'static str,
    list_delimiter: char,
}

impl AttrSpec {
    fn new(name: &'static str, kind: AttrKind) -> Self {
        Self {
            name,
            kind,
            default: None,
            required: false,
            description: "",
            list_delimiter: ',',
        }
    }

    /// A mandatory attribute: absence in the store fails resolution.
    pub fn required(name: &'static str, kind: AttrKind) -> Self {
        Self {
            required: true,
            ..Self::new(name, kind)
        }
    }

    /// An optional attribute with a typed default.
    ///
    /// Panics if the default's kind differs from the declared kind; specs
    /// are static declarations, so a mismatch is a programmer error.
    pub fn optional(name: &'static str, kind: AttrKind, default: AttrValue) -> Self {
        assert!(
            default.kind() == kind,
            "default for attribute '{}' is {} but the declared kind is {}",
            name,
            default.kind().name(),
            kind.name()
        );
        Self {
            default: Some(default),
            ..Self::new(name, kind)
        }
    }

    /// An optional attribute that resolves to nothing when absent.
    pub fn optional_no_default(name: &'static str, kind: AttrKind) -> Self {
        Self::new(name, kind)
    }

    #[must_use]
    pub fn describe(mut self, text: &'static str) -> Self {
        self.description = text;
        self
    }

    /// Delimiter used to split `List` values (default `,`).
    #[must_use]
    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.list_delimiter = delimiter;
        self
    }

    /// Coerce a raw string value to this spec's kind.
    ///
    /// Pure function of its inputs; the error detail names the failure.
    pub fn coerce(&self, raw: &str) -> Result<AttrValue, String> {
        match self.kind {
            AttrKind::Text => Ok(AttrValue::Text(raw.to_string())),
            AttrKind::Int => raw
                .trim()
                .parse::<i64>()
                .map(AttrValue::Int)
                .map_err(|e| format!("expected an integer, got '{}' ({})", raw, e)),
            AttrKind::Float => raw
                .trim()
                .parse::<f64>()
                .map(AttrValue::Float)
                .map_err(|e| format!("expected a number, got '{}' ({})", raw, e)),
            AttrKind::Bool => parse_bool(raw)
                .map(AttrValue::Bool)
                .ok_or_else(|| format!("expected true/false/yes/no/1/0, got '{}'", raw)),
            AttrKind::List => Ok(AttrValue::List(
                raw.split(self.list_delimiter)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
            )),
        }
    }

    /// Resolve this spec against `section` of the store.
    ///
    /// Present values are coerced; an absent required attribute is a
    /// [`ConfigError::MissingRequired`]; an absent optional attribute
    /// yields the declared default (already typed, so no re-coercion).
    pub fn resolve(
        &self,
        store: &ConfigStore,
        section: &str,
    ) -> Result<Option<AttrValue>, ConfigError> {
        match store.get(section, self.name) {
            Some(raw) => self
                .coerce(raw)
                .map(Some)
                .map_err(|detail| ConfigError::InvalidValue {
                    section: section.to_string(),
                    name: self.name.to_string(),
                    detail,
                }),
            None if self.required => Err(ConfigError::MissingRequired {
                section: section.to_string(),
                name: self.name.to_string(),
            }),
            None => Ok(self.default.clone()),
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// Ordered attribute schema of one component type.
///
/// Built at construction by plain code. A component layered on another
/// starts from the base's descriptor and adds its own specs; re-declaring
/// a name with the same kind overrides the default/requiredness, while a
/// different kind panics: specs may add, never silently shadow.
#[derive(Debug, Clone, Default)]
pub struct ComponentDescriptor {
    specs: Vec<AttrSpec>,
}

impl ComponentDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an attribute.
    #[must_use]
    pub fn attr(mut self, spec: AttrSpec) -> Self {
        if let Some(existing) = self.specs.iter_mut().find(|s| s.name == spec.name) {
            assert!(
                existing.kind == spec.kind,
                "attribute '{}' re-declared as {} (was {})",
                spec.name,
                spec.kind.name(),
                existing.kind.name()
            );
            *existing = spec;
        } else {
            self.specs.push(spec);
        }
        self
    }

    pub fn specs(&self) -> &[AttrSpec] {
        &self.specs
    }

    /// Resolve every declared attribute against `section` of the store.
    ///
    /// Keys present in the section but not declared (other than the
    /// reserved `class`) are warned about and ignored.
    pub fn resolve(
        &self,
        store: &ConfigStore,
        section: &str,
    ) -> Result<ResolvedAttrs, ConfigError> {
        if !store.has_section(section) {
            return Err(ConfigError::MissingSection {
                section: section.to_string(),
            });
        }

        for key in store.section_keys(section) {
            if key != CLASS_KEY && !self.specs.iter().any(|s| s.name == key) {
                tracing::warn!(
                    section = section,
                    key = key,
                    "ignoring unrecognized configuration key"
                );
            }
        }

        let mut values = BTreeMap::new();
        for spec in &self.specs {
            if let Some(value) = spec.resolve(store, section)? {
                values.insert(spec.name.to_string(), value);
            }
        }
        Ok(ResolvedAttrs {
            section: section.to_string(),
            values,
        })
    }
}

/// Attribute values resolved for one component instance.
///
/// After a successful [`ComponentDescriptor::resolve`], every required
/// attribute is present and of its declared kind; the typed accessors only
/// fail on internal misuse (asking for an undeclared name or the wrong
/// kind), which they report as a named configuration error rather than
/// panicking.
#[derive(Debug, Clone, Default)]
pub struct ResolvedAttrs {
    section: String,
    values: BTreeMap<String, AttrValue>,
}

impl ResolvedAttrs {
    pub fn section(&self) -> &str {
        &self.section
    }

    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.values.get(name)
    }

    fn require(&self, name: &str, kind: AttrKind) -> Result<&AttrValue, ConfigError> {
        let value = self
            .values
            .get(name)
            .ok_or_else(|| ConfigError::UndeclaredAttribute {
                section: self.section.clone(),
                name: name.to_string(),
            })?;
        if value.kind() != kind {
            return Err(ConfigError::InvalidValue {
                section: self.section.clone(),
                name: name.to_string(),
                detail: format!("resolved as {}, not {}", value.kind().name(), kind.name()),
            });
        }
        Ok(value)
    }

    pub fn text(&self, name: &str) -> Result<String, ConfigError> {
        Ok(self
            .require(name, AttrKind::Text)?
            .as_text()
            .unwrap_or_default()
            .to_string())
    }

    /// Text attribute that may be entirely absent (optional, no default).
    pub fn opt_text(&self, name: &str) -> Option<String> {
        self.values
            .get(name)
            .and_then(AttrValue::as_text)
            .map(str::to_string)
    }

    pub fn int(&self, name: &str) -> Result<i64, ConfigError> {
        Ok(self.require(name, AttrKind::Int)?.as_int().unwrap_or_default())
    }

    pub fn float(&self, name: &str) -> Result<f64, ConfigError> {
        Ok(self
            .require(name, AttrKind::Float)?
            .as_float()
            .unwrap_or_default())
    }

    pub fn flag(&self, name: &str) -> Result<bool, ConfigError> {
        Ok(self
            .require(name, AttrKind::Bool)?
            .as_bool()
            .unwrap_or_default())
    }

    pub fn list(&self, name: &str) -> Result<Vec<String>, ConfigError> {
        Ok(self
            .require(name, AttrKind::List)?
            .as_list()
            .unwrap_or_default()
            .to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> ComponentDescriptor {
        ComponentDescriptor::new()
            .attr(AttrSpec::required("file_path", AttrKind::Text).describe("file to read"))
            .attr(AttrSpec::optional("trim", AttrKind::Bool, AttrValue::Bool(false)))
            .attr(AttrSpec::optional("buffer_size", AttrKind::Int, AttrValue::Int(4096)))
            .attr(AttrSpec::optional_no_default("encoding", AttrKind::Text))
            .attr(AttrSpec::optional(
                "fields",
                AttrKind::List,
                AttrValue::List(vec![]),
            ))
    }

    #[test]
    fn missing_required_fails_regardless_of_other_keys() {
        let store = ConfigStore::new()
            .with("s", "trim", "true")
            .with("s", "buffer_size", "1");
        let err = descriptor().resolve(&store, "s").unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired { ref name, .. } if name == "file_path"));
    }

    #[test]
    fn omitted_optional_yields_declared_default() {
        let store = ConfigStore::new().with("s", "file_path", "a.txt");
        let attrs = descriptor().resolve(&store, "s").unwrap();
        assert_eq!(attrs.flag("trim").unwrap(), false);
        assert_eq!(attrs.int("buffer_size").unwrap(), 4096);
        assert_eq!(attrs.opt_text("encoding"), None);
    }

    #[test]
    fn bool_coercion_accepts_common_spellings() {
        let spec = AttrSpec::required("b", AttrKind::Bool);
        for raw in ["true", "TRUE", "Yes", "1"] {
            assert_eq!(spec.coerce(raw).unwrap(), AttrValue::Bool(true), "{raw}");
        }
        for raw in ["false", "No", "0", "FALSE"] {
            assert_eq!(spec.coerce(raw).unwrap(), AttrValue::Bool(false), "{raw}");
        }
        assert!(spec.coerce("maybe").is_err());
    }

    #[test]
    fn int_coercion_rejects_non_numeric() {
        let store = ConfigStore::new()
            .with("s", "file_path", "a.txt")
            .with("s", "buffer_size", "not-a-number");
        let err = descriptor().resolve(&store, "s").unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidValue { ref name, .. } if name == "buffer_size"),
            "got: {err}"
        );
    }

    #[test]
    fn list_coercion_splits_and_trims() {
        let spec = AttrSpec::required("fields", AttrKind::List);
        assert_eq!(
            spec.coerce(" a , b ,c ").unwrap(),
            AttrValue::List(vec!["a".into(), "b".into(), "c".into()])
        );
        assert_eq!(spec.coerce("").unwrap(), AttrValue::List(vec![]));
    }

    #[test]
    fn list_coercion_honors_custom_delimiter() {
        let spec = AttrSpec::required("fields", AttrKind::List).delimiter(';');
        assert_eq!(
            spec.coerce("a;b").unwrap(),
            AttrValue::List(vec!["a".into(), "b".into()])
        );
    }

    #[test]
    fn typed_default_is_not_re_coerced() {
        // The default is stored typed; resolution hands it back untouched.
        let spec = AttrSpec::optional("b", AttrKind::Bool, AttrValue::Bool(true));
        let store = ConfigStore::new().with("s", "other", "x");
        assert_eq!(
            spec.resolve(&store, "s").unwrap(),
            Some(AttrValue::Bool(true))
        );
    }

    #[test]
    fn float_coercion() {
        let spec = AttrSpec::required("f", AttrKind::Float);
        assert_eq!(spec.coerce("2.5").unwrap(), AttrValue::Float(2.5));
        assert!(spec.coerce("two").is_err());
    }

    #[test]
    fn missing_section_is_an_error() {
        let err = descriptor()
            .resolve(&ConfigStore::new(), "nope")
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingSection { .. }));
    }

    #[test]
    fn layered_descriptor_overrides_default_with_same_kind() {
        let layered = descriptor().attr(AttrSpec::optional(
            "buffer_size",
            AttrKind::Int,
            AttrValue::Int(16),
        ));
        let store = ConfigStore::new().with("s", "file_path", "a.txt");
        let attrs = layered.resolve(&store, "s").unwrap();
        assert_eq!(attrs.int("buffer_size").unwrap(), 16);
    }

    #[test]
    #[should_panic(expected = "re-declared")]
    fn shadowing_with_a_different_kind_panics() {
        let _ = descriptor().attr(AttrSpec::required("trim", AttrKind::Text));
    }

    #[test]
    fn wrong_kind_accessor_is_a_named_error() {
        let store = ConfigStore::new().with("s", "file_path", "a.txt");
        let attrs = descriptor().resolve(&store, "s").unwrap();
        let err = attrs.int("file_path").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
