//! The parsed section/key configuration store.
//!
//! The core never parses the underlying document format; whatever front
//! end produced this store (see `sluice-engine::config::parser`) has
//! already reduced it to string values.

use std::collections::BTreeMap;

/// Section/key -> string-value configuration store.
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    sections: BTreeMap<String, BTreeMap<String, String>>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, creating the section if needed.
    pub fn insert(
        &mut self,
        section: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.sections
            .entry(section.into())
            .or_default()
            .insert(key.into(), value.into());
    }

    /// Builder-style insert, used heavily by tests.
    #[must_use]
    pub fn with(
        mut self,
        section: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.insert(section, key, value);
        self
    }

    /// Look up `section.key`. Absent sections and absent keys are both `None`.
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|s| s.get(key))
            .map(String::as_str)
    }

    pub fn has_section(&self, section: &str) -> bool {
        self.sections.contains_key(section)
    }

    /// The keys present in a section, in sorted order. Empty for an absent
    /// section.
    pub fn section_keys(&self, section: &str) -> impl Iterator<Item = &str> {
        self.sections
            .get(section)
            .into_iter()
            .flat_map(|s| s.keys().map(String::as_str))
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_absent_is_none() {
        let store = ConfigStore::new();
        assert_eq!(store.get("etl", "chains"), None);
    }

    #[test]
    fn insert_and_get() {
        let store = ConfigStore::new().with("input_lines", "file_path", "a.txt");
        assert_eq!(store.get("input_lines", "file_path"), Some("a.txt"));
        assert!(store.has_section("input_lines"));
        assert!(!store.has_section("output_std"));
    }

    #[test]
    fn section_keys_are_sorted() {
        let store = ConfigStore::new()
            .with("s", "b", "2")
            .with("s", "a", "1");
        let keys: Vec<_> = store.section_keys("s").collect();
        assert_eq!(keys, vec!["a", "b"]);
    }
}
