//! The unit of data flowing through a chain.
//!
//! A [`Packet`] couples an opaque [`Payload`] with its [`Format`] tag and a
//! handle on the chain-wide metadata map. Chain execution is strictly
//! sequential (one stage holds the packet at a time), so the shared
//! metadata uses `Rc<RefCell<_>>` rather than locks.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;

use crate::format::Format;

/// Metadata shared by every packet of one chain run. Mutable by any stage,
/// last-writer-wins.
pub type ChainMeta = Rc<RefCell<BTreeMap<String, serde_json::Value>>>;

/// Payload carried by a packet. Opaque to the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Empty,
    Text(String),
    Line(String),
    Record(serde_json::Value),
    RecordArray(Vec<serde_json::Value>),
    FilePath(PathBuf),
}

impl Payload {
    /// The natural format tag for this payload.
    pub fn format(&self) -> Format {
        match self {
            Self::Empty => Format::Any,
            Self::Text(_) => Format::Text,
            Self::Line(_) => Format::Line,
            Self::Record(_) => Format::Record,
            Self::RecordArray(_) => Format::RecordArray,
            Self::FilePath(_) => Format::FilePath,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) | Self::Line(s) => s.is_empty(),
            Self::Record(v) => v.is_null(),
            Self::RecordArray(v) => v.is_empty(),
            Self::FilePath(p) => p.as_os_str().is_empty(),
        }
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Text(s) | Self::Line(s) => f.write_str(s),
            Self::Record(v) => write!(f, "{}", v),
            Self::RecordArray(vs) => {
                for (i, v) in vs.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}", v)?;
                }
                Ok(())
            }
            Self::FilePath(p) => f.write_str(&p.to_string_lossy()),
        }
    }
}

/// One unit of work handed from stage to stage during a processing cycle.
///
/// The engine creates a fresh packet per cycle; cloning a packet clones the
/// payload but shares the chain metadata handle.
#[derive(Debug, Clone)]
pub struct Packet {
    pub data: Payload,
    pub format: Format,
    meta: ChainMeta,
}

impl Packet {
    /// An empty packet bound to the given chain metadata.
    pub fn new(meta: ChainMeta) -> Self {
        Self {
            data: Payload::Empty,
            format: Format::Any,
            meta,
        }
    }

    /// Replace the payload, keeping the format tag in sync.
    pub fn set(&mut self, data: Payload) {
        self.format = data.format();
        self.data = data;
    }

    /// Consume the packet and return it with the given payload. Convenient
    /// for filters that rebuild the packet they were handed.
    pub fn with(mut self, data: Payload) -> Self {
        self.set(data);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Handle on the chain-wide metadata map.
    pub fn meta(&self) -> &ChainMeta {
        &self.meta
    }

    /// Store a metadata entry, replacing any previous value for the key.
    pub fn set_meta(&self, key: impl Into<String>, value: serde_json::Value) {
        self.meta.borrow_mut().insert(key.into(), value);
    }

    /// Read a metadata entry, cloned out of the shared map.
    pub fn get_meta(&self, key: &str) -> Option<serde_json::Value> {
        self.meta.borrow().get(key).cloned()
    }
}

/// A fresh metadata map for a new chain run.
pub fn new_chain_meta() -> ChainMeta {
    Rc::new(RefCell::new(BTreeMap::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_keeps_format_in_sync() {
        let mut packet = Packet::new(new_chain_meta());
        assert_eq!(packet.format, Format::Any);
        packet.set(Payload::Line("hello".to_string()));
        assert_eq!(packet.format, Format::Line);
        packet.set(Payload::FilePath(PathBuf::from("/tmp/x")));
        assert_eq!(packet.format, Format::FilePath);
    }

    #[test]
    fn metadata_is_shared_across_clones() {
        let packet = Packet::new(new_chain_meta());
        let clone = packet.clone();
        packet.set_meta("source", serde_json::json!("file.txt"));
        assert_eq!(clone.get_meta("source"), Some(serde_json::json!("file.txt")));
    }

    #[test]
    fn metadata_is_shared_across_cycles() {
        let meta = new_chain_meta();
        let first = Packet::new(meta.clone());
        first.set_meta("count", serde_json::json!(1));
        let second = Packet::new(meta);
        assert_eq!(second.get_meta("count"), Some(serde_json::json!(1)));
    }

    #[test]
    fn empty_payloads() {
        assert!(Payload::Empty.is_empty());
        assert!(Payload::Text(String::new()).is_empty());
        assert!(!Payload::Line("x".to_string()).is_empty());
        assert!(Payload::RecordArray(vec![]).is_empty());
    }

    #[test]
    fn payload_display() {
        assert_eq!(Payload::Line("abc".to_string()).to_string(), "abc");
        assert_eq!(
            Payload::Record(serde_json::json!({"a": 1})).to_string(),
            r#"{"a":1}"#
        );
        assert_eq!(Payload::Empty.to_string(), "");
    }
}
