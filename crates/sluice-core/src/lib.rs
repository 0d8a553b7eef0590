//! Core types for sluice pipelines.
//!
//! A pipeline ("chain") is an ordered sequence of components (one
//! [`Input`], zero or more [`Filter`]s, one or more [`Output`]s) that a
//! [`Packet`] stream is threaded through. This crate holds everything a
//! component author needs: the packet/format model, the attribute-spec
//! configuration system, the lifecycle traits, and the class registry.
//! The chain assembly and run loop live in `sluice-engine`.

pub mod component;
pub mod config;
pub mod error;
pub mod format;
pub mod packet;
pub mod registry;

pub use component::{Component, Feedback, Filter, Flow, Input, Output, Pull, Stage};
pub use config::attr::{AttrKind, AttrSpec, AttrValue, ComponentDescriptor, ResolvedAttrs};
pub use config::store::ConfigStore;
pub use error::{ConfigError, StageError};
pub use format::Format;
pub use packet::{ChainMeta, Packet, Payload};
pub use registry::{ComponentRegistry, StageFactory};
