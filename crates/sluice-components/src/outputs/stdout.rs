//! Standard output sink.

use std::io::Write;

use sluice_core::{
    AttrKind, AttrSpec, AttrValue, Component, ComponentDescriptor, ConfigError, ConfigStore,
    Feedback, Format, Output, Packet, Stage, StageError,
};

/// Prints each payload to stdout, one per line.
///
/// With `max_packets` set, requests a chain stop once that many packets
/// have been printed.
pub struct StdoutOutput {
    section: String,
    max_packets: i64,
    seen: i64,
}

impl StdoutOutput {
    pub const CLASS: &'static str = "stdout_output";

    fn descriptor() -> ComponentDescriptor {
        ComponentDescriptor::new().attr(
            AttrSpec::optional("max_packets", AttrKind::Int, AttrValue::Int(0))
                .describe("stop the chain after this many packets (0 = unlimited)"),
        )
    }

    pub fn from_config(store: &ConfigStore, section: &str) -> Result<Self, ConfigError> {
        let attrs = Self::descriptor().resolve(store, section)?;
        Ok(Self {
            section: section.to_string(),
            max_packets: attrs.int("max_packets")?,
            seen: 0,
        })
    }

    pub fn factory(store: &ConfigStore, section: &str) -> Result<Stage, ConfigError> {
        Ok(Stage::Output(Box::new(Self::from_config(store, section)?)))
    }
}

impl Component for StdoutOutput {
    fn section(&self) -> &str {
        &self.section
    }
}

impl Output for StdoutOutput {
    fn consumes(&self) -> Format {
        Format::Any
    }

    fn invoke(&mut self, packet: &Packet) -> Result<Feedback, StageError> {
        let mut out = std::io::stdout().lock();
        writeln!(out, "{}", packet.data)?;
        self.seen += 1;
        if self.max_packets > 0 && self.seen >= self.max_packets {
            return Ok(Feedback::Stop);
        }
        Ok(Feedback::Continue)
    }
}
