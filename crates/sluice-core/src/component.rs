//! Component lifecycle contract and the three pipeline roles.
//!
//! A component is constructed from `(ConfigStore, section)` by its factory
//! (resolving its declared attributes, see [`crate::config::attr`]), then
//! driven by the chain: `init` once before the first packet, `invoke` once
//! per packet, `after_chain_invoke` once when the run loop ends.

use crate::error::StageError;
use crate::format::Format;
use crate::packet::Packet;

/// Outcome of an input pull. End-of-stream is a value, not an error.
#[derive(Debug)]
pub enum Pull {
    Packet(Packet),
    EndOfStream,
}

/// Outcome of a filter invocation. `Skip` means "nothing to forward this
/// cycle": the chain drops the cycle and no downstream stage sees the
/// packet.
#[derive(Debug)]
pub enum Flow {
    Forward(Packet),
    Skip,
}

/// Continuation signal returned by an output. `Stop` asks the chain to
/// cease pulling input after the current cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    Continue,
    Stop,
}

/// Lifecycle hooks shared by every pipeline stage.
pub trait Component {
    /// Configuration section this component was built from.
    fn section(&self) -> &str;

    /// Called once after assembly, before the first packet. A failure here
    /// aborts the run before any cycle.
    fn init(&mut self) -> Result<(), StageError> {
        Ok(())
    }

    /// Called once after the run loop ends (normally or not), with the
    /// last packet this stage produced or saw, or an empty packet if it
    /// never saw one. Failures are collected and logged, never escalated.
    fn after_chain_invoke(&mut self, last: &Packet) -> Result<(), StageError> {
        let _ = last;
        Ok(())
    }
}

/// Produces the first packet of each cycle from an external source.
pub trait Input: Component {
    fn produces(&self) -> Format;

    /// Fill the fresh packet handed in by the chain, or signal
    /// end-of-stream. Errors are reserved for genuine I/O failure.
    fn invoke(&mut self, packet: Packet) -> Result<Pull, StageError>;
}

/// Consumes a packet and produces a (possibly different-format) packet.
pub trait Filter: Component {
    fn consumes(&self) -> Format;
    fn produces(&self) -> Format;

    fn invoke(&mut self, packet: Packet) -> Result<Flow, StageError>;
}

/// Delivers a packet to an external sink; produces no further packet.
pub trait Output: Component {
    fn consumes(&self) -> Format;

    fn invoke(&mut self, packet: &Packet) -> Result<Feedback, StageError>;
}

/// A constructed stage, tagged by role, as produced by a
/// [`crate::registry::StageFactory`].
pub enum Stage {
    Input(Box<dyn Input>),
    Filter(Box<dyn Filter>),
    Output(Box<dyn Output>),
}

impl Stage {
    pub fn section(&self) -> &str {
        match self {
            Self::Input(c) => c.section(),
            Self::Filter(c) => c.section(),
            Self::Output(c) => c.section(),
        }
    }

    pub fn role(&self) -> &'static str {
        match self {
            Self::Input(_) => "input",
            Self::Filter(_) => "filter",
            Self::Output(_) => "output",
        }
    }
}
