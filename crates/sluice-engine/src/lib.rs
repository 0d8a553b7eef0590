//! Chain assembly and execution engine for sluice pipelines.
//!
//! The engine resolves a textual chain specification into an ordered list
//! of component instances ([`Chain::assemble`]), then drives packets from
//! the input through the filters to the outputs ([`Chain::run`]). The
//! [`Etl`] driver runs every chain listed in a configuration document in
//! order.

pub mod chain;
pub mod config;
pub mod driver;
pub mod errors;
pub mod result;

pub use chain::{CancelToken, Chain};
pub use driver::{ChainOutcome, Etl, EtlSummary};
pub use errors::{ChainAssemblyError, ChainRunError};
pub use result::{CleanupFailure, RunCounts, RunResult, RunStatus};
