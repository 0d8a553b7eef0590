//! Outputs: stages that deliver packets to an external sink.

pub mod file;
pub mod stdout;
