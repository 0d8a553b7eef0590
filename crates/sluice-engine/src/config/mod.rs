//! Configuration document front end.

pub mod parser;
