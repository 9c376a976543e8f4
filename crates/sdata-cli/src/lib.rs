//! SData command-line tool
//!
//! - `inspect`: show how a URI resolves into protocol parts
//! - `translate`: turn a JSON command tree into `VERB uri`

pub mod cli;
pub mod commands;
pub mod config;
