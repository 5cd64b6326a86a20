//! strucount: live class and method counters for a source tree.
//!
//! Layers, inside out: `domain` (entries and the counter tree), `application`
//! (reader, scanner, event dispatcher), `infrastructure` (filesystem, parser,
//! event scripts, wiring) and `cli`.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
