//! Domain map command-line tooling
//!
//! The binary in `main.rs` parses arguments; the work happens in [`commands`].

pub mod commands;
