//! FastDL CLI - command-line entry point for the FastDL asset mirror.
//!
//! This crate wires configuration, logging and the server together.

pub mod config;

pub use config::{Command, Config};
