//! Userstore - session runner for a file-backed users store
//!
//! This library crate exposes the runner, scripts and configuration for
//! integration testing.

pub mod config;
pub mod runner;
pub mod script;
