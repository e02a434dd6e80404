//! picam-console library crate.
//!
//! This module exposes the internal components for integration testing.

pub mod camera;
pub mod cli;
pub mod config;
pub mod console;
pub mod keymap;
pub mod settings;
pub mod terminal;
