//! CLI module for the ollamapipe binary
//!
//! Handles command-line argument parsing.

pub mod args;

pub use args::{Args, Commands, GenerateArgs, Verbosity};
