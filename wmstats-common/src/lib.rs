//! # WMStats Common Library
//!
//! Shared code for the WMStats services:
//! - Error type used across crates
//! - TOML bootstrap configuration and config file resolution

pub mod config;
pub mod error;

pub use error::{Error, Result};
