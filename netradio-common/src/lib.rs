//! # Netradio Common Library
//!
//! Shared code for the netradio control backend:
//! - Configuration loading (TOML file + built-in defaults)
//! - Common error type
//! - HTTP request/response payload types polled by the control panel

pub mod api;
pub mod config;
pub mod error;

pub use error::{Error, Result};
