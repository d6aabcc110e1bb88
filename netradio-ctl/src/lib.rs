//! # Internet Radio Control Backend (netradio-ctl)
//!
//! Plays one internet radio station at a time and exposes a small HTTP
//! control API for a browser panel.
//!
//! **Architecture:** a [`playback::PlaybackEngine`] owns the current
//! selection and at most one [`stream::StreamSession`]; sessions report back
//! over an event channel. WiFi provisioning runs beside it and gates new
//! connections through a network-ready flag.

pub mod api;
pub mod audio;
pub mod error;
pub mod icons;
pub mod playback;
pub mod provisioning;
pub mod stations;
pub mod stream;

pub use error::{Error, Result};
