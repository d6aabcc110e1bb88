//! Audio output collaborators

pub mod output;

pub use output::{AudioOutput, AudioWriter, CommandOutput, DiscardOutput};
