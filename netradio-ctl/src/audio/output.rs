//! Audio output seam
//!
//! Decoding and the DAC live outside this process. A stream session opens
//! one [`AudioWriter`] when its transport connects and pushes the raw stream
//! bytes (metadata already stripped) into it until the session ends.

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, Command};
use tracing::{debug, info};

#[async_trait]
pub trait AudioOutput: Send + Sync {
    /// Open a sink for one stream. `content_type` is the server's announced
    /// format, if any.
    async fn open(&self, content_type: Option<&str>) -> Result<Box<dyn AudioWriter>>;
}

#[async_trait]
pub trait AudioWriter: Send {
    async fn write(&mut self, chunk: &[u8]) -> Result<()>;
}

/// Drops all audio, keeping a byte count. Used when no decoder is configured.
#[derive(Debug, Default)]
pub struct DiscardOutput;

#[async_trait]
impl AudioOutput for DiscardOutput {
    async fn open(&self, content_type: Option<&str>) -> Result<Box<dyn AudioWriter>> {
        debug!("Discarding audio ({:?})", content_type);
        Ok(Box::new(DiscardWriter { bytes: 0 }))
    }
}

struct DiscardWriter {
    bytes: u64,
}

#[async_trait]
impl AudioWriter for DiscardWriter {
    async fn write(&mut self, chunk: &[u8]) -> Result<()> {
        self.bytes += chunk.len() as u64;
        Ok(())
    }
}

impl Drop for DiscardWriter {
    fn drop(&mut self) {
        debug!("Discarded {} audio bytes", self.bytes);
    }
}

/// Pipes the stream into an external decoder process (e.g. `mpg123 -q -`).
///
/// One process per session; it is killed when the writer is dropped.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    argv: Vec<String>,
}

impl CommandOutput {
    pub fn new(argv: Vec<String>) -> Result<Self> {
        if argv.is_empty() {
            return Err(Error::AudioOutput("decoder command is empty".to_string()));
        }
        Ok(Self { argv })
    }
}

#[async_trait]
impl AudioOutput for CommandOutput {
    async fn open(&self, content_type: Option<&str>) -> Result<Box<dyn AudioWriter>> {
        let mut child = Command::new(&self.argv[0])
            .args(&self.argv[1..])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                Error::AudioOutput(format!("Failed to start {}: {}", self.argv[0], e))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::AudioOutput("decoder stdin unavailable".to_string()))?;

        info!(
            "Started decoder {} (pid {:?}, {:?})",
            self.argv[0],
            child.id(),
            content_type
        );
        Ok(Box::new(CommandWriter {
            _child: child,
            stdin,
        }))
    }
}

struct CommandWriter {
    _child: Child,
    stdin: ChildStdin,
}

#[async_trait]
impl AudioWriter for CommandWriter {
    async fn write(&mut self, chunk: &[u8]) -> Result<()> {
        self.stdin
            .write_all(chunk)
            .await
            .map_err(|e| Error::AudioOutput(format!("decoder pipe closed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_discard_accepts_everything() {
        let mut writer = DiscardOutput.open(Some("audio/mpeg")).await.unwrap();
        writer.write(&[0u8; 1024]).await.unwrap();
        writer.write(&[]).await.unwrap();
    }

    #[test]
    fn test_empty_command_rejected() {
        assert!(matches!(
            CommandOutput::new(Vec::new()),
            Err(Error::AudioOutput(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_program_fails_to_open() {
        let output = CommandOutput::new(vec!["/nonexistent/netradio-decoder".to_string()]).unwrap();
        assert!(matches!(output.open(None).await, Err(Error::AudioOutput(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_receives_bytes() {
        let output = CommandOutput::new(vec!["cat".to_string()]).unwrap();
        let mut writer = output.open(None).await.unwrap();
        writer.write(b"ID3 fake mp3 frame").await.unwrap();
    }
}
