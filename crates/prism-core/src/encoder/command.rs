//! Text encoder backed by an external process.
//!
//! The configured program receives a JSON array of prompt strings on stdin and
//! must print a JSON array of float arrays (one per prompt, same order) on
//! stdout. This keeps the model runtime (PyTorch, ONNX, a remote API client)
//! entirely outside Prism.

use std::io::Write;
use std::process::{Command, Stdio};

use crate::config::EncoderConfig;
use crate::error::EncoderError;

use super::TextEncoder;

/// Runs an external encoder command once per batch of prompts.
#[derive(Debug, Clone)]
pub struct CommandEncoder {
    program: String,
    args: Vec<String>,
    batch_size: usize,
}

impl CommandEncoder {
    /// Create an encoder from `[program, args...]`.
    pub fn new(command: &[String], batch_size: usize) -> Result<Self, EncoderError> {
        let (program, args) = command.split_first().ok_or(EncoderError::NotConfigured)?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            batch_size: batch_size.max(1),
        })
    }

    /// Create an encoder from the `[encoder]` config section.
    pub fn from_config(config: &EncoderConfig) -> Result<Self, EncoderError> {
        Self::new(&config.command, config.batch_size)
    }

    /// Run the command for one batch.
    fn run(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EncoderError> {
        let input = serde_json::to_vec(texts)
            .map_err(|e| EncoderError::Protocol(format!("failed to serialize prompts: {e}")))?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| EncoderError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        // stdin must be written concurrently with draining stdout.
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| EncoderError::Protocol("encoder stdin unavailable".to_string()))?;
        let writer = std::thread::spawn(move || -> std::io::Result<()> {
            stdin.write_all(&input)?;
            stdin.flush()
        });

        let output = child.wait_with_output()?;
        let write_result = writer
            .join()
            .map_err(|_| EncoderError::Protocol("stdin writer thread panicked".to_string()))?;

        if !output.status.success() {
            return Err(EncoderError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        // A child that exits 0 without reading all of stdin is fine; a write
        // error only matters if the process also failed.
        if let Err(e) = write_result {
            tracing::debug!("Encoder closed stdin early: {e}");
        }

        parse_output(&output.stdout, texts.len())
    }
}

impl TextEncoder for CommandEncoder {
    fn encode_text(&self, text: &str) -> Result<Vec<f32>, EncoderError> {
        let mut vectors = self.run(&[text.to_string()])?;
        vectors.pop().ok_or(EncoderError::CountMismatch {
            expected: 1,
            actual: 0,
        })
    }

    fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EncoderError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for (batch_idx, chunk) in texts.chunks(self.batch_size).enumerate() {
            tracing::debug!(
                "Encoding batch {} ({} prompts) with {}",
                batch_idx + 1,
                chunk.len(),
                self.program
            );
            vectors.extend(self.run(chunk)?);
        }
        Ok(vectors)
    }
}

/// Parse the encoder's stdout into exactly `expected` vectors.
fn parse_output(stdout: &[u8], expected: usize) -> Result<Vec<Vec<f32>>, EncoderError> {
    let vectors: Vec<Vec<f32>> = serde_json::from_slice(stdout).map_err(|e| {
        EncoderError::Protocol(format!("expected a JSON array of float arrays: {e}"))
    })?;
    if vectors.len() != expected {
        return Err(EncoderError::CountMismatch {
            expected,
            actual: vectors.len(),
        });
    }
    Ok(vectors)
}
