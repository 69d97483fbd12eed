//! Writing classification records and score explanations.

use std::fmt::Write as _;
use std::io::{self, Write};

use serde::Serialize;

use crate::types::{ClassificationRecord, ClassificationResult, ScoreVector};

/// Record output layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// One JSON array of records
    Json,
    /// One record per line
    JsonLines,
}

impl OutputFormat {
    /// Parse a format name (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "jsonl" | "jsonlines" | "ndjson" => Some(Self::JsonLines),
            _ => None,
        }
    }
}

/// Streams classification records as JSON or JSONL.
///
/// JSONL records are written as they arrive. JSON records are written as one
/// array; the closing bracket is emitted by [`finish`](Self::finish).
pub struct RecordWriter<W: Write> {
    writer: W,
    format: OutputFormat,
    pretty: bool,
    written: usize,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(writer: W, format: OutputFormat, pretty: bool) -> Self {
        Self {
            writer,
            format,
            pretty,
            written: 0,
        }
    }

    pub fn write(&mut self, record: &ClassificationRecord) -> io::Result<()> {
        match self.format {
            OutputFormat::JsonLines => {
                serde_json::to_writer(&mut self.writer, record).map_err(io::Error::other)?;
                writeln!(self.writer)?;
            }
            OutputFormat::Json => {
                let sep = if self.written == 0 { "[" } else { "," };
                if self.pretty {
                    writeln!(self.writer, "{sep}")?;
                } else {
                    write!(self.writer, "{sep}")?;
                }
                self.encode(record)?;
            }
        }
        self.written += 1;
        Ok(())
    }

    /// Close the JSON array (an empty one if nothing was written) and flush.
    pub fn finish(mut self) -> io::Result<W> {
        if self.format == OutputFormat::Json {
            if self.written == 0 {
                write!(self.writer, "[")?;
            } else if self.pretty {
                writeln!(self.writer)?;
            }
            writeln!(self.writer, "]")?;
        }
        self.writer.flush()?;
        Ok(self.writer)
    }

    pub fn records_written(&self) -> usize {
        self.written
    }

    fn encode<T: Serialize>(&mut self, item: &T) -> io::Result<()> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut self.writer, item)
        } else {
            serde_json::to_writer(&mut self.writer, item)
        }
        .map_err(io::Error::other)
    }
}

/// Human-readable breakdown of one decision.
///
/// ```text
/// clothing-season → no person (0.2871, override; beat winter 0.2410)
///   primary   winter      0.2410  "person wearing winter clothing ..."
///   override  no person   0.2871  "no person in the image"
/// ```
pub fn render_explanation(scores: &ScoreVector, result: &ClassificationResult) -> String {
    let mut out = String::new();

    let _ = write!(out, "{} → {} ({:.4}", result.category, result.label, result.score);
    match (&result.runner_up_label, result.runner_up_score) {
        (Some(label), Some(score)) if result.overridden => {
            let _ = write!(out, ", override; beat {label} {score:.4}");
        }
        (Some(label), Some(score)) => {
            let _ = write!(out, "; runner-up {label} {score:.4}");
        }
        _ => {}
    }
    out.push_str(")\n");

    let width = scores
        .primary
        .iter()
        .chain(&scores.overrides)
        .map(|g| g.label.chars().count())
        .max()
        .unwrap_or(0);

    let rows = scores
        .primary
        .iter()
        .map(|g| ("primary", g))
        .chain(scores.overrides.iter().map(|g| ("override", g)));
    for (kind, group) in rows {
        let _ = writeln!(
            out,
            "  {kind:<9} {:<width$}  {:>7.4}  {:?}",
            group.label, group.similarity, group.best_prompt
        );
    }

    out
}
