//! Batch classification: bounded parallel file reads with ordered, streaming output.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use prism_core::input::{self, EmbeddingRecord};
use prism_core::output::render_explanation;
use prism_core::{ClassificationRecord, Classifier, ClassifyResult, RecordWriter};
use tokio::sync::Semaphore;

use super::types::OutputFormat;

/// What each record is classified against and how results are written.
pub struct BatchOptions {
    /// Category names, in output order
    pub categories: Arc<Vec<String>>,
    /// Attach raw group scores to every record
    pub explain: bool,
    /// Maximum files parsed and classified concurrently
    pub parallel: usize,
    pub format: OutputFormat,
    pub pretty: bool,
}

/// Per-file result: a read failure, or one outcome per record.
type FileOutcome = Result<Vec<(String, ClassifyResult<ClassificationRecord>)>, String>;

/// Running totals for the summary.
#[derive(Debug, Default)]
pub struct BatchStats {
    pub records: u64,
    pub failed_records: u64,
    pub failed_files: u64,
    /// category → label → count
    pub labels: BTreeMap<String, BTreeMap<String, u64>>,
}

impl BatchStats {
    fn tally(&mut self, record: &ClassificationRecord) {
        self.records += 1;
        for result in &record.results {
            *self
                .labels
                .entry(result.category.clone())
                .or_default()
                .entry(result.label.clone())
                .or_default() += 1;
        }
    }
}

/// Classify one embedding in every requested category.
pub fn classify_record(
    classifier: &Classifier,
    record: &EmbeddingRecord,
    categories: &[String],
    explain: bool,
) -> ClassifyResult<ClassificationRecord> {
    if !explain {
        return Ok(ClassificationRecord {
            id: record.id.clone(),
            results: classifier.classify_many(&record.embedding, categories)?,
            scores: None,
        });
    }

    let mut results = Vec::with_capacity(categories.len());
    let mut scores = Vec::with_capacity(categories.len());
    for category in categories {
        let (score, result) = classifier.explain(&record.embedding, category)?;
        scores.push(score);
        results.push(result);
    }
    Ok(ClassificationRecord {
        id: record.id.clone(),
        results,
        scores: Some(scores),
    })
}

fn classify_file(
    classifier: &Classifier,
    path: &std::path::Path,
    categories: &[String],
    explain: bool,
) -> FileOutcome {
    let records = input::read_file(path).map_err(|e| e.to_string())?;
    Ok(records
        .iter()
        .map(|r| (r.id.clone(), classify_record(classifier, r, categories, explain)))
        .collect())
}

/// Classify every file, writing records to `out` in input order.
pub async fn classify_files(
    classifier: Arc<Classifier>,
    files: Vec<PathBuf>,
    options: BatchOptions,
    out: Box<dyn Write + Send>,
) -> anyhow::Result<BatchStats> {
    let semaphore = Arc::new(Semaphore::new(options.parallel.max(1)));
    let explain = options.explain || options.format == OutputFormat::Text;
    let progress = create_progress_bar(files.len() as u64);
    let start_time = Instant::now();

    let mut handles = Vec::with_capacity(files.len());
    for path in files {
        let semaphore = semaphore.clone();
        let classifier = classifier.clone();
        let categories = options.categories.clone();

        handles.push(tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await?;
            let display = path.display().to_string();
            let outcome = tokio::task::spawn_blocking(move || {
                classify_file(&classifier, &path, &categories, explain)
            })
            .await?;
            anyhow::Ok((display, outcome))
        }));
    }

    let mut sink = Sink::new(out, options.format, options.pretty);
    let mut stats = BatchStats::default();

    // Awaiting in spawn order keeps output deterministic while later files run.
    for handle in handles {
        let (path, outcome) = handle.await??;
        match outcome {
            Ok(records) => {
                for (id, result) in records {
                    match result {
                        Ok(record) => {
                            stats.tally(&record);
                            sink.write(&record)?;
                        }
                        Err(e) => {
                            stats.failed_records += 1;
                            tracing::error!("Failed: {} - {}", id, e);
                        }
                    }
                }
            }
            Err(e) => {
                stats.failed_files += 1;
                tracing::error!("Failed: {} - {}", path, e);
            }
        }

        progress.inc(1);
        let elapsed = start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            progress.set_message(format!("{:.0} rec/sec", stats.records as f64 / elapsed));
        }
    }

    sink.finish()?;
    progress.finish_and_clear();
    print_summary(&stats, start_time.elapsed());
    Ok(stats)
}

enum Sink {
    Records(RecordWriter<Box<dyn Write + Send>>),
    Text(Box<dyn Write + Send>),
}

impl Sink {
    fn new(out: Box<dyn Write + Send>, format: OutputFormat, pretty: bool) -> Self {
        match format.records() {
            Some(layout) => Self::Records(RecordWriter::new(out, layout, pretty)),
            None => Self::Text(out),
        }
    }

    fn write(&mut self, record: &ClassificationRecord) -> std::io::Result<()> {
        match self {
            Self::Records(writer) => writer.write(record),
            Self::Text(out) => {
                writeln!(out, "{}", record.id)?;
                let scores = record.scores.as_deref().unwrap_or_default();
                for (score, result) in scores.iter().zip(&record.results) {
                    write!(out, "{}", render_explanation(score, result))?;
                }
                writeln!(out)
            }
        }
    }

    fn finish(self) -> std::io::Result<()> {
        match self {
            Self::Records(writer) => writer.finish().map(|_| ()),
            Self::Text(mut out) => out.flush(),
        }
    }
}

fn create_progress_bar(total: u64) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

    if total <= 1 {
        return ProgressBar::with_draw_target(Some(total), ProgressDrawTarget::hidden());
    }

    let pb = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::default_bar().template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.magenta/blue}] {pos}/{len} files {msg}",
    ) {
        pb.set_style(style.progress_chars("##-"));
    }
    pb.set_message("starting...");
    pb
}

fn print_summary(stats: &BatchStats, elapsed: Duration) {
    let rate = if elapsed.as_secs_f64() > 0.0 {
        stats.records as f64 / elapsed.as_secs_f64()
    } else {
        0.0
    };

    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Classified:   {:>8}", stats.records);
    if stats.failed_records > 0 {
        eprintln!("    Failed:       {:>8}", stats.failed_records);
    }
    if stats.failed_files > 0 {
        eprintln!("    Bad files:    {:>8}", stats.failed_files);
    }
    eprintln!("    Duration:     {:>7.2}s", elapsed.as_secs_f64());
    eprintln!("    Rate:         {:>7.0} rec/sec", rate);
    for (category, labels) in &stats.labels {
        eprintln!("  ------------------------------------");
        eprintln!("    {category}");
        for (label, count) in labels {
            eprintln!("      {:<18} {:>6}", label, count);
        }
    }
    eprintln!("  ====================================");
}
