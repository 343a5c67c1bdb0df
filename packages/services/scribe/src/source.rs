use std::path::Path;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::error::Result;
use crate::step::{BatchReport, ScribeStep};

/// Totals over every batch read from a source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub batches: usize,
    pub valid: usize,
    pub invalid: usize,
}

impl RunSummary {
    fn add(&mut self, report: BatchReport) {
        self.batches += 1;
        self.valid += report.valid;
        self.invalid += report.invalid;
    }
}

/// Feeds newline-delimited stream records to a step, `batch_size` at a time.
///
/// A batch is only read after the previous one has been written. Blank
/// lines are skipped. The first sink failure stops the run.
pub struct JsonlBatchSource<R> {
    reader: R,
    batch_size: usize,
}

impl<R: AsyncBufRead + Unpin> JsonlBatchSource<R> {
    pub fn new(reader: R, batch_size: usize) -> Self {
        Self { reader, batch_size: batch_size.max(1) }
    }

    /// Next batch of raw records, or `None` at end of input. Records are
    /// handed on as bytes so an undecodable line is judged by the step.
    pub async fn next_batch(&mut self) -> Result<Option<Vec<Vec<u8>>>> {
        let mut batch = Vec::with_capacity(self.batch_size);
        let mut line = Vec::new();
        while batch.len() < self.batch_size {
            line.clear();
            if self.reader.read_until(b'\n', &mut line).await? == 0 {
                break;
            }
            let record = trim_ascii_whitespace(&line);
            if record.is_empty() {
                continue;
            }
            batch.push(record.to_vec());
        }
        Ok(if batch.is_empty() { None } else { Some(batch) })
    }

    pub async fn run(&mut self, step: &ScribeStep) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        while let Some(batch) = self.next_batch().await? {
            let report = step.execute(&batch).await?;
            summary.add(report);
        }
        tracing::info!(
            batches = summary.batches,
            valid = summary.valid,
            invalid = summary.invalid,
            "Input exhausted"
        );
        Ok(summary)
    }
}

fn trim_ascii_whitespace(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|b| !b.is_ascii_whitespace()).unwrap_or(bytes.len());
    let end = bytes.iter().rposition(|b| !b.is_ascii_whitespace()).map_or(start, |i| i + 1);
    &bytes[start..end]
}

impl JsonlBatchSource<BufReader<tokio::fs::File>> {
    pub async fn open(path: impl AsRef<Path>, batch_size: usize) -> Result<Self> {
        let file = tokio::fs::File::open(path.as_ref()).await?;
        tracing::debug!(path = %path.as_ref().display(), "Reading stream records from file");
        Ok(Self::new(BufReader::new(file), batch_size))
    }
}

impl JsonlBatchSource<BufReader<tokio::io::Stdin>> {
    pub fn stdin(batch_size: usize) -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), batch_size)
    }
}
