//! Concurrent batch pipeline: Load -> Extract -> Assemble for every input.
//!
//! A bounded pool of workers pulls `(index, path)` pairs from a shared queue
//! and reports `(index, outcome)` to a single collector, which stores records
//! by input position. Output order therefore equals input order regardless of
//! completion order.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::error::{ScanError, ServiceError};
use crate::input::load_document;
use crate::models::config::ScanConfig;
use crate::models::receipt::{ReceiptRecord, ValidationStatus};
use crate::receipt::ReceiptAssembler;
use crate::service::{AnalyzedDocument, DocumentAnalyzer};

/// Retry policy for transient service failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on every subsequent one.
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
        }
    }

    /// Delay before retry number `retry` (0-based): 1x, 2x, 4x, ...
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay.saturating_mul(1u32 << retry.min(16))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

/// Summary of a completed batch.
#[derive(Debug, Clone)]
pub struct BatchReport {
    /// One record per input, in input order.
    pub records: Vec<ReceiptRecord>,
    pub elapsed: Duration,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.records.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.records.len() - self.succeeded()
    }

    pub fn count_status(&self, status: ValidationStatus) -> usize {
        self.records
            .iter()
            .filter(|r| r.is_success() && r.validation_status == status)
            .count()
    }
}

/// Runs the per-file pipeline over a list of inputs with bounded concurrency.
pub struct BatchRunner {
    analyzer: Arc<dyn DocumentAnalyzer>,
    assembler: Arc<ReceiptAssembler>,
    workers: usize,
    retry: RetryPolicy,
}

impl BatchRunner {
    pub fn new(analyzer: Arc<dyn DocumentAnalyzer>) -> Self {
        Self {
            analyzer,
            assembler: Arc::new(ReceiptAssembler::new()),
            workers: 5,
            retry: RetryPolicy::default(),
        }
    }

    /// Build a runner with assembler, worker count and retry policy from config.
    pub fn from_config(analyzer: Arc<dyn DocumentAnalyzer>, config: &ScanConfig) -> Self {
        Self::new(analyzer)
            .with_assembler(ReceiptAssembler::from_config(config))
            .with_workers(config.batch.workers)
            .with_retry(RetryPolicy {
                max_retries: config.service.max_retries,
                base_delay: Duration::from_millis(config.service.retry_base_delay_ms),
            })
    }

    pub fn with_assembler(mut self, assembler: ReceiptAssembler) -> Self {
        self.assembler = Arc::new(assembler);
        self
    }

    /// Set the pool size (at least one worker).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Process every file.
    ///
    /// Per-file failures become records with `error` set. A fatal service
    /// error aborts all workers and is returned; partial results are dropped.
    /// `on_record` is called once per finished file, in completion order.
    pub async fn run<F>(&self, files: Vec<PathBuf>, mut on_record: F) -> Result<BatchReport, ScanError>
    where
        F: FnMut(&ReceiptRecord),
    {
        let start = Instant::now();
        let total = files.len();
        if total == 0 {
            return Ok(BatchReport {
                records: Vec::new(),
                elapsed: start.elapsed(),
            });
        }

        let queue: Arc<Mutex<VecDeque<(usize, PathBuf)>>> =
            Arc::new(Mutex::new(files.into_iter().enumerate().collect()));
        let (tx, mut rx) = mpsc::channel::<(usize, Result<ReceiptRecord, ServiceError>)>(total);

        let pool_size = self.workers.min(total);
        info!(
            "Processing {} file(s) with {} worker(s) via {}",
            total,
            pool_size,
            self.analyzer.name()
        );

        let mut workers = JoinSet::new();
        for worker_id in 0..pool_size {
            let queue = Arc::clone(&queue);
            let tx = tx.clone();
            let analyzer = Arc::clone(&self.analyzer);
            let assembler = Arc::clone(&self.assembler);
            let retry = self.retry;

            workers.spawn(async move {
                loop {
                    let next = queue.lock().await.pop_front();
                    let Some((index, path)) = next else {
                        break;
                    };

                    debug!(worker = worker_id, index, file = %path.display(), "Picked up file");
                    let outcome = process_file(analyzer.as_ref(), &assembler, retry, &path).await;
                    if tx.send((index, outcome)).await.is_err() {
                        break;
                    }
                }
            });
        }
        drop(tx);

        let mut slots: Vec<Option<ReceiptRecord>> = vec![None; total];
        while let Some((index, outcome)) = rx.recv().await {
            match outcome {
                Ok(record) => {
                    on_record(&record);
                    slots[index] = Some(record);
                }
                Err(fatal) => {
                    error!("Aborting batch: {}", fatal);
                    workers.abort_all();
                    while workers.join_next().await.is_some() {}
                    return Err(ScanError::Service(fatal));
                }
            }
        }

        while let Some(joined) = workers.join_next().await {
            joined.map_err(|e| ScanError::Worker(e.to_string()))?;
        }

        let records: Vec<ReceiptRecord> = slots.into_iter().flatten().collect();
        if records.len() != total {
            return Err(ScanError::Worker(format!(
                "expected {} records, collected {}",
                total,
                records.len()
            )));
        }

        Ok(BatchReport {
            records,
            elapsed: start.elapsed(),
        })
    }
}

/// Run one file through the pipeline.
///
/// Returns `Err` only for fatal service errors; everything else is folded
/// into a failed record.
async fn process_file(
    analyzer: &dyn DocumentAnalyzer,
    assembler: &ReceiptAssembler,
    retry: RetryPolicy,
    path: &std::path::Path,
) -> Result<ReceiptRecord, ServiceError> {
    let file_path = path.display().to_string();

    let upload = match load_document(path).await {
        Ok(upload) => upload,
        Err(e) => {
            warn!("Skipping {}: {}", file_path, e);
            return Ok(ReceiptRecord::failed(file_path, e.to_string()));
        }
    };

    match analyze_with_retry(analyzer, retry, &upload).await {
        Ok(doc) => Ok(assembler.assemble(&file_path, &doc)),
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            warn!("Failed to process {}: {}", file_path, e);
            Ok(ReceiptRecord::failed(file_path, e.to_string()))
        }
    }
}

async fn analyze_with_retry(
    analyzer: &dyn DocumentAnalyzer,
    retry: RetryPolicy,
    upload: &crate::input::DocumentUpload,
) -> Result<AnalyzedDocument, ServiceError> {
    let mut attempt = 0u32;
    loop {
        match analyzer.analyze(upload).await {
            Ok(doc) => return Ok(doc),
            Err(e) if e.is_retryable() && attempt < retry.max_retries => {
                let delay = retry.delay_for(attempt);
                warn!(
                    "Attempt {} failed for {}: {}; retrying in {:?}",
                    attempt + 1,
                    upload.file_name(),
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                if attempt > 0 {
                    warn!("All {} attempts failed for {}", attempt + 1, upload.file_name());
                }
                return Err(e);
            }
        }
    }
}
