use std::collections::BTreeSet;
use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use futures::{StreamExt, future, stream};
use indicatif::ProgressBar;
use regex::Regex;
use tracing::{debug, info, warn};

use super::source::{Activity, JobRecord, JobSource};
use crate::error::SourceError;
use crate::index::JobIndexEntry;

static SHOP_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{2}-\d{3,4}").expect("valid regex"));

const PROGRESS_EVERY: usize = 50;
const NO_JOB_NAME: &str = "No Job Name";
const NO_FORM_NAME: &str = "No Form Name";

/// Cooperative cancellation shared between a scan and whoever may stop it.
/// Cancelling stops the next identifier from being dequeued; lookups already
/// in flight run to completion.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// `max(1, watermark - below) ..= watermark + above`
pub fn scan_window(watermark: u32, below: u32, above: u32) -> RangeInclusive<u32> {
    watermark.saturating_sub(below).max(1)..=watermark.saturating_add(above)
}

/// The window plus the extra identifiers, de-duplicated and ascending.
pub fn scan_ids(window: RangeInclusive<u32>, extra: &[u32]) -> Vec<u32> {
    let ids: BTreeSet<u32> = window.chain(extra.iter().copied()).collect();
    ids.into_iter().collect()
}

/// Shop number embedded in a job name, e.g. `24-1001`.
pub fn shop_number(job_name: &str) -> Option<&str> {
    SHOP_NUMBER.find(job_name).map(|m| m.as_str())
}

/// Build an index entry from what the system of record says about a job.
/// Every install date is kept; the digitize date is the latest one.
pub fn entry_from(id: u32, job: &JobRecord, activities: &[Activity]) -> JobIndexEntry {
    let name = job
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(NO_JOB_NAME);

    let mut entry = JobIndexEntry::new(id.to_string());
    entry.job_name = name.to_string();
    entry.shop_number = shop_number(name).unwrap_or_default().to_string();
    entry.digitize_date = activities
        .iter()
        .filter(|a| a.is("Digitize"))
        .filter_map(|a| a.start_date)
        .max();
    entry.install_dates = activities
        .iter()
        .filter(|a| a.is("Install"))
        .filter_map(|a| a.start_date)
        .collect();
    entry
}

/// What one scan pass observed.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    /// Found jobs, ascending by identifier.
    pub entries: Vec<JobIndexEntry>,
    /// Largest identifier confirmed to exist.
    pub highest_found: Option<u32>,
    pub processed: usize,
    /// Identifiers whose lookup failed.
    pub failures: Vec<u32>,
    /// Stopped early by the cancel flag.
    pub cancelled: bool,
}

/// Looks up a batch of identifiers with a bounded number in flight.
pub struct JobScanner<'a, S> {
    source: &'a S,
    workers: usize,
    timeout: Duration,
    cancel: CancelFlag,
    progress: ProgressBar,
}

impl<'a, S: JobSource> JobScanner<'a, S> {
    pub fn new(source: &'a S, workers: usize, timeout: Duration, cancel: CancelFlag) -> Self {
        Self {
            source,
            workers: workers.max(1),
            timeout,
            cancel,
            progress: ProgressBar::hidden(),
        }
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    pub async fn scan(&self, ids: Vec<u32>) -> ScanReport {
        let total = ids.len();
        self.progress.set_length(total as u64);
        info!(total, workers = self.workers, "starting job scan");

        let cancel = self.cancel.clone();
        let mut results = stream::iter(ids)
            .take_while(move |_| future::ready(!cancel.is_cancelled()))
            .map(|id| async move { (id, self.lookup(id).await) })
            .buffer_unordered(self.workers);

        let mut report = ScanReport::default();
        while let Some((id, result)) = results.next().await {
            report.processed += 1;
            self.progress.inc(1);
            if report.processed % PROGRESS_EVERY == 0 {
                info!(processed = report.processed, total, "scan progress");
            }
            match result {
                Ok(Some(entry)) => {
                    report.highest_found = report.highest_found.max(Some(id));
                    report.entries.push(entry);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(id, error = %e, "job lookup failed");
                    report.failures.push(id);
                }
            }
        }

        report.cancelled = report.processed < total && self.cancel.is_cancelled();
        report
            .entries
            .sort_by_key(|e| e.job_number.parse::<u32>().unwrap_or(u32::MAX));
        report.failures.sort_unstable();
        self.progress.finish_and_clear();

        info!(
            processed = report.processed,
            found = report.entries.len(),
            failures = report.failures.len(),
            cancelled = report.cancelled,
            "job scan finished"
        );
        report
    }

    async fn lookup(&self, id: u32) -> Result<Option<JobIndexEntry>, SourceError> {
        tokio::time::timeout(self.timeout, fetch(self.source, id))
            .await
            .unwrap_or(Err(SourceError::Timeout))
    }
}

async fn fetch<S: JobSource>(source: &S, id: u32) -> Result<Option<JobIndexEntry>, SourceError> {
    let Some(job) = source.get_job(id).await? else {
        return Ok(None);
    };
    let activities = source.get_activities(id).await?;
    let forms = source.get_forms(id).await?;
    let form = forms
        .first()
        .map(|f| f.name.as_str())
        .unwrap_or(NO_FORM_NAME);

    let entry = entry_from(id, &job, &activities);
    debug!(id, name = %entry.job_name, form, "found job");
    Ok(Some(entry))
}
