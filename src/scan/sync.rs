use chrono::NaiveDateTime;
use indicatif::ProgressBar;
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::scanner::{CancelFlag, JobScanner, scan_ids, scan_window};
use super::source::JobSource;
use crate::config::ScanConfig;
use crate::error::AutofabError;
use crate::index::{IndexStore, StoredIndex, merge};

/// Summary of one read-scan-merge-write cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// Identifiers looked up.
    pub scanned: usize,
    /// Jobs found among them.
    pub found: usize,
    pub failures: usize,
    pub cancelled: bool,
    /// High-watermark after the cycle.
    pub watermark: u32,
    /// Whether the merged index reached the store. When `false` it is kept
    /// and becomes the base of the next cycle.
    pub saved: bool,
    /// Entries in the merged index.
    pub entries: usize,
}

struct SyncState<St> {
    store: St,
    pending: Option<StoredIndex>,
}

/// Keeps the persisted job index in step with the system of record.
///
/// Cycles never overlap: a second request while one is running fails with
/// [`AutofabError::ScanInProgress`].
pub struct IndexSynchronizer<S, St> {
    source: S,
    config: ScanConfig,
    cancel: CancelFlag,
    state: Mutex<SyncState<St>>,
}

impl<S: JobSource, St: IndexStore> IndexSynchronizer<S, St> {
    pub fn new(source: S, store: St, config: ScanConfig) -> Self {
        Self {
            source,
            config,
            cancel: CancelFlag::new(),
            state: Mutex::new(SyncState {
                store,
                pending: None,
            }),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Flag that stops the running cycle's scan early.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Current index: the unsaved result of a failed save, or the store's copy,
    /// with the effective watermark.
    pub async fn snapshot(&self) -> Result<StoredIndex, AutofabError> {
        let mut guard = self
            .state
            .try_lock()
            .map_err(|_| AutofabError::ScanInProgress)?;
        let state = &mut *guard;
        let stored = match &state.pending {
            Some(pending) => pending.clone(),
            None => state.store.load()?,
        };
        let watermark = self.effective_watermark(&stored);
        Ok(StoredIndex { watermark, ..stored })
    }

    /// Read the index, scan, merge, write. `now` stamps the cycle and its
    /// date decides which install dates are still in the future.
    pub async fn run_cycle(
        &self,
        now: NaiveDateTime,
        progress: ProgressBar,
    ) -> Result<CycleReport, AutofabError> {
        let mut state = self
            .state
            .try_lock()
            .map_err(|_| AutofabError::ScanInProgress)?;
        self.cancel.reset();

        let base = match state.pending.take() {
            Some(pending) => {
                info!(entries = pending.index.len(), "retrying unsaved job index");
                pending
            }
            None => state.store.load()?,
        };
        let watermark = self.effective_watermark(&base);
        let window = scan_window(watermark, self.config.window_below, self.config.window_above);
        let extra = base.index.commercial_ids(&self.config.commercial_prefix);
        info!(
            start = window.start(),
            end = window.end(),
            commercial = extra.len(),
            "scan window"
        );

        let scanner = JobScanner::new(
            &self.source,
            self.config.workers,
            self.config.lookup_timeout(),
            self.cancel.clone(),
        )
        .with_progress(progress);
        let report = scanner.scan(scan_ids(window, &extra)).await;

        let merged = StoredIndex {
            index: merge(base.index, &report.entries, now.date()),
            watermark: watermark.max(report.highest_found.unwrap_or(0)),
            last_scan: Some(now),
        };
        let saved = match state.store.save(&merged) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "failed to save job index, keeping it for the next cycle");
                false
            }
        };

        let cycle = CycleReport {
            scanned: report.processed,
            found: report.entries.len(),
            failures: report.failures.len(),
            cancelled: report.cancelled,
            watermark: merged.watermark,
            saved,
            entries: merged.index.len(),
        };
        if !saved {
            state.pending = Some(merged);
        }
        info!(?cycle, "scan cycle finished");
        Ok(cycle)
    }

    fn effective_watermark(&self, stored: &StoredIndex) -> u32 {
        stored
            .watermark
            .max(self.config.initial_watermark)
            .max(stored.index.max_job_number().unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexLayout;
    use crate::error::SourceError;
    use crate::grid::{Grid, MemoryGrid};
    use crate::index::{JobIndex, JobIndexEntry, SheetIndexStore};
    use crate::scan::source::{Activity, Form, JobRecord};
    use chrono::NaiveDate;
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 15)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    #[derive(Default)]
    struct MockSource {
        names: HashMap<u32, String>,
        installs: HashMap<u32, NaiveDate>,
        calls: StdMutex<Vec<u32>>,
        delay: Option<Duration>,
    }

    impl MockSource {
        fn with(jobs: &[(u32, &str)]) -> Self {
            Self {
                names: jobs.iter().map(|(id, n)| (*id, n.to_string())).collect(),
                ..Default::default()
            }
        }

        fn take_calls(&self) -> Vec<u32> {
            std::mem::take(&mut *self.calls.lock().unwrap())
        }
    }

    impl JobSource for MockSource {
        async fn get_job(&self, id: u32) -> Result<Option<JobRecord>, SourceError> {
            self.calls.lock().unwrap().push(id);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            Ok(self.names.get(&id).map(|n| JobRecord {
                name: Some(n.clone()),
            }))
        }

        async fn get_activities(&self, id: u32) -> Result<Vec<Activity>, SourceError> {
            Ok(self
                .installs
                .get(&id)
                .map(|d| vec![Activity::new("Install", Some(*d))])
                .unwrap_or_default())
        }

        async fn get_forms(&self, _id: u32) -> Result<Vec<Form>, SourceError> {
            Ok(Vec::new())
        }
    }

    // Fails the first `failures` saves.
    struct FlakyStore {
        inner: SheetIndexStore<MemoryGrid>,
        failures: usize,
        loads: usize,
    }

    impl IndexStore for FlakyStore {
        fn load(&mut self) -> Result<StoredIndex, AutofabError> {
            self.loads += 1;
            self.inner.load()
        }

        fn save(&mut self, stored: &StoredIndex) -> Result<(), AutofabError> {
            if self.failures > 0 {
                self.failures -= 1;
                return Err(AutofabError::Config("sheet is read-only".into()));
            }
            self.inner.save(stored)
        }
    }

    fn small_window() -> ScanConfig {
        ScanConfig {
            initial_watermark: 100,
            window_below: 0,
            window_above: 2,
            ..Default::default()
        }
    }

    fn sheet_store() -> SheetIndexStore<MemoryGrid> {
        SheetIndexStore::new(MemoryGrid::default(), IndexLayout::default())
    }

    #[tokio::test]
    async fn commercial_job_is_rescanned_next_cycle() {
        let source = MockSource::with(&[(101, "Commercial - Office park"), (102, "24-1002 Smith")]);
        let sync = IndexSynchronizer::new(source, sheet_store(), small_window());

        let first = sync.run_cycle(now(), ProgressBar::hidden()).await.unwrap();
        assert_eq!(first.found, 2);
        assert_eq!(first.watermark, 102);
        assert!(first.saved);
        let mut calls = sync.source.take_calls();
        calls.sort_unstable();
        assert_eq!(calls, vec![100, 101, 102]);

        let snapshot = sync.snapshot().await.unwrap();
        assert_eq!(snapshot.index.commercial_ids("Commercial"), vec![101]);
        assert_eq!(snapshot.last_scan, Some(now()));

        sync.run_cycle(now(), ProgressBar::hidden()).await.unwrap();
        let mut calls = sync.source.take_calls();
        calls.sort_unstable();
        assert_eq!(calls, vec![101, 102, 103, 104]);
    }

    #[tokio::test]
    async fn watermark_starts_from_largest_known_job() {
        let mut store = sheet_store();
        let index: JobIndex = [JobIndexEntry::new("150")].into_iter().collect();
        store
            .save(&StoredIndex {
                index,
                watermark: 120,
                last_scan: None,
            })
            .unwrap();
        let sync = IndexSynchronizer::new(MockSource::default(), store, small_window());

        let cycle = sync.run_cycle(now(), ProgressBar::hidden()).await.unwrap();

        let mut calls = sync.source.take_calls();
        calls.sort_unstable();
        assert_eq!(calls, vec![150, 151, 152]);
        assert_eq!(cycle.watermark, 150);
    }

    #[tokio::test]
    async fn failed_save_is_retried_from_memory() {
        let mut source = MockSource::with(&[(101, "Jones bath")]);
        source
            .installs
            .insert(101, NaiveDate::from_ymd_opt(2024, 5, 20).unwrap());
        let store = FlakyStore {
            inner: sheet_store(),
            failures: 1,
            loads: 0,
        };
        let sync = IndexSynchronizer::new(source, store, small_window());

        let first = sync.run_cycle(now(), ProgressBar::hidden()).await.unwrap();
        assert!(!first.saved);
        assert_eq!(first.entries, 1);

        let second = sync.run_cycle(now(), ProgressBar::hidden()).await.unwrap();
        assert!(second.saved);

        let state = sync.state.lock().await;
        assert_eq!(state.store.loads, 1);
        assert!(state.pending.is_none());
        assert_eq!(state.store.inner.grid().read_cell(3, 2).value, "101");
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_cycles_are_rejected() {
        let mut source = MockSource::with(&[(101, "a")]);
        source.delay = Some(Duration::from_secs(1));
        let sync = IndexSynchronizer::new(source, sheet_store(), small_window());

        let (first, second) = tokio::join!(
            sync.run_cycle(now(), ProgressBar::hidden()),
            sync.run_cycle(now(), ProgressBar::hidden()),
        );

        assert!(first.is_ok());
        assert!(matches!(second, Err(AutofabError::ScanInProgress)));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_cycle_still_saves_partial_results() {
        let mut source = MockSource::with(&[(100, "a"), (101, "b"), (102, "c")]);
        source.delay = Some(Duration::from_secs(1));
        let config = ScanConfig {
            workers: 1,
            ..small_window()
        };
        let sync = IndexSynchronizer::new(source, sheet_store(), config);
        let cancel = sync.cancel_flag();

        let (cycle, ()) = tokio::join!(sync.run_cycle(now(), ProgressBar::hidden()), async {
            tokio::time::sleep(Duration::from_millis(1500)).await;
            cancel.cancel();
        });

        let cycle = cycle.unwrap();
        assert!(cycle.cancelled);
        assert!(cycle.saved);
        assert_eq!(cycle.scanned, 2);
        assert_eq!(sync.snapshot().await.unwrap().index.len(), 2);
    }
}
