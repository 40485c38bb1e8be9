//! The job index: every known job and its schedule-relevant dates.

mod entry;
mod merge;
mod store;

use chrono::NaiveDate;
use indexmap::IndexMap;

pub use entry::{DATE_FORMAT, JobIndexEntry, parse_date};
pub use merge::merge;
pub use store::{IndexStore, SheetIndexStore, StoredIndex, WorkbookStore};

/// Entries keyed by job number, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobIndex {
    entries: IndexMap<String, JobIndexEntry>,
}

impl JobIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, replacing any entry with the same job number in place.
    pub fn upsert(&mut self, entry: JobIndexEntry) {
        self.entries.insert(entry.job_number.clone(), entry);
    }

    pub fn get(&self, job_number: &str) -> Option<&JobIndexEntry> {
        self.entries.get(job_number)
    }

    pub(crate) fn get_mut(&mut self, job_number: &str) -> Option<&mut JobIndexEntry> {
        self.entries.get_mut(job_number)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &JobIndexEntry> {
        self.entries.values()
    }

    /// Numeric ids of jobs whose name carries the commercial prefix.
    pub fn commercial_ids(&self, prefix: &str) -> Vec<u32> {
        self.iter()
            .filter(|e| e.is_commercial(prefix))
            .filter_map(|e| e.job_number.parse().ok())
            .collect()
    }

    /// Largest numeric job number in the index.
    pub fn max_job_number(&self) -> Option<u32> {
        self.iter().filter_map(|e| e.job_number.parse().ok()).max()
    }

    /// Entries with an install scheduled on `date`.
    pub fn installing_on(&self, date: NaiveDate) -> impl Iterator<Item = &JobIndexEntry> {
        self.iter().filter(move |e| e.install_dates.contains(&date))
    }
}

/// Collecting keeps the first entry seen for each job number.
impl FromIterator<JobIndexEntry> for JobIndex {
    fn from_iter<I: IntoIterator<Item = JobIndexEntry>>(iter: I) -> Self {
        let mut entries = IndexMap::new();
        for entry in iter {
            entries.entry(entry.job_number.clone()).or_insert(entry);
        }
        Self { entries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(job: &str, name: &str) -> JobIndexEntry {
        let mut entry = JobIndexEntry::new(job);
        entry.job_name = name.into();
        entry
    }

    #[test]
    fn collect_keeps_first_duplicate() {
        let index: JobIndex = [named("1", "first"), named("2", "b"), named("1", "second")]
            .into_iter()
            .collect();
        assert_eq!(index.len(), 2);
        assert_eq!(index.get("1").unwrap().job_name, "first");
    }

    #[test]
    fn upsert_keeps_position() {
        let mut index: JobIndex = [named("1", "a"), named("2", "b")].into_iter().collect();
        index.upsert(named("1", "renamed"));
        let order: Vec<_> = index.iter().map(|e| e.job_name.as_str()).collect();
        assert_eq!(order, vec!["renamed", "b"]);
    }

    #[test]
    fn commercial_ids_and_max_job_number() {
        let index: JobIndex = [
            named("101", "Commercial - Office park"),
            named("102", "Smith kitchen"),
            named("abc", "Commercial - no id"),
        ]
        .into_iter()
        .collect();
        assert_eq!(index.commercial_ids("Commercial"), vec![101]);
        assert_eq!(index.max_job_number(), Some(102));
    }

    #[test]
    fn installing_on_filters_by_date() {
        let day = NaiveDate::from_ymd_opt(2024, 5, 16).unwrap();
        let mut a = named("1", "a");
        a.install_dates.insert(day);
        let index: JobIndex = [a, named("2", "b")].into_iter().collect();
        let hits: Vec<_> = index.installing_on(day).map(|e| e.job_number.as_str()).collect();
        assert_eq!(hits, vec!["1"]);
    }
}
