use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Date format used for every date the index renders.
pub const DATE_FORMAT: &str = "%m/%d/%Y";

/// One row of the job index. Identity is the job number alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobIndexEntry {
    pub job_number: String,
    pub shop_number: String,
    pub job_name: String,
    pub digitize_date: Option<NaiveDate>,
    /// Sorted and free of duplicates by construction.
    pub install_dates: BTreeSet<NaiveDate>,
}

impl JobIndexEntry {
    pub fn new(job_number: impl Into<String>) -> Self {
        Self {
            job_number: job_number.into(),
            shop_number: String::new(),
            job_name: String::new(),
            digitize_date: None,
            install_dates: BTreeSet::new(),
        }
    }

    /// Whether the job name starts with `prefix`, ignoring case.
    pub fn is_commercial(&self, prefix: &str) -> bool {
        !prefix.is_empty()
            && self
                .job_name
                .get(..prefix.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    }

    /// Drop install dates before `today`.
    pub fn retain_from(&mut self, today: NaiveDate) {
        self.install_dates.retain(|d| *d >= today);
    }

    /// Install dates as a human-readable, comma-joined list.
    pub fn formatted_install_dates(&self) -> String {
        self.install_dates
            .iter()
            .map(|d| d.format(DATE_FORMAT).to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn formatted_digitize_date(&self) -> String {
        self.digitize_date
            .map(|d| d.format(DATE_FORMAT).to_string())
            .unwrap_or_default()
    }

    /// The five persisted columns: job number, shop number, job name,
    /// digitize date, install dates.
    pub fn to_row(&self) -> [String; 5] {
        [
            self.job_number.clone(),
            self.shop_number.clone(),
            self.job_name.clone(),
            self.formatted_digitize_date(),
            self.formatted_install_dates(),
        ]
    }

    /// Rebuild an entry from persisted columns. Rows without a job number are
    /// skipped; unparsable dates are dropped.
    pub fn from_row(row: &[String]) -> Option<Self> {
        let cell = |i: usize| row.get(i).map(|s| s.trim()).unwrap_or("");
        let job_number = cell(0);
        if job_number.is_empty() {
            return None;
        }
        Some(Self {
            job_number: job_number.to_string(),
            shop_number: cell(1).to_string(),
            job_name: cell(2).to_string(),
            digitize_date: parse_date(cell(3)),
            install_dates: cell(4).split(',').filter_map(parse_date).collect(),
        })
    }
}

/// Parse a date as written by the index or typed by a person.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    // Two-digit years first: `%Y` would read "24" as the year 24.
    ["%m/%d/%y", "%m/%d/%Y", "%Y-%m-%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}
