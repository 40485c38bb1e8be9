//! Date Section Index: the board's day sections, found from header rows.
//!
//! A header row is any row whose header column carries the header background
//! tag. Each header opens a section that runs until the row before the next
//! header, or the grid's last row. The index is rebuilt on every engine
//! invocation and kept sorted by header row, so boundary lookups are binary
//! searches instead of walks over the grid.

use std::ops::RangeInclusive;
use std::sync::LazyLock;

use chrono::{Datelike, Days, NaiveDate, Weekday};
use regex::Regex;
use tracing::{debug, warn};

use crate::config::ColumnLayout;
use crate::grid::{ColorTag, Grid};

static HEADER_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2})/(\d{1,2})/(\d{2,4})").expect("valid regex"));

/// One day of the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateSection {
    pub header_row: usize,
    /// First row after the header.
    pub start_row: usize,
    /// Last row before the next header (or the grid's last row).
    pub end_row: usize,
    /// Date parsed from the header text; `None` if the header carries no readable date.
    pub date: Option<NaiveDate>,
    pub header_text: String,
}

impl DateSection {
    /// Rows that hold slots. Empty when the header is the grid's last row.
    pub fn rows(&self) -> RangeInclusive<usize> {
        self.start_row..=self.end_row
    }
}

#[derive(Debug, Clone, Default)]
pub struct SectionIndex {
    sections: Vec<DateSection>,
}

impl SectionIndex {
    /// Scan the grid top to bottom once and build the ordered section list.
    pub fn locate<G: Grid>(grid: &G, layout: &ColumnLayout) -> Self {
        let last_row = grid.last_row();
        let mut sections: Vec<DateSection> = Vec::new();

        for row in 1..=last_row {
            if grid.read_cell(row, layout.header).background != ColorTag::Header {
                continue;
            }
            if let Some(open) = sections.last_mut() {
                open.end_row = row - 1;
            }
            let (date, header_text) = header_date(grid, row, layout.last_col());
            sections.push(DateSection {
                header_row: row,
                start_row: row + 1,
                end_row: last_row,
                date,
                header_text,
            });
        }

        for (i, section) in sections.iter().enumerate() {
            let Some(date) = section.date else {
                debug!(row = section.header_row, text = %section.header_text, "header without a date");
                continue;
            };
            if sections[..i].iter().any(|s| s.date == Some(date)) {
                warn!(row = section.header_row, %date, "date appears in more than one section");
            }
        }

        debug!(count = sections.len(), "located date sections");
        Self { sections }
    }

    pub fn sections(&self) -> &[DateSection] {
        &self.sections
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn is_header(&self, row: usize) -> bool {
        self.sections
            .binary_search_by_key(&row, |s| s.header_row)
            .is_ok()
    }

    /// Section whose header is at or above `row`.
    pub fn section_at(&self, row: usize) -> Option<&DateSection> {
        let idx = self.headers_through(row);
        idx.checked_sub(1).and_then(|i| self.sections.get(i))
    }

    /// First section whose header is strictly below `row`.
    pub fn next_section_after(&self, row: usize) -> Option<&DateSection> {
        self.nth_section_after(row, 1)
    }

    /// The `n`-th section (1-based) whose header is strictly below `row`.
    pub fn nth_section_after(&self, row: usize, n: usize) -> Option<&DateSection> {
        let first = self.headers_through(row);
        n.checked_sub(1).and_then(|k| self.sections.get(first + k))
    }

    /// Section whose header date equals `date`. The first one wins on duplicates.
    pub fn section_for_date(&self, date: NaiveDate) -> Option<&DateSection> {
        self.sections.iter().find(|s| s.date == Some(date))
    }

    // Number of headers at or above `row`.
    fn headers_through(&self, row: usize) -> usize {
        self.sections.partition_point(|s| s.header_row <= row)
    }
}

/// Date and raw text of a header row. The first cell containing `M/D/YY` wins;
/// otherwise the text is the first non-blank cell and the date is `None`.
fn header_date<G: Grid>(grid: &G, row: usize, last_col: usize) -> (Option<NaiveDate>, String) {
    let mut fallback = String::new();
    for col in 1..=last_col {
        let cell = grid.read_cell(row, col);
        if cell.is_blank() {
            continue;
        }
        let text = cell.value.trim().to_string();
        if let Some(date) = parse_header_date(&text) {
            return (Some(date), text);
        }
        if fallback.is_empty() {
            fallback = text;
        }
    }
    (None, fallback)
}

/// Parse the first `M/D/YY` or `M/D/YYYY` date in a header label such as
/// `"Monday 3/7/25"`. Two-digit years are 20xx.
pub fn parse_header_date(text: &str) -> Option<NaiveDate> {
    let caps = HEADER_DATE.captures(text)?;
    let month: u32 = caps[1].parse().ok()?;
    let day: u32 = caps[2].parse().ok()?;
    let mut year: i32 = caps[3].parse().ok()?;
    match caps[3].len() {
        2 => year += 2000,
        4 => {}
        _ => return None,
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

/// The board has no weekend sections.
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Next weekday strictly after `date`.
pub fn next_workday(date: NaiveDate) -> NaiveDate {
    let mut next = date + Days::new(1);
    while is_weekend(next) {
        next = next + Days::new(1);
    }
    next
}
