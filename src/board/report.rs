//! End-of-day activity summary for today's section of the board.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{debug, info};

use super::engine::{SlotJob, Stage};
use super::sections::{SectionIndex, is_weekend};
use crate::config::BoardConfig;
use crate::error::AutofabError;
use crate::grid::{ColorTag, Grid};

/// Jobs finished today, per stage. A slot counts as finished when its number
/// cell is filled and carries the advance font.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub saw: Vec<SlotJob>,
    pub cnc: Vec<SlotJob>,
    pub polish: Vec<SlotJob>,
}

impl DailySummary {
    /// Read today's section. `None` on weekends, without touching the grid,
    /// and when the board has no section for `today`.
    pub fn collect<G: Grid>(grid: &G, board: &BoardConfig, today: NaiveDate) -> Option<Self> {
        if is_weekend(today) {
            debug!(%today, "weekend, no daily summary");
            return None;
        }
        let sections = SectionIndex::locate(grid, &board.layout);
        let section = sections.section_for_date(today)?;

        let completed = |stage: Stage| -> Vec<SlotJob> {
            let cols = stage.columns(board);
            section
                .rows()
                .filter_map(|row| {
                    let number = grid.read_cell(row, cols.number);
                    if number.is_blank() || number.font != ColorTag::Advance {
                        return None;
                    }
                    let description = grid.read_cell(row, cols.description).value;
                    Some(SlotJob::new(number.value.trim(), description.trim()))
                })
                .collect()
        };

        let summary = Self {
            date: today,
            saw: completed(Stage::Saw),
            cnc: completed(Stage::Cnc),
            polish: completed(Stage::Polish),
        };
        info!(
            saw = summary.saw.len(),
            cnc = summary.cnc.len(),
            polish = summary.polish.len(),
            "collected daily summary"
        );
        Some(summary)
    }

    pub fn completed(&self, stage: Stage) -> &[SlotJob] {
        match stage {
            Stage::Saw => &self.saw,
            Stage::Cnc => &self.cnc,
            Stage::Polish => &self.polish,
        }
    }

    pub fn file_name(&self) -> String {
        format!("DailySummary_{}.txt", self.date.format("%Y-%m-%d"))
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Daily Activity Summary for {}", self.date.format("%m/%d/%Y"));
        let _ = writeln!(out, "{}", "=".repeat(45));

        for stage in [Stage::Saw, Stage::Cnc, Stage::Polish] {
            let title = format!("COMPLETED {stage} JOBS:");
            let _ = writeln!(out);
            let _ = writeln!(out, "{title}");
            let _ = writeln!(out, "{}", "-".repeat(title.len()));
            let jobs = self.completed(stage);
            if jobs.is_empty() {
                let _ = writeln!(out, "No completed {} jobs today.", stage.to_string().to_lowercase());
            }
            for job in jobs {
                let _ = writeln!(out, "- {} - {}", job.number, job.description);
            }
        }
        out
    }

    /// Write the rendered summary into `dir`, creating it if needed.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, AutofabError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(self.file_name());
        std::fs::write(&path, self.render())?;
        info!(path = %path.display(), "daily summary saved");
        Ok(path)
    }
}
