//! Stage transition engine.
//!
//! Each job on the board flows through: SAW → CNC → POLISH. A person marks a
//! slot's font with the advance color when the stage is finished; the engine
//! sees that cell change and relocates the job record into the next stage's
//! slot. Polish is terminal.
//!
//! One [`TransitionEngine`] borrows the grid mutably for the whole event, so a
//! move and its hyperlink pass can never interleave with another event.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::links::{LinkIndex, annotate_links};
use super::sections::{SectionIndex, is_weekend, next_workday};
use crate::config::{BoardConfig, SlotColumns};
use crate::grid::{CellWrite, ColorTag, Grid, GridError};
use crate::index::JobIndex;

/// Pipeline stages, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Saw,
    Cnc,
    Polish,
}

impl Stage {
    pub fn columns(self, board: &BoardConfig) -> SlotColumns {
        match self {
            Stage::Saw => board.layout.saw,
            Stage::Cnc => board.layout.cnc,
            Stage::Polish => board.layout.polish,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Saw => write!(f, "SAW"),
            Stage::Cnc => write!(f, "CNC"),
            Stage::Polish => write!(f, "POLISH"),
        }
    }
}

/// A job record as read from one slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotJob {
    pub number: String,
    pub description: String,
    /// Free-text note beside the slot (Saw only).
    pub note: String,
}

impl SlotJob {
    pub fn new(number: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            description: description.into(),
            note: String::new(),
        }
    }

    fn is_empty(&self) -> bool {
        self.number.trim().is_empty() && self.description.trim().is_empty()
    }

    /// Whether the description or the note carries the skip-CNC marker.
    pub fn skips_cnc(&self, marker: &str) -> bool {
        let marker = marker.trim().to_uppercase();
        !marker.is_empty()
            && (self.description.to_uppercase().contains(&marker)
                || self.note.to_uppercase().contains(&marker))
    }
}

impl fmt::Display for SlotJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.number, self.description)
    }
}

/// An observed edit to one cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellChange {
    pub row: usize,
    pub col: usize,
    pub value: String,
    pub font: ColorTag,
}

/// Result of the move procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The job was written into this row.
    Placed { row: usize },
    /// The target section already holds this job at this row; nothing was written.
    Duplicate { row: usize },
    /// Every slot of the target stage in the section is taken.
    Full,
    /// There is no section to move into.
    NoSection,
}

impl MoveOutcome {
    pub fn placed_row(&self) -> Option<usize> {
        match self {
            MoveOutcome::Placed { row } => Some(*row),
            _ => None,
        }
    }
}

impl fmt::Display for MoveOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveOutcome::Placed { row } => write!(f, "placed at row {row}"),
            MoveOutcome::Duplicate { row } => write!(f, "already at row {row}"),
            MoveOutcome::Full => write!(f, "no free slot"),
            MoveOutcome::NoSection => write!(f, "no target section"),
        }
    }
}

/// What one cell change did to the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Saw finished; job moved to CNC in the same section.
    SawToCnc { job: SlotJob, cnc: MoveOutcome },
    /// Saw finished on a skip-CNC job: CNC slot placed pre-flagged, then the
    /// job moved to Polish of the next section. `polish` is `None` when the
    /// CNC placement did not happen.
    SkipCnc {
        job: SlotJob,
        cnc: MoveOutcome,
        polish: Option<MoveOutcome>,
    },
    /// CNC finished; job moved to Polish of the next section down.
    CncToPolish { job: SlotJob, polish: MoveOutcome },
    /// The Saw description says the job installs tomorrow; job placed into
    /// today's Polish stage.
    InstallsTomorrow { job: SlotJob, polish: MoveOutcome },
}

/// Applies cell-change events to one board grid.
pub struct TransitionEngine<'a, G> {
    grid: &'a mut G,
    board: &'a BoardConfig,
    links: &'a LinkIndex,
}

impl<'a, G: Grid> TransitionEngine<'a, G> {
    pub fn new(grid: &'a mut G, board: &'a BoardConfig, links: &'a LinkIndex) -> Self {
        Self { grid, board, links }
    }

    /// React to one cell change. Returns every transition it caused, in order.
    pub fn apply(
        &mut self,
        change: &CellChange,
        today: NaiveDate,
    ) -> Result<Vec<Transition>, GridError> {
        let board = self.board;
        let layout = &board.layout;
        let in_saw = change.col == layout.saw.number || change.col == layout.saw.description;
        let in_cnc = change.col == layout.cnc.number || change.col == layout.cnc.description;
        let mut installs_tomorrow =
            change.col == layout.saw.description && self.mentions_installs_tomorrow(&change.value);
        let advanced = change.font == ColorTag::Advance && (in_saw || in_cnc);

        if installs_tomorrow && is_weekend(today) {
            debug!(%today, "weekend, no today section");
            installs_tomorrow = false;
        }

        if !installs_tomorrow && !advanced {
            return Ok(Vec::new());
        }

        let sections = SectionIndex::locate(&*self.grid, layout);
        let mut transitions = Vec::new();

        if installs_tomorrow {
            if let Some(t) = self.installs_tomorrow(&sections, change.row, today)? {
                transitions.push(t);
            }
        }

        if advanced {
            if sections.is_header(change.row) {
                debug!(row = change.row, "advance mark on a header row, ignoring");
            } else if in_saw {
                if let Some(t) = self.saw_to_cnc(&sections, change.row)? {
                    transitions.push(t);
                }
            } else if let Some(t) = self.cnc_to_polish(&sections, change.row)? {
                transitions.push(t);
            }
        }

        Ok(transitions)
    }

    fn saw_to_cnc(
        &mut self,
        sections: &SectionIndex,
        row: usize,
    ) -> Result<Option<Transition>, GridError> {
        let job = self.read_job(row, Stage::Saw);
        if job.is_empty() {
            debug!(row, "advance mark on an empty saw slot");
            return Ok(None);
        }
        let header = sections.section_at(row).map(|s| s.header_row);
        self.clear_background(row, Stage::Saw)?;
        let Some(header) = header else {
            info!(row, job = %job, "no day header above saw slot");
            return Ok(None);
        };

        let cnc = self.move_job(sections, header, &job, Stage::Cnc, false)?;
        if !job.skips_cnc(&self.board.markers.skip_cnc) {
            return Ok(Some(Transition::SawToCnc { job, cnc }));
        }

        let polish = match cnc.placed_row() {
            Some(cnc_row) => {
                self.pre_flag(cnc_row, Stage::Cnc)?;
                Some(self.move_job(sections, header, &job, Stage::Polish, true)?)
            }
            None => None,
        };
        Ok(Some(Transition::SkipCnc { job, cnc, polish }))
    }

    fn cnc_to_polish(
        &mut self,
        sections: &SectionIndex,
        row: usize,
    ) -> Result<Option<Transition>, GridError> {
        let job = self.read_job(row, Stage::Cnc);
        if job.is_empty() {
            debug!(row, "advance mark on an empty cnc slot");
            return Ok(None);
        }
        let target = sections.next_section_after(row).map(|s| s.header_row);
        self.clear_background(row, Stage::Cnc)?;
        let polish = match target {
            Some(header) => self.move_job(sections, header, &job, Stage::Polish, false)?,
            None => {
                info!(row, job = %job, "no day header below cnc slot");
                MoveOutcome::NoSection
            }
        };
        Ok(Some(Transition::CncToPolish { job, polish }))
    }

    fn installs_tomorrow(
        &mut self,
        sections: &SectionIndex,
        row: usize,
        today: NaiveDate,
    ) -> Result<Option<Transition>, GridError> {
        let job = self.read_job(row, Stage::Saw);
        let Some(section) = sections.section_for_date(today) else {
            info!(%today, job = %job, "no section for today");
            return Ok(None);
        };
        let polish = self.move_job(sections, section.header_row, &job, Stage::Polish, false)?;
        Ok(Some(Transition::InstallsTomorrow { job, polish }))
    }

    /// Place every job installing on the next workday into that day's Polish stage.
    pub fn schedule_installs(
        &mut self,
        index: &JobIndex,
        today: NaiveDate,
    ) -> Result<Vec<(SlotJob, MoveOutcome)>, GridError> {
        if is_weekend(today) {
            debug!(%today, "weekend, skipping install scheduling");
            return Ok(Vec::new());
        }
        let tomorrow = next_workday(today);
        let sections = SectionIndex::locate(&*self.grid, &self.board.layout);
        let Some(section) = sections.section_for_date(tomorrow) else {
            info!(%tomorrow, "no section for the next workday");
            return Ok(Vec::new());
        };
        let header = section.header_row;

        let mut placed = Vec::new();
        for entry in index.installing_on(tomorrow) {
            if entry.shop_number.trim().is_empty() || entry.job_name.trim().is_empty() {
                debug!(job = %entry.job_number, "install without shop number or name");
                continue;
            }
            let job = SlotJob::new(entry.shop_number.trim(), entry.job_name.trim());
            let outcome = self.move_job(&sections, header, &job, Stage::Polish, false)?;
            placed.push((job, outcome));
        }
        info!(%tomorrow, count = placed.len(), "scheduled installs into polish");
        Ok(placed)
    }

    /// Move procedure.
    ///
    /// The target section is the one headed at or above `anchor_row`, or with
    /// `next_section` the first one headed strictly below it. Both scans stay
    /// inside that section: a full day never spills into the next one.
    pub fn move_job(
        &mut self,
        sections: &SectionIndex,
        anchor_row: usize,
        job: &SlotJob,
        target: Stage,
        next_section: bool,
    ) -> Result<MoveOutcome, GridError> {
        let section = if next_section {
            sections.next_section_after(anchor_row)
        } else {
            sections.section_at(anchor_row)
        };
        let Some(section) = section else {
            info!(anchor_row, job = %job, stage = %target, "no target section");
            return Ok(MoveOutcome::NoSection);
        };
        let cols = target.columns(self.board);

        for row in section.rows() {
            let number = self.grid.read_cell(row, cols.number);
            let description = self.grid.read_cell(row, cols.description);
            if number.value == job.number && description.value == job.description {
                info!(row, job = %job, stage = %target, "job already in section");
                return Ok(MoveOutcome::Duplicate { row });
            }
        }

        let free = section.rows().find(|&row| {
            let number = self.grid.read_cell(row, cols.number);
            let description = self.grid.read_cell(row, cols.description);
            number.is_blank() && description.is_blank() && number.background != ColorTag::Header
        });
        let Some(row) = free else {
            info!(header = section.header_row, job = %job, stage = %target, "section is full");
            return Ok(MoveOutcome::Full);
        };

        let size = self.board.fresh_font_size;
        for (col, value) in [(cols.number, &job.number), (cols.description, &job.description)] {
            self.grid.write_cell(
                row,
                col,
                CellWrite::value(value.clone())
                    .with_font(ColorTag::Ink)
                    .with_background(ColorTag::Fresh)
                    .with_font_size(size),
            )?;
        }
        info!(row, job = %job, stage = %target, "moved job");

        if let Err(e) = annotate_links(&mut *self.grid, self.links, &self.board.layout) {
            warn!(error = %e, "hyperlink pass failed after move");
        }
        Ok(MoveOutcome::Placed { row })
    }

    fn read_job(&self, row: usize, stage: Stage) -> SlotJob {
        let cols = stage.columns(self.board);
        let note = match stage {
            Stage::Saw => self.grid.read_cell(row, self.board.layout.note).value,
            _ => String::new(),
        };
        SlotJob {
            number: self.grid.read_cell(row, cols.number).value,
            description: self.grid.read_cell(row, cols.description).value,
            note,
        }
    }

    fn clear_background(&mut self, row: usize, stage: Stage) -> Result<(), GridError> {
        let cols = stage.columns(self.board);
        for col in [cols.number, cols.description] {
            self.grid
                .write_cell(row, col, CellWrite::background(ColorTag::Neutral))?;
        }
        Ok(())
    }

    // Marks a slot as already finished: advance font on a neutral background.
    fn pre_flag(&mut self, row: usize, stage: Stage) -> Result<(), GridError> {
        let cols = stage.columns(self.board);
        for col in [cols.number, cols.description] {
            self.grid.write_cell(
                row,
                col,
                CellWrite::default()
                    .with_font(ColorTag::Advance)
                    .with_background(ColorTag::Neutral),
            )?;
        }
        Ok(())
    }

    fn mentions_installs_tomorrow(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.board
            .markers
            .installs_tomorrow
            .iter()
            .any(|phrase| !phrase.is_empty() && lower.contains(&phrase.to_lowercase()))
    }
}
