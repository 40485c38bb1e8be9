//! The production board: day sections, the stage transition engine, job
//! hyperlinks and the daily summary.

mod engine;
mod links;
mod report;
mod sections;

#[cfg(test)]
mod fixtures;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::config::ColumnLayout;
use crate::grid::{Grid, GridError};

pub use engine::{CellChange, MoveOutcome, SlotJob, Stage, Transition, TransitionEngine};
pub use links::{LinkIndex, annotate_links};
pub use report::DailySummary;
pub use sections::{DateSection, SectionIndex, is_weekend, next_workday, parse_header_date};

/// Name of the anchor placed on today's header.
pub const TODAY_ANCHOR: &str = "TodaySection";

/// Point the board at today's section: anchor its header and scroll it to the
/// top by hiding then re-showing the rows above. Returns the header row, or
/// `None` on weekends and when no section carries today's date.
pub fn focus_today<G: Grid>(
    grid: &mut G,
    layout: &ColumnLayout,
    today: NaiveDate,
) -> Result<Option<usize>, GridError> {
    if is_weekend(today) {
        debug!(%today, "weekend, nothing to focus");
        return Ok(None);
    }
    let sections = SectionIndex::locate(&*grid, layout);
    let Some(header) = sections.section_for_date(today).map(|s| s.header_row) else {
        info!(%today, "no section for today");
        return Ok(None);
    };

    grid.set_named_anchor(TODAY_ANCHOR, header, 1)?;
    if header > 1 {
        grid.hide_rows(1..=header - 1)?;
        grid.show_rows(1..=header - 1)?;
    }
    info!(row = header, "focused today's section");
    Ok(Some(header))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::MemoryGrid;
    use crate::board::fixtures::{self, CountingGrid};

    #[test]
    fn focus_anchors_todays_header() {
        let mut grid: MemoryGrid = fixtures::week();
        let thursday = NaiveDate::from_ymd_opt(2024, 5, 16).unwrap();

        let row = focus_today(&mut grid, &ColumnLayout::default(), thursday).unwrap();

        assert_eq!(row, Some(13));
        assert_eq!(grid.anchor(TODAY_ANCHOR), Some((13, 1)));
        assert!((1..13).all(|r| !grid.is_hidden(r)));
    }

    #[test]
    fn focus_on_weekend_never_reads_the_grid() {
        let mut grid = CountingGrid::new(fixtures::week());
        let sunday = NaiveDate::from_ymd_opt(2024, 5, 19).unwrap();

        let row = focus_today(&mut grid, &ColumnLayout::default(), sunday).unwrap();

        assert_eq!(row, None);
        assert_eq!(grid.reads(), 0);
        assert_eq!(grid.inner().anchor(TODAY_ANCHOR), None);
    }

    #[test]
    fn focus_without_matching_section() {
        let mut grid = fixtures::week();
        let next_monday = NaiveDate::from_ymd_opt(2024, 5, 20).unwrap();
        assert_eq!(
            focus_today(&mut grid, &ColumnLayout::default(), next_monday).unwrap(),
            None
        );
    }
}
