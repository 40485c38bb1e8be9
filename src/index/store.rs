use std::path::PathBuf;

use chrono::NaiveDateTime;
use tracing::debug;

use super::{JobIndex, JobIndexEntry};
use crate::config::IndexLayout;
use crate::error::AutofabError;
use crate::grid::{CellWrite, Grid, Palette, Workbook};

/// Number of persisted columns per entry.
const COLUMNS: usize = 5;

const LAST_SCAN_FORMAT: &str = "%m/%d/%Y %H:%M:%S";

/// Everything a scan cycle persists between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredIndex {
    pub index: JobIndex,
    /// Largest job identifier confirmed to exist.
    pub watermark: u32,
    /// When the last scan cycle finished, if one ever did.
    pub last_scan: Option<NaiveDateTime>,
}

/// Where the job index lives between scan cycles.
pub trait IndexStore {
    fn load(&mut self) -> Result<StoredIndex, AutofabError>;

    fn save(&mut self, stored: &StoredIndex) -> Result<(), AutofabError>;
}

/// Read index rows starting at `layout.first_row`, stopping at the grid's last row.
pub fn read_index<G: Grid>(grid: &G, layout: &IndexLayout) -> StoredIndex {
    let index = (layout.first_row..=grid.last_row())
        .filter_map(|row| {
            let cells: Vec<String> = (0..COLUMNS)
                .map(|offset| grid.read_cell(row, layout.first_col + offset).value)
                .collect();
            JobIndexEntry::from_row(&cells)
        })
        .collect();
    let watermark = grid
        .read_cell(layout.watermark_row, layout.watermark_col)
        .value
        .trim()
        .parse()
        .unwrap_or(0);
    let last_scan = NaiveDateTime::parse_from_str(
        grid.read_cell(layout.watermark_row, layout.last_scan_col)
            .value
            .trim(),
        LAST_SCAN_FORMAT,
    )
    .ok();
    StoredIndex {
        index,
        watermark,
        last_scan,
    }
}

/// Replace the index rows and the watermark cell. Old rows are cleared first.
pub fn write_index<G: Grid>(
    grid: &mut G,
    layout: &IndexLayout,
    stored: &StoredIndex,
) -> Result<(), AutofabError> {
    for row in layout.first_row..=grid.last_row() {
        for offset in 0..COLUMNS {
            grid.write_cell(row, layout.first_col + offset, CellWrite::value(""))?;
        }
    }
    for (i, entry) in stored.index.iter().enumerate() {
        let row = layout.first_row + i;
        for (offset, value) in entry.to_row().into_iter().enumerate() {
            grid.write_cell(row, layout.first_col + offset, CellWrite::value(value))?;
        }
    }
    grid.write_cell(
        layout.watermark_row,
        layout.watermark_col,
        CellWrite::value(stored.watermark.to_string()),
    )?;
    let last_scan = stored
        .last_scan
        .map(|at| at.format(LAST_SCAN_FORMAT).to_string())
        .unwrap_or_default();
    grid.write_cell(
        layout.watermark_row,
        layout.last_scan_col,
        CellWrite::value(last_scan),
    )?;
    debug!(entries = stored.index.len(), watermark = stored.watermark, "wrote job index");
    Ok(())
}

/// Index kept in a grid the caller owns.
pub struct SheetIndexStore<G> {
    grid: G,
    layout: IndexLayout,
}

impl<G: Grid> SheetIndexStore<G> {
    pub fn new(grid: G, layout: IndexLayout) -> Self {
        Self { grid, layout }
    }

    pub fn grid(&self) -> &G {
        &self.grid
    }
}

impl<G: Grid> IndexStore for SheetIndexStore<G> {
    fn load(&mut self) -> Result<StoredIndex, AutofabError> {
        Ok(read_index(&self.grid, &self.layout))
    }

    fn save(&mut self, stored: &StoredIndex) -> Result<(), AutofabError> {
        write_index(&mut self.grid, &self.layout, stored)
    }
}

/// Index kept in a sheet of a workbook file. Each save re-reads the file so
/// edits to other sheets made since the last load are preserved.
pub struct WorkbookStore {
    path: PathBuf,
    palette: Palette,
    layout: IndexLayout,
}

impl WorkbookStore {
    pub fn new(path: impl Into<PathBuf>, palette: Palette, layout: IndexLayout) -> Self {
        Self {
            path: path.into(),
            palette,
            layout,
        }
    }
}

impl IndexStore for WorkbookStore {
    fn load(&mut self) -> Result<StoredIndex, AutofabError> {
        let book = Workbook::load(&self.path, &self.palette)?;
        match book.sheet(&self.layout.sheet) {
            Ok(sheet) => Ok(read_index(sheet, &self.layout)),
            Err(_) => Ok(StoredIndex::default()),
        }
    }

    fn save(&mut self, stored: &StoredIndex) -> Result<(), AutofabError> {
        let mut book = Workbook::load(&self.path, &self.palette)?;
        let sheet = book.sheet_or_insert(&self.layout.sheet, &self.palette);
        write_index(sheet, &self.layout, stored)?;
        book.save(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::MemoryGrid;
    use chrono::NaiveDate;

    fn sample() -> StoredIndex {
        let mut a = JobIndexEntry::new("19001");
        a.shop_number = "24-1001".into();
        a.job_name = "24-1001 Smith kitchen".into();
        a.install_dates
            .insert(NaiveDate::from_ymd_opt(2024, 5, 20).unwrap());
        let mut b = JobIndexEntry::new("19002");
        b.job_name = "Commercial - Lobby".into();
        StoredIndex {
            index: [a, b].into_iter().collect(),
            watermark: 19002,
            last_scan: NaiveDate::from_ymd_opt(2024, 5, 15)
                .unwrap()
                .and_hms_opt(17, 30, 5),
        }
    }

    #[test]
    fn sheet_store_round_trip() {
        let mut store = SheetIndexStore::new(MemoryGrid::default(), IndexLayout::default());
        let stored = sample();
        store.save(&stored).unwrap();

        assert_eq!(store.grid().read_cell(3, 2).value, "19001");
        assert_eq!(store.grid().read_cell(3, 6).value, "05/20/2024");
        assert_eq!(store.grid().read_cell(1, 2).value, "19002");
        assert_eq!(store.grid().read_cell(1, 3).value, "05/15/2024 17:30:05");
        assert_eq!(store.load().unwrap(), stored);
    }

    #[test]
    fn save_clears_rows_from_a_longer_previous_index() {
        let mut store = SheetIndexStore::new(MemoryGrid::default(), IndexLayout::default());
        store.save(&sample()).unwrap();

        let shorter = StoredIndex {
            index: [JobIndexEntry::new("7")].into_iter().collect(),
            watermark: 7,
            last_scan: None,
        };
        store.save(&shorter).unwrap();

        assert_eq!(store.load().unwrap(), shorter);
        assert!(store.grid().read_cell(4, 2).is_blank());
        assert!(store.grid().read_cell(1, 3).is_blank());
    }

    #[test]
    fn empty_grid_loads_empty_index() {
        let mut store = SheetIndexStore::new(MemoryGrid::default(), IndexLayout::default());
        assert_eq!(store.load().unwrap(), StoredIndex::default());
    }

    #[test]
    fn workbook_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("workbook.json");
        let mut store = WorkbookStore::new(&path, Palette::default(), IndexLayout::default());

        assert_eq!(store.load().unwrap(), StoredIndex::default());
        store.save(&sample()).unwrap();
        assert_eq!(store.load().unwrap(), sample());
    }

    #[test]
    fn workbook_store_keeps_other_sheets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("workbook.json");
        let palette = Palette::default();
        let mut book = Workbook::default();
        book.sheet_or_insert("AUTOFAB", &palette).put(1, 3, "Monday 5/13/24");
        book.save(&path).unwrap();

        let mut store = WorkbookStore::new(&path, palette.clone(), IndexLayout::default());
        store.save(&sample()).unwrap();

        let book = Workbook::load(&path, &palette).unwrap();
        assert_eq!(book.sheet("AUTOFAB").unwrap().read_cell(1, 3).value, "Monday 5/13/24");
    }
}
