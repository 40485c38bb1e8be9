//! Board grids shared by the board tests.

use std::cell::Cell as Counter;
use std::ops::RangeInclusive;

use crate::grid::{Cell, CellWrite, Grid, GridError, MemoryGrid};

pub const HEADER_COLORS: [&str; 2] = ["#ffa500", "#ff9900"];
pub const ADVANCE: &str = "#ff0000";

pub struct BoardBuilder {
    grid: MemoryGrid,
    headers: usize,
}

impl BoardBuilder {
    pub fn new() -> Self {
        Self {
            grid: MemoryGrid::default(),
            headers: 0,
        }
    }

    /// Header row across columns 1..=10, alternating the two header colors.
    pub fn header(mut self, row: usize, label: &str) -> Self {
        let color = HEADER_COLORS[self.headers % 2];
        self.headers += 1;
        for col in 1..=10 {
            self.grid.put_background(row, col, color);
        }
        self.grid.put(row, 3, label);
        self
    }

    /// Mark rows as work slots (a label in column 1, as the real board has).
    pub fn slot_rows(mut self, rows: RangeInclusive<usize>) -> Self {
        for row in rows {
            self.grid.put(row, 1, "slot");
        }
        self
    }

    pub fn saw(mut self, row: usize, number: &str, desc: &str) -> Self {
        self.grid.put(row, 2, number);
        self.grid.put(row, 3, desc);
        self
    }

    pub fn note(mut self, row: usize, note: &str) -> Self {
        self.grid.put(row, 4, note);
        self
    }

    pub fn cnc(mut self, row: usize, number: &str, desc: &str) -> Self {
        self.grid.put(row, 6, number);
        self.grid.put(row, 7, desc);
        self
    }

    pub fn polish(mut self, row: usize, number: &str, desc: &str) -> Self {
        self.grid.put(row, 9, number);
        self.grid.put(row, 10, desc);
        self
    }

    pub fn font(mut self, row: usize, col: usize, color: &str) -> Self {
        self.grid.put_font(row, col, color);
        self
    }

    pub fn build(self) -> MemoryGrid {
        self.grid
    }
}

/// Monday 5/13/24 through Friday 5/17/24, three slot rows per day.
///
/// Headers sit at rows 1, 5, 9, 13, 17.
pub fn week_builder() -> BoardBuilder {
    BoardBuilder::new()
        .header(1, "Monday 5/13/24")
        .slot_rows(2..=4)
        .header(5, "Tuesday 5/14/24")
        .slot_rows(6..=8)
        .header(9, "Wednesday 5/15/24")
        .slot_rows(10..=12)
        .header(13, "Thursday 5/16/24")
        .slot_rows(14..=16)
        .header(17, "Friday 5/17/24")
        .slot_rows(18..=20)
}

pub fn week() -> MemoryGrid {
    week_builder().build()
}

/// Wraps a grid and counts cell reads, for asserting that a path never
/// touches the board.
pub struct CountingGrid {
    inner: MemoryGrid,
    reads: Counter<usize>,
}

impl CountingGrid {
    pub fn new(inner: MemoryGrid) -> Self {
        Self {
            inner,
            reads: Counter::new(0),
        }
    }

    pub fn reads(&self) -> usize {
        self.reads.get()
    }

    pub fn inner(&self) -> &MemoryGrid {
        &self.inner
    }
}

impl Grid for CountingGrid {
    fn read_cell(&self, row: usize, col: usize) -> Cell {
        self.reads.set(self.reads.get() + 1);
        self.inner.read_cell(row, col)
    }

    fn write_cell(&mut self, row: usize, col: usize, write: CellWrite) -> Result<(), GridError> {
        self.inner.write_cell(row, col, write)
    }

    fn link(&self, row: usize, col: usize) -> Option<String> {
        self.inner.link(row, col)
    }

    fn set_link(&mut self, row: usize, col: usize, url: &str) -> Result<(), GridError> {
        self.inner.set_link(row, col, url)
    }

    fn hide_rows(&mut self, rows: RangeInclusive<usize>) -> Result<(), GridError> {
        self.inner.hide_rows(rows)
    }

    fn show_rows(&mut self, rows: RangeInclusive<usize>) -> Result<(), GridError> {
        self.inner.show_rows(rows)
    }

    fn last_row(&self) -> usize {
        self.reads.set(self.reads.get() + 1);
        self.inner.last_row()
    }

    fn set_named_anchor(&mut self, name: &str, row: usize, col: usize) -> Result<(), GridError> {
        self.inner.set_named_anchor(name, row, col)
    }
}
