//! Grid accessor seam between the board engines and a spreadsheet backend.
//!
//! The engines only ever see [`ColorTag`]s. Backends store literal colors and
//! translate them through a [`Palette`] when cells cross the boundary.

mod memory;
mod palette;
mod workbook;

use std::ops::RangeInclusive;

use thiserror::Error;

pub use memory::{MemoryGrid, RawCell};
pub use palette::Palette;
pub use workbook::Workbook;

/// Semantic meaning of a font or background color.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColorTag {
    /// Day header rows (two equivalent literal colors collapse onto this tag).
    Header,
    /// Font color meaning "this slot is ready to move to the next stage".
    Advance,
    /// Plain background (white).
    Neutral,
    /// Highlight applied to a slot that was just written by a move.
    Fresh,
    /// Default font color (black).
    Ink,
    /// Any color the palette does not know about.
    Other(String),
}

/// A cell as the engines see it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub value: String,
    pub font: ColorTag,
    pub background: ColorTag,
}

impl Cell {
    pub fn is_blank(&self) -> bool {
        self.value.trim().is_empty()
    }
}

/// A partial cell update. Backends apply the parts in a fixed order:
/// value, then font color, then background, then font size.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellWrite {
    pub value: Option<String>,
    pub font: Option<ColorTag>,
    pub background: Option<ColorTag>,
    pub font_size: Option<u32>,
}

impl CellWrite {
    pub fn value(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            ..Default::default()
        }
    }

    pub fn with_font(mut self, font: ColorTag) -> Self {
        self.font = Some(font);
        self
    }

    pub fn with_background(mut self, background: ColorTag) -> Self {
        self.background = Some(background);
        self
    }

    pub fn with_font_size(mut self, size: u32) -> Self {
        self.font_size = Some(size);
        self
    }

    pub fn background(background: ColorTag) -> Self {
        Self::default().with_background(background)
    }
}

#[derive(Debug, Error)]
pub enum GridError {
    #[error("row {row}, column {col} is outside the grid")]
    OutOfBounds { row: usize, col: usize },

    #[error("sheet not found: {0}")]
    SheetNotFound(String),
}

/// Read/write access to one sheet of the board. Rows and columns are 1-indexed.
pub trait Grid {
    fn read_cell(&self, row: usize, col: usize) -> Cell;

    fn write_cell(&mut self, row: usize, col: usize, write: CellWrite) -> Result<(), GridError>;

    /// Hyperlink attached to a cell, if any.
    fn link(&self, row: usize, col: usize) -> Option<String>;

    fn set_link(&mut self, row: usize, col: usize, url: &str) -> Result<(), GridError>;

    fn hide_rows(&mut self, rows: RangeInclusive<usize>) -> Result<(), GridError>;

    fn show_rows(&mut self, rows: RangeInclusive<usize>) -> Result<(), GridError>;

    /// Last row holding any content; 0 for an empty grid.
    fn last_row(&self) -> usize;

    fn set_named_anchor(&mut self, name: &str, row: usize, col: usize) -> Result<(), GridError>;
}
