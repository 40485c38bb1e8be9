use std::collections::{BTreeMap, BTreeSet};
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use super::{Cell, CellWrite, ColorTag, Grid, GridError, Palette};

/// Literal cell contents as a spreadsheet stores them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCell {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// Sparse in-memory sheet. Also the on-disk shape of a sheet inside a [`Workbook`](super::Workbook).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryGrid {
    #[serde(skip)]
    palette: Palette,
    #[serde(default)]
    cells: BTreeMap<usize, BTreeMap<usize, RawCell>>,
    #[serde(default)]
    hidden: BTreeSet<usize>,
    #[serde(default)]
    anchors: BTreeMap<String, (usize, usize)>,
}

impl MemoryGrid {
    pub fn new(palette: Palette) -> Self {
        Self {
            palette,
            ..Default::default()
        }
    }

    pub fn set_palette(&mut self, palette: Palette) {
        self.palette = palette;
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Stored literal contents of a cell.
    pub fn raw(&self, row: usize, col: usize) -> Option<&RawCell> {
        self.cells.get(&row).and_then(|cols| cols.get(&col))
    }

    /// Set a value without touching formatting.
    pub fn put(&mut self, row: usize, col: usize, value: &str) {
        self.raw_mut(row, col).value = value.to_string();
    }

    /// Set a literal font color.
    pub fn put_font(&mut self, row: usize, col: usize, color: &str) {
        self.raw_mut(row, col).font = Some(color.to_string());
    }

    /// Set a literal background color.
    pub fn put_background(&mut self, row: usize, col: usize, color: &str) {
        self.raw_mut(row, col).background = Some(color.to_string());
    }

    pub fn is_hidden(&self, row: usize) -> bool {
        self.hidden.contains(&row)
    }

    pub fn anchor(&self, name: &str) -> Option<(usize, usize)> {
        self.anchors.get(name).copied()
    }

    fn raw_mut(&mut self, row: usize, col: usize) -> &mut RawCell {
        self.cells.entry(row).or_default().entry(col).or_default()
    }

    fn check(row: usize, col: usize) -> Result<(), GridError> {
        if row == 0 || col == 0 {
            return Err(GridError::OutOfBounds { row, col });
        }
        Ok(())
    }
}

impl Grid for MemoryGrid {
    fn read_cell(&self, row: usize, col: usize) -> Cell {
        let raw = self.raw(row, col);
        Cell {
            value: raw.map(|c| c.value.clone()).unwrap_or_default(),
            font: self
                .palette
                .tag(raw.and_then(|c| c.font.as_deref()), ColorTag::Ink),
            background: self
                .palette
                .tag(raw.and_then(|c| c.background.as_deref()), ColorTag::Neutral),
        }
    }

    fn write_cell(&mut self, row: usize, col: usize, write: CellWrite) -> Result<(), GridError> {
        Self::check(row, col)?;
        let font = write.font.map(|tag| self.palette.literal(&tag));
        let background = write.background.map(|tag| self.palette.literal(&tag));
        let cell = self.raw_mut(row, col);
        if let Some(value) = write.value {
            cell.value = value;
        }
        if font.is_some() {
            cell.font = font;
        }
        if background.is_some() {
            cell.background = background;
        }
        if write.font_size.is_some() {
            cell.font_size = write.font_size;
        }
        Ok(())
    }

    fn link(&self, row: usize, col: usize) -> Option<String> {
        self.raw(row, col).and_then(|c| c.link.clone())
    }

    fn set_link(&mut self, row: usize, col: usize, url: &str) -> Result<(), GridError> {
        Self::check(row, col)?;
        self.raw_mut(row, col).link = Some(url.to_string());
        Ok(())
    }

    fn hide_rows(&mut self, rows: RangeInclusive<usize>) -> Result<(), GridError> {
        self.hidden.extend(rows);
        Ok(())
    }

    fn show_rows(&mut self, rows: RangeInclusive<usize>) -> Result<(), GridError> {
        for row in rows {
            self.hidden.remove(&row);
        }
        Ok(())
    }

    fn last_row(&self) -> usize {
        self.cells
            .iter()
            .rev()
            .find(|(_, cols)| cols.values().any(|c| *c != RawCell::default()))
            .map(|(row, _)| *row)
            .unwrap_or(0)
    }

    fn set_named_anchor(&mut self, name: &str, row: usize, col: usize) -> Result<(), GridError> {
        Self::check(row, col)?;
        self.anchors.insert(name.to_string(), (row, col));
        Ok(())
    }
}
