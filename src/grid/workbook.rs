use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{GridError, MemoryGrid, Palette};
use crate::error::AutofabError;

/// A set of named sheets persisted together as one JSON document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Workbook {
    #[serde(default)]
    sheets: BTreeMap<String, MemoryGrid>,
}

impl Workbook {
    /// Load a workbook, or an empty one if the file does not exist yet.
    pub fn load(path: &Path, palette: &Palette) -> Result<Self, AutofabError> {
        let mut book = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            serde_json::from_str::<Workbook>(&contents)?
        } else {
            Self::default()
        };
        for sheet in book.sheets.values_mut() {
            sheet.set_palette(palette.clone());
        }
        Ok(book)
    }

    pub fn save(&self, path: &Path) -> Result<(), AutofabError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn sheet(&self, name: &str) -> Result<&MemoryGrid, GridError> {
        self.sheets
            .get(name)
            .ok_or_else(|| GridError::SheetNotFound(name.to_string()))
    }

    pub fn sheet_mut(&mut self, name: &str) -> Result<&mut MemoryGrid, GridError> {
        self.sheets
            .get_mut(name)
            .ok_or_else(|| GridError::SheetNotFound(name.to_string()))
    }

    /// Sheet by name, created empty (with `palette`) when missing.
    pub fn sheet_or_insert(&mut self, name: &str, palette: &Palette) -> &mut MemoryGrid {
        self.sheets
            .entry(name.to_string())
            .or_insert_with(|| MemoryGrid::new(palette.clone()))
    }

    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.keys().map(String::as_str)
    }
}
