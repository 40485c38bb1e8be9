use std::collections::HashMap;

use tracing::{debug, warn};

use crate::config::ColumnLayout;
use crate::grid::{CellWrite, Grid, GridError};
use crate::index::JobIndex;

/// Job ids in the system of record have exactly this many digits.
const JOB_ID_DIGITS: usize = 5;

/// Maps the job numbers shown on the board (shop numbers) to the system of
/// record's job pages.
#[derive(Debug, Clone, Default)]
pub struct LinkIndex {
    base_url: String,
    jobs: HashMap<String, String>,
}

impl LinkIndex {
    /// Build from the job index. Entries without a shop number, or whose job
    /// number does not reduce to a five-digit id, are left out.
    pub fn new(base_url: &str, index: &JobIndex) -> Self {
        let jobs = index
            .iter()
            .filter_map(|entry| {
                let shop = entry.shop_number.trim();
                let id: String = entry.job_number.chars().filter(char::is_ascii_digit).collect();
                if shop.is_empty() || id.len() != JOB_ID_DIGITS {
                    None
                } else {
                    Some((shop.to_string(), id))
                }
            })
            .collect();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            jobs,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.base_url.is_empty() || self.jobs.is_empty()
    }

    pub fn url_for(&self, shop_number: &str) -> Option<String> {
        self.jobs
            .get(shop_number.trim())
            .map(|id| format!("{}/sys/job/{id}", self.base_url))
    }
}

/// Link every stage's job-number cell that matches a known job and has no link
/// yet. The linked cell takes the font color of its description cell.
/// Returns the number of links added.
pub fn annotate_links<G: Grid>(
    grid: &mut G,
    links: &LinkIndex,
    layout: &ColumnLayout,
) -> Result<usize, GridError> {
    if links.is_empty() {
        return Ok(0);
    }
    let mut added = 0;
    for slot in [layout.saw, layout.cnc, layout.polish] {
        for row in 1..=grid.last_row() {
            let cell = grid.read_cell(row, slot.number);
            if cell.is_blank() || grid.link(row, slot.number).is_some() {
                continue;
            }
            let Some(url) = links.url_for(&cell.value) else {
                continue;
            };
            let font = grid.read_cell(row, slot.description).font;
            if let Err(e) = grid.set_link(row, slot.number, &url) {
                warn!(row, col = slot.number, error = %e, "failed to set hyperlink");
                continue;
            }
            grid.write_cell(row, slot.number, CellWrite::default().with_font(font))?;
            added += 1;
        }
    }
    debug!(added, "hyperlink annotation pass");
    Ok(added)
}
