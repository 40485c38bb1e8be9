//! Job scanning: the system-of-record client, the bounded scanner and the
//! index synchronizer that merges scan results into the persisted index.

mod http;
mod scanner;
mod source;
mod sync;

pub use http::HttpJobSource;
pub use scanner::{
    CancelFlag, JobScanner, ScanReport, entry_from, scan_ids, scan_window, shop_number,
};
pub use source::{Activity, Form, JobRecord, JobSource};
pub use sync::{CycleReport, IndexSynchronizer};
