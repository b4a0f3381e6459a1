pub mod file_scanner;

pub use file_scanner::FileScanner;

use crate::types::{Result, WorkItem};

/// Supplies the candidate items for one run, in a stable order
pub trait CandidateSource {
    fn list_candidates(&self) -> Result<Vec<WorkItem>>;
}

impl CandidateSource for Vec<WorkItem> {
    fn list_candidates(&self) -> Result<Vec<WorkItem>> {
        Ok(self.clone())
    }
}
