//! Eligibility selector.

use std::path::Path;

use chrono::{DateTime, Utc};

use crate::discovery::FileStat;

/// Whether a stat'ed candidate is old enough to rotate.
///
/// Eligible iff it is a regular file modified at or before `cutoff`
/// (seconds resolution, inclusive). A missing stat is never eligible.
pub fn is_eligible(stat: Option<&FileStat>, cutoff: DateTime<Utc>) -> bool {
    stat.is_some_and(|stat| stat.is_file && cutoff.timestamp() >= stat.modified.timestamp())
}

/// Eligibility check bound to the cutoff of one run.
#[derive(Debug, Clone, Copy)]
pub struct EligibilitySelector {
    cutoff: DateTime<Utc>,
}

impl EligibilitySelector {
    pub fn new(cutoff: DateTime<Utc>) -> Self {
        Self { cutoff }
    }

    pub fn cutoff(&self) -> DateTime<Utc> {
        self.cutoff
    }

    /// Stat `path` and test it. Paths that cannot be stat'ed are ineligible.
    pub fn accepts(&self, path: &Path) -> bool {
        is_eligible(FileStat::probe(path).as_ref(), self.cutoff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};
    use std::fs::{self, File};
    use tempfile::TempDir;

    fn stat(is_file: bool, modified: DateTime<Utc>) -> FileStat {
        FileStat { is_file, modified }
    }

    #[test]
    fn test_boundary_is_inclusive() {
        let cutoff = Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap();
        assert!(is_eligible(Some(&stat(true, cutoff)), cutoff));
        assert!(is_eligible(Some(&stat(true, cutoff - TimeDelta::seconds(1))), cutoff));
        assert!(!is_eligible(Some(&stat(true, cutoff + TimeDelta::seconds(1))), cutoff));
    }

    #[test]
    fn test_sub_second_difference_is_ignored() {
        let cutoff = Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap();
        let modified = cutoff + TimeDelta::milliseconds(500);
        assert!(is_eligible(Some(&stat(true, modified)), cutoff));
    }

    #[test]
    fn test_directories_and_missing_files_are_ineligible() {
        let cutoff = Utc::now();
        let old = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
        assert!(!is_eligible(Some(&stat(false, old)), cutoff));
        assert!(!is_eligible(None, cutoff));
    }

    #[test]
    fn test_selector_probes_paths() {
        let temp = TempDir::new().unwrap();
        let old = temp.path().join("old.log");
        fs::write(&old, "old").unwrap();
        let mtime = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        File::options()
            .write(true)
            .open(&old)
            .unwrap()
            .set_modified(mtime.into())
            .unwrap();

        let selector = EligibilitySelector::new(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap());
        assert!(selector.accepts(&old));
        assert!(!selector.accepts(&temp.path().join("missing.log")));
        assert!(!selector.accepts(temp.path()));
    }
}
