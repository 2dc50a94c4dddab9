use serde::{Deserialize, Serialize};

use crate::directory::domain::listing::Searchable;
use crate::shared::constants::ATTENDANCE_SUCCESS;

/// One row of `GET /api/attendance/logs`, newest first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttendanceEntry {
    pub user: String,
    #[serde(default)]
    pub dept: String,
    /// Check-in time of day, `HH:MM:SS`.
    pub time: String,
    #[serde(default)]
    pub conf: Option<f64>,
    pub status: String,
    pub id: String,
}

impl AttendanceEntry {
    pub fn is_match(&self) -> bool {
        self.status == ATTENDANCE_SUCCESS
    }
}

impl Searchable for AttendanceEntry {
    fn search_keys(&self) -> [&str; 2] {
        [self.user.as_str(), self.id.as_str()]
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AttendanceSummary {
    pub total: usize,
    pub matched: usize,
    pub alerts: usize,
}

impl AttendanceSummary {
    pub fn of(entries: &[AttendanceEntry]) -> Self {
        let matched = entries.iter().filter(|e| e.is_match()).count();
        Self {
            total: entries.len(),
            matched,
            alerts: entries.len() - matched,
        }
    }
}
