use crate::directory::domain::attendance_entry::AttendanceEntry;
use crate::directory::domain::directory_error::DirectoryError;
use crate::directory::domain::identity::Identity;

/// Read side of the backend: enrolled identities and recent check-ins.
pub trait Directory: Send + Sync {
    fn identities(&self) -> Result<Vec<Identity>, DirectoryError>;

    fn attendance_logs(&self) -> Result<Vec<AttendanceEntry>, DirectoryError>;
}
