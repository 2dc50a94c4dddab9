pub mod attendance_entry;
pub mod directory;
pub mod directory_error;
pub mod identity;
pub mod listing;
