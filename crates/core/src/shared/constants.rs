use crate::shared::frame::Resolution;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
pub const RECOGNIZE_PATH: &str = "/api/recognize";
pub const ENROLL_PATH: &str = "/api/enroll";
pub const USERS_PATH: &str = "/api/users";
pub const ATTENDANCE_LOGS_PATH: &str = "/api/attendance/logs";

/// Interval between inference sampling ticks.
pub const DEFAULT_CADENCE_MS: u64 = 500;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

pub const LIVE_RESOLUTION: Resolution = Resolution::new(1280, 720);
pub const ENROLLMENT_RESOLUTION: Resolution = Resolution::new(640, 480);

/// JPEG quality (1-100) for frames sent to the recognizer.
pub const LIVE_JPEG_QUALITY: u8 = 60;
/// JPEG quality (1-100) for enrollment shots.
pub const ENROLLMENT_JPEG_QUALITY: u8 = 80;

/// Exact number of shots an enrollment commit carries.
pub const ENROLLMENT_SHOT_COUNT: usize = 5;

pub const UNKNOWN_SUBJECT: &str = "Unknown";
pub const SPOOF_SUBJECT: &str = "FAKE FACE";
/// Badge text while the recognizer has not named anyone yet.
pub const SCANNING_LABEL: &str = "SCANNING...";

pub const USERS_PER_PAGE: usize = 8;
pub const LOGS_PER_PAGE: usize = 10;
/// Attendance status the backend writes for a confirmed match.
pub const ATTENDANCE_SUCCESS: &str = "Success";
