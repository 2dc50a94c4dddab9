pub mod camera_owner;
pub mod live_monitor;
