pub mod camera_device;
pub mod device_error;
