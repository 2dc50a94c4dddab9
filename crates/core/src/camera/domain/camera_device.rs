use std::sync::Arc;

use crate::camera::domain::device_error::DeviceError;
use crate::shared::frame::{Frame, Resolution};

/// Platform capture capability: hands out live frame sources.
///
/// Implementations must refuse a second acquisition while a stream they
/// handed out is still live, so one physical camera never feeds two
/// consumers.
pub trait CameraDevice: Send + Sync {
    /// Human-readable identifier used in logs and errors.
    fn name(&self) -> &str;

    /// Acquires the device at (or near) the requested resolution.
    fn acquire(&self, resolution: Resolution) -> Result<Arc<dyn FrameSource>, DeviceError>;
}

/// A live feed from an acquired device.
///
/// Shared between the owning session and samplers, hence `&self` methods.
pub trait FrameSource: Send + Sync {
    /// Latest decoded frame, or `None` before the first frame arrives or
    /// after the stream paused, ended or stopped.
    fn current_frame(&self) -> Option<Frame>;

    /// True while the stream is delivering frames.
    fn is_live(&self) -> bool;

    /// Stops every underlying hardware track. Idempotent; returns only once
    /// the device has been released.
    fn stop(&self);
}
