use std::sync::Arc;

use crate::camera::domain::camera_device::{CameraDevice, FrameSource};
use crate::camera::domain::device_error::DeviceError;
use crate::shared::frame::Resolution;

/// Scoped ownership of one camera stream.
///
/// Holds a frame source exactly while active. Every exit path releases the
/// hardware: explicit [`stop`](Self::stop), a restart, or dropping the
/// session.
pub struct DeviceSession {
    device: Arc<dyn CameraDevice>,
    resolution: Resolution,
    stream: Option<Arc<dyn FrameSource>>,
    last_error: Option<DeviceError>,
}

impl DeviceSession {
    pub fn new(device: Arc<dyn CameraDevice>, resolution: Resolution) -> Self {
        Self {
            device,
            resolution,
            stream: None,
            last_error: None,
        }
    }

    /// Acquires the device, releasing any stream this session already holds.
    ///
    /// On failure the session stays inactive and the error is kept in
    /// [`last_error`](Self::last_error) for display.
    pub fn start(&mut self) -> Result<Arc<dyn FrameSource>, DeviceError> {
        self.stop();

        log::info!(
            "Acquiring camera {} at {}",
            self.device.name(),
            self.resolution
        );
        match self.device.acquire(self.resolution) {
            Ok(source) => {
                self.stream = Some(source.clone());
                self.last_error = None;
                Ok(source)
            }
            Err(e) => {
                log::warn!("Camera acquisition failed: {e}");
                self.last_error = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Releases the stream. A no-op when already inactive.
    pub fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            stream.stop();
            log::info!("Released camera {}", self.device.name());
        }
    }

    pub fn is_active(&self) -> bool {
        self.stream.is_some()
    }

    pub fn frame_source(&self) -> Option<Arc<dyn FrameSource>> {
        self.stream.clone()
    }

    pub fn last_error(&self) -> Option<&DeviceError> {
        self.last_error.as_ref()
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn device_name(&self) -> &str {
        self.device.name()
    }
}

impl Drop for DeviceSession {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::domain::device_error::DeviceErrorKind;
    use crate::testing::{FakeCamera, FakeOutcome};

    fn session(camera: &Arc<FakeCamera>) -> DeviceSession {
        DeviceSession::new(camera.clone(), Resolution::new(1280, 720))
    }

    #[test]
    fn test_start_activates_and_exposes_source() {
        let camera = FakeCamera::ready();
        let mut s = session(&camera);
        let source = s.start().unwrap();
        assert!(s.is_active());
        assert!(source.is_live());
        assert!(s.frame_source().is_some());
        assert_eq!(camera.live_streams(), 1);
        assert_eq!(camera.requested_resolutions(), vec![Resolution::new(1280, 720)]);
    }

    #[test]
    fn test_permission_denied_leaves_inactive() {
        let camera = FakeCamera::failing(FakeOutcome::PermissionDenied);
        let mut s = session(&camera);
        let err = s.start().err().unwrap();
        assert_eq!(err.kind(), DeviceErrorKind::PermissionDenied);
        assert!(!s.is_active());
        assert!(s.frame_source().is_none());
        assert_eq!(
            s.last_error().map(DeviceError::kind),
            Some(DeviceErrorKind::PermissionDenied)
        );
    }

    #[test]
    fn test_unavailable_leaves_inactive() {
        let camera = FakeCamera::failing(FakeOutcome::Unavailable);
        let mut s = session(&camera);
        assert_eq!(s.start().err().unwrap().kind(), DeviceErrorKind::Unavailable);
        assert!(!s.is_active());
    }

    #[test]
    fn test_stop_releases_hardware() {
        let camera = FakeCamera::ready();
        let mut s = session(&camera);
        let source = s.start().unwrap();
        s.stop();
        assert!(!s.is_active());
        assert!(!source.is_live());
        assert_eq!(camera.live_streams(), 0);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let camera = FakeCamera::ready();
        let mut s = session(&camera);
        s.stop();
        s.start().unwrap();
        s.stop();
        s.stop();
        assert!(!s.is_active());
        assert_eq!(camera.live_streams(), 0);
    }

    #[test]
    fn test_restart_releases_previous_stream_first() {
        let camera = FakeCamera::ready();
        let mut s = session(&camera);
        let first = s.start().unwrap();
        let second = s.start().unwrap();
        assert!(!first.is_live());
        assert!(second.is_live());
        assert_eq!(camera.acquisitions(), 2);
        assert_eq!(camera.max_concurrent_streams(), 1);
    }

    #[test]
    fn test_successful_start_clears_last_error() {
        let camera = FakeCamera::failing(FakeOutcome::Unavailable);
        let mut s = session(&camera);
        assert!(s.start().is_err());
        camera.set_outcome(FakeOutcome::Ready);
        s.start().unwrap();
        assert!(s.last_error().is_none());
    }

    #[test]
    fn test_drop_releases_hardware() {
        let camera = FakeCamera::ready();
        {
            let mut s = session(&camera);
            s.start().unwrap();
            assert_eq!(camera.live_streams(), 1);
        }
        assert_eq!(camera.live_streams(), 0);
    }
}
