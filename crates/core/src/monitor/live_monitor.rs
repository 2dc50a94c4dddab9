use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::Receiver;
use thiserror::Error;

use crate::camera::device_session::DeviceSession;
use crate::camera::domain::camera_device::CameraDevice;
use crate::camera::domain::device_error::DeviceError;
use crate::recognition::domain::recognition_result::RecognitionResult;
use crate::recognition::domain::recognizer::Recognizer;
use crate::recognition::inference_scheduler::{InferenceScheduler, SchedulerError};
use crate::recognition::overlay::{Overlay, RecognitionOverlayMapper};
use crate::recognition::scheduler_core::{SchedulerPhase, SchedulerStats};
use crate::sampling::frame_sampler::FrameSampler;
use crate::shared::constants::{DEFAULT_CADENCE_MS, LIVE_RESOLUTION};
use crate::shared::frame::Resolution;

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error(transparent)]
    Device(#[from] DeviceError),
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

#[derive(Clone, Debug)]
pub struct MonitorConfig {
    pub resolution: Resolution,
    pub cadence: Duration,
    pub sampler: FrameSampler,
    pub mapper: RecognitionOverlayMapper,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            resolution: LIVE_RESOLUTION,
            cadence: Duration::from_millis(DEFAULT_CADENCE_MS),
            sampler: FrameSampler::live(),
            mapper: RecognitionOverlayMapper::default(),
        }
    }
}

/// Live camera view: device session, recognition loop and overlay.
///
/// Stopping (explicitly or by drop) halts the loop first, then releases the
/// camera without waiting on any outstanding request.
pub struct LiveMonitor {
    device: DeviceSession,
    scheduler: InferenceScheduler,
    mapper: RecognitionOverlayMapper,
}

impl LiveMonitor {
    pub fn new(
        camera: Arc<dyn CameraDevice>,
        recognizer: Arc<dyn Recognizer>,
        config: MonitorConfig,
    ) -> Self {
        Self {
            device: DeviceSession::new(camera, config.resolution),
            scheduler: InferenceScheduler::new(recognizer, config.sampler, config.cadence),
            mapper: config.mapper,
        }
    }

    pub fn start(&mut self) -> Result<(), MonitorError> {
        self.scheduler.stop();
        let source = self.device.start()?;
        if let Err(e) = self.scheduler.start(source) {
            self.device.stop();
            return Err(e.into());
        }
        Ok(())
    }

    pub fn stop(&mut self) {
        self.scheduler.stop();
        self.device.stop();
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.phase() == SchedulerPhase::Running
    }

    pub fn is_camera_active(&self) -> bool {
        self.device.is_active()
    }

    /// False once the camera stream has ended on its own (end of file, lost
    /// device) or the monitor was stopped.
    pub fn is_stream_live(&self) -> bool {
        self.device
            .frame_source()
            .is_some_and(|source| source.is_live())
    }

    /// Latest device failure, kept for display until the next successful
    /// start.
    pub fn last_error(&self) -> Option<&DeviceError> {
        self.device.last_error()
    }

    pub fn latest(&self) -> Option<RecognitionResult> {
        self.scheduler.latest()
    }

    pub fn overlay(&self) -> Option<Overlay> {
        self.mapper.map(self.scheduler.latest().as_ref())
    }

    pub fn map(&self, result: &RecognitionResult) -> Option<Overlay> {
        self.mapper.map(Some(result))
    }

    pub fn updates(&self) -> Receiver<RecognitionResult> {
        self.scheduler.updates()
    }

    pub fn stats(&self) -> SchedulerStats {
        self.scheduler.stats()
    }
}

impl Drop for LiveMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::domain::device_error::DeviceErrorKind;
    use crate::recognition::domain::inference_error::InferenceError;
    use crate::recognition::domain::recognition_result::BoundingBox;
    use crate::shared::encoded_image::EncodedImage;
    use crate::testing::{FakeCamera, FakeOutcome};
    use approx::assert_relative_eq;

    struct FixedRecognizer;

    impl Recognizer for FixedRecognizer {
        fn recognize(&self, _image: &EncodedImage) -> Result<RecognitionResult, InferenceError> {
            Ok(RecognitionResult {
                subject_label: "Alice".into(),
                confidence: 0.9,
                bounding_box: Some(BoundingBox {
                    x: 10.0,
                    y: 20.0,
                    w: 30.0,
                    h: 15.0,
                }),
                attendance_status: None,
            })
        }
    }

    fn config() -> MonitorConfig {
        MonitorConfig {
            cadence: Duration::from_millis(10),
            ..MonitorConfig::default()
        }
    }

    fn monitor(camera: &Arc<FakeCamera>) -> LiveMonitor {
        LiveMonitor::new(camera.clone(), Arc::new(FixedRecognizer), config())
    }

    #[test]
    fn test_start_acquires_live_resolution_and_publishes_overlay() {
        let camera = FakeCamera::ready();
        let mut monitor = monitor(&camera);
        monitor.start().unwrap();
        assert_eq!(camera.requested_resolutions(), vec![LIVE_RESOLUTION]);

        monitor.updates().recv_timeout(Duration::from_secs(5)).unwrap();
        let overlay = monitor.overlay().unwrap();
        assert_relative_eq!(overlay.rect.left, 60.0);
        assert_eq!(overlay.badge.label, "ALICE");
    }

    #[test]
    fn test_stop_releases_camera_and_clears_overlay() {
        let camera = FakeCamera::ready();
        let mut monitor = monitor(&camera);
        monitor.start().unwrap();
        monitor.updates().recv_timeout(Duration::from_secs(5)).unwrap();

        monitor.stop();
        monitor.stop();
        assert!(!monitor.is_running());
        assert!(!monitor.is_camera_active());
        assert!(monitor.overlay().is_none());
        assert_eq!(camera.live_streams(), 0);
    }

    #[test]
    fn test_permission_denied_leaves_scheduler_idle() {
        let camera = FakeCamera::failing(FakeOutcome::PermissionDenied);
        let mut monitor = monitor(&camera);

        let err = monitor.start().unwrap_err();
        assert!(matches!(err, MonitorError::Device(_)));
        assert!(!monitor.is_running());
        assert!(!monitor.is_camera_active());
        assert_eq!(
            monitor.last_error().map(DeviceError::kind),
            Some(DeviceErrorKind::PermissionDenied)
        );
    }

    #[test]
    fn test_stream_liveness_follows_source() {
        let camera = FakeCamera::ready();
        let mut monitor = monitor(&camera);
        assert!(!monitor.is_stream_live());

        monitor.start().unwrap();
        assert!(monitor.is_stream_live());

        camera.last_source().unwrap().set_paused(true);
        assert!(!monitor.is_stream_live());
        assert!(monitor.is_camera_active());

        monitor.stop();
        assert!(!monitor.is_stream_live());
    }

    #[test]
    fn test_restart_holds_one_stream() {
        let camera = FakeCamera::ready();
        let mut monitor = monitor(&camera);
        monitor.start().unwrap();
        monitor.start().unwrap();
        assert_eq!(camera.acquisitions(), 2);
        assert_eq!(camera.max_concurrent_streams(), 1);
        assert!(monitor.is_running());
    }

    #[test]
    fn test_drop_releases_camera() {
        let camera = FakeCamera::ready();
        {
            let mut monitor = monitor(&camera);
            monitor.start().unwrap();
        }
        assert_eq!(camera.live_streams(), 0);
    }
}
