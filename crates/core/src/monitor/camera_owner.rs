use std::sync::Arc;

use crate::camera::domain::camera_device::CameraDevice;
use crate::enrollment::domain::enrollment_error::EnrollmentError;
use crate::enrollment::domain::enrollment_gateway::EnrollmentGateway;
use crate::enrollment::enrollment_workflow::EnrollmentWorkflow;
use crate::monitor::live_monitor::{LiveMonitor, MonitorConfig, MonitorError};
use crate::recognition::domain::recognizer::Recognizer;
use crate::sampling::frame_sampler::FrameSampler;
use crate::shared::constants::ENROLLMENT_RESOLUTION;
use crate::shared::frame::Resolution;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewKind {
    Monitor,
    Enrollment,
}

enum ActiveView {
    Monitor(LiveMonitor),
    Enrollment(EnrollmentWorkflow),
}

/// Hands the one physical camera to either the live monitor or the
/// enrollment workflow, never both.
pub struct CameraOwner {
    camera: Arc<dyn CameraDevice>,
    recognizer: Arc<dyn Recognizer>,
    gateway: Arc<dyn EnrollmentGateway>,
    monitor_config: MonitorConfig,
    enrollment_sampler: FrameSampler,
    enrollment_resolution: Resolution,
    view: Option<ActiveView>,
}

impl CameraOwner {
    pub fn new(
        camera: Arc<dyn CameraDevice>,
        recognizer: Arc<dyn Recognizer>,
        gateway: Arc<dyn EnrollmentGateway>,
    ) -> Self {
        Self {
            camera,
            recognizer,
            gateway,
            monitor_config: MonitorConfig::default(),
            enrollment_sampler: FrameSampler::enrollment(),
            enrollment_resolution: ENROLLMENT_RESOLUTION,
            view: None,
        }
    }

    pub fn with_monitor_config(mut self, config: MonitorConfig) -> Self {
        self.monitor_config = config;
        self
    }

    pub fn with_enrollment_capture(mut self, sampler: FrameSampler, resolution: Resolution) -> Self {
        self.enrollment_sampler = sampler;
        self.enrollment_resolution = resolution;
        self
    }

    pub fn active_view(&self) -> Option<ViewKind> {
        match self.view {
            Some(ActiveView::Monitor(_)) => Some(ViewKind::Monitor),
            Some(ActiveView::Enrollment(_)) => Some(ViewKind::Enrollment),
            None => None,
        }
    }

    /// Closes whatever view holds the camera, then starts the live monitor.
    pub fn open_monitor(&mut self) -> Result<(), MonitorError> {
        self.close();
        let mut monitor = LiveMonitor::new(
            self.camera.clone(),
            self.recognizer.clone(),
            self.monitor_config.clone(),
        );
        monitor.start()?;
        self.view = Some(ActiveView::Monitor(monitor));
        Ok(())
    }

    /// Closes whatever view holds the camera, then opens enrollment.
    pub fn open_enrollment(&mut self) -> Result<(), EnrollmentError> {
        self.close();
        let mut workflow = EnrollmentWorkflow::with_capture(
            self.camera.clone(),
            self.gateway.clone(),
            self.enrollment_sampler.clone(),
            self.enrollment_resolution,
        );
        workflow.open()?;
        self.view = Some(ActiveView::Enrollment(workflow));
        Ok(())
    }

    pub fn monitor(&mut self) -> Option<&mut LiveMonitor> {
        match self.view.as_mut() {
            Some(ActiveView::Monitor(monitor)) => Some(monitor),
            _ => None,
        }
    }

    pub fn enrollment(&mut self) -> Option<&mut EnrollmentWorkflow> {
        match self.view.as_mut() {
            Some(ActiveView::Enrollment(workflow)) => Some(workflow),
            _ => None,
        }
    }

    /// Runs the active view's teardown and releases the camera.
    pub fn close(&mut self) {
        match self.view.take() {
            Some(ActiveView::Monitor(mut monitor)) => monitor.stop(),
            Some(ActiveView::Enrollment(mut workflow)) => workflow.cancel(),
            None => {}
        }
    }
}

impl Drop for CameraOwner {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrollment::domain::enrollment_gateway::EnrollmentReceipt;
    use crate::enrollment::domain::enrollment_session::EnrollRequest;
    use crate::enrollment::domain::enrollment_state::EnrollmentState;
    use crate::recognition::domain::inference_error::InferenceError;
    use crate::recognition::domain::recognition_result::RecognitionResult;
    use crate::shared::encoded_image::EncodedImage;
    use crate::testing::{FakeCamera, FakeOutcome};
    use std::time::Duration;

    struct StubRecognizer;

    impl Recognizer for StubRecognizer {
        fn recognize(&self, _image: &EncodedImage) -> Result<RecognitionResult, InferenceError> {
            Ok(RecognitionResult {
                subject_label: "Unknown".into(),
                confidence: 0.0,
                bounding_box: None,
                attendance_status: None,
            })
        }
    }

    struct StubGateway;

    impl EnrollmentGateway for StubGateway {
        fn submit(&self, _request: &EnrollRequest<'_>) -> Result<EnrollmentReceipt, EnrollmentError> {
            Ok(EnrollmentReceipt::default())
        }
    }

    fn owner(camera: &Arc<FakeCamera>) -> CameraOwner {
        CameraOwner::new(camera.clone(), Arc::new(StubRecognizer), Arc::new(StubGateway))
            .with_monitor_config(MonitorConfig {
                cadence: Duration::from_millis(10),
                ..MonitorConfig::default()
            })
    }

    #[test]
    fn test_switching_views_never_overlaps_streams() {
        let camera = FakeCamera::ready();
        let mut owner = owner(&camera);

        owner.open_monitor().unwrap();
        assert_eq!(owner.active_view(), Some(ViewKind::Monitor));
        owner.open_enrollment().unwrap();
        assert_eq!(owner.active_view(), Some(ViewKind::Enrollment));
        assert!(owner.monitor().is_none());
        owner.open_monitor().unwrap();

        assert_eq!(camera.acquisitions(), 3);
        assert_eq!(camera.max_concurrent_streams(), 1);
        assert_eq!(camera.live_streams(), 1);
    }

    #[test]
    fn test_enrollment_view_uses_enrollment_resolution() {
        let camera = FakeCamera::ready();
        let mut owner = owner(&camera);
        owner.open_enrollment().unwrap();

        let workflow = owner.enrollment().unwrap();
        assert_eq!(workflow.state(), EnrollmentState::Capturing(0));
        assert_eq!(camera.requested_resolutions(), vec![ENROLLMENT_RESOLUTION]);
    }

    #[test]
    fn test_close_releases_camera() {
        let camera = FakeCamera::ready();
        let mut owner = owner(&camera);
        owner.open_monitor().unwrap();
        owner.close();
        owner.close();
        assert_eq!(owner.active_view(), None);
        assert_eq!(camera.live_streams(), 0);
    }

    #[test]
    fn test_failed_open_leaves_no_view() {
        let camera = FakeCamera::ready();
        let mut owner = owner(&camera);
        owner.open_enrollment().unwrap();

        camera.set_outcome(FakeOutcome::Unavailable);
        assert!(owner.open_monitor().is_err());
        assert_eq!(owner.active_view(), None);
        assert_eq!(camera.live_streams(), 0);
    }

    #[test]
    fn test_drop_releases_camera() {
        let camera = FakeCamera::ready();
        {
            let mut owner = owner(&camera);
            owner.open_monitor().unwrap();
        }
        assert_eq!(camera.live_streams(), 0);
    }
}
