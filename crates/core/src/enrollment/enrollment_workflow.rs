use std::sync::Arc;

use crate::camera::device_session::DeviceSession;
use crate::camera::domain::camera_device::CameraDevice;
use crate::camera::domain::device_error::DeviceError;
use crate::enrollment::domain::enrollment_error::EnrollmentError;
use crate::enrollment::domain::enrollment_gateway::EnrollmentGateway;
use crate::enrollment::domain::enrollment_session::EnrollmentSession;
use crate::enrollment::domain::enrollment_state::EnrollmentState;
use crate::sampling::frame_sampler::{CaptureSize, FrameSampler};
use crate::shared::constants::{ENROLLMENT_RESOLUTION, ENROLLMENT_SHOT_COUNT};
use crate::shared::frame::Resolution;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureOutcome {
    Captured { count: usize },
    /// All shots are already taken; nothing was sampled.
    Ignored,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Stored. The camera is released and the identity list is stale.
    Enrolled {
        external_id: String,
        message: Option<String>,
    },
}

/// Multi-shot enrollment over a dedicated device session.
///
/// Every exit path (commit, cancel, drop) releases the camera.
pub struct EnrollmentWorkflow {
    device: DeviceSession,
    gateway: Arc<dyn EnrollmentGateway>,
    sampler: FrameSampler,
    shot_size: Resolution,
    state: EnrollmentState,
    session: Option<EnrollmentSession>,
}

impl EnrollmentWorkflow {
    pub fn new(camera: Arc<dyn CameraDevice>, gateway: Arc<dyn EnrollmentGateway>) -> Self {
        Self::with_capture(
            camera,
            gateway,
            FrameSampler::enrollment(),
            ENROLLMENT_RESOLUTION,
        )
    }

    pub fn with_capture(
        camera: Arc<dyn CameraDevice>,
        gateway: Arc<dyn EnrollmentGateway>,
        sampler: FrameSampler,
        shot_size: Resolution,
    ) -> Self {
        Self {
            device: DeviceSession::new(camera, shot_size),
            gateway,
            sampler,
            shot_size,
            state: EnrollmentState::Closed,
            session: None,
        }
    }

    pub fn state(&self) -> EnrollmentState {
        self.state
    }

    pub fn session(&self) -> Option<&EnrollmentSession> {
        self.session.as_ref()
    }

    pub fn shot_count(&self) -> usize {
        self.session.as_ref().map_or(0, EnrollmentSession::shot_count)
    }

    pub fn is_camera_active(&self) -> bool {
        self.device.is_active()
    }

    pub fn device_error(&self) -> Option<&DeviceError> {
        self.device.last_error()
    }

    /// Starts a fresh session and requests the camera. A session already in
    /// progress is discarded first.
    pub fn open(&mut self) -> Result<(), EnrollmentError> {
        if self.state.is_open() {
            self.cancel();
        }
        self.state = EnrollmentState::CameraRequested;
        self.session = Some(EnrollmentSession::new());

        match self.device.start() {
            Ok(_) => {
                self.state = EnrollmentState::Capturing(0);
                log::info!("Enrollment opened on {}", self.device.device_name());
                Ok(())
            }
            Err(e) => {
                log::warn!("Enrollment camera request failed: {e}");
                self.session = None;
                self.state = EnrollmentState::Closed;
                Err(e.into())
            }
        }
    }

    pub fn set_display_name(&mut self, value: impl Into<String>) -> Result<(), EnrollmentError> {
        self.editable_session("edit profile")?.set_display_name(value);
        Ok(())
    }

    pub fn set_external_id(&mut self, value: impl Into<String>) -> Result<(), EnrollmentError> {
        self.editable_session("edit profile")?.set_external_id(value);
        Ok(())
    }

    pub fn set_department(&mut self, value: impl Into<String>) -> Result<(), EnrollmentError> {
        self.editable_session("edit profile")?.set_department(value);
        Ok(())
    }

    /// Samples one shot. After the last shot further calls are ignored.
    pub fn capture_frame(&mut self) -> Result<CaptureOutcome, EnrollmentError> {
        match self.state {
            EnrollmentState::Capturing(_) => {}
            EnrollmentState::ReadyToCommit => {
                log::debug!("Ignoring capture: all {ENROLLMENT_SHOT_COUNT} shots taken");
                return Ok(CaptureOutcome::Ignored);
            }
            state => return Err(invalid("capture", state)),
        }

        let source = self
            .device
            .frame_source()
            .ok_or_else(|| invalid("capture", self.state))?;
        let image = self
            .sampler
            .capture(&*source, CaptureSize::Fixed(self.shot_size))?;

        let session = self
            .session
            .as_mut()
            .ok_or_else(|| invalid("capture", self.state))?;
        session.push_image(image);
        let count = session.shot_count();
        self.state = if count >= ENROLLMENT_SHOT_COUNT {
            EnrollmentState::ReadyToCommit
        } else {
            EnrollmentState::Capturing(count)
        };
        log::debug!("Enrollment shot {count}/{ENROLLMENT_SHOT_COUNT}");
        Ok(CaptureOutcome::Captured { count })
    }

    /// Drops every shot but keeps the camera and profile.
    pub fn reset(&mut self) -> Result<(), EnrollmentError> {
        match self.state {
            EnrollmentState::Capturing(_) | EnrollmentState::ReadyToCommit => {}
            state => return Err(invalid("reset", state)),
        }
        if let Some(session) = self.session.as_mut() {
            session.clear_images();
        }
        self.state = EnrollmentState::Capturing(0);
        Ok(())
    }

    /// Submits the profile and all five shots in one request.
    ///
    /// Validation happens before any network call. On rejection the session
    /// stays ready to commit with its shots intact.
    pub fn commit(&mut self) -> Result<CommitOutcome, EnrollmentError> {
        let session = match (self.state, self.session.as_ref()) {
            (EnrollmentState::Capturing(_) | EnrollmentState::ReadyToCommit, Some(session)) => {
                session
            }
            (state, _) => return Err(invalid("commit", state)),
        };
        if !session.is_complete() {
            return Err(EnrollmentError::IncompleteProfile {
                shots: session.shot_count(),
                missing: session.missing_fields(),
            });
        }

        self.state = EnrollmentState::Committing;
        let submitted = self.gateway.submit(&session.to_request());
        let external_id = session.external_id().trim().to_string();

        match submitted {
            Ok(receipt) => {
                self.device.stop();
                self.session = None;
                self.state = EnrollmentState::Closed;
                Ok(CommitOutcome::Enrolled {
                    external_id,
                    message: receipt.message,
                })
            }
            Err(e) => {
                self.state = EnrollmentState::ReadyToCommit;
                Err(e)
            }
        }
    }

    /// Releases the camera and discards the session. Valid from any state.
    pub fn cancel(&mut self) {
        self.device.stop();
        if self.session.take().is_some() {
            log::info!("Enrollment cancelled");
        }
        self.state = EnrollmentState::Closed;
    }

    fn editable_session(
        &mut self,
        operation: &'static str,
    ) -> Result<&mut EnrollmentSession, EnrollmentError> {
        let state = self.state;
        match state {
            EnrollmentState::Capturing(_) | EnrollmentState::ReadyToCommit => self
                .session
                .as_mut()
                .ok_or_else(|| invalid(operation, state)),
            _ => Err(invalid(operation, state)),
        }
    }
}

impl Drop for EnrollmentWorkflow {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn invalid(operation: &'static str, state: EnrollmentState) -> EnrollmentError {
    EnrollmentError::InvalidState { operation, state }
}
