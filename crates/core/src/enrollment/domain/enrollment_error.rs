use thiserror::Error;

use crate::camera::domain::device_error::DeviceError;
use crate::enrollment::domain::enrollment_state::EnrollmentState;
use crate::sampling::frame_sampler::SampleError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnrollmentErrorKind {
    IncompleteProfile,
    SubmissionRejected,
    Unreachable,
    Device,
    Sample,
    InvalidState,
}

#[derive(Error, Debug)]
pub enum EnrollmentError {
    #[error("enrollment incomplete: {shots}/5 shots, missing fields: {}", fmt_missing(.missing))]
    IncompleteProfile {
        shots: usize,
        missing: Vec<&'static str>,
    },
    /// The backend's own explanation, unchanged.
    #[error("{detail}")]
    SubmissionRejected { status: u16, detail: String },
    #[error("enrollment service unreachable at {url}: {source}")]
    Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error(transparent)]
    Device(#[from] DeviceError),
    #[error("could not capture shot: {0}")]
    Sample(#[from] SampleError),
    #[error("cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: EnrollmentState,
    },
}

fn fmt_missing(missing: &[&'static str]) -> String {
    if missing.is_empty() {
        "none".to_string()
    } else {
        missing.join(", ")
    }
}

impl EnrollmentError {
    pub fn kind(&self) -> EnrollmentErrorKind {
        match self {
            EnrollmentError::IncompleteProfile { .. } => EnrollmentErrorKind::IncompleteProfile,
            EnrollmentError::SubmissionRejected { .. } => EnrollmentErrorKind::SubmissionRejected,
            EnrollmentError::Unreachable { .. } => EnrollmentErrorKind::Unreachable,
            EnrollmentError::Device(_) => EnrollmentErrorKind::Device,
            EnrollmentError::Sample(_) => EnrollmentErrorKind::Sample,
            EnrollmentError::InvalidState { .. } => EnrollmentErrorKind::InvalidState,
        }
    }
}
