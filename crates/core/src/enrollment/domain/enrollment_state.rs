use std::fmt;

/// Enrollment capture flow.
///
/// `Closed → CameraRequested → Capturing(0..5) → ReadyToCommit → Committing`,
/// then `Closed` on success or back to `ReadyToCommit` on failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnrollmentState {
    Closed,
    CameraRequested,
    Capturing(usize),
    ReadyToCommit,
    Committing,
}

impl EnrollmentState {
    pub fn is_open(&self) -> bool {
        !matches!(self, EnrollmentState::Closed)
    }
}

impl fmt::Display for EnrollmentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnrollmentState::Closed => write!(f, "closed"),
            EnrollmentState::CameraRequested => write!(f, "camera requested"),
            EnrollmentState::Capturing(n) => write!(f, "capturing ({n} shots)"),
            EnrollmentState::ReadyToCommit => write!(f, "ready to commit"),
            EnrollmentState::Committing => write!(f, "committing"),
        }
    }
}
