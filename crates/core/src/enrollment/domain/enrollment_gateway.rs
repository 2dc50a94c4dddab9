use crate::enrollment::domain::enrollment_error::EnrollmentError;
use crate::enrollment::domain::enrollment_session::EnrollRequest;

/// Backend acknowledgement of a stored identity.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EnrollmentReceipt {
    pub message: Option<String>,
}

/// Persists a completed enrollment. One call per commit.
pub trait EnrollmentGateway: Send + Sync {
    fn submit(&self, request: &EnrollRequest<'_>) -> Result<EnrollmentReceipt, EnrollmentError>;
}
