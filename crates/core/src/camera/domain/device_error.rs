use thiserror::Error;

/// Coarse classification of device acquisition failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceErrorKind {
    PermissionDenied,
    Unavailable,
}

impl std::fmt::Display for DeviceErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceErrorKind::PermissionDenied => write!(f, "permission denied"),
            DeviceErrorKind::Unavailable => write!(f, "unavailable"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    #[error("camera access denied for {device}: {reason}")]
    PermissionDenied { device: String, reason: String },
    #[error("camera {device} unavailable: {reason}")]
    Unavailable { device: String, reason: String },
}

impl DeviceError {
    pub fn permission_denied(device: impl Into<String>, reason: impl Into<String>) -> Self {
        DeviceError::PermissionDenied {
            device: device.into(),
            reason: reason.into(),
        }
    }

    pub fn unavailable(device: impl Into<String>, reason: impl Into<String>) -> Self {
        DeviceError::Unavailable {
            device: device.into(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> DeviceErrorKind {
        match self {
            DeviceError::PermissionDenied { .. } => DeviceErrorKind::PermissionDenied,
            DeviceError::Unavailable { .. } => DeviceErrorKind::Unavailable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_variant() {
        assert_eq!(
            DeviceError::permission_denied("cam0", "EACCES").kind(),
            DeviceErrorKind::PermissionDenied
        );
        assert_eq!(
            DeviceError::unavailable("cam0", "busy").kind(),
            DeviceErrorKind::Unavailable
        );
    }

    #[test]
    fn test_display_names_device_and_reason() {
        let err = DeviceError::unavailable("/dev/video0", "no such device");
        assert_eq!(
            err.to_string(),
            "camera /dev/video0 unavailable: no such device"
        );
    }
}
