use crate::media::{failure_names, MediaFailure};

/// Permission status enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PermissionStatus {
    /// Permission granted
    Granted,
    /// Permission denied
    Denied,
    /// Permission not determined (user hasn't been asked yet)
    NotDetermined,
    /// Permission restricted (parental controls, etc)
    Restricted,
}

impl std::fmt::Display for PermissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PermissionStatus::Granted => write!(f, "granted"),
            PermissionStatus::Denied => write!(f, "denied"),
            PermissionStatus::NotDetermined => write!(f, "not_determined"),
            PermissionStatus::Restricted => write!(f, "restricted"),
        }
    }
}

impl PermissionStatus {
    /// The failure an acquisition would end in, when the status already rules
    /// access out and prompting the user again is pointless.
    pub fn blocking_failure(self) -> Option<MediaFailure> {
        match self {
            PermissionStatus::Denied => Some(MediaFailure::new(
                failure_names::NOT_ALLOWED,
                "camera permission was denied",
            )),
            PermissionStatus::Restricted => Some(MediaFailure::new(
                failure_names::NOT_ALLOWED,
                "camera access is restricted by system policy",
            )),
            PermissionStatus::Granted | PermissionStatus::NotDetermined => None,
        }
    }
}

/// Detailed permission information
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PermissionInfo {
    pub status: PermissionStatus,
    pub message: String,
    pub can_request: bool,
}

impl PermissionInfo {
    pub fn describe(status: PermissionStatus) -> Self {
        let (message, can_request) = match status {
            PermissionStatus::Granted => ("Camera access granted", false),
            PermissionStatus::Denied => (
                "Camera access denied - allow it in the system or browser settings",
                true,
            ),
            PermissionStatus::NotDetermined => ("Camera permission not yet requested", true),
            PermissionStatus::Restricted => ("Camera access restricted by system policy", false),
        };
        Self {
            status,
            message: message.to_string(),
            can_request,
        }
    }
}
