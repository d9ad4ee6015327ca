#[cfg(test)]
mod error_tests {
    use capture_flow::errors::{AcquireErrorKind, FlowError, SubmitErrorKind};
    use capture_flow::media::{failure_names, MediaFailure};
    use std::error::Error;

    #[test]
    fn test_acquire_error_display() {
        let error = FlowError::acquire(AcquireErrorKind::NoDevice, "no video inputs");
        assert!(error.to_string().contains("Camera acquisition error"));
        assert!(error.to_string().contains("no video inputs"));
    }

    #[test]
    fn test_submit_error_display() {
        let error = FlowError::submit(SubmitErrorKind::Server, "No face detected");
        assert_eq!(
            error.to_string(),
            "Submission error (Server): No face detected"
        );
    }

    #[test]
    fn test_flow_error_implements_error_trait() {
        let error = FlowError::capture_not_ready();
        let _error_trait: &dyn Error = &error;
        assert!(error.source().is_none());
    }

    #[test]
    fn test_failure_names_map_to_kinds() {
        let cases = [
            (failure_names::NOT_FOUND, AcquireErrorKind::NoDevice),
            (failure_names::DEVICES_NOT_FOUND, AcquireErrorKind::NoDevice),
            (failure_names::OVERCONSTRAINED, AcquireErrorKind::NoDevice),
            (failure_names::NOT_READABLE, AcquireErrorKind::DeviceBusy),
            (failure_names::TRACK_START, AcquireErrorKind::DeviceBusy),
            (failure_names::ABORT, AcquireErrorKind::DeviceBusy),
            (failure_names::NOT_ALLOWED, AcquireErrorKind::PermissionDenied),
            (failure_names::PERMISSION_DENIED, AcquireErrorKind::PermissionDenied),
            (failure_names::SECURITY, AcquireErrorKind::PermissionDenied),
            (
                failure_names::NOT_SUPPORTED,
                AcquireErrorKind::UnsupportedEnvironment,
            ),
            ("SomethingNew", AcquireErrorKind::Unknown),
        ];
        for (name, kind) in cases {
            assert_eq!(MediaFailure::new(name, "x").classify(), kind, "{}", name);
        }
    }

    #[test]
    fn test_only_unsupported_environment_withholds_retry() {
        let kinds = [
            AcquireErrorKind::NoDevice,
            AcquireErrorKind::DeviceBusy,
            AcquireErrorKind::PermissionDenied,
            AcquireErrorKind::UnsupportedEnvironment,
            AcquireErrorKind::Unknown,
        ];
        for kind in kinds {
            let error = FlowError::acquire(kind, "detail");
            assert_eq!(
                error.retry_available(),
                kind != AcquireErrorKind::UnsupportedEnvironment
            );
            assert_eq!(error.user_message(), kind.user_message());
        }
    }

    #[test]
    fn test_submit_failures_are_retryable() {
        for kind in [
            SubmitErrorKind::Transport,
            SubmitErrorKind::Server,
            SubmitErrorKind::MalformedPayload,
        ] {
            assert!(FlowError::submit(kind, "oops").retry_available());
        }
    }

    #[test]
    fn test_user_messages_are_human_readable() {
        assert_eq!(
            FlowError::capture_not_ready().user_message(),
            "Camera not ready or stream not available for capture."
        );
        assert_eq!(
            FlowError::Encoding("jpeg: zero sized".to_string()).user_message(),
            "Could not encode the captured image."
        );
        assert!(!FlowError::Closed.user_message().is_empty());
    }

    #[test]
    fn test_kind_accessors() {
        let acquire = FlowError::acquire(AcquireErrorKind::DeviceBusy, "held");
        assert_eq!(acquire.acquire_kind(), Some(AcquireErrorKind::DeviceBusy));
        assert_eq!(acquire.submit_kind(), None);

        let submit = FlowError::submit(SubmitErrorKind::Transport, "offline");
        assert_eq!(submit.submit_kind(), Some(SubmitErrorKind::Transport));
        assert_eq!(submit.acquire_kind(), None);
    }

    #[test]
    fn test_error_clone_and_equality() {
        let error = FlowError::submit(SubmitErrorKind::Server, "bad image");
        assert_eq!(error.clone(), error);
        assert_ne!(error, FlowError::NoStill);
    }
}
