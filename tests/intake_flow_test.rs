#[cfg(test)]
mod intake_flow_tests {
    use capture_flow::config::IntakeConfig;
    use capture_flow::errors::{FlowError, SubmitErrorKind};
    use capture_flow::intake::{HttpIntakeClient, IntakeForm, IntakeService, IntakeStage, IntakeSubmission};
    use capture_flow::testing::{serve_once, RecordingNavigator, ScriptedIntake};
    use capture_flow::Route;
    use std::sync::Arc;
    use tokio_test::{assert_err, assert_ok};

    fn form() -> (IntakeForm, Arc<ScriptedIntake>, Arc<RecordingNavigator>) {
        let service = Arc::new(ScriptedIntake::default());
        let navigator = Arc::new(RecordingNavigator::default());
        (
            IntakeForm::new(service.clone(), navigator.clone()),
            service,
            navigator,
        )
    }

    #[tokio::test]
    async fn test_two_questions_then_camera() {
        let (mut form, service, navigator) = form();
        assert_eq!(form.placeholder(), "Introduce Yourself");
        assert!(!form.proceed());

        form.set_input("  Ada Lovelace ");
        assert_ok!(form.submit().await);
        assert_eq!(form.stage(), IntakeStage::Location);
        assert_eq!(form.placeholder(), "Your City Name");
        assert!(service.submissions().is_empty());

        form.set_input("London");
        assert_ok!(form.submit().await);
        assert!(form.is_submitted());
        assert_eq!(
            service.submissions(),
            vec![IntakeSubmission {
                name: "Ada Lovelace".to_string(),
                location: "London".to_string(),
            }]
        );

        assert!(form.proceed());
        assert_eq!(navigator.routes(), vec![Route::Camera]);
    }

    #[tokio::test]
    async fn test_invalid_name_stays_on_first_question() {
        let (mut form, service, _) = form();
        form.set_input("R2D2");

        let err = assert_err!(form.submit().await);
        assert_eq!(err.user_message(), "Input should not contain numbers.");
        assert_eq!(form.stage(), IntakeStage::Name);
        assert!(form.error().is_some());
        assert!(service.submissions().is_empty());

        form.set_input("Ada");
        assert!(form.error().is_none());
    }

    #[tokio::test]
    async fn test_transport_failure_shows_generic_message() {
        let (mut form, service, navigator) = form();
        service.push_response(Err(FlowError::submit(SubmitErrorKind::Transport, "offline")));

        form.set_input("Ada");
        form.submit().await.unwrap();
        form.set_input("London");
        let err = form.submit().await.unwrap_err();

        assert_eq!(err.user_message(), "An error occurred during submission.");
        assert_eq!(err.submit_kind(), Some(SubmitErrorKind::Transport));
        assert!(!matches!(err, FlowError::Validation(_)));
        assert!(!form.is_submitted());
        assert!(!form.proceed());
        assert!(navigator.routes().is_empty());

        form.submit().await.unwrap();
        assert!(form.proceed());
    }

    #[tokio::test]
    async fn test_http_client_posts_answers() {
        let (url, server) = serve_once(200, r#"{"success":true}"#.to_string()).await;
        let client = HttpIntakeClient::from_config(&IntakeConfig {
            endpoint: url,
            ..IntakeConfig::default()
        })
        .unwrap();

        let submission = IntakeSubmission {
            name: "Ada".to_string(),
            location: "London".to_string(),
        };
        assert_ok!(client.submit(&submission).await);

        let body: IntakeSubmission = serde_json::from_str(&server.await.unwrap()).unwrap();
        assert_eq!(body, submission);
    }

    #[tokio::test]
    async fn test_http_error_status_is_server_failure() {
        let (url, _server) = serve_once(503, r#"{"message":"overloaded"}"#.to_string()).await;
        let service = Arc::new(
            HttpIntakeClient::from_config(&IntakeConfig {
                endpoint: url,
                ..IntakeConfig::default()
            })
            .unwrap(),
        );
        let mut form = IntakeForm::new(service, Arc::new(RecordingNavigator::default()));
        form.set_input("Ada");
        assert_ok!(form.submit().await);
        form.set_input("London");

        let err = assert_err!(form.submit().await);
        assert_eq!(err.submit_kind(), Some(SubmitErrorKind::Server));
        assert_eq!(err.user_message(), "An error occurred during submission.");
    }

    #[tokio::test]
    async fn test_http_client_rejects_unsuccessful_reply() {
        let (url, _server) = serve_once(200, r#"{"success":false}"#.to_string()).await;
        let client = HttpIntakeClient::from_config(&IntakeConfig {
            endpoint: url,
            ..IntakeConfig::default()
        })
        .unwrap();

        let err = client
            .submit(&IntakeSubmission {
                name: "Ada".to_string(),
                location: "London".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Submission failed. Please try again.");
        assert_eq!(err.submit_kind(), Some(SubmitErrorKind::Server));
    }
}
