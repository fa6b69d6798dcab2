use crm_backend_fake::{Failure, FakeBackend, fixtures};
use crm_client::FailureReporter;
use crm_desk::IntegrationFlags;
use serde_json::json;

// ── call integration ────────────────────────────────────────────

#[tokio::test]
async fn detailed_response() {
    let backend = FakeBackend::with_fixtures();
    let flags = IntegrationFlags::fetch(&backend, &FailureReporter::new()).await;

    assert!(flags.call_enabled);
    assert!(flags.twilio_enabled);
    assert!(!flags.exotel_enabled);
    assert_eq!(flags.default_calling_medium, "twilio");
    assert_eq!(backend.calls(fixtures::LEGACY_TWILIO_ENABLED), 0);
}

#[tokio::test]
async fn exotel_only_still_enables_calling() {
    let backend = FakeBackend::with_fixtures().with_response(
        fixtures::CALL_INTEGRATION_ENABLED,
        json!({ "twilio": false, "exotel": true, "defaultCallingMedium": "exotel" }),
    );
    let flags = IntegrationFlags::fetch(&backend, &FailureReporter::new()).await;

    assert!(flags.call_enabled);
    assert!(flags.exotel_enabled);
    assert_eq!(flags.default_calling_medium, "exotel");
}

#[tokio::test]
async fn legacy_boolean_response() {
    let backend =
        FakeBackend::with_fixtures().with_response(fixtures::CALL_INTEGRATION_ENABLED, json!(false));
    let flags = IntegrationFlags::fetch(&backend, &FailureReporter::new()).await;

    assert!(!flags.call_enabled);
    assert_eq!(flags.default_calling_medium, "");
}

#[tokio::test]
async fn falls_back_to_legacy_endpoint() {
    let backend = FakeBackend::with_fixtures();
    backend.fail(
        fixtures::CALL_INTEGRATION_ENABLED,
        Failure::Status(404, "method not found".into()),
    );
    let flags = IntegrationFlags::fetch(&backend, &FailureReporter::new()).await;

    assert_eq!(backend.calls(fixtures::LEGACY_TWILIO_ENABLED), 1);
    assert!(flags.call_enabled);
    assert!(flags.twilio_enabled);
    assert_eq!(flags.default_calling_medium, "twilio");
}

#[tokio::test]
async fn both_endpoints_failing_disables_calling() {
    let backend = FakeBackend::with_fixtures();
    backend.fail(fixtures::CALL_INTEGRATION_ENABLED, Failure::Transport("refused".into()));
    backend.fail(fixtures::LEGACY_TWILIO_ENABLED, Failure::Transport("refused".into()));
    let flags = IntegrationFlags::fetch(&backend, &FailureReporter::new()).await;

    assert!(!flags.call_enabled);
    assert!(!flags.twilio_enabled);
    assert!(!flags.exotel_enabled);
    assert!(flags.whatsapp_enabled);
}

// ── whatsapp ────────────────────────────────────────────────────

#[tokio::test]
async fn whatsapp_flags_are_truthy_values() {
    let backend = FakeBackend::with_fixtures();
    let flags = IntegrationFlags::fetch(&backend, &FailureReporter::new()).await;
    assert!(flags.whatsapp_enabled);
    assert!(flags.whatsapp_installed);
}

#[tokio::test]
async fn whatsapp_auth_failure_requires_login() {
    let backend = FakeBackend::with_fixtures();
    backend.fail(fixtures::WHATSAPP_ENABLED, Failure::Auth);
    let reporter = FailureReporter::new();
    let flags = IntegrationFlags::fetch(&backend, &reporter).await;

    assert!(!flags.whatsapp_enabled);
    assert!(flags.whatsapp_installed);
    assert!(reporter.login_required());
}
