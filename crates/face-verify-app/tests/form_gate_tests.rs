//! Integration tests for the signup/login gate driven by configuration.

use std::sync::Mutex;

use face_verify_app::AppConfig;
use face_verify_auth::{FormGate, FormKind, GateOutcome, MISSING_FIELDS_MESSAGE, PageNavigator};

#[derive(Default)]
struct RecordingNavigator {
    navigations: Mutex<Vec<String>>,
    alerts: Mutex<Vec<String>>,
}

impl PageNavigator for RecordingNavigator {
    fn navigate(&self, location: &str) {
        self.navigations
            .lock()
            .expect("navigations lock")
            .push(location.to_string());
    }

    fn alert(&self, message: &str) {
        self.alerts
            .lock()
            .expect("alerts lock")
            .push(message.to_string());
    }
}

#[test]
fn form_gate_tests_configured_next_page_is_used() {
    let config = AppConfig {
        next_page: "verify.html".to_string(),
        ..AppConfig::default()
    };
    let gate = FormGate::new(config.next_page.clone());
    let navigator = RecordingNavigator::default();

    let outcome = gate.submit(FormKind::Login, &["a@b.c", "secret"], &navigator);

    assert_eq!(outcome, GateOutcome::Navigate("verify.html".to_string()));
    assert_eq!(
        *navigator.navigations.lock().expect("navigations lock"),
        vec!["verify.html".to_string()]
    );
    assert!(navigator.alerts.lock().expect("alerts lock").is_empty());
}

#[test]
fn form_gate_tests_blank_signup_field_alerts_and_stays() {
    let gate = FormGate::new(AppConfig::default().next_page);
    let navigator = RecordingNavigator::default();

    let outcome = gate.submit(FormKind::Signup, &["ana", "", "pw"], &navigator);

    assert_eq!(outcome, GateOutcome::Alert(MISSING_FIELDS_MESSAGE.to_string()));
    assert!(navigator.navigations.lock().expect("navigations lock").is_empty());
    assert_eq!(
        *navigator.alerts.lock().expect("alerts lock"),
        vec![MISSING_FIELDS_MESSAGE.to_string()]
    );
}

#[test]
fn form_gate_tests_default_config_routes_to_upload_page() {
    let gate = FormGate::new(AppConfig::default().next_page);
    let navigator = RecordingNavigator::default();

    let outcome = gate.submit(FormKind::Signup, &["ana", "ana@x.io", "pw"], &navigator);

    assert_eq!(outcome, GateOutcome::Navigate("upload.html".to_string()));
}
