//! Integration tests for the server cleanup request.

mod common;

use std::sync::Arc;

use common::{MockTransport, Scripted, mounted_page};
use face_verify_app::AppError;
use face_verify_contract::CleanupOutcome;

#[tokio::test]
async fn cleanup_flow_tests_success_message_is_returned() {
    let transport = Arc::new(MockTransport::responding(
        r#"{"message":"All uploaded files and results have been deleted."}"#,
    ));
    let page = mounted_page(Arc::clone(&transport));

    let outcome = page.cleanup().await.expect("cleanup should succeed");

    assert_eq!(
        outcome,
        CleanupOutcome::Cleaned("All uploaded files and results have been deleted.".to_string())
    );
    assert_eq!(transport.urls(), vec!["http://127.0.0.1:5000/cleanup".to_string()]);
    assert!(transport.forms().is_empty());
}

#[tokio::test]
async fn cleanup_flow_tests_server_error_is_reported() {
    let transport = Arc::new(MockTransport::new(Scripted::Body(
        500,
        r#"{"error":"permission denied"}"#.to_string(),
    )));
    let page = mounted_page(transport);

    let outcome = page.cleanup().await.expect("error body should parse");

    assert_eq!(outcome, CleanupOutcome::ServerError("permission denied".to_string()));
}

#[tokio::test]
async fn cleanup_flow_tests_transport_failure_is_an_upload_error() {
    let transport = Arc::new(MockTransport::new(Scripted::Fail("timed out".to_string())));
    let page = mounted_page(transport);

    assert!(matches!(page.cleanup().await, Err(AppError::Upload(_))));
}

#[tokio::test]
async fn cleanup_flow_tests_unreadable_body_is_a_contract_error() {
    let page = mounted_page(Arc::new(MockTransport::responding("not json")));

    assert!(matches!(page.cleanup().await, Err(AppError::Contract(_))));
}
