//! Validates contract fixtures against frozen JSON schemas and the parser.

use face_verify_contract::{
    CleanupOutcome, MatchOutcome, VerificationOutcome, parse_cleanup_response,
    parse_verification_response,
};
use jsonschema::JSONSchema;
use serde_json::{Value, json};

const VERIFICATION_SCHEMA: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../contracts/verification-response.schema.json"
);
const CLEANUP_SCHEMA: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../contracts/cleanup-response.schema.json"
);
const MATCH_FIXTURE: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../contracts/fixtures/verification-response.valid.json"
);
const ERROR_FIXTURE: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../contracts/fixtures/verification-error.valid.json"
);
const NO_FACE_FIXTURE: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../contracts/fixtures/verification-no-face.valid.json"
);
const CLEANUP_FIXTURE: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../contracts/fixtures/cleanup-response.valid.json"
);

fn read(path: &str) -> String {
    std::fs::read_to_string(path).expect("json file should be readable")
}

fn load_json(path: &str) -> Value {
    serde_json::from_str(&read(path)).expect("json file should be valid")
}

fn compile_validator(schema_path: &str) -> JSONSchema {
    let schema = load_json(schema_path);
    JSONSchema::compile(&schema).expect("schema should compile")
}

#[test]
fn verification_fixture_matches_schema() {
    let validator = compile_validator(VERIFICATION_SCHEMA);
    assert!(
        validator.is_valid(&load_json(MATCH_FIXTURE)),
        "verification fixture should validate against schema"
    );
}

#[test]
fn verification_error_fixture_matches_schema() {
    let validator = compile_validator(VERIFICATION_SCHEMA);
    assert!(
        validator.is_valid(&load_json(ERROR_FIXTURE)),
        "error fixture should validate against schema"
    );
}

#[test]
fn verification_schema_rejects_body_without_result_or_error() {
    let validator = compile_validator(VERIFICATION_SCHEMA);
    assert!(!validator.is_valid(&json!({ "passport_number": "P123" })));
}

#[test]
fn verification_schema_accepts_http_image_urls() {
    let validator = compile_validator(VERIFICATION_SCHEMA);
    assert!(validator.is_valid(&json!({
        "verification_result": "Match",
        "qr_code": "http://127.0.0.1:5000/results/passport_qr.png",
        "face_image": "data:image/png;base64,RkFDRQ==",
        "real_time_face": "https://verify.example.com/results/live_face.png"
    })));
}

#[test]
fn verification_schema_rejects_non_string_images() {
    let validator = compile_validator(VERIFICATION_SCHEMA);
    assert!(!validator.is_valid(&json!({
        "verification_result": "Match",
        "qr_code": 42
    })));
}

#[test]
fn no_face_fixture_matches_schema_and_parses() {
    let validator = compile_validator(VERIFICATION_SCHEMA);
    assert!(
        validator.is_valid(&load_json(NO_FACE_FIXTURE)),
        "null distance score should validate against schema"
    );

    let outcome =
        parse_verification_response(&read(NO_FACE_FIXTURE)).expect("fixture should parse");
    let VerificationOutcome::Report(report) = outcome else {
        panic!("fixture should parse as a report");
    };
    assert_eq!(report.outcome, MatchOutcome::NoMatch);
    assert_eq!(report.distance_score, None);
    assert_eq!(report.confidence.as_deref(), Some("N/A"));
}

#[test]
fn verification_fixture_parses_as_match_report() {
    let outcome = parse_verification_response(&read(MATCH_FIXTURE)).expect("fixture should parse");

    let VerificationOutcome::Report(report) = outcome else {
        panic!("fixture should parse as a report");
    };
    assert_eq!(report.outcome, MatchOutcome::Match);
    assert_eq!(report.passport_number.as_deref(), Some("P123"));
    assert_eq!(report.distance_score, Some(0.3124));
    assert_eq!(report.confidence.as_deref(), Some("87.5%"));
    assert_eq!(
        report.qr_code.as_deref(),
        Some("http://127.0.0.1:5000/results/passport_qr.png")
    );
}

#[test]
fn verification_error_fixture_parses_as_server_error() {
    let outcome = parse_verification_response(&read(ERROR_FIXTURE)).expect("fixture should parse");

    assert_eq!(
        outcome,
        VerificationOutcome::ServerError("bad document".to_string())
    );
}

#[test]
fn cleanup_fixture_matches_schema_and_parses() {
    let validator = compile_validator(CLEANUP_SCHEMA);
    let fixture = load_json(CLEANUP_FIXTURE);
    assert!(
        validator.is_valid(&fixture),
        "cleanup fixture should validate against schema"
    );

    let outcome = parse_cleanup_response(&read(CLEANUP_FIXTURE)).expect("fixture should parse");
    assert!(matches!(outcome, CleanupOutcome::Cleaned(_)));
}
