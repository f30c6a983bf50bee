use super::*;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
struct Stats {
    vocabulary_size: u64,
    average_feedback: f64,
}

// =============================================================
// ensure_success / server_message
// =============================================================

#[test]
fn ensure_success_accepts_true_flag() {
    assert_eq!(ensure_success(&json!({"success": true})), Ok(()));
}

#[test]
fn ensure_success_rejects_false_with_message() {
    let err = ensure_success(&json!({"success": false, "message": "already running"})).unwrap_err();
    assert_eq!(err, ApiError::Rejected("already running".into()));
}

#[test]
fn ensure_success_falls_back_to_error_field() {
    let err = ensure_success(&json!({"success": false, "error": "boom"})).unwrap_err();
    assert_eq!(err, ApiError::Rejected("boom".into()));
}

#[test]
fn ensure_success_treats_missing_flag_as_failure() {
    let err = ensure_success(&json!({"stats": {}})).unwrap_err();
    assert_eq!(err, ApiError::Rejected(REJECTED_FALLBACK.into()));
}

#[test]
fn server_message_ignores_blank_text() {
    assert_eq!(server_message(&json!({"message": "  "})), None);
}

// =============================================================
// Shape::unwrap
// =============================================================

#[test]
fn raw_shape_passes_body_through() {
    let body = json!({"precision": 0.8});
    assert_eq!(Shape::Raw.unwrap(body.clone()).unwrap(), body);
}

#[test]
fn field_shape_extracts_payload() {
    let body = json!({"success": true, "status": {"is_running": true}});
    assert_eq!(Shape::Field("status").unwrap(body).unwrap(), json!({"is_running": true}));
}

#[test]
fn field_shape_reports_missing_payload() {
    let err = Shape::Field("stats").unwrap(json!({"success": true})).unwrap_err();
    assert_eq!(err, ApiError::MissingField("stats".into()));
}

#[test]
fn flagged_shape_keeps_whole_body() {
    let body = json!({"success": true, "accuracy_final": 91.5});
    assert_eq!(Shape::Flagged.unwrap(body.clone()).unwrap(), body);
}

#[test]
fn flag_shape_discards_body() {
    assert_eq!(Shape::Flag.unwrap(json!({"success": true, "extra": 1})).unwrap(), Value::Null);
}

// =============================================================
// adapt
// =============================================================

#[test]
fn adapt_decodes_payload_with_defaults() {
    let body = json!({"success": true, "stats": {"vocabulary_size": 42}});
    let stats: Stats = adapt(Shape::Field("stats"), "/api/learning/stats", body).unwrap();
    assert_eq!(stats, Stats { vocabulary_size: 42, average_feedback: 0.0 });
}

#[test]
fn adapt_maps_null_payload_to_default() {
    let body = json!({"success": true, "stats": null});
    let stats: Stats = adapt(Shape::Field("stats"), "/api/learning/stats", body).unwrap();
    assert_eq!(stats, Stats::default());
}

#[test]
fn adapt_reports_type_mismatch_as_decode_error() {
    let body = json!({"success": true, "stats": [1, 2, 3]});
    let err = adapt::<Stats>(Shape::Field("stats"), "/api/learning/stats", body).unwrap_err();
    assert!(matches!(err, ApiError::Decode { path, .. } if path == "/api/learning/stats"));
}

#[test]
fn adapt_propagates_rejection() {
    let body = json!({"success": false, "message": "disabled"});
    let err = adapt::<Stats>(Shape::Field("stats"), "/api/learning/stats", body).unwrap_err();
    assert_eq!(err, ApiError::Rejected("disabled".into()));
}
