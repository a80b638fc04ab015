use super::*;
use serde_json::json;
use ward_core::FakeClock;
use ward_redact::Redactor;

fn redactor() -> Redactor {
    Redactor::new(&[]).unwrap()
}

fn descriptor(action: &str) -> IntentDescriptor {
    IntentDescriptor {
        workflow_id: "wf-1".into(),
        step_id: Some("st-1".into()),
        action: action.into(),
        target: "https://example.com".into(),
        payload: json!({"password": "hunter2"}),
    }
}

#[test]
fn record_intent_then_result_closes_the_pair() {
    let dir = tempfile::tempdir().unwrap();
    let mut trail = AuditTrail::open(dir.path().join("audit.jsonl"), FakeClock::new(), redactor(), None).unwrap();
    let intent_seq = trail.record_intent(descriptor("http.get")).unwrap();
    assert_eq!(trail.pending_intents(), vec![intent_seq]);

    trail.record_result(intent_seq, json!({"status": 200})).unwrap();
    assert!(trail.pending_intents().is_empty());
}

#[test]
fn record_result_carries_the_closing_intents_context() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit.jsonl");
    let mut trail = AuditTrail::open(path.clone(), FakeClock::new(), redactor(), None).unwrap();
    let intent_seq = trail.record_intent(descriptor("http.get")).unwrap();
    trail.record_result(intent_seq, json!({"status": 200})).unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    let result_line: Value = serde_json::from_str(contents.lines().nth(1).unwrap()).unwrap();
    assert_eq!(result_line["workflow_id"], json!("wf-1"));
    assert_eq!(result_line["step_id"], json!("st-1"));
    assert_eq!(result_line["action"], json!("http.get"));
    assert_eq!(result_line["target"], json!("https://example.com"));
}

#[test]
fn reopen_recovers_pending_intent_context_for_a_later_result() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit.jsonl");
    let intent_seq = {
        let mut trail = AuditTrail::open(path.clone(), FakeClock::new(), redactor(), None).unwrap();
        trail.record_intent(descriptor("http.get")).unwrap()
    };

    let mut trail = AuditTrail::open(path.clone(), FakeClock::new(), redactor(), None).unwrap();
    trail.record_result(intent_seq, json!({"status": 200})).unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    let result_line: Value = serde_json::from_str(contents.lines().nth(1).unwrap()).unwrap();
    assert_eq!(result_line["action"], json!("http.get"));
    assert_eq!(result_line["target"], json!("https://example.com"));
}

#[test]
fn record_result_without_matching_intent_fails() {
    let dir = tempfile::tempdir().unwrap();
    let mut trail = AuditTrail::open(dir.path().join("audit.jsonl"), FakeClock::new(), redactor(), None).unwrap();
    let err = trail.record_result(99, json!({})).unwrap_err();
    assert!(matches!(err, AuditError::InvalidBackReference { seq: 99 }));
}

#[test]
fn payload_is_redacted_before_it_hits_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit.jsonl");
    let mut trail = AuditTrail::open(path.clone(), FakeClock::new(), redactor(), None).unwrap();
    trail.record_intent(descriptor("http.post")).unwrap();

    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(!raw.contains("hunter2"));
    assert!(raw.contains("REDACTED"));
}

#[test]
fn verify_chain_passes_on_untampered_trail() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit.jsonl");
    let mut trail = AuditTrail::open(path, FakeClock::new(), redactor(), None).unwrap();
    let s1 = trail.record_intent(descriptor("http.get")).unwrap();
    trail.record_result(s1, json!({"status": 200})).unwrap();
    let s2 = trail.record_intent(descriptor("http.post")).unwrap();
    trail.record_result(s2, json!({"status": 201})).unwrap();

    let verification = trail.verify_chain().unwrap();
    assert!(verification.valid);
    assert_eq!(verification.record_count, 4);
    assert_eq!(verification.first_broken_seq, None);
}

#[test]
fn verify_chain_detects_tampered_record() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit.jsonl");
    {
        let mut trail = AuditTrail::open(path.clone(), FakeClock::new(), redactor(), None).unwrap();
        trail.record_intent(descriptor("http.get")).unwrap();
        trail.record_intent(descriptor("http.post")).unwrap();
    }

    // Tamper with the first line's target field directly on disk.
    let contents = std::fs::read_to_string(&path).unwrap();
    let mut lines: Vec<String> = contents.lines().map(String::from).collect();
    lines[0] = lines[0].replace("example.com", "evil.example.com");
    std::fs::write(&path, lines.join("\n") + "\n").unwrap();

    let trail = AuditTrail::open(path, FakeClock::new(), redactor(), None).unwrap();
    let verification = trail.verify_chain().unwrap();
    assert!(!verification.valid);
    assert_eq!(verification.first_broken_seq, Some(1));
}

#[test]
fn reopen_rebuilds_sequence_and_pending_intents() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit.jsonl");
    {
        let mut trail = AuditTrail::open(path.clone(), FakeClock::new(), redactor(), None).unwrap();
        trail.record_intent(descriptor("http.get")).unwrap();
        let s2 = trail.record_intent(descriptor("http.post")).unwrap();
        trail.record_result(s2, json!({"status": 201})).unwrap();
    }

    let trail = AuditTrail::open(path, FakeClock::new(), redactor(), None).unwrap();
    assert_eq!(trail.pending_intents(), vec![1]);
    assert_eq!(trail.next_seq, 3);
}

#[test]
fn hmac_key_changes_chain_verification_outcome() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit.jsonl");
    let mut trail = AuditTrail::open(path.clone(), FakeClock::new(), redactor(), Some(b"top-secret".to_vec())).unwrap();
    let s1 = trail.record_intent(descriptor("http.get")).unwrap();
    trail.record_result(s1, json!({"status": 200})).unwrap();

    let verification = trail.verify_chain().unwrap();
    assert!(verification.valid);

    let wrong_key_trail = AuditTrail::open(path, FakeClock::new(), redactor(), Some(b"wrong-key".to_vec())).unwrap();
    let verification = wrong_key_trail.verify_chain().unwrap();
    assert!(!verification.valid);
}
