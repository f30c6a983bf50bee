use super::*;
use crate::state::chat::{CANCELLED_TEXT, ChatPhase, Role};
use crate::test_support::{Method, MockTransport, network_error};
use std::time::Duration;

fn panel(mock: &Arc<MockTransport>, connectivity: Connectivity) -> (Arc<ChatPanel>, watch::Sender<Connectivity>) {
    let (tx, rx) = watch::channel(connectivity);
    (Arc::new(ChatPanel::mount(mock.clone(), rx)), tx)
}

#[tokio::test]
async fn mount_seeds_greeting() {
    let mock = MockTransport::new();
    let (panel, _tx) = panel(&mock, Connectivity::Connecting);
    let transcript = panel.transcript();
    assert_eq!(transcript.messages.len(), 1);
    assert_eq!(transcript.messages[0].role, Role::Assistant);
}

#[tokio::test(start_paused = true)]
async fn user_message_appears_before_reply_arrives() {
    let mock = MockTransport::new();
    mock.respond(CHAT_PATH, Ok(json!({"response": "hi", "confidence": 0.9})));
    mock.delay(CHAT_PATH, Duration::from_secs(1));
    let (panel, _tx) = panel(&mock, Connectivity::Connected);
    panel.set_input("hello");

    let pending = tokio::spawn({
        let panel = Arc::clone(&panel);
        async move { panel.send().await }
    });
    tokio::task::yield_now().await;

    let mid = panel.transcript();
    assert_eq!(mid.messages.len(), 2);
    assert_eq!(mid.messages[1].role, Role::User);
    assert_eq!(mid.messages[1].text, "hello");
    assert!(mid.input.is_empty());
    assert_eq!(mid.phase, ChatPhase::AwaitingResponse);
    assert!(panel.is_sending());

    assert_eq!(pending.await.unwrap(), Ok(true));
    let done = panel.transcript();
    assert_eq!(done.messages.len(), 3);
    assert_eq!(done.messages[2].role, Role::Assistant);
    assert_eq!(done.messages[2].text, "hi");
    assert_eq!(done.messages[2].confidence_percent(), Some(90));
    assert_eq!(done.phase, ChatPhase::Idle);
    assert!(!panel.is_sending());

    let calls = mock.calls_to(CHAT_PATH);
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].body, Some(json!({"message": "hello"})));
}

#[tokio::test]
async fn network_failure_appends_one_error_message() {
    let mock = MockTransport::new();
    mock.respond(CHAT_PATH, Err(network_error(CHAT_PATH)));
    let (panel, _tx) = panel(&mock, Connectivity::Connected);
    panel.set_input("hello");

    let err = panel.send().await.unwrap_err();
    assert!(matches!(err, ActionError::Api(ApiError::Network { .. })));

    let transcript = panel.transcript();
    assert_eq!(transcript.messages.len(), 3);
    assert_eq!(transcript.messages[2].role, Role::Error);
    assert_eq!(transcript.messages[2].text, CONNECTION_ERROR_TEXT);
    assert!(!transcript.is_awaiting());
}

#[tokio::test]
async fn reply_without_response_field_is_an_error_message() {
    let mock = MockTransport::new();
    mock.respond(CHAT_PATH, Ok(json!({"confidence": 0.5})));
    let (panel, _tx) = panel(&mock, Connectivity::Connected);
    panel.set_input("hello");

    assert_eq!(panel.send().await, Ok(true));
    let transcript = panel.transcript();
    assert_eq!(transcript.messages.iter().filter(|m| m.role == Role::Error).count(), 1);
    assert_eq!(transcript.messages.len(), 3);
}

#[tokio::test]
async fn send_while_disconnected_is_a_noop() {
    let mock = MockTransport::new();
    let (panel, tx) = panel(&mock, Connectivity::Error);
    panel.set_input("hello");

    assert_eq!(panel.send().await, Ok(false));
    assert_eq!(panel.transcript().messages.len(), 1);
    assert_eq!(panel.transcript().input, "hello");
    assert_eq!(mock.call_count(), 0);

    tx.send(Connectivity::Connecting).unwrap();
    assert_eq!(panel.send().await, Ok(false));
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn overlapping_send_is_rejected_without_io() {
    let mock = MockTransport::new();
    mock.respond(CHAT_PATH, Ok(json!({"response": "hi"})));
    mock.delay(CHAT_PATH, Duration::from_secs(1));
    let (panel, _tx) = panel(&mock, Connectivity::Connected);
    panel.set_input("one");

    let first = tokio::spawn({
        let panel = Arc::clone(&panel);
        async move { panel.send().await }
    });
    tokio::task::yield_now().await;
    panel.set_input("two");
    assert_eq!(panel.send().await, Err(ActionError::InFlight));
    assert_eq!(mock.calls_to(CHAT_PATH).len(), 1);
    assert_eq!(first.await.unwrap(), Ok(true));
}

#[tokio::test(start_paused = true)]
async fn reply_after_close_leaves_transcript_alone() {
    let mock = MockTransport::new();
    mock.respond(CHAT_PATH, Ok(json!({"response": "late"})));
    mock.delay(CHAT_PATH, Duration::from_secs(3));
    let (panel, _tx) = panel(&mock, Connectivity::Connected);
    panel.set_input("hello");

    let pending = tokio::spawn({
        let panel = Arc::clone(&panel);
        async move { panel.send().await }
    });
    tokio::task::yield_now().await;
    panel.close();

    assert_eq!(pending.await.unwrap(), Err(ActionError::Closed));
    let transcript = panel.transcript();
    assert_eq!(transcript.messages.len(), 2);
    assert!(transcript.messages.iter().all(|m| m.text != "late"));
}

#[tokio::test(start_paused = true)]
async fn dropped_send_ends_turn_and_allows_retry() {
    let mock = MockTransport::new();
    mock.respond(CHAT_PATH, Ok(json!({"response": "hi"})));
    mock.delay(CHAT_PATH, Duration::from_secs(5));
    let (panel, _tx) = panel(&mock, Connectivity::Connected);
    panel.set_input("hello");

    assert!(tokio::time::timeout(Duration::from_secs(1), panel.send()).await.is_err());
    assert!(!panel.is_sending());
    let transcript = panel.transcript();
    assert_eq!(transcript.phase, ChatPhase::Idle);
    assert_eq!(transcript.messages.len(), 3);
    assert_eq!(transcript.messages[2].role, Role::Error);
    assert_eq!(transcript.messages[2].text, CANCELLED_TEXT);

    panel.set_input("again");
    assert_eq!(panel.send().await, Ok(true));
    assert_eq!(panel.transcript().messages.last().unwrap().text, "hi");
}

// =============================================================
// futuristic mode
// =============================================================

fn futuristic(mock: &Arc<MockTransport>, scope: &ViewScope, mood: &str) -> (Arc<ChatPanel>, Slot<Mood>) {
    let shared = Slot::new(Mood::named(mood), scope.liveness());
    let (_tx, rx) = watch::channel(Connectivity::Connected);
    let panel = ChatPanel::mount(mock.clone(), rx).with_mood(shared.clone());
    panel.set_mode(ChatMode::Futuristic);
    (Arc::new(panel), shared)
}

#[tokio::test(start_paused = true)]
async fn futuristic_turn_sends_mood_and_adopts_reply_emotion() {
    let mock = MockTransport::new();
    mock.respond(
        FUTURISTIC_CHAT_PATH,
        Ok(json!({"success": true, "response": "noted", "confidence": 0.8, "emotion": "excited", "learned_something": true})),
    );
    mock.delay(FUTURISTIC_CHAT_PATH, Duration::from_secs(1));
    let scope = ViewScope::new();
    let (panel, mood) = futuristic(&mock, &scope, "calm");
    panel.set_input("remember this");

    let pending = tokio::spawn({
        let panel = Arc::clone(&panel);
        async move { panel.send().await }
    });
    tokio::task::yield_now().await;
    assert_eq!(mood.get().emotion, "thinking");

    assert_eq!(pending.await.unwrap(), Ok(true));
    assert_eq!(mood.get(), Mood::named("excited"));
    assert_eq!(
        mock.calls_to(FUTURISTIC_CHAT_PATH)[0].body,
        Some(json!({"message": "remember this", "emotion_context": "calm"}))
    );
    assert!(mock.calls_to(CHAT_PATH).is_empty());

    let reply = panel.transcript().messages.last().cloned().unwrap();
    assert_eq!(reply.emotion.as_deref(), Some("excited"));
    assert_eq!(panel.learned_flash(), Some(reply.id));
    tokio::time::sleep(LEARNED_FLASH + Duration::from_millis(1)).await;
    assert_eq!(panel.learned_flash(), None);
}

#[tokio::test]
async fn futuristic_reply_without_emotion_restores_mood() {
    let mock = MockTransport::new();
    mock.respond(FUTURISTIC_CHAT_PATH, Ok(json!({"success": true, "response": "ok"})));
    let scope = ViewScope::new();
    let (panel, mood) = futuristic(&mock, &scope, "calm");
    panel.set_input("hello");

    assert_eq!(panel.send().await, Ok(true));
    assert_eq!(mood.get().emotion, "calm");
    assert_eq!(panel.learned_flash(), None);
}

#[tokio::test]
async fn futuristic_rejection_is_frustrated() {
    let mock = MockTransport::new();
    mock.respond(
        FUTURISTIC_CHAT_PATH,
        Ok(json!({"success": false, "error": "model offline", "response": "sorry", "emotion": "frustrated"})),
    );
    let scope = ViewScope::new();
    let (panel, mood) = futuristic(&mock, &scope, "neutral");
    panel.set_input("hello");

    let err = panel.send().await.unwrap_err();
    assert_eq!(err, ActionError::Api(ApiError::Rejected("model offline".into())));
    assert_eq!(mood.get().emotion, "frustrated");
    let transcript = panel.transcript();
    assert_eq!(transcript.messages.len(), 3);
    assert_eq!(transcript.messages[2].role, Role::Error);
}

#[tokio::test(start_paused = true)]
async fn dropped_futuristic_send_restores_mood() {
    let mock = MockTransport::new();
    mock.respond(FUTURISTIC_CHAT_PATH, Ok(json!({"success": true, "response": "late"})));
    mock.delay(FUTURISTIC_CHAT_PATH, Duration::from_secs(5));
    let scope = ViewScope::new();
    let (panel, mood) = futuristic(&mock, &scope, "happy");
    panel.set_input("hello");

    assert!(tokio::time::timeout(Duration::from_secs(1), panel.send()).await.is_err());
    assert_eq!(mood.get().emotion, "happy");
    assert_eq!(panel.transcript().messages.last().unwrap().text, CANCELLED_TEXT);
}

#[tokio::test]
async fn feedback_tags_and_reports_in_background() {
    let mock = MockTransport::new();
    mock.respond(FEEDBACK_PATH, Err(network_error(FEEDBACK_PATH)));
    let (panel, _tx) = panel(&mock, Connectivity::Connected);
    let greeting = panel.transcript().messages[0].id;

    assert!(panel.feedback(greeting, FeedbackKind::Negative));
    tokio::task::yield_now().await;

    assert_eq!(panel.transcript().messages[0].feedback, Some(FeedbackKind::Negative));
    let calls = mock.calls_to(FEEDBACK_PATH);
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].method, Method::Post);
    assert_eq!(calls[0].body, Some(json!({"message_id": greeting, "feedback": "negative", "rating": 1})));
}

#[tokio::test]
async fn feedback_on_unknown_message_sends_nothing() {
    let mock = MockTransport::new();
    let (panel, _tx) = panel(&mock, Connectivity::Connected);
    assert!(!panel.feedback(42, FeedbackKind::Positive));
    tokio::task::yield_now().await;
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn clear_empties_transcript() {
    let mock = MockTransport::new();
    let (panel, _tx) = panel(&mock, Connectivity::Connected);
    panel.clear();
    assert!(panel.transcript().messages.is_empty());
}

#[tokio::test]
async fn submitted_feedback_waits_for_the_backend() {
    let mock = MockTransport::new();
    mock.respond(FEEDBACK_PATH, Ok(json!({"success": true})));
    let (panel, _tx) = panel(&mock, Connectivity::Connected);
    let greeting = panel.transcript().messages[0].id;

    assert_eq!(panel.submit_feedback(greeting, FeedbackKind::Positive).await, Ok(()));
    assert_eq!(mock.calls_to(FEEDBACK_PATH).len(), 1);
    assert_eq!(panel.transcript().messages[0].feedback, Some(FeedbackKind::Positive));
}

#[tokio::test]
async fn submitted_feedback_on_user_message_is_rejected() {
    let mock = MockTransport::new();
    let (panel, _tx) = panel(&mock, Connectivity::Connected);
    let err = panel.submit_feedback(99, FeedbackKind::Negative).await.unwrap_err();
    assert!(matches!(err, ActionError::Rejected(_)));
    assert_eq!(mock.call_count(), 0);
}
