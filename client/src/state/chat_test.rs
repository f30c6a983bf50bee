use super::*;

fn now() -> OffsetDateTime {
    OffsetDateTime::UNIX_EPOCH
}

fn typed(text: &str) -> ChatState {
    ChatState { input: text.to_owned(), ..ChatState::default() }
}

// =============================================================
// begin_send
// =============================================================

#[test]
fn begin_send_appends_user_message_and_clears_input() {
    let mut state = typed("  hello ");
    let sent = state.begin_send(Connectivity::Connected, now());
    assert_eq!(sent.as_deref(), Some("hello"));
    assert_eq!(state.messages.len(), 1);
    assert_eq!(state.messages[0].role, Role::User);
    assert_eq!(state.messages[0].text, "hello");
    assert!(state.input.is_empty());
    assert!(state.is_awaiting());
}

#[test]
fn begin_send_is_noop_when_not_connected() {
    for connectivity in [Connectivity::Connecting, Connectivity::Error] {
        let mut state = typed("hello");
        assert_eq!(state.begin_send(connectivity, now()), None);
        assert!(state.messages.is_empty());
        assert_eq!(state.input, "hello");
        assert_eq!(state.phase, ChatPhase::Idle);
    }
}

#[test]
fn begin_send_ignores_blank_input() {
    let mut state = typed("   ");
    assert_eq!(state.begin_send(Connectivity::Connected, now()), None);
    assert!(state.messages.is_empty());
}

#[test]
fn begin_send_refuses_while_awaiting() {
    let mut state = typed("one");
    state.begin_send(Connectivity::Connected, now());
    state.input = "two".into();
    assert_eq!(state.begin_send(Connectivity::Connected, now()), None);
    assert_eq!(state.messages.len(), 1);
}

// =============================================================
// completion
// =============================================================

#[test]
fn success_appends_assistant_message_with_confidence() {
    let mut state = typed("hello");
    state.begin_send(Connectivity::Connected, now());
    let id = state.finish_success(
        ChatReply { response: Some("hi".into()), confidence: Some(0.9), ..ChatReply::default() },
        now(),
    );
    assert_eq!(state.messages.len(), 2);
    assert_eq!(id, Some(state.messages[1].id));
    let reply = &state.messages[1];
    assert_eq!(reply.role, Role::Assistant);
    assert_eq!(reply.text, "hi");
    assert_eq!(reply.confidence_percent(), Some(90));
    assert_eq!(state.phase, ChatPhase::Idle);
}

#[test]
fn missing_response_becomes_error_message() {
    let mut state = typed("hello");
    state.begin_send(Connectivity::Connected, now());
    assert_eq!(state.finish_success(ChatReply::default(), now()), None);
    assert_eq!(state.messages.len(), 2);
    assert_eq!(state.messages[1].role, Role::Error);
    assert!(!state.is_awaiting());
}

#[test]
fn failure_appends_exactly_one_error_message() {
    let mut state = typed("hello");
    state.begin_send(Connectivity::Connected, now());
    state.finish_failure(CONNECTION_ERROR_TEXT, now());
    assert_eq!(state.messages.iter().filter(|m| m.role == Role::Error).count(), 1);
    assert_eq!(state.phase, ChatPhase::Idle);
}

#[test]
fn futuristic_reply_keeps_emotion_and_learning_flag() {
    let mut state = typed("teach me");
    state.begin_send(Connectivity::Connected, now());
    state.finish_success(
        ChatReply {
            response: Some("noted".into()),
            emotion: Some("excited".into()),
            learned_something: true,
            ..ChatReply::default()
        },
        now(),
    );
    let reply = &state.messages[1];
    assert_eq!(reply.emotion.as_deref(), Some("excited"));
    assert!(reply.learned_something);
}

#[test]
fn cancel_ends_pending_turn_with_one_error() {
    let mut state = typed("hello");
    assert!(!state.cancel(now()));
    state.begin_send(Connectivity::Connected, now());

    assert!(state.cancel(now()));
    assert_eq!(state.phase, ChatPhase::Idle);
    assert_eq!(state.messages.len(), 2);
    assert_eq!(state.messages[1].role, Role::Error);
    assert_eq!(state.messages[1].text, CANCELLED_TEXT);
    assert!(!state.cancel(now()));
}

#[test]
fn chat_mode_parses_known_names() {
    assert_eq!(ChatMode::parse(" Futuristic "), Some(ChatMode::Futuristic));
    assert_eq!(ChatMode::parse("classic"), Some(ChatMode::Standard));
    assert_eq!(ChatMode::parse("retro"), None);
}

#[test]
fn message_ids_are_unique_and_increasing() {
    let mut state = ChatState::with_greeting(now());
    state.input = "a".into();
    state.begin_send(Connectivity::Connected, now());
    state.finish_failure("x", now());
    let ids: Vec<u64> = state.messages.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

// =============================================================
// feedback / clear
// =============================================================

#[test]
fn feedback_tags_assistant_messages_only() {
    let mut state = ChatState::with_greeting(now());
    let greeting_id = state.messages[0].id;
    state.input = "hi".into();
    state.begin_send(Connectivity::Connected, now());
    let user_id = state.messages[1].id;

    assert!(state.tag_feedback(greeting_id, FeedbackKind::Positive));
    assert_eq!(state.messages[0].feedback, Some(FeedbackKind::Positive));
    assert!(!state.tag_feedback(user_id, FeedbackKind::Negative));
    assert!(!state.tag_feedback(999, FeedbackKind::Negative));
}

#[test]
fn clear_empties_transcript() {
    let mut state = ChatState::with_greeting(now());
    state.clear();
    assert!(state.messages.is_empty());
}

#[test]
fn confidence_percent_rounds_and_clamps() {
    assert_eq!(confidence_percent(0.856), 86);
    assert_eq!(confidence_percent(1.4), 100);
    assert_eq!(confidence_percent(-0.2), 0);
}
