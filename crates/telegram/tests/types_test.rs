use gestipc_telegram::types::{ApiResponse, InlineKeyboardButton, InlineKeyboardMarkup, Update};
use pretty_assertions::assert_eq;

#[test]
fn test_poll_answer_update_deserializes() {
    let payload = r#"
    {
        "update_id": 42,
        "poll_answer": {
            "poll_id": "5287481827",
            "user": {"id": 99, "first_name": "Mario", "username": "mario_r"},
            "option_ids": [0]
        }
    }
    "#;

    let update: Update = serde_json::from_str(payload).unwrap();
    let answer = update.poll_answer.unwrap();

    assert_eq!(update.update_id, 42);
    assert_eq!(answer.poll_id, "5287481827");
    assert_eq!(answer.user.id, 99);
    assert_eq!(answer.option_ids, vec![0]);
}

#[test]
fn test_vote_retraction_has_empty_options() {
    let payload = r#"
    {
        "update_id": 43,
        "poll_answer": {
            "poll_id": "5287481827",
            "user": {"id": 99},
            "option_ids": []
        }
    }
    "#;

    let update: Update = serde_json::from_str(payload).unwrap();
    assert!(update.poll_answer.unwrap().option_ids.is_empty());
}

#[test]
fn test_callback_query_update_deserializes() {
    let payload = r#"
    {
        "update_id": 44,
        "callback_query": {
            "id": "cbq1",
            "from": {"id": 7, "first_name": "Anna"},
            "message": {
                "message_id": 120,
                "chat": {"id": 7},
                "text": "Checklist: Esercitazione"
            },
            "data": "chk:0b0e9a34-3bb1-4a96-9d2e-1f0a66c7a511"
        }
    }
    "#;

    let update: Update = serde_json::from_str(payload).unwrap();
    let callback = update.callback_query.unwrap();

    assert_eq!(callback.data.as_deref(), Some("chk:0b0e9a34-3bb1-4a96-9d2e-1f0a66c7a511"));
    assert_eq!(callback.message.unwrap().chat.id, 7);
}

#[test]
fn test_api_error_envelope() {
    let payload = r#"{"ok": false, "description": "Bad Request: chat not found"}"#;
    let response: ApiResponse<bool> = serde_json::from_str(payload).unwrap();

    assert!(!response.ok);
    assert!(response.result.is_none());
    assert_eq!(
        response.description.as_deref(),
        Some("Bad Request: chat not found")
    );
}

#[test]
fn test_single_column_keyboard_layout() {
    let keyboard = InlineKeyboardMarkup::single_column(vec![
        InlineKeyboardButton::callback("Sì", "a:1"),
        InlineKeyboardButton::callback("No", "a:2"),
    ]);

    assert_eq!(keyboard.inline_keyboard.len(), 2);
    assert_eq!(keyboard.inline_keyboard[0].len(), 1);
    assert_eq!(keyboard.inline_keyboard[1][0].callback_data, "a:2");
}
