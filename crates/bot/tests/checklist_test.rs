use chrono::{TimeZone, Utc};
use gestipc_bot::checklist::{ChecklistLine, render_checklist};
use gestipc_db::models::DbChecklistItem;
use pretty_assertions::assert_eq;
use uuid::Uuid;

fn item(description: &str, position: i32, done: bool) -> DbChecklistItem {
    DbChecklistItem {
        id: Uuid::new_v4(),
        task_id: Uuid::new_v4(),
        description: description.to_string(),
        position,
        done,
        done_by: done.then(|| "RSSMRA80A01H501U".to_string()),
        done_at: done.then(|| Utc.with_ymd_and_hms(2026, 1, 25, 13, 30, 0).unwrap()),
    }
}

#[test]
fn test_all_pending_renders_buttons_only() {
    let lines = vec![
        ChecklistLine {
            item: item("Controllo radio", 0, false),
            done_by_name: None,
        },
        ChecklistLine {
            item: item("Carico mezzi", 1, false),
            done_by_name: None,
        },
    ];

    let (text, keyboard) = render_checklist("Esercitazione", &lines);

    assert_eq!(text, "Checklist: Esercitazione\n");
    let keyboard = keyboard.expect("pending items need buttons");
    assert_eq!(keyboard.inline_keyboard.len(), 2);
    assert_eq!(keyboard.inline_keyboard[0][0].text, "Controllo radio");
    assert!(keyboard.inline_keyboard[0][0].callback_data.starts_with("chk:"));
}

#[test]
fn test_done_items_show_completer_and_time() {
    let lines = vec![
        ChecklistLine {
            item: item("Controllo radio", 0, true),
            done_by_name: Some("Mario".to_string()),
        },
        ChecklistLine {
            item: item("Carico mezzi", 1, false),
            done_by_name: None,
        },
    ];

    let (text, keyboard) = render_checklist("Esercitazione", &lines);

    // 13:30 UTC in January is 14:30 in Rome.
    assert!(text.contains("✅ Controllo radio - Mario (14:30)"));
    assert!(!text.contains("Carico mezzi -"));
    assert_eq!(keyboard.expect("one pending item").inline_keyboard.len(), 1);
}

#[test]
fn test_fully_done_checklist_has_no_keyboard() {
    let lines = vec![ChecklistLine {
        item: item("Controllo radio", 0, true),
        done_by_name: None,
    }];

    let (text, keyboard) = render_checklist("Esercitazione", &lines);

    assert!(text.contains("✅ Controllo radio - ? ("));
    assert!(keyboard.is_none());
}
