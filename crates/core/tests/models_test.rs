use chrono::{Duration, TimeZone, Utc};
use gestipc_core::models::{
    service::Answer,
    task::ChecklistItem,
    telegram::{LoginToken, WebLoginRequest, WebLoginStatus},
    time_entry::{LinkTarget, MonthlySummary, TimeEntry},
    volunteer::normalize_fiscal_code,
};
use pretty_assertions::assert_eq;
use rstest::rstest;
use uuid::Uuid;

#[rstest]
#[case(0, Some(Answer::Yes))]
#[case(1, Some(Answer::No))]
#[case(2, Some(Answer::Maybe))]
#[case(3, None)]
fn test_answer_option_index_mapping(#[case] index: usize, #[case] expected: Option<Answer>) {
    assert_eq!(Answer::from_option_index(index), expected);
}

#[rstest]
#[case(Answer::Yes, "si")]
#[case(Answer::No, "no")]
#[case(Answer::Maybe, "forse")]
fn test_answer_code_round_trip(#[case] answer: Answer, #[case] code: &str) {
    assert_eq!(answer.as_code(), code);
    assert_eq!(Answer::from_code(code), Some(answer));
}

#[test]
fn test_answer_storage_codes_are_stable() {
    // The codes are persisted; a rename must not change them.
    assert_eq!(Answer::from_code("yes"), None);
    assert_eq!(
        serde_json::to_string(&Answer::Yes).unwrap(),
        "\"si\"".to_string()
    );
}

#[test]
fn test_link_target_from_columns() {
    let service_id = Uuid::new_v4();
    let task_id = Uuid::new_v4();

    assert_eq!(
        LinkTarget::from_columns(None, None).unwrap(),
        LinkTarget::None
    );
    assert_eq!(
        LinkTarget::from_columns(Some(service_id), None).unwrap(),
        LinkTarget::Service(service_id)
    );
    assert_eq!(
        LinkTarget::from_columns(None, Some(task_id)).unwrap(),
        LinkTarget::Task(task_id)
    );
    assert!(LinkTarget::from_columns(Some(service_id), Some(task_id)).is_err());
}

#[test]
fn test_link_target_column_round_trip() {
    let service_id = Uuid::new_v4();
    let (s, t) = LinkTarget::Service(service_id).into_columns();
    assert_eq!(LinkTarget::from_columns(s, t).unwrap(), LinkTarget::Service(service_id));

    let (s, t) = LinkTarget::None.into_columns();
    assert_eq!((s, t), (None, None));
}

fn entry_at(clock_in: &str, clock_out: Option<&str>) -> TimeEntry {
    TimeEntry {
        id: Uuid::new_v4(),
        volunteer_fiscal_code: "RSSMRA80A01H501U".to_string(),
        clock_in: clock_in.parse().unwrap(),
        clock_out: clock_out.map(|s| s.parse().unwrap()),
        notes: String::new(),
        link: LinkTarget::None,
        created_at: Utc::now(),
    }
}

#[test]
fn test_duration_none_while_open() {
    let entry = entry_at("2026-01-25T14:30:00Z", None);
    assert!(entry.is_open());
    assert_eq!(entry.duration_minutes(), None);
}

#[test]
fn test_duration_fractional_minutes() {
    let entry = entry_at("2026-01-25T14:30:00Z", Some("2026-01-25T16:00:30Z"));
    assert!(!entry.is_open());
    assert_eq!(entry.duration_minutes(), Some(90.5));
}

#[test]
fn test_duration_zero_length_session() {
    let entry = entry_at("2026-01-25T14:30:00Z", Some("2026-01-25T14:30:00Z"));
    assert_eq!(entry.duration_minutes(), Some(0.0));
}

#[test]
fn test_monthly_summary_display_split() {
    let summary = MonthlySummary {
        total_minutes: 150.7,
        closed_sessions: 3,
        open_since: None,
    };
    assert_eq!(summary.hours_and_minutes(), (2, 30));
}

#[rstest]
#[case("rssmra80a01h501u", Ok("RSSMRA80A01H501U"))]
#[case("  RSSMRA80A01H501U  ", Ok("RSSMRA80A01H501U"))]
#[case("SHORT", Err(()))]
#[case("RSSMRA80A01H501UX", Err(()))]
#[case("RSSMRA80A01H501!", Err(()))]
fn test_fiscal_code_normalization(#[case] raw: &str, #[case] expected: Result<&str, ()>) {
    match expected {
        Ok(code) => assert_eq!(normalize_fiscal_code(raw).unwrap(), code),
        Err(()) => assert!(normalize_fiscal_code(raw).is_err()),
    }
}

#[test]
fn test_login_token_validity_window() {
    let now = Utc.with_ymd_and_hms(2026, 1, 25, 14, 30, 0).unwrap();
    let mut token = LoginToken {
        token: "abc".to_string(),
        telegram_id: 42,
        created_at: now - Duration::minutes(5),
        used_at: None,
    };
    assert!(token.is_valid(now));

    token.created_at = now - Duration::minutes(11);
    assert!(!token.is_valid(now));

    token.created_at = now - Duration::minutes(5);
    token.used_at = Some(now - Duration::minutes(1));
    assert!(!token.is_valid(now));
}

#[test]
fn test_web_login_request_expiry() {
    let now = Utc.with_ymd_and_hms(2026, 1, 25, 14, 30, 0).unwrap();
    let mut request = WebLoginRequest {
        token: "tok".to_string(),
        volunteer_fiscal_code: "RSSMRA80A01H501U".to_string(),
        status: WebLoginStatus::Pending,
        created_at: now - Duration::minutes(15),
        resolved_at: None,
    };
    assert!(request.is_expired(now));

    // A resolved request never expires, however old.
    request.status = WebLoginStatus::Approved;
    assert!(!request.is_expired(now));
}

#[test]
fn test_checklist_item_pending() {
    let item = ChecklistItem {
        id: Uuid::new_v4(),
        task_id: Uuid::new_v4(),
        description: "Controllo radio".to_string(),
        position: 0,
        done: false,
        done_by: None,
        done_at: None,
    };
    assert!(item.is_pending());
}
