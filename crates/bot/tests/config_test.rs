use gestipc_bot::config::BotConfig;

#[test]
fn test_login_url_joins_cleanly() {
    let config = BotConfig {
        token: "test_token".to_string(),
        database_url: "postgres://localhost".to_string(),
        web_base_url: "http://localhost:3000".to_string(),
        survey_chat_id: Some(-100123),
    };

    assert_eq!(
        config.login_url("abc123"),
        "http://localhost:3000/auth/login/abc123"
    );
}

#[test]
fn test_login_url_trims_trailing_slash() {
    let config = BotConfig {
        token: "test_token".to_string(),
        database_url: "postgres://localhost".to_string(),
        web_base_url: "http://localhost:3000/".to_string(),
        survey_chat_id: None,
    };

    assert_eq!(
        config.login_url("abc123"),
        "http://localhost:3000/auth/login/abc123"
    );
}
