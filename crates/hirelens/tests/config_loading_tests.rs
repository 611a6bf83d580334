//! Table-driven tests for configuration loading and validation.

use std::io::Write;

use hirelens::config::{load_config, load_config_from_str};

/// Represents a single config loading test case.
struct ConfigTestCase {
    /// Test case name for identification.
    name: &'static str,
    /// The config JSON content to test.
    config_json: &'static str,
    /// Whether loading should succeed.
    should_succeed: bool,
    /// Expected error substring (if should_succeed is false).
    expected_error: Option<&'static str>,
}

const JSON_CONFIG_TESTS: &[ConfigTestCase] = &[
    ConfigTestCase {
        name: "valid_minimal",
        config_json: r#"{ "version": "1.0" }"#,
        should_succeed: true,
        expected_error: None,
    },
    ConfigTestCase {
        name: "valid_full",
        config_json: r#"{
            "$schema": "https://hirelens.dev/schema/config-v1.json",
            "version": "1.0",
            "database_path": "/var/lib/hirelens/hirelens.db",
            "storage_directory": "/var/lib/hirelens/storage",
            "worker_count": 4,
            "extraction": { "encodings": ["utf-8", "latin-1"] },
            "intake": { "max_files": 20, "max_file_bytes": 5242880 },
            "github": {
                "enabled": true,
                "base_url": "https://api.github.com",
                "token_env_var": "GITHUB_TOKEN",
                "max_repos": 50,
                "timeout_secs": 15
            },
            "ai": {
                "base_url": "https://api.openai.com/v1",
                "model": "gpt-4o-mini",
                "api_key_file": "~/.hirelens/openai.key",
                "max_attempts": 5,
                "retry_delay_secs": 2,
                "timeout_secs": 60,
                "resume_char_budget": 8000
            },
            "telegram": {
                "enabled": true,
                "bot_token_env_var": "TELEGRAM_BOT_TOKEN",
                "chat_id": "-1001234567890",
                "details_base_url": "https://hr.example.com"
            },
            "retry": { "max_attempts": 2, "delay_secs": 120 }
        }"#,
        should_succeed: true,
        expected_error: None,
    },
    ConfigTestCase {
        name: "valid_github_disabled",
        config_json: r#"{ "version": "1.0", "github": { "enabled": false } }"#,
        should_succeed: true,
        expected_error: None,
    },
    ConfigTestCase {
        name: "valid_null_secrets",
        config_json: r#"{ "version": "1.0", "ai": { "api_key": null, "api_key_env_var": null } }"#,
        should_succeed: true,
        expected_error: None,
    },
    ConfigTestCase {
        name: "invalid_not_json",
        config_json: r#"{ "version": "1.0", "#,
        should_succeed: false,
        expected_error: None,
    },
    ConfigTestCase {
        name: "invalid_missing_version",
        config_json: r#"{ "worker_count": 2 }"#,
        should_succeed: false,
        expected_error: Some("Schema validation failed"),
    },
    ConfigTestCase {
        name: "invalid_unsupported_version",
        config_json: r#"{ "version": "0.9" }"#,
        should_succeed: false,
        expected_error: Some("Schema validation failed"),
    },
    ConfigTestCase {
        name: "invalid_unknown_top_level_field",
        config_json: r#"{ "version": "1.0", "input_directory": "/input" }"#,
        should_succeed: false,
        expected_error: Some("Schema validation failed"),
    },
    ConfigTestCase {
        name: "invalid_unknown_nested_field",
        config_json: r#"{ "version": "1.0", "ai": { "temperature": 0.2 } }"#,
        should_succeed: false,
        expected_error: Some("Schema validation failed"),
    },
    ConfigTestCase {
        name: "invalid_zero_workers",
        config_json: r#"{ "version": "1.0", "worker_count": 0 }"#,
        should_succeed: false,
        expected_error: Some("Schema validation failed"),
    },
    ConfigTestCase {
        name: "invalid_empty_encodings",
        config_json: r#"{ "version": "1.0", "extraction": { "encodings": [] } }"#,
        should_succeed: false,
        expected_error: Some("Schema validation failed"),
    },
    ConfigTestCase {
        name: "invalid_unknown_encoding",
        config_json: r#"{ "version": "1.0", "extraction": { "encodings": ["utf-8", "koi8-r"] } }"#,
        should_succeed: false,
        expected_error: Some("Unknown text encoding 'koi8-r'"),
    },
    ConfigTestCase {
        name: "invalid_ai_base_url_scheme",
        config_json: r#"{ "version": "1.0", "ai": { "base_url": "ftp://models.example.com" } }"#,
        should_succeed: false,
        expected_error: Some("Schema validation failed"),
    },
    ConfigTestCase {
        name: "invalid_retry_attempts",
        config_json: r#"{ "version": "1.0", "retry": { "max_attempts": 0 } }"#,
        should_succeed: false,
        expected_error: Some("Schema validation failed"),
    },
    ConfigTestCase {
        name: "invalid_telegram_without_chat",
        config_json: r#"{ "version": "1.0", "telegram": { "enabled": true } }"#,
        should_succeed: false,
        expected_error: Some("telegram.chat_id is required"),
    },
    ConfigTestCase {
        name: "invalid_telegram_blank_chat",
        config_json: r#"{ "version": "1.0", "telegram": { "enabled": true, "chat_id": "  " } }"#,
        should_succeed: false,
        expected_error: Some("telegram.chat_id is required"),
    },
];

#[test]
fn test_json_config_loading() {
    for test_case in JSON_CONFIG_TESTS {
        let result = load_config_from_str(test_case.config_json);

        if test_case.should_succeed {
            assert!(
                result.is_ok(),
                "Test '{}': Expected success but got error: {:?}",
                test_case.name,
                result.err()
            );
        } else {
            assert!(
                result.is_err(),
                "Test '{}': Expected error but got success",
                test_case.name
            );

            if let Some(expected_error) = test_case.expected_error {
                let error_msg = result.err().unwrap().to_string();
                assert!(
                    error_msg.contains(expected_error),
                    "Test '{}': Expected error containing '{}', got '{}'",
                    test_case.name,
                    expected_error,
                    error_msg
                );
            }
        }
    }
}

#[test]
fn test_valid_config_field_values() {
    let full = JSON_CONFIG_TESTS
        .iter()
        .find(|t| t.name == "valid_full")
        .expect("valid_full case");
    let config = load_config_from_str(full.config_json).expect("Should load config");

    assert_eq!(config.worker_count, 4);
    assert_eq!(config.extraction.encodings, vec!["utf-8", "latin-1"]);
    assert_eq!(config.intake.max_files, 20);
    assert_eq!(config.github.max_repos, 50);
    assert_eq!(config.github.token_env_var.as_deref(), Some("GITHUB_TOKEN"));
    assert_eq!(config.ai.model, "gpt-4o-mini");
    assert_eq!(config.ai.resume_char_budget, 8000);
    assert!(config.telegram.enabled);
    assert_eq!(config.telegram.chat_id.as_deref(), Some("-1001234567890"));
    assert_eq!(config.retry.max_attempts, 2);
    assert_eq!(config.retry.delay_secs, 120);
    assert_eq!(
        config.database_path(),
        std::path::PathBuf::from("/var/lib/hirelens/hirelens.db")
    );
}

#[test]
fn test_config_defaults_applied() {
    let config = load_config_from_str(r#"{ "version": "1.0" }"#).expect("Should load config");

    assert!(config.worker_count >= 1);
    assert_eq!(config.extraction.encodings, vec!["utf-8", "latin-1", "windows-1252"]);
    assert!(config.github.enabled);
    assert_eq!(config.github.base_url, "https://api.github.com");
    assert_eq!(config.ai.base_url, "https://api.openai.com/v1");
    assert_eq!(config.ai.max_attempts, 3);
    assert!(!config.telegram.enabled);
    assert_eq!(config.telegram.base_url, "https://api.telegram.org");
    assert_eq!(config.retry.max_attempts, 3);
    assert_eq!(config.retry.delay_secs, 60);
}

#[test]
fn test_load_config_from_file() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(file, r#"{{ "version": "1.0", "worker_count": 3 }}"#).expect("write config");

    let config = load_config(file.path()).expect("Should load config");
    assert_eq!(config.worker_count, 3);

    let missing = load_config(file.path().with_extension("missing"));
    assert!(missing.is_err());
}
