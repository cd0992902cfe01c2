use super::*;
use std::io::Write;

#[test]
fn test_default_settings() {
    let settings = Settings::default();
    assert_eq!(settings.hotkeys.toggle_hotstrings, "ctrl+alt+h");
    assert_eq!(settings.hotkeys.spelling, "ctrl+alt+s");
    assert_eq!(settings.hotkeys.quit, "ctrl+alt+q");
    assert_eq!(settings.hotstrings.buffer_size, DEFAULT_BUFFER_SIZE);
    assert!(settings.hotstrings.enabled_by_default);
    assert_eq!(settings.ai.model, "gpt-4o-mini");
    assert_eq!(settings.ai.base_url, None);
    assert!(settings.snippets.is_empty());
    assert_eq!(settings.injector.method, InjectMethod::Paste);
}

#[test]
fn test_default_prompt_mappings() {
    let settings = Settings::default();
    let hotstrings: Vec<(&str, &str)> = settings
        .prompt_hotstrings
        .iter()
        .map(|p| (p.trigger.as_str(), p.slug.as_str()))
        .collect();
    assert_eq!(hotstrings, DEFAULT_PROMPT_HOTSTRINGS);

    let shortcuts: Vec<(&str, &str)> = settings
        .prompt_shortcuts
        .iter()
        .map(|p| (p.combo.as_str(), p.slug.as_str()))
        .collect();
    assert_eq!(shortcuts, DEFAULT_PROMPT_SHORTCUTS);
}

#[test]
fn test_empty_object_uses_defaults() {
    let settings: Settings = serde_json::from_str("{}").unwrap();
    assert_eq!(settings, Settings::default());
}

#[test]
fn test_partial_section_keeps_other_defaults() {
    let json = r#"{
        "hotkeys": { "spelling": "ctrl+shift+s" },
        "hotstrings": { "bufferSize": 8 },
        "injector": { "method": "type", "keyDelayMs": 12 }
    }"#;
    let settings: Settings = serde_json::from_str(json).unwrap();
    assert_eq!(settings.hotkeys.spelling, "ctrl+shift+s");
    assert_eq!(settings.hotkeys.toggle_hotstrings, "ctrl+alt+h");
    assert_eq!(settings.hotstrings.buffer_size, 8);
    assert!(settings.hotstrings.enabled_by_default);
    assert_eq!(settings.injector.method, InjectMethod::Type);
    assert_eq!(settings.injector.key_delay_ms, 12);
    assert_eq!(settings.injector.settle_delay_ms, 50);
    assert!(settings.injector.restore_clipboard);
}

#[test]
fn test_explicit_empty_prompt_lists_disable_defaults() {
    let json = r#"{ "promptHotstrings": [], "promptShortcuts": [] }"#;
    let settings: Settings = serde_json::from_str(json).unwrap();
    assert!(settings.prompt_hotstrings.is_empty());
    assert!(settings.prompt_shortcuts.is_empty());
}

#[test]
fn test_snippets_deserialize() {
    let json = r#"{ "snippets": [ { "trigger": ";addr", "text": "1 Main St" } ] }"#;
    let settings: Settings = serde_json::from_str(json).unwrap();
    assert_eq!(
        settings.snippets,
        vec![SnippetConfig {
            trigger: ";addr".to_string(),
            text: "1 Main St".to_string(),
        }]
    );
}

#[test]
fn test_serialization_uses_camel_case() {
    let json = serde_json::to_string(&Settings::default()).unwrap();
    assert!(json.contains("\"toggleHotstrings\""));
    assert!(json.contains("\"bufferSize\""));
    assert!(json.contains("\"promptShortcuts\""));
    assert!(!json.contains("baseUrl"));
}

#[test]
fn test_prompts_path_expands_tilde() {
    let paths = PathSettings {
        prompts: Some("~/prompts.json".to_string()),
    };
    let expanded = paths.prompts_path().unwrap();
    assert!(!expanded.to_string_lossy().starts_with('~'));
    assert!(expanded.ends_with("prompts.json"));
    assert_eq!(PathSettings::default().prompts_path(), None);
}

#[test]
fn test_explicit_config_path_wins() {
    let path = std::path::Path::new("/tmp/custom.json");
    assert_eq!(config_path(Some(path)), path.to_path_buf());
}

#[test]
fn test_load_missing_file_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.json");
    let settings = load_config_from(&path).unwrap();
    assert_eq!(settings, Settings::default());
}

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{ "ai": {{ "model": "gpt-4o", "timeoutSecs": 5 }} }}"#).unwrap();
    let settings = load_config_from(file.path()).unwrap();
    assert_eq!(settings.ai.model, "gpt-4o");
    assert_eq!(settings.ai.timeout_secs, 5);
}

#[test]
fn test_load_malformed_file_is_config_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{{ not json").unwrap();
    let err = load_config_from(file.path()).unwrap_err();
    assert!(matches!(err, crate::error::HubError::Config(_)));

    // the lenient loader falls back instead
    assert_eq!(load_config(Some(file.path())), Settings::default());
}

#[test]
fn test_zero_buffer_size_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{ "hotstrings": {{ "bufferSize": 0 }} }}"#).unwrap();
    assert!(load_config_from(file.path()).is_err());
}
