//! Default configuration values
//!
//! All constants used throughout the config module are defined here.

/// Default hotkeys
pub const DEFAULT_TOGGLE_HOTSTRINGS_HOTKEY: &str = "ctrl+alt+h";
pub const DEFAULT_SPELLING_HOTKEY: &str = "ctrl+alt+s";
pub const DEFAULT_QUIT_HOTKEY: &str = "ctrl+alt+q";

/// Default hotstring engine settings
pub const DEFAULT_BUFFER_SIZE: usize = 32;
pub const DEFAULT_HOTSTRINGS_ENABLED: bool = true;

/// Default AI client settings
pub const DEFAULT_AI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_AI_TIMEOUT_SECS: u64 = 60;

/// Default text injection timing
pub const DEFAULT_KEY_DELAY_MS: u64 = 5;
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 50;
pub const DEFAULT_RESTORE_CLIPBOARD: bool = true;

/// Prompt hotstrings registered by the prompts module: (trigger, prompt slug)
pub const DEFAULT_PROMPT_HOTSTRINGS: &[(&str, &str)] = &[
    (";fix", "fix"),
    (";clar", "clarity"),
    (";short", "shorten"),
    (";long", "lengthen"),
];

/// Quick prompt shortcuts registered by the prompts module: (combo, prompt slug)
pub const DEFAULT_PROMPT_SHORTCUTS: &[(&str, &str)] = &[
    ("ctrl+alt+1", "summarize"),
    ("ctrl+alt+2", "explain"),
    ("ctrl+alt+3", "action_items"),
];

/// Default config file location
pub const DEFAULT_CONFIG_PATH: &str = "~/.ai-hub/config.json";

/// Environment variable overriding the config file location
pub const CONFIG_PATH_ENV: &str = "AI_HUB_CONFIG";
