use thiserror::Error;
use tracing::warn;

use crate::shortcuts::ShortcutParseError;

/// Domain-specific errors for AI Hub
#[derive(Error, Debug)]
pub enum HubError {
    #[error("prompt '{0}' not found")]
    NotFound(String),

    #[error("hotkey '{0}' is already registered")]
    DuplicateBinding(String),

    #[error("hotstring trigger '{0}' is already registered")]
    DuplicateTrigger(String),

    #[error("hotstring trigger must not be empty")]
    EmptyTrigger,

    #[error("invalid hotkey '{combo}': {source}")]
    InvalidCombo {
        combo: String,
        #[source]
        source: ShortcutParseError,
    },

    #[error("expansion provider for '{trigger}' failed: {message}")]
    ProviderFailure { trigger: String, message: String },

    #[error("input hook error: {0}")]
    Hook(String),

    #[error("failed to activate {} hotkey(s): {}", .0.len(), format_failures(.0))]
    Activation(Vec<(String, String)>),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse prompt catalog: {0}")]
    CatalogParse(#[from] serde_json::Error),
}

fn format_failures(failures: &[(String, String)]) -> String {
    failures
        .iter()
        .map(|(combo, reason)| format!("{} ({})", combo, reason))
        .collect::<Vec<_>>()
        .join(", ")
}

impl HubError {
    /// Errors the user never sees. Callers drop these without a warning.
    pub fn is_quiet(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Extension trait for silent error logging with caller location tracking.
/// Use when the operation is recoverable and user doesn't need to know.
///
/// # Examples
///
/// ```ignore
/// use ai_hub::error::ResultExt;
///
/// // Log and continue if a snippet cannot be registered
/// register_snippets(&engine, &snippets).warn_on_err();
/// ```
pub trait ResultExt<T> {
    /// Log as warning with caller location and return None. Use for expected failures.
    fn warn_on_err(self) -> Option<T>;
}

impl<T, E: std::fmt::Debug> ResultExt<T> for std::result::Result<T, E> {
    #[track_caller]
    fn warn_on_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                let caller = std::panic::Location::caller();
                warn!(
                    error = ?error,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation had warning"
                );
                None
            }
        }
    }
}

/// Turn a caught panic payload into a printable message.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
