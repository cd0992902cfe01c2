//! Prompts module: AI hotstrings and quick prompt shortcuts.
//!
//! A bad entry in the config is logged and skipped so the rest still load.

use tracing::{info, warn};

use super::{HubModule, ModuleApi};
use crate::error::HubError;
use crate::hotstrings::ExpansionProvider;

pub(super) fn module() -> HubModule {
    HubModule {
        id: "prompts",
        title: "Prompts",
        order: 20,
        on_init: Some(on_init),
    }
}

fn on_init(api: &ModuleApi<'_>) -> Result<(), HubError> {
    register_prompt_hotstrings(api);
    register_prompt_shortcuts(api);
    Ok(())
}

fn register_prompt_hotstrings(api: &ModuleApi<'_>) {
    for entry in &api.settings.prompt_hotstrings {
        let handler = api.ai_hotstrings.make_handler(&entry.slug);
        match api
            .hotstrings
            .register(&entry.trigger, ExpansionProvider::Async(handler))
        {
            Ok(()) => info!(trigger = %entry.trigger, slug = %entry.slug, "Prompt hotstring registered"),
            Err(e) => warn!(trigger = %entry.trigger, error = %e, "Skipping prompt hotstring"),
        }
    }
}

fn register_prompt_shortcuts(api: &ModuleApi<'_>) {
    for entry in &api.settings.prompt_shortcuts {
        let runner = api.runner.clone();
        let slug = entry.slug.clone();
        let result = api.hotkeys.register(&entry.combo, move || {
            // Detached; the worker logs its own outcome
            let _ = runner.run(&slug);
        });
        match result {
            Ok(()) => info!(combo = %entry.combo, slug = %entry.slug, "Prompt shortcut registered"),
            Err(e) => warn!(combo = %entry.combo, error = %e, "Skipping prompt shortcut"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PromptHotstring, PromptShortcut, Settings};
    use crate::hook::KeystrokeEvent;
    use crate::modules::tests::Harness;
    use crate::tasks::JobState;

    #[test]
    fn registers_configured_hotstrings_as_async() {
        let harness = Harness::new(Settings::default());
        on_init(&harness.api()).unwrap();

        let triggers = harness.hotstrings.list_triggers();
        assert_eq!(
            triggers,
            vec![
                (";clar".to_string(), "async"),
                (";fix".to_string(), "async"),
                (";long".to_string(), "async"),
                (";short".to_string(), "async"),
            ]
        );
    }

    #[test]
    fn prompt_hotstring_runs_prompt_on_selection() {
        let harness = Harness::new(Settings::default());
        on_init(&harness.api()).unwrap();

        let handles: Vec<_> = ";fix"
            .chars()
            .filter_map(|c| harness.hotstrings.handle_event(KeystrokeEvent::Char(c)))
            .collect();
        assert_eq!(handles.len(), 1);
        for handle in handles {
            assert_eq!(handle.join(), JobState::Completed);
        }
        assert_eq!(harness.selection.reads(), 1);
        assert!(harness.chat.calls()[0].user.ends_with("selected"));
    }

    #[test]
    fn shortcut_press_runs_prompt() {
        let harness = Harness::new(Settings::default());
        on_init(&harness.api()).unwrap();
        harness.hotkeys.activate().unwrap();
        assert_eq!(harness.hook.install_count(), 3);

        harness.hook.press("ctrl+alt+2");
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
        while harness.chat.calls().is_empty() && std::time::Instant::now() < deadline {
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        let calls = harness.chat.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].user.starts_with("Explain"));
    }

    #[test]
    fn bad_entries_are_skipped() {
        let mut settings = Settings::default();
        settings.prompt_hotstrings = vec![
            PromptHotstring {
                trigger: ";a".into(),
                slug: "fix".into(),
            },
            PromptHotstring {
                trigger: ";a".into(),
                slug: "clarity".into(),
            },
        ];
        settings.prompt_shortcuts = vec![
            PromptShortcut {
                combo: "ctrl+alt+nope".into(),
                slug: "explain".into(),
            },
            PromptShortcut {
                combo: "ctrl+alt+4".into(),
                slug: "summarize".into(),
            },
        ];
        let harness = Harness::new(settings);
        on_init(&harness.api()).unwrap();
        assert_eq!(harness.hotstrings.trigger_count(), 1);
        assert_eq!(harness.hotkeys.pending_count(), 1);
    }
}
