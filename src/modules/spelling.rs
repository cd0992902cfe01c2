//! Spelling module: one hotkey that fixes the current selection in place.

use tracing::info;

use super::{HubModule, ModuleApi};
use crate::error::HubError;

const SPELLING_PROMPT: &str = "fix";

pub(super) fn module() -> HubModule {
    HubModule {
        id: "spelling",
        title: "Spelling",
        order: 30,
        on_init: Some(on_init),
    }
}

fn on_init(api: &ModuleApi<'_>) -> Result<(), HubError> {
    let runner = api.runner.clone();
    let combo = &api.settings.hotkeys.spelling;
    api.hotkeys.register(combo, move || {
        let _ = runner.run(SPELLING_PROMPT);
    })?;
    info!(combo = %combo, "Spelling hotkey registered");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::modules::tests::Harness;

    #[test]
    fn spelling_hotkey_replaces_selection() {
        let harness = Harness::new(Settings::default());
        on_init(&harness.api()).unwrap();
        harness.hotkeys.activate().unwrap();

        let installed = harness.hook.installed();
        assert_eq!(installed.len(), 1);
        assert_eq!(installed[0].combo, "ctrl+alt+s");
        assert!(!installed[0].suppress);
        assert!(installed[0].trigger_on_release);

        harness.hook.press("ctrl+alt+s");
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
        while harness.selection.replaced().is_empty() && std::time::Instant::now() < deadline {
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        assert_eq!(harness.selection.replaced(), vec!["reply"]);
    }

    #[test]
    fn spelling_combo_conflict_is_an_error() {
        let harness = Harness::new(Settings::default());
        harness.hotkeys.register("ctrl+alt+s", || {}).unwrap();
        assert!(matches!(
            on_init(&harness.api()),
            Err(HubError::DuplicateBinding(_))
        ));
    }
}
