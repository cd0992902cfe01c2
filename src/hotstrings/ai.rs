//! AI-backed hotstring producers.
//!
//! An AI hotstring runs its prompt on the **current selection**, the same
//! input the prompt hotkeys use, and the engine injects the reply at the
//! caret. Unknown slugs and blank selections produce nothing.

use std::sync::Arc;

use tracing::debug;

use super::provider::Producer;
use crate::ai::ChatClient;
use crate::prompts::PromptCatalog;
use crate::selected_text::SelectionAccess;

#[derive(Clone)]
pub struct AiHotstrings {
    client: Arc<dyn ChatClient>,
    catalog: Arc<PromptCatalog>,
    selection: Arc<dyn SelectionAccess>,
}

impl AiHotstrings {
    pub fn new(
        client: Arc<dyn ChatClient>,
        catalog: Arc<PromptCatalog>,
        selection: Arc<dyn SelectionAccess>,
    ) -> Self {
        Self {
            client,
            catalog,
            selection,
        }
    }

    /// Producer that runs prompt `slug` when the hotstring fires.
    pub fn make_handler(&self, slug: &str) -> Producer {
        let this = self.clone();
        let slug = slug.to_string();
        Arc::new(move || {
            let prompt = match this.catalog.get_by_slug(&slug) {
                Ok(prompt) => prompt,
                Err(e) => {
                    debug!(error = %e, "AI hotstring has no prompt");
                    return Ok(String::new());
                }
            };

            let selection = this.selection.get_selection()?;
            if selection.is_blank() {
                debug!(slug = %slug, "AI hotstring skipped: nothing selected");
                return Ok(String::new());
            }

            this.client.chat(
                prompt.system_or_none(),
                &prompt.build_message(&selection.text),
                prompt.temperature,
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeChat, FakeSelection};

    fn hotstrings(chat: &Arc<FakeChat>, selection: &Arc<FakeSelection>) -> AiHotstrings {
        AiHotstrings::new(
            chat.clone(),
            Arc::new(PromptCatalog::builtin()),
            selection.clone(),
        )
    }

    #[test]
    fn runs_prompt_on_selection() {
        let chat = Arc::new(FakeChat::replying("Fixed text."));
        let selection = Arc::new(FakeSelection::with_text("fixd txt"));
        let handler = hotstrings(&chat, &selection).make_handler("fix");

        assert_eq!(handler().unwrap(), "Fixed text.");
        let calls = chat.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].system.is_some());
        assert!(calls[0].user.ends_with("fixd txt"));
        assert_eq!(calls[0].temperature, 0.0);
    }

    #[test]
    fn unknown_slug_produces_nothing() {
        let chat = Arc::new(FakeChat::replying("unused"));
        let selection = Arc::new(FakeSelection::with_text("text"));
        let handler = hotstrings(&chat, &selection).make_handler("nope");
        assert_eq!(handler().unwrap(), "");
        assert!(chat.calls().is_empty());
        assert_eq!(selection.reads(), 0);
    }

    #[test]
    fn blank_selection_skips_the_call() {
        let chat = Arc::new(FakeChat::replying("unused"));
        let selection = Arc::new(FakeSelection::with_text("   "));
        let handler = hotstrings(&chat, &selection).make_handler("clarity");
        assert_eq!(handler().unwrap(), "");
        assert!(chat.calls().is_empty());
    }
}
