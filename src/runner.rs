//! Selection-triggered prompt execution
//!
//! A hotkey reads the current selection, a worker runs the prompt through
//! the chat client, and the reply either replaces the selection or is shown
//! out-of-band. Unknown slugs and blank selections end the flow silently.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::ai::ChatClient;
use crate::prompts::PromptCatalog;
use crate::selected_text::SelectionAccess;
use crate::tasks::{TaskHandle, TaskSpawner};

/// Where results that do not replace the selection go.
pub trait ResultSink: Send + Sync {
    fn show_text(&self, title: &str, text: &str);
}

/// Prints results to stdout in a framed block.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleResultSink;

impl ResultSink for ConsoleResultSink {
    fn show_text(&self, title: &str, text: &str) {
        info!(title, text_len = text.len(), "Showing result");
        let rule = "─".repeat(title.chars().count().clamp(20, 72));
        println!("\n{}\n{}\n{}\n{}\n{}", rule, title, rule, text.trim_end(), rule);
    }
}

#[derive(Clone)]
pub struct PromptRunner {
    client: Arc<dyn ChatClient>,
    catalog: Arc<PromptCatalog>,
    selection: Arc<dyn SelectionAccess>,
    sink: Arc<dyn ResultSink>,
    spawner: TaskSpawner,
}

impl PromptRunner {
    pub fn new(
        client: Arc<dyn ChatClient>,
        catalog: Arc<PromptCatalog>,
        selection: Arc<dyn SelectionAccess>,
        sink: Arc<dyn ResultSink>,
        spawner: TaskSpawner,
    ) -> Self {
        Self {
            client,
            catalog,
            selection,
            sink,
            spawner,
        }
    }

    pub fn catalog(&self) -> &Arc<PromptCatalog> {
        &self.catalog
    }

    /// Run prompt `slug` on the current selection.
    ///
    /// Returns the worker handle, or `None` when nothing was started.
    #[instrument(skip(self))]
    pub fn run(&self, slug: &str) -> Option<TaskHandle> {
        let prompt = match self.catalog.get_by_slug(slug) {
            Ok(prompt) => prompt.clone(),
            Err(e) if e.is_quiet() => {
                debug!(error = %e, "Ignoring prompt request");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Prompt lookup failed");
                return None;
            }
        };

        let selection = match self.selection.get_selection() {
            Ok(selection) => selection,
            Err(e) => {
                warn!(slug, error = %e, "Could not read selection");
                return None;
            }
        };
        if selection.is_blank() {
            debug!(slug, "Nothing selected");
            return None;
        }

        let client = Arc::clone(&self.client);
        let selection_access = Arc::clone(&self.selection);
        let sink = Arc::clone(&self.sink);
        self.spawner.spawn(&format!("prompt-{}", prompt.slug), move |token| {
            info!(slug = %prompt.slug, "Running prompt");
            let reply = client.chat(
                prompt.system_or_none(),
                &prompt.build_message(&selection.text),
                prompt.temperature,
            )?;

            if reply.trim().is_empty() {
                debug!(slug = %prompt.slug, "Prompt returned nothing");
                return Ok(());
            }
            if token.is_cancelled() {
                debug!(slug = %prompt.slug, "Shutting down, dropping result");
                return Ok(());
            }

            if prompt.replace {
                selection_access.replace_selection(&reply)?;
                info!(slug = %prompt.slug, "Replaced selection");
            } else {
                sink.show_text(&prompt.name, &reply);
            }
            Ok(())
        })
    }
}
