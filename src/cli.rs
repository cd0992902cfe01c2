//! Command-line interface for ai-hub.

use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use crate::ai::{ChatClient, OpenAiProvider, ProviderConfig};
use crate::config::{load_config, Settings};
use crate::error::HubError;
use crate::hub::{Hub, HubServices};
use crate::prompts::PromptCatalog;

/// ai-hub - AI text transformations from anywhere on the desktop
#[derive(Parser, Debug)]
#[command(name = "ai-hub")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Config file (default: $AI_HUB_CONFIG or ~/.ai-hub/config.json)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Install hotkeys and hotstrings and run until the quit hotkey
    Run,
    /// List the prompt catalog in order
    Prompts,
    /// Run a prompt on stdin and print the reply
    Apply {
        /// Prompt slug, e.g. `fix` or `summarize`
        slug: String,
    },
}

impl Cli {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Run)
    }

    pub fn settings(&self) -> Settings {
        load_config(self.config.as_deref())
    }
}

/// Run the selected subcommand to completion.
pub fn execute(cli: &Cli) -> Result<()> {
    let settings = cli.settings();
    match cli.command() {
        Command::Run => run_hub(settings),
        Command::Prompts => list_prompts(&settings),
        Command::Apply { slug } => {
            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .context("failed to read stdin")?;
            let client = OpenAiProvider::new(ProviderConfig::from_environment(&settings.ai));
            let catalog = load_catalog(&settings)?;
            let reply = apply_prompt(&catalog, &client, &slug, &input)?;
            println!("{}", reply.trim_end());
            Ok(())
        }
    }
}

fn load_catalog(settings: &Settings) -> Result<PromptCatalog> {
    PromptCatalog::from_path(settings.paths.prompts_path().as_deref())
        .context("failed to load prompt catalog")
}

fn run_hub(settings: Settings) -> Result<()> {
    let quit_combo = settings.hotkeys.quit.clone();
    let (services, system_hook) = HubServices::system(&settings)?;
    let hub = Hub::new(settings, services)?;

    hub.init()?;
    match hub.start() {
        Ok(()) => {}
        // Partial activation still leaves a usable hub
        Err(e @ HubError::Activation(_)) => {
            warn!(error = %e, "Some hotkeys could not be installed");
            eprintln!("warning: {}", e);
        }
        Err(e) => {
            hub.shutdown();
            system_hook.shutdown();
            return Err(e).context("failed to start input hooks");
        }
    }

    info!(quit = %quit_combo, "ai-hub running");
    println!("ai-hub running. Press {} to quit.", quit_combo);
    hub.wait_for_quit();

    hub.shutdown();
    system_hook.shutdown();
    Ok(())
}

fn list_prompts(settings: &Settings) -> Result<()> {
    let catalog = load_catalog(settings)?;
    for prompt in catalog.all() {
        println!(
            "{:<16} {:<32} {:<8} {:.1}",
            prompt.slug,
            prompt.name,
            if prompt.replace { "replace" } else { "show" },
            prompt.temperature
        );
    }
    Ok(())
}

/// Run prompt `slug` over `input` and return the reply.
pub fn apply_prompt(
    catalog: &PromptCatalog,
    client: &dyn ChatClient,
    slug: &str,
    input: &str,
) -> Result<String> {
    let prompt = catalog.get_by_slug(slug)?;
    if input.trim().is_empty() {
        bail!("no input on stdin");
    }
    client
        .chat(
            prompt.system_or_none(),
            &prompt.build_message(input),
            prompt.temperature,
        )
        .inspect_err(|e| error!(slug, error = %e, "Prompt failed"))
}
