//! Prompt catalog
//!
//! Prompts are ordered by `order` (stable for equal values) and looked up by
//! slug. With no catalog file configured the built-in list is used.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::HubError;

const DEFAULT_TEMPERATURE: f32 = 0.2;
const DEFAULT_ORDER: i32 = 100;

/// One reusable AI instruction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prompt {
    pub slug: String,
    pub name: String,
    pub system: String,
    pub prefix: String,
    pub suffix: String,
    pub replace: bool,
    pub temperature: f32,
    pub order: i32,
}

impl Prompt {
    /// `prefix + text + suffix`
    pub fn build_message(&self, text: &str) -> String {
        format!("{}{}{}", self.prefix, text, self.suffix)
    }

    /// The system instruction, or `None` when it is empty.
    pub fn system_or_none(&self) -> Option<&str> {
        if self.system.is_empty() {
            None
        } else {
            Some(&self.system)
        }
    }
}

/// On-disk record. Everything except `slug` is optional.
#[derive(Debug, Deserialize)]
struct PromptRecord {
    slug: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    system: String,
    #[serde(default)]
    prefix: String,
    #[serde(default)]
    suffix: String,
    #[serde(default)]
    replace: bool,
    #[serde(default = "default_temperature")]
    temperature: f32,
    #[serde(default = "default_order")]
    order: i32,
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

fn default_order() -> i32 {
    DEFAULT_ORDER
}

impl From<PromptRecord> for Prompt {
    fn from(record: PromptRecord) -> Self {
        let name = record.name.unwrap_or_else(|| title_from_slug(&record.slug));
        Prompt {
            slug: record.slug,
            name,
            system: record.system,
            prefix: record.prefix,
            suffix: record.suffix,
            replace: record.replace,
            temperature: record.temperature,
            order: record.order,
        }
    }
}

/// `code_optimize` -> `Code Optimize`
///
/// Underscores become spaces one for one. A letter is capitalized when the
/// character before it is not a cased letter, so `fix-v2` -> `Fix-V2`.
pub fn title_from_slug(slug: &str) -> String {
    let mut title = String::with_capacity(slug.len());
    let mut after_cased = false;
    for c in slug.chars() {
        if c == '_' {
            title.push(' ');
            after_cased = false;
        } else if c.is_uppercase() || c.is_lowercase() {
            if after_cased {
                title.extend(c.to_lowercase());
            } else {
                title.extend(c.to_uppercase());
            }
            after_cased = true;
        } else {
            title.push(c);
            after_cased = false;
        }
    }
    title
}

/// Ordered, slug-indexed prompt list.
#[derive(Debug, Clone)]
pub struct PromptCatalog {
    prompts: Vec<Prompt>,
    by_slug: HashMap<String, usize>,
}

impl PromptCatalog {
    /// Build a catalog, sorting by `order`. Duplicate slugs are a config error.
    pub fn new(mut prompts: Vec<Prompt>) -> Result<Self, HubError> {
        let mut seen = HashSet::new();
        for prompt in &prompts {
            if !seen.insert(prompt.slug.as_str()) {
                return Err(HubError::Config(format!(
                    "duplicate prompt slug '{}'",
                    prompt.slug
                )));
            }
        }

        // sort_by_key is stable
        prompts.sort_by_key(|p| p.order);
        let by_slug = prompts
            .iter()
            .enumerate()
            .map(|(index, p)| (p.slug.clone(), index))
            .collect();

        Ok(PromptCatalog { prompts, by_slug })
    }

    /// Load the catalog from a JSON file.
    ///
    /// The built-ins are used when `path` is `None` or names a file that does
    /// not exist. A file that exists but cannot be read or parsed is an error.
    pub fn from_path(path: Option<&Path>) -> Result<Self, HubError> {
        let Some(path) = path else {
            debug!("No prompt catalog configured, using built-in prompts");
            return Ok(Self::builtin());
        };
        if !path.exists() {
            info!(path = %path.display(), "Prompt catalog not found, using built-in prompts");
            return Ok(Self::builtin());
        }

        let raw = std::fs::read_to_string(path).map_err(|source| HubError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let records: Vec<PromptRecord> = serde_json::from_str(&raw)?;
        let catalog = Self::new(records.into_iter().map(Prompt::from).collect())?;

        info!(
            path = %path.display(),
            count = catalog.len(),
            "Loaded prompt catalog"
        );
        Ok(catalog)
    }

    /// The built-in prompts.
    pub fn builtin() -> Self {
        let prompts = default_prompts();
        let by_slug = prompts
            .iter()
            .enumerate()
            .map(|(index, p)| (p.slug.clone(), index))
            .collect();
        // default_prompts() is already in order with unique slugs
        PromptCatalog { prompts, by_slug }
    }

    pub fn all(&self) -> &[Prompt] {
        &self.prompts
    }

    pub fn get(&self, index: usize) -> Option<&Prompt> {
        self.prompts.get(index)
    }

    pub fn get_by_slug(&self, slug: &str) -> Result<&Prompt, HubError> {
        self.by_slug
            .get(slug)
            .map(|&index| &self.prompts[index])
            .ok_or_else(|| HubError::NotFound(slug.to_string()))
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }
}

fn prompt(
    slug: &str,
    name: &str,
    system: &str,
    prefix: &str,
    replace: bool,
    temperature: f32,
    order: i32,
) -> Prompt {
    Prompt {
        slug: slug.to_string(),
        name: name.to_string(),
        system: system.to_string(),
        prefix: prefix.to_string(),
        suffix: String::new(),
        replace,
        temperature,
        order,
    }
}

/// Built-in prompt list, already sorted by `order`.
pub fn default_prompts() -> Vec<Prompt> {
    vec![
        prompt(
            "fix",
            "Fix spelling & grammar",
            "You are an English spelling corrector and grammar improver. Reply ONLY with the corrected text\u{2014}no explanations.",
            "Correct the spelling (American English) and grammar of the following:\n\n",
            true,
            0.0,
            10,
        ),
        prompt(
            "clarity",
            "Rewrite for clarity",
            "",
            "Improve the writing for clarity and conciseness and correct spelling and grammar:\n\n",
            true,
            0.2,
            20,
        ),
        prompt(
            "shorten",
            "Make shorter",
            "",
            "Make the following shorter while preserving meaning:\n\n",
            true,
            0.2,
            30,
        ),
        prompt(
            "lengthen",
            "Make longer",
            "",
            "Expand the following text with more detail while staying on-topic:\n\n",
            true,
            0.7,
            40,
        ),
        prompt(
            "professional",
            "More professional",
            "",
            "Rewrite the following to sound professional and polished:\n\n",
            true,
            0.2,
            50,
        ),
        prompt(
            "simplify",
            "Simplify language",
            "",
            "Simplify the language of the following text so it is accessible to a wide audience:\n\n",
            true,
            0.2,
            60,
        ),
        prompt(
            "proofread",
            "Proofread (bullet suggestions)",
            "You are an English proofreader. Review the text and return a detailed bullet list of issues and suggested fixes with reasons.",
            "My text is the following:\n\n",
            false,
            0.0,
            70,
        ),
        prompt(
            "summarize",
            "Summarize",
            "",
            "Summarize the following text:\n\n",
            false,
            0.2,
            80,
        ),
        prompt(
            "explain",
            "Explain",
            "",
            "Explain the following text in simple terms:\n\n",
            false,
            0.2,
            90,
        ),
        prompt(
            "action_items",
            "Find action items",
            "",
            "Identify any action items in the following text and present them as bullet points after a one-sentence summary:\n\n",
            false,
            0.2,
            100,
        ),
        prompt(
            "code_optimize",
            "Code \u{2013} Optimize",
            "You are an assistant to a software engineer. Given code, optimize for time and space complexity and explain the changes.",
            "Improve and explain how to optimize the following code:\n\n",
            false,
            0.2,
            110,
        ),
    ]
}
