//! AI Hub - AI text transformations triggered from anywhere on the desktop
//!
//! Global hotkeys run prompts on the current selection; hotstrings expand
//! typed abbreviations into literal, computed or AI-generated text.

pub mod ai;
pub mod cli;
pub mod config;
pub mod error;
pub mod hook;
pub mod hotkeys;
pub mod hotstrings;
pub mod hub;
pub mod logging;
pub mod modules;
pub mod prompts;
pub mod runner;
pub mod selected_text;
pub mod shortcuts;
pub mod tasks;
pub mod text_injector;

#[cfg(test)]
mod test_support;
