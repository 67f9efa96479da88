//! # Prompt presets
//!
//! Each gateway operation is driven by a small YAML-serializable preset: an
//! optional system instruction, a sampling temperature, and an output-length
//! cap. Built-in presets ship for the three operations; users can override
//! any of them by dropping a file at:
//!
//! ```text
//! <config_dir>/templates/<name>.yaml
//! ```
//!
//! where `<config_dir>` is provided by [`crate::config_dir()`].
//!
//! ## Minimal YAML example
//!
//! ```yaml
//! # ~/.config/quill/templates/improve.yaml
//! system_prompt: "You are a ruthless line editor."
//! temperature: 0.2
//! max_tokens: 2048
//! ```
//!
//! [`load_template`] falls back to the built-in preset when no file exists,
//! so `quill` works out of the box after `quill init`.

use serde::{Deserialize, Serialize};
use std::{error::Error, fs};
use tracing::debug;

/// A reusable prompt preset.
///
/// The `system_prompt` conditions the assistant (absent for contextual
/// chat, which sends the raw transcript), `temperature` controls sampling,
/// and `max_tokens` caps the reply length.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PromptTemplate {
    /// Global instruction used as the request's system field.
    pub system_prompt: Option<String>,

    /// Sampling temperature; lower is more deterministic.
    pub temperature: f32,

    /// Maximum number of tokens in the reply.
    pub max_tokens: u32,
}

/// Built-in preset for the writing-improvement operation.
pub fn improve_preset() -> PromptTemplate {
    PromptTemplate {
        system_prompt: Some(
            "You are a professional editor. Your task is to improve writing for clarity \
             and conciseness while maintaining the original meaning."
                .to_string(),
        ),
        temperature: 0.3,
        max_tokens: 2048,
    }
}

/// Built-in preset for the content-analysis operation.
pub fn analyze_preset() -> PromptTemplate {
    PromptTemplate {
        system_prompt: Some(
            "You are a content analysis expert. Provide clear, structured feedback \
             focusing on organization, clarity, and specific improvement suggestions."
                .to_string(),
        ),
        temperature: 0.1,
        max_tokens: 1024,
    }
}

/// Built-in preset for contextual chat. No system instruction; the
/// transcript alone shapes the reply.
pub fn chat_preset() -> PromptTemplate {
    PromptTemplate {
        system_prompt: None,
        temperature: 0.7,
        max_tokens: 2048,
    }
}

/// The built-in preset for a template name, if one exists.
pub fn builtin(name: &str) -> Option<PromptTemplate> {
    match name {
        "improve" => Some(improve_preset()),
        "analyze" => Some(analyze_preset()),
        "chat" => Some(chat_preset()),
        _ => None,
    }
}

/// Load a prompt preset by name from the user's config directory.
///
/// Resolves `<config_dir>/templates/<name>.yaml`; a missing file falls back
/// to the built-in preset of the same name.
///
/// # Errors
/// Returns an error if the config directory cannot be determined, if an
/// existing file cannot be parsed, or if the name is unknown and has no
/// built-in.
pub fn load_template(name: &str) -> Result<PromptTemplate, Box<dyn Error>> {
    let path = crate::config_dir()?.join(format!("templates/{name}.yaml"));

    match fs::read_to_string(&path) {
        Ok(content) => {
            debug!("Loading template: {}", path.display());
            let template: PromptTemplate = serde_yaml::from_str(&content)?;
            Ok(template)
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            builtin(name).ok_or_else(|| format!("unknown template: {name}").into())
        }
        Err(err) => Err(err.into()),
    }
}
