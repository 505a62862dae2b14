//! Loads the persona the agent speaks as: a display name plus two background
//! texts (a short summary and a longer profile) read from a resources
//! directory, rendered into the system prompt through a tera template.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tera::{Context as TeraContext, Tera};

const SYSTEM_TEMPLATE: &str = "system.md";

/// Get the path to the prompts directory
fn prompts_dir() -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    PathBuf::from(manifest_dir).join("src").join("prompts")
}

/// Render a tera template string against any serializable context
pub fn render_prompt<T: Serialize>(template: &str, context_data: &T) -> Result<String> {
    let mut tera = Tera::default();
    tera.add_raw_template("inline_template", template)?;
    let context = TeraContext::from_serialize(context_data)?;
    let rendered = tera.render("inline_template", &context)?;
    Ok(rendered)
}

#[derive(Debug, Clone, Serialize)]
pub struct Persona {
    pub name: String,
    pub summary: String,
    pub profile: String,
}

impl Persona {
    /// Read `summary.txt` and `profile.txt` from the resources directory.
    pub fn load(resources: &Path, name: &str) -> Result<Self> {
        let summary_path = resources.join("summary.txt");
        let summary = fs::read_to_string(&summary_path)
            .with_context(|| format!("failed to read {}", summary_path.display()))?;

        let profile_path = resources.join("profile.txt");
        let profile = fs::read_to_string(&profile_path)
            .with_context(|| format!("failed to read {}", profile_path.display()))?;

        Ok(Self {
            name: name.to_string(),
            summary,
            profile,
        })
    }

    /// Render the system prompt: role framing, the standing tool
    /// instructions, then the background sections.
    pub fn system_prompt(&self) -> Result<String> {
        let template_path = prompts_dir().join(SYSTEM_TEMPLATE);
        let template = fs::read_to_string(&template_path)
            .with_context(|| format!("failed to read {}", template_path.display()))?;
        render_prompt(&template, self)
    }
}
