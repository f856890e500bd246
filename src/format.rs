use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;

/// Output format for `list` and `read`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
#[clap(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON - machine-parseable
    Json,
}

impl OutputFormat {
    /// Render `data` in this format. `text` supplies the human rendering.
    pub fn render<T: Serialize>(self, data: &T, text: impl FnOnce(&T) -> String) -> Result<String> {
        match self {
            Self::Text => Ok(text(data)),
            Self::Json => {
                let mut json = serde_json::to_string_pretty(data).context("JSON serialization failed")?;
                json.push('\n');
                Ok(json)
            }
        }
    }
}
