use anyhow::Result;
use std::path::{Path, PathBuf};

/// Route handler whose welcome email inlines the logo as a data URI.
pub const DEFAULT_TARGET: &str = "server/routes/auth.js";

pub const DEFAULT_ALT_TEXT: &str = "שוקו ביטוח";

pub const DEFAULT_STYLE: &str = "width: 24px; height: 24px;";

pub const DEFAULT_LOGO_URL: &str = "https://contractor-crm-api.onrender.com/logo-256.png";

/// Fixed parameters of the logo rewrite.
///
/// Only `target` can be changed from the command line. The tag attributes and
/// the hosted URL always come from the defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteConfig {
    pub target: PathBuf,
    pub alt_text: String,
    pub style: String,
    pub logo_url: String,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            target: PathBuf::from(DEFAULT_TARGET),
            alt_text: DEFAULT_ALT_TEXT.to_string(),
            style: DEFAULT_STYLE.to_string(),
            logo_url: DEFAULT_LOGO_URL.to_string(),
        }
    }
}

impl RewriteConfig {
    pub fn with_target(target: &Path) -> Self {
        Self {
            target: target.to_path_buf(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.target.as_os_str().is_empty() {
            anyhow::bail!("Target path cannot be empty");
        }
        if self.alt_text.is_empty() {
            anyhow::bail!("Image alt text cannot be empty");
        }
        if self.style.is_empty() {
            anyhow::bail!("Image style cannot be empty");
        }
        if !self.logo_url.starts_with("https://") {
            anyhow::bail!("Logo URL must be an https URL, got: {}", self.logo_url);
        }
        if self.logo_url.contains('"') {
            anyhow::bail!("Logo URL cannot contain a double quote");
        }

        Ok(())
    }

    /// Regex source for the inlined tag. Everything but the base64 payload is
    /// matched literally.
    pub fn pattern(&self) -> String {
        format!(
            r#"<img src="data:image/png;base64,([^"]*)" alt="{}" style="{}" />"#,
            regex::escape(&self.alt_text),
            regex::escape(&self.style)
        )
    }

    pub fn replacement(&self) -> String {
        format!(
            r#"<img src="{}" alt="{}" style="{}" />"#,
            self.logo_url, self.alt_text, self.style
        )
    }

    /// Name shown in the confirmation line, e.g. `auth.js`.
    pub fn display_name(&self) -> String {
        self.target
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| self.target.display().to_string())
    }
}
