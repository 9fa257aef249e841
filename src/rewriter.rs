use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use regex::{NoExpand, Regex};
use std::borrow::Cow;

use crate::config::RewriteConfig;

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

/// Output of a single rewrite pass.
#[derive(Debug)]
pub struct Rewrite<'a> {
    /// Borrowed from the input when nothing matched.
    pub content: Cow<'a, str>,
    pub replacements: usize,
}

impl Rewrite<'_> {
    pub fn changed(&self) -> bool {
        matches!(self.content, Cow::Owned(_))
    }
}

/// One inlined logo tag found in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    /// Byte offset of the opening `<img` in the document
    pub offset: usize,
    pub payload_len: usize,
    /// `None` when the payload is not valid standard base64
    pub decoded: Option<Vec<u8>>,
}

impl InlineImage {
    pub fn is_png(&self) -> bool {
        self.decoded
            .as_deref()
            .is_some_and(|bytes| bytes.starts_with(PNG_SIGNATURE))
    }
}

/// Swaps the base64-inlined logo tag for one that points at the hosted image.
#[derive(Debug, Clone)]
pub struct LogoRewriter {
    pattern: Regex,
    replacement: String,
}

impl LogoRewriter {
    pub fn new(config: &RewriteConfig) -> Result<Self> {
        let source = config.pattern();
        let pattern = Regex::new(&source)
            .with_context(|| format!("Failed to compile logo pattern: {source}"))?;

        Ok(Self {
            pattern,
            replacement: config.replacement(),
        })
    }

    pub fn count_matches(&self, content: &str) -> usize {
        self.pattern.find_iter(content).count()
    }

    /// Replaces every non-overlapping match in one pass. The replacement is
    /// inserted verbatim, `$` is not expanded.
    pub fn rewrite<'a>(&self, content: &'a str) -> Rewrite<'a> {
        let replacements = self.count_matches(content);
        let content = self
            .pattern
            .replace_all(content, NoExpand(&self.replacement));

        Rewrite {
            content,
            replacements,
        }
    }

    pub fn inline_images(&self, content: &str) -> Vec<InlineImage> {
        self.pattern
            .captures_iter(content)
            .filter_map(|caps| {
                let tag = caps.get(0)?;
                let payload = caps.get(1)?.as_str();
                Some(InlineImage {
                    offset: tag.start(),
                    payload_len: payload.len(),
                    decoded: STANDARD.decode(payload).ok(),
                })
            })
            .collect()
    }
}
