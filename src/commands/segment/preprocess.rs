use anyhow::{Context, Result};
use regex::Regex;

/// Removes `Page <n> of <m>` markers left by the text layer.
///
/// Whitespace is left untouched: criterion headers depend on their exact spacing.
pub fn strip_page_markers(text: &str) -> Result<String> {
    let marker = Regex::new(r"Page\s\d+\s+of\s+\d+").context("failed to compile page marker regex")?;
    Ok(marker.replace_all(text, "").into_owned())
}
