//! JSON reporter
//!
//! Pretty-printed array of rows with the full review and rewrite text.

use crate::review::ReviewRow;
use anyhow::Result;

pub fn render(rows: &[ReviewRow]) -> Result<String> {
    Ok(serde_json::to_string_pretty(rows)?)
}
