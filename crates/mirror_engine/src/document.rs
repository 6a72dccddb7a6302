use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
#[error("failed to serialize front matter: {0}")]
pub struct DocumentError(#[from] serde_yaml::Error);

#[derive(Debug, Serialize)]
struct FrontMatter<'a> {
    title: &'a str,
    #[serde(rename = "type")]
    page_type: &'a str,
    date: String,
}

/// Prepends a `---` fenced YAML block (title, type, date) to the body.
///
/// The date is RFC 3339 with second precision, so an unchanged remote
/// timestamp always yields identical bytes.
pub fn build_page_document(
    title: &str,
    last_modified: DateTime<Utc>,
    body_markdown: &str,
) -> Result<String, DocumentError> {
    let front = FrontMatter {
        title,
        page_type: title,
        date: last_modified.to_rfc3339_opts(SecondsFormat::Secs, true),
    };
    let yaml = serde_yaml::to_string(&front)?;
    Ok(format!("---\n{yaml}---\n\n{body_markdown}"))
}
