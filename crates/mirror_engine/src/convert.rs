#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to convert page {page_id}: {message}")]
pub struct ConvertError {
    pub page_id: String,
    pub message: String,
}

impl ConvertError {
    pub fn new(page_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            page_id: page_id.into(),
            message: message.into(),
        }
    }
}

/// Turns one remote page into markdown.
#[async_trait::async_trait]
pub trait ContentConverter: Send + Sync {
    async fn to_markup(&self, page_id: &str) -> Result<String, ConvertError>;
}
