//! Attachment analysis port.
//!
//! Converts an attachment reference into a textual description that is
//! folded into the incident history before retrieval.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;

const IMAGE_EXTENSIONS: [&str; 4] = [".png", ".jpg", ".jpeg", ".gif"];

/// Whether the reference points to an image the analyzer understands.
pub fn is_image(reference: &str) -> bool {
    let lower = reference.to_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

#[async_trait]
pub trait AttachmentAnalyzer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Describe one attachment.
    async fn describe(&self, reference: &str) -> DomainResult<String>;
}

/// Analyzer used when no image model is deployed. Describes nothing.
#[derive(Debug, Clone, Default)]
pub struct NullAttachmentAnalyzer;

impl NullAttachmentAnalyzer {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AttachmentAnalyzer for NullAttachmentAnalyzer {
    fn name(&self) -> &'static str {
        "null"
    }

    async fn describe(&self, _reference: &str) -> DomainResult<String> {
        Ok(String::new())
    }
}
