//! Attachment annotation.
//!
//! Folds textual analyses of image attachments into a working copy of the
//! incident history. The source incident is never modified.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::models::Incident;
use crate::domain::ports::attachment::is_image;
use crate::domain::ports::AttachmentAnalyzer;

pub struct AttachmentAnnotator {
    analyzer: Arc<dyn AttachmentAnalyzer>,
}

impl AttachmentAnnotator {
    pub fn new(analyzer: Arc<dyn AttachmentAnalyzer>) -> Self {
        Self { analyzer }
    }

    /// Return a copy of `incident` with attachment analyses appended to
    /// each history entry's detail.
    pub async fn annotate(&self, incident: &Incident) -> Incident {
        let mut analyses = Vec::with_capacity(incident.history.len());

        for entry in &incident.history {
            let mut descriptions = Vec::new();
            for reference in entry.attachments.iter().filter(|r| is_image(r)) {
                match self.analyzer.describe(reference).await {
                    Ok(description) if !description.trim().is_empty() => {
                        descriptions.push(description.trim().to_string());
                    }
                    Ok(_) => {}
                    Err(e) => warn!(
                        incident_id = %incident.id,
                        attachment = %reference,
                        analyzer = self.analyzer.name(),
                        error = %e,
                        "Attachment analysis failed"
                    ),
                }
            }
            analyses.push(descriptions.join(" | "));
        }

        let annotated = analyses.iter().filter(|a| !a.is_empty()).count();
        if annotated > 0 {
            debug!(incident_id = %incident.id, entries = annotated, "Annotated history entries");
        }
        incident.annotated(&analyses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{FixedAttachmentAnalyzer, MockReply};
    use crate::domain::models::HistoryEntry;
    use crate::domain::ports::NullAttachmentAnalyzer;

    fn incident() -> Incident {
        Incident::new("INC-1", "t", "d")
            .with_history(
                HistoryEntry::new("Customer sent screenshots")
                    .with_attachment("a.png")
                    .with_attachment("b.JPG")
                    .with_attachment("contract.pdf"),
            )
            .with_history(HistoryEntry::default().with_attachment("broken.gif"))
    }

    #[tokio::test]
    async fn test_descriptions_joined_per_entry() {
        let analyzer = FixedAttachmentAnalyzer::new()
            .describe_as("a.png", MockReply::text("error 500 dialog"))
            .describe_as("b.JPG", MockReply::text("policy screen"))
            .describe_as("contract.pdf", MockReply::text("never asked"));
        let annotator = AttachmentAnnotator::new(Arc::new(analyzer));

        let source = incident();
        let annotated = annotator.annotate(&source).await;

        assert_eq!(
            annotated.history[0].detail.as_deref(),
            Some("Customer sent screenshots | Attachment analysis: error 500 dialog | policy screen")
        );
        assert!(annotated.history[1].detail.is_none());
        assert_eq!(source.history[0].detail.as_deref(), Some("Customer sent screenshots"));
    }

    #[tokio::test]
    async fn test_analyzer_failure_leaves_entry_unannotated() {
        let analyzer = FixedAttachmentAnalyzer::new()
            .describe_as("broken.gif", MockReply::failure("model offline"));
        let annotator = AttachmentAnnotator::new(Arc::new(analyzer));

        let annotated = annotator.annotate(&incident()).await;
        assert!(annotated.history[1].detail.is_none());
    }

    #[tokio::test]
    async fn test_null_analyzer_is_identity() {
        let annotator = AttachmentAnnotator::new(Arc::new(NullAttachmentAnalyzer::new()));
        let source = incident();
        assert_eq!(annotator.annotate(&source).await, source);
    }
}
