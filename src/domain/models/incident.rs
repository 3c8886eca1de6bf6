//! Incident model as exposed by the ticketing system.

use serde::{Deserialize, Serialize};

/// A single entry of an incident's history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Free-text detail written by the operator or the system.
    #[serde(rename = "detalle", default)]
    pub detail: Option<String>,

    /// Attachment references (URLs or paths).
    #[serde(rename = "adjuntos", default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<String>,

    /// Remaining fields of the entry (author, dates, mailboxes...), kept
    /// verbatim so they reach the prompts and the report.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl HistoryEntry {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: Some(detail.into()),
            ..Default::default()
        }
    }

    pub fn with_attachment(mut self, reference: impl Into<String>) -> Self {
        self.attachments.push(reference.into());
        self
    }
}

/// An open support incident.
///
/// Treated as immutable input for a run; [`Incident::annotated`] returns
/// the working copy with attachment analysis folded into the history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incident {
    #[serde(rename = "codIncidencia")]
    pub id: String,

    #[serde(rename = "titulo", default)]
    pub title: String,

    #[serde(rename = "descripcion", default)]
    pub description: String,

    #[serde(rename = "buzon", default)]
    pub mailbox: String,

    #[serde(rename = "historial", default)]
    pub history: Vec<HistoryEntry>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Incident {
    pub fn new(id: impl Into<String>, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn with_mailbox(mut self, mailbox: impl Into<String>) -> Self {
        self.mailbox = mailbox.into();
        self
    }

    pub fn with_history(mut self, entry: HistoryEntry) -> Self {
        self.history.push(entry);
        self
    }

    /// Build a working copy whose history details carry the given
    /// attachment analyses. `analyses[i]` belongs to `history[i]`; empty
    /// strings leave the entry untouched.
    pub fn annotated(&self, analyses: &[String]) -> Self {
        let mut copy = self.clone();
        for (entry, analysis) in copy.history.iter_mut().zip(analyses) {
            if analysis.is_empty() {
                continue;
            }
            entry.detail = Some(match entry.detail.as_deref() {
                Some(detail) if !detail.is_empty() => {
                    format!("{detail} | Attachment analysis: {analysis}")
                }
                _ => format!("Attachment analysis: {analysis}"),
            });
        }
        copy
    }

    /// Serialize the incident for prompt interpolation.
    pub fn to_prompt_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{self:?}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Incident {
        Incident::new("INC-1", "Policy stuck", "Policy has been in provision for weeks")
            .with_mailbox("GR_SAL_COMP_AUTORIZACIONES")
            .with_history(HistoryEntry::new("Customer called").with_attachment("shot.png"))
            .with_history(HistoryEntry::default())
    }

    #[test]
    fn test_deserialize_ticketing_shape() {
        let json = r#"{
            "codIncidencia": "INC-7",
            "titulo": "T",
            "descripcion": "D",
            "buzon": "GR_X",
            "estado": "Abierta",
            "historial": [{"detalle": null, "Autor": "ana", "adjuntos": ["a.jpg"]}]
        }"#;
        let incident: Incident = serde_json::from_str(json).unwrap();
        assert_eq!(incident.id, "INC-7");
        assert_eq!(incident.mailbox, "GR_X");
        assert_eq!(incident.history.len(), 1);
        assert!(incident.history[0].detail.is_none());
        assert_eq!(incident.history[0].attachments, vec!["a.jpg"]);
        assert_eq!(incident.extra["estado"], "Abierta");
        assert_eq!(incident.history[0].extra["Autor"], "ana");
    }

    #[test]
    fn test_annotated_appends_to_existing_detail() {
        let incident = sample();
        let annotated = incident.annotated(&["error dialog".to_string(), String::new()]);
        assert_eq!(
            annotated.history[0].detail.as_deref(),
            Some("Customer called | Attachment analysis: error dialog")
        );
        assert!(annotated.history[1].detail.is_none());
    }

    #[test]
    fn test_annotated_creates_detail_when_missing() {
        let incident = sample();
        let annotated = incident.annotated(&[String::new(), "blank form".to_string()]);
        assert_eq!(
            annotated.history[1].detail.as_deref(),
            Some("Attachment analysis: blank form")
        );
    }

    #[test]
    fn test_annotated_leaves_source_untouched() {
        let incident = sample();
        let _ = incident.annotated(&["x".to_string(), "y".to_string()]);
        assert_eq!(incident.history[0].detail.as_deref(), Some("Customer called"));
        assert!(incident.history[1].detail.is_none());
    }
}
