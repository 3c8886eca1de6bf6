//! Ticketing system port.

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::errors::DomainResult;
use crate::domain::models::Incident;

/// An action applied to an incident in the ticketing system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncidentAction {
    /// Close the incident with resolution notes.
    Resolve { notes: String },
    /// Put the incident on hold with a detail message.
    Hold { detail: String },
    /// Move the incident to another mailbox.
    Reassign { mailbox: String, detail: String },
}

impl IncidentAction {
    /// Action name understood by the ticketing API.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Resolve { .. } => "resolver",
            Self::Hold { .. } => "en_espera",
            Self::Reassign { .. } => "reasignar",
        }
    }

    /// Request body for the ticketing API.
    pub fn to_body(&self) -> ActionBody<'_> {
        let mut body = ActionBody {
            action: self.name(),
            target_mailbox: None,
            resolution_notes: None,
            detail: None,
        };
        match self {
            Self::Resolve { notes } => body.resolution_notes = Some(notes),
            Self::Hold { detail } => body.detail = Some(detail),
            Self::Reassign { mailbox, detail } => {
                body.target_mailbox = Some(mailbox);
                body.detail = Some(detail);
            }
        }
        body
    }
}

/// Wire form of an [`IncidentAction`].
#[derive(Debug, Serialize)]
pub struct ActionBody<'a> {
    pub action: &'static str,
    #[serde(rename = "buzonDestino", skip_serializing_if = "Option::is_none")]
    pub target_mailbox: Option<&'a str>,
    #[serde(rename = "notasResolucion", skip_serializing_if = "Option::is_none")]
    pub resolution_notes: Option<&'a str>,
    #[serde(rename = "detalle", skip_serializing_if = "Option::is_none")]
    pub detail: Option<&'a str>,
}

/// Ticketing system operations used by the pipeline.
#[async_trait]
pub trait TicketingClient: Send + Sync {
    /// List open incidents, optionally restricted to one mailbox.
    async fn list_open(&self, mailbox: Option<&str>) -> DomainResult<Vec<Incident>>;

    /// List incidents closed in the last `months` months.
    async fn list_closed(&self, months: u32) -> DomainResult<Vec<Incident>>;

    /// Apply an action to an incident.
    async fn apply_action(&self, incident_id: &str, action: &IncidentAction) -> DomainResult<()>;
}
