//! REST client for the ticketing system.

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::http::{build_client, endpoint, send, send_json};
use crate::domain::errors::{DomainResult, ExternalSystem};
use crate::domain::models::{Incident, TicketingConfig};
use crate::domain::ports::{IncidentAction, TicketingClient};

const SYSTEM: ExternalSystem = ExternalSystem::Ticketing;

#[derive(Debug, Clone)]
pub struct HttpTicketingClient {
    http: Client,
    base_url: String,
}

impl HttpTicketingClient {
    pub fn new(config: &TicketingConfig) -> DomainResult<Self> {
        Ok(Self {
            http: build_client(SYSTEM, config.timeout_secs)?,
            base_url: config.base_url.clone(),
        })
    }
}

#[async_trait]
impl TicketingClient for HttpTicketingClient {
    async fn list_open(&self, mailbox: Option<&str>) -> DomainResult<Vec<Incident>> {
        let mut request = self.http.get(endpoint(&self.base_url, "/api/incidencias"));
        if let Some(mailbox) = mailbox {
            request = request.query(&[("buzon", mailbox)]);
        }
        let incidents: Vec<Incident> = send_json(SYSTEM, request).await?;
        debug!(count = incidents.len(), mailbox = mailbox.unwrap_or(""), "Listed open incidents");
        Ok(incidents)
    }

    async fn list_closed(&self, months: u32) -> DomainResult<Vec<Incident>> {
        let request = self
            .http
            .get(endpoint(&self.base_url, "/api/incidencias/cerradas"))
            .query(&[("meses", months)]);
        send_json(SYSTEM, request).await
    }

    async fn apply_action(&self, incident_id: &str, action: &IncidentAction) -> DomainResult<()> {
        let url = endpoint(&self.base_url, &format!("/api/incidencias/{incident_id}"));
        send(SYSTEM, self.http.patch(url).json(&action.to_body())).await?;
        debug!(incident_id, action = action.name(), "Applied incident action");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::DomainError;
    use mockito::Matcher;
    use serde_json::json;

    fn client(url: &str) -> HttpTicketingClient {
        HttpTicketingClient::new(&TicketingConfig {
            base_url: url.to_string(),
            ..TicketingConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_list_open_by_mailbox() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/incidencias")
            .match_query(Matcher::UrlEncoded("buzon".into(), "GR_X".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!([
                    {"codIncidencia": "INC-1", "titulo": "A", "descripcion": "a", "buzon": "GR_X", "historial": []},
                    {"codIncidencia": "INC-2", "titulo": "B", "descripcion": "b", "buzon": "GR_X"}
                ])
                .to_string(),
            )
            .create_async()
            .await;

        let incidents = client(&server.url()).list_open(Some("GR_X")).await.unwrap();
        mock.assert_async().await;
        assert_eq!(incidents.len(), 2);
        assert_eq!(incidents[1].id, "INC-2");
    }

    #[tokio::test]
    async fn test_list_closed_passes_months() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/incidencias/cerradas")
            .match_query(Matcher::UrlEncoded("meses".into(), "3".into()))
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        assert!(client(&server.url()).list_closed(3).await.unwrap().is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_reassign_patch_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PATCH", "/api/incidencias/INC-1")
            .match_body(Matcher::Json(json!({
                "action": "reasignar",
                "buzonDestino": "GR_BUZON_X",
                "detalle": "[SPAI] moving"
            })))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let action = IncidentAction::Reassign {
            mailbox: "GR_BUZON_X".into(),
            detail: "[SPAI] moving".into(),
        };
        client(&server.url()).apply_action("INC-1", &action).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_action_error_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("PATCH", "/api/incidencias/INC-9")
            .with_status(404)
            .with_body("Incidencia no encontrada")
            .create_async()
            .await;

        let err = client(&server.url())
            .apply_action("INC-9", &IncidentAction::Resolve { notes: "n".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::UnexpectedStatus { status: 404, .. }));
    }
}
