//! REST client for the policy system.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::http::{build_client, endpoint, send_json};
use crate::domain::errors::{DomainError, DomainResult, ExternalSystem};
use crate::domain::models::{DraftPayload, PolicyConfig, ResolutionDraft};
use crate::domain::ports::{PolicyCheckRequest, PolicyClient};

const SYSTEM: ExternalSystem = ExternalSystem::Policy;

#[derive(Debug, Clone)]
pub struct HttpPolicyClient {
    http: Client,
    base_url: String,
}

impl HttpPolicyClient {
    pub fn new(config: &PolicyConfig) -> DomainResult<Self> {
        Ok(Self {
            http: build_client(SYSTEM, config.timeout_secs)?,
            base_url: config.base_url.clone(),
        })
    }
}

#[async_trait]
impl PolicyClient for HttpPolicyClient {
    async fn get_policy(&self, policy_number: &str) -> DomainResult<Value> {
        let url = endpoint(&self.base_url, &format!("/api/poliza/{policy_number}"));
        send_json(SYSTEM, self.http.get(url)).await
    }

    async fn check_policy(&self, request: &PolicyCheckRequest) -> DomainResult<ResolutionDraft> {
        let url = endpoint(&self.base_url, "/api/comprobacionPoliza");
        let payload: DraftPayload = send_json(SYSTEM, self.http.post(url).json(request)).await?;
        let draft = payload.into_first().ok_or_else(|| {
            DomainError::SerializationError("policy check returned an empty list".to_string())
        })?;
        debug!(
            policy = %request.policy_number,
            code = %request.solution_code,
            resolution_type = %draft.resolution_type,
            "Policy check answered"
        );
        Ok(draft)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::ResolutionType;
    use mockito::Matcher;
    use serde_json::json;

    fn client(url: &str) -> HttpPolicyClient {
        HttpPolicyClient::new(&PolicyConfig {
            base_url: url.to_string(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_check_policy_round_trip() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/comprobacionPoliza")
            .match_body(Matcher::Json(json!({
                "poliza": "666023054-53-1",
                "codSolucion": "fxprovicion",
                "strJson": "{\"poliza\":\"666023054-53-1\"}"
            })))
            .with_status(200)
            .with_body(
                json!({
                    "RESOLUCION AUTOMÁTICA": "cierre",
                    "BUZON REASIGNACION": "",
                    "SOLUCIÓN": "Provision released"
                })
                .to_string(),
            )
            .create_async()
            .await;

        let draft = client(&server.url())
            .check_policy(&PolicyCheckRequest {
                policy_number: "666023054-53-1".into(),
                solution_code: "fxprovicion".into(),
                context: "{\"poliza\":\"666023054-53-1\"}".into(),
            })
            .await
            .unwrap();
        mock.assert_async().await;
        assert_eq!(draft.resolution_type, ResolutionType::Close);
        assert_eq!(draft.solution_text, "Provision released");
    }

    #[tokio::test]
    async fn test_check_policy_empty_list_is_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/comprobacionPoliza")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let err = client(&server.url())
            .check_policy(&PolicyCheckRequest {
                policy_number: "1".into(),
                solution_code: "c".into(),
                context: "{}".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::SerializationError(_)));
    }

    #[tokio::test]
    async fn test_get_policy() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/poliza/P-1")
            .with_status(200)
            .with_body(r#"{"numero": "P-1", "estado": "vigente"}"#)
            .create_async()
            .await;

        let policy = client(&server.url()).get_policy("P-1").await.unwrap();
        assert_eq!(policy["estado"], "vigente");
    }
}
