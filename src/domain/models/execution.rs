//! Results of executing a resolution draft.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use super::resolution::{ResolutionDraft, ResolutionType};

/// Status of the last call made to one external system.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ApiCallStatus {
    /// No call was made.
    #[default]
    NotCalled,
    Ok,
    Error(String),
}

impl ApiCallStatus {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(message.into())
    }

    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    pub const fn is_called(&self) -> bool {
        !matches!(self, Self::NotCalled)
    }
}

impl std::fmt::Display for ApiCallStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotCalled => Ok(()),
            Self::Ok => f.write_str("OK"),
            Self::Error(message) => write!(f, "error: {message}"),
        }
    }
}

impl Serialize for ApiCallStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ApiCallStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(match raw.as_str() {
            "" => Self::NotCalled,
            "OK" => Self::Ok,
            other => Self::Error(
                other
                    .strip_prefix("error:")
                    .map_or(other, str::trim_start)
                    .to_string(),
            ),
        })
    }
}

/// Per-system status of the calls made while dispatching one incident.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiStatus {
    #[serde(rename = "gestor_incidencias", default)]
    pub ticketing: ApiCallStatus,

    #[serde(rename = "sistema", default)]
    pub policy: ApiCallStatus,
}

impl ApiStatus {
    pub fn ticketing(status: ApiCallStatus) -> Self {
        Self {
            ticketing: status,
            ..Default::default()
        }
    }

    pub fn policy(status: ApiCallStatus) -> Self {
        Self {
            policy: status,
            ..Default::default()
        }
    }
}

/// Structured entities extracted from the incident text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Keywords(pub Map<String, Value>);

impl Keywords {
    const POLICY_KEYS: [&'static str; 4] = ["policy_number", "poliza", "numero_poliza", "policy"];

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// The first non-empty policy number found under the known keys.
    /// Numeric values are accepted and rendered as text.
    pub fn policy_number(&self) -> Option<String> {
        Self::POLICY_KEYS.iter().find_map(|key| match self.0.get(*key)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }

    /// Serialized form passed to the policy system as context.
    pub fn to_context_json(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_default()
    }
}

/// Final outcome of dispatching a draft for one incident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    #[serde(flatten)]
    pub draft: ResolutionDraft,

    #[serde(rename = "estado_api")]
    pub api_status: ApiStatus,

    #[serde(default)]
    pub keywords: Keywords,
}

impl ExecutionResult {
    pub const fn new(draft: ResolutionDraft, api_status: ApiStatus, keywords: Keywords) -> Self {
        Self {
            draft,
            api_status,
            keywords,
        }
    }

    pub const fn final_type(&self) -> &ResolutionType {
        &self.draft.resolution_type
    }

    pub const fn original_resolution_type(&self) -> Option<&ResolutionType> {
        self.draft.original_resolution_type.as_ref()
    }

    /// Type used in reports: `api|code[final]` when a policy chain ended in
    /// something other than the type it started from.
    pub fn reported_type(&self) -> String {
        match self.original_resolution_type() {
            Some(original) if original != self.final_type() => {
                format!("{original}[{}]", self.final_type())
            }
            _ => self.final_type().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_call_status_wire_format() {
        let status = ApiStatus {
            ticketing: ApiCallStatus::Ok,
            policy: ApiCallStatus::error("timeout"),
        };
        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(value, json!({"gestor_incidencias": "OK", "sistema": "error: timeout"}));

        let back: ApiStatus = serde_json::from_value(value).unwrap();
        assert_eq!(back, status);
    }

    #[test]
    fn test_not_called_serializes_empty() {
        let value = serde_json::to_value(ApiStatus::default()).unwrap();
        assert_eq!(value, json!({"gestor_incidencias": "", "sistema": ""}));
    }

    #[test]
    fn test_policy_number_lookup_order() {
        let keywords = Keywords::new()
            .with("poliza", "666023054-53-1")
            .with("policy", "ignored");
        assert_eq!(keywords.policy_number().as_deref(), Some("666023054-53-1"));

        let blank = Keywords::new().with("poliza", "  ").with("policy", "P-9");
        assert_eq!(blank.policy_number().as_deref(), Some("P-9"));

        let numeric = Keywords::new().with("numero_poliza", 12345);
        assert_eq!(numeric.policy_number().as_deref(), Some("12345"));

        assert!(Keywords::new().with("nif", "1").policy_number().is_none());
    }

    #[test]
    fn test_reported_type() {
        let mut draft = ResolutionDraft::new(ResolutionType::Close, "", "done");
        let plain = ExecutionResult::new(draft.clone(), ApiStatus::default(), Keywords::new());
        assert_eq!(plain.reported_type(), "close");

        draft.original_resolution_type = Some(ResolutionType::Api("42".to_string()));
        let chained = ExecutionResult::new(draft, ApiStatus::default(), Keywords::new());
        assert_eq!(chained.reported_type(), "api|42[close]");
    }

    #[test]
    fn test_result_serializes_flat_draft() {
        let result = ExecutionResult::new(
            ResolutionDraft::new(ResolutionType::Wait, "", "[SPAI] waiting"),
            ApiStatus::ticketing(ApiCallStatus::Ok),
            Keywords::new().with("poliza", "P-1"),
        );
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["RESOLUCION AUTOMÁTICA"], "wait");
        assert_eq!(value["estado_api"]["gestor_incidencias"], "OK");
        assert_eq!(value["keywords"]["poliza"], "P-1");
    }
}
