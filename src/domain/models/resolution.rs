//! Resolution drafts: structured, not-yet-executed decisions.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Field names used by the back-office systems for draft metadata.
pub mod keys {
    pub const RESOLUTION_TYPE: &str = "RESOLUCION AUTOMÁTICA";
    pub const SOLUTION_TEXT: &str = "SOLUCIÓN";
}

/// What the dispatcher should do with an incident.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum ResolutionType {
    /// Leave the incident for a human operator.
    #[default]
    Manual,
    /// Resolve the incident with the solution text as resolution notes.
    Close,
    /// Put the incident on hold with the solution text as detail.
    Wait,
    /// Move the incident to another mailbox.
    Reassign,
    /// Ask the policy system, passing the solution code.
    Api(String),
    /// Anything else the model produced; treated as manual when executed.
    Unrecognized(String),
}

impl ResolutionType {
    /// Parse a resolution type. Accepts the canonical names and the
    /// back-office spellings (`cierre`, `en espera`, `reasignacion`).
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if let Some(prefix) = trimmed.get(..4) {
            if prefix.eq_ignore_ascii_case("api|") {
                return Self::Api(trimmed[4..].trim().to_string());
            }
        }
        match trimmed.to_lowercase().as_str() {
            "" | "manual" => Self::Manual,
            "close" | "cierre" => Self::Close,
            "wait" | "en espera" | "en_espera" => Self::Wait,
            "reassign" | "reasignacion" | "reasignación" => Self::Reassign,
            _ => Self::Unrecognized(trimmed.to_string()),
        }
    }

    /// True for the types that end dispatch recursion.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Manual | Self::Close | Self::Wait | Self::Reassign)
    }
}

impl std::fmt::Display for ResolutionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Manual => f.write_str("manual"),
            Self::Close => f.write_str("close"),
            Self::Wait => f.write_str("wait"),
            Self::Reassign => f.write_str("reassign"),
            Self::Api(code) => write!(f, "api|{code}"),
            Self::Unrecognized(raw) => f.write_str(raw),
        }
    }
}

impl Serialize for ResolutionType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ResolutionType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.map_or(Self::Manual, |s| Self::parse(&s)))
    }
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// A structured resolution proposed by the model, the policy system, or
/// synthesized by the pipeline itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolutionDraft {
    #[serde(rename = "RESOLUCION AUTOMÁTICA", alias = "resolution_type", default)]
    pub resolution_type: ResolutionType,

    #[serde(
        rename = "BUZON REASIGNACION",
        alias = "target_mailbox",
        default,
        deserialize_with = "null_as_empty"
    )]
    pub target_mailbox: String,

    #[serde(
        rename = "SOLUCIÓN",
        alias = "solution_text",
        default,
        deserialize_with = "null_as_empty"
    )]
    pub solution_text: String,

    /// Type that started an `api|*` chain. Set once, then carried through
    /// every re-dispatch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_resolution_type: Option<ResolutionType>,

    /// Any additional metadata the producer attached.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ResolutionDraft {
    pub fn new(
        resolution_type: ResolutionType,
        target_mailbox: impl Into<String>,
        solution_text: impl Into<String>,
    ) -> Self {
        Self {
            resolution_type,
            target_mailbox: target_mailbox.into(),
            solution_text: solution_text.into(),
            ..Default::default()
        }
    }

    /// A draft that hands the incident to a human with an explanation.
    pub fn manual(solution_text: impl Into<String>) -> Self {
        Self::new(ResolutionType::Manual, "", solution_text)
    }

    /// Return a copy whose solution text starts with `label` exactly once.
    pub fn labeled(&self, label: &str) -> Self {
        let mut draft = self.clone();
        if label.is_empty() {
            return draft;
        }
        let mut body = self.solution_text.as_str();
        while let Some(rest) = body.strip_prefix(label) {
            body = rest;
        }
        draft.solution_text = format!("{label}{body}");
        draft
    }

    /// Solution text without any leading `label`.
    pub fn unlabeled_text<'a>(&'a self, label: &str) -> &'a str {
        if label.is_empty() {
            return &self.solution_text;
        }
        let mut body = self.solution_text.as_str();
        while let Some(rest) = body.strip_prefix(label) {
            body = rest;
        }
        body
    }

    /// Whether two drafts propose the same action, ignoring labels,
    /// surrounding whitespace and provenance.
    pub fn same_proposal(&self, other: &Self, label: &str) -> bool {
        self.resolution_type == other.resolution_type
            && self.target_mailbox.trim() == other.target_mailbox.trim()
            && self.unlabeled_text(label).trim() == other.unlabeled_text(label).trim()
    }
}

/// A draft as it may come back from a producer: bare, wrapped in
/// `{"metadata": {...}}`, or as a list of either.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DraftPayload {
    Wrapped { metadata: ResolutionDraft },
    Many(Vec<DraftPayload>),
    Single(ResolutionDraft),
}

impl DraftPayload {
    /// Collapse the payload to its first draft. An empty list yields `None`.
    pub fn into_first(self) -> Option<ResolutionDraft> {
        match self {
            Self::Wrapped { metadata } | Self::Single(metadata) => Some(metadata),
            Self::Many(items) => items.into_iter().next().and_then(Self::into_first),
        }
    }
}
