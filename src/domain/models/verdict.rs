//! Critic verdicts on proposed drafts.

use serde::{Deserialize, Serialize};

/// Outcome of a critic evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerdictStatus {
    /// A verdict without a status counts as approval.
    #[default]
    Approved,
    Rejected,
    AlreadyTried,
}

impl VerdictStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::AlreadyTried => "ALREADY_TRIED",
        }
    }
}

/// A critic's judgment of one draft.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriticVerdict {
    #[serde(default)]
    pub status: VerdictStatus,

    #[serde(default)]
    pub reason: String,

    #[serde(default)]
    pub critique: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problem_type: Option<String>,

    #[serde(default)]
    pub avoid_solution_types: Vec<String>,

    #[serde(default)]
    pub recommended_approach: String,
}

impl CriticVerdict {
    pub fn approved(reason: impl Into<String>) -> Self {
        Self {
            status: VerdictStatus::Approved,
            reason: reason.into(),
            ..Default::default()
        }
    }

    pub fn rejected(reason: impl Into<String>, critique: impl Into<String>) -> Self {
        Self {
            status: VerdictStatus::Rejected,
            reason: reason.into(),
            critique: critique.into(),
            ..Default::default()
        }
    }

    pub fn already_tried(reason: impl Into<String>) -> Self {
        Self {
            status: VerdictStatus::AlreadyTried,
            reason: reason.into(),
            ..Default::default()
        }
    }

    /// Problem type if the critic named a meaningful one.
    pub fn known_problem_type(&self) -> Option<&str> {
        self.problem_type
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty() && !p.eq_ignore_ascii_case("unknown"))
    }

    /// The structured part of the critique, carried into the next attempt.
    pub fn structured(&self) -> StructuredCritique {
        StructuredCritique {
            problem_type: self
                .problem_type
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
            avoid_solution_types: self.avoid_solution_types.clone(),
            recommended_approach: self.recommended_approach.clone(),
        }
    }
}

/// Structured guidance that biases the next proposal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredCritique {
    pub problem_type: String,
    pub avoid_solution_types: Vec<String>,
    pub recommended_approach: String,
}
