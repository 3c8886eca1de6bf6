//! Prompt templates for every text-generation call.
//!
//! Built-in templates ship with the crate. A prompts directory may
//! override any of them with `<name>.txt` files of the form:
//!
//! ```text
//! system: <system message>
//! ---
//! user: <user message>
//! ```

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::{GenerationRequest, PromptKind};

/// A system/user message pair with `{placeholder}` slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    pub system: String,
    pub user: String,
}

impl PromptTemplate {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }

    /// Parse the override file format.
    pub fn parse(content: &str) -> Option<Self> {
        let (system, user) = content.split_once("---")?;
        let system = system.trim();
        let user = user.trim();
        Some(Self::new(
            system.strip_prefix("system:").unwrap_or(system).trim(),
            user.strip_prefix("user:").unwrap_or(user).trim(),
        ))
    }

    /// Substitute `{name}` slots. Unknown slots are left as-is.
    pub fn render(&self, variables: &[(&str, &str)]) -> (String, String) {
        (fill_slots(&self.system, variables), fill_slots(&self.user, variables))
    }
}

/// Single left-to-right pass; inserted values are never scanned again.
fn fill_slots(text: &str, variables: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let slot = &rest[open..];
        let value = slot.find('}').and_then(|close| {
            let name = &slot[1..close];
            variables
                .iter()
                .find(|(candidate, _)| *candidate == name)
                .map(|(_, value)| (*value, close))
        });
        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &slot[close + 1..];
            }
            None => {
                out.push('{');
                rest = &slot[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn builtin(kind: PromptKind) -> PromptTemplate {
    match kind {
        PromptKind::ExpandQuery => PromptTemplate::new(
            "You help an insurance back-office search a catalog of solved incidents. \
             Rewrite the incident below as 3 short, self-contained search queries that \
             describe the underlying problem in different words. \
             Answer only with a JSON array of strings.",
            "Incident:\n{incident}",
        ),
        PromptKind::Relevance => PromptTemplate::new(
            "You decide whether a previously solved case applies to a new incident. \
             Answer only `true` if the same solution would fix the new incident, \
             otherwise answer `false`.",
            "New incident:\n{incident}\n\nSolved case:\n{candidate}",
        ),
        PromptKind::Propose => PromptTemplate::new(
            "You resolve insurance back-office incidents using solutions that worked before. \
             Pick the most suitable solution and answer only with a JSON object with the keys \
             \"RESOLUCION AUTOMÁTICA\" (one of manual, close, wait, reassign or api|<code>), \
             \"BUZON REASIGNACION\" (target mailbox, empty unless reassigning) and \
             \"SOLUCIÓN\" (the message for the ticket).",
            "Incident:\n{incident}\n\nCandidate solutions:\n{candidates}\n\n\
             Feedback on previous attempts:\n{critique}",
        ),
        PromptKind::Critique => PromptTemplate::new(
            "You review proposed resolutions for insurance back-office incidents. \
             Answer only with a JSON object with the keys \"status\" (APPROVED, REJECTED or \
             ALREADY_TRIED), \"reason\", \"critique\", \"problem_type\", \
             \"avoid_solution_types\" (array) and \"recommended_approach\". \
             Use ALREADY_TRIED when the incident history shows the same action was taken before.",
            "Incident:\n{incident}\n\nProposed resolution:\n{draft}",
        ),
        PromptKind::Keywords => PromptTemplate::new(
            "Extract the structured entities mentioned in the incident (policy number as \
             \"poliza\", tax id as \"nif\", claim number, dates, amounts). \
             Answer only with a flat JSON object; omit entities that are not present.",
            "Incident:\n{incident}",
        ),
    }
}

/// The full set of templates used by a run.
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    templates: HashMap<PromptKind, PromptTemplate>,
}

impl PromptLibrary {
    pub fn builtin() -> Self {
        Self {
            templates: PromptKind::ALL.iter().map(|k| (*k, builtin(*k))).collect(),
        }
    }

    /// Built-in templates overridden by `<dir>/<name>.txt` where present.
    pub fn load(dir: Option<&Path>) -> DomainResult<Self> {
        let mut library = Self::builtin();
        let Some(dir) = dir else {
            return Ok(library);
        };

        for kind in PromptKind::ALL {
            let path = dir.join(format!("{}.txt", kind.name()));
            let content = match std::fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(DomainError::InvalidConfig(format!(
                        "cannot read prompt {}: {e}",
                        path.display()
                    )))
                }
            };
            let template = PromptTemplate::parse(&content).ok_or_else(|| {
                DomainError::InvalidConfig(format!(
                    "prompt {} has no '---' separator between system and user parts",
                    path.display()
                ))
            })?;
            debug!(prompt = kind.name(), path = %path.display(), "Loaded prompt override");
            library.templates.insert(kind, template);
        }
        Ok(library)
    }

    pub fn template(&self, kind: PromptKind) -> PromptTemplate {
        self.templates.get(&kind).cloned().unwrap_or_else(|| builtin(kind))
    }

    /// Render the template for `kind` into a ready-to-send request.
    pub fn request(&self, kind: PromptKind, variables: &[(&str, &str)]) -> GenerationRequest {
        let (system, user) = self.template(kind).render(variables);
        GenerationRequest { kind, system, user }
    }
}

impl Default for PromptLibrary {
    fn default() -> Self {
        Self::builtin()
    }
}
