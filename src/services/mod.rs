//! Triage services: the pipeline components and their wiring.

pub mod action_dispatcher;
pub mod attachments;
pub mod critic;
pub mod keywords;
pub mod llm_output;
pub mod metrics;
pub mod pipeline;
pub mod prompts;
pub mod proposer;
pub mod query_expander;
pub mod resolution_loop;
pub mod retrieval;

pub use action_dispatcher::{ActionDispatcher, DispatchSettings};
pub use attachments::AttachmentAnnotator;
pub use critic::CriticValidator;
pub use keywords::KeywordExtractor;
pub use llm_output::{parse_llm_output, ParsedOutput};
pub use metrics::{MetricsRecorder, MetricsSummary, RunMetrics};
pub use pipeline::{Collaborators, IncidentFailure, ReportEntry, RunOutcome, TriagePipeline};
pub use prompts::{PromptLibrary, PromptTemplate};
pub use proposer::{ProposalContext, ResolutionProposer};
pub use query_expander::QueryExpander;
pub use resolution_loop::{LoopOutcome, LoopSettings, ResolutionLoop};
pub use retrieval::{CandidateCollector, RelevanceFilter, SimilarityRetriever};
