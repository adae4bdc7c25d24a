//! Deterministic core for the courtroom claim-verification debate.
//!
//! This library provides:
//! - Case records and CSV dataset loading
//! - The fixed courtroom role sequence and ordered debate transcript
//! - Format-directed verdict parsing of Jury Foreman output
//! - Report export (JSON case reports, run summaries, comparison data,
//!   Markdown rendering)
//!
//! Nothing in here talks to a model API. The LLM-facing runner lives in the
//! `courtroom-agents` crate and drives these types through a narrow
//! prompt-in/text-out client trait, so everything below is testable with
//! scripted responses.

pub mod case;
pub mod debate;
pub mod export;
pub mod verdict;

// Re-export key case types
pub use case::{Case, CaseSet, DatasetError};

// Re-export key debate types
pub use debate::{
    AgentRole, AgentTurn, DebateTranscript, TranscriptError, DELIBERATION_ROLES,
};

// Re-export key verdict types
pub use verdict::{
    parse_deliberation_response, parse_jury_response, DeliberationSummary, Verdict,
    VerdictLabel, VerdictParseError,
};

// Re-export key export types
pub use export::{
    AbortKind, AbortedCase, BaselineEntry, BaselineSummary, CaseReport, ComparisonEntry,
    ComparisonReport, ExportError, RunMetadata, RunStatistics, RunSummary, SystemStatistics,
    VerdictDistribution,
};
