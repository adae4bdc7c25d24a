//! LLM-facing half of the courtroom claim-verification system.
//!
//! This crate provides:
//! - A narrow prompt-in/text-out completion client trait with the production
//!   OpenAI-compatible `reqwest` implementation
//! - Versioned prompt preambles for the four courtroom roles
//! - The debate runner (sequential, one completion call per turn, no retry)
//! - The single-agent baseline verifier and the comparison driver
//!
//! All deterministic data types live in the `tribunal` crate; everything here
//! is exercised in tests through a scripted client.

pub mod client;
pub mod config;
pub mod prompts;
pub mod runner;

pub use client::{ClientError, CompletionClient, CompletionRequest, OpenAiCompatClient};
pub use config::{CourtConfig, Tier};
pub use runner::{BaselineVerifier, CaseOutcome, CourtError, DebateRunner};
