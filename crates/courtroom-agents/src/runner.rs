//! Debate runner — drives one case through the fixed courtroom sequence.
//!
//! The runner owns no branching logic: the transcript dictates the next role,
//! the runner issues exactly one completion call per expected turn, and any
//! client error aborts the case with no retry and no partial verdict.

use std::sync::Arc;

use thiserror::Error;

use tribunal::case::Case;
use tribunal::debate::{AgentTurn, DebateTranscript, TranscriptError};
use tribunal::export::{AbortKind, CaseReport};
use tribunal::verdict::{
    parse_deliberation_response, parse_jury_response, Verdict, VerdictLabel, VerdictParseError,
};

use crate::client::{ClientError, CompletionClient, CompletionRequest};
use crate::config::CourtConfig;
use crate::prompts;

/// Error processing one case. None of these are retried.
#[derive(Debug, Error)]
pub enum CourtError {
    /// The model API call failed — the case is abandoned.
    #[error("model call failed: {0}")]
    Client(#[from] ClientError),

    /// The Jury Foreman's output matched no instructed shape.
    #[error("jury verdict unreadable: {0}")]
    Verdict(#[from] VerdictParseError),

    /// The transcript rejected a turn (programming-error guard).
    #[error("transcript order violated: {0}")]
    Transcript(#[from] TranscriptError),
}

impl CourtError {
    /// How this failure is recorded in the run summary.
    pub fn abort_kind(&self) -> AbortKind {
        match self {
            Self::Client(_) => AbortKind::ApiFailure,
            Self::Verdict(_) | Self::Transcript(_) => AbortKind::ParseFailure,
        }
    }
}

/// A completed case: the report plus how many completion calls it took.
#[derive(Debug, Clone)]
pub struct CaseOutcome {
    pub report: CaseReport,
    pub completion_calls: u32,
}

/// Sequences the four courtroom roles against the completion client.
pub struct DebateRunner {
    client: Arc<dyn CompletionClient>,
    config: CourtConfig,
}

impl DebateRunner {
    pub fn new(client: Arc<dyn CompletionClient>, config: CourtConfig) -> Self {
        Self { client, config }
    }

    /// Run the full debate for one case and synthesize its verdict.
    ///
    /// Each turn's prompt is built from the case plus the transcript's
    /// accumulated context block, so context grows monotonically across the
    /// fixed role order.
    pub async fn run_case(&self, case: &Case) -> Result<CaseOutcome, CourtError> {
        let mut transcript =
            DebateTranscript::with_rounds(case.id, self.config.deliberation_rounds);
        let mut completion_calls = 0u32;
        let mut prosecution_tags: Vec<String> = Vec::new();

        while let Some(role) = transcript.expected_next() {
            let round = transcript.current_round();
            let request = CompletionRequest {
                system: prompts::preamble_for(role).to_string(),
                user: prompts::user_prompt(case, role, round, &transcript.context_block()),
                temperature: self.config.temperature,
                max_tokens: self.config.max_tokens,
            };

            tracing::info!(case = case.id, role = %role, round, "issuing agent turn");
            let prompt = request.user.clone();
            let response = self.client.complete(request).await?;
            completion_calls += 1;

            let mut turn = AgentTurn::new(role, round, prompt, &response);
            if !role.is_closing() {
                let summary = parse_deliberation_response(role, &response);
                prosecution_tags.extend(summary.mutation_tags.iter().cloned());
                turn = turn.with_arguments(summary.arguments);
                if let Some(confidence) = summary.confidence {
                    turn = turn.with_confidence(confidence);
                }
            }
            transcript.record_turn(turn)?;
        }

        let closing = match transcript.closing_turn() {
            Some(turn) => turn,
            None => {
                // The loop above exits only once the jury turn is recorded.
                return Err(CourtError::Transcript(TranscriptError::Closed));
            }
        };

        let mut verdict = parse_jury_response(&closing.response)?;
        if verdict.label == VerdictLabel::Mutated && verdict.mutation_tags.is_empty() {
            verdict.mutation_tags = prosecution_tags;
        }

        if self.config.force_binary && verdict.label == VerdictLabel::Ambiguous {
            verdict = self.force_binary(case, &transcript, completion_calls).await?;
            completion_calls += 1;
        }

        tracing::info!(case = case.id, verdict = %verdict.summary(), "case closed");
        Ok(CaseOutcome {
            report: CaseReport::new(case.clone(), transcript, verdict),
            completion_calls,
        })
    }

    /// One extra Jury Foreman call demanding a binary label.
    ///
    /// A jury that answers AMBIGUOUS again has refused the instruction; that
    /// is surfaced as a verdict parse failure rather than being relabeled.
    async fn force_binary(
        &self,
        case: &Case,
        transcript: &DebateTranscript,
        calls_so_far: u32,
    ) -> Result<Verdict, CourtError> {
        tracing::info!(case = case.id, calls_so_far, "forcing binary verdict");
        let request = CompletionRequest {
            system: prompts::FORCED_BINARY_PREAMBLE.to_string(),
            user: prompts::forced_binary_prompt(case, &transcript.context_block()),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };
        let response = self.client.complete(request).await?;
        let forced = parse_jury_response(&response)?;
        if forced.label == VerdictLabel::Ambiguous {
            return Err(CourtError::Verdict(VerdictParseError::UnknownLabel(
                "ambiguous (binary ruling required)".to_string(),
            )));
        }
        Ok(forced.forced_from(VerdictLabel::Ambiguous))
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }

    pub fn config(&self) -> &CourtConfig {
        &self.config
    }
}

/// Single-agent baseline: one completion call, same verdict shape.
pub struct BaselineVerifier {
    client: Arc<dyn CompletionClient>,
    config: CourtConfig,
}

impl BaselineVerifier {
    pub fn new(client: Arc<dyn CompletionClient>, config: CourtConfig) -> Self {
        Self { client, config }
    }

    /// Verify one case in a single pass.
    pub async fn verify(&self, case: &Case) -> Result<Verdict, CourtError> {
        let request = CompletionRequest {
            system: prompts::BASELINE_VERIFIER_PREAMBLE.to_string(),
            user: prompts::baseline_prompt(case),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };
        tracing::info!(case = case.id, "issuing baseline verification");
        let response = self.client.complete(request).await?;
        Ok(parse_jury_response(&response)?)
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }
}
