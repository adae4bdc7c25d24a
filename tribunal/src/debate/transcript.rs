//! Ordered debate transcript — turns, order enforcement, context rendering.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::roles::{AgentRole, DELIBERATION_ROLES};

/// One role's single prompt/response exchange with the model.
///
/// Created once per invocation and never mutated afterwards. `arguments` and
/// `confidence` hold whatever structure the response parser could recover;
/// a turn with only raw `response` text is still a valid turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentTurn {
    /// Role that produced this turn.
    pub role: AgentRole,
    /// Deliberation round this turn belongs to (1-indexed; the Jury
    /// Foreman's turn carries the final round number).
    pub round: u32,
    /// The full prompt text sent to the model.
    pub prompt: String,
    /// The raw response text received.
    pub response: String,
    /// Parsed argument lines, when the response matched the instructed shape.
    pub arguments: Vec<String>,
    /// Parsed confidence in [0, 1], when present.
    pub confidence: Option<f64>,
    /// When the turn was recorded.
    pub created_at: DateTime<Utc>,
}

impl AgentTurn {
    pub fn new(role: AgentRole, round: u32, prompt: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            role,
            round,
            prompt: prompt.into(),
            response: response.into(),
            arguments: Vec::new(),
            confidence: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_arguments(mut self, arguments: Vec<String>) -> Self {
        self.arguments = arguments;
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence.clamp(0.0, 1.0));
        self
    }
}

/// Error for invalid transcript appends.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranscriptError {
    #[error("expected {expected} for turn {position}, got {actual}")]
    OutOfOrder {
        expected: AgentRole,
        actual: AgentRole,
        position: usize,
    },

    #[error("transcript is closed: the jury foreman has already spoken")]
    Closed,
}

/// Ordered sequence of turns for one case.
///
/// The transcript owns the role order: rounds `1..=deliberation_rounds` each
/// contain one turn per deliberation role, followed by exactly one Jury
/// Foreman turn. `record_turn` rejects anything else.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateTranscript {
    /// Unique transcript identifier.
    pub id: String,
    /// The case this transcript argues.
    pub case_id: u32,
    /// Number of deliberation rounds before the close.
    pub deliberation_rounds: u32,
    /// Recorded turns, in speaking order.
    pub turns: Vec<AgentTurn>,
    /// When the transcript was opened.
    pub created_at: DateTime<Utc>,
}

impl DebateTranscript {
    /// Open a transcript with the default single deliberation round.
    pub fn new(case_id: u32) -> Self {
        Self::with_rounds(case_id, 1)
    }

    /// Open a transcript with `deliberation_rounds` rounds (minimum 1).
    pub fn with_rounds(case_id: u32, deliberation_rounds: u32) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            case_id,
            deliberation_rounds: deliberation_rounds.max(1),
            turns: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Total turns this transcript will contain when complete.
    pub fn expected_len(&self) -> usize {
        DELIBERATION_ROLES.len() * self.deliberation_rounds as usize + 1
    }

    /// The role expected to speak next, or `None` once closed.
    pub fn expected_next(&self) -> Option<AgentRole> {
        let position = self.turns.len();
        let deliberation_turns = DELIBERATION_ROLES.len() * self.deliberation_rounds as usize;
        if position < deliberation_turns {
            Some(DELIBERATION_ROLES[position % DELIBERATION_ROLES.len()])
        } else if position == deliberation_turns {
            Some(AgentRole::JuryForeman)
        } else {
            None
        }
    }

    /// The round the next turn belongs to (the close carries the final round).
    pub fn current_round(&self) -> u32 {
        let position = self.turns.len();
        let per_round = DELIBERATION_ROLES.len();
        let round = position / per_round + 1;
        (round as u32).min(self.deliberation_rounds)
    }

    /// Append a turn, enforcing the fixed role order.
    pub fn record_turn(&mut self, turn: AgentTurn) -> Result<(), TranscriptError> {
        match self.expected_next() {
            None => Err(TranscriptError::Closed),
            Some(expected) if expected != turn.role => Err(TranscriptError::OutOfOrder {
                expected,
                actual: turn.role,
                position: self.turns.len(),
            }),
            Some(_) => {
                self.turns.push(turn);
                Ok(())
            }
        }
    }

    /// Whether the Jury Foreman has spoken.
    pub fn is_closed(&self) -> bool {
        self.expected_next().is_none()
    }

    /// The Jury Foreman's turn, once recorded.
    pub fn closing_turn(&self) -> Option<&AgentTurn> {
        self.turns.iter().find(|t| t.role == AgentRole::JuryForeman)
    }

    /// Render all recorded turns as a context block for the next prompt.
    ///
    /// Context accumulates monotonically: every prior turn's response text
    /// appears, in speaking order, under a role/round header.
    pub fn context_block(&self) -> String {
        if self.turns.is_empty() {
            return "No prior testimony.".to_string();
        }
        let mut lines = Vec::new();
        for turn in &self.turns {
            lines.push(format!("--- {} (round {}) ---", turn.role.title(), turn.round));
            lines.push(turn.response.trim().to_string());
        }
        lines.join("\n")
    }

    /// Compact status line for log output.
    pub fn status_line(&self) -> String {
        format!(
            "[case {}] {}/{} turns | round {}/{}",
            self.case_id,
            self.turns.len(),
            self.expected_len(),
            self.current_round(),
            self.deliberation_rounds
        )
    }
}
