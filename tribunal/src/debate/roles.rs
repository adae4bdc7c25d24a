//! Agent roles and the fixed courtroom speaking order.

use serde::{Deserialize, Serialize};

/// Role of a scripted agent in the debate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    /// Argues that the claim mutates the fact.
    Prosecutor,
    /// Argues that the claim faithfully restates the fact.
    Defense,
    /// Assesses what is actually verifiable either way.
    Epistemologist,
    /// Weighs the arguments and delivers the verdict.
    JuryForeman,
}

/// Deliberation speaking order within a round. The Jury Foreman is not a
/// deliberation role; it speaks exactly once, after the final round.
pub const DELIBERATION_ROLES: [AgentRole; 3] = [
    AgentRole::Prosecutor,
    AgentRole::Defense,
    AgentRole::Epistemologist,
];

impl AgentRole {
    /// Whether this role closes the debate.
    pub fn is_closing(self) -> bool {
        self == Self::JuryForeman
    }

    /// Courtroom title used in prompts and Markdown output.
    pub fn title(self) -> &'static str {
        match self {
            Self::Prosecutor => "Prosecutor",
            Self::Defense => "Defense Attorney",
            Self::Epistemologist => "Epistemologist",
            Self::JuryForeman => "Jury Foreman",
        }
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Prosecutor => write!(f, "prosecutor"),
            Self::Defense => write!(f, "defense"),
            Self::Epistemologist => write!(f, "epistemologist"),
            Self::JuryForeman => write!(f, "jury_foreman"),
        }
    }
}
