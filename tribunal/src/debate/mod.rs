//! Courtroom Debate — fixed role sequence and ordered transcript.
//!
//! One case is argued by four scripted roles in a fixed total order; the
//! transcript enforces that order and accumulates context monotonically.
//!
//! # Turn order
//!
//! ```text
//! round 1..=R (deliberation)          close
//! ┌──────────────────────────────┐   ┌─────────────┐
//! │ Prosecutor → Defense →       │ → │ JuryForeman │ → closed
//! │ Epistemologist               │   └─────────────┘
//! └──────────────────────────────┘
//! ```
//!
//! With the default of one deliberation round this is exactly four turns:
//! Prosecutor, Defense, Epistemologist, Jury Foreman. Out-of-order appends
//! and appends after the close are rejected, never reordered.

pub mod roles;
pub mod transcript;

pub use roles::{AgentRole, DELIBERATION_ROLES};
pub use transcript::{AgentTurn, DebateTranscript, TranscriptError};
