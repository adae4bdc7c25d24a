//! Verdict model and format-directed parsing of model output.
//!
//! The Jury Foreman is instructed to answer in JSON and to end with a
//! `VERDICT: <LABEL> (NN%)` line. Parsing is JSON-first with the verdict
//! line as fallback; anything else is an explicit parse failure — the
//! synthesizer never invents a label for output it could not read.

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::debate::AgentRole;

/// Final classification of a claim against its fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerdictLabel {
    /// The claim faithfully restates the fact.
    Faithful,
    /// The claim distorts the fact.
    Mutated,
    /// The debate could not settle the question.
    Ambiguous,
}

impl VerdictLabel {
    /// Parse a label token case-insensitively.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "faithful" => Some(Self::Faithful),
            "mutated" => Some(Self::Mutated),
            "ambiguous" => Some(Self::Ambiguous),
            _ => None,
        }
    }

    /// Uppercase token as it appears in a `VERDICT:` line.
    pub fn token(self) -> &'static str {
        match self {
            Self::Faithful => "FAITHFUL",
            Self::Mutated => "MUTATED",
            Self::Ambiguous => "AMBIGUOUS",
        }
    }
}

impl std::fmt::Display for VerdictLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Faithful => write!(f, "faithful"),
            Self::Mutated => write!(f, "mutated"),
            Self::Ambiguous => write!(f, "ambiguous"),
        }
    }
}

/// The final verdict for one case. Immutable once produced; exactly one per
/// case per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    /// Final label.
    pub label: VerdictLabel,
    /// Confidence in [0, 1].
    pub confidence: f64,
    /// Free-text reasoning from the Jury Foreman.
    pub reasoning: String,
    /// Mutation-type tags raised during the debate (empty for faithful).
    #[serde(default)]
    pub mutation_tags: Vec<String>,
    /// Whether a binary choice was forced after an ambiguous close.
    #[serde(default)]
    pub forced_binary: bool,
    /// The label before forcing, when `forced_binary` is set.
    #[serde(default)]
    pub initial_label: Option<VerdictLabel>,
}

impl Verdict {
    pub fn new(label: VerdictLabel, confidence: f64, reasoning: impl Into<String>) -> Self {
        Self {
            label,
            confidence: confidence.clamp(0.0, 1.0),
            reasoning: reasoning.into(),
            mutation_tags: Vec::new(),
            forced_binary: false,
            initial_label: None,
        }
    }

    pub fn with_mutation_tags(mut self, tags: Vec<String>) -> Self {
        self.mutation_tags = tags;
        self
    }

    /// Record that this verdict replaced `initial` via a forced binary call.
    pub fn forced_from(mut self, initial: VerdictLabel) -> Self {
        self.forced_binary = true;
        self.initial_label = Some(initial);
        self
    }

    /// Compact `LABEL (NN%)` rendering for logs and Markdown.
    pub fn summary(&self) -> String {
        format!("{} ({:.0}%)", self.label.token(), self.confidence * 100.0)
    }
}

/// Error extracting a verdict from Jury Foreman output.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VerdictParseError {
    #[error("response contains no structured verdict (no JSON object and no VERDICT line)")]
    NoStructuredVerdict,

    #[error("unknown verdict label `{0}`")]
    UnknownLabel(String),

    #[error("confidence {0} is outside [0, 100]")]
    ConfidenceOutOfRange(f64),
}

/// Instructed JSON shape for the Jury Foreman.
#[derive(Debug, Deserialize)]
struct JuryResponse {
    verdict: String,
    confidence: f64,
    #[serde(default)]
    reasoning: String,
    #[serde(default)]
    mutation_types: Vec<String>,
}

/// Parse the Jury Foreman's raw response into a [`Verdict`].
///
/// Tries the instructed JSON shape first (bare, fenced, or embedded), then
/// falls back to a `VERDICT: <LABEL> (NN%)` line. Returns an error when
/// neither form is present — the caller surfaces the failure instead of
/// receiving a fabricated verdict.
pub fn parse_jury_response(text: &str) -> Result<Verdict, VerdictParseError> {
    if let Some(json) = extract_json(text) {
        if let Ok(parsed) = serde_json::from_str::<JuryResponse>(&json) {
            let label = VerdictLabel::from_token(&parsed.verdict)
                .ok_or_else(|| VerdictParseError::UnknownLabel(parsed.verdict.clone()))?;
            let confidence = normalize_confidence(parsed.confidence)?;
            return Ok(
                Verdict::new(label, confidence, parsed.reasoning.trim())
                    .with_mutation_tags(parsed.mutation_types),
            );
        }
    }

    parse_verdict_line(text).ok_or(VerdictParseError::NoStructuredVerdict)?
}

/// Parse the `VERDICT: <LABEL> (NN%)` fallback form.
fn parse_verdict_line(text: &str) -> Option<Result<Verdict, VerdictParseError>> {
    let re = Regex::new(
        r"(?i)VERDICT:\s*(FAITHFUL|MUTATED|AMBIGUOUS)\s*\(\s*(\d+(?:\.\d+)?)\s*%\s*\)",
    )
    .ok()?;
    let captures = re.captures(text)?;

    let label = VerdictLabel::from_token(&captures[1])?;
    let raw_confidence: f64 = captures[2].parse().ok()?;

    let reasoning = re.replace(text, "").trim().to_string();
    Some(match normalize_confidence(raw_confidence) {
        Ok(confidence) => Ok(Verdict::new(label, confidence, reasoning)),
        Err(e) => Err(e),
    })
}

/// Accept confidence as a fraction (`0.8`) or a percentage (`80`), normalized
/// to [0, 1]. Values outside [0, 100] are rejected rather than clamped.
fn normalize_confidence(raw: f64) -> Result<f64, VerdictParseError> {
    if (0.0..=1.0).contains(&raw) {
        Ok(raw)
    } else if (1.0..=100.0).contains(&raw) {
        Ok(raw / 100.0)
    } else {
        Err(VerdictParseError::ConfidenceOutOfRange(raw))
    }
}

/// Locate a JSON object in a response — bare, inside a ```json fence, or
/// embedded in surrounding prose.
pub fn extract_json(text: &str) -> Option<String> {
    let trimmed = text.trim();

    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        return Some(trimmed.to_string());
    }

    if let Some(start) = trimmed.find("```json") {
        if let Some(end) = trimmed[start + 7..].find("```") {
            return Some(trimmed[start + 7..start + 7 + end].trim().to_string());
        }
    }

    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end > start {
        Some(trimmed[start..=end].to_string())
    } else {
        None
    }
}

/// Best-effort structure recovered from a deliberation turn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeliberationSummary {
    /// Argument lines (accusations, rebuttals, or verifiable facts).
    pub arguments: Vec<String>,
    /// Confidence in [0, 1], when the response carried one.
    pub confidence: Option<f64>,
    /// Mutation-type tags (Prosecutor only).
    pub mutation_tags: Vec<String>,
}

/// Parse a Prosecutor/Defense/Epistemologist response best-effort.
///
/// A response that does not match the instructed shape degrades to an empty
/// summary — the raw text stays on the turn, and a degraded deliberation
/// turn never aborts the case.
pub fn parse_deliberation_response(role: AgentRole, text: &str) -> DeliberationSummary {
    let Some(json) = extract_json(text) else {
        return DeliberationSummary::default();
    };
    let Ok(value) = serde_json::from_str::<serde_json::Value>(&json) else {
        return DeliberationSummary::default();
    };

    let mut summary = DeliberationSummary {
        confidence: value
            .get("confidence")
            .and_then(serde_json::Value::as_f64)
            .and_then(|c| normalize_confidence(c).ok()),
        ..Default::default()
    };

    match role {
        AgentRole::Prosecutor => {
            if let Some(accusations) = value.get("accusations").and_then(|v| v.as_array()) {
                for accusation in accusations {
                    if let Some(explanation) =
                        accusation.get("explanation").and_then(|v| v.as_str())
                    {
                        summary.arguments.push(explanation.to_string());
                    }
                    if let Some(tag) = accusation.get("mutation_type").and_then(|v| v.as_str()) {
                        summary.mutation_tags.push(tag.to_string());
                    }
                }
            }
        }
        AgentRole::Defense => {
            if let Some(rebuttals) = value.get("rebuttals").and_then(|v| v.as_array()) {
                for rebuttal in rebuttals {
                    if let Some(counter) =
                        rebuttal.get("counter_argument").and_then(|v| v.as_str())
                    {
                        summary.arguments.push(counter.to_string());
                    }
                }
            }
        }
        AgentRole::Epistemologist => {
            if let Some(facts) = value.get("verifiable_facts").and_then(|v| v.as_array()) {
                summary
                    .arguments
                    .extend(facts.iter().filter_map(|f| f.as_str().map(String::from)));
            }
            if let Some(uncertainty) = value.get("key_uncertainty").and_then(|v| v.as_str()) {
                summary.arguments.push(uncertainty.to_string());
            }
            // The range's upper bound stands in for confidence when no
            // scalar confidence was given.
            if summary.confidence.is_none() {
                summary.confidence = value
                    .get("recommended_confidence_range")
                    .and_then(|v| v.as_array())
                    .and_then(|range| range.last())
                    .and_then(serde_json::Value::as_f64)
                    .and_then(|c| normalize_confidence(c).ok());
            }
        }
        AgentRole::JuryForeman => {
            // The close is parsed by `parse_jury_response`; nothing to do here.
        }
    }

    summary
}
