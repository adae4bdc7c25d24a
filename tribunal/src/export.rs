//! Report/export layer — JSON case reports, run summaries, comparison data,
//! and Markdown rendering. Pure formatting; no business logic.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::case::Case;
use crate::debate::DebateTranscript;
use crate::verdict::{Verdict, VerdictLabel};

/// Error during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialize failed: {0}")]
    SerializeFailed(String),

    #[error("deserialize failed: {0}")]
    DeserializeFailed(String),

    #[error("schema version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

/// One case's complete debate output: transcript plus verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseReport {
    /// Schema version for forward compatibility.
    pub version: u32,
    pub case: Case,
    pub transcript: DebateTranscript,
    pub verdict: Verdict,
}

impl CaseReport {
    /// Current schema version.
    pub const CURRENT_VERSION: u32 = 1;

    pub fn new(case: Case, transcript: DebateTranscript, verdict: Verdict) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            case,
            transcript,
            verdict,
        }
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, ExportError> {
        serde_json::to_string_pretty(self).map_err(|e| ExportError::SerializeFailed(e.to_string()))
    }

    /// Deserialize from JSON, rejecting newer schema versions.
    pub fn from_json(json: &str) -> Result<Self, ExportError> {
        let report: Self = serde_json::from_str(json)
            .map_err(|e| ExportError::DeserializeFailed(e.to_string()))?;
        if report.version > Self::CURRENT_VERSION {
            return Err(ExportError::VersionMismatch {
                expected: Self::CURRENT_VERSION,
                found: report.version,
            });
        }
        Ok(report)
    }

    /// Write the report to `<dir>/case_<id>.json` and return the file name.
    pub fn write_to_dir(&self, dir: impl AsRef<Path>) -> Result<String, ExportError> {
        let name = format!("case_{}.json", self.case.id);
        std::fs::write(dir.as_ref().join(&name), self.to_json()?)?;
        Ok(name)
    }

    /// Read a report back from a file.
    pub fn read_from_path(path: impl AsRef<Path>) -> Result<Self, ExportError> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }
}

/// Why a case produced no verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbortKind {
    /// The model API call failed; the case was abandoned with no retry.
    ApiFailure,
    /// The Jury Foreman's output did not match any instructed shape.
    ParseFailure,
}

/// Record of a case that ended without a verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbortedCase {
    pub case_id: u32,
    pub kind: AbortKind,
    pub reason: String,
}

/// Verdict label tallies for one system.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerdictDistribution {
    pub faithful: usize,
    pub mutated: usize,
    pub ambiguous: usize,
}

impl VerdictDistribution {
    pub fn tally<'a>(labels: impl Iterator<Item = &'a VerdictLabel>) -> Self {
        let mut distribution = Self::default();
        for label in labels {
            match label {
                VerdictLabel::Faithful => distribution.faithful += 1,
                VerdictLabel::Mutated => distribution.mutated += 1,
                VerdictLabel::Ambiguous => distribution.ambiguous += 1,
            }
        }
        distribution
    }
}

/// Aggregate statistics over one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStatistics {
    pub total_cases: usize,
    pub completed: usize,
    pub aborted_api_failures: usize,
    pub parse_failures: usize,
    pub verdict_distribution: VerdictDistribution,
    /// Mean verdict confidence over completed cases (0.0 when none).
    pub average_confidence: f64,
    /// How many verdicts were forced to a binary label.
    pub forced_binary_count: usize,
}

impl RunStatistics {
    pub fn compute(reports: &[CaseReport], aborted: &[AbortedCase]) -> Self {
        let completed = reports.len();
        let average_confidence = if completed == 0 {
            0.0
        } else {
            reports.iter().map(|r| r.verdict.confidence).sum::<f64>() / completed as f64
        };
        Self {
            total_cases: completed + aborted.len(),
            completed,
            aborted_api_failures: aborted
                .iter()
                .filter(|a| a.kind == AbortKind::ApiFailure)
                .count(),
            parse_failures: aborted
                .iter()
                .filter(|a| a.kind == AbortKind::ParseFailure)
                .count(),
            verdict_distribution: VerdictDistribution::tally(
                reports.iter().map(|r| &r.verdict.label),
            ),
            average_confidence,
            forced_binary_count: reports.iter().filter(|r| r.verdict.forced_binary).count(),
        }
    }
}

/// Run-level metadata carried on every summary export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
    /// Human description of the run (system + selection).
    pub description: String,
    /// Model the completions were issued against.
    pub model: String,
    /// Prompt template version in effect.
    pub prompt_version: String,
    /// Deliberation rounds per case.
    pub deliberation_rounds: u32,
    pub generated_at: DateTime<Utc>,
}

/// A full run's exports: every case report plus aggregate statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub version: u32,
    pub metadata: RunMetadata,
    pub reports: Vec<CaseReport>,
    pub aborted: Vec<AbortedCase>,
    pub statistics: RunStatistics,
}

impl RunSummary {
    pub fn new(metadata: RunMetadata, reports: Vec<CaseReport>, aborted: Vec<AbortedCase>) -> Self {
        let statistics = RunStatistics::compute(&reports, &aborted);
        Self {
            version: CaseReport::CURRENT_VERSION,
            metadata,
            reports,
            aborted,
            statistics,
        }
    }

    pub fn to_json(&self) -> Result<String, ExportError> {
        serde_json::to_string_pretty(self).map_err(|e| ExportError::SerializeFailed(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, ExportError> {
        serde_json::from_str(json).map_err(|e| ExportError::DeserializeFailed(e.to_string()))
    }

    /// Write the summary to `<dir>/run_summary.json`.
    pub fn write_to_dir(&self, dir: impl AsRef<Path>) -> Result<(), ExportError> {
        std::fs::write(dir.as_ref().join("run_summary.json"), self.to_json()?)?;
        Ok(())
    }

    /// Render the run as a human-readable Markdown report.
    pub fn to_markdown(&self) -> String {
        let mut out = Vec::new();
        out.push("# Courtroom Debate Report".to_string());
        out.push(String::new());
        out.push(format!(
            "- Model: `{}` (prompts v{})",
            self.metadata.model, self.metadata.prompt_version
        ));
        out.push(format!(
            "- Cases: {} completed, {} aborted",
            self.statistics.completed,
            self.statistics.total_cases - self.statistics.completed
        ));
        out.push(format!(
            "- Verdicts: {} faithful / {} mutated / {} ambiguous, avg confidence {:.0}%",
            self.statistics.verdict_distribution.faithful,
            self.statistics.verdict_distribution.mutated,
            self.statistics.verdict_distribution.ambiguous,
            self.statistics.average_confidence * 100.0
        ));
        out.push(String::new());

        for report in &self.reports {
            out.push(format!("## Case {}: {}", report.case.id, report.verdict.summary()));
            out.push(String::new());
            out.push(format!("> Claim: {}", report.case.claim));
            out.push(format!("> Fact: {}", report.case.fact));
            out.push(String::new());
            if !report.verdict.mutation_tags.is_empty() {
                out.push(format!(
                    "Mutation tags: {}",
                    report.verdict.mutation_tags.join(", ")
                ));
                out.push(String::new());
            }
            if report.verdict.forced_binary {
                if let Some(initial) = report.verdict.initial_label {
                    out.push(format!("Forced to binary from {}.", initial.token()));
                    out.push(String::new());
                }
            }
            for turn in &report.transcript.turns {
                out.push(format!("### {} (round {})", turn.role.title(), turn.round));
                out.push(String::new());
                out.push(turn.response.trim().to_string());
                out.push(String::new());
            }
        }

        for aborted in &self.aborted {
            out.push(format!(
                "## Case {}: no verdict ({:?})",
                aborted.case_id, aborted.kind
            ));
            out.push(String::new());
            out.push(aborted.reason.clone());
            out.push(String::new());
        }

        out.join("\n")
    }
}

/// One case's single-agent baseline result (no transcript).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaselineEntry {
    pub case: Case,
    pub verdict: Verdict,
}

/// A baseline run's exports: per-case verdicts plus aggregates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaselineSummary {
    pub version: u32,
    pub metadata: RunMetadata,
    pub entries: Vec<BaselineEntry>,
    pub aborted: Vec<AbortedCase>,
    pub statistics: SystemStatistics,
}

impl BaselineSummary {
    pub fn new(metadata: RunMetadata, entries: Vec<BaselineEntry>, aborted: Vec<AbortedCase>) -> Self {
        Self {
            version: CaseReport::CURRENT_VERSION,
            statistics: SystemStatistics::compute(entries.iter().map(|e| &e.verdict)),
            metadata,
            entries,
            aborted,
        }
    }

    pub fn to_json(&self) -> Result<String, ExportError> {
        serde_json::to_string_pretty(self).map_err(|e| ExportError::SerializeFailed(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, ExportError> {
        serde_json::from_str(json).map_err(|e| ExportError::DeserializeFailed(e.to_string()))
    }

    /// Write the summary to `<dir>/baseline_summary.json`.
    pub fn write_to_dir(&self, dir: impl AsRef<Path>) -> Result<(), ExportError> {
        std::fs::write(dir.as_ref().join("baseline_summary.json"), self.to_json()?)?;
        Ok(())
    }
}

/// One case compared across the baseline and debate systems.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonEntry {
    pub case: Case,
    pub baseline: Verdict,
    pub debate: Verdict,
    /// Whether both systems reached the same label.
    pub systems_agree: bool,
}

impl ComparisonEntry {
    pub fn new(case: Case, baseline: Verdict, debate: Verdict) -> Self {
        let systems_agree = baseline.label == debate.label;
        Self {
            case,
            baseline,
            debate,
            systems_agree,
        }
    }
}

/// Per-system aggregates inside a comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemStatistics {
    pub verdict_distribution: VerdictDistribution,
    pub average_confidence: f64,
}

impl SystemStatistics {
    fn compute<'a>(verdicts: impl Iterator<Item = &'a Verdict> + Clone) -> Self {
        let count = verdicts.clone().count();
        let average_confidence = if count == 0 {
            0.0
        } else {
            verdicts.clone().map(|v| v.confidence).sum::<f64>() / count as f64
        };
        Self {
            verdict_distribution: VerdictDistribution::tally(verdicts.map(|v| &v.label)),
            average_confidence,
        }
    }
}

/// Side-by-side export of the single-agent baseline and the debate system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub version: u32,
    pub metadata: RunMetadata,
    pub entries: Vec<ComparisonEntry>,
    pub baseline_statistics: SystemStatistics,
    pub debate_statistics: SystemStatistics,
    /// Fraction of cases where both systems agreed on the label.
    pub agreement_rate: f64,
}

impl ComparisonReport {
    pub fn new(metadata: RunMetadata, entries: Vec<ComparisonEntry>) -> Self {
        let agreement_rate = if entries.is_empty() {
            0.0
        } else {
            entries.iter().filter(|e| e.systems_agree).count() as f64 / entries.len() as f64
        };
        Self {
            version: CaseReport::CURRENT_VERSION,
            baseline_statistics: SystemStatistics::compute(entries.iter().map(|e| &e.baseline)),
            debate_statistics: SystemStatistics::compute(entries.iter().map(|e| &e.debate)),
            agreement_rate,
            metadata,
            entries,
        }
    }

    pub fn to_json(&self) -> Result<String, ExportError> {
        serde_json::to_string_pretty(self).map_err(|e| ExportError::SerializeFailed(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, ExportError> {
        serde_json::from_str(json).map_err(|e| ExportError::DeserializeFailed(e.to_string()))
    }

    /// Write the comparison to `<dir>/comparison.json`.
    pub fn write_to_dir(&self, dir: impl AsRef<Path>) -> Result<(), ExportError> {
        std::fs::write(dir.as_ref().join("comparison.json"), self.to_json()?)?;
        Ok(())
    }

    /// Render a compact Markdown comparison table.
    pub fn to_markdown(&self) -> String {
        let mut out = Vec::new();
        out.push("# Baseline vs Debate Comparison".to_string());
        out.push(String::new());
        out.push(format!(
            "Agreement: {:.0}% over {} cases",
            self.agreement_rate * 100.0,
            self.entries.len()
        ));
        out.push(String::new());
        out.push("| Case | Baseline | Debate | Agree |".to_string());
        out.push("|------|----------|--------|-------|".to_string());
        for entry in &self.entries {
            out.push(format!(
                "| {} | {} | {} | {} |",
                entry.case.id,
                entry.baseline.summary(),
                entry.debate.summary(),
                if entry.systems_agree { "yes" } else { "no" }
            ));
        }
        out.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debate::{AgentRole, AgentTurn};

    fn make_report(id: u32, label: VerdictLabel, confidence: f64) -> CaseReport {
        let case = Case::new(id, format!("claim {id}"), format!("fact {id}"));
        let mut transcript = DebateTranscript::new(id);
        for role in [
            AgentRole::Prosecutor,
            AgentRole::Defense,
            AgentRole::Epistemologist,
            AgentRole::JuryForeman,
        ] {
            transcript
                .record_turn(AgentTurn::new(role, 1, "p", format!("{role} argues")))
                .unwrap();
        }
        CaseReport::new(case, transcript, Verdict::new(label, confidence, "because"))
    }

    fn metadata() -> RunMetadata {
        RunMetadata {
            description: "test run".to_string(),
            model: "test-model".to_string(),
            prompt_version: "0.0.0".to_string(),
            deliberation_rounds: 1,
            generated_at: Utc::now(),
        }
    }

    #[test]
    fn test_case_report_roundtrip_preserves_order_and_label() {
        let report = make_report(0, VerdictLabel::Mutated, 0.8);
        let json = report.to_json().unwrap();
        let restored = CaseReport::from_json(&json).unwrap();

        assert_eq!(restored.verdict.label, VerdictLabel::Mutated);
        let roles: Vec<_> = restored.transcript.turns.iter().map(|t| t.role).collect();
        assert_eq!(
            roles,
            vec![
                AgentRole::Prosecutor,
                AgentRole::Defense,
                AgentRole::Epistemologist,
                AgentRole::JuryForeman,
            ]
        );
    }

    #[test]
    fn test_case_report_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let report = make_report(5, VerdictLabel::Faithful, 0.9);
        let name = report.write_to_dir(dir.path()).unwrap();
        assert_eq!(name, "case_5.json");

        let restored = CaseReport::read_from_path(dir.path().join(name)).unwrap();
        assert_eq!(restored.case.id, 5);
        assert_eq!(restored.verdict.label, VerdictLabel::Faithful);
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let report = make_report(0, VerdictLabel::Faithful, 0.9);
        let mut value = serde_json::to_value(&report).unwrap();
        value["version"] = serde_json::json!(99);
        let err = CaseReport::from_json(&value.to_string()).unwrap_err();
        assert!(matches!(err, ExportError::VersionMismatch { found: 99, .. }));
    }

    #[test]
    fn test_run_statistics() {
        let reports = vec![
            make_report(0, VerdictLabel::Faithful, 0.9),
            make_report(1, VerdictLabel::Mutated, 0.7),
            make_report(2, VerdictLabel::Mutated, 0.8),
        ];
        let aborted = vec![
            AbortedCase {
                case_id: 3,
                kind: AbortKind::ApiFailure,
                reason: "connection refused".to_string(),
            },
            AbortedCase {
                case_id: 4,
                kind: AbortKind::ParseFailure,
                reason: "no structured verdict".to_string(),
            },
        ];

        let stats = RunStatistics::compute(&reports, &aborted);
        assert_eq!(stats.total_cases, 5);
        assert_eq!(stats.completed, 3);
        assert_eq!(stats.aborted_api_failures, 1);
        assert_eq!(stats.parse_failures, 1);
        assert_eq!(stats.verdict_distribution.mutated, 2);
        assert!((stats.average_confidence - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_empty_run_statistics() {
        let stats = RunStatistics::compute(&[], &[]);
        assert_eq!(stats.total_cases, 0);
        assert_eq!(stats.average_confidence, 0.0);
    }

    #[test]
    fn test_run_summary_roundtrip_and_markdown() {
        let summary = RunSummary::new(
            metadata(),
            vec![make_report(0, VerdictLabel::Ambiguous, 0.8)],
            vec![],
        );
        let restored = RunSummary::from_json(&summary.to_json().unwrap()).unwrap();
        assert_eq!(restored.reports.len(), 1);
        assert_eq!(restored.statistics.verdict_distribution.ambiguous, 1);

        let markdown = summary.to_markdown();
        assert!(markdown.contains("## Case 0: AMBIGUOUS (80%)"));
        assert!(markdown.contains("### Prosecutor (round 1)"));
    }

    #[test]
    fn test_comparison_report() {
        let entries = vec![
            ComparisonEntry::new(
                Case::new(0, "c", "f"),
                Verdict::new(VerdictLabel::Faithful, 0.9, ""),
                Verdict::new(VerdictLabel::Faithful, 0.8, ""),
            ),
            ComparisonEntry::new(
                Case::new(1, "c", "f"),
                Verdict::new(VerdictLabel::Faithful, 0.95, ""),
                Verdict::new(VerdictLabel::Mutated, 0.7, ""),
            ),
        ];
        let report = ComparisonReport::new(metadata(), entries);
        assert!((report.agreement_rate - 0.5).abs() < f64::EPSILON);
        assert_eq!(report.baseline_statistics.verdict_distribution.faithful, 2);
        assert_eq!(report.debate_statistics.verdict_distribution.mutated, 1);

        let restored = ComparisonReport::from_json(&report.to_json().unwrap()).unwrap();
        assert_eq!(restored.entries.len(), 2);

        let markdown = report.to_markdown();
        assert!(markdown.contains("| 1 | FAITHFUL (95%) | MUTATED (70%) | no |"));
    }

    #[test]
    fn test_baseline_summary_statistics() {
        let entries = vec![
            BaselineEntry {
                case: Case::new(0, "c", "f"),
                verdict: Verdict::new(VerdictLabel::Faithful, 0.8, ""),
            },
            BaselineEntry {
                case: Case::new(1, "c", "f"),
                verdict: Verdict::new(VerdictLabel::Ambiguous, 0.6, ""),
            },
        ];
        let summary = BaselineSummary::new(metadata(), entries, vec![]);
        assert_eq!(summary.statistics.verdict_distribution.faithful, 1);
        assert!((summary.statistics.average_confidence - 0.7).abs() < 1e-9);

        let restored = BaselineSummary::from_json(&summary.to_json().unwrap()).unwrap();
        assert_eq!(restored.entries.len(), 2);
    }

    #[test]
    fn test_comparison_write_to_dir() {
        let dir = tempfile::tempdir().unwrap();
        let report = ComparisonReport::new(metadata(), vec![]);
        report.write_to_dir(dir.path()).unwrap();
        assert!(dir.path().join("comparison.json").exists());
    }
}
