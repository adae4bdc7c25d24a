//! Scripted debate integration test — exercises the full runner loop with a
//! deterministic in-memory client (no LLM calls).
//!
//! Covers: fixed role order, monotonic context accumulation, verdict
//! synthesis, parse-failure surfacing, forced-binary flow, the baseline
//! verifier, and export round-trips.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use courtroom_agents::client::{ClientError, CompletionClient, CompletionRequest};
use courtroom_agents::config::CourtConfig;
use courtroom_agents::runner::{BaselineVerifier, DebateRunner};
use tribunal::case::Case;
use tribunal::debate::AgentRole;
use tribunal::export::{AbortKind, CaseReport};
use tribunal::verdict::VerdictLabel;

/// Replays canned responses in order and records every request it sees.
struct ScriptedClient {
    responses: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<CompletionRequest>>,
    fail_at_call: Option<usize>,
}

impl ScriptedClient {
    fn new(responses: Vec<&str>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into_iter().map(String::from).collect()),
            requests: Mutex::new(Vec::new()),
            fail_at_call: None,
        })
    }

    fn failing_at(responses: Vec<&str>, call: usize) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into_iter().map(String::from).collect()),
            requests: Mutex::new(Vec::new()),
            fail_at_call: Some(call),
        })
    }

    fn recorded(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ClientError> {
        let call_index = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request);
            requests.len() - 1
        };
        if self.fail_at_call == Some(call_index) {
            return Err(ClientError::ApiStatus {
                status: 503,
                body: "service unavailable".to_string(),
            });
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ClientError::MalformedResponse("script exhausted".to_string()))
    }

    fn model(&self) -> &str {
        "scripted-model"
    }
}

fn offline_config() -> CourtConfig {
    CourtConfig {
        base_url: "http://localhost:9999/v1".to_string(),
        api_key: String::new(),
        ..CourtConfig::default()
    }
}

fn test_case() -> Case {
    Case::new(
        0,
        "The probe doubled its speed record",
        "The probe exceeded its previous speed record by 12%",
    )
}

const PROSECUTOR_RESPONSE: &str = r#"{"accusations": [
    {"mutation_type": "exaggeration", "explanation": "\"doubled\" inflates a 12% gain"}
], "confidence": 0.9}"#;

const DEFENSE_RESPONSE: &str = r#"{"rebuttals": [
    {"target_accusation": "doubled inflates the gain",
     "counter_argument": "both statements report a record being beaten"}
], "confidence": 0.4}"#;

const EPISTEMOLOGIST_RESPONSE: &str = r#"{"verifiable_facts": ["a prior record was exceeded"],
    "key_uncertainty": "whether doubled can be read loosely",
    "recommended_confidence_range": [0.6, 0.9]}"#;

const JURY_RESPONSE: &str = r#"{"verdict": "mutated", "confidence": 0.85,
    "reasoning": "Doubling is not a 12% improvement.",
    "mutation_types": ["exaggeration"]}
VERDICT: MUTATED (85%)"#;

// ── Fixed order, exactly four calls ────────────────────────────────

#[tokio::test]
async fn test_exactly_four_calls_in_fixed_role_order() {
    let client = ScriptedClient::new(vec![
        PROSECUTOR_RESPONSE,
        DEFENSE_RESPONSE,
        EPISTEMOLOGIST_RESPONSE,
        JURY_RESPONSE,
    ]);
    let runner = DebateRunner::new(client.clone(), offline_config());

    let outcome = runner.run_case(&test_case()).await.unwrap();
    assert_eq!(outcome.completion_calls, 4);

    let requests = client.recorded();
    assert_eq!(requests.len(), 4);
    assert!(requests[0].system.contains("Prosecutor"));
    assert!(requests[1].system.contains("Defense Attorney"));
    assert!(requests[2].system.contains("Epistemologist"));
    assert!(requests[3].system.contains("Jury Foreman"));

    let roles: Vec<_> = outcome
        .report
        .transcript
        .turns
        .iter()
        .map(|t| t.role)
        .collect();
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

// ── Monotonic context accumulation ─────────────────────────────────

#[tokio::test]
async fn test_context_accumulates_monotonically() {
    let client = ScriptedClient::new(vec![
        PROSECUTOR_RESPONSE,
        DEFENSE_RESPONSE,
        EPISTEMOLOGIST_RESPONSE,
        JURY_RESPONSE,
    ]);
    let runner = DebateRunner::new(client.clone(), offline_config());
    runner.run_case(&test_case()).await.unwrap();

    let requests = client.recorded();
    let responses = [PROSECUTOR_RESPONSE, DEFENSE_RESPONSE, EPISTEMOLOGIST_RESPONSE];

    assert!(requests[0].user.contains("No prior testimony."));
    for (turn_index, request) in requests.iter().enumerate().skip(1) {
        for prior in &responses[..turn_index] {
            assert!(
                request.user.contains(prior.trim()),
                "turn {turn_index} prompt lost a prior response"
            );
        }
    }
    // Every prompt carries the case material.
    for request in &requests {
        assert!(request.user.contains("CLAIM: The probe doubled its speed record"));
        assert!(request.user.contains("FACT: The probe exceeded"));
    }
}

// ── Verdict synthesis ──────────────────────────────────────────────

#[tokio::test]
async fn test_verdict_extracted_from_jury_turn() {
    let client = ScriptedClient::new(vec![
        PROSECUTOR_RESPONSE,
        DEFENSE_RESPONSE,
        EPISTEMOLOGIST_RESPONSE,
        JURY_RESPONSE,
    ]);
    let runner = DebateRunner::new(client, offline_config());

    let outcome = runner.run_case(&test_case()).await.unwrap();
    let verdict = &outcome.report.verdict;
    assert_eq!(verdict.label, VerdictLabel::Mutated);
    assert!((verdict.confidence - 0.85).abs() < f64::EPSILON);
    assert_eq!(verdict.mutation_tags, vec!["exaggeration".to_string()]);
    assert!(!verdict.forced_binary);
}

#[tokio::test]
async fn test_verdict_line_only_jury_response() {
    let client = ScriptedClient::new(vec![
        "unstructured prosecution rant",
        "unstructured defense rant",
        "unstructured epistemology",
        "VERDICT: AMBIGUOUS (80%)",
    ]);
    let runner = DebateRunner::new(client, offline_config());

    let outcome = runner.run_case(&test_case()).await.unwrap();
    assert_eq!(outcome.report.verdict.label, VerdictLabel::Ambiguous);
    assert!((outcome.report.verdict.confidence - 0.80).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_mutation_tags_fall_back_to_prosecution() {
    let jury_without_tags = r#"{"verdict": "mutated", "confidence": 0.8,
        "reasoning": "The inflation stands."}"#;
    let client = ScriptedClient::new(vec![
        PROSECUTOR_RESPONSE,
        DEFENSE_RESPONSE,
        EPISTEMOLOGIST_RESPONSE,
        jury_without_tags,
    ]);
    let runner = DebateRunner::new(client, offline_config());

    let outcome = runner.run_case(&test_case()).await.unwrap();
    assert_eq!(
        outcome.report.verdict.mutation_tags,
        vec!["exaggeration".to_string()]
    );
}

// ── Failure surfacing ──────────────────────────────────────────────

#[tokio::test]
async fn test_malformed_jury_response_is_parse_failure() {
    let client = ScriptedClient::new(vec![
        PROSECUTOR_RESPONSE,
        DEFENSE_RESPONSE,
        EPISTEMOLOGIST_RESPONSE,
        "I simply cannot decide.",
    ]);
    let runner = DebateRunner::new(client, offline_config());

    let err = runner.run_case(&test_case()).await.unwrap_err();
    assert_eq!(err.abort_kind(), AbortKind::ParseFailure);
}

#[tokio::test]
async fn test_api_failure_aborts_case_without_retry() {
    let client = ScriptedClient::failing_at(
        vec![PROSECUTOR_RESPONSE, DEFENSE_RESPONSE],
        2, // epistemologist call fails
    );
    let runner = DebateRunner::new(client.clone(), offline_config());

    let err = runner.run_case(&test_case()).await.unwrap_err();
    assert_eq!(err.abort_kind(), AbortKind::ApiFailure);
    // The failing call was not reissued and the jury was never reached.
    assert_eq!(client.recorded().len(), 3);
}

#[tokio::test]
async fn test_degraded_deliberation_turn_does_not_abort() {
    let client = ScriptedClient::new(vec![
        "no json at all",
        DEFENSE_RESPONSE,
        EPISTEMOLOGIST_RESPONSE,
        JURY_RESPONSE,
    ]);
    let runner = DebateRunner::new(client, offline_config());

    let outcome = runner.run_case(&test_case()).await.unwrap();
    let prosecutor_turn = &outcome.report.transcript.turns[0];
    assert!(prosecutor_turn.arguments.is_empty());
    assert_eq!(prosecutor_turn.response, "no json at all");
    assert_eq!(outcome.report.verdict.label, VerdictLabel::Mutated);
}

// ── Forced-binary flow ─────────────────────────────────────────────

#[tokio::test]
async fn test_forced_binary_issues_one_extra_call() {
    let ambiguous_jury = r#"{"verdict": "ambiguous", "confidence": 0.5,
        "reasoning": "Could go either way."}"#;
    let forced_jury = r#"{"verdict": "mutated", "confidence": 0.6,
        "reasoning": "The balance tips toward distortion."}"#;
    let client = ScriptedClient::new(vec![
        PROSECUTOR_RESPONSE,
        DEFENSE_RESPONSE,
        EPISTEMOLOGIST_RESPONSE,
        ambiguous_jury,
        forced_jury,
    ]);
    let config = CourtConfig {
        force_binary: true,
        ..offline_config()
    };
    let runner = DebateRunner::new(client.clone(), config);

    let outcome = runner.run_case(&test_case()).await.unwrap();
    assert_eq!(outcome.completion_calls, 5);
    assert_eq!(client.recorded().len(), 5);

    let verdict = &outcome.report.verdict;
    assert_eq!(verdict.label, VerdictLabel::Mutated);
    assert!(verdict.forced_binary);
    assert_eq!(verdict.initial_label, Some(VerdictLabel::Ambiguous));

    // The transcript still holds exactly the four debate turns.
    assert_eq!(outcome.report.transcript.turns.len(), 4);
}

#[tokio::test]
async fn test_forced_binary_not_triggered_on_decisive_verdict() {
    let client = ScriptedClient::new(vec![
        PROSECUTOR_RESPONSE,
        DEFENSE_RESPONSE,
        EPISTEMOLOGIST_RESPONSE,
        JURY_RESPONSE,
    ]);
    let config = CourtConfig {
        force_binary: true,
        ..offline_config()
    };
    let runner = DebateRunner::new(client.clone(), config);

    let outcome = runner.run_case(&test_case()).await.unwrap();
    assert_eq!(outcome.completion_calls, 4);
    assert!(!outcome.report.verdict.forced_binary);
}

#[tokio::test]
async fn test_forced_binary_refusal_is_surfaced() {
    let ambiguous_jury = "VERDICT: AMBIGUOUS (50%)";
    let client = ScriptedClient::new(vec![
        PROSECUTOR_RESPONSE,
        DEFENSE_RESPONSE,
        EPISTEMOLOGIST_RESPONSE,
        ambiguous_jury,
        ambiguous_jury, // refuses the binary instruction
    ]);
    let config = CourtConfig {
        force_binary: true,
        ..offline_config()
    };
    let runner = DebateRunner::new(client, config);

    let err = runner.run_case(&test_case()).await.unwrap_err();
    assert_eq!(err.abort_kind(), AbortKind::ParseFailure);
}

// ── Multi-round deliberation ───────────────────────────────────────

#[tokio::test]
async fn test_two_rounds_repeat_deliberation_before_close() {
    let client = ScriptedClient::new(vec![
        PROSECUTOR_RESPONSE,
        DEFENSE_RESPONSE,
        EPISTEMOLOGIST_RESPONSE,
        PROSECUTOR_RESPONSE,
        DEFENSE_RESPONSE,
        EPISTEMOLOGIST_RESPONSE,
        JURY_RESPONSE,
    ]);
    let config = CourtConfig {
        deliberation_rounds: 2,
        ..offline_config()
    };
    let runner = DebateRunner::new(client.clone(), config);

    let outcome = runner.run_case(&test_case()).await.unwrap();
    assert_eq!(outcome.completion_calls, 7);

    let turns = &outcome.report.transcript.turns;
    assert_eq!(turns[3].role, AgentRole::Prosecutor);
    assert_eq!(turns[3].round, 2);
    assert_eq!(turns[6].role, AgentRole::JuryForeman);

    // Round-2 prompts carry round-1 testimony.
    let requests = client.recorded();
    assert!(requests[3].user.contains("(round 1)"));
}

// ── Baseline verifier ──────────────────────────────────────────────

#[tokio::test]
async fn test_baseline_is_a_single_call() {
    let client = ScriptedClient::new(vec![JURY_RESPONSE]);
    let verifier = BaselineVerifier::new(client.clone(), offline_config());

    let verdict = verifier.verify(&test_case()).await.unwrap();
    assert_eq!(verdict.label, VerdictLabel::Mutated);
    assert_eq!(client.recorded().len(), 1);
    assert!(client.recorded()[0].system.contains("one pass"));
}

#[tokio::test]
async fn test_baseline_surfaces_malformed_output() {
    let client = ScriptedClient::new(vec!["no verdict to be found"]);
    let verifier = BaselineVerifier::new(client, offline_config());

    let err = verifier.verify(&test_case()).await.unwrap_err();
    assert_eq!(err.abort_kind(), AbortKind::ParseFailure);
}

// ── Export round-trip ──────────────────────────────────────────────

#[tokio::test]
async fn test_report_roundtrip_preserves_order_and_label() {
    let client = ScriptedClient::new(vec![
        PROSECUTOR_RESPONSE,
        DEFENSE_RESPONSE,
        EPISTEMOLOGIST_RESPONSE,
        JURY_RESPONSE,
    ]);
    let runner = DebateRunner::new(client, offline_config());
    let outcome = runner.run_case(&test_case()).await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let name = outcome.report.write_to_dir(dir.path()).unwrap();
    let restored = CaseReport::read_from_path(dir.path().join(name)).unwrap();

    assert_eq!(restored.verdict.label, outcome.report.verdict.label);
    let original_roles: Vec<_> = outcome.report.transcript.turns.iter().map(|t| t.role).collect();
    let restored_roles: Vec<_> = restored.transcript.turns.iter().map(|t| t.role).collect();
    assert_eq!(original_roles, restored_roles);
}
