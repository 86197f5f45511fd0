//! End-to-end turn scenarios driven with deterministic reasoners.

use mock_reasoner::{CannedReasoner, ScriptedReasoner};
use orchestrator::{Orchestrator, RoutingDecision, Session, TurnState};
use sandbox::Sandbox;
use tabular::Dataset;

const PNG_MAGIC: [u8; 4] = [0x89, b'P', b'N', b'G'];

/// 100 rows, 3 numeric columns, a few holes in `b`.
fn numeric_dataset() -> Dataset {
    let mut csv = String::from("a,b,c\n");
    for i in 0..100 {
        if i % 10 == 0 {
            csv.push_str(&format!("{},,{}\n", i, i * 2));
        } else {
            csv.push_str(&format!("{},{}.5,{}\n", i, i, i * 2));
        }
    }
    Dataset::from_csv_str(&csv).unwrap()
}

#[tokio::test]
async fn direct_answer_runs_no_code() {
    let reasoner = ScriptedReasoner::new([
        "synthesize",
        "Column b has 10 missing values; a and c are complete.",
    ]);
    let orchestrator = Orchestrator::new(reasoner, Sandbox::new());
    let mut session = Session::new(orchestrator, numeric_dataset());

    let reply = session.ask("how many missing values?").await;

    assert_eq!(
        reply.text.as_deref(),
        Some("Column b has 10 missing values; a and c are complete.")
    );
    assert!(reply.image.is_none());
    assert!(reply.error.is_none());
    assert_eq!(session.profile().unwrap().rows, 100);
    assert_eq!(session.profile().unwrap().missing["b"], 10);
}

#[tokio::test]
async fn chart_question_produces_image() {
    let reasoner = ScriptedReasoner::new([
        "generate_code",
        "```lua\nchart:title(\"a\")\nchart:xlabel(\"value\")\nchart:histogram(df:col(\"a\"), 10)\n```",
        "The histogram shows a flat distribution of a.",
    ]);
    let orchestrator = Orchestrator::new(reasoner, Sandbox::new());
    let mut session = Session::new(orchestrator, numeric_dataset());

    let reply = session.ask("plot a histogram of column a").await;

    let image = reply.image.expect("histogram bytes");
    assert_eq!(&image[..4], &PNG_MAGIC);
    assert!(reply.text.is_some());
    assert!(reply.error.is_none());
}

#[tokio::test]
async fn raising_code_fails_softly_and_is_explained() {
    let reasoner = ScriptedReasoner::new([
        "generate_code",
        "error('division by zero')",
        "The analysis code hit a division by zero, so there is no numeric result.",
    ]);
    let orchestrator = Orchestrator::new(reasoner, Sandbox::new());

    let state = orchestrator
        .run_turn(
            &numeric_dataset(),
            TurnState::new("divide a by zero", None, vec![]),
        )
        .await;

    let result = state.execution_result.as_ref().unwrap();
    assert!(!result.success());
    assert!(result.image().is_none());
    assert!(result.error().unwrap().contains("division by zero"));
    // Synthesis still produced, explaining the failure.
    assert!(state
        .synthesis
        .as_deref()
        .unwrap()
        .contains("division by zero"));
}

#[tokio::test]
async fn unrecognized_routing_token_ends_the_turn() {
    let reasoner = CannedReasoner::new("MAYBE");
    let orchestrator = Orchestrator::new(reasoner, Sandbox::new());

    let state = orchestrator
        .run_turn(&numeric_dataset(), TurnState::new("hmm", None, vec![]))
        .await;

    assert_eq!(state.routing_decision, Some(RoutingDecision::End));
    assert!(state.execution_result.is_none(), "sandbox must not run");
    assert!(state.synthesis.is_none());
    assert_eq!(orchestrator.reasoner().call_count(), 1);
}

#[tokio::test]
async fn sandbox_mutations_never_reach_the_session_dataset() {
    let reasoner = ScriptedReasoner::new([
        "generate_code",
        "for i = 1, df:rows() do df:set('a', i, 0) end\nprint(df:get('a', 1))",
        "Zeroed a copy of column a.",
    ]);
    let orchestrator = Orchestrator::new(reasoner, Sandbox::new());
    let dataset = numeric_dataset();
    let pristine = dataset.clone();
    let mut session = Session::new(orchestrator, dataset);

    let reply = session.ask("zero out column a").await;

    assert!(reply.error.is_none());
    assert_eq!(session.dataset(), &pristine);
}

#[tokio::test]
async fn history_snapshot_reaches_later_turns() {
    let reasoner = ScriptedReasoner::new([
        "synthesize",
        "The mean of a is 49.5.",
        "synthesize",
        "As established, the mean of a is 49.5.",
    ]);
    let orchestrator = Orchestrator::new(reasoner, Sandbox::new());
    let mut session = Session::new(orchestrator, numeric_dataset());

    session.ask("what is the mean of a?").await;
    session.ask("remind me of that mean?").await;

    assert_eq!(session.history().len(), 2);
    assert!(session.history()[0].contains("mean of a is 49.5"));
}
