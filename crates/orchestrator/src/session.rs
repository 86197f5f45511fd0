//! Session state: the persistent context spanning turns.

use reasoner_core::Reasoner;
use tabular::{Dataset, DatasetProfile};
use tracing::info;

use crate::machine::Orchestrator;
use crate::state::TurnState;

/// What one turn hands back to the caller.
///
/// An absent `image` means "no chart this turn", not an error. An absent
/// `text` means the turn ended without an assistant message (the `end`
/// routing outcome, or a reasoning-service failure described by `error`).
#[derive(Debug, Clone, Default)]
pub struct TurnReply {
    /// The user-visible answer, if synthesis ran.
    pub text: Option<String>,
    /// PNG chart bytes, if the turn produced one.
    pub image: Option<Vec<u8>>,
    /// Turn-level error detail, if any step failed.
    pub error: Option<String>,
}

/// The persistent context for one conversation: the dataset, its cached
/// profile, and the append-only history.
///
/// `ask` takes `&mut self`, so turns within a session are statically
/// serialized: no turn can start before the previous one has been folded
/// back. Turn results are folded in only after the machine reaches its
/// terminal state, so the session is never left half-updated.
pub struct Session<R: Reasoner> {
    orchestrator: Orchestrator<R>,
    dataset: Dataset,
    profile: Option<DatasetProfile>,
    history: Vec<String>,
}

impl<R: Reasoner> Session<R> {
    /// Open a session over a loaded dataset.
    pub fn new(orchestrator: Orchestrator<R>, dataset: Dataset) -> Self {
        Self {
            orchestrator,
            dataset,
            profile: None,
            history: Vec::new(),
        }
    }

    /// Process one user question, in arrival order.
    pub async fn ask(&mut self, question: &str) -> TurnReply {
        let state = TurnState::new(question, self.profile.clone(), self.history.clone());
        let state = self.orchestrator.run_turn(&self.dataset, state).await;

        // Fold back only after TERMINAL.
        if state.profile.is_some() {
            self.profile = state.profile.clone();
        }

        let text = state.synthesis.clone();
        self.history.push(format!(
            "Q: {}\nA: {}",
            state.user_question,
            text.as_deref().unwrap_or("(no reply)")
        ));
        info!("turn folded back; history now {} entries", self.history.len());

        TurnReply {
            text,
            image: state.execution_result.and_then(|r| r.into_image()),
            error: state.error_message,
        }
    }

    /// The conversation history, one entry per processed turn.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// The cached profile, if any turn has run.
    pub fn profile(&self) -> Option<&DatasetProfile> {
        self.profile.as_ref()
    }

    /// The session's dataset.
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Replace the dataset. The cached profile is dropped so the next turn
    /// profiles the new data.
    pub fn replace_dataset(&mut self, dataset: Dataset) {
        self.dataset = dataset;
        self.profile = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mock_reasoner::{FailingReasoner, ScriptedReasoner};
    use sandbox::Sandbox;

    fn dataset() -> Dataset {
        Dataset::from_csv_str("x,y\n1,10\n2,20\n3,30\n").unwrap()
    }

    #[tokio::test]
    async fn test_history_grows_one_entry_per_turn() {
        let reasoner = ScriptedReasoner::new([
            "synthesize",
            "First answer.",
            "end",
            "synthesize",
            "Third answer.",
        ]);
        let mut session = Session::new(Orchestrator::new(reasoner, Sandbox::new()), dataset());

        session.ask("first?").await;
        session.ask("second?").await;
        session.ask("third?").await;

        assert_eq!(session.history().len(), 3);
        assert!(session.history()[0].starts_with("Q: first?"));
        assert!(session.history()[1].contains("(no reply)"));
        assert!(session.history()[2].ends_with("Third answer."));
    }

    #[tokio::test]
    async fn test_error_turns_still_counted() {
        let mut session = Session::new(
            Orchestrator::new(FailingReasoner::default(), Sandbox::new()),
            dataset(),
        );

        let reply = session.ask("hello?").await;
        assert!(reply.text.is_none());
        assert!(reply.error.is_some());
        assert_eq!(session.history().len(), 1);
    }

    #[tokio::test]
    async fn test_profile_cached_across_turns() {
        let reasoner = ScriptedReasoner::new(["end", "end"]);
        let mut session = Session::new(Orchestrator::new(reasoner, Sandbox::new()), dataset());

        session.ask("a").await;
        let first = session.profile().cloned().expect("profiled on first turn");

        session.ask("b").await;
        assert_eq!(session.profile(), Some(&first));
    }

    #[tokio::test]
    async fn test_replace_dataset_clears_profile() {
        let reasoner = ScriptedReasoner::new(["end", "end"]);
        let mut session = Session::new(Orchestrator::new(reasoner, Sandbox::new()), dataset());

        session.ask("a").await;
        assert_eq!(session.profile().unwrap().rows, 3);

        session.replace_dataset(Dataset::from_csv_str("x\n1\n").unwrap());
        assert!(session.profile().is_none());

        session.ask("b").await;
        assert_eq!(session.profile().unwrap().rows, 1);
    }

    #[tokio::test]
    async fn test_chart_reaches_reply() {
        let reasoner = ScriptedReasoner::new([
            "generate_code",
            "chart:bar({'one','two','three'}, df:col('y'))",
            "Bar chart of y by row.",
        ]);
        let mut session = Session::new(Orchestrator::new(reasoner, Sandbox::new()), dataset());

        let reply = session.ask("plot y").await;
        assert_eq!(reply.text.as_deref(), Some("Bar chart of y by row."));
        let image = reply.image.expect("chart bytes");
        assert_eq!(&image[..4], &[0x89, b'P', b'N', b'G']);
        assert!(reply.error.is_none());
    }
}
