//! Shared turn state and the routing decision enumeration.

use sandbox::ExecutionResult;
use tabular::DatasetProfile;
use tracing::warn;

use crate::error::TurnError;

/// The closed classification of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingDecision {
    /// Generate analysis code and execute it before answering.
    GenerateCode,
    /// Answer directly from profile and history.
    Synthesize,
    /// Stop: no further processing for this turn.
    End,
}

impl RoutingDecision {
    /// Parse a reasoner reply into a decision.
    ///
    /// Total over arbitrary input: the reply is untrusted free text, so
    /// anything that does not name a known decision fails closed into
    /// [`RoutingDecision::End`] rather than erroring. `end` is never matched
    /// by substring (it occurs inside too many English words); an explicit
    /// `end` token matches, everything else defaults there anyway.
    pub fn parse(reply: &str) -> Self {
        let normalized = reply
            .trim()
            .trim_matches(|c: char| matches!(c, '\'' | '"' | '`' | '.' | '*'))
            .trim()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "generate_code" => Self::GenerateCode,
            "synthesize" => Self::Synthesize,
            "end" => Self::End,
            _ if normalized.contains("generate_code") => Self::GenerateCode,
            _ if normalized.contains("synthesize") => Self::Synthesize,
            _ => {
                warn!("unrecognized routing reply {:?}, defaulting to end", reply);
                Self::End
            }
        }
    }

    /// The wire token for this decision.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GenerateCode => "generate_code",
            Self::Synthesize => "synthesize",
            Self::End => "end",
        }
    }
}

/// The mutable record threaded through one orchestration run.
///
/// Created fresh per user message, seeded from session state, and discarded
/// after its fields are folded back. The dataset itself is passed alongside
/// by reference; the state never owns it.
#[derive(Debug, Clone, Default)]
pub struct TurnState {
    /// The user's question for this turn.
    pub user_question: String,
    /// Cached structural profile; populated by INGEST when absent.
    pub profile: Option<DatasetProfile>,
    /// Read-only snapshot of prior turn texts, oldest first.
    pub history: Vec<String>,
    /// The routing classification, set once per turn.
    pub routing_decision: Option<RoutingDecision>,
    /// Generated code fragment, set only on the code path.
    pub generated_code: Option<String>,
    /// Sandbox outcome, set only if code ran.
    pub execution_result: Option<ExecutionResult>,
    /// The user-visible answer.
    pub synthesis: Option<String>,
    /// Turn-level error, if any step failed.
    pub error_message: Option<String>,
}

impl TurnState {
    /// Seed a fresh turn from session state.
    pub fn new(
        user_question: impl Into<String>,
        profile: Option<DatasetProfile>,
        history: Vec<String>,
    ) -> Self {
        Self {
            user_question: user_question.into(),
            profile,
            history,
            ..Default::default()
        }
    }

    /// Record a turn-level error as data.
    pub(crate) fn record_error(&mut self, error: TurnError) {
        warn!("turn error: {}", error);
        self.error_message = Some(error.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_exact_tokens() {
        assert_eq!(
            RoutingDecision::parse("generate_code"),
            RoutingDecision::GenerateCode
        );
        assert_eq!(
            RoutingDecision::parse("synthesize"),
            RoutingDecision::Synthesize
        );
        assert_eq!(RoutingDecision::parse("end"), RoutingDecision::End);
    }

    #[test]
    fn test_parse_tolerates_wrapping() {
        assert_eq!(
            RoutingDecision::parse("  'generate_code'\n"),
            RoutingDecision::GenerateCode
        );
        assert_eq!(
            RoutingDecision::parse("\"SYNTHESIZE\"."),
            RoutingDecision::Synthesize
        );
        assert_eq!(
            RoutingDecision::parse("The next action is: generate_code"),
            RoutingDecision::GenerateCode
        );
    }

    #[test]
    fn test_parse_fails_closed() {
        assert_eq!(RoutingDecision::parse("MAYBE"), RoutingDecision::End);
        assert_eq!(RoutingDecision::parse(""), RoutingDecision::End);
        // "recommend" contains "end" but is not a decision
        assert_eq!(
            RoutingDecision::parse("I recommend nothing"),
            RoutingDecision::End
        );
    }

    #[test]
    fn test_round_trip_tokens() {
        for decision in [
            RoutingDecision::GenerateCode,
            RoutingDecision::Synthesize,
            RoutingDecision::End,
        ] {
            assert_eq!(RoutingDecision::parse(decision.as_str()), decision);
        }
    }

    #[test]
    fn test_fresh_state_is_blank() {
        let state = TurnState::new("q", None, vec!["old".to_string()]);
        assert_eq!(state.user_question, "q");
        assert_eq!(state.history, ["old".to_string()]);
        assert!(state.routing_decision.is_none());
        assert!(state.generated_code.is_none());
        assert!(state.execution_result.is_none());
        assert!(state.synthesis.is_none());
        assert!(state.error_message.is_none());
    }
}
