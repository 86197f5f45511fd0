//! System prompts and prompt-context builders for the three reasoner calls.

use reasoner_core::PromptContext;
use sandbox::ExecutionResult;

use crate::state::TurnState;

/// System prompt for the routing classification.
///
/// The reply is parsed by [`crate::RoutingDecision::parse`]; anything else
/// falls back to `end`.
pub const ROUTING_SYSTEM_PROMPT: &str = r#"You are a task router for a data-analysis assistant. Look at the user's question, the conversation so far, and the dataset profile, then choose the next action.

The options are:
1. 'generate_code': the question needs a quantitative answer, a chart, or any computation over the data. Examples: "what is the correlation?", "plot a histogram of column X", "how many missing values are there?".
2. 'synthesize': the question is a greeting, a general question about conclusions so far, or a request for a summary. Examples: "hello", "what are the main insights so far?", "summarize what we found".
3. 'end': the conversation appears to be over or the question is unrelated to the data.

Reply with exactly one action token in lowercase (e.g. 'generate_code'). No explanation."#;

/// System prompt for code generation.
///
/// Documents the whole surface the sandbox exposes; anything else is
/// unavailable to the script.
pub const CODEGEN_SYSTEM_PROMPT: &str = r#"You are a data analyst writing Lua to answer a question about a dataset.

The dataset is bound to a variable named `df`:
- df:rows() -> number of rows
- df:cols() -> number of columns
- df:columns() -> list of column names
- df:col(name) -> list of values for a column (missing values are nil)
- df:get(name, row) / df:set(name, row, value) -> single cells (rows are 1-based)
- df:nulls(name) -> missing-value count for a column

Draw at most one chart through the `chart` variable:
- chart:title(text), chart:xlabel(text), chart:ylabel(text)
- chart:bar(labels, values)
- chart:line(xs, ys)
- chart:scatter(xs, ys)
- chart:histogram(values, bins)

Rules:
- Write only the script body. No code fences, no commentary.
- Use print(...) for numeric results; printed lines are returned with the result.
- Only `df`, `chart`, print, and the string/table/math libraries exist. There is no file, network, or os access.
- If the question asks for a chart, give it a title and axis labels."#;

/// System prompt for the final synthesis.
pub const SYNTHESIS_SYSTEM_PROMPT: &str = "You are a data consultant. Give the user a clear, concise answer based on the provided context. If a chart was generated, explain the insight it shows. If an error occurred, explain it in plain language and say what is missing from the answer.";

/// Context for the routing call: history, question, profile.
pub fn routing_context(state: &TurnState) -> PromptContext {
    PromptContext::new(ROUTING_SYSTEM_PROMPT)
        .section("history", render_history(&state.history))
        .section("question", state.user_question.clone())
        .section("profile", render_profile(state))
}

/// Context for the code-generation call: profile, question.
pub fn codegen_context(state: &TurnState) -> PromptContext {
    PromptContext::new(CODEGEN_SYSTEM_PROMPT)
        .section("profile", render_profile(state))
        .section("question", state.user_question.clone())
}

/// Context for the synthesis call: question, profile, code, execution
/// outcome, and any turn-level error.
pub fn synthesis_context(state: &TurnState) -> PromptContext {
    let mut context = PromptContext::new(SYNTHESIS_SYSTEM_PROMPT)
        .section("question", state.user_question.clone())
        .section("profile", render_profile(state));

    if let Some(code) = &state.generated_code {
        context = context.section("code", code.clone());
    }
    if let Some(result) = &state.execution_result {
        context = context.section("execution", render_execution(result));
    }
    if let Some(error) = &state.error_message {
        context = context.section("error", error.clone());
    }

    context
}

fn render_history(history: &[String]) -> String {
    if history.is_empty() {
        "(no prior turns)".to_string()
    } else {
        history.join("\n---\n")
    }
}

fn render_profile(state: &TurnState) -> String {
    state
        .profile
        .as_ref()
        .map(|p| p.to_json())
        .unwrap_or_else(|| "(not profiled)".to_string())
}

fn render_execution(result: &ExecutionResult) -> String {
    let mut lines = Vec::new();
    if result.success() {
        lines.push("status: success".to_string());
        lines.push(format!(
            "chart: {}",
            if result.image().is_some() {
                "generated"
            } else {
                "none"
            }
        ));
    } else {
        lines.push("status: failure".to_string());
        if let Some(error) = result.error() {
            lines.push(format!("error: {}", error));
        }
    }
    if !result.output().is_empty() {
        lines.push("printed output:".to_string());
        lines.extend(result.output().iter().cloned());
    }
    lines.join("\n")
}

/// Strip a fenced-code wrapper from a reasoner reply.
///
/// Handles leading prose before the fence, an optional `lua` language tag,
/// and a missing closing fence. A reply with no fence is returned trimmed of
/// stray backticks.
pub fn strip_code_fences(reply: &str) -> String {
    let trimmed = reply.trim();

    if let Some(start) = trimmed.find("```") {
        let after = &trimmed[start + 3..];
        let body = match after.find("```") {
            Some(end) => &after[..end],
            None => after,
        };
        let body = body
            .strip_prefix("lua")
            .filter(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
            .unwrap_or(body);
        return body.trim().to_string();
    }

    trimmed.trim_matches('`').trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_plain_code() {
        assert_eq!(strip_code_fences("print(1)"), "print(1)");
    }

    #[test]
    fn test_strip_fence_with_language_tag() {
        let reply = "```lua\nprint(df:rows())\n```";
        assert_eq!(strip_code_fences(reply), "print(df:rows())");
    }

    #[test]
    fn test_strip_fence_without_tag() {
        let reply = "```\nlocal x = 1\nprint(x)\n```";
        assert_eq!(strip_code_fences(reply), "local x = 1\nprint(x)");
    }

    #[test]
    fn test_strip_fence_with_leading_prose() {
        let reply = "Here is the script:\n```lua\nprint(1)\n```\nHope that helps!";
        assert_eq!(strip_code_fences(reply), "print(1)");
    }

    #[test]
    fn test_strip_unclosed_fence() {
        let reply = "```lua\nprint(1)";
        assert_eq!(strip_code_fences(reply), "print(1)");
    }

    #[test]
    fn test_lua_identifier_not_stripped() {
        // A body that genuinely starts with an identifier beginning in "lua"
        let reply = "```\nluaside = 1\nprint(luaside)\n```";
        assert_eq!(strip_code_fences(reply), "luaside = 1\nprint(luaside)");
    }

    #[test]
    fn test_stray_backticks_trimmed() {
        assert_eq!(strip_code_fences("`print(1)`"), "print(1)");
    }

    #[test]
    fn test_routing_context_sections() {
        let state = TurnState::new("how many rows?", None, vec![]);
        let rendered = routing_context(&state).rendered();
        assert!(rendered.contains("[HISTORY]"));
        assert!(rendered.contains("[QUESTION]\nhow many rows?"));
        assert!(rendered.contains("[PROFILE]\n(not profiled)"));
    }

    #[test]
    fn test_synthesis_context_includes_failure() {
        let mut state = TurnState::new("plot it", None, vec![]);
        state.generated_code = Some("error('nope')".to_string());
        state.execution_result = Some(ExecutionResult::failed("nope", vec![]));

        let rendered = synthesis_context(&state).rendered();
        assert!(rendered.contains("[CODE]"));
        assert!(rendered.contains("status: failure"));
        assert!(rendered.contains("error: nope"));
    }

    #[test]
    fn test_synthesis_context_includes_output() {
        let mut state = TurnState::new("count", None, vec![]);
        state.execution_result =
            Some(ExecutionResult::completed(None, vec!["42".to_string()]));

        let rendered = synthesis_context(&state).rendered();
        assert!(rendered.contains("status: success"));
        assert!(rendered.contains("chart: none"));
        assert!(rendered.contains("42"));
    }
}
