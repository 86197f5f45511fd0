//! The sandbox runtime: one fresh, limited Lua interpreter per execution.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use mlua::{HookTriggers, Lua, MultiValue, Value as LuaValue, VmState};
use tabular::Dataset;
use tracing::{debug, warn};

use crate::chart::{ChartSpec, ChartUserData};
use crate::frame::{Frame, FrameUserData};
use crate::result::ExecutionResult;

/// Default maximum number of Lua instructions per execution.
pub const DEFAULT_INSTRUCTION_LIMIT: i64 = 100_000_000;

/// How often to check the ceilings (every N instructions).
pub const INSTRUCTION_HOOK_INTERVAL: u32 = 10_000;

/// Default wall-clock deadline per execution.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default Lua allocation ceiling (64 MiB).
pub const DEFAULT_MEMORY_LIMIT: usize = 64 << 20;

/// Default maximum lines of print output per execution.
pub const DEFAULT_MAX_OUTPUT_LINES: usize = 1_000;

/// Globals stripped from every interpreter before user code runs.
const REMOVED_GLOBALS: [&str; 8] = [
    "os", "io", "debug", "package", "require", "loadfile", "dofile", "load",
];

/// Host-enforced ceilings for one execution.
#[derive(Debug, Clone, Copy)]
pub struct SandboxLimits {
    /// Instruction budget checked by the VM hook.
    pub instructions: i64,
    /// Lua allocation ceiling in bytes.
    pub memory: usize,
    /// Wall-clock deadline.
    pub timeout: Duration,
    /// Print output line cap.
    pub max_output_lines: usize,
}

impl Default for SandboxLimits {
    fn default() -> Self {
        Self {
            instructions: DEFAULT_INSTRUCTION_LIMIT,
            memory: DEFAULT_MEMORY_LIMIT,
            timeout: DEFAULT_TIMEOUT,
            max_output_lines: DEFAULT_MAX_OUTPUT_LINES,
        }
    }
}

/// The execution sandbox.
///
/// Holds only the limits; every [`execute`](Sandbox::execute) call builds
/// and tears down its own interpreter, dataset copy, and chart surface.
#[derive(Debug, Clone, Default)]
pub struct Sandbox {
    limits: SandboxLimits,
}

impl Sandbox {
    /// Create a sandbox with default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sandbox with custom limits.
    pub fn with_limits(limits: SandboxLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &SandboxLimits {
        &self.limits
    }

    /// Run a code fragment against a private copy of `dataset`.
    ///
    /// Never panics and never returns an `Err`: every failure mode (syntax
    /// error, runtime error, ceiling hit, render failure) is folded into the
    /// returned [`ExecutionResult`].
    pub fn execute(&self, code: &str, dataset: &Dataset) -> ExecutionResult {
        let lua = Lua::new();

        if let Err(e) = lua.set_memory_limit(self.limits.memory) {
            return ExecutionResult::failed(format!("failed to set memory limit: {}", e), vec![]);
        }

        let output_state = Rc::new(RefCell::new(OutputState::new(self.limits.max_output_lines)));

        let setup = self.install_bindings(&lua, dataset, &output_state);
        let chart = match setup {
            Ok(chart) => chart,
            Err(e) => {
                return ExecutionResult::failed(format!("failed to set up sandbox: {}", e), vec![])
            }
        };

        // Ceiling hook: deadline first, then instruction budget.
        let start = Instant::now();
        let timeout = self.limits.timeout;
        let instruction_limit = self.limits.instructions;
        let budget = Arc::new(AtomicI64::new(instruction_limit));

        lua.set_hook(
            HookTriggers::new().every_nth_instruction(INSTRUCTION_HOOK_INTERVAL),
            move |_lua, _debug| {
                if start.elapsed() > timeout {
                    return Err(mlua::Error::RuntimeError(format!(
                        "execution timeout ({:?} limit)",
                        timeout
                    )));
                }

                let remaining =
                    budget.fetch_sub(INSTRUCTION_HOOK_INTERVAL as i64, Ordering::Relaxed);
                if remaining <= 0 {
                    Err(mlua::Error::RuntimeError(format!(
                        "instruction limit exceeded ({} instructions)",
                        instruction_limit
                    )))
                } else {
                    Ok(VmState::Continue)
                }
            },
        );

        let exec_result = lua.load(code).exec();

        lua.remove_hook();

        let state = output_state.borrow();
        let mut output = state.lines.clone();
        if state.truncated {
            output.push(format!(
                "... output truncated ({} line limit)",
                self.limits.max_output_lines
            ));
        }
        drop(state);

        match exec_result {
            Err(e) => {
                let message = format_lua_error(&e);
                debug!("sandbox execution failed: {}", message);
                ExecutionResult::failed(message, output)
            }
            Ok(()) => {
                let spec = chart.borrow();
                if spec.has_series() {
                    match spec.render_png() {
                        Ok(png) => {
                            debug!("sandbox execution produced a {} byte chart", png.len());
                            ExecutionResult::completed(Some(png), output)
                        }
                        Err(e) => {
                            warn!("chart render failed: {}", e);
                            ExecutionResult::failed(format!("chart render failed: {}", e), output)
                        }
                    }
                } else {
                    ExecutionResult::completed(None, output)
                }
            }
        }
        // `lua`, the frame copy, and the chart spec all drop here: the next
        // execution starts from a clean surface no matter what this one did.
    }

    /// Strip dangerous globals and install `print`, `df`, and `chart`.
    fn install_bindings(
        &self,
        lua: &Lua,
        dataset: &Dataset,
        output_state: &Rc<RefCell<OutputState>>,
    ) -> mlua::Result<Rc<RefCell<ChartSpec>>> {
        let globals = lua.globals();

        for name in REMOVED_GLOBALS {
            globals.set(name, LuaValue::Nil)?;
        }

        let state = output_state.clone();
        let print_fn = lua.create_function(move |_, args: MultiValue| {
            let parts: Vec<String> = args.into_iter().map(|v| lua_value_to_string(&v)).collect();
            state.borrow_mut().push(parts.join("\t"));
            Ok(())
        })?;
        globals.set("print", print_fn)?;

        // Non-fatal warnings stay inside the namespace instead of reaching
        // the host's stderr.
        let warn_fn = lua.create_function(|_, _args: MultiValue| Ok(()))?;
        globals.set("warn", warn_fn)?;

        let frame = Rc::new(RefCell::new(Frame::from_dataset(dataset)));
        globals.set("df", FrameUserData::new(frame))?;

        let chart = Rc::new(RefCell::new(ChartSpec::default()));
        globals.set("chart", ChartUserData::new(chart.clone()))?;

        Ok(chart)
    }
}

/// Captured print output with a line cap.
struct OutputState {
    lines: Vec<String>,
    truncated: bool,
    max_lines: usize,
}

impl OutputState {
    fn new(max_lines: usize) -> Self {
        Self {
            lines: Vec::new(),
            truncated: false,
            max_lines,
        }
    }

    fn push(&mut self, line: String) {
        if self.lines.len() < self.max_lines {
            self.lines.push(line);
        } else {
            self.truncated = true;
        }
    }
}

/// Convert a Lua value to a display string for print capture.
fn lua_value_to_string(value: &LuaValue) -> String {
    match value {
        LuaValue::Nil => "nil".to_string(),
        LuaValue::Boolean(b) => b.to_string(),
        LuaValue::Integer(i) => i.to_string(),
        LuaValue::Number(n) => {
            if n.fract() == 0.0 && n.abs() < 1e15 {
                format!("{:.0}", n)
            } else {
                format!("{}", n)
            }
        }
        LuaValue::String(s) => s
            .to_str()
            .map(|s| s.to_string())
            .unwrap_or_else(|_| "<invalid utf8>".to_string()),
        LuaValue::Table(_) => "table".to_string(),
        LuaValue::Function(_) => "function".to_string(),
        other => format!("<{}>", other.type_name()),
    }
}

/// Format a Lua error for the error detail field.
fn format_lua_error(error: &mlua::Error) -> String {
    match error {
        mlua::Error::SyntaxError { message, .. } => {
            // Strip the "[string \"...\"]:1: " prefix if present
            if let Some(idx) = message.find("]: ") {
                message[idx + 3..].to_string()
            } else {
                message.clone()
            }
        }
        mlua::Error::RuntimeError(msg) => msg.clone(),
        mlua::Error::CallbackError { cause, .. } => format_lua_error(cause),
        _ => error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: [u8; 4] = [0x89, b'P', b'N', b'G'];

    fn sample() -> Dataset {
        Dataset::from_csv_str("id,score\n1,3.5\n2,\n3,1.25\n").unwrap()
    }

    #[test]
    fn test_plain_success_has_no_image() {
        let sandbox = Sandbox::new();
        let result = sandbox.execute("local x = 1 + 1", &sample());
        assert!(result.success());
        assert!(result.image().is_none());
        assert!(result.error().is_none());
    }

    #[test]
    fn test_print_capture() {
        let sandbox = Sandbox::new();
        let result = sandbox.execute("print('rows', df:rows())", &sample());
        assert!(result.success());
        assert_eq!(result.output(), ["rows\t3".to_string()]);
    }

    #[test]
    fn test_dataset_bindings() {
        let sandbox = Sandbox::new();
        let code = r#"
            print(df:cols())
            print(df:columns()[2])
            print(df:nulls("score"))
            print(df:get("id", 3))
        "#;
        let result = sandbox.execute(code, &sample());
        assert!(result.success(), "error: {:?}", result.error());
        assert_eq!(result.output(), ["2", "score", "1", "3"]);
    }

    #[test]
    fn test_mutation_stays_in_copy() {
        let sandbox = Sandbox::new();
        let dataset = sample();
        let before = dataset.clone();

        let code = r#"
            for i = 1, df:rows() do
                df:set("id", i, 0)
            end
            print(df:get("id", 1))
        "#;
        let result = sandbox.execute(code, &dataset);
        assert!(result.success(), "error: {:?}", result.error());
        assert_eq!(result.output(), ["0"]);
        assert_eq!(dataset, before);
    }

    #[test]
    fn test_runtime_error_captured() {
        let sandbox = Sandbox::new();
        let result = sandbox.execute("error('division by zero')", &sample());
        assert!(!result.success());
        assert!(result.image().is_none());
        assert!(result.error().unwrap().contains("division by zero"));
    }

    #[test]
    fn test_syntax_error_captured() {
        let sandbox = Sandbox::new();
        let result = sandbox.execute("local = ", &sample());
        assert!(!result.success());
        assert!(result.error().is_some());
    }

    #[test]
    fn test_dangerous_globals_unreachable() {
        let sandbox = Sandbox::new();
        for code in [
            "os.execute('true')",
            "io.open('/etc/passwd')",
            "require('socket')",
            "load('return 1')()",
        ] {
            let result = sandbox.execute(code, &sample());
            assert!(!result.success(), "expected failure for: {}", code);
        }
    }

    #[test]
    fn test_instruction_ceiling() {
        let sandbox = Sandbox::with_limits(SandboxLimits {
            instructions: 50_000,
            ..SandboxLimits::default()
        });
        let result = sandbox.execute("while true do end", &sample());
        assert!(!result.success());
        assert!(result.error().unwrap().contains("instruction limit"));
    }

    #[test]
    fn test_wall_clock_ceiling() {
        let sandbox = Sandbox::with_limits(SandboxLimits {
            timeout: Duration::ZERO,
            ..SandboxLimits::default()
        });
        let result = sandbox.execute("while true do end", &sample());
        assert!(!result.success());
        assert!(result.error().unwrap().contains("timeout"));
    }

    #[test]
    fn test_memory_ceiling() {
        let sandbox = Sandbox::with_limits(SandboxLimits {
            memory: 1 << 20,
            ..SandboxLimits::default()
        });
        let code = "local t = {} for i = 1, 10000000 do t[i] = 'x' .. i end";
        let result = sandbox.execute(code, &sample());
        assert!(!result.success());
    }

    #[test]
    fn test_chart_produces_png() {
        let sandbox = Sandbox::new();
        let code = r#"
            chart:title("scores")
            chart:histogram(df:col("score"), 4)
        "#;
        let result = sandbox.execute(code, &sample());
        assert!(result.success(), "error: {:?}", result.error());
        let image = result.image().expect("chart should produce an image");
        assert_eq!(&image[..4], &PNG_MAGIC);
    }

    #[test]
    fn test_surface_clean_between_executions() {
        let sandbox = Sandbox::new();
        let dataset = sample();

        let first = sandbox.execute("chart:bar({'a'}, {1})", &dataset);
        assert!(first.image().is_some());

        // Nothing from the first run may leak into the second.
        let second = sandbox.execute("local x = 2", &dataset);
        assert!(second.success());
        assert!(second.image().is_none());
    }

    #[test]
    fn test_failed_chart_run_discards_image() {
        let sandbox = Sandbox::new();
        let code = r#"
            chart:bar({'a', 'b'}, {1, 2})
            error('after drawing')
        "#;
        let result = sandbox.execute(code, &sample());
        assert!(!result.success());
        assert!(result.image().is_none());
    }

    #[test]
    fn test_empty_fragment_is_success() {
        let sandbox = Sandbox::new();
        let result = sandbox.execute("", &sample());
        assert!(result.success());
        assert!(result.image().is_none());
    }
}
