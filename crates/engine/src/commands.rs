//! Command registry and the built-in calculator commands.
//!
//! Commands are registered by name and invoked with JSON input/output against
//! a caller-owned [`CalculationEngine`].

use crate::calculator::{parse_operand, CalculationEngine, Navigation};
use crate::error::CalcError;
use crate::operator::Operator;
use crate::types::*;
use bigdecimal::BigDecimal;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Instant;

/// Signature for all engine commands.
pub type CommandHandler = fn(Value, &mut CalculationEngine) -> Result<Value, CommandError>;

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Calc(#[from] CalcError),
    /// The command ran but left the engine unchanged.
    #[error("{0}")]
    Skipped(String),
}

impl CommandError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            CommandError::InvalidInput(_) => ErrorCode::InvalidInput,
            CommandError::Calc(CalcError::DivisionByZero) => ErrorCode::DivisionByZero,
            CommandError::Calc(CalcError::UnknownOperator(_)) => ErrorCode::UnknownOperator,
            CommandError::Calc(CalcError::InvalidOperand(_)) => ErrorCode::InvalidInput,
            CommandError::Skipped(_) => ErrorCode::NavigationExhausted,
        }
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

pub struct CommandRegistry {
    handlers: HashMap<String, CommandHandler>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        let mut reg = Self {
            handlers: HashMap::new(),
        };
        reg.register("set_operand", cmd_set_operand);
        reg.register("set_operator", cmd_set_operator);
        reg.register("calculate", cmd_calculate);
        reg.register("undo", cmd_undo);
        reg.register("redo", cmd_redo);
        reg.register("display", cmd_display);
        reg.register("snapshot", cmd_snapshot);
        reg
    }

    pub fn register(&mut self, name: &str, handler: CommandHandler) {
        self.handlers.insert(name.to_string(), handler);
    }

    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(|s| s.as_str()).collect();
        names.sort();
        names
    }

    /// Execute a command by name and return a full CommandResult.
    pub fn execute(&self, name: &str, args: Value, engine: &mut CalculationEngine) -> CommandResult {
        let run_id = new_run_id();
        let start = Instant::now();
        let elapsed = |start: Instant| start.elapsed().as_micros() as u64;

        let Some(handler) = self.handlers.get(name) else {
            return result_err(
                "call",
                name,
                &run_id,
                elapsed(start),
                ErrorCode::InvalidInput,
                format!("unknown command: {}", name),
            );
        };

        match handler(args, engine) {
            Ok(data) => {
                let mut r = result_ok("call", name, &run_id, elapsed(start));
                r.data = Some(data);
                r
            }
            Err(CommandError::Skipped(reason)) => {
                let mut r = result_skip("call", name, &run_id, elapsed(start), reason);
                r.data = Some(json!({ "display": engine.display() }));
                r
            }
            Err(e) => {
                tracing::debug!(command = name, error = %e, "command failed");
                result_err("call", name, &run_id, elapsed(start), e.error_code(), e.to_string())
            }
        }
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ===========================================================================
// Built-in commands
// ===========================================================================

fn snapshot_value(engine: &CalculationEngine) -> Value {
    serde_json::to_value(engine.snapshot()).unwrap_or_default()
}

/// Accepts `"value"` as a decimal string (exact) or a JSON number.
fn operand_arg(args: &Value) -> Result<BigDecimal, CommandError> {
    match args.get("value") {
        Some(Value::String(s)) => Ok(parse_operand(s)?),
        Some(Value::Number(n)) => Ok(parse_operand(&n.to_string())?),
        _ => Err(CommandError::InvalidInput(
            "missing 'value' string or number field".into(),
        )),
    }
}

/// `set_operand` – stage an operand.
///
/// Args: `{ "value": "3.5" }`
/// Returns: engine snapshot
fn cmd_set_operand(args: Value, engine: &mut CalculationEngine) -> Result<Value, CommandError> {
    let value = operand_arg(&args)?;
    engine.set_operand(value);
    Ok(snapshot_value(engine))
}

/// `set_operator` – stage one of `+ - * /`.
///
/// Args: `{ "op": "+" }`
/// Returns: engine snapshot
fn cmd_set_operator(args: Value, engine: &mut CalculationEngine) -> Result<Value, CommandError> {
    let op: Operator = args
        .get("op")
        .and_then(|v| v.as_str())
        .ok_or_else(|| CommandError::InvalidInput("missing 'op' string field".into()))?
        .parse()?;
    engine.set_operator(op);
    Ok(snapshot_value(engine))
}

/// `calculate` – fold the pending operand into the running result.
///
/// Returns: `{ "committed": true, "result": "8", "display": "8.00" }`
fn cmd_calculate(_args: Value, engine: &mut CalculationEngine) -> Result<Value, CommandError> {
    let committed = engine.calculate()?;
    Ok(json!({
        "committed": committed.is_some(),
        "result": committed,
        "display": engine.display(),
    }))
}

fn navigation_value(nav: Navigation, engine: &CalculationEngine) -> Result<Value, CommandError> {
    let outcome = serde_json::to_value(nav).unwrap_or_default();
    if !nav.changed() {
        return Err(CommandError::Skipped(format!(
            "no history to move to ({})",
            outcome.as_str().unwrap_or("unknown")
        )));
    }
    Ok(json!({
        "outcome": outcome,
        "cursor": engine.cursor(),
        "display": engine.display(),
    }))
}

/// `undo` – step back one committed result. Skips at the boundary.
fn cmd_undo(_args: Value, engine: &mut CalculationEngine) -> Result<Value, CommandError> {
    let nav = engine.undo();
    navigation_value(nav, engine)
}

/// `redo` – step forward one committed result. Skips at the boundary.
fn cmd_redo(_args: Value, engine: &mut CalculationEngine) -> Result<Value, CommandError> {
    let nav = engine.redo();
    navigation_value(nav, engine)
}

fn cmd_display(_args: Value, engine: &mut CalculationEngine) -> Result<Value, CommandError> {
    Ok(json!({ "display": engine.display() }))
}

fn cmd_snapshot(_args: Value, engine: &mut CalculationEngine) -> Result<Value, CommandError> {
    Ok(snapshot_value(engine))
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(reg: &CommandRegistry, engine: &mut CalculationEngine, name: &str, args: Value) -> CommandResult {
        reg.execute(name, args, engine)
    }

    #[test]
    fn test_accumulate_through_registry() {
        let reg = CommandRegistry::new();
        let mut engine = CalculationEngine::new();

        assert_eq!(run(&reg, &mut engine, "set_operand", json!({ "value": "3" })).status, Status::Pass);
        assert_eq!(run(&reg, &mut engine, "set_operator", json!({ "op": "+" })).status, Status::Pass);
        assert_eq!(run(&reg, &mut engine, "set_operand", json!({ "value": 5 })).status, Status::Pass);

        let r = run(&reg, &mut engine, "calculate", json!({}));
        assert_eq!(r.status, Status::Pass);
        let data = r.data.unwrap();
        assert_eq!(data["committed"], true);
        assert_eq!(data["result"], "8");
        assert_eq!(data["display"], "8.00");
    }

    #[test]
    fn test_string_operands_keep_full_precision() {
        let reg = CommandRegistry::new();
        let mut engine = CalculationEngine::new();
        run(&reg, &mut engine, "set_operand", json!({ "value": "10000000000000000000000" }));
        run(&reg, &mut engine, "set_operator", json!({ "op": "+" }));
        run(&reg, &mut engine, "set_operand", json!({ "value": "0.0000001" }));

        let data = run(&reg, &mut engine, "calculate", json!({})).data.unwrap();
        assert_eq!(data["result"], "10000000000000000000000.0000001");
        assert_eq!(data["display"], "10000000000000000000000.00");
    }

    #[test]
    fn test_calculate_without_operand_is_not_committed() {
        let reg = CommandRegistry::new();
        let mut engine = CalculationEngine::new();
        let r = run(&reg, &mut engine, "calculate", json!({}));
        assert_eq!(r.status, Status::Pass);
        let data = r.data.unwrap();
        assert_eq!(data["committed"], false);
        assert!(data["result"].is_null());
    }

    #[test]
    fn test_division_by_zero_maps_to_error_code() {
        let reg = CommandRegistry::new();
        let mut engine = CalculationEngine::new();
        run(&reg, &mut engine, "set_operand", json!({ "value": "4" }));
        run(&reg, &mut engine, "set_operator", json!({ "op": "/" }));
        run(&reg, &mut engine, "set_operand", json!({ "value": "0" }));

        let r = run(&reg, &mut engine, "calculate", json!({}));
        assert_eq!(r.status, Status::Error);
        assert_eq!(r.error.unwrap().code, ErrorCode::DivisionByZero);
        assert!(engine.history().is_empty());
    }

    #[test]
    fn test_unknown_operator_is_rejected() {
        let reg = CommandRegistry::new();
        let mut engine = CalculationEngine::new();
        let r = run(&reg, &mut engine, "set_operator", json!({ "op": "^" }));
        assert_eq!(r.status, Status::Error);
        assert_eq!(r.error.unwrap().code, ErrorCode::UnknownOperator);
        assert_eq!(engine.pending_operator(), None);
    }

    #[test]
    fn test_invalid_operand_input() {
        let reg = CommandRegistry::new();
        let mut engine = CalculationEngine::new();

        let r = run(&reg, &mut engine, "set_operand", json!({}));
        assert_eq!(r.error.unwrap().code, ErrorCode::InvalidInput);

        let r = run(&reg, &mut engine, "set_operand", json!({ "value": "three" }));
        assert_eq!(r.error.unwrap().code, ErrorCode::InvalidInput);
        assert_eq!(engine.running_result(), None);
    }

    #[test]
    fn test_navigation_boundary_is_skip() {
        let reg = CommandRegistry::new();
        let mut engine = CalculationEngine::new();

        let r = run(&reg, &mut engine, "undo", json!({}));
        assert_eq!(r.status, Status::Skip);
        assert_eq!(r.error.unwrap().code, ErrorCode::NavigationExhausted);

        let r = run(&reg, &mut engine, "redo", json!({}));
        assert_eq!(r.status, Status::Skip);
    }

    #[test]
    fn test_undo_reports_cursor() {
        let reg = CommandRegistry::new();
        let mut engine = CalculationEngine::new();
        for (cmd, args) in [
            ("set_operand", json!({ "value": "3" })),
            ("set_operator", json!({ "op": "+" })),
            ("set_operand", json!({ "value": "5" })),
            ("calculate", json!({})),
            ("set_operator", json!({ "op": "*" })),
            ("set_operand", json!({ "value": "2" })),
            ("calculate", json!({})),
        ] {
            assert_eq!(run(&reg, &mut engine, cmd, args).status, Status::Pass);
        }

        let r = run(&reg, &mut engine, "undo", json!({}));
        assert_eq!(r.status, Status::Pass);
        let data = r.data.unwrap();
        assert_eq!(data["outcome"], "moved");
        assert_eq!(data["cursor"], 0);
        assert_eq!(data["display"], "8.00");
    }

    #[test]
    fn test_unknown_command() {
        let reg = CommandRegistry::new();
        let mut engine = CalculationEngine::new();
        let r = run(&reg, &mut engine, "sqrt", json!({}));
        assert_eq!(r.status, Status::Error);
        assert_eq!(r.error.unwrap().code, ErrorCode::InvalidInput);
    }

    #[test]
    fn test_list_commands() {
        let reg = CommandRegistry::new();
        let names = reg.list();
        for name in ["calculate", "display", "redo", "set_operand", "set_operator", "snapshot", "undo"] {
            assert!(names.contains(&name), "missing {}", name);
        }
    }
}
