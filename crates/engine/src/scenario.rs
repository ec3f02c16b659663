//! Scenario runner – execute scripted calculator sessions from YAML files.

use crate::calculator::CalculationEngine;
use crate::commands::CommandRegistry;
use crate::types::*;

const DEMO_SCENARIO: &str = include_str!("../scenarios/demo.yaml");

/// Load a scenario from a YAML string.
pub fn load_scenario(yaml: &str) -> Result<Scenario, String> {
    serde_yaml::from_str(yaml).map_err(|e| format!("failed to parse scenario YAML: {}", e))
}

/// The built-in walkthrough: accumulate, undo, branch, then exhaust redo.
pub fn demo_scenario() -> Result<Scenario, String> {
    load_scenario(DEMO_SCENARIO)
}

/// Execute every step against `engine` and return the overall result.
///
/// A step fails the scenario when its status or its resulting display differs
/// from the expectation; later steps still run.
pub fn run_scenario(
    scenario: &Scenario,
    engine: &mut CalculationEngine,
    registry: &CommandRegistry,
) -> ScenarioResult {
    let mut step_results = Vec::with_capacity(scenario.steps.len());
    let mut overall = Status::Pass;

    for (i, step) in scenario.steps.iter().enumerate() {
        let mut r = registry.execute(&step.call, step.args.clone(), engine);

        let actual_status = r.status.as_str();
        if actual_status != step.expect_status {
            tracing::warn!(
                step = i,
                call = %step.call,
                expected = %step.expect_status,
                actual = %actual_status,
                "scenario step status mismatch"
            );
            r.status = Status::Fail;
            overall = Status::Fail;
        }

        if let Some(expected) = &step.expect_display {
            let actual = engine.display();
            if actual != *expected {
                tracing::warn!(
                    step = i,
                    call = %step.call,
                    expected = %expected,
                    actual = %actual,
                    "scenario step display mismatch"
                );
                r.status = Status::Fail;
                overall = Status::Fail;
            }
        }

        step_results.push(r);
    }

    ScenarioResult {
        name: scenario.name.clone(),
        overall_status: overall,
        step_results,
        final_display: engine.display(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_yaml(yaml: &str) -> ScenarioResult {
        let scenario = load_scenario(yaml).expect("should parse");
        let mut engine = CalculationEngine::new();
        run_scenario(&scenario, &mut engine, &CommandRegistry::new())
    }

    #[test]
    fn test_parse_scenario() {
        let yaml = r#"
name: basic test
steps:
  - call: "set_operand"
    args: { value: "3" }
    expect_status: "pass"
    expect_display: "3.00"
  - call: "undo"
    expect_status: "skip"
"#;
        let s = load_scenario(yaml).expect("should parse");
        assert_eq!(s.name, Some("basic test".into()));
        assert_eq!(s.steps.len(), 2);
        assert_eq!(s.steps[1].expect_status, "skip");
    }

    #[test]
    fn test_parse_scenario_rejects_garbage() {
        assert!(load_scenario("steps: 12").is_err());
    }

    #[test]
    fn test_demo_scenario_passes() {
        let scenario = demo_scenario().expect("demo should parse");
        let mut engine = CalculationEngine::new();
        let result = run_scenario(&scenario, &mut engine, &CommandRegistry::new());

        assert_eq!(result.overall_status, Status::Pass, "{:#?}", result.step_results);
        assert_eq!(result.step_results.len(), scenario.steps.len());
        assert_eq!(result.final_display, "10.00");
        assert_eq!(engine.history().len(), 2);
        assert_eq!(engine.cursor(), Some(1));
    }

    #[test]
    fn test_division_by_zero_step_expected_as_error() {
        let result = run_yaml(
            r#"
steps:
  - call: set_operand
    args: { value: "4" }
  - call: set_operator
    args: { op: "/" }
  - call: set_operand
    args: { value: "0" }
  - call: calculate
    expect_status: error
    expect_display: "4.00/0"
"#,
        );
        assert_eq!(result.overall_status, Status::Pass);
        assert_eq!(
            result.step_results[3].error.as_ref().unwrap().code,
            ErrorCode::DivisionByZero
        );
    }

    #[test]
    fn test_display_mismatch_fails_scenario() {
        let result = run_yaml(
            r#"
steps:
  - call: set_operand
    args: { value: "3" }
    expect_display: "4.00"
  - call: display
"#,
        );
        assert_eq!(result.overall_status, Status::Fail);
        assert_eq!(result.step_results[0].status, Status::Fail);
        assert_eq!(result.step_results[1].status, Status::Pass);
    }

    #[test]
    fn test_status_mismatch_fails_scenario() {
        let result = run_yaml(
            r#"
steps:
  - call: redo
"#,
        );
        assert_eq!(result.overall_status, Status::Fail);
    }
}
