//! `calcctl` – command-line driver for the history-tracking calculator.
//!
//! Every subcommand drives the same engine crate: one-shot command calls,
//! scripted YAML scenarios, an interactive REPL and a socket daemon.

mod config;
mod logging;
mod repl;
mod serve;

use calc_engine::scenario::{demo_scenario, load_scenario, run_scenario};
use calc_engine::types::*;
use calc_engine::{CalculationEngine, CommandRegistry, CommandResult};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

// ===========================================================================
// CLI definition
// ===========================================================================

#[derive(Parser)]
#[command(
    name = "calcctl",
    version,
    about = "Stateful calculator with undo/redo history"
)]
struct Cli {
    /// Extra YAML config file layered over the built-in defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Invoke a single engine command on a fresh engine.
    Call {
        /// Command name (e.g. "set_operand", "calculate", "snapshot").
        cmd: String,
        /// JSON args to pass to the command.
        #[arg(long, default_value = "{}")]
        args: String,
        /// Output as JSON.
        #[arg(long)]
        json: bool,
        /// Directory for artifacts output.
        #[arg(long)]
        artifacts: Option<PathBuf>,
    },

    /// Run a scripted calculator session from a YAML file.
    RunScenario {
        /// Path to the scenario YAML file.
        file: PathBuf,
        /// Directory for artifacts output.
        #[arg(long)]
        artifacts: Option<PathBuf>,
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Replay the built-in walkthrough (accumulate, undo, branch, redo).
    Demo {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Interactive session reading one token per line.
    Repl,

    /// Start daemon mode over a Unix socket.
    Serve {
        /// Path for the Unix domain socket.
        #[arg(long)]
        socket: PathBuf,
    },

    /// List the available engine commands.
    List,
}

// ===========================================================================
// Main
// ===========================================================================

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let app_config = match config::load_config(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: failed to load configuration: {}", e);
            std::process::exit(2);
        }
    };
    logging::init_logging(&app_config.logging);

    let scale = app_config.engine.scale;
    let registry = CommandRegistry::new();

    let outcome = match cli.command {
        Commands::Call {
            cmd,
            args,
            json,
            artifacts,
        } => {
            cmd_call(&cmd, &args, json, artifacts, scale, &registry);
            Ok(())
        }
        Commands::RunScenario {
            file,
            artifacts,
            json,
        } => {
            cmd_run_scenario(&file, json, artifacts, scale, &registry);
            Ok(())
        }
        Commands::Demo { json } => {
            cmd_demo(json, scale, &registry);
            Ok(())
        }
        Commands::Repl => {
            let mut engine = CalculationEngine::with_scale(scale);
            repl::run_repl(&mut engine, &app_config.repl.prompt)
        }
        Commands::Serve { socket } => serve::run_daemon(socket, scale, registry).await,
        Commands::List => {
            for name in registry.list() {
                println!("{}", name);
            }
            Ok(())
        }
    };

    if let Err(e) = outcome {
        eprintln!("error: {:#}", e);
        std::process::exit(2);
    }
}

// ===========================================================================
// Subcommand implementations
// ===========================================================================

fn cmd_call(
    cmd: &str,
    args_str: &str,
    json: bool,
    artifacts: Option<PathBuf>,
    scale: u32,
    registry: &CommandRegistry,
) {
    let args: serde_json::Value = match serde_json::from_str(args_str) {
        Ok(v) => v,
        Err(e) => {
            let r = result_err(
                "call",
                cmd,
                &new_run_id(),
                0,
                ErrorCode::InvalidInput,
                format!("invalid JSON args: {}", e),
            );
            output_result(&r, json);
            return;
        }
    };

    let mut engine = CalculationEngine::with_scale(scale);
    let mut result = registry.execute(cmd, args, &mut engine);
    if let Some(ref dir) = artifacts {
        write_artifacts(dir, &mut result);
    }
    output_result(&result, json);
}

fn cmd_run_scenario(
    file: &Path,
    json: bool,
    artifacts: Option<PathBuf>,
    scale: u32,
    registry: &CommandRegistry,
) {
    let target = file.display().to_string();
    let yaml = match std::fs::read_to_string(file) {
        Ok(s) => s,
        Err(e) => {
            let r = result_err(
                "run-scenario",
                &target,
                &new_run_id(),
                0,
                ErrorCode::IoError,
                format!("cannot read scenario file: {}", e),
            );
            output_result(&r, json);
            return;
        }
    };

    let scenario = match load_scenario(&yaml) {
        Ok(s) => s,
        Err(e) => {
            let r = result_err(
                "run-scenario",
                &target,
                &new_run_id(),
                0,
                ErrorCode::InvalidInput,
                e,
            );
            output_result(&r, json);
            return;
        }
    };

    let mut engine = CalculationEngine::with_scale(scale);
    let scenario_result = run_scenario(&scenario, &mut engine, registry);
    if let Some(ref dir) = artifacts {
        write_scenario_artifacts(dir, &scenario_result);
    }
    output_scenario(&scenario_result, json);
}

fn cmd_demo(json: bool, scale: u32, registry: &CommandRegistry) {
    let scenario = match demo_scenario() {
        Ok(s) => s,
        Err(e) => {
            let r = result_err("demo", "built-in", &new_run_id(), 0, ErrorCode::InvalidInput, e);
            output_result(&r, json);
            return;
        }
    };
    let mut engine = CalculationEngine::with_scale(scale);
    let scenario_result = run_scenario(&scenario, &mut engine, registry);
    output_scenario(&scenario_result, json);
}

// ===========================================================================
// Output helpers
// ===========================================================================

fn exit_for(status: Status) {
    // Exit with non-zero status on error/fail
    match status {
        Status::Pass | Status::Skip => {}
        Status::Fail => std::process::exit(1),
        Status::Error => std::process::exit(2),
    }
}

fn output_result(result: &CommandResult, json: bool) {
    if json {
        let j = serde_json::to_string_pretty(result).unwrap_or_default();
        println!("{}", j);
    } else {
        print_human(result);
    }
    exit_for(result.status);
}

fn output_scenario(scenario_result: &ScenarioResult, json: bool) {
    if json {
        let j = serde_json::to_string_pretty(scenario_result).unwrap_or_default();
        println!("{}", j);
    } else {
        println!(
            "Scenario: {}",
            scenario_result.name.as_deref().unwrap_or("<unnamed>")
        );
        println!("Overall: {:?}", scenario_result.overall_status);
        for (i, sr) in scenario_result.step_results.iter().enumerate() {
            let display = sr
                .data
                .as_ref()
                .and_then(|d| d.get("display"))
                .and_then(|v| v.as_str())
                .unwrap_or("");
            println!(
                "  Step {}: {} -> {:?} {} ({}us)",
                i, sr.target, sr.status, display, sr.timing.total_us
            );
        }
        println!("Result: {}", scenario_result.final_display);
    }
    exit_for(scenario_result.overall_status);
}

fn print_human(r: &CommandResult) {
    let status_icon = match r.status {
        Status::Pass => "PASS",
        Status::Fail => "FAIL",
        Status::Skip => "SKIP",
        Status::Error => "ERROR",
    };

    println!("[{}] {} {}", status_icon, r.command, r.target);
    println!("  run_id: {}", r.run_id);
    println!("  timing: {}us", r.timing.total_us);

    if let Some(ref err) = r.error {
        println!("  error:  {} – {}", err.code, err.message);
    }

    if let Some(ref data) = r.data {
        if let Ok(s) = serde_json::to_string_pretty(data) {
            for line in s.lines() {
                println!("  {}", line);
            }
        }
    }
}

// ===========================================================================
// Artifact helpers
// ===========================================================================

fn create_artifact_dir(dir: &Path, run_id: &str) -> Option<PathBuf> {
    let art_dir = dir.join(run_id);
    if let Err(e) = std::fs::create_dir_all(&art_dir) {
        tracing::warn!(dir = %art_dir.display(), error = %e, "failed to create artifacts dir");
        return None;
    }
    Some(art_dir)
}

/// Write `result.json` and `events.jsonl` under `<dir>/<run_id>/`, listing
/// both paths in `result.artifacts` first so the files and the printed result
/// agree.
fn write_artifacts(dir: &Path, result: &mut CommandResult) {
    let Some(art_dir) = create_artifact_dir(dir, &result.run_id) else {
        return;
    };
    let result_path = art_dir.join("result.json");
    let events_path = art_dir.join("events.jsonl");
    result.artifacts = vec![
        result_path.display().to_string(),
        events_path.display().to_string(),
    ];

    let j = serde_json::to_string_pretty(&*result).unwrap_or_default();
    if let Err(e) = std::fs::write(&result_path, &j) {
        tracing::warn!(path = %result_path.display(), error = %e, "failed to write artifact");
    }

    // events.jsonl (single event for non-scenario)
    if let Ok(line) = serde_json::to_string(&*result) {
        if let Err(e) = std::fs::write(&events_path, format!("{}\n", line)) {
            tracing::warn!(path = %events_path.display(), error = %e, "failed to write artifact");
        }
    }
}

fn write_scenario_artifacts(dir: &Path, scenario_result: &ScenarioResult) {
    let Some(art_dir) = create_artifact_dir(dir, &new_run_id()) else {
        return;
    };

    let j = serde_json::to_string_pretty(scenario_result).unwrap_or_default();
    let _ = std::fs::write(art_dir.join("result.json"), j);

    // Per-step results as events.jsonl
    let mut lines = String::new();
    for sr in &scenario_result.step_results {
        if let Ok(line) = serde_json::to_string(sr) {
            lines.push_str(&line);
            lines.push('\n');
        }
    }
    let _ = std::fs::write(art_dir.join("events.jsonl"), lines);
}
