//! Interactive session: one token per line, fed straight into the engine.

use calc_engine::calculator::parse_operand;
use calc_engine::{CalcError, CalculationEngine, BigDecimal, Navigation, Operator};
use dialoguer::Input;

const HELP: &str = "\
  <number>      enter an operand (the first one seeds the result)
  + - * /       choose the operator
  =             calculate
  undo | u      step back one result
  redo | r      step forward one result
  history | h   show committed results
  quit | q      leave";

#[derive(Debug, Clone, PartialEq)]
pub enum ReplAction {
    Operand(BigDecimal),
    Operator(Operator),
    Calculate,
    Undo,
    Redo,
    History,
    Help,
    Quit,
    Empty,
}

pub enum ReplOutcome {
    Continue(Option<String>),
    Quit,
}

pub fn parse_token(input: &str) -> Result<ReplAction, CalcError> {
    let token = input.trim();
    let action = match token {
        "" => ReplAction::Empty,
        "=" => ReplAction::Calculate,
        "undo" | "u" => ReplAction::Undo,
        "redo" | "r" => ReplAction::Redo,
        "history" | "h" => ReplAction::History,
        "help" | "?" => ReplAction::Help,
        "quit" | "exit" | "q" => ReplAction::Quit,
        "+" | "-" | "*" | "/" => ReplAction::Operator(token.parse()?),
        other => ReplAction::Operand(parse_operand(other)?),
    };
    Ok(action)
}

fn navigation_line(nav: Navigation, engine: &CalculationEngine) -> Option<String> {
    match nav {
        Navigation::Moved | Navigation::Reset => Some(engine.display()),
        Navigation::Empty => Some("nothing to undo".into()),
        Navigation::Exhausted | Navigation::Inactive => Some("no further history".into()),
    }
}

/// Apply one action and return the line to print, if any.
pub fn execute(engine: &mut CalculationEngine, action: ReplAction) -> ReplOutcome {
    let line = match action {
        ReplAction::Operand(value) => {
            engine.set_operand(value);
            None
        }
        ReplAction::Operator(op) => {
            engine.set_operator(op);
            None
        }
        ReplAction::Calculate => match engine.calculate() {
            Ok(_) => Some(engine.display()),
            Err(e) => Some(format!("error: {}", e)),
        },
        ReplAction::Undo => {
            let nav = engine.undo();
            navigation_line(nav, engine)
        }
        ReplAction::Redo => {
            let nav = engine.redo();
            navigation_line(nav, engine)
        }
        ReplAction::History => {
            let entries: Vec<String> = engine
                .history()
                .iter()
                .enumerate()
                .map(|(i, v)| {
                    let marker = if engine.cursor() == Some(i) { ">" } else { " " };
                    format!("{} {}: {}", marker, i, v)
                })
                .collect();
            Some(if entries.is_empty() {
                "(no history)".to_string()
            } else {
                entries.join("\n")
            })
        }
        ReplAction::Help => Some(HELP.to_string()),
        ReplAction::Quit => return ReplOutcome::Quit,
        ReplAction::Empty => None,
    };
    ReplOutcome::Continue(line)
}

pub fn run_repl(engine: &mut CalculationEngine, prompt: &str) -> anyhow::Result<()> {
    println!("{}", HELP);
    loop {
        let line: String = Input::new()
            .with_prompt(format!("{} [{}]", prompt, engine.display()))
            .allow_empty(true)
            .interact_text()?;

        let action = match parse_token(&line) {
            Ok(a) => a,
            Err(e) => {
                eprintln!("error: {}", e);
                continue;
            }
        };

        match execute(engine, action) {
            ReplOutcome::Continue(Some(out)) => println!("{}", out),
            ReplOutcome::Continue(None) => {}
            ReplOutcome::Quit => return Ok(()),
        }
    }
}
