//! History-tracking calculation engine.
//!
//! The engine folds one binary operation at a time into a running result and
//! records every committed result in a linear history. Undo/redo move a cursor
//! through that history; committing a new result after an undo discards the
//! entries ahead of the cursor.

use crate::error::{CalcError, CalcResult};
use crate::operator::Operator;
use bigdecimal::num_bigint::BigInt;
use bigdecimal::num_traits::{Signed, Zero};
use bigdecimal::{BigDecimal, RoundingMode};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Decimal places used when no scale is configured.
pub const DEFAULT_SCALE: u32 = 2;

/// Which branch an undo/redo call took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Navigation {
    /// The cursor moved and the running result was loaded from history.
    Moved,
    /// Undo of the only history entry: the running result was reset to zero.
    Reset,
    /// Nothing has been committed yet.
    Empty,
    /// Already at the earliest (undo) or latest (redo) reachable position.
    Exhausted,
    /// Redo requested while no cursor is set.
    Inactive,
}

impl Navigation {
    /// Whether the call changed any engine state.
    pub fn changed(self) -> bool {
        matches!(self, Navigation::Moved | Navigation::Reset)
    }
}

/// Serializable copy of the engine state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub running_result: Option<BigDecimal>,
    pub pending_operator: Option<Operator>,
    pub pending_operand: Option<BigDecimal>,
    pub history: Vec<BigDecimal>,
    pub cursor: Option<usize>,
    pub scale: u32,
    pub display: String,
}

/// Stateful calculator with linear undo/redo over committed results.
///
/// `cursor` is `None` until the first result is committed. Once set it always
/// indexes into `history`.
#[derive(Debug, Clone)]
pub struct CalculationEngine {
    running_result: Option<BigDecimal>,
    pending_operand: Option<BigDecimal>,
    pending_operator: Option<Operator>,
    history: Vec<BigDecimal>,
    cursor: Option<usize>,
    scale: u32,
}

impl Default for CalculationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl CalculationEngine {
    pub fn new() -> Self {
        Self::with_scale(DEFAULT_SCALE)
    }

    /// Create an engine that rounds and displays with `scale` decimal places.
    pub fn with_scale(scale: u32) -> Self {
        Self {
            running_result: None,
            pending_operand: None,
            pending_operator: None,
            history: Vec::new(),
            cursor: None,
            scale,
        }
    }

    // -----------------------------------------------------------------------
    // Inputs
    // -----------------------------------------------------------------------

    /// Stage an operand. The very first operand seeds the running result.
    pub fn set_operand(&mut self, value: BigDecimal) {
        if self.running_result.is_none() {
            self.running_result = Some(value);
        } else {
            self.pending_operand = Some(value);
        }
    }

    /// Stage an operator, replacing any pending one.
    pub fn set_operator(&mut self, op: Operator) {
        self.pending_operator = Some(op);
    }

    // -----------------------------------------------------------------------
    // Calculate
    // -----------------------------------------------------------------------

    /// Fold the pending operand into the running result (the `=` key).
    ///
    /// Returns the committed result, or `None` when there was no pending
    /// operand to fold. On error nothing is committed and the pending inputs
    /// are kept.
    pub fn calculate(&mut self) -> CalcResult<Option<BigDecimal>> {
        let before = self.display();
        let base = self
            .running_result
            .get_or_insert_with(BigDecimal::zero)
            .clone();

        if self.pending_operator.is_none() {
            tracing::warn!(display = %before, "no operator selected");
        }

        let Some(operand) = self.pending_operand.as_ref() else {
            tracing::info!(
                before = %before,
                after = %self.display(),
                "calculate: nothing to fold"
            );
            return Ok(None);
        };

        let op = self.pending_operator.unwrap_or(Operator::Add);
        let result = apply(&base, op, operand, self.scale)?;

        let keep = self.cursor.map_or(0, |c| c + 1);
        if self.history.len() > keep {
            tracing::debug!(
                discarded = self.history.len() - keep,
                "dropping redo history ahead of cursor"
            );
            self.history.truncate(keep);
        }
        self.history.push(result.clone());
        self.cursor = Some(keep);

        self.running_result = Some(result.clone());
        self.pending_operator = None;
        self.pending_operand = None;

        tracing::info!(cursor = keep, "{}={}", before, self.display());
        Ok(Some(result))
    }

    // -----------------------------------------------------------------------
    // Undo / redo
    // -----------------------------------------------------------------------

    /// Step back one committed result.
    ///
    /// The guards run in a fixed order: empty history, single-entry history,
    /// earliest position, then the general decrement. With a single entry the
    /// running result is reset to zero without moving the cursor.
    pub fn undo(&mut self) -> Navigation {
        if self.history.is_empty() {
            tracing::warn!("nothing to undo");
            return Navigation::Empty;
        }

        if self.history.len() == 1 {
            tracing::info!(before = ?self.running_result, "undo: reset to 0");
            self.running_result = Some(BigDecimal::zero());
            return Navigation::Reset;
        }

        // An unset cursor counts as -1 and falls under this guard as well.
        let cursor = match self.cursor {
            Some(c) if c >= 1 => c,
            _ => {
                tracing::warn!(cursor = ?self.cursor, "cannot undo further");
                return Navigation::Exhausted;
            }
        };

        self.move_to(cursor - 1);
        tracing::info!(cursor = cursor - 1, result = %self.entry(cursor - 1), "undo");
        Navigation::Moved
    }

    /// Step forward one committed result after an undo.
    pub fn redo(&mut self) -> Navigation {
        let Some(cursor) = self.cursor else {
            tracing::info!("redo: no history position");
            return Navigation::Inactive;
        };

        if cursor + 1 == self.history.len() {
            tracing::warn!(cursor, "cannot redo further");
            return Navigation::Exhausted;
        }

        self.move_to(cursor + 1);
        tracing::info!(cursor = cursor + 1, result = %self.entry(cursor + 1), "redo");
        Navigation::Moved
    }

    fn move_to(&mut self, index: usize) {
        self.running_result = Some(self.entry(index).clone());
        self.cursor = Some(index);
    }

    fn entry(&self, index: usize) -> &BigDecimal {
        debug_assert!(
            index < self.history.len(),
            "history index {} out of range (len {})",
            index,
            self.history.len()
        );
        &self.history[index]
    }

    // -----------------------------------------------------------------------
    // Read-only views
    // -----------------------------------------------------------------------

    /// Running result (rounded half-down), pending operator, pending operand.
    pub fn display(&self) -> String {
        let mut out = String::new();
        if let Some(result) = &self.running_result {
            let shown = result.with_scale_round(i64::from(self.scale), RoundingMode::HalfDown);
            out.push_str(&shown.to_string());
        }
        if let Some(op) = self.pending_operator {
            out.push_str(op.symbol());
        }
        if let Some(operand) = &self.pending_operand {
            out.push_str(&operand.to_string());
        }
        out
    }

    pub fn running_result(&self) -> Option<&BigDecimal> {
        self.running_result.as_ref()
    }

    pub fn pending_operand(&self) -> Option<&BigDecimal> {
        self.pending_operand.as_ref()
    }

    pub fn pending_operator(&self) -> Option<Operator> {
        self.pending_operator
    }

    pub fn history(&self) -> &[BigDecimal] {
        &self.history
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            running_result: self.running_result.clone(),
            pending_operator: self.pending_operator,
            pending_operand: self.pending_operand.clone(),
            history: self.history.clone(),
            cursor: self.cursor,
            scale: self.scale,
            display: self.display(),
        }
    }
}

// ---------------------------------------------------------------------------
// Arithmetic
// ---------------------------------------------------------------------------

/// Apply `op` to `a` and `b`. Addition is exact; the other operators round
/// the exact result half-up to `scale` places.
pub fn apply(a: &BigDecimal, op: Operator, b: &BigDecimal, scale: u32) -> CalcResult<BigDecimal> {
    let scale = i64::from(scale);
    match op {
        Operator::Add => Ok(a + b),
        Operator::Subtract => Ok((a - b).with_scale_round(scale, RoundingMode::HalfUp)),
        Operator::Multiply => Ok((a * b).with_scale_round(scale, RoundingMode::HalfUp)),
        Operator::Divide => {
            if b.is_zero() {
                return Err(CalcError::DivisionByZero);
            }
            Ok(divide_half_up(a, b, scale))
        }
    }
}

/// `a / b` rounded half-up to `scale` places, computed on the unscaled
/// integers so the quotient is never rounded at an intermediate precision.
fn divide_half_up(a: &BigDecimal, b: &BigDecimal, scale: i64) -> BigDecimal {
    let (a_digits, a_scale) = a.as_bigint_and_exponent();
    let (b_digits, b_scale) = b.as_bigint_and_exponent();

    // a / b * 10^scale == a_digits * 10^shift / b_digits
    let shift = b_scale - a_scale + scale;
    let (num, den) = if shift >= 0 {
        (a_digits * pow10(shift), b_digits)
    } else {
        (a_digits, b_digits * pow10(-shift))
    };

    let mut quotient = &num / &den;
    let remainder = &num % &den;
    if remainder.abs() * 2u32 >= den.abs() {
        if num.is_negative() != den.is_negative() {
            quotient -= 1u32;
        } else {
            quotient += 1u32;
        }
    }
    BigDecimal::new(quotient, scale)
}

fn pow10(exp: i64) -> BigInt {
    let exp = u32::try_from(exp).unwrap_or(u32::MAX);
    BigInt::from(10u8).pow(exp)
}

/// Parse a user-supplied operand.
pub fn parse_operand(s: &str) -> CalcResult<BigDecimal> {
    BigDecimal::from_str(s.trim())
        .map_err(|e| CalcError::InvalidOperand(format!("{:?}: {}", s, e)))
}
