//! Engine crate – the history-tracking calculator and its command surface.
//!
//! This crate holds all calculator state and semantics. It performs no I/O,
//! so the CLI, the interactive REPL and the socket daemon all drive the same
//! [`CalculationEngine`] through [`CommandRegistry`].

pub mod calculator;
pub mod commands;
pub mod error;
pub mod operator;
pub mod scenario;
pub mod types;

// Re-exports for convenience
pub use calculator::{CalculationEngine, EngineSnapshot, Navigation};
pub use commands::CommandRegistry;
pub use error::{CalcError, CalcResult};
pub use operator::Operator;
pub use bigdecimal::BigDecimal;
pub use types::{CommandResult, ErrorCode, ErrorInfo, Status};
