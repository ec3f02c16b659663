use crate::error::CalcError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Binary operator applied between the running result and the pending operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Subtract,
    #[serde(rename = "*")]
    Multiply,
    #[serde(rename = "/")]
    Divide,
}

impl Operator {
    pub const ALL: [Operator; 4] = [
        Operator::Add,
        Operator::Subtract,
        Operator::Multiply,
        Operator::Divide,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Subtract => "-",
            Operator::Multiply => "*",
            Operator::Divide => "/",
        }
    }
}

impl FromStr for Operator {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "+" => Ok(Operator::Add),
            "-" => Ok(Operator::Subtract),
            "*" => Ok(Operator::Multiply),
            "/" => Ok(Operator::Divide),
            other => Err(CalcError::UnknownOperator(other.to_string())),
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_symbols() {
        for op in Operator::ALL {
            assert_eq!(op.symbol().parse::<Operator>().unwrap(), op);
        }
        assert_eq!(" * ".parse::<Operator>().unwrap(), Operator::Multiply);
    }

    #[test]
    fn test_unknown_symbol_is_an_error() {
        let err = "%".parse::<Operator>().unwrap_err();
        assert_eq!(err, CalcError::UnknownOperator("%".into()));
    }

    #[test]
    fn test_serde_uses_symbol() {
        let json = serde_json::to_string(&Operator::Divide).unwrap();
        assert_eq!(json, "\"/\"");
        let op: Operator = serde_json::from_str("\"-\"").unwrap();
        assert_eq!(op, Operator::Subtract);
    }
}
