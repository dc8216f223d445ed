//! Error types for the loan engine

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Which side of a comparison an error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LoanSide {
    Reference,
    Alternative,
}

impl fmt::Display for LoanSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoanSide::Reference => write!(f, "reference"),
            LoanSide::Alternative => write!(f, "alternative"),
        }
    }
}

/// Failures of the numeric routines (solver, guards)
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NumericError {
    #[error("no sign change of net worth between {lower}% and {upper}% growth")]
    NoBracket { lower: f64, upper: f64 },

    #[error("non-finite value in {context}")]
    NonFinite { context: String },

    #[error("bisection did not converge after {iterations} iterations (residual: {residual})")]
    NoConvergence { iterations: u32, residual: f64 },
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid input{}: {field}: {reason}", side_suffix(.side))]
    Validation {
        side: Option<LoanSide>,
        field: String,
        reason: String,
    },

    #[error("Unsupported loan type: {0}")]
    UnsupportedLoanType(String),

    #[error("Numeric error: {0}")]
    Numeric(#[from] NumericError),

    #[error("Schedule input error: {0}")]
    Schedule(String),
}

fn side_suffix(side: &Option<LoanSide>) -> String {
    match side {
        Some(s) => format!(" ({} loan)", s),
        None => String::new(),
    }
}

impl EngineError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        EngineError::Validation {
            side: None,
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Attach the comparison side to a validation error
    pub fn for_side(self, loan_side: LoanSide) -> Self {
        match self {
            EngineError::Validation { field, reason, .. } => EngineError::Validation {
                side: Some(loan_side),
                field,
                reason,
            },
            other => other,
        }
    }

    /// True for errors caused by the caller's input
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            EngineError::Validation { .. } | EngineError::UnsupportedLoanType(_) | EngineError::Schedule(_)
        )
    }
}

impl From<csv::Error> for EngineError {
    fn from(e: csv::Error) -> Self {
        EngineError::Schedule(e.to_string())
    }
}

impl From<std::io::Error> for EngineError {
    fn from(e: std::io::Error) -> Self {
        EngineError::Schedule(e.to_string())
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
