/// Errors surfaced by [`roll`](crate::roll) and the helpers around it.
///
/// Every variant carries the notation (or formula) that triggered it so callers
/// can show it back to the user.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DiceError {
    #[error("Invalid dice notation `{notation}` in {method}: {source}")]
    InvalidDiceNotation {
        notation: String,
        method: &'static str,
        source: NotationError,
    },

    #[error("Invalid formula `{formula}` in {method}: {source}")]
    Formula {
        formula: String,
        method: &'static str,
        source: FormulaError,
    },

    #[error("Unsupported combination in `{notation}`: {cause}")]
    UnsupportedCombination {
        notation: String,
        cause: &'static str,
    },

    #[error("Notation `{notation}` nests deeper than {depth} levels")]
    RecursionLimit { notation: String, depth: usize },

    #[error("Too many repetitions: {count} requested, at most {max} allowed")]
    TooManyRolls { count: u32, max: u32 },
}

impl DiceError {
    pub(crate) fn invalid(notation: &str, method: &'static str, source: NotationError) -> Self {
        DiceError::InvalidDiceNotation {
            notation: notation.to_owned(),
            method,
            source,
        }
    }

    pub(crate) fn formula(formula: &str, method: &'static str, source: FormulaError) -> Self {
        DiceError::Formula {
            formula: formula.to_owned(),
            method,
            source,
        }
    }

    /// The notation or formula the error refers to.
    pub fn notation(&self) -> &str {
        match self {
            DiceError::InvalidDiceNotation { notation, .. }
            | DiceError::UnsupportedCombination { notation, .. }
            | DiceError::RecursionLimit { notation, .. } => notation,
            DiceError::Formula { formula, .. } => formula,
            DiceError::TooManyRolls { .. } => "",
        }
    }

    /// Errors a shared chain may swallow for a single segment.
    pub(crate) fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DiceError::InvalidDiceNotation { .. } | DiceError::Formula { .. }
        )
    }
}

/// The die roller grammar rejected the input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct NotationError(pub(crate) String);

/// Failures of the arithmetic evaluator.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormulaError {
    #[error("Cannot parse `{formula}`: {message}")]
    Parse { formula: String, message: String },

    #[error("Unexpected dice expression: {0}")]
    ContainsDice(String),

    #[error("Expected a number, got a comparison: {0}")]
    NotANumber(String),

    #[error("Result is not a finite number: {0}")]
    NonFinite(String),
}
