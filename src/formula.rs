//! Arithmetic evaluation for formulas that must not roll anything: `{{...}}`
//! blocks, comparison thresholds and the segments of shared rolls.

use winnow::{
    ascii::multispace0,
    combinator::{delimited, opt},
    Parser,
};

use crate::{
    error::FormulaError,
    notation::{compare::compare_sign, CompareSign},
    parse::{parse_expr, Expression},
};

/// What a formula evaluates to, comparisons give a boolean.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FormulaValue {
    Number(f64),
    Bool(bool),
}

/// Evaluates an arithmetic formula with an optional comparison, `ceil(5/2)` or `9+2>5`.
///
/// Formulas use the arithmetic of the dice grammar: `+ - * / % ^ **`,
/// parentheses and the math functions. Dice are rejected.
pub fn evaluate(formula: &str) -> Result<FormulaValue, FormulaError> {
    let text = formula.trim();
    let mut parser = (
        parse_expr,
        opt((delimited(multispace0, compare_sign, multispace0), parse_expr)),
    );
    let (lhs, comparison): (Expression, Option<(CompareSign, Expression)>) =
        parser.parse(text).map_err(|e| FormulaError::Parse {
            formula: text.to_owned(),
            message: e.to_string(),
        })?;

    let lhs = constant_value(&lhs, text)?;
    match comparison {
        None => Ok(FormulaValue::Number(lhs)),
        Some((sign, rhs)) => {
            let rhs = constant_value(&rhs, text)?;
            Ok(FormulaValue::Bool(sign.matches(lhs, rhs)))
        }
    }
}

/// Same as [evaluate] but a comparison is an error.
pub fn evaluate_number(formula: &str) -> Result<f64, FormulaError> {
    match evaluate(formula)? {
        FormulaValue::Number(value) => Ok(value),
        FormulaValue::Bool(_) => Err(FormulaError::NotANumber(formula.trim().to_owned())),
    }
}

fn constant_value(expr: &Expression, formula: &str) -> Result<f64, FormulaError> {
    if expr.has_dice() {
        return Err(FormulaError::ContainsDice(formula.to_owned()));
    }

    let value = expr.constant().ok_or_else(|| FormulaError::Parse {
        formula: formula.to_owned(),
        message: "roll groups are not arithmetic".to_owned(),
    })?;

    if value.is_finite() {
        Ok(value)
    } else {
        Err(FormulaError::NonFinite(formula.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluate_numbers() {
        #[rustfmt::skip]
        let inputs = [
            ("1 + 2", 3.0),
            ("ceil((10-5)/2)", 3.0),
            ("  2^3 ", 8.0),
            ("-4 * 2.5", -10.0),
            ("max(3, 7) % 4", 3.0),
        ];

        for (input, expected) in inputs {
            assert_eq!(evaluate_number(input), Ok(expected), "{input}");
        }
    }

    #[test]
    fn test_evaluate_comparisons() {
        assert_eq!(evaluate("9+2>5"), Ok(FormulaValue::Bool(true)));
        assert_eq!(evaluate("3 >= 4"), Ok(FormulaValue::Bool(false)));
        assert_eq!(evaluate("3 != 4"), Ok(FormulaValue::Bool(true)));
        assert_eq!(evaluate("3<>3"), Ok(FormulaValue::Bool(false)));
        assert_eq!(evaluate("2*2 == 4"), Ok(FormulaValue::Bool(true)));
    }

    #[test]
    fn test_evaluate_errors() {
        assert!(matches!(evaluate("2d6+1"), Err(FormulaError::ContainsDice(_))));
        assert!(matches!(evaluate("1/0"), Err(FormulaError::NonFinite(_))));
        assert!(matches!(evaluate("1 +"), Err(FormulaError::Parse { .. })));
        assert!(matches!(evaluate("[9]+2"), Err(FormulaError::Parse { .. })));
        assert!(matches!(evaluate("{1, 2}"), Err(FormulaError::Parse { .. })));
        assert!(matches!(
            evaluate_number("3 > 2"),
            Err(FormulaError::NotANumber(_))
        ));
    }
}
