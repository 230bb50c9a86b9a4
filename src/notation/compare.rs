use rand::Rng;
use tracing::debug;
use winnow::{combinator::alt, PResult, Parser};

use crate::{error::DiceError, formula};

use super::{
    lexer::{TokenKind, Tokens},
    ComparedValue, CompareSign, Roller,
};

pub(crate) fn compare_sign(input: &mut &str) -> PResult<CompareSign> {
    alt((
        "<=".value(CompareSign::LessEqual),
        ">=".value(CompareSign::GreaterEqual),
        "=<".value(CompareSign::LessEqual),
        "=>".value(CompareSign::GreaterEqual),
        "<>".value(CompareSign::NotEqual),
        "!=".value(CompareSign::NotEqual),
        "==".value(CompareSign::DoubleEqual),
        "<".value(CompareSign::Less),
        ">".value(CompareSign::Greater),
        "=".value(CompareSign::Equal),
    ))
    .parse_next(input)
}

/// Cuts `lhs <sign> rhs` at the first comparison outside of any group.
///
/// A comparison right after a `{a, b}` group is a target success of that
/// group and stays with the die roller.
pub(crate) fn split_compare(dice: &str) -> Option<(&str, CompareSign, &str)> {
    let tokens = Tokens::new(dice);
    let mut in_group = false;
    let mut several_items = false;
    let mut previous = None;

    for (depth, token) in tokens.with_depth() {
        match token.kind {
            TokenKind::OpenBrace if depth == 0 => {
                in_group = true;
                several_items = false;
            }
            TokenKind::CloseBrace if depth == 0 => in_group = false,
            TokenKind::Comma if depth == 1 && in_group => several_items = true,
            TokenKind::Compare(sign) if depth == 0 => {
                if several_items && previous == Some(TokenKind::CloseBrace) {
                    return None;
                }
                let lhs = dice[..token.span.start].trim();
                let rhs = dice[token.span.end..].trim();
                return Some((lhs, sign, rhs));
            }
            _ => {}
        }

        if depth == 0 && token.is_significant() {
            previous = Some(token.kind);
        }
    }

    None
}

impl<R: Rng + ?Sized> Roller<'_, R> {
    /// Splits the comparison off a notation and resolves its value.
    pub(crate) fn extract_compare(
        &mut self,
        dice: &str,
    ) -> Result<(String, Option<ComparedValue>), DiceError> {
        let Some((lhs, sign, rhs)) = split_compare(dice) else {
            return Ok((dice.to_owned(), None));
        };

        let compare = self.resolve_compare(sign, rhs)?;
        Ok((lhs.to_owned(), Some(compare)))
    }

    /// The value on the right of a comparison may be a number, a roll of its
    /// own or a formula. Anything else compares against 0.
    pub(crate) fn resolve_compare(
        &mut self,
        sign: CompareSign,
        raw: &str,
    ) -> Result<ComparedValue, DiceError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(ComparedValue::new(sign, 0.0));
        }
        if let Some(value) = raw.parse::<f64>().ok().filter(|v| v.is_finite()) {
            return Ok(ComparedValue::new(sign, value));
        }

        if Tokens::new(raw).has_dice() {
            let pity = self.options.pity;
            match self.nested(raw, pity) {
                Ok(Some(rolled)) => {
                    return Ok(ComparedValue {
                        original_dice: Some(rolled.dice),
                        roll_value: Some(rolled.result),
                        ..ComparedValue::new(sign, rolled.total)
                    })
                }
                Ok(None) => {}
                Err(e) if e.is_recoverable() => debug!(raw, %e, "comparison value is not a roll"),
                Err(e) => return Err(e),
            }
        }

        match formula::evaluate_number(raw) {
            Ok(value) => Ok(ComparedValue {
                original_dice: Some(raw.to_owned()),
                ..ComparedValue::new(sign, value)
            }),
            Err(e) => {
                debug!(raw, %e, "comparison value defaults to 0");
                Ok(ComparedValue::new(sign, 0.0))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use crate::RollOptions;

    use super::*;

    #[test]
    fn test_compare_sign() {
        #[rustfmt::skip]
        let inputs = [
            ("<=", CompareSign::LessEqual),
            ("=<", CompareSign::LessEqual),
            (">=", CompareSign::GreaterEqual),
            ("<>", CompareSign::NotEqual),
            ("!=", CompareSign::NotEqual),
            ("==", CompareSign::DoubleEqual),
            ("=", CompareSign::Equal),
            ("<", CompareSign::Less),
        ];

        for (input, expected) in inputs {
            assert_eq!(compare_sign.parse(input).ok(), Some(expected), "{input}");
        }
    }

    #[test]
    fn test_split_compare() {
        assert_eq!(
            split_compare("1d20+5 >= 15"),
            Some(("1d20+5", CompareSign::GreaterEqual, "15"))
        );
        assert_eq!(
            split_compare("{2d6}>3"),
            Some(("{2d6}", CompareSign::Greater, "3"))
        );
        assert_eq!(
            split_compare("1d20>1d10+2"),
            Some(("1d20", CompareSign::Greater, "1d10+2"))
        );
        assert_eq!(split_compare("2d6!>4"), None);
        assert_eq!(split_compare("{2d6>4}"), None);
        assert_eq!(split_compare("{2d6, 1d4}>3"), None);
        assert_eq!(split_compare("5d6>4f<2"), None);
        assert_eq!(split_compare("2d6+3"), None);
    }

    #[test]
    fn test_resolve_compare() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut roller = Roller::new(&mut rng, RollOptions::default());

        let compare = roller.resolve_compare(CompareSign::Greater, "12").unwrap();
        assert_eq!(compare, ComparedValue::new(CompareSign::Greater, 12.0));

        let compare = roller.resolve_compare(CompareSign::Greater, "").unwrap();
        assert_eq!(compare.value, 0.0);

        let compare = roller.resolve_compare(CompareSign::Less, "ceil(7/2)").unwrap();
        assert_eq!(compare.value, 4.0);
        assert_eq!(compare.original_dice.as_deref(), Some("ceil(7/2)"));

        let compare = roller.resolve_compare(CompareSign::Less, "hello").unwrap();
        assert_eq!(compare.value, 0.0);
    }

    #[test]
    fn test_resolve_compare_rolls_dice() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut roller = Roller::new(&mut rng, RollOptions::default());

        let compare = roller.resolve_compare(CompareSign::Less, "2d6").unwrap();
        assert_eq!(compare.value, 11.0);
        assert_eq!(compare.original_dice.as_deref(), Some("2d6"));
        assert_eq!(compare.roll_value.as_deref(), Some("2d6: [5, 6] = 11"));
    }
}
