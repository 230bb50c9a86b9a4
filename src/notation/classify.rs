use crate::error::DiceError;

use super::lexer::{TokenKind, Tokens};

/// The shape of a normalized notation, which decides how it is rolled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Form {
    /// `1d20;&+2`, segments that reuse the first total.
    Shared { curly: bool },
    /// `{3#1d20>10}`, repetitions that count successes.
    CurlyBulk,
    /// `3#1d20`
    Bulk,
    /// `{1d20+5>10}`, braces around a plain roll.
    SimpleCurly,
    /// `{4d6>4}`, the die roller counts the dice.
    Pool,
    Plain,
}

pub(crate) fn classify(dice: &str) -> Result<Form, DiceError> {
    let tokens = Tokens::new(dice);
    let braced = tokens.wrapped_in_braces();

    if tokens.iter().any(|token| token.kind == TokenKind::Semicolon) {
        if starts_bulk(&tokens) || braced.is_some_and(|inner| starts_bulk(&Tokens::new(inner))) {
            return Err(DiceError::UnsupportedCombination {
                notation: dice.to_owned(),
                cause: "bulk rolls are not allowed in shared rolls",
            });
        }
        return Ok(Form::Shared {
            curly: braced.is_some(),
        });
    }

    if starts_bulk(&tokens) {
        return Ok(Form::Bulk);
    }

    let Some(inner) = braced else {
        return Ok(Form::Plain);
    };
    let inner = Tokens::new(inner);
    if starts_bulk(&inner) {
        return Ok(Form::CurlyBulk);
    }
    if inner
        .with_depth()
        .any(|(depth, token)| depth == 0 && token.kind == TokenKind::Comma)
    {
        // a group of several rolls
        return Ok(Form::Plain);
    }

    let has_compare = inner
        .iter()
        .any(|token| matches!(token.kind, TokenKind::Compare(_)));
    if has_compare && !has_modifier(&inner) {
        Ok(Form::Pool)
    } else {
        Ok(Form::SimpleCurly)
    }
}

/// `N#` at the start of the notation.
fn starts_bulk(tokens: &Tokens) -> bool {
    let mut significant = tokens.significant().map(|token| token.kind);
    significant.next() == Some(TokenKind::Number) && significant.next() == Some(TokenKind::Hash)
}

/// A `+N`-like term that is not a dice quantity.
fn has_modifier(tokens: &Tokens) -> bool {
    let significant: Vec<_> = tokens.significant().collect();
    significant.windows(2).enumerate().any(|(i, pair)| {
        matches!(pair[0].kind, TokenKind::Operator(_))
            && pair[1].kind == TokenKind::Number
            && !significant
                .get(i + 2)
                .is_some_and(|next| next.kind == TokenKind::Word && tokens.text(next).starts_with('d'))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        #[rustfmt::skip]
        let inputs = [
            ("1d20+5", Form::Plain),
            ("1d20>10 # attack", Form::Plain),
            ("{2d6, 1d4}>=4", Form::Plain),
            ("{2d6}k1", Form::Plain),
            ("3#1d20", Form::Bulk),
            ("3#1d20>10", Form::Bulk),
            // `#` after a space starts a comment
            ("3 # 1d20", Form::Plain),
            ("{3#1d20>10}", Form::CurlyBulk),
            ("{1d20+5>10}", Form::SimpleCurly),
            ("{1d20}", Form::SimpleCurly),
            ("{4d6>4}", Form::Pool),
            ("{4d6+2d4>4}", Form::Pool),
            ("1d20;&+2", Form::Shared { curly: false }),
            ("{1d20;&>10}", Form::Shared { curly: true }),
            ("1d6 [a;b]", Form::Plain),
        ];

        for (input, expected) in inputs {
            assert_eq!(classify(input).unwrap(), expected, "{input}");
        }
    }

    #[test]
    fn test_bulk_inside_shared_is_rejected() {
        for input in ["2#1d20;&+1", "{2#1d20;&+1}"] {
            let err = classify(input).unwrap_err();
            assert!(
                matches!(err, DiceError::UnsupportedCombination { .. }),
                "{input}"
            );
        }
    }
}
