use super::{
    lexer::{TokenKind, Tokens},
    Modifier,
};

/// Folds the `+3`, `-1`, ... written at the top level of a notation into one
/// modifier. Numbers that are a dice quantity, `+2d4`, are not modifiers.
///
/// Each new term is applied to the running value with the operator seen
/// before it and the result takes the newest operator, `+5-2` folds to `-` 7.
/// The total of a roll never depends on this value.
pub(crate) fn extract_modifier(dice: &str) -> Option<Modifier> {
    let tokens = Tokens::new(dice);
    let significant: Vec<(usize, &_)> = tokens
        .with_depth()
        .filter(|(_, token)| token.is_significant())
        .collect();

    let mut modifier: Option<Modifier> = None;
    for window in significant.windows(3).chain(significant.windows(2).last()) {
        let (depth, first) = window[0];
        let (_, second) = window[1];
        let TokenKind::Operator(op) = first.kind else {
            continue;
        };
        if depth != 0 || second.kind != TokenKind::Number {
            continue;
        }
        let is_quantity = window.get(2).is_some_and(|(_, next)| {
            next.kind == TokenKind::Word && tokens.text(next).starts_with('d')
        });
        if is_quantity {
            continue;
        }
        let Ok(value) = tokens.text(second).parse::<f64>() else {
            continue;
        };

        modifier = Some(match modifier {
            None => Modifier {
                sign: Some(op),
                value,
            },
            Some(Modifier { sign, value: acc }) => Modifier {
                value: sign.map_or(value, |sign| sign.apply(acc, value)),
                sign: Some(op),
            },
        });
    }

    modifier
}

#[cfg(test)]
mod tests {
    use crate::parse::Operator;

    use super::*;

    #[test]
    fn test_extract_modifier() {
        #[rustfmt::skip]
        let inputs = [
            ("1d20+5", Some((Operator::Add, 5.0))),
            ("1d20-2", Some((Operator::Sub, 2.0))),
            ("2d6*2", Some((Operator::Mul, 2.0))),
            ("1d20 + 5", Some((Operator::Add, 5.0))),
            ("1d20+3+2", Some((Operator::Add, 5.0))),
            // 5 + 2, signed with the last operator
            ("1d20+5-2", Some((Operator::Sub, 7.0))),
            ("1d20*2+1", Some((Operator::Add, 2.0))),
            ("1d20+2d4", None),
            ("1d20+(2+3)", None),
            ("1d20", None),
        ];

        for (input, expected) in inputs {
            let expected = expected.map(|(sign, value)| Modifier {
                sign: Some(sign),
                value,
            });
            assert_eq!(extract_modifier(input), expected, "{input}");
        }
    }
}
