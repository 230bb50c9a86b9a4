use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

use crate::{error::DiceError, formula};

/// Rewrites user input into the canonical notation the rest of the pipeline expects.
pub(crate) fn normalize(raw: &str) -> Result<String, DiceError> {
    let dice = standardize(raw);
    let dice = inline_formulas(&dice, "normalize")?;
    let dice = outside_brackets(&dice, |text| {
        clean_signs(text).replace("=>", ">=").replace("=<", "<=")
    });
    let dice = remove_critical_markers(&dice);
    let dice = collapse_die_sizes(&dice);

    Ok(dice.trim().trim_start_matches('+').trim_start().to_owned())
}

/// Lowercases and strips accents everywhere but in `[...]` comments, fullwidth
/// characters fold to their ascii form.
pub(crate) fn standardize(text: &str) -> String {
    outside_brackets(text, |part| {
        part.nfkd()
            .filter(|c| !is_combining_mark(*c))
            .collect::<String>()
            .to_lowercase()
    })
}

/// Applies `f` to the text between the `[...]` comments.
pub(crate) fn outside_brackets(text: &str, f: impl Fn(&str) -> String) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find('[') {
        let Some(close) = rest[open..].find(']').map(|i| open + i + 1) else {
            break;
        };
        out.push_str(&f(&rest[..open]));
        out.push_str(&rest[open..close]);
        rest = &rest[close..];
    }
    out.push_str(&f(rest));

    out
}

/// Replaces every `{{formula}}` with its value.
pub(crate) fn inline_formulas(text: &str, method: &'static str) -> Result<String, DiceError> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find("{{") {
        let Some(end) = rest[start..].find("}}").map(|i| start + i) else {
            break;
        };
        let block = &rest[start..end + 2];
        let value = formula::evaluate_number(&rest[start + 2..end])
            .map_err(|e| DiceError::formula(block, method, e))?;

        out.push_str(&rest[..start]);
        out.push_str(&value.to_string());
        rest = &rest[end + 2..];
    }
    out.push_str(rest);

    Ok(out)
}

/// One pass over doubled signs, in order: `+-` to `-`, `--` to `+`, `++` to `+`.
pub(crate) fn clean_signs(text: &str) -> String {
    text.replace("+-", "-")
        .replace("--", "+")
        .replace("++", "+")
}

/// `{cs:...}` and `{cf:...}` markers are for the consumers of the result.
fn remove_critical_markers(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = ["{cs:", "{cf:"]
        .iter()
        .filter_map(|marker| rest.find(marker))
        .min()
    {
        let Some(end) = rest[start..].find('}').map(|i| start + i + 1) else {
            break;
        };
        out.push_str(&rest[..start]);
        rest = &rest[end..];
    }
    out.push_str(rest);

    out
}

/// `1d(20)` is `1d20`, a computed size like `1d(2*10)` is left to the die roller.
fn collapse_die_sizes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find("d(") {
        let inner = &rest[start + 2..];
        let digits = inner
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(inner.len());
        out.push_str(&rest[..start + 1]);
        if digits > 0 && inner[digits..].starts_with(')') {
            out.push_str(&inner[..digits]);
            rest = &inner[digits + 1..];
        } else {
            out.push('(');
            rest = inner;
        }
    }
    out.push_str(rest);

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        #[rustfmt::skip]
        let inputs = [
            ("  2D6+3 ", "2d6+3"),
            ("+1d20", "1d20"),
            ("1d20+-2", "1d20-2"),
            ("1d20--2", "1d20+2"),
            ("1d20++2", "1d20+2"),
            ("1d20=>10", "1d20>=10"),
            ("1d20=<10", "1d20<=10"),
            ("1d(20)+1", "1d20+1"),
            ("1d(2*10)", "1d(2*10)"),
            ("1d{{4*5}}", "1d20"),
            ("1d20{cs:>=20}{cf:<=1}", "1d20"),
            ("１ｄ６", "1d6"),
            ("1d6 [ÉPÉE--Magique]", "1d6 [ÉPÉE--Magique]"),
            ("1D6 # Épée", "1d6 # epee"),
        ];

        for (input, expected) in inputs {
            assert_eq!(normalize(input).unwrap(), expected, "{input}");
        }
    }

    #[test]
    fn test_normalize_rejects_broken_formula() {
        let err = normalize("1d{{1/0}}").unwrap_err();
        assert!(matches!(err, DiceError::Formula { .. }));
        assert_eq!(err.notation(), "{{1/0}}");
    }

    #[test]
    fn test_outside_brackets() {
        let upper = outside_brackets("a[b]c[d", |s| s.to_uppercase());
        assert_eq!(upper, "A[b]C[D");
    }
}
