use crate::parse::Expression;

use super::{lexer::PLACEHOLDERS, ComparedValue, CompareSign};

impl CompareSign {
    /// Whether a total between `min` and `max` can pass the comparison.
    pub fn can_succeed(self, min: f64, max: f64, value: f64) -> bool {
        match self {
            CompareSign::Greater => max > value,
            CompareSign::GreaterEqual => max >= value,
            CompareSign::Less => min < value,
            CompareSign::LessEqual => min <= value,
            CompareSign::Equal | CompareSign::DoubleEqual => min <= value && value <= max,
            CompareSign::NotEqual => max != value || min != value,
        }
    }

    /// Whether a total between `min` and `max` can miss the comparison.
    pub fn can_fail(self, min: f64, max: f64, value: f64) -> bool {
        match self {
            CompareSign::Greater => min <= value,
            CompareSign::GreaterEqual => min < value,
            CompareSign::Less => max >= value,
            CompareSign::LessEqual => max > value,
            CompareSign::Equal | CompareSign::DoubleEqual => min != value || max != value,
            CompareSign::NotEqual => min <= value && value <= max,
        }
    }
}

/// A comparison whose outcome does not depend on the dice.
pub(crate) fn is_trivial(min: f64, max: f64, compare: &ComparedValue) -> bool {
    !compare.sign.can_succeed(min, max, compare.value)
        || !compare.sign.can_fail(min, max, compare.value)
}

/// Range of a die roller notation, `None` when it does not parse.
pub(crate) fn notation_bounds(dice: &str) -> Option<(f64, f64)> {
    Expression::parse(dice).ok().map(|expr| expr.bounds())
}

/// Range of a formula where the placeholder stands for a total within `main`.
///
/// The formula is evaluated with the placeholder at both ends of the range,
/// which is exact for the sums and products found in shared rolls.
pub(crate) fn substituted_bounds(formula: &str, main: (f64, f64)) -> Option<(f64, f64)> {
    let (low, high) = main;
    if !low.is_finite() || !high.is_finite() {
        return None;
    }

    let at = |total: f64| {
        let text = formula.replace(PLACEHOLDERS, &format!("({total})"));
        notation_bounds(&text)
    };
    let (low_min, low_max) = at(low)?;
    let (high_min, high_max) = at(high)?;

    Some((low_min.min(high_min), low_max.max(high_max)))
}
