mod bounds;
pub(crate) mod dice_roll;
pub(crate) mod expression;
pub(crate) mod group_rolls;
pub(crate) mod roll;

use rand::Rng;
use tracing::trace;

use crate::{error::DiceError, parse::SortKind, Expression};

pub use expression::RolledExpression;
pub use group_rolls::GroupOutput;
pub use roll::{Roll, RollOutput, RollOutputKind};

/// Everything the notation pipeline needs from one call to the die roller.
#[derive(Debug, Clone, PartialEq)]
pub struct RolledNotation {
    /// The notation as it was rolled.
    pub notation: String,
    pub total: f64,
    /// The rolled dice and arithmetic, `[4, 2]+3`.
    pub rolled: String,
    /// `"<notation>: <rolled> = <total>"`
    pub output: String,
    /// Lowest total the notation can produce.
    pub min_total: f64,
    /// Highest total the notation can produce, infinite when dice can explode.
    pub max_total: f64,
    /// Values of every die, one list per dice term in reading order.
    pub faces: Vec<Vec<i32>>,
}

/// Parses and rolls a die roller notation such as `2d6+3` or `{4d6}k3`.
///
/// `sort` is applied to every dice term that does not declare its own sort modifier.
pub fn roll_notation<R: Rng + ?Sized>(
    notation: &str,
    sort: Option<SortKind>,
    rng: &mut R,
) -> Result<RolledNotation, DiceError> {
    let notation = notation.trim();
    trace!(notation, "rolling notation");

    let expression = Expression::parse(notation)
        .map_err(|e| DiceError::invalid(notation, "roll_notation", e))?;
    let rolled = expression
        .roll_sorted(sort, rng)
        .map_err(|e| DiceError::invalid(notation, "roll_notation", e))?;
    let (min_total, max_total) = expression.bounds();
    let total = round_total(rolled.value());
    let transcript = rolled.to_string();

    Ok(RolledNotation {
        notation: notation.to_owned(),
        total,
        output: format!("{notation}: {transcript} = {total}"),
        rolled: transcript,
        min_total,
        max_total,
        faces: rolled.faces(),
    })
}

/// Totals keep at most two decimals.
pub(crate) fn round_total(total: f64) -> f64 {
    if total.is_finite() {
        (total * 100.0).round() / 100.0
    } else {
        total
    }
}
