use rand::Rng;
use tracing::debug;

use crate::{
    error::{DiceError, NotationError},
    evaluate::round_total,
};

use super::{
    compare::split_compare,
    exploding::ExplodingSuccess,
    format::{star_faces, strip_unwanted_text},
    lexer::Tokens,
    modifier::extract_modifier,
    trivial::is_trivial,
    ComparedValue, RollResult, Roller,
};

impl<R: Rng + ?Sized> Roller<'_, R> {
    /// Rolls `N#notation` N times.
    ///
    /// With a comparison, or an exploding success, the total is the number of
    /// successes instead of the sum of the rolls.
    pub(crate) fn roll_bulk(
        &mut self,
        dice: &str,
        curly: bool,
        exploding: Option<&ExplodingSuccess>,
    ) -> Result<RollResult, DiceError> {
        let (body, comments) = Tokens::new(dice).without_comments();
        let comment = (!comments.is_empty()).then(|| comments.join(" "));

        let (body, compare) = if curly {
            let inner = Tokens::new(&body)
                .wrapped_in_braces()
                .map_or_else(|| body.clone(), str::to_owned);
            (inner, None)
        } else {
            self.extract_compare(&body)?
        };

        let Some((count, expr)) = body.split_once('#') else {
            return Err(DiceError::invalid(
                dice,
                "roll_bulk",
                NotationError(format!("`{body}` has no repetition count")),
            ));
        };
        let count: u32 = count.trim().parse().map_err(|_| {
            DiceError::invalid(
                dice,
                "roll_bulk",
                NotationError(format!("`{count}` is not a repetition count")),
            )
        })?;
        if let Some(max) = self.options.max_bulk_count {
            if count > max {
                return Err(DiceError::TooManyRolls { count, max });
            }
        }

        let (expr, curly_compare) = match split_compare(expr.trim()) {
            Some((lhs, sign, rhs)) if curly => {
                let compare = self.resolve_compare(sign, rhs)?;
                (lhs.to_owned(), Some(compare))
            }
            _ => (expr.trim().to_owned(), None),
        };
        let to_roll = exploding.map_or_else(|| expr.clone(), |e| e.for_roller(&expr));
        let modifier = extract_modifier(&expr);

        let active = compare
            .clone()
            .or_else(|| curly_compare.clone())
            .or_else(|| exploding.map(|e| ComparedValue::new(e.sign, e.value)));
        debug!(count, expr, counts_successes = active.is_some(), "bulk roll");

        let dice = match (curly, &curly_compare) {
            (true, Some(c)) => format!("{{{expr}{}{}}}", c.sign, c.value),
            (true, None) => format!("{{{expr}}}"),
            (false, _) => expr.clone(),
        };

        let Some(active) = active else {
            let mut total = 0.0;
            let mut outputs = Vec::with_capacity(count as usize);
            for _ in 0..count {
                let rolled = self.roll_dice(&to_roll)?;
                total += rolled.total;
                outputs.push(rolled.output);
            }

            return Ok(RollResult {
                dice,
                result: strip_unwanted_text(&outputs.join("; ")),
                total: round_total(total),
                compare: None,
                modifier,
                comment,
                pity_logs: None,
                trivial: false,
            });
        };

        let label = match &curly_compare {
            Some(c) => format!("{expr}{}{}", c.sign, c.value),
            None => expr.clone(),
        };
        let mut successes = 0;
        let mut trivial = false;
        let mut outputs = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let rolled = self.roll_dice(&to_roll)?;
            trivial = trivial || is_trivial(rolled.min_total, rolled.max_total, &active);

            let line = match exploding {
                Some(exploding) => {
                    let counted = exploding.count(&rolled.faces);
                    successes += counted;
                    format!("{label}: {} = {counted}", rolled.rolled)
                }
                None => {
                    let success = active.matches(rolled.total);
                    let faces = if success && curly {
                        successes += 1;
                        star_faces(&rolled.rolled)
                    } else {
                        successes += u32::from(success);
                        rolled.rolled
                    };
                    format!("{label}: {faces} = {}", rolled.total)
                }
            };
            outputs.push(line);
        }

        let compare = match (curly, compare) {
            (false, Some(compare)) => Some(ComparedValue { trivial, ..compare }),
            _ => None,
        };

        Ok(RollResult {
            dice,
            result: strip_unwanted_text(&outputs.join("; ")),
            total: successes as f64,
            compare,
            modifier,
            comment,
            pity_logs: None,
            trivial,
        })
    }
}
