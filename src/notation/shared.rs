//! `1d20;&+2;&>15`: the first roll is made once and the following segments
//! reuse its total through the `&` placeholder.

use rand::Rng;
use tracing::{debug, warn};

use crate::{error::DiceError, evaluate::round_total, formula};

use super::{
    compare::split_compare,
    exploding::extract_exploding,
    format::{
        after_label, format_comment, FAILURE_GLYPH, FORMULA_GLYPH, SHARED_GLYPH, SUCCESS_GLYPH,
    },
    lexer::{Tokens, PLACEHOLDERS},
    trivial::{is_trivial, notation_bounds, substituted_bounds},
    ComparedValue, CompareSign, RollResult, Roller,
};

/// A segment after the first one, with the placeholder substituted.
struct Segment {
    /// The segment as written, comments removed.
    element: String,
    comment: String,
    /// The placeholder replaced by the first total.
    to_roll: String,
    /// The placeholder replaced by the first notation, for display.
    dice_all: String,
    /// The placeholder replaced by the first total, for display.
    formule: String,
}

#[derive(Default)]
struct Outcome {
    line: Option<String>,
    contribution: f64,
    compare: Option<ComparedValue>,
    trivial: bool,
}

impl<R: Rng + ?Sized> Roller<'_, R> {
    pub(crate) fn roll_shared(
        &mut self,
        dice: &str,
        curly: bool,
    ) -> Result<Option<RollResult>, DiceError> {
        let text = if curly {
            Tokens::new(dice).wrapped_in_braces().unwrap_or(dice)
        } else {
            dice
        };
        let tokens = Tokens::new(text);
        let segments = tokens.segments();
        let Some((first, rest)) = segments.split_first() else {
            return Ok(None);
        };

        let (main_body, main_comments) = Tokens::new(first).without_comments();
        let hidden_notation = Tokens::new(&main_body)
            .wrapped_in_parens()
            .map(str::to_owned);
        let mut hidden = hidden_notation.is_some();
        let main_notation = hidden_notation.unwrap_or_else(|| main_body.clone());

        let pity = self.options.pity;
        let mut main = self.nested(&main_notation, pity)?;
        if main.is_none() && hidden {
            main = self.nested(&main_body, pity)?;
            hidden = false;
        }
        let Some(main) = main else {
            debug!(main_notation, "first segment of shared roll has no dice");
            return Ok(None);
        };

        let main_bounds = if extract_exploding(&main_notation).is_some() {
            None
        } else {
            let dice = split_compare(&main_notation).map_or(main_notation.as_str(), |(lhs, ..)| lhs);
            notation_bounds(dice)
        };

        let mut lines = vec![format!(
            "{SHARED_GLYPH} {}{}",
            format_comment(&main_comments),
            main.result
        )];
        let mut total = main.total;
        let mut compare = main.compare.clone();
        let mut trivial = main.trivial;

        for raw in rest {
            let (element, comments) = Tokens::new(raw).without_comments();
            if element.is_empty() {
                continue;
            }
            let segment = Segment {
                comment: format_comment(&comments),
                to_roll: element.replace(PLACEHOLDERS, &main.total.to_string()),
                dice_all: element.replace(PLACEHOLDERS, &format!("[{}]", main.dice)),
                formule: element.replace(PLACEHOLDERS, &format!("[{}]", main.total)),
                element,
            };

            let outcome = match self.roll_segment(&segment, curly, main_bounds) {
                Ok(outcome) => outcome,
                Err(e) if e.is_recoverable() => {
                    warn!(segment = segment.element, %e, "skipping shared segment");
                    continue;
                }
                Err(e) => return Err(e),
            };

            lines.extend(outcome.line);
            total += outcome.contribution;
            if compare.is_none() {
                compare = outcome.compare;
            }
            trivial = trivial || outcome.trivial;
        }

        if hidden {
            lines.remove(0);
        }
        if trivial {
            if let Some(compare) = compare.as_mut() {
                compare.trivial = true;
            }
        }

        Ok(Some(RollResult {
            dice: main_body,
            result: lines.join(";"),
            total: round_total(total),
            compare,
            modifier: main.modifier,
            comment: (!main_comments.is_empty()).then(|| main_comments.join(" ")),
            pity_logs: main.pity_logs,
            trivial,
        }))
    }

    fn roll_segment(
        &mut self,
        segment: &Segment,
        curly: bool,
        main_bounds: Option<(f64, f64)>,
    ) -> Result<Outcome, DiceError> {
        let Some((lhs, sign, rhs)) = split_compare(&segment.to_roll) else {
            return self.value_segment(segment);
        };

        let compare = self.resolve_compare(sign, rhs)?;
        let trivial = split_compare(&segment.element)
            .zip(main_bounds)
            .and_then(|((lhs, ..), bounds)| substituted_bounds(lhs, bounds))
            .is_some_and(|(min, max)| is_trivial(min, max, &compare));

        let Some((value, transcript)) = self.evaluate_side(lhs)? else {
            debug!(lhs, "comparison side neither computes nor rolls");
            return Ok(Outcome::default());
        };
        let success = compare.matches(value);

        let line = if curly {
            format!(
                "{SHARED_GLYPH} {}{}: {}",
                segment.comment,
                segment.dice_all,
                u32::from(success)
            )
        } else {
            let glyph = if success { SUCCESS_GLYPH } else { FAILURE_GLYPH };
            let shown = if success { sign } else { sign.inverse() };
            let detail = match transcript {
                Some(transcript) => transcript,
                None => {
                    let formule = split_compare(&segment.formule)
                        .map_or(segment.formule.as_str(), |(lhs, ..)| lhs);
                    format!("{formule} = {}", round_total(value))
                }
            };
            format!(
                "{glyph} {}{}: {detail}{}",
                segment.comment,
                segment.dice_all,
                shown_value(shown, &compare)
            )
        };

        Ok(Outcome {
            line: Some(line),
            // successes of a `{...}` chain are counted in the total
            contribution: if curly { f64::from(u32::from(success)) } else { 0.0 },
            compare: Some(ComparedValue { trivial, ..compare }),
            trivial,
        })
    }

    fn value_segment(&mut self, segment: &Segment) -> Result<Outcome, DiceError> {
        if let Ok(value) = formula::evaluate_number(&segment.to_roll) {
            return Ok(Outcome {
                line: Some(format!(
                    "{FORMULA_GLYPH} {}{}: {} = {}",
                    segment.comment,
                    segment.dice_all,
                    segment.formule,
                    round_total(value)
                )),
                contribution: value,
                ..Outcome::default()
            });
        }

        let pity = self.options.pity;
        let Some(rolled) = self.nested(&segment.to_roll, pity)? else {
            debug!(segment = segment.element, "shared segment neither computes nor rolls");
            return Ok(Outcome::default());
        };

        Ok(Outcome {
            line: Some(format!(
                "{FORMULA_GLYPH} {}{}: {}",
                segment.comment,
                segment.dice_all,
                after_label(&rolled.result)
            )),
            contribution: rolled.total,
            trivial: rolled.trivial,
            compare: rolled.compare,
        })
    }

    /// The value of one side of a comparison: a formula, or a roll along with
    /// its transcript.
    fn evaluate_side(&mut self, side: &str) -> Result<Option<(f64, Option<String>)>, DiceError> {
        if let Ok(value) = formula::evaluate_number(side) {
            return Ok(Some((value, None)));
        }

        let pity = self.options.pity;
        Ok(self
            .nested(side, pity)?
            .map(|rolled| (rolled.total, Some(after_label(&rolled.result).to_owned()))))
    }
}

fn shown_value(sign: CompareSign, compare: &ComparedValue) -> String {
    format!("{sign}{}", compare.value)
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use crate::RollOptions;

    use super::*;

    fn shared(dice: &str) -> RollResult {
        let mut rng = StdRng::seed_from_u64(1);
        Roller::new(&mut rng, RollOptions::default())
            .roll(dice)
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test_shared_formula_segment() {
        let result = shared("1d6;&+2");

        assert_eq!(result.dice, "1d6");
        assert_eq!(result.result, "※ 1d6: [5] = 5;◈ [1d6]+2: [5]+2 = 7");
        assert_eq!(result.total, 12.0);
        assert_eq!(result.compare, None);
    }

    #[test]
    fn test_shared_comparison_segments() {
        let result = shared("1d6;&>3;&>=7");

        assert_eq!(
            result.result,
            "※ 1d6: [5] = 5;✓ [1d6]>3: [5] = 5>3;✕ [1d6]>=7: [5] = 5<7"
        );
        // comparison lines leave the total alone
        assert_eq!(result.total, 5.0);
        let compare = result.compare.unwrap();
        assert_eq!((compare.sign, compare.value), (CompareSign::Greater, 3.0));
        assert!(result.trivial);
        assert!(compare.trivial);
    }

    #[test]
    fn test_shared_curly_counts_successes() {
        let result = shared("{1d6;&>3;&>5}");

        assert_eq!(result.result, "※ 1d6: [5] = 5;※ [1d6]>3: 1;※ [1d6]>5: 0");
        assert_eq!(result.total, 6.0);
    }

    #[test]
    fn test_shared_hidden_first_roll() {
        let result = shared("(1d6);&+2");

        assert_eq!(result.result, "◈ [1d6]+2: [5]+2 = 7");
        assert_eq!(result.total, 12.0);
    }

    #[test]
    fn test_shared_comments() {
        let result = shared("1d6 [fire];&+2 [bonus]");

        assert_eq!(
            result.result,
            "※ __fire__ — 1d6: [5] = 5;◈ __bonus__ — [1d6]+2: [5]+2 = 7"
        );
        assert_eq!(result.comment.as_deref(), Some("fire"));
    }

    #[test]
    fn test_shared_segment_rolls_dice() {
        // second roll of the stream is a 6
        let result = shared("1d6;&+1d6");

        assert_eq!(result.result, "※ 1d6: [5] = 5;◈ [1d6]+1d6: 5+[6] = 11");
        assert_eq!(result.total, 16.0);
    }

    #[test]
    fn test_shared_skips_broken_segment() {
        let result = shared("1d6;2d0;&*2");

        assert_eq!(result.result, "※ 1d6: [5] = 5;◈ [1d6]*2: [5]*2 = 10");
        assert_eq!(result.total, 15.0);
    }

    #[test]
    fn test_shared_exploding_first_roll() {
        // 5, 6 explodes into 5
        let result = shared("2d6!>>4;&*0");

        assert_eq!(result.total, 3.0);
        assert!(result.dice.contains("!>>4"));
    }
}
