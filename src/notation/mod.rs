//! The roll pipeline on top of the die roller: normalization, bulk `N#` and
//! shared `;` rolls, comparisons with their trivial detection, exploding
//! successes and pity rerolls.

mod bulk;
pub(crate) mod classify;
pub(crate) mod compare;
pub(crate) mod exploding;
pub(crate) mod format;
pub(crate) mod lexer;
pub(crate) mod modifier;
pub(crate) mod normalize;
mod pity;
mod shared;
pub(crate) mod trivial;

use std::fmt;

use rand::Rng;
use tracing::debug;

use crate::{
    error::DiceError,
    evaluate::{roll_notation, RolledNotation},
    parse::Operator,
    RollOptions, MAX_RECURSION_DEPTH,
};

use self::{
    classify::{classify, Form},
    exploding::{extract_exploding, ExplodingSuccess},
    format::strip_unwanted_text,
    lexer::Tokens,
    modifier::extract_modifier,
    normalize::normalize,
    trivial::is_trivial,
};

/// The outcome of [roll](crate::roll).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RollResult {
    /// The notation that was rolled, without its comment and comparison.
    pub dice: String,
    /// Human readable transcript, one segment per roll joined by `;`.
    pub result: String,
    /// Sum of the dice and modifiers, or the number of successes when the
    /// roll counts them.
    pub total: f64,
    pub compare: Option<ComparedValue>,
    pub modifier: Option<Modifier>,
    pub comment: Option<String>,
    /// Rerolls made by the pity system, `None` when it never rerolled.
    pub pity_logs: Option<u32>,
    /// The comparison can't fail or can't succeed whatever the dice roll.
    pub trivial: bool,
}

/// A comparison attached to a roll, `2d6>=7`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ComparedValue {
    pub sign: CompareSign,
    pub value: f64,
    /// The formula or dice the value was computed from.
    pub original_dice: Option<String>,
    /// Transcript of the roll that produced the value.
    pub roll_value: Option<String>,
    pub trivial: bool,
}

impl ComparedValue {
    pub fn new(sign: CompareSign, value: f64) -> Self {
        Self {
            sign,
            value,
            original_dice: None,
            roll_value: None,
            trivial: false,
        }
    }

    pub fn matches(&self, total: f64) -> bool {
        self.sign.matches(total, self.value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CompareSign {
    /// `<`
    Less,
    /// `>`
    Greater,
    /// `<=` or `=<`
    LessEqual,
    /// `>=` or `=>`
    GreaterEqual,
    /// `=`
    Equal,
    /// `==`
    DoubleEqual,
    /// `!=` or `<>`
    NotEqual,
}

impl CompareSign {
    pub fn matches(self, lhs: f64, rhs: f64) -> bool {
        match self {
            CompareSign::Less => lhs < rhs,
            CompareSign::Greater => lhs > rhs,
            CompareSign::LessEqual => lhs <= rhs,
            CompareSign::GreaterEqual => lhs >= rhs,
            CompareSign::Equal | CompareSign::DoubleEqual => lhs == rhs,
            CompareSign::NotEqual => lhs != rhs,
        }
    }

    /// The sign describing what happened when the comparison failed.
    pub fn inverse(self) -> Self {
        match self {
            CompareSign::Less => CompareSign::GreaterEqual,
            CompareSign::Greater => CompareSign::LessEqual,
            CompareSign::LessEqual => CompareSign::Greater,
            CompareSign::GreaterEqual => CompareSign::Less,
            CompareSign::Equal | CompareSign::DoubleEqual => CompareSign::NotEqual,
            CompareSign::NotEqual => CompareSign::DoubleEqual,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CompareSign::Less => "<",
            CompareSign::Greater => ">",
            CompareSign::LessEqual => "<=",
            CompareSign::GreaterEqual => ">=",
            CompareSign::Equal => "=",
            CompareSign::DoubleEqual => "==",
            CompareSign::NotEqual => "!=",
        }
    }
}

impl fmt::Display for CompareSign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Net arithmetic modifier written after the dice, `2d6+3-1` has `-` 4.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Modifier {
    pub sign: Option<Operator>,
    pub value: f64,
}

/// Rolls notations, nested rolls included, with one rng and one set of options.
pub(crate) struct Roller<'r, R: ?Sized> {
    rng: &'r mut R,
    options: RollOptions,
    depth: usize,
}

impl<'r, R: Rng + ?Sized> Roller<'r, R> {
    pub(crate) fn new(rng: &'r mut R, options: RollOptions) -> Self {
        Self {
            rng,
            options,
            depth: 0,
        }
    }

    pub(crate) fn roll(&mut self, notation: &str) -> Result<Option<RollResult>, DiceError> {
        let dice = normalize(notation)?;
        if !Tokens::new(&dice).has_dice() {
            debug!(notation, "no dice in notation");
            return Ok(None);
        }

        let exploding = extract_exploding(&dice);
        let form = classify(&dice)?;
        debug!(dice, ?form, exploding = exploding.is_some(), "classified notation");

        match form {
            Form::Shared { curly } => self.roll_shared(&dice, curly),
            Form::CurlyBulk => self.roll_bulk(&dice, true, exploding.as_ref()).map(Some),
            Form::Bulk => self.roll_bulk(&dice, false, exploding.as_ref()).map(Some),
            Form::SimpleCurly | Form::Pool | Form::Plain => {
                self.roll_plain(&dice, form, exploding.as_ref()).map(Some)
            }
        }
    }

    /// Rolls a notation found inside another one: a comparison value, a
    /// segment of a shared roll or a pity reroll.
    pub(crate) fn nested(
        &mut self,
        notation: &str,
        pity: bool,
    ) -> Result<Option<RollResult>, DiceError> {
        if self.depth >= MAX_RECURSION_DEPTH {
            return Err(DiceError::RecursionLimit {
                notation: notation.to_owned(),
                depth: MAX_RECURSION_DEPTH,
            });
        }

        let outer_pity = self.options.pity;
        self.options.pity = pity;
        self.depth += 1;
        let result = self.roll(notation);
        self.depth -= 1;
        self.options.pity = outer_pity;

        result
    }

    pub(crate) fn roll_dice(&mut self, notation: &str) -> Result<RolledNotation, DiceError> {
        roll_notation(notation, self.options.sort.sort_kind(), &mut *self.rng)
    }

    fn roll_plain(
        &mut self,
        dice: &str,
        form: Form,
        exploding: Option<&ExplodingSuccess>,
    ) -> Result<RollResult, DiceError> {
        let (body, comments) = Tokens::new(dice).without_comments();
        let comment = (!comments.is_empty()).then(|| comments.join(" "));

        let (display, inner) = match form {
            Form::SimpleCurly => {
                let inner = Tokens::new(&body)
                    .wrapped_in_braces()
                    .map_or_else(|| body.clone(), str::to_owned);
                (Some(body.clone()), inner)
            }
            _ => (None, body),
        };

        let (rest, mut compare) = match form {
            // the die roller counts the dice matching the comparison itself
            Form::Pool => (inner, None),
            _ => self.extract_compare(&inner)?,
        };
        let modifier = extract_modifier(&rest);
        let to_roll = exploding.map_or_else(|| rest.clone(), |e| e.for_roller(&rest));

        let rolled = self.roll_dice(&to_roll)?;
        let total = match exploding {
            Some(exploding) => exploding.count(&rolled.faces) as f64,
            None => rolled.total,
        };
        // a success count runs from zero with no upper end, explosions add dice
        let bounds = match exploding {
            Some(_) => (0.0, f64::INFINITY),
            None => (rolled.min_total, rolled.max_total),
        };
        if let Some(compare) = compare.as_mut() {
            compare.trivial = is_trivial(bounds.0, bounds.1, compare);
        }
        let trivial = compare.as_ref().is_some_and(|c| c.trivial);
        let dice = display.unwrap_or_else(|| rest.clone());

        if self.options.pity {
            if let Some(compare) = &compare {
                let (rerolls, rerolled) = self.apply_pity(&rest, compare, total, bounds)?;
                if let Some(rerolled) = rerolled {
                    return Ok(RollResult {
                        dice,
                        comment,
                        compare: Some(compare.clone()),
                        modifier,
                        pity_logs: Some(rerolls),
                        trivial: rerolled.trivial || trivial,
                        ..rerolled
                    });
                }
            }
        }

        let result = match exploding {
            Some(_) => format!("{rest}: {} = {total}", rolled.rolled),
            None => rolled.output,
        };

        Ok(RollResult {
            dice,
            result: strip_unwanted_text(&result),
            total,
            compare,
            modifier,
            comment,
            pity_logs: None,
            trivial,
        })
    }
}
