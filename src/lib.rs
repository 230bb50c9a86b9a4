//! Parse and roll tabletop dice notation.
//!
//! On top of the dice themselves (`4d6k3`, `2d10!`, `{2d6, 1d4}>=4`) a
//! notation can repeat a roll (`5#1d20>10`), chain rolls on a shared total
//! (`1d20;&+2;&>15`), count exploding successes (`3d6!>>4`), compare its total
//! and carry comments.
//!
//! ```rust
//! # use rpg_dice_parser::{roll_with, CompareSign, RollOptions};
//! # use rand::rngs::StdRng;
//! # use rand::SeedableRng;
//! #
//! # fn main() -> Result<(), rpg_dice_parser::DiceError> {
//! let mut rng = StdRng::seed_from_u64(1);
//!
//! let rolled = roll_with("2d6+3>=10 # attack", RollOptions::default(), &mut rng)?
//!     .expect("the notation has dice");
//! println!("{}", rolled.result); // 2d6+3: [5, 6]+3 = 14
//! assert_eq!(rolled.total, 14.0);
//! assert_eq!(rolled.comment.as_deref(), Some("attack"));
//! assert_eq!(rolled.compare.map(|c| c.sign), Some(CompareSign::GreaterEqual));
//!
//! // Anything without dice is not a roll
//! assert!(roll_with("hello world", RollOptions::default(), &mut rng)?.is_none());
//! # Ok(())
//! # }
//! ```
//!
//! The die roller is also usable on its own:
//!
//! ```rust
//! # use rpg_dice_parser::{Dice, DiceKind, DiceModifier, Expression};
//! # use rand::rngs::StdRng;
//! # use rand::SeedableRng;
//! let mut rng = StdRng::seed_from_u64(1);
//!
//! // Roll 3 d20, make the minimum value 5, keep the lowest 2 rolls.
//! let rolled = Expression::parse("3d20min5kl2").unwrap().roll(&mut rng).unwrap();
//! println!("{rolled} = {}", rolled.value());
//!
//! // Create Dice directly without parsing
//! let dice = Dice::new(5, DiceKind::Standard(8), &[DiceModifier::Min(5)]);
//! let rolled = dice.roll_all_with(&mut rng);
//! println!("{rolled} = {}", rolled.value());
//! ```

mod engine;
mod error;
mod evaluate;
pub mod formula;
mod notation;
mod parse;
mod stats;

use std::{fmt, str::FromStr};

use rand::Rng;
use tracing::debug;

pub use engine::{Engine, ParseEngineError};
pub use error::{DiceError, FormulaError, NotationError};
pub use evaluate::{
    roll_notation, GroupOutput, Roll, RollOutput, RollOutputKind, RolledExpression, RolledNotation,
};
pub use formula::FormulaValue;
pub use notation::{ComparedValue, CompareSign, Modifier, RollResult};
pub use parse::{
    ComparePoint, Dice, DiceKind, DiceModifier, ExplodingKind, Expression, KeepKind, MathFn1,
    MathFn2, Operator, SortKind, MAX_DICE_QUANTITY,
};
pub use stats::substitute_statistics;

use notation::Roller;

/// Times the pity system rerolls a failed comparison before giving up.
pub const PITY_MAX_REROLLS: u32 = 100;
/// How deep rolls may nest inside each other, through comparison values and
/// shared segments.
pub const MAX_RECURSION_DEPTH: usize = 16;
/// Explosions of a single die before it stops exploding.
pub const MAX_EXPLODE_ITERATIONS: usize = 1000;
/// Default cap on the repetitions of a bulk roll.
pub const DEFAULT_MAX_BULK_COUNT: u32 = 1000;

/// Order of the dice in the transcripts, a sort modifier in the notation wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SortOrder {
    Ascending,
    Descending,
    #[default]
    None,
}

impl SortOrder {
    pub fn sort_kind(self) -> Option<SortKind> {
        match self {
            SortOrder::Ascending => Some(SortKind::Ascending),
            SortOrder::Descending => Some(SortKind::Descending),
            SortOrder::None => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown sort order `{0}`, expected `asc`, `desc` or `none`")]
pub struct ParseSortOrderError(String);

impl FromStr for SortOrder {
    type Err = ParseSortOrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortOrder::Ascending),
            "desc" | "descending" => Ok(SortOrder::Descending),
            "none" => Ok(SortOrder::None),
            _ => Err(ParseSortOrderError(s.to_owned())),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Ascending => write!(f, "asc"),
            SortOrder::Descending => write!(f, "desc"),
            SortOrder::None => write!(f, "none"),
        }
    }
}

/// Settings of a call to [roll].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RollOptions {
    /// Reroll failed comparisons, see [PITY_MAX_REROLLS].
    pub pity: bool,
    pub sort: SortOrder,
    /// `None` lets bulk rolls repeat any number of times.
    pub max_bulk_count: Option<u32>,
}

impl Default for RollOptions {
    fn default() -> Self {
        Self {
            pity: false,
            sort: SortOrder::None,
            max_bulk_count: Some(DEFAULT_MAX_BULK_COUNT),
        }
    }
}

impl RollOptions {
    pub fn pity(mut self, pity: bool) -> Self {
        self.pity = pity;
        self
    }

    pub fn sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    pub fn max_bulk_count(mut self, max_bulk_count: Option<u32>) -> Self {
        self.max_bulk_count = max_bulk_count;
        self
    }
}

/// Parses the notation returning the parsed abstract syntax tree of the die
/// roller without rolling the dice.
pub fn parse(notation: &str) -> Result<Expression, NotationError> {
    Expression::parse(notation)
}

/// Rolls a notation with the thread local rng.
///
/// Returns `Ok(None)` when the notation contains no dice.
pub fn roll(notation: &str, options: RollOptions) -> Result<Option<RollResult>, DiceError> {
    roll_with(notation, options, &mut rand::thread_rng())
}

/// Same as [roll] but allows you to choose the rng you prefer to use.
pub fn roll_with<R: Rng + ?Sized>(
    notation: &str,
    options: RollOptions,
    rng: &mut R,
) -> Result<Option<RollResult>, DiceError> {
    debug!(notation, ?options, "roll");
    Roller::new(rng, options).roll(notation)
}

/// Same as [roll] with the rng of an [Engine].
pub fn roll_with_engine(
    notation: &str,
    options: RollOptions,
    engine: Engine,
) -> Result<Option<RollResult>, DiceError> {
    let mut rng = engine.rng();
    roll_with(notation, options, rng.as_mut())
}
