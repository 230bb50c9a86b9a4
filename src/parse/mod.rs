mod dice;
mod expression;

pub use dice::*;
pub use expression::*;

use winnow::Parser;

use crate::error::NotationError;

/// Upper bound on the quantity of a single dice term, `1000d6` rolls 999 dice.
pub const MAX_DICE_QUANTITY: u32 = 999;

#[derive(Debug, Clone, PartialEq)]
pub struct Dice {
    pub(crate) quantity: u32,
    pub(crate) kind: DiceKind,
    pub(crate) modifiers: Vec<DiceModifier>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiceKind {
    /// `d6`, `d20`, `d%` is a `d100`.
    Standard(u32),
    /// `dF.1`, one face `+1`, one face `-1`, four blanks.
    Fudge1,
    /// `dF` and `dF.2`, two faces of each.
    Fudge2,
}

/// The comparison of a modifier against a single die.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ComparePoint {
    /// `=`, `==`
    Equal(f64),
    /// `<>`, `!=`
    NotEqual(f64),
    LessThan(f64),
    GreaterThan(f64),
    LessThanOrEqual(f64),
    GreaterThanOrEqual(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplodingKind {
    /// `!`, every explosion is a new die.
    Standard,
    /// `!p`, the new die counts one less.
    Penetrating,
    /// `!!`, explosions add up into the die that exploded.
    Compounding,
    /// `!!p`
    PenetratingCompounding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKind {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepKind {
    Highest,
    Lowest,
}

/// What can follow a die or a group.
///
/// Groups only take keep, drop, targets and sort. Whatever the order they
/// were written in, modifiers run in the order of this enum and a repeated
/// modifier replaces the earlier one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DiceModifier {
    /// `min3`, rolls below 3 count as 3.
    Min(i32),
    /// `max5`, rolls above 5 count as 5.
    Max(i32),
    /// `!`, `!p`, `!!`, `!!p`, optionally followed by a compare point, which
    /// replaces the highest face as the trigger.
    Exploding(ExplodingKind, Option<ComparePoint>),
    /// `r` and `ro`, the flag is set for `ro` which rerolls a single time.
    /// Without a compare point the lowest face is rerolled.
    ReRoll(bool, Option<ComparePoint>),
    /// `u` and `uo`, rerolls faces already seen on this dice.
    Unique(bool, Option<ComparePoint>),
    /// `>4`, the dice count the rolls that pass instead of adding them.
    TargetSuccess(ComparePoint),
    /// `>4f<2`, passes count +1 and failures -1.
    TargetFailure(ComparePoint, ComparePoint),
    /// `cs`, marks rolls with `**` and changes nothing else.
    CriticalSuccess(Option<ComparePoint>),
    /// `cf`, marks rolls with `__`.
    CriticalFailure(Option<ComparePoint>),
    /// `k2`, `kh2`, `kl2`: keeps that many rolls, the highest by default.
    Keep(KeepKind, u32),
    /// `d1`, `dh1`, `dl1`: drops that many rolls, the lowest by default.
    Drop(KeepKind, u32),
    /// `s`, `sa`, `sd`
    Sort(SortKind),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Value(f64),
    Neg(Box<Expression>),
    DiceStandard(Option<Box<Expression>>, Box<Expression>, Vec<DiceModifier>),
    DiceFudge1(Option<Box<Expression>>, Vec<DiceModifier>),
    DiceFudge2(Option<Box<Expression>>, Vec<DiceModifier>),
    DicePercentile(Option<Box<Expression>>, Vec<DiceModifier>),
    Parens(Box<Expression>),
    Group(Vec<Expression>, Vec<DiceModifier>),
    Infix(Operator, Box<Expression>, Box<Expression>),
    Fn1(MathFn1, Box<Expression>),
    Fn2(MathFn2, Box<Expression>, Box<Expression>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathFn1 {
    Abs,
    Floor,
    Ceil,
    Round,
    Sign,
    Sqrt,
    Log,
    Exp,
    Sin,
    Cos,
    Tan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathFn2 {
    Min,
    Max,
    Pow,
}

impl Expression {
    /// Parses the whole notation, trailing input is an error.
    pub fn parse(notation: &str) -> Result<Expression, NotationError> {
        parse_expr
            .parse(notation)
            .map_err(|e| NotationError(e.to_string()))
    }

    /// Whether rolling this expression touches a die.
    pub fn has_dice(&self) -> bool {
        match self {
            Expression::Value(_) => false,
            Expression::DiceStandard(..)
            | Expression::DiceFudge1(..)
            | Expression::DiceFudge2(..)
            | Expression::DicePercentile(..) => true,
            Expression::Neg(expr) | Expression::Parens(expr) | Expression::Fn1(_, expr) => {
                expr.has_dice()
            }
            Expression::Group(exprs, _) => exprs.iter().any(Expression::has_dice),
            Expression::Infix(_, lhs, rhs) | Expression::Fn2(_, lhs, rhs) => {
                lhs.has_dice() || rhs.has_dice()
            }
        }
    }

    /// Value of a plain arithmetic expression, `None` if it needs a roll.
    pub fn constant(&self) -> Option<f64> {
        let value = match self {
            Expression::Value(float) => *float,
            Expression::Neg(expr) => -expr.constant()?,
            Expression::Parens(expr) => expr.constant()?,
            Expression::Infix(op, lhs, rhs) => op.apply(lhs.constant()?, rhs.constant()?),
            Expression::Fn1(f, arg) => f.apply(arg.constant()?),
            Expression::Fn2(f, arg1, arg2) => f.apply(arg1.constant()?, arg2.constant()?),
            Expression::DiceStandard(..)
            | Expression::DiceFudge1(..)
            | Expression::DiceFudge2(..)
            | Expression::DicePercentile(..)
            | Expression::Group(..) => return None,
        };
        Some(value)
    }
}

impl Operator {
    pub fn apply(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            Operator::Add => lhs + rhs,
            Operator::Sub => lhs - rhs,
            Operator::Mul => lhs * rhs,
            Operator::Div => lhs / rhs,
            Operator::Rem => lhs % rhs,
            Operator::Pow => lhs.powf(rhs),
        }
    }
}

impl MathFn1 {
    pub fn apply(self, arg: f64) -> f64 {
        match self {
            MathFn1::Abs => arg.abs(),
            MathFn1::Floor => arg.floor(),
            MathFn1::Ceil => arg.ceil(),
            MathFn1::Round => arg.round(),
            MathFn1::Sign => {
                if arg == 0.0 {
                    0.0
                } else {
                    arg.signum()
                }
            }
            MathFn1::Sqrt => arg.sqrt(),
            MathFn1::Log => arg.ln(),
            MathFn1::Exp => arg.exp(),
            MathFn1::Sin => arg.sin(),
            MathFn1::Cos => arg.cos(),
            MathFn1::Tan => arg.tan(),
        }
    }
}

impl MathFn2 {
    pub fn apply(self, arg1: f64, arg2: f64) -> f64 {
        match self {
            MathFn2::Min => arg1.min(arg2),
            MathFn2::Max => arg1.max(arg2),
            MathFn2::Pow => arg1.powf(arg2),
        }
    }
}
