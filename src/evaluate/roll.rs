use std::borrow::Borrow;

use crate::{evaluate::dice_roll::to_notations, parse::DiceModifier};

#[derive(Debug, Clone, Copy)]
pub struct Roll {
    pub(crate) value: i32,
    pub(crate) modifier_flags: u32,
}

impl Roll {
    pub fn new(value: i32) -> Self {
        Self {
            value,
            modifier_flags: 0,
        }
    }

    pub fn value(&self) -> i32 {
        self.value
    }

    pub fn set_modifier_flag(&mut self, modifier_flag: u8) {
        self.modifier_flags |= 1 << modifier_flag;
    }

    pub fn was_modifier_applied(&self, modifier_flag: u8) -> bool {
        (self.modifier_flags & (1 << modifier_flag)) != 0
    }

    pub fn is_dropped(&self) -> bool {
        self.was_modifier_applied(ModifierFlags::Drop as u8)
    }

    /// Contribution of the roll to a target count, +1 success, -1 failure.
    pub(crate) fn target_score(&self) -> f64 {
        if self.was_modifier_applied(ModifierFlags::TargetSuccess as u8) {
            1.0
        } else if self.was_modifier_applied(ModifierFlags::TargetFailure as u8) {
            -1.0
        } else {
            0.0
        }
    }

    /// Suffixes of every modifier applied to the roll.
    pub(crate) fn notation(&self) -> String {
        let mut str = String::new();
        for (i, notation) in MODIFIER_NOTATION.iter().enumerate() {
            if self.was_modifier_applied(i as u8) {
                str.push_str(notation);

                if ModifierFlags::Drop as u8 == i as u8 {
                    // We don't want to apply critical success/failure on dropped rolls
                    break;
                }
            }
        }
        str
    }
}

#[derive(Debug, Clone)]
pub struct RollOutput {
    pub(crate) rolls: Vec<Roll>,
    pub(crate) kind: RollOutputKind,
}

impl RollOutput {
    pub fn new(rolls: Vec<Roll>, kind: RollOutputKind) -> Self {
        Self { rolls, kind }
    }

    pub fn rolls(&self) -> &[Roll] {
        &self.rolls
    }

    pub fn value(&self) -> f64 {
        kept_value(&self.rolls, self.kind)
    }
}

/// Value of a set of rolls ignoring the dropped ones.
#[rustfmt::skip]
pub(crate) fn kept_value<R: Borrow<Roll>>(rolls: &[R], kind: RollOutputKind) -> f64 {
    let iter = rolls.iter().map(Borrow::<Roll>::borrow).filter(|r| !r.is_dropped());

    match kind {
        RollOutputKind::Sum => iter.map(|r| r.value as f64).sum(),
        RollOutputKind::TargetSuccess => iter
            .map(|r| {
                let success = r.was_modifier_applied(ModifierFlags::TargetSuccess as u8);
                if success { 1.0 } else { 0.0 }
            })
            .sum(),
        RollOutputKind::TargetFailure => iter.map(Roll::target_score).sum(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollOutputKind {
    Sum,
    TargetSuccess,
    TargetFailure,
}

impl RollOutputKind {
    /// How the kept rolls add up, target modifiers turn the sum into a count.
    pub(crate) fn from_modifiers(modifiers: &[DiceModifier]) -> Self {
        modifiers
            .iter()
            .fold(RollOutputKind::Sum, |kind, modifier| match modifier {
                DiceModifier::TargetSuccess(_) => RollOutputKind::TargetSuccess,
                DiceModifier::TargetFailure(_, _) => RollOutputKind::TargetFailure,
                _ => kind,
            })
    }
}

#[derive(Debug, Clone, Copy)]
#[repr(usize)]
pub enum ModifierFlags {
    Min,
    Max,
    ExplodingStandard,
    ExplodingPenetrating,
    ExplodingCompounding,
    ExplodingPenetratingCompounding,
    ReRoll,
    ReRollOnce,
    Unique,
    UniqueOnce,
    Drop,
    TargetSuccess,
    TargetFailure,
    CriticalSuccess,
    CriticalFailure,
}

pub const MODIFIER_NOTATION: [&str; 15] = [
    "^", "v", "!", "!p", "!!", "!!p", "r", "ro", "u", "uo", "d", "*", "_", "**", "__",
];

impl PartialEq for Roll {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}
impl Eq for Roll {}
impl Ord for Roll {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.value.cmp(&other.value)
    }
}
impl PartialOrd for Roll {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl std::fmt::Display for Roll {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.value, self.notation())
    }
}

impl std::fmt::Display for RollOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", to_notations(&self.rolls))
    }
}
