use std::borrow::{Borrow, BorrowMut};

use rand::Rng;

use super::roll::{ModifierFlags, Roll, RollOutput, RollOutputKind};
use crate::{
    parse::{ComparePoint, Dice, DiceKind, DiceModifier, ExplodingKind, KeepKind, SortKind},
    MAX_EXPLODE_ITERATIONS,
};

/// Cap on rerolls of a single die, `r` and `u` without a reachable stop would never end.
const MAX_REROLL_ITERATIONS: usize = 1001;

struct RollsInfo {
    all: Vec<Roll>,
    current: Roll,
}

impl Dice {
    pub fn quantity(&self) -> u32 {
        self.quantity
    }
    pub fn modifiers(&self) -> &[DiceModifier] {
        &self.modifiers
    }
    pub fn sides(&self) -> u32 {
        match self.kind {
            DiceKind::Standard(sides) => sides,
            DiceKind::Fudge1 | DiceKind::Fudge2 => 6,
        }
    }
    pub fn kind(&self) -> DiceKind {
        self.kind
    }
    pub fn max_value(&self) -> i32 {
        match self.kind {
            DiceKind::Standard(sides) => sides as i32,
            DiceKind::Fudge1 => 1,
            DiceKind::Fudge2 => 1,
        }
    }
    fn max_value_f64(&self) -> f64 {
        self.max_value() as f64
    }
    pub fn min_value(&self) -> i32 {
        match self.kind {
            DiceKind::Standard(_) => 1,
            DiceKind::Fudge1 => -1,
            DiceKind::Fudge2 => -1,
        }
    }
    fn min_value_f64(&self) -> f64 {
        self.min_value() as f64
    }

    /// Adds a sort modifier unless the dice already sorts its rolls.
    pub(crate) fn with_default_sort(mut self, sort: Option<SortKind>) -> Self {
        let Some(sort) = sort else {
            return self;
        };
        if !self
            .modifiers
            .iter()
            .any(|m| matches!(m, DiceModifier::Sort(_)))
        {
            self.modifiers.push(DiceModifier::Sort(sort));
        }
        self
    }

    /// Lowest and highest value a single die can end up with after its roll modifiers.
    pub(crate) fn die_bounds(&self) -> (f64, f64) {
        let (mut low, mut high) = (self.min_value_f64(), self.max_value_f64());

        for modifier in &self.modifiers {
            match *modifier {
                DiceModifier::Min(min) => {
                    low = low.max(min as f64);
                    high = high.max(min as f64);
                }
                DiceModifier::Max(max) => {
                    low = low.min(max as f64);
                    high = high.min(max as f64);
                }
                DiceModifier::Exploding(kind, compare_point) => {
                    let explodes = compare_point.map_or(true, |cmp| cmp.can_dice_pass(self));
                    if explodes {
                        high = f64::INFINITY;
                        if matches!(
                            kind,
                            ExplodingKind::Penetrating | ExplodingKind::PenetratingCompounding
                        ) {
                            low = low.min(self.min_value_f64() - 1.0);
                        }
                    }
                }
                _ => {}
            }
        }

        (low, high)
    }

    /// Number of rolls counted out of `rolled` once keep and drop are applied.
    pub(crate) fn kept_count(&self, rolled: u32) -> u32 {
        self.modifiers
            .iter()
            .fold(rolled, |kept, modifier| match *modifier {
                DiceModifier::Keep(_, amount) => kept.min(amount),
                DiceModifier::Drop(_, amount) => kept.saturating_sub(amount),
                _ => kept,
            })
    }

    fn roll_amount<R: Rng + ?Sized>(&self, amount: usize, rng: &mut R) -> RollOutput {
        let mut rolls_info = RollsInfo {
            all: Vec::with_capacity(amount),
            current: Roll::new(0),
        };

        let (roll_modifiers, post_modifiers): (Vec<DiceModifier>, Vec<DiceModifier>) = self
            .modifiers
            .iter()
            .partition(|modifier| modifier.is_roll_modifier());

        for _ in 0..amount {
            rolls_info.current = Roll::new(self.roll_value(rng));

            for modifier in &roll_modifiers {
                apply_roll_modifier(self, *modifier, &mut rolls_info, rng);
            }

            rolls_info.all.push(rolls_info.current);
        }

        for modifier in &post_modifiers {
            apply_output_modifier(Some(self), *modifier, &mut rolls_info.all);
        }

        RollOutput::new(rolls_info.all, RollOutputKind::from_modifiers(&self.modifiers))
    }

    /// Roll the full quantity of the dice with the rng specified.
    pub fn roll_all_with<R: Rng + ?Sized>(&self, rng: &mut R) -> RollOutput {
        self.roll_amount(self.quantity as usize, rng)
    }

    /// Roll the dice only once with the rng specified.
    pub fn roll_once_with<R: Rng + ?Sized>(&self, rng: &mut R) -> RollOutput {
        self.roll_amount(1, rng)
    }

    fn roll_value<R: Rng + ?Sized>(&self, rng: &mut R) -> i32 {
        let random_value: f32 = rng.gen();

        match self.kind {
            DiceKind::Standard(sides) => ((random_value * sides as f32).ceil() as i32).max(1),
            DiceKind::Fudge1 => {
                [-1, 0, 0, 0, 0, 1][((random_value * 6_f32).floor() as usize).min(5)]
            }
            DiceKind::Fudge2 => (random_value * 3_f32).floor() as i32 - 1,
        }
    }
}

fn apply_roll_modifier<R: Rng + ?Sized>(
    dice: &Dice,
    modifier: DiceModifier,
    rolls_info: &mut RollsInfo,
    rng: &mut R,
) {
    match modifier {
        DiceModifier::Min(min) => apply_min(min, &mut rolls_info.current),
        DiceModifier::Max(max) => apply_max(max, &mut rolls_info.current),
        DiceModifier::Exploding(exploding_kind, compare_point) => {
            apply_exploding(dice, rolls_info, rng, exploding_kind, compare_point)
        }
        DiceModifier::ReRoll(once, compare_point) => {
            apply_reroll(dice, rolls_info, rng, once, compare_point)
        }
        DiceModifier::Unique(once, compare_point) => {
            apply_unique(dice, rolls_info, rng, once, compare_point)
        }
        _ => {}
    }
}

/// Applies a modifier that looks at every roll at once.
/// Critical modifiers need the dice to know its lowest and highest values,
/// without one they only apply when they carry a compare point.
pub(crate) fn apply_output_modifier<R: BorrowMut<Roll>>(
    dice: Option<&Dice>,
    modifier: DiceModifier,
    rolls: &mut [R],
) {
    match modifier {
        DiceModifier::TargetSuccess(compare_point) => apply_target_success(rolls, compare_point),
        DiceModifier::TargetFailure(success_cmp, failure_cmp) => {
            apply_target_failure(rolls, success_cmp, failure_cmp)
        }
        DiceModifier::CriticalSuccess(compare_point) => {
            apply_critical_success(dice, rolls, compare_point)
        }
        DiceModifier::CriticalFailure(compare_point) => {
            apply_critical_failure(dice, rolls, compare_point)
        }
        DiceModifier::Keep(keep_kind, amount) => apply_keep(rolls, keep_kind, amount),
        DiceModifier::Drop(keep_kind, amount) => apply_drop(rolls, keep_kind, amount),
        DiceModifier::Sort(sort_kind) => apply_sort(rolls, sort_kind),
        _ => {}
    }
}

fn apply_min(min: i32, roll: &mut Roll) {
    if min > roll.value {
        roll.value = min;
        roll.set_modifier_flag(ModifierFlags::Min as u8);
    }
}

fn apply_max(max: i32, roll: &mut Roll) {
    if max < roll.value {
        roll.value = max;
        roll.set_modifier_flag(ModifierFlags::Max as u8);
    }
}

/// The test a roll modifier runs on each roll, `None` when no face of the dice
/// can ever pass it.
fn roll_trigger(
    dice: &Dice,
    compare_point: Option<ComparePoint>,
    default: impl Fn(f64) -> bool + 'static,
) -> Option<Box<dyn Fn(f64) -> bool>> {
    match compare_point {
        Some(cmp) if !cmp.can_dice_pass(dice) => None,
        Some(cmp) => Some(cmp.compare_fn()),
        None => Some(Box::new(default)),
    }
}

fn apply_exploding<R: Rng + ?Sized>(
    dice: &Dice,
    rolls_info: &mut RollsInfo,
    rng: &mut R,
    exploding_kind: ExplodingKind,
    compare_point: Option<ComparePoint>,
) {
    let max = dice.max_value_f64();
    let Some(should_explode) = roll_trigger(dice, compare_point, move |a| a == max) else {
        return;
    };

    let (flag, penetrating, compounding) = match exploding_kind {
        ExplodingKind::Standard => (ModifierFlags::ExplodingStandard, false, false),
        ExplodingKind::Penetrating => (ModifierFlags::ExplodingPenetrating, true, false),
        ExplodingKind::Compounding => (ModifierFlags::ExplodingCompounding, false, true),
        ExplodingKind::PenetratingCompounding => {
            (ModifierFlags::ExplodingPenetratingCompounding, true, true)
        }
    };

    // Compounding dice keep testing the last extra roll, not their running total.
    let mut last = rolls_info.current.value;
    for _ in 0..MAX_EXPLODE_ITERATIONS {
        if !should_explode(last.into()) {
            break;
        }

        rolls_info.current.set_modifier_flag(flag as u8);
        last = dice.roll_value(rng) - i32::from(penetrating);

        if compounding {
            rolls_info.current.value += last;
        } else {
            rolls_info.all.push(rolls_info.current);
            rolls_info.current = Roll::new(last);
        }
    }
}

fn apply_reroll<R: Rng + ?Sized>(
    dice: &Dice,
    rolls_info: &mut RollsInfo,
    rng: &mut R,
    once: bool,
    compare_point: Option<ComparePoint>,
) {
    let min = dice.min_value_f64();
    let Some(should_reroll) = roll_trigger(dice, compare_point, move |a| a == min) else {
        return;
    };

    let (iterations, flag) = match once {
        true => (1, ModifierFlags::ReRollOnce),
        false => (MAX_REROLL_ITERATIONS, ModifierFlags::ReRoll),
    };
    for _ in 0..iterations {
        if !should_reroll(rolls_info.current.value.into()) {
            break;
        }
        rolls_info.current.set_modifier_flag(flag as u8);
        rolls_info.current.value = dice.roll_value(rng);
    }
}

fn apply_unique<R: Rng + ?Sized>(
    dice: &Dice,
    rolls_info: &mut RollsInfo,
    rng: &mut R,
    once: bool,
    compare_point: Option<ComparePoint>,
) {
    let Some(should_reroll) = roll_trigger(dice, compare_point, |_| true) else {
        return;
    };

    let (iterations, flag) = match once {
        true => (1, ModifierFlags::UniqueOnce),
        false => (MAX_REROLL_ITERATIONS, ModifierFlags::Unique),
    };
    for _ in 0..iterations {
        let value = rolls_info.current.value;
        let repeated = rolls_info.all.iter().any(|r| r.value == value);
        if !repeated || !should_reroll(value.into()) {
            break;
        }
        rolls_info.current.set_modifier_flag(flag as u8);
        rolls_info.current.value = dice.roll_value(rng);
    }
}

fn apply_target_success<R: BorrowMut<Roll>>(rolls: &mut [R], compare_point: ComparePoint) {
    let cmp_fn = compare_point.compare_fn();

    for roll in rolls.iter_mut() {
        let roll: &mut Roll = roll.borrow_mut();
        if cmp_fn(f64::from(roll.value)) {
            roll.set_modifier_flag(ModifierFlags::TargetSuccess as u8);
        }
    }
}

fn apply_target_failure<R: BorrowMut<Roll>>(
    rolls: &mut [R],
    success_cmp: ComparePoint,
    failure_cmp: ComparePoint,
) {
    apply_target_success(rolls, success_cmp);

    let cmp_fn = failure_cmp.compare_fn();
    for roll in rolls.iter_mut() {
        let roll: &mut Roll = roll.borrow_mut();
        if !roll.was_modifier_applied(ModifierFlags::TargetSuccess as u8)
            && cmp_fn(f64::from(roll.value))
        {
            roll.set_modifier_flag(ModifierFlags::TargetFailure as u8);
        }
    }
}

fn apply_critical_success<R: BorrowMut<Roll>>(
    dice: Option<&Dice>,
    rolls: &mut [R],
    compare_point: Option<ComparePoint>,
) {
    let is_critical_success: Box<dyn Fn(f64) -> bool> = match (compare_point, dice) {
        (Some(cmp), _) => cmp.compare_fn(),
        (None, Some(dice)) => {
            let max = dice.max_value_f64();
            Box::new(move |a| a == max)
        }
        (None, None) => return,
    };

    for roll in rolls.iter_mut() {
        let roll: &mut Roll = roll.borrow_mut();
        if is_critical_success(f64::from(roll.value)) {
            roll.set_modifier_flag(ModifierFlags::CriticalSuccess as u8);
        }
    }
}

fn apply_critical_failure<R: BorrowMut<Roll>>(
    dice: Option<&Dice>,
    rolls: &mut [R],
    compare_point: Option<ComparePoint>,
) {
    let is_critical_fail: Box<dyn Fn(f64) -> bool> = match (compare_point, dice) {
        (Some(cmp), _) => cmp.compare_fn(),
        (None, Some(dice)) => {
            let min = dice.min_value_f64();
            Box::new(move |a| a == min)
        }
        (None, None) => return,
    };

    for roll in rolls.iter_mut() {
        let roll: &mut Roll = roll.borrow_mut();
        if is_critical_fail(f64::from(roll.value)) {
            roll.set_modifier_flag(ModifierFlags::CriticalFailure as u8);
        }
    }
}

fn sorted_indices<R: Borrow<Roll>>(rolls: &[R], keep_kind: KeepKind) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..rolls.len()).collect();
    let value = |i: usize| Borrow::<Roll>::borrow(&rolls[i]).value;
    match keep_kind {
        KeepKind::Highest => indices.sort_by(|&ia, &ib| value(ib).cmp(&value(ia))),
        KeepKind::Lowest => indices.sort_by(|&ia, &ib| value(ia).cmp(&value(ib))),
    }
    indices
}

fn apply_keep<R: BorrowMut<Roll>>(rolls: &mut [R], keep_kind: KeepKind, amount: u32) {
    let indices = sorted_indices(rolls, keep_kind);
    let amount = (amount as usize).min(indices.len());

    for &i in &indices[amount..] {
        let roll: &mut Roll = rolls[i].borrow_mut();
        roll.set_modifier_flag(ModifierFlags::Drop as u8);
    }
}

fn apply_drop<R: BorrowMut<Roll>>(rolls: &mut [R], keep_kind: KeepKind, amount: u32) {
    let indices = sorted_indices(rolls, keep_kind);
    let amount = (amount as usize).min(indices.len());

    for &i in &indices[..amount] {
        let roll: &mut Roll = rolls[i].borrow_mut();
        roll.set_modifier_flag(ModifierFlags::Drop as u8);
    }
}

fn apply_sort<R: BorrowMut<Roll>>(rolls: &mut [R], sort_kind: SortKind) {
    match sort_kind {
        SortKind::Ascending => rolls.sort_by(|a, b| by_value(a, b)),
        SortKind::Descending => rolls.sort_by(|a, b| by_value(b, a)),
    }
}

fn by_value<R: Borrow<Roll>>(a: &R, b: &R) -> std::cmp::Ordering {
    Borrow::<Roll>::borrow(a).cmp(Borrow::<Roll>::borrow(b))
}

pub fn to_notations(rolls: &[Roll]) -> String {
    format!(
        "[{}]",
        rolls
            .iter()
            .map(|r| r.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    )
}

impl ComparePoint {
    pub fn compare_fn(self) -> Box<dyn Fn(f64) -> bool> {
        match self {
            ComparePoint::Equal(n) => Box::new(move |a| a == n),
            ComparePoint::NotEqual(n) => Box::new(move |a| a != n),
            ComparePoint::LessThan(n) => Box::new(move |a| a < n),
            ComparePoint::GreaterThan(n) => Box::new(move |a| a > n),
            ComparePoint::LessThanOrEqual(n) => Box::new(move |a| a <= n),
            ComparePoint::GreaterThanOrEqual(n) => Box::new(move |a| a >= n),
        }
    }

    /// Whether at least one face of the dice meets the compare point.
    pub fn can_dice_pass(self, dice: &Dice) -> bool {
        let (min, max) = (dice.min_value_f64(), dice.max_value_f64());
        match self {
            ComparePoint::Equal(n) => min <= n && n <= max,
            ComparePoint::NotEqual(n) => min != max || n != min,
            ComparePoint::LessThan(n) => n > min,
            ComparePoint::GreaterThan(n) => n < max,
            ComparePoint::LessThanOrEqual(n) => n >= min,
            ComparePoint::GreaterThanOrEqual(n) => n <= max,
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    fn five_d6(modifiers: Vec<DiceModifier>) -> Dice {
        Dice {
            quantity: 5,
            kind: DiceKind::Standard(6),
            modifiers,
        }
    }

    // NOTE: First 20 rolls with rng seed set to 1
    // [5, 6, 5, 5, 2, 3, 2, 2, 5, 2, 4, 6, 5, 3, 6, 5, 1, 4, 1, 3]
    // Keep in mind that you usually set a roll before those

    fn test_rng() -> StdRng {
        StdRng::seed_from_u64(1)
    }

    #[test]
    fn test_rolling() {
        let dice = five_d6(vec![DiceModifier::Min(3), DiceModifier::Keep(KeepKind::Highest, 2)]);
        let rolls = dice.roll_all_with(&mut test_rng());

        assert_eq!(to_notations(&rolls.rolls), "[5, 6, 5d, 5d, 3^d]");
    }

    #[test]
    fn test_roll_modifiers() {
        use ComparePoint::*;
        use DiceModifier::*;
        use ExplodingKind::*;
        use ModifierFlags as F;

        // modifier, rolls before, current roll, rolls after, current value, flag, flag applied
        #[rustfmt::skip]
        let inputs = [
            (Min(3), vec![], 2, None, 3, F::Min, true),
            (Min(3), vec![], 4, None, 4, F::Min, false),
            (Max(3), vec![], 4, None, 3, F::Max, true),
            (Max(3), vec![], 2, None, 2, F::Max, false),
            // Exploded rolls are pushed, the current roll is the last explosion
            (Exploding(Standard, None), vec![], 6, Some("[6!]"), 5, F::ExplodingStandard, false),
            (Exploding(Standard, Some(GreaterThan(4.0))), vec![], 6, Some("[6!, 5!, 6!, 5!, 5!]"), 2, F::ExplodingStandard, false),
            (Exploding(Standard, Some(GreaterThan(4.0))), vec![], 2, None, 2, F::ExplodingStandard, false),
            (Exploding(Penetrating, None), vec![], 6, Some("[6!p]"), 4, F::ExplodingPenetrating, false),
            (Exploding(Penetrating, Some(GreaterThan(4.0))), vec![], 6, Some("[6!p]"), 4, F::ExplodingPenetrating, false),
            (Exploding(Penetrating, Some(GreaterThan(4.0))), vec![], 2, None, 2, F::ExplodingPenetrating, false),
            // Compounded rolls stay a single roll
            (Exploding(Compounding, None), vec![], 6, None, 11, F::ExplodingCompounding, true),
            (Exploding(Compounding, Some(GreaterThan(4.0))), vec![], 6, None, 29, F::ExplodingCompounding, true),
            (Exploding(Compounding, Some(GreaterThan(4.0))), vec![], 2, None, 2, F::ExplodingCompounding, false),
            (Exploding(PenetratingCompounding, None), vec![], 6, None, 10, F::ExplodingPenetratingCompounding, true),
            (Exploding(PenetratingCompounding, Some(GreaterThan(3.0))), vec![], 6, None, 24, F::ExplodingPenetratingCompounding, true),
            (Exploding(PenetratingCompounding, Some(LessThan(4.0))), vec![], 5, None, 5, F::ExplodingPenetratingCompounding, false),
            (ReRoll(false, None), vec![], 1, None, 5, F::ReRoll, true),
            (ReRoll(false, Some(LessThanOrEqual(5.0))), vec![], 4, None, 6, F::ReRoll, true),
            (ReRoll(false, Some(Equal(4.0))), vec![], 2, None, 2, F::ReRoll, false),
            (ReRoll(true, None), vec![], 1, None, 5, F::ReRollOnce, true),
            (ReRoll(true, Some(LessThanOrEqual(5.0))), vec![], 4, None, 5, F::ReRollOnce, true),
            (ReRoll(true, Some(Equal(4.0))), vec![], 2, None, 2, F::ReRollOnce, false),
            (Unique(false, None), vec![5, 6], 5, None, 2, F::Unique, true),
            (Unique(false, Some(Equal(5.0))), vec![5, 4], 5, None, 6, F::Unique, true),
            (Unique(false, Some(Equal(6.0))), vec![3, 4], 5, None, 5, F::Unique, false),
            // Already unique
            (Unique(false, Some(Equal(5.0))), vec![3, 4], 5, None, 5, F::Unique, false),
            (Unique(true, None), vec![5, 6], 5, None, 5, F::UniqueOnce, true),
            (Unique(true, Some(LessThanOrEqual(5.0))), vec![5, 6], 5, None, 5, F::UniqueOnce, true),
            (Unique(true, Some(Equal(4.0))), vec![], 2, None, 2, F::UniqueOnce, false),
        ];

        for (modifier, before, current, after, value, flag, applied) in inputs {
            let mut rolls_info = RollsInfo {
                all: before.into_iter().map(Roll::new).collect(),
                current: Roll::new(current),
            };
            apply_roll_modifier(&five_d6(vec![]), modifier, &mut rolls_info, &mut test_rng());

            if let Some(after) = after {
                assert_eq!(to_notations(&rolls_info.all), after, "{modifier:?} on {current}");
            }
            assert_eq!(rolls_info.current.value, value, "{modifier:?} on {current}");
            assert_eq!(
                rolls_info.current.was_modifier_applied(flag as u8),
                applied,
                "{modifier:?} on {current}"
            );
        }
    }

    #[test]
    fn test_output_modifiers() {
        use ComparePoint::*;
        use DiceModifier::*;

        #[rustfmt::skip]
        let inputs = [
            (TargetSuccess(Equal(2.0)), vec![2], "[2*]"),
            (TargetSuccess(Equal(3.0)), vec![2], "[2]"),
            (TargetFailure(GreaterThan(5.0), LessThanOrEqual(2.0)), vec![1], "[1_]"),
            (TargetFailure(GreaterThan(5.0), LessThanOrEqual(2.0)), vec![6], "[6*]"),
            (TargetFailure(LessThan(2.0), GreaterThan(5.0)), vec![4], "[4]"),
            (CriticalSuccess(None), vec![6], "[6**]"),
            (CriticalSuccess(Some(Equal(2.0))), vec![2], "[2**]"),
            (CriticalSuccess(Some(Equal(3.0))), vec![2], "[2]"),
            (CriticalFailure(None), vec![1], "[1__]"),
            (CriticalFailure(Some(LessThanOrEqual(2.0))), vec![1], "[1__]"),
            (CriticalFailure(Some(GreaterThan(5.0))), vec![4], "[4]"),
            (Keep(KeepKind::Highest, 2), vec![1, 2, 3, 4], "[1d, 2d, 3, 4]"),
            (Keep(KeepKind::Highest, 2), vec![2, 3, 4, 1], "[2d, 3, 4, 1d]"),
            (Keep(KeepKind::Lowest, 2), vec![2, 3, 4, 1], "[2, 3d, 4d, 1]"),
            (Drop(KeepKind::Highest, 3), vec![1, 2, 3, 4], "[1, 2d, 3d, 4d]"),
            (Drop(KeepKind::Highest, 1), vec![2, 3, 4, 1], "[2, 3, 4d, 1]"),
            (Drop(KeepKind::Lowest, 1), vec![2, 3, 4, 1], "[2, 3, 4, 1d]"),
            (Sort(SortKind::Ascending), vec![2, 3, 4, 1], "[1, 2, 3, 4]"),
            (Sort(SortKind::Descending), vec![2, 3, 4, 1], "[4, 3, 2, 1]"),
        ];

        let dice = five_d6(vec![]);
        for (modifier, values, expected) in inputs {
            let mut rolls: Vec<Roll> = values.into_iter().map(Roll::new).collect();
            apply_output_modifier(Some(&dice), modifier, &mut rolls[..]);

            assert_eq!(to_notations(&rolls), expected, "{modifier:?}");
        }
    }

    #[test]
    fn test_dice_can_pass_compare_point() {
        use ComparePoint::*;

        let d100 = DiceKind::Standard(100);
        #[rustfmt::skip]
        let passable = [
            Equal(1.), Equal(100.),
            NotEqual(0.), NotEqual(1.), NotEqual(100.), NotEqual(101.),
            LessThan(2.), LessThan(101.),
            GreaterThan(1.), GreaterThan(99.5),
            LessThanOrEqual(1.), LessThanOrEqual(101.),
            GreaterThanOrEqual(100.), GreaterThanOrEqual(-3.),
        ];
        #[rustfmt::skip]
        let unpassable = [
            Equal(0.), Equal(101.),
            LessThan(1.), LessThan(-5.),
            GreaterThan(100.), GreaterThan(101.),
            LessThanOrEqual(0.99),
            GreaterThanOrEqual(101.),
        ];
        for cmp in passable {
            assert!(cmp.can_dice_pass(&Dice::new(1, d100, &[])), "d100 {cmp:?}");
        }
        for cmp in unpassable {
            assert!(!cmp.can_dice_pass(&Dice::new(1, d100, &[])), "d100 {cmp:?}");
        }

        // Fudge dice roll -1, 0 or 1 whatever their kind
        for kind in [DiceKind::Fudge1, DiceKind::Fudge2] {
            let dice = Dice::new(1, kind, &[]);
            #[rustfmt::skip]
            let inputs = [
                (LessThan(0.), true), (LessThan(-1.), false),
                (GreaterThan(0.), true), (GreaterThan(2.), false),
                (LessThanOrEqual(-1.), true), (LessThanOrEqual(-1.5), false),
                (GreaterThanOrEqual(1.), true), (GreaterThanOrEqual(2.), false),
            ];
            for (cmp, expected) in inputs {
                assert_eq!(cmp.can_dice_pass(&dice), expected, "{kind:?} {cmp:?}");
            }
        }

        // A single faced die never differs from its face
        assert!(!NotEqual(1.).can_dice_pass(&Dice::new(1, DiceKind::Standard(1), &[])));
    }

    #[test]
    fn test_target_failure_never_flags_successes() {
        let mut rolls = [Roll::new(1), Roll::new(6)];
        apply_target_failure(
            &mut rolls,
            ComparePoint::GreaterThanOrEqual(1.0),
            ComparePoint::Equal(1.0),
        );

        assert_eq!(to_notations(&rolls), "[1*, 6*]");
    }

    #[test]
    fn test_keep_more_than_rolled() {
        let mut rolls = [Roll::new(2), Roll::new(3)];
        apply_keep(&mut rolls, KeepKind::Highest, 5);
        apply_drop(&mut rolls, KeepKind::Lowest, 0);

        assert_eq!(to_notations(&rolls), "[2, 3]");
    }

    #[test]
    fn test_output_modifiers_through_references() {
        let mut first = [Roll::new(4), Roll::new(1)];
        let mut second = [Roll::new(6)];
        let mut pool: Vec<&mut Roll> = first.iter_mut().chain(second.iter_mut()).collect();

        apply_output_modifier(None, DiceModifier::Keep(KeepKind::Highest, 2), &mut pool);

        assert_eq!(to_notations(&first), "[4, 1d]");
        assert_eq!(to_notations(&second), "[6]");
    }

    #[test]
    fn test_critical_without_dice_needs_compare_point() {
        let mut rolls = [Roll::new(6)];
        apply_output_modifier(None, DiceModifier::CriticalSuccess(None), &mut rolls);
        assert_eq!(to_notations(&rolls), "[6]");

        apply_output_modifier(
            None,
            DiceModifier::CriticalSuccess(Some(ComparePoint::GreaterThan(5.0))),
            &mut rolls,
        );
        assert_eq!(to_notations(&rolls), "[6**]");
    }

    #[test]
    fn test_default_sort_does_not_override() {
        let dice = Dice::new(3, DiceKind::Standard(10), &[DiceModifier::Sort(SortKind::Descending)])
            .with_default_sort(Some(SortKind::Ascending));
        assert_eq!(dice.modifiers(), [DiceModifier::Sort(SortKind::Descending)]);

        let dice = Dice::new(3, DiceKind::Standard(10), &[]).with_default_sort(Some(SortKind::Ascending));
        let rolls = dice.roll_all_with(&mut test_rng());
        assert_eq!(to_notations(&rolls.rolls), "[8, 9, 10]");
    }

    #[test]
    fn test_die_bounds() {
        let dice = Dice::new(1, DiceKind::Standard(6), &[DiceModifier::Min(3)]);
        assert_eq!(dice.die_bounds(), (3.0, 6.0));

        let dice = Dice::new(1, DiceKind::Standard(6), &[DiceModifier::Max(2)]);
        assert_eq!(dice.die_bounds(), (1.0, 2.0));

        let dice = Dice::new(
            1,
            DiceKind::Standard(6),
            &[DiceModifier::Exploding(ExplodingKind::Standard, None)],
        );
        assert_eq!(dice.die_bounds(), (1.0, f64::INFINITY));

        let dice = Dice::new(
            1,
            DiceKind::Standard(6),
            &[DiceModifier::Exploding(ExplodingKind::Standard, Some(ComparePoint::GreaterThan(6.0)))],
        );
        assert_eq!(dice.die_bounds(), (1.0, 6.0));
    }

    #[test]
    fn test_kept_count() {
        let dice = Dice::new(
            4,
            DiceKind::Standard(6),
            &[DiceModifier::Keep(KeepKind::Highest, 3), DiceModifier::Drop(KeepKind::Lowest, 1)],
        );
        assert_eq!(dice.kept_count(4), 2);
        assert_eq!(dice.kept_count(1), 0);
    }
}
