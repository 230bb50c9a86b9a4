use rand::Rng;

use crate::{
    error::NotationError,
    parse::{Dice, DiceKind, Expression, MathFn1, MathFn2, Operator, SortKind},
};

use super::{
    group_rolls::{roll_group, GroupOutput},
    roll::{Roll, RollOutput},
};

/// An [Expression] after every die in it has been rolled.
#[derive(Debug, Clone)]
pub enum RolledExpression {
    Value(f64),
    Neg(Box<RolledExpression>),
    DiceRolls(RollOutput),
    Parens(Box<RolledExpression>),
    Group(GroupOutput),
    Infix(Operator, Box<RolledExpression>, Box<RolledExpression>),
    Fn1(MathFn1, Box<RolledExpression>),
    Fn2(MathFn2, Box<RolledExpression>, Box<RolledExpression>),
}

impl Expression {
    /// Rolls every die in the expression.
    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<RolledExpression, NotationError> {
        self.roll_sorted(None, rng)
    }

    pub(crate) fn roll_sorted<R: Rng + ?Sized>(
        &self,
        sort: Option<SortKind>,
        rng: &mut R,
    ) -> Result<RolledExpression, NotationError> {
        let rolled = match self {
            Expression::Value(float) => RolledExpression::Value(*float),
            Expression::Neg(expr) => RolledExpression::Neg(Box::new(expr.roll_sorted(sort, rng)?)),
            Expression::DiceStandard(qty, sides, modifiers) => {
                let quantity = roll_quantity(qty, sort, rng)?;
                let sides = sides.roll_sorted(sort, rng)?.value();
                if !sides.is_finite() || sides.round() < 1.0 {
                    return Err(NotationError(format!(
                        "Dice must have at least one side, got {sides}"
                    )));
                }

                let dice = Dice::new(quantity, DiceKind::Standard(sides.round() as u32), modifiers);
                RolledExpression::DiceRolls(dice.with_default_sort(sort).roll_all_with(rng))
            }
            Expression::DiceFudge1(qty, modifiers) => {
                let quantity = roll_quantity(qty, sort, rng)?;
                let dice = Dice::new(quantity, DiceKind::Fudge1, modifiers);
                RolledExpression::DiceRolls(dice.with_default_sort(sort).roll_all_with(rng))
            }
            Expression::DiceFudge2(qty, modifiers) => {
                let quantity = roll_quantity(qty, sort, rng)?;
                let dice = Dice::new(quantity, DiceKind::Fudge2, modifiers);
                RolledExpression::DiceRolls(dice.with_default_sort(sort).roll_all_with(rng))
            }
            Expression::DicePercentile(qty, modifiers) => {
                let quantity = roll_quantity(qty, sort, rng)?;
                let dice = Dice::new(quantity, DiceKind::Standard(100), modifiers);
                RolledExpression::DiceRolls(dice.with_default_sort(sort).roll_all_with(rng))
            }
            Expression::Parens(expr) => {
                RolledExpression::Parens(Box::new(expr.roll_sorted(sort, rng)?))
            }
            Expression::Group(exprs, modifiers) => {
                RolledExpression::Group(roll_group(exprs, modifiers, sort, rng)?)
            }
            Expression::Infix(op, lhs, rhs) => RolledExpression::Infix(
                *op,
                Box::new(lhs.roll_sorted(sort, rng)?),
                Box::new(rhs.roll_sorted(sort, rng)?),
            ),
            Expression::Fn1(f, arg) => {
                RolledExpression::Fn1(*f, Box::new(arg.roll_sorted(sort, rng)?))
            }
            Expression::Fn2(f, arg1, arg2) => RolledExpression::Fn2(
                *f,
                Box::new(arg1.roll_sorted(sort, rng)?),
                Box::new(arg2.roll_sorted(sort, rng)?),
            ),
        };

        Ok(rolled)
    }
}

fn roll_quantity<R: Rng + ?Sized>(
    qty: &Option<Box<Expression>>,
    sort: Option<SortKind>,
    rng: &mut R,
) -> Result<u32, NotationError> {
    let Some(qty) = qty else {
        return Ok(1);
    };

    let quantity = qty.roll_sorted(sort, rng)?.value();
    if !quantity.is_finite() {
        return Err(NotationError(format!(
            "Dice quantity must be a number, got {quantity}"
        )));
    }
    // clamped by Dice::new
    Ok(quantity.round().max(0.0) as u32)
}

impl RolledExpression {
    pub fn value(&self) -> f64 {
        match self {
            RolledExpression::Value(float) => *float,
            RolledExpression::Neg(expr) => -expr.value(),
            RolledExpression::DiceRolls(output) => output.value(),
            RolledExpression::Parens(expr) => expr.value(),
            RolledExpression::Group(group) => group.value(),
            RolledExpression::Infix(op, lhs, rhs) => op.apply(lhs.value(), rhs.value()),
            RolledExpression::Fn1(f, arg) => f.apply(arg.value()),
            RolledExpression::Fn2(f, arg1, arg2) => f.apply(arg1.value(), arg2.value()),
        }
    }

    /// Values of every die, one list per dice term in reading order.
    pub fn faces(&self) -> Vec<Vec<i32>> {
        self.rolls_by_output()
            .into_iter()
            .map(|rolls| rolls.iter().map(Roll::value).collect())
            .collect()
    }

    fn rolls_by_output(&self) -> Vec<&[Roll]> {
        let mut outputs = Vec::new();
        self.for_each_output(&mut |output| outputs.push(output.rolls()));
        outputs
    }

    pub(crate) fn for_each_output<'a>(&'a self, f: &mut impl FnMut(&'a RollOutput)) {
        match self {
            RolledExpression::Value(_) => {}
            RolledExpression::DiceRolls(output) => f(output),
            RolledExpression::Neg(expr)
            | RolledExpression::Parens(expr)
            | RolledExpression::Fn1(_, expr) => expr.for_each_output(f),
            RolledExpression::Infix(_, lhs, rhs) | RolledExpression::Fn2(_, lhs, rhs) => {
                lhs.for_each_output(f);
                rhs.for_each_output(f);
            }
            RolledExpression::Group(group) => {
                for item in &group.items {
                    item.for_each_output(f);
                }
            }
        }
    }

    pub(crate) fn for_each_output_mut(&mut self, f: &mut impl FnMut(&mut RollOutput)) {
        match self {
            RolledExpression::Value(_) => {}
            RolledExpression::DiceRolls(output) => f(output),
            RolledExpression::Neg(expr)
            | RolledExpression::Parens(expr)
            | RolledExpression::Fn1(_, expr) => expr.for_each_output_mut(f),
            RolledExpression::Infix(_, lhs, rhs) | RolledExpression::Fn2(_, lhs, rhs) => {
                lhs.for_each_output_mut(f);
                rhs.for_each_output_mut(f);
            }
            RolledExpression::Group(group) => {
                for item in group.items.iter_mut() {
                    item.for_each_output_mut(f);
                }
            }
        }
    }

    /// Every die of the expression, used by groups applying modifiers to a pool of dice.
    pub(crate) fn rolls(&self) -> Vec<&Roll> {
        let mut rolls = Vec::new();
        self.for_each_output(&mut |output| rolls.extend(output.rolls.iter()));
        rolls
    }

    pub(crate) fn rolls_mut(&mut self) -> Vec<&mut Roll> {
        let mut rolls = Vec::new();
        self.collect_rolls_mut(&mut rolls);
        rolls
    }

    fn collect_rolls_mut<'a>(&'a mut self, rolls: &mut Vec<&'a mut Roll>) {
        match self {
            RolledExpression::Value(_) => {}
            RolledExpression::DiceRolls(output) => rolls.extend(output.rolls.iter_mut()),
            RolledExpression::Neg(expr)
            | RolledExpression::Parens(expr)
            | RolledExpression::Fn1(_, expr) => expr.collect_rolls_mut(rolls),
            RolledExpression::Infix(_, lhs, rhs) | RolledExpression::Fn2(_, lhs, rhs) => {
                lhs.collect_rolls_mut(rolls);
                rhs.collect_rolls_mut(rolls);
            }
            RolledExpression::Group(group) => {
                for item in group.items.iter_mut() {
                    item.collect_rolls_mut(rolls);
                }
            }
        }
    }
}

impl std::fmt::Display for RolledExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RolledExpression::Value(val) => write!(f, "{val}"),
            RolledExpression::Neg(expr) => write!(f, "-{expr}"),
            RolledExpression::DiceRolls(output) => write!(f, "{output}"),
            RolledExpression::Parens(expr) => write!(f, "({expr})"),
            RolledExpression::Group(group) => write!(f, "{group}"),
            RolledExpression::Infix(op, lhs, rhs) => write!(f, "{lhs}{op}{rhs}"),
            // no parens on the function call because there's always a parens expression following the function call
            RolledExpression::Fn1(func, arg) => write!(f, "{func}{arg}"),
            RolledExpression::Fn2(func, arg1, arg2) => write!(f, "{func}({arg1}, {arg2})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    fn test_rng() -> StdRng {
        StdRng::seed_from_u64(1)
    }

    fn roll(input: &str) -> RolledExpression {
        Expression::parse(input)
            .unwrap()
            .roll(&mut test_rng())
            .unwrap()
    }

    #[test]
    fn test_operator_values() {
        #[rustfmt::skip]
        let inputs = [
            ("1 + 2", 3.0),
            ("8 / 4 / 2", 1.0),
            ("2 ^ 3 ^ 2", 512.0),
            ("-2 ^ 2", -4.0),
            ("7 % 4", 3.0),
            ("2 ** 10", 1024.0),
        ];

        for (input, expected) in inputs {
            assert_eq!(roll(input).value(), expected, "{input}");
        }
    }

    #[test]
    fn test_function_values() {
        #[rustfmt::skip]
        let inputs = [
            ("abs(-4)", 4.0),
            ("floor(7 / 2)", 3.0),
            ("ceil(7 / 2)", 4.0),
            ("round(2.5)", 3.0),
            ("sign(-3)", -1.0),
            ("sign(0)", 0.0),
            ("sqrt(16)", 4.0),
            ("max(3, 8)", 8.0),
            ("min(3, 8)", 3.0),
            ("pow(2, 5)", 32.0),
        ];

        for (input, expected) in inputs {
            assert_eq!(roll(input).value(), expected, "{input}");
        }
    }

    #[test]
    fn test_compact_display() {
        let rolled = roll("2d6 * (1 + 1d4) - max(1, 2)");

        assert_eq!(rolled.to_string(), "[5, 6]*(1+[4])-max(1, 2)");
        assert_eq!(rolled.value(), 53.0);
    }

    #[test]
    fn test_expression_quantity_and_sides() {
        // 2 dice of (3 + 3) sides
        let rolled = roll("(1 + 1)d(3 + 3)");

        assert_eq!(rolled.to_string(), "[5, 6]");
    }

    #[test]
    fn test_fudge_and_percentile() {
        let rolled = roll("4dF");
        assert!(rolled.faces()[0].iter().all(|v| (-1..=1).contains(v)));

        let rolled = roll("2d%");
        assert_eq!(rolled.to_string(), "[83, 98]");
    }

    #[test]
    fn test_faces_include_every_die() {
        let rolled = roll("4d50k1 + 1d6");

        assert_eq!(rolled.faces(), vec![vec![42, 49, 40, 35], vec![2]]);
        assert_eq!(rolled.value(), 51.0);
    }
}
