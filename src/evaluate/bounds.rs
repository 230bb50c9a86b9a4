use crate::{
    evaluate::roll::RollOutputKind,
    parse::{Dice, DiceKind, DiceModifier, Expression, MathFn1, MathFn2, Operator, MAX_DICE_QUANTITY},
};

type Bounds = (f64, f64);

impl Expression {
    /// Lowest and highest value the expression can roll, without rolling it.
    ///
    /// Exploding dice have no upper bound. The bounds of groups with keep or
    /// drop modifiers and of trigonometric functions are not tight.
    pub fn bounds(&self) -> Bounds {
        match self {
            Expression::Value(float) => (*float, *float),
            Expression::Neg(expr) => {
                let (low, high) = expr.bounds();
                (-high, -low)
            }
            Expression::DiceStandard(qty, sides, modifiers) => {
                let (_, max_sides) = sides.bounds();
                let sides = if max_sides.is_finite() {
                    max_sides.round().clamp(1.0, u32::MAX as f64) as u32
                } else {
                    u32::MAX
                };
                dice_bounds(qty, DiceKind::Standard(sides), modifiers)
            }
            Expression::DiceFudge1(qty, modifiers) => dice_bounds(qty, DiceKind::Fudge1, modifiers),
            Expression::DiceFudge2(qty, modifiers) => dice_bounds(qty, DiceKind::Fudge2, modifiers),
            Expression::DicePercentile(qty, modifiers) => {
                dice_bounds(qty, DiceKind::Standard(100), modifiers)
            }
            Expression::Parens(expr) => expr.bounds(),
            Expression::Group(exprs, modifiers) => group_bounds(exprs, modifiers),
            Expression::Infix(op, lhs, rhs) => infix_bounds(*op, lhs.bounds(), rhs.bounds()),
            Expression::Fn1(f, arg) => fn1_bounds(*f, arg.bounds()),
            Expression::Fn2(f, arg1, arg2) => fn2_bounds(*f, arg1.bounds(), arg2.bounds()),
        }
    }

    /// Upper bound on how many dice rolling the expression produces.
    fn max_dice_count(&self) -> f64 {
        match self {
            Expression::Value(_) => 0.0,
            Expression::DiceStandard(qty, _, modifiers)
            | Expression::DiceFudge1(qty, modifiers)
            | Expression::DiceFudge2(qty, modifiers)
            | Expression::DicePercentile(qty, modifiers) => {
                let explodes = modifiers
                    .iter()
                    .any(|m| matches!(m, DiceModifier::Exploding(..)));
                if explodes {
                    f64::INFINITY
                } else {
                    quantity_bounds(qty).1 as f64
                }
            }
            Expression::Neg(expr) | Expression::Parens(expr) | Expression::Fn1(_, expr) => {
                expr.max_dice_count()
            }
            Expression::Group(exprs, _) => exprs.iter().map(Expression::max_dice_count).sum(),
            Expression::Infix(_, lhs, rhs) | Expression::Fn2(_, lhs, rhs) => {
                lhs.max_dice_count() + rhs.max_dice_count()
            }
        }
    }
}

fn quantity_bounds(qty: &Option<Box<Expression>>) -> (u32, u32) {
    let Some(qty) = qty else {
        return (1, 1);
    };
    let (low, high) = qty.bounds();
    let clamp = |v: f64| {
        if v.is_nan() {
            1
        } else {
            v.round().clamp(1.0, MAX_DICE_QUANTITY as f64) as u32
        }
    };
    (clamp(low), clamp(high))
}

fn dice_bounds(qty: &Option<Box<Expression>>, kind: DiceKind, modifiers: &[DiceModifier]) -> Bounds {
    let (min_qty, max_qty) = quantity_bounds(qty);
    let dice = Dice::new(max_qty, kind, modifiers);

    match RollOutputKind::from_modifiers(dice.modifiers()) {
        RollOutputKind::TargetSuccess => (0.0, count_bound(&dice, max_qty)),
        RollOutputKind::TargetFailure => {
            let count = count_bound(&dice, max_qty);
            (-count, count)
        }
        RollOutputKind::Sum => {
            let (die_low, die_high) = dice.die_bounds();
            let counts = [dice.kept_count(min_qty), dice.kept_count(max_qty)];
            let totals_low = counts.map(|count| scale(count, die_low));
            let totals_high = counts.map(|count| scale(count, die_high));
            (
                totals_low[0].min(totals_low[1]),
                totals_high[0].max(totals_high[1]),
            )
        }
    }
}

/// Upper bound on the dice a target modifier counts.
fn count_bound(dice: &Dice, quantity: u32) -> f64 {
    let explodes = dice
        .modifiers()
        .iter()
        .any(|m| matches!(m, DiceModifier::Exploding(..)));
    if explodes {
        f64::INFINITY
    } else {
        dice.kept_count(quantity) as f64
    }
}

// 0 dice of an unbounded die still add up to 0
fn scale(count: u32, value: f64) -> f64 {
    if count == 0 {
        0.0
    } else {
        count as f64 * value
    }
}

fn group_bounds(exprs: &[Expression], modifiers: &[DiceModifier]) -> Bounds {
    let modifiers = DiceModifier::filter(modifiers);
    let has_keep_or_drop = modifiers
        .iter()
        .any(|m| matches!(m, DiceModifier::Keep(..) | DiceModifier::Drop(..)));

    if let [expr] = exprs {
        let count = expr.max_dice_count();
        return match RollOutputKind::from_modifiers(&modifiers) {
            RollOutputKind::TargetSuccess => (0.0, count),
            RollOutputKind::TargetFailure => (-count, count),
            RollOutputKind::Sum if has_keep_or_drop => {
                let (low, high) = expr.bounds();
                (low.min(0.0), high.max(0.0))
            }
            RollOutputKind::Sum => expr.bounds(),
        };
    }

    let count = exprs.len() as f64;
    match RollOutputKind::from_modifiers(&modifiers) {
        RollOutputKind::TargetSuccess => (0.0, count),
        RollOutputKind::TargetFailure => (-count, count),
        RollOutputKind::Sum => {
            let kept = modifiers
                .iter()
                .fold(exprs.len(), |kept, modifier| match *modifier {
                    DiceModifier::Keep(_, amount) => kept.min(amount as usize),
                    DiceModifier::Drop(_, amount) => kept.saturating_sub(amount as usize),
                    _ => kept,
                });

            let mut lows: Vec<f64> = exprs.iter().map(|e| e.bounds().0).collect();
            let mut highs: Vec<f64> = exprs.iter().map(|e| e.bounds().1).collect();
            lows.sort_by(f64::total_cmp);
            highs.sort_by(|a, b| b.total_cmp(a));

            (lows.iter().take(kept).sum(), highs.iter().take(kept).sum())
        }
    }
}

fn corners(f: impl Fn(f64, f64) -> f64, lhs: Bounds, rhs: Bounds) -> Bounds {
    let values = [
        f(lhs.0, rhs.0),
        f(lhs.0, rhs.1),
        f(lhs.1, rhs.0),
        f(lhs.1, rhs.1),
    ];
    values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(low, high), &v| {
            (low.min(v), high.max(v))
        })
}

fn infix_bounds(op: Operator, lhs: Bounds, rhs: Bounds) -> Bounds {
    match op {
        Operator::Add => (lhs.0 + rhs.0, lhs.1 + rhs.1),
        Operator::Sub => (lhs.0 - rhs.1, lhs.1 - rhs.0),
        Operator::Mul => corners(|a, b| a * b, lhs, rhs),
        Operator::Div if rhs.0 <= 0.0 && rhs.1 >= 0.0 => (f64::NEG_INFINITY, f64::INFINITY),
        Operator::Div => corners(|a, b| a / b, lhs, rhs),
        Operator::Rem if lhs.0 == lhs.1 && rhs.0 == rhs.1 => {
            let value = lhs.0 % rhs.0;
            (value, value)
        }
        Operator::Rem => {
            let limit = rhs.0.abs().max(rhs.1.abs());
            (lhs.0.min(0.0).max(-limit), lhs.1.max(0.0).min(limit))
        }
        Operator::Pow => corners(f64::powf, lhs, rhs),
    }
}

fn fn1_bounds(f: MathFn1, (low, high): Bounds) -> Bounds {
    match f {
        MathFn1::Abs if low <= 0.0 && high >= 0.0 => (0.0, low.abs().max(high.abs())),
        MathFn1::Abs => {
            let (a, b) = (low.abs(), high.abs());
            (a.min(b), a.max(b))
        }
        MathFn1::Sin | MathFn1::Cos | MathFn1::Tan if low == high => {
            let value = f.apply(low);
            (value, value)
        }
        MathFn1::Sin | MathFn1::Cos => (-1.0, 1.0),
        MathFn1::Tan => (f64::NEG_INFINITY, f64::INFINITY),
        // the rest never decrease
        _ => (f.apply(low), f.apply(high)),
    }
}

fn fn2_bounds(f: MathFn2, lhs: Bounds, rhs: Bounds) -> Bounds {
    match f {
        MathFn2::Min => (lhs.0.min(rhs.0), lhs.1.min(rhs.1)),
        MathFn2::Max => (lhs.0.max(rhs.0), lhs.1.max(rhs.1)),
        MathFn2::Pow => corners(f64::powf, lhs, rhs),
    }
}
