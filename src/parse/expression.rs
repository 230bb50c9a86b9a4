use winnow::{
    ascii::{dec_uint, digit1, multispace0},
    combinator::{
        alt, cut_err, delimited, dispatch, empty, fail, not, opt, preceded, repeat, separated,
        separated_pair,
    },
    token::any,
    PResult, Parser,
};

use super::{
    parse_dice, parse_group_modifier, DiceModifier, Expression, MathFn1, MathFn2, Operator,
};

pub fn parse_expr(input: &mut &str) -> PResult<Expression> {
    let init = parse_term.parse_next(input)?;

    repeat(0.., (low_precedence_operator, parse_term))
        .fold(
            move || init.clone(),
            |acc, (op, val): (Operator, Expression)| {
                Expression::Infix(op, Box::new(acc), Box::new(val))
            },
        )
        .parse_next(input)
}

fn parse_term(input: &mut &str) -> PResult<Expression> {
    let init = parse_unary.parse_next(input)?;

    repeat(0.., (high_precedence_operator, parse_unary))
        .fold(
            move || init.clone(),
            |acc, (op, val): (Operator, Expression)| {
                Expression::Infix(op, Box::new(acc), Box::new(val))
            },
        )
        .parse_next(input)
}

fn parse_unary(input: &mut &str) -> PResult<Expression> {
    alt((
        preceded((multispace0, '-'), cut_err(parse_unary)).map(|e| Expression::Neg(Box::new(e))),
        preceded((multispace0, '+'), cut_err(parse_unary)),
        parse_power,
    ))
    .parse_next(input)
}

// `^` binds tighter than unary minus on its left and is right associative.
fn parse_power(input: &mut &str) -> PResult<Expression> {
    let base = parse_factor.parse_next(input)?;
    let exponent = opt(preceded(power_operator, cut_err(parse_unary))).parse_next(input)?;

    Ok(match exponent {
        Some(exponent) => Expression::Infix(Operator::Pow, Box::new(base), Box::new(exponent)),
        None => base,
    })
}

fn parse_factor(input: &mut &str) -> PResult<Expression> {
    delimited(
        multispace0,
        alt((
            parse_dice,
            parse_fn2,
            parse_fn1,
            parse_roll_groups,
            parse_parens,
            number_expr,
        )),
        multispace0,
    )
    .parse_next(input)
}

pub fn parse_parens(input: &mut &str) -> PResult<Expression> {
    delimited('(', parse_expr, ')')
        .map(|e| Expression::Parens(Box::new(e)))
        .parse_next(input)
}

pub fn uint_expr(input: &mut &str) -> PResult<Expression> {
    let uint: u32 = dec_uint.parse_next(input)?;
    Ok(Expression::Value(uint as f64))
}

/// Unsigned decimal, `3` or `2.5`.
pub fn number(input: &mut &str) -> PResult<f64> {
    (digit1, opt(('.', digit1)))
        .take()
        .try_map(str::parse::<f64>)
        .parse_next(input)
}

fn number_expr(input: &mut &str) -> PResult<Expression> {
    number.map(Expression::Value).parse_next(input)
}

fn parse_roll_groups(input: &mut &str) -> PResult<Expression> {
    let mut parser = (
        delimited('{', separated(1.., parse_expr, ','), '}'),
        repeat(0.., parse_group_modifier),
    );

    let (expressions, modifiers): (Vec<_>, Vec<DiceModifier>) = parser.parse_next(input)?;

    Ok(Expression::Group(expressions, modifiers))
}

fn low_precedence_operator(input: &mut &str) -> PResult<Operator> {
    dispatch!(any;
        '+' => empty.value(Operator::Add),
        '-' => empty.value(Operator::Sub),
        _ => fail
    )
    .parse_next(input)
}

fn high_precedence_operator(input: &mut &str) -> PResult<Operator> {
    dispatch!(any;
        '*' => not('*').value(Operator::Mul),
        '/' => empty.value(Operator::Div),
        '%' => empty.value(Operator::Rem),
        _ => fail
    )
    .parse_next(input)
}

fn power_operator(input: &mut &str) -> PResult<Operator> {
    alt(("**", "^")).value(Operator::Pow).parse_next(input)
}

fn parse_fn1_name(input: &mut &str) -> PResult<MathFn1> {
    alt((
        "abs".value(MathFn1::Abs),
        "floor".value(MathFn1::Floor),
        "ceil".value(MathFn1::Ceil),
        "round".value(MathFn1::Round),
        "sign".value(MathFn1::Sign),
        "sqrt".value(MathFn1::Sqrt),
        "log".value(MathFn1::Log),
        "ln".value(MathFn1::Log),
        "exp".value(MathFn1::Exp),
        "sin".value(MathFn1::Sin),
        "cos".value(MathFn1::Cos),
        "tan".value(MathFn1::Tan),
    ))
    .parse_next(input)
}

fn parse_fn2_name(input: &mut &str) -> PResult<MathFn2> {
    alt((
        "min".value(MathFn2::Min),
        "max".value(MathFn2::Max),
        "pow".value(MathFn2::Pow),
    ))
    .parse_next(input)
}

pub fn parse_fn1(input: &mut &str) -> PResult<Expression> {
    let (f, arg) = (parse_fn1_name, cut_err(parse_parens)).parse_next(input)?;

    Ok(Expression::Fn1(f, Box::new(arg)))
}

pub fn parse_fn2(input: &mut &str) -> PResult<Expression> {
    let mut parser = (
        parse_fn2_name,
        cut_err(delimited(
            '(',
            separated_pair(parse_expr, ',', parse_expr),
            ')',
        )),
    );

    let (f, (arg1, arg2)) = parser.parse_next(input)?;

    Ok(Expression::Fn2(f, Box::new(arg1), Box::new(arg2)))
}

impl std::fmt::Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expression::Value(val) => write!(f, "{val}"),
            Expression::Neg(expr) => write!(f, "-{expr}"),
            Expression::DiceStandard(qty, sides, mods) => {
                write!(f, "{}d{sides}{}", qty_str(qty), DiceModifier::join_all(mods))
            }
            Expression::DiceFudge1(qty, mods) => {
                write!(f, "{}dF.1{}", qty_str(qty), DiceModifier::join_all(mods))
            }
            Expression::DiceFudge2(qty, mods) => {
                write!(f, "{}dF{}", qty_str(qty), DiceModifier::join_all(mods))
            }
            Expression::DicePercentile(qty, mods) => {
                write!(f, "{}d%{}", qty_str(qty), DiceModifier::join_all(mods))
            }
            Expression::Parens(expr) => write!(f, "({expr})"),
            Expression::Group(exprs, mods) => {
                let items = exprs
                    .iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "{{{items}}}{}", DiceModifier::join_all(mods))
            }
            Expression::Infix(op, lhs, rhs) => write!(f, "{lhs} {op} {rhs}"),
            // no parens on the function call because the argument is always a parens expression
            Expression::Fn1(func, arg) => write!(f, "{func}{arg}"),
            Expression::Fn2(func, arg1, arg2) => write!(f, "{func}({arg1}, {arg2})"),
        }
    }
}

fn qty_str(qty: &Option<Box<Expression>>) -> String {
    qty.as_ref().map(|q| q.to_string()).unwrap_or_default()
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let str = match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::Rem => "%",
            Operator::Pow => "**",
        };
        write!(f, "{str}")
    }
}

impl std::fmt::Display for MathFn1 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let str = match self {
            MathFn1::Abs => "abs",
            MathFn1::Floor => "floor",
            MathFn1::Ceil => "ceil",
            MathFn1::Round => "round",
            MathFn1::Sign => "sign",
            MathFn1::Sqrt => "sqrt",
            MathFn1::Log => "ln",
            MathFn1::Exp => "exp",
            MathFn1::Sin => "sin",
            MathFn1::Cos => "cos",
            MathFn1::Tan => "tan",
        };
        write!(f, "{str}")
    }
}

impl std::fmt::Display for MathFn2 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let str = match self {
            MathFn2::Min => "min",
            MathFn2::Max => "max",
            MathFn2::Pow => "pow",
        };
        write!(f, "{str}")
    }
}
