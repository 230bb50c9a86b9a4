use winnow::{
    ascii::{dec_int, dec_uint, digit1, multispace0},
    combinator::{alt, cut_err, delimited, opt, preceded, repeat, separated_pair},
    PResult, Parser,
};

use super::{
    parse_fn1, parse_fn2, parse_parens, uint_expr, ComparePoint, Dice, DiceKind, DiceModifier,
    ExplodingKind, Expression, KeepKind, SortKind, MAX_DICE_QUANTITY,
};

impl DiceModifier {
    /// Position of the modifier in the application order.
    pub(crate) fn order(&self) -> u8 {
        match self {
            DiceModifier::Min(_) => 0,
            DiceModifier::Max(_) => 1,
            DiceModifier::Exploding(..) => 2,
            DiceModifier::ReRoll(..) => 3,
            DiceModifier::Unique(..) => 4,
            DiceModifier::TargetSuccess(_) => 5,
            DiceModifier::TargetFailure(..) => 6,
            DiceModifier::CriticalSuccess(_) => 7,
            DiceModifier::CriticalFailure(_) => 8,
            DiceModifier::Keep(..) => 9,
            DiceModifier::Drop(..) => 10,
            DiceModifier::Sort(_) => 11,
        }
    }

    /// Sorts the modifiers in application order keeping only the last one of each variant.
    /// Target success and target failure replace each other.
    pub fn filter(modifiers: &[DiceModifier]) -> Vec<DiceModifier> {
        let mut slots: [Option<DiceModifier>; 12] = [None; 12];
        for modifier in modifiers {
            if let DiceModifier::TargetSuccess(_) | DiceModifier::TargetFailure(..) = modifier {
                slots[5] = None;
                slots[6] = None;
            }
            slots[modifier.order() as usize] = Some(*modifier);
        }

        slots.into_iter().flatten().collect()
    }

    /// Modifiers applied to each die as it is rolled, the rest apply to the whole output.
    pub(crate) fn is_roll_modifier(&self) -> bool {
        matches!(
            self,
            DiceModifier::Min(_)
                | DiceModifier::Max(_)
                | DiceModifier::Exploding(..)
                | DiceModifier::ReRoll(..)
                | DiceModifier::Unique(..)
        )
    }

    pub fn join_all(modifiers: &[DiceModifier]) -> String {
        modifiers
            .iter()
            .map(|m| m.to_string())
            .collect::<Vec<_>>()
            .join("")
    }
}

impl Dice {
    /// Creates a new dice.
    /// The quantity will clamped between 1 and 999 if a number outside that range is passed in.
    /// The modifiers will be sorted in the order specified by the enum and only
    /// the last one of each variant will be applied.
    pub fn new(quantity: u32, kind: DiceKind, modifiers: &[DiceModifier]) -> Self {
        Self {
            quantity: quantity.clamp(1, MAX_DICE_QUANTITY),
            kind,
            modifiers: DiceModifier::filter(modifiers),
        }
    }
}

/// Any kind of die: `NdS`, `NdF`, `NdF.1`, `Nd%` followed by its modifiers.
/// The quantity is parsed once and the kind is picked from what follows the `d`.
pub fn parse_dice(input: &mut &str) -> PResult<Expression> {
    let qty = opt(parse_dice_quantity).parse_next(input)?;
    'd'.parse_next(input)?;
    let qty = qty.map(Box::new);

    let dice = alt((
        preceded(alt(("F.1", "f.1")), cut_err(modifiers))
            .map(|mods| Expression::DiceFudge1(qty.clone(), mods)),
        preceded(alt(("F.2", "f.2", "F", "f")), cut_err(modifiers))
            .map(|mods| Expression::DiceFudge2(qty.clone(), mods)),
        preceded('%', cut_err(modifiers))
            .map(|mods| Expression::DicePercentile(qty.clone(), mods)),
        cut_err((parse_dice_sides, modifiers))
            .map(|(sides, mods)| Expression::DiceStandard(qty.clone(), Box::new(sides), mods)),
    ))
    .parse_next(input);

    dice
}

fn modifiers(input: &mut &str) -> PResult<Vec<DiceModifier>> {
    repeat(0.., parse_modifier).parse_next(input)
}

fn parse_dice_quantity(input: &mut &str) -> PResult<Expression> {
    delimited(
        multispace0,
        alt((parse_fn2, parse_fn1, parse_parens, uint_expr)),
        multispace0,
    )
    .parse_next(input)
}

fn parse_dice_sides(input: &mut &str) -> PResult<Expression> {
    delimited(
        multispace0,
        alt((parse_fn2, parse_fn1, parse_parens, uint_expr)),
        multispace0,
    )
    .parse_next(input)
}

pub fn parse_modifier(input: &mut &str) -> PResult<DiceModifier> {
    alt((
        preceded("min", cut_err(dec_int)).map(DiceModifier::Min),
        preceded("max", cut_err(dec_int)).map(DiceModifier::Max),
        preceded("!", cut_err(exploding)),
        preceded("ro", opt(compare_point)).map(|cp| DiceModifier::ReRoll(true, cp)),
        preceded("r", opt(compare_point)).map(|cp| DiceModifier::ReRoll(false, cp)),
        preceded("uo", opt(compare_point)).map(|cp| DiceModifier::Unique(true, cp)),
        preceded("u", opt(compare_point)).map(|cp| DiceModifier::Unique(false, cp)),
        preceded("cs", opt(compare_point)).map(DiceModifier::CriticalSuccess),
        preceded("cf", opt(compare_point)).map(DiceModifier::CriticalFailure),
        keep_or_drop,
        sort,
        target,
    ))
    .parse_next(input)
}

fn exploding(input: &mut &str) -> PResult<DiceModifier> {
    alt((
        preceded("!p", opt(compare_point))
            .map(|cp| DiceModifier::Exploding(ExplodingKind::PenetratingCompounding, cp)),
        preceded("p", opt(compare_point))
            .map(|cp| DiceModifier::Exploding(ExplodingKind::Penetrating, cp)),
        preceded("!", opt(compare_point))
            .map(|cp| DiceModifier::Exploding(ExplodingKind::Compounding, cp)),
        opt(compare_point).map(|cp| DiceModifier::Exploding(ExplodingKind::Standard, cp)),
    ))
    .parse_next(input)
}

pub fn parse_group_modifier(input: &mut &str) -> PResult<DiceModifier> {
    alt((keep_or_drop, sort, target)).parse_next(input)
}

fn keep_or_drop(input: &mut &str) -> PResult<DiceModifier> {
    alt((
        preceded("kl", cut_err(dec_uint)).map(|n| DiceModifier::Keep(KeepKind::Lowest, n)),
        preceded("kh", cut_err(dec_uint)).map(|n| DiceModifier::Keep(KeepKind::Highest, n)),
        preceded('k', cut_err(dec_uint)).map(|n| DiceModifier::Keep(KeepKind::Highest, n)),
        preceded("dh", cut_err(dec_uint)).map(|n| DiceModifier::Drop(KeepKind::Highest, n)),
        preceded("dl", cut_err(dec_uint)).map(|n| DiceModifier::Drop(KeepKind::Lowest, n)),
        preceded('d', dec_uint).map(|n| DiceModifier::Drop(KeepKind::Lowest, n)),
    ))
    .parse_next(input)
}

fn sort(input: &mut &str) -> PResult<DiceModifier> {
    alt((
        "sa".value(DiceModifier::Sort(SortKind::Ascending)),
        "sd".value(DiceModifier::Sort(SortKind::Descending)),
        's'.value(DiceModifier::Sort(SortKind::Ascending)),
    ))
    .parse_next(input)
}

fn target(input: &mut &str) -> PResult<DiceModifier> {
    alt((
        separated_pair(compare_point, 'f', cut_err(compare_point))
            .map(|(success, failure)| DiceModifier::TargetFailure(success, failure)),
        compare_point.map(DiceModifier::TargetSuccess),
    ))
    .parse_next(input)
}

pub fn compare_point(input: &mut &str) -> PResult<ComparePoint> {
    alt((
        preceded("<=", cut_err(signed_number)).map(ComparePoint::LessThanOrEqual),
        preceded(">=", cut_err(signed_number)).map(ComparePoint::GreaterThanOrEqual),
        preceded("<>", cut_err(signed_number)).map(ComparePoint::NotEqual),
        preceded("!=", cut_err(signed_number)).map(ComparePoint::NotEqual),
        preceded("==", cut_err(signed_number)).map(ComparePoint::Equal),
        preceded('=', cut_err(signed_number)).map(ComparePoint::Equal),
        preceded('<', cut_err(signed_number)).map(ComparePoint::LessThan),
        preceded('>', cut_err(signed_number)).map(ComparePoint::GreaterThan),
    ))
    .parse_next(input)
}

fn signed_number(input: &mut &str) -> PResult<f64> {
    (opt('-'), digit1, opt(('.', digit1)))
        .take()
        .try_map(str::parse::<f64>)
        .parse_next(input)
}

impl std::fmt::Display for DiceModifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiceModifier::Min(val) => write!(f, "min{val}"),
            DiceModifier::Max(val) => write!(f, "max{val}"),
            DiceModifier::Exploding(kind, cmp) => write!(f, "{kind}{}", cmp_str(cmp)),
            DiceModifier::ReRoll(once, cmp) => {
                write!(f, "r{}{}", if *once { "o" } else { "" }, cmp_str(cmp))
            }
            DiceModifier::Unique(once, cmp) => {
                write!(f, "u{}{}", if *once { "o" } else { "" }, cmp_str(cmp))
            }
            DiceModifier::TargetSuccess(cmp) => write!(f, "{cmp}"),
            DiceModifier::TargetFailure(succ, fail) => write!(f, "{succ}f{fail}"),
            DiceModifier::CriticalSuccess(cmp) => write!(f, "cs{}", cmp_str(cmp)),
            DiceModifier::CriticalFailure(cmp) => write!(f, "cf{}", cmp_str(cmp)),
            DiceModifier::Keep(kind, amount) => write!(f, "k{kind}{amount}"),
            DiceModifier::Drop(kind, amount) => write!(f, "d{kind}{amount}"),
            DiceModifier::Sort(kind) => write!(f, "s{kind}"),
        }
    }
}
impl std::fmt::Display for ComparePoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComparePoint::Equal(val) => write!(f, "={val}"),
            ComparePoint::NotEqual(val) => write!(f, "<>{val}"),
            ComparePoint::LessThan(val) => write!(f, "<{val}"),
            ComparePoint::GreaterThan(val) => write!(f, ">{val}"),
            ComparePoint::LessThanOrEqual(val) => write!(f, "<={val}"),
            ComparePoint::GreaterThanOrEqual(val) => write!(f, ">={val}"),
        }
    }
}
// Just because I don't want to keep typing it
fn cmp_str(cmp: &Option<ComparePoint>) -> String {
    cmp.map(|c| c.to_string()).unwrap_or_default()
}
impl std::fmt::Display for ExplodingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let str = match self {
            ExplodingKind::Standard => "!",
            ExplodingKind::Penetrating => "!p",
            ExplodingKind::Compounding => "!!",
            ExplodingKind::PenetratingCompounding => "!!p",
        };

        write!(f, "{str}")
    }
}
impl std::fmt::Display for KeepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Always show the letter because it changes which one can be omitted
        // depending on if it's Drop or Keep
        let str = match self {
            KeepKind::Highest => "h",
            KeepKind::Lowest => "l",
        };

        write!(f, "{str}")
    }
}
impl std::fmt::Display for SortKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let str = match self {
            SortKind::Ascending => "",
            SortKind::Descending => "d",
        };

        write!(f, "{str}")
    }
}

#[cfg(test)]
mod tests {
    use winnow::Parser;

    use super::{compare_point, parse_modifier, ExplodingKind, KeepKind, SortKind};
    use crate::parse::{ComparePoint, DiceKind, DiceModifier, Expression};

    /**
     * Parsing dice without modifiers
     */

    #[test]
    fn test_one_standard_d6() {
        let expression = Expression::parse("1d6").unwrap();

        let Expression::DiceStandard(qty, sides, mods) = expression else {
            panic!()
        };
        assert_eq!(*qty.unwrap(), Expression::Value(1.0));
        assert_eq!(*sides, Expression::Value(6.0));
        assert_eq!(mods, vec![]);
    }

    #[test]
    fn test_one_standard_d6_without_quantity() {
        let expression = Expression::parse("d6").unwrap();

        let Expression::DiceStandard(qty, sides, mods) = expression else {
            panic!()
        };
        assert!(qty.is_none());
        assert_eq!(*sides, Expression::Value(6.0));
        assert_eq!(mods, vec![]);
    }

    #[test]
    fn test_parenthesized_sides() {
        let expression = Expression::parse("1d(20+5)").unwrap();

        let Expression::DiceStandard(_, sides, _) = expression else {
            panic!()
        };
        assert!(matches!(*sides, Expression::Parens(_)));
    }

    #[test]
    fn test_one_percentile_dice() {
        let expression = Expression::parse("1d%").unwrap();

        let Expression::DicePercentile(qty, mods) = expression else {
            panic!()
        };
        assert_eq!(*qty.unwrap(), Expression::Value(1.0));
        assert_eq!(mods, vec![]);
    }

    #[test]
    fn test_one_standard_fudge_die() {
        for input in ["1dF", "1dF.2", "1df"] {
            let expression = Expression::parse(input).unwrap();

            let Expression::DiceFudge2(qty, mods) = expression else {
                panic!("{input} is not a fudge die")
            };
            assert_eq!(*qty.unwrap(), Expression::Value(1.0));
            assert_eq!(mods, vec![]);
        }
    }

    #[test]
    fn test_one_variant_fudge_die() {
        let expression = Expression::parse("1dF.1").unwrap();

        let Expression::DiceFudge1(qty, mods) = expression else {
            panic!()
        };
        assert_eq!(*qty.unwrap(), Expression::Value(1.0));
        assert_eq!(mods, vec![]);
    }

    /**
     * Parsing dice with modifiers
     */

    #[test]
    fn test_one_standard_d6_with_min_max_modifiers() {
        let expression = Expression::parse("d6max4min2").unwrap();

        let Expression::DiceStandard(qty, sides, mods) = expression else {
            panic!()
        };
        assert!(qty.is_none());
        assert_eq!(*sides, Expression::Value(6.0));
        // Parsed modifiers keep the input order so they print back the same way
        assert_eq!(mods, vec![DiceModifier::Max(4), DiceModifier::Min(2)]);
    }

    #[test]
    fn test_filter_sorts_and_keeps_last() {
        let filtered = DiceModifier::filter(&[
            DiceModifier::Sort(SortKind::Descending),
            DiceModifier::Min(5),
            DiceModifier::Keep(KeepKind::Highest, 2),
            DiceModifier::Min(3),
        ]);

        assert_eq!(
            filtered,
            vec![
                DiceModifier::Min(3),
                DiceModifier::Keep(KeepKind::Highest, 2),
                DiceModifier::Sort(SortKind::Descending),
            ]
        );
    }

    #[test]
    fn test_filter_target_failure_replaces_success() {
        let filtered = DiceModifier::filter(&[
            DiceModifier::TargetSuccess(ComparePoint::GreaterThan(3.0)),
            DiceModifier::TargetFailure(ComparePoint::GreaterThan(4.0), ComparePoint::Equal(1.0)),
        ]);

        assert_eq!(
            filtered,
            vec![DiceModifier::TargetFailure(
                ComparePoint::GreaterThan(4.0),
                ComparePoint::Equal(1.0)
            )]
        );
    }

    #[test]
    fn test_dice_new_clamps_quantity() {
        let dice = crate::parse::Dice::new(5000, DiceKind::Standard(6), &[]);
        assert_eq!(dice.quantity, 999);
        let dice = crate::parse::Dice::new(0, DiceKind::Standard(6), &[]);
        assert_eq!(dice.quantity, 1);
    }

    /**
     * Parsing modifiers alone
     */

    #[test]
    fn test_modifiers() {
        #[rustfmt::skip]
        let inputs = [
            ("min3", DiceModifier::Min(3)),
            ("max6", DiceModifier::Max(6)),
            ("!", DiceModifier::Exploding(ExplodingKind::Standard, None)),
            ("!<>8", DiceModifier::Exploding(ExplodingKind::Standard, Some(ComparePoint::NotEqual(8.0)))),
            ("!p", DiceModifier::Exploding(ExplodingKind::Penetrating, None)),
            ("!p<54", DiceModifier::Exploding(ExplodingKind::Penetrating, Some(ComparePoint::LessThan(54.0)))),
            ("!!", DiceModifier::Exploding(ExplodingKind::Compounding, None)),
            ("!!>67", DiceModifier::Exploding(ExplodingKind::Compounding, Some(ComparePoint::GreaterThan(67.0)))),
            ("!!p", DiceModifier::Exploding(ExplodingKind::PenetratingCompounding, None)),
            ("!!p>=7", DiceModifier::Exploding(ExplodingKind::PenetratingCompounding, Some(ComparePoint::GreaterThanOrEqual(7.0)))),
            ("r", DiceModifier::ReRoll(false, None)),
            ("r=6", DiceModifier::ReRoll(false, Some(ComparePoint::Equal(6.0)))),
            ("ro", DiceModifier::ReRoll(true, None)),
            ("ro<3", DiceModifier::ReRoll(true, Some(ComparePoint::LessThan(3.0)))),
            ("u", DiceModifier::Unique(false, None)),
            ("u=5", DiceModifier::Unique(false, Some(ComparePoint::Equal(5.0)))),
            ("uo", DiceModifier::Unique(true, None)),
            ("uo>6", DiceModifier::Unique(true, Some(ComparePoint::GreaterThan(6.0)))),
            ("k2", DiceModifier::Keep(KeepKind::Highest, 2)),
            ("kh3", DiceModifier::Keep(KeepKind::Highest, 3)),
            ("kl4", DiceModifier::Keep(KeepKind::Lowest, 4)),
            ("d2", DiceModifier::Drop(KeepKind::Lowest, 2)),
            ("dh3", DiceModifier::Drop(KeepKind::Highest, 3)),
            ("dl4", DiceModifier::Drop(KeepKind::Lowest, 4)),
            ("cs", DiceModifier::CriticalSuccess(None)),
            ("cs<=5", DiceModifier::CriticalSuccess(Some(ComparePoint::LessThanOrEqual(5.0)))),
            ("cf", DiceModifier::CriticalFailure(None)),
            ("cf>=1", DiceModifier::CriticalFailure(Some(ComparePoint::GreaterThanOrEqual(1.0)))),
            ("s", DiceModifier::Sort(SortKind::Ascending)),
            ("sa", DiceModifier::Sort(SortKind::Ascending)),
            ("sd", DiceModifier::Sort(SortKind::Descending)),
            (">3", DiceModifier::TargetSuccess(ComparePoint::GreaterThan(3.0))),
            (">3f=1", DiceModifier::TargetFailure(ComparePoint::GreaterThan(3.0), ComparePoint::Equal(1.0))),
        ];

        for (input, expected) in inputs {
            assert_eq!(parse_modifier.parse(input).unwrap(), expected, "{input}");
        }
    }

    #[test]
    fn test_modifiers_missing_amount() {
        for input in ["min", "maxa", "k", "kh", "kl", "dh", "dl"] {
            assert!(parse_modifier.parse(input).is_err(), "{input}");
        }
    }

    /**
     * Parsing compare points alone
     */

    #[test]
    fn test_compare_points() {
        #[rustfmt::skip]
        let inputs = [
            ("=3", ComparePoint::Equal(3.0)),
            ("==3", ComparePoint::Equal(3.0)),
            ("<>69", ComparePoint::NotEqual(69.0)),
            ("!=69", ComparePoint::NotEqual(69.0)),
            ("<123", ComparePoint::LessThan(123.0)),
            (">123", ComparePoint::GreaterThan(123.0)),
            ("<=123", ComparePoint::LessThanOrEqual(123.0)),
            (">=456", ComparePoint::GreaterThanOrEqual(456.0)),
            (">-2", ComparePoint::GreaterThan(-2.0)),
            (">=2.5", ComparePoint::GreaterThanOrEqual(2.5)),
        ];

        for (input, expected) in inputs {
            assert_eq!(compare_point.parse(input).unwrap(), expected, "{input}");
        }
    }
}
