use winnow::{
    combinator::{alt, opt, preceded},
    PResult, Parser,
};

use crate::parse::number;

use super::CompareSign;

/// `2d6!>>4`: the dice explode on their highest face and every die above 4
/// counts as a success. The doubled sign is what tells it apart from an
/// exploding compare point.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ExplodingSuccess {
    pub(crate) sign: CompareSign,
    pub(crate) value: f64,
    /// The text that was matched, `!>>4`.
    pub(crate) segment: String,
}

pub(crate) fn extract_exploding(dice: &str) -> Option<ExplodingSuccess> {
    dice.match_indices('!').find_map(|(start, _)| {
        let mut input = &dice[start..];
        let sign = exploding_sign.parse_next(&mut input).ok()?;
        let value = signed_number.parse_next(&mut input).ok()?;
        let end = dice.len() - input.len();

        Some(ExplodingSuccess {
            sign,
            value,
            segment: dice[start..end].to_owned(),
        })
    })
}

fn exploding_sign(input: &mut &str) -> PResult<CompareSign> {
    preceded(
        '!',
        alt((
            ">>=".value(CompareSign::GreaterEqual),
            "<<=".value(CompareSign::LessEqual),
            // `!!==`
            "!==".value(CompareSign::Equal),
            ">>".value(CompareSign::Greater),
            "<<".value(CompareSign::Less),
            // `!==`
            "==".value(CompareSign::NotEqual),
        )),
    )
    .parse_next(input)
}

fn signed_number(input: &mut &str) -> PResult<f64> {
    (opt('-'), number)
        .take()
        .try_map(str::parse::<f64>)
        .parse_next(input)
}

impl ExplodingSuccess {
    /// The notation handed to the die roller, which explodes on the highest face.
    pub(crate) fn for_roller(&self, dice: &str) -> String {
        dice.replacen(&self.segment, "!", 1)
    }

    /// Every die rolled, explosions included, that passes the comparison.
    pub(crate) fn count(&self, faces: &[Vec<i32>]) -> u32 {
        faces
            .iter()
            .flatten()
            .filter(|&&face| self.sign.matches(face as f64, self.value))
            .count() as u32
    }
}
