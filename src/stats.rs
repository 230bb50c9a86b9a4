use std::collections::BTreeMap;

use crate::{
    error::DiceError,
    notation::normalize::{clean_signs, inline_formulas, outside_brackets, standardize},
};

/// Replaces character statistics by their value in a notation.
///
/// Names are matched without case or accents, `Dextérité` matches
/// `dexterite`, and longer names are replaced first so `strength` is never
/// cut by `str`. Comments in `[...]` are left alone. `$` stands for
/// `placeholder` when one is given, then `{{...}}` formulas are computed.
///
/// ```rust
/// # use std::collections::BTreeMap;
/// # use rpg_dice_parser::substitute_statistics;
/// let stats = BTreeMap::from([("Force".to_owned(), 14.0)]);
/// let notation = substitute_statistics("1d20+{{ceil((force-10)/2)}}", &stats, None)?;
/// assert_eq!(notation, "1d20+2");
/// # Ok::<(), rpg_dice_parser::DiceError>(())
/// ```
pub fn substitute_statistics(
    notation: &str,
    stats: &BTreeMap<String, f64>,
    placeholder: Option<&str>,
) -> Result<String, DiceError> {
    let mut names: Vec<(String, String)> = stats
        .iter()
        .map(|(name, value)| (standardize(name.trim()), value.to_string()))
        .filter(|(name, _)| !name.is_empty())
        .collect();
    names.sort_by(|(a, _), (b, _)| b.chars().count().cmp(&a.chars().count()));

    let dice = outside_brackets(&standardize(notation), |text| {
        let mut text = names
            .iter()
            .fold(text.to_owned(), |text, (name, value)| text.replace(name, value));
        if let Some(placeholder) = placeholder {
            text = text.replace('$', placeholder);
        }
        text
    });

    let dice = inline_formulas(&dice, "substitute_statistics")?;
    Ok(outside_brackets(&dice, clean_signs).trim().to_owned())
}
