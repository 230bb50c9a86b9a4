use rand::Rng;

use crate::{
    error::NotationError,
    parse::{DiceModifier, Expression, SortKind},
};

use super::{
    dice_roll::apply_output_modifier,
    expression::RolledExpression,
    roll::{kept_value, Roll, RollOutputKind},
};

/// A rolled `{a, b, ...}` group.
///
/// A group with a single expression is a dice pool: its modifiers flag the
/// dice inside the expression. With more expressions the modifiers flag the
/// expressions themselves, each one standing as a roll of its total.
#[derive(Debug, Clone)]
pub struct GroupOutput {
    pub(crate) items: Vec<RolledExpression>,
    pub(crate) item_rolls: Vec<Roll>,
    pub(crate) kind: RollOutputKind,
}

pub(crate) fn roll_group<R: Rng + ?Sized>(
    exprs: &[Expression],
    modifiers: &[DiceModifier],
    sort: Option<SortKind>,
    rng: &mut R,
) -> Result<GroupOutput, NotationError> {
    let mut items = exprs
        .iter()
        .map(|expr| expr.roll_sorted(sort, rng))
        .collect::<Result<Vec<_>, _>>()?;
    let modifiers = DiceModifier::filter(modifiers);
    let kind = RollOutputKind::from_modifiers(&modifiers);

    if items.len() == 1 {
        apply_pool_modifiers(&mut items[0], &modifiers);
        return Ok(GroupOutput {
            items,
            item_rolls: Vec::new(),
            kind,
        });
    }

    let mut item_rolls: Vec<Roll> = items
        .iter()
        .map(|item| Roll::new(item.value().round() as i32))
        .collect();

    for modifier in &modifiers {
        match *modifier {
            DiceModifier::Sort(sort_kind) => sort_items(&mut items, &mut item_rolls, sort_kind),
            modifier => apply_output_modifier(None, modifier, &mut item_rolls),
        }
    }

    Ok(GroupOutput {
        items,
        item_rolls,
        kind,
    })
}

fn apply_pool_modifiers(item: &mut RolledExpression, modifiers: &[DiceModifier]) {
    for modifier in modifiers {
        match *modifier {
            // sorting happens inside each dice term, the pool has no order of its own
            DiceModifier::Sort(_) => item.for_each_output_mut(&mut |output| {
                apply_output_modifier(None, *modifier, &mut output.rolls)
            }),
            modifier => apply_output_modifier(None, modifier, &mut item.rolls_mut()),
        }
    }
}

fn sort_items(items: &mut Vec<RolledExpression>, item_rolls: &mut Vec<Roll>, sort_kind: SortKind) {
    let mut order: Vec<usize> = (0..items.len()).collect();
    match sort_kind {
        SortKind::Ascending => order.sort_by(|&a, &b| item_rolls[a].cmp(&item_rolls[b])),
        SortKind::Descending => order.sort_by(|&a, &b| item_rolls[b].cmp(&item_rolls[a])),
    }

    let mut slots: Vec<Option<RolledExpression>> = items.drain(..).map(Some).collect();
    *items = order.iter().filter_map(|&i| slots[i].take()).collect();
    *item_rolls = order.iter().map(|&i| item_rolls[i]).collect();
}

impl GroupOutput {
    fn is_pool(&self) -> bool {
        self.item_rolls.is_empty()
    }

    pub fn value(&self) -> f64 {
        if self.is_pool() {
            let Some(item) = self.items.first() else {
                return 0.0;
            };
            return match self.kind {
                RollOutputKind::Sum => item.value(),
                kind => kept_value(&item.rolls(), kind),
            };
        }

        match self.kind {
            RollOutputKind::Sum => self
                .items
                .iter()
                .zip(&self.item_rolls)
                .filter(|(_, roll)| !roll.is_dropped())
                .map(|(item, _)| item.value())
                .sum(),
            kind => kept_value(&self.item_rolls, kind),
        }
    }
}

impl std::fmt::Display for GroupOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let items = if self.is_pool() {
            self.items
                .iter()
                .map(|item| item.to_string())
                .collect::<Vec<_>>()
        } else {
            self.items
                .iter()
                .zip(&self.item_rolls)
                .map(|(item, roll)| format!("{item}{}", roll.notation()))
                .collect::<Vec<_>>()
        };

        write!(f, "{{{}}}", items.join(", "))
    }
}
