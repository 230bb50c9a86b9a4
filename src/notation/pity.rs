use rand::Rng;
use tracing::debug;

use crate::{error::DiceError, PITY_MAX_REROLLS};

use super::{ComparedValue, RollResult, Roller};

impl<R: Rng + ?Sized> Roller<'_, R> {
    /// Rerolls a failed comparison until it succeeds, at most
    /// [PITY_MAX_REROLLS] times.
    ///
    /// Returns how many rerolls were made and the last reroll, `None` when the
    /// first roll stands: it succeeded or no roll could ever succeed.
    pub(crate) fn apply_pity(
        &mut self,
        notation: &str,
        compare: &ComparedValue,
        total: f64,
        (min, max): (f64, f64),
    ) -> Result<(u32, Option<RollResult>), DiceError> {
        if !compare.sign.can_succeed(min, max, compare.value) {
            debug!(notation, "comparison can't succeed, no pity");
            return Ok((0, None));
        }
        if compare.matches(total) {
            return Ok((0, None));
        }

        let mut rerolls = 0;
        let mut last = None;
        while rerolls < PITY_MAX_REROLLS {
            let rerolled = self.nested(notation, false)?;
            rerolls += 1;

            let success = rerolled.as_ref().is_some_and(|r| compare.matches(r.total));
            last = rerolled;
            if success {
                break;
            }
        }

        debug!(notation, rerolls, "pity rerolls");
        Ok((rerolls, last))
    }
}
