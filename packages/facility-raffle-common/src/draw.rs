use std::collections::HashSet;

use cosmwasm_std::{Decimal, Fraction, Uint128};
use thiserror::Error;

use crate::randomness::RandomSource;
use crate::types::{DrawResult, Entry};

#[derive(Error, Debug, PartialEq)]
pub enum DrawError {
    #[error("no eligible entries: every entry has zero weight or the pool is empty")]
    NoEligibleEntries,

    #[error("entry {id} has negative weight {weight}")]
    InvalidWeight { id: u64, weight: i64 },

    #[error("entry {id} appears more than once in the pool")]
    DuplicateEntry { id: u64 },

    #[error("prize amount must be non-zero")]
    ZeroPrize,
}

/// Number of winners for a pool of `eligible` entries.
///
/// `max(1, floor(eligible * winner_fraction))`, clamped to `eligible`.
/// Returns 0 only for an empty pool.
pub fn winner_count(eligible: usize, winner_fraction: Decimal) -> usize {
    if eligible == 0 {
        return 0;
    }
    let scaled = Uint128::from(eligible as u128)
        .checked_multiply_ratio(winner_fraction.numerator(), winner_fraction.denominator())
        .map(|v| v.u128())
        .unwrap_or(u128::MAX);
    let k = usize::try_from(scaled).unwrap_or(usize::MAX).max(1);
    k.min(eligible)
}

/// Win chance of a single draw in basis points, truncated.
pub fn win_chance_bps(weight: u64, total_weight: u128) -> u32 {
    if total_weight == 0 {
        return 0;
    }
    let bps = (weight as u128).saturating_mul(10_000) / total_weight;
    bps.min(10_000) as u32
}

/// Working state for one engine invocation.
struct DrawRun {
    /// (entry id, weight), positive weights only
    pool: Vec<(u64, u64)>,
    winners: Vec<DrawResult>,
}

impl DrawRun {
    fn total_weight(&self) -> u128 {
        self.pool.iter().map(|&(_, w)| w as u128).sum()
    }

    /// Pick one entry proportionally to its weight and remove it from the pool.
    fn pick<R: RandomSource + ?Sized>(&mut self, rng: &mut R) -> (u64, u64) {
        let total = self.total_weight();
        let ticket = rng.next_below(total);

        let mut cumulative: u128 = 0;
        let index = self
            .pool
            .iter()
            .position(|&(_, weight)| {
                cumulative += weight as u128;
                ticket < cumulative
            })
            // Only reachable if the source hands back a value >= total
            .unwrap_or(self.pool.len() - 1);

        self.pool.remove(index)
    }
}

/// Select winners without replacement.
///
/// At every step an entry is chosen with probability
/// `weight / sum(remaining weights)` and then removed from the pool. Entries
/// with zero weight are dropped before sampling so they neither win nor
/// shift anyone else's odds. Results are in selection order.
pub fn select_winners<R: RandomSource + ?Sized>(
    entries: &[Entry],
    winner_fraction: Decimal,
    prize_amount: Uint128,
    rng: &mut R,
) -> Result<Vec<DrawResult>, DrawError> {
    if prize_amount.is_zero() {
        return Err(DrawError::ZeroPrize);
    }

    let mut seen = HashSet::with_capacity(entries.len());
    for entry in entries {
        if entry.weight < 0 {
            return Err(DrawError::InvalidWeight {
                id: entry.id,
                weight: entry.weight,
            });
        }
        if !seen.insert(entry.id) {
            return Err(DrawError::DuplicateEntry { id: entry.id });
        }
    }

    let pool: Vec<(u64, u64)> = entries
        .iter()
        .filter(|e| e.weight > 0)
        .map(|e| (e.id, e.weight as u64))
        .collect();
    if pool.is_empty() {
        return Err(DrawError::NoEligibleEntries);
    }

    let k = winner_count(pool.len(), winner_fraction);
    let mut run = DrawRun {
        pool,
        winners: Vec::with_capacity(k),
    };

    for _ in 0..k {
        let (entry_id, weight) = run.pick(rng);
        run.winners.push(DrawResult {
            entry_id,
            weight_at_selection: weight,
            prize_amount,
        });
    }

    Ok(run.winners)
}
