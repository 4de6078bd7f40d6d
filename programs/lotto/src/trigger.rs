use anchor_lang::prelude::*;

use crate::state::{Round, RoundPhase};

/// Result of evaluating the draw trigger against a round.
///
/// Each condition is kept separately so a refused upkeep can report which one
/// failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UpkeepCheck {
    pub interval_elapsed: bool,
    pub is_open: bool,
    pub has_balance: bool,
    pub has_entrants: bool,
    pub balance: u64,
    pub entrant_count: usize,
    pub phase: RoundPhase,
}

impl UpkeepCheck {
    /// Evaluate the trigger. Pure; safe to call at any time.
    pub fn evaluate(round: &Round, interval: i64, now: i64) -> Self {
        let balance = round.ledger.total();
        let entrant_count = round.entrant_count();
        Self {
            interval_elapsed: now.saturating_sub(round.last_draw_timestamp) >= interval,
            is_open: round.phase == RoundPhase::Open,
            has_balance: balance > 0,
            has_entrants: entrant_count > 0,
            balance,
            entrant_count,
            phase: round.phase,
        }
    }

    /// A draw may be requested only when all four conditions hold.
    pub fn needed(&self) -> bool {
        self.interval_elapsed && self.is_open && self.has_balance && self.has_entrants
    }

    /// Write the observed state to the program log.
    pub fn log(&self) {
        msg!(
            "upkeep needed={} balance={} entrants={} phase={:?} interval_elapsed={}",
            self.needed(),
            self.balance,
            self.entrant_count,
            self.phase,
            self.interval_elapsed
        );
    }
}
