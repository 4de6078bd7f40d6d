//! Counters and the last observed round, served on `/status`.
//!
//! Counters are atomics; the round snapshot sits behind a mutex since it is
//! replaced wholesale on every poll.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::accounts::{Phase, RoundView};

/// What `/status` reports about the round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundSnapshot {
    pub round_id: u64,
    pub phase: Phase,
    pub entrant_count: usize,
    pub prize_pool: u64,
    pub fee_pool: u64,
    pub last_draw_timestamp: i64,
    pub pending_request: Option<u64>,
    /// Seconds the in-flight draw has been waiting, if any.
    pub draw_pending_secs: Option<i64>,
    /// The draw has waited longer than the configured threshold.
    pub unresolved: bool,
    pub last_winner: Option<String>,
    pub last_payout: u64,
    pub last_winning_numbers: [u8; 6],
}

impl RoundSnapshot {
    pub fn observe(round: &RoundView, now: i64, unresolved_after_secs: i64) -> Self {
        Self {
            round_id: round.round_id,
            phase: round.phase,
            entrant_count: round.entrants.len(),
            prize_pool: round.prize_pool,
            fee_pool: round.fee_pool,
            last_draw_timestamp: round.last_draw_timestamp,
            pending_request: round.pending_request,
            draw_pending_secs: round.draw_pending_for(now),
            unresolved: round.is_unresolved(now, unresolved_after_secs),
            last_winner: round.last_winner.map(|w| w.to_string()),
            last_payout: round.last_payout,
            last_winning_numbers: round.last_winning_numbers,
        }
    }
}

#[derive(Default)]
pub struct Metrics {
    /// `perform_upkeep` transactions confirmed.
    pub upkeeps_performed: AtomicU64,
    /// Attempts the program refused because the trigger no longer held.
    pub upkeeps_not_needed: AtomicU64,
    /// Attempts that failed for any other reason.
    pub upkeeps_failed: AtomicU64,
    /// Lottery events received from the log stream.
    pub events_received: AtomicU64,
    pub draws_settled: AtomicU64,
    round: Mutex<Option<RoundSnapshot>>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_upkeep(&self) {
        self.upkeeps_performed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_not_needed(&self) {
        self.upkeeps_not_needed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.upkeeps_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_event(&self) {
        self.events_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_settlement(&self) {
        self.draws_settled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn set_round(&self, snapshot: RoundSnapshot) {
        if let Ok(mut round) = self.round.lock() {
            *round = Some(snapshot);
        }
    }

    pub fn round(&self) -> Option<RoundSnapshot> {
        self.round.lock().ok().and_then(|round| round.clone())
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "upkeeps_performed": self.upkeeps_performed.load(Ordering::Relaxed),
            "upkeeps_not_needed": self.upkeeps_not_needed.load(Ordering::Relaxed),
            "upkeeps_failed": self.upkeeps_failed.load(Ordering::Relaxed),
            "events_received": self.events_received.load(Ordering::Relaxed),
            "draws_settled": self.draws_settled.load(Ordering::Relaxed),
            "round": self.round(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drawing_round() -> RoundView {
        RoundView {
            round_id: 4,
            phase: Phase::Drawing,
            last_draw_timestamp: 100,
            draw_requested_at: 1_000,
            pending_request: Some(8),
            prize_pool: 500,
            fee_pool: 20,
            entrants: Vec::new(),
            last_winner: None,
            last_payout: 0,
            last_winning_numbers: [0; 6],
        }
    }

    #[test]
    fn snapshot_flags_unresolved_draws() {
        let round = drawing_round();
        let fresh = RoundSnapshot::observe(&round, 1_100, 600);
        assert_eq!(fresh.draw_pending_secs, Some(100));
        assert!(!fresh.unresolved);

        let stuck = RoundSnapshot::observe(&round, 1_700, 600);
        assert!(stuck.unresolved);
    }

    #[test]
    fn status_json_includes_counters_and_round() {
        let metrics = Metrics::new();
        metrics.record_upkeep();
        metrics.record_not_needed();
        metrics.record_not_needed();
        assert_eq!(metrics.to_json()["round"], serde_json::Value::Null);

        metrics.set_round(RoundSnapshot::observe(&drawing_round(), 1_000, 600));
        let json = metrics.to_json();
        assert_eq!(json["upkeeps_performed"], 1);
        assert_eq!(json["upkeeps_not_needed"], 2);
        assert_eq!(json["round"]["phase"], "drawing");
        assert_eq!(json["round"]["pending_request"], 8);
    }
}
