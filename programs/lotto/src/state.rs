use anchor_lang::prelude::*;

use crate::constants::NUMBERS_PER_TICKET;
use crate::errors::LottoError;
use crate::ledger::PrizeLedger;
use crate::registry::{validate_numbers, Entrant, EntryRegistry};

/// Global lottery configuration, stored as a singleton PDA.
///
/// Seeds: `["lotto-config"]`
///
/// Written once by `initialize`. Only `admin` may withdraw fees.
#[account]
#[derive(InitSpace)]
pub struct LotteryConfig {
    /// Key allowed to drain the fee pool.
    pub admin: Pubkey,
    /// VRF coordinator program that serves randomness requests.
    pub coordinator_program: Pubkey,
    /// Coordinator PDA that signs `fulfill_random_words` callbacks.
    pub coordinator_authority: Pubkey,
    /// Oracle key hash, mixed into every request seed.
    pub key_hash: [u8; 32],
    /// Coordinator subscription charged for requests.
    pub subscription_id: u64,
    /// Confirmations the oracle is expected to wait. Not sent to the coordinator.
    pub request_confirmations: u16,
    /// Compute budget granted to the fulfillment callback.
    pub callback_compute_limit: u32,
    /// Pyth price account quoting the native unit in fiat.
    pub price_feed: Pubkey,
    /// Program expected to own `price_feed`.
    pub price_feed_owner: Pubkey,
    /// Oldest acceptable price, in seconds.
    pub max_price_age: i64,
    /// Ticket price in fiat, scaled by 10^9.
    pub ticket_price_usd: u64,
    /// Protocol fee withheld from each entry, in parts per thousand.
    pub fee_per_mille: u16,
    /// Minimum seconds between draws.
    pub interval: i64,
    /// PDA bump seed cached for efficient re-derivation.
    pub bump: u8,
}

/// Lifecycle of the round.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq, InitSpace)]
pub enum RoundPhase {
    /// Accepting tickets.
    Open,
    /// Waiting for the coordinator to deliver random words.
    Drawing,
}

/// The lottery round, reset in place after every draw.
///
/// Seeds: `["round"]`
///
/// Also the pot: entry lamports are transferred to this account and winners
/// are paid out of it.
#[account]
#[derive(InitSpace)]
pub struct Round {
    /// Increments at every reset, starting at 1.
    pub round_id: u64,
    /// `Open` while accepting tickets, `Drawing` while a request is in flight.
    pub phase: RoundPhase,
    /// Unix time of the last reset (or of initialization).
    pub last_draw_timestamp: i64,
    /// Unix time the in-flight draw was requested; 0 while open.
    pub draw_requested_at: i64,
    /// Coordinator request id of the in-flight draw.
    pub pending_request: Option<u64>,
    /// Prize and fee pools backed by this account's lamports.
    pub ledger: PrizeLedger,
    /// Tickets of the current round and the registered-flag set.
    pub registry: EntryRegistry,
    /// Last winner paid, in entrant order.
    pub last_winner: Option<Pubkey>,
    /// Share paid to each winner of the last winning draw.
    pub last_payout: u64,
    /// Numbers of the last settled draw, winning or not.
    pub last_winning_numbers: [u8; NUMBERS_PER_TICKET],
    /// PDA bump seed cached for efficient re-derivation.
    pub bump: u8,
}

impl Round {
    /// Fresh round state, open for tickets from `now`.
    pub fn open(now: i64, bump: u8) -> Self {
        Self {
            round_id: 1,
            phase: RoundPhase::Open,
            last_draw_timestamp: now,
            draw_requested_at: 0,
            pending_request: None,
            ledger: PrizeLedger::default(),
            registry: EntryRegistry::default(),
            last_winner: None,
            last_payout: 0,
            last_winning_numbers: [0; NUMBERS_PER_TICKET],
            bump,
        }
    }

    /// Register a ticket for `player` and account for the lamports paid.
    ///
    /// Preconditions are checked in a fixed order, each with its own error:
    /// phase, duplicate, value, ticket length, number range.
    pub fn register(
        &mut self,
        player: Pubkey,
        numbers: &[u8],
        paid: u64,
        ticket_price: u64,
        fee_per_mille: u16,
    ) -> Result<[u8; NUMBERS_PER_TICKET]> {
        require!(self.phase == RoundPhase::Open, LottoError::RoundNotOpen);
        require!(
            !self.registry.is_registered(&player),
            LottoError::AlreadyRegistered
        );
        require!(paid >= ticket_price, LottoError::InsufficientEntryValue);
        let numbers = validate_numbers(numbers)?;

        self.registry.register(player, numbers)?;
        self.ledger.deposit(paid, fee_per_mille)?;
        Ok(numbers)
    }

    /// Move an open round into `Drawing` for `request_id`.
    pub fn begin_draw(&mut self, request_id: u64, now: i64) -> Result<()> {
        require!(self.phase == RoundPhase::Open, LottoError::RoundNotOpen);
        self.phase = RoundPhase::Drawing;
        self.pending_request = Some(request_id);
        self.draw_requested_at = now;
        Ok(())
    }

    pub fn is_registered(&self, player: &Pubkey) -> bool {
        self.registry.is_registered(player)
    }

    pub fn entrant_count(&self) -> usize {
        self.registry.len()
    }

    pub fn entrant_at(&self, index: usize) -> Option<&Entrant> {
        self.registry.get(index)
    }

    /// Seconds the current draw has been waiting for fulfillment.
    pub fn draw_pending_for(&self, now: i64) -> Option<i64> {
        match self.phase {
            RoundPhase::Drawing => Some(now.saturating_sub(self.draw_requested_at)),
            RoundPhase::Open => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRICE: u64 = 10_000_000;
    const TICKET: [u8; 6] = [1, 2, 3, 4, 5, 6];

    #[test]
    fn registers_each_player_once_per_round() {
        let mut round = Round::open(0, 255);
        let player = Pubkey::new_unique();

        round.register(player, &TICKET, PRICE, PRICE, 50).unwrap();
        assert!(round.is_registered(&player));
        assert_eq!(round.entrant_count(), 1);

        let err = round.register(player, &TICKET, PRICE, PRICE, 50).unwrap_err();
        assert_eq!(err, LottoError::AlreadyRegistered.into());
        assert_eq!(round.entrant_count(), 1);
    }

    #[test]
    fn registration_forwards_value_to_ledger() {
        let mut round = Round::open(0, 255);
        round
            .register(Pubkey::new_unique(), &TICKET, 2 * PRICE, PRICE, 100)
            .unwrap();
        assert_eq!(round.ledger.fee_pool, 2_000_000);
        assert_eq!(round.ledger.prize_pool, 18_000_000);
    }

    #[test]
    fn rejects_insufficient_value() {
        let mut round = Round::open(0, 255);
        let err = round
            .register(Pubkey::new_unique(), &TICKET, PRICE - 1, PRICE, 50)
            .unwrap_err();
        assert_eq!(err, LottoError::InsufficientEntryValue.into());
        assert_eq!(round.ledger, PrizeLedger::default());
    }

    #[test]
    fn rejects_malformed_tickets_without_mutation() {
        let mut round = Round::open(0, 255);
        let cases: [(&[u8], LottoError); 6] = [
            (&[1, 2, 3, 4, 5], LottoError::InvalidPredictionLength),
            (&[1, 2, 3, 4, 5, 6, 7], LottoError::InvalidPredictionLength),
            (&[0, 2, 3, 4, 5, 6], LottoError::NumberOutOfRange),
            (&[1, 2, 3, 4, 5, 51], LottoError::NumberOutOfRange),
            (&[], LottoError::InvalidPredictionLength),
            (&[51, 51, 51, 51, 51, 51], LottoError::NumberOutOfRange),
        ];
        for (numbers, expected) in cases {
            let player = Pubkey::new_unique();
            let err = round.register(player, numbers, PRICE, PRICE, 50).unwrap_err();
            assert_eq!(err, expected.into());
            assert!(!round.is_registered(&player));
        }
        assert_eq!(round.entrant_count(), 0);
        assert_eq!(round.ledger.total(), 0);

        round
            .register(Pubkey::new_unique(), &[1, 50, 1, 50, 1, 50], PRICE, PRICE, 50)
            .unwrap();
    }

    #[test]
    fn preconditions_are_checked_in_order() {
        let mut round = Round::open(0, 255);
        let player = Pubkey::new_unique();
        round.register(player, &TICKET, PRICE, PRICE, 50).unwrap();

        // Duplicate wins over underpayment and a malformed ticket.
        let err = round.register(player, &[0], 0, PRICE, 50).unwrap_err();
        assert_eq!(err, LottoError::AlreadyRegistered.into());

        // Underpayment wins over a malformed ticket.
        let err = round
            .register(Pubkey::new_unique(), &[0], 0, PRICE, 50)
            .unwrap_err();
        assert_eq!(err, LottoError::InsufficientEntryValue.into());

        // Phase wins over everything.
        round.begin_draw(7, 100).unwrap();
        let err = round.register(player, &[0], 0, PRICE, 50).unwrap_err();
        assert_eq!(err, LottoError::RoundNotOpen.into());
    }

    #[test]
    fn begin_draw_is_single_flight() {
        let mut round = Round::open(0, 255);
        round.begin_draw(3, 100).unwrap();
        assert_eq!(round.phase, RoundPhase::Drawing);
        assert_eq!(round.pending_request, Some(3));
        assert_eq!(round.draw_pending_for(160), Some(60));

        let err = round.begin_draw(4, 101).unwrap_err();
        assert_eq!(err, LottoError::RoundNotOpen.into());
        assert_eq!(round.pending_request, Some(3));
    }

    #[test]
    fn open_round_has_no_pending_draw() {
        let round = Round::open(42, 1);
        assert_eq!(round.round_id, 1);
        assert_eq!(round.last_draw_timestamp, 42);
        assert_eq!(round.draw_pending_for(1_000), None);
        assert!(round.entrant_at(0).is_none());
    }
}
