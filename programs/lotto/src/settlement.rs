//! Draw settlement: random words → winning numbers → winners → reset.
//!
//! Everything here is pure state manipulation on [`Round`]. Lamport movement
//! for payouts happens in the `fulfill_random_words` instruction, which runs
//! inside the same transaction so a failed payout rolls all of this back.

use anchor_lang::prelude::*;

use crate::constants::{DRAW_MODULUS, NUMBERS_PER_TICKET, REQUIRED_MATCHES};
use crate::errors::LottoError;
use crate::state::{Round, RoundPhase};

/// Result of settling one draw.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DrawOutcome {
    pub round_id: u64,
    pub request_id: u64,
    pub winning_numbers: [u8; NUMBERS_PER_TICKET],
    /// Winners in entrant order.
    pub winners: Vec<Pubkey>,
    /// Lamports owed to each winner.
    pub share: u64,
    /// Prize pool carried into the next round.
    pub rollover: u64,
}

impl DrawOutcome {
    pub fn total_paid(&self) -> u64 {
        self.share.saturating_mul(self.winners.len() as u64)
    }
}

/// Map one 32-byte random word to a drawn number in `1..=49`.
///
/// The word is read as an unsigned little-endian 256-bit integer and reduced
/// modulo 49 over the whole width.
pub fn word_to_number(word: &[u8; 32]) -> u8 {
    let modulus = DRAW_MODULUS as u32;
    let rem = word
        .iter()
        .rev()
        .fold(0u32, |acc, byte| (acc * 256 + *byte as u32) % modulus);
    rem as u8 + 1
}

/// Normalize the coordinator's words into the winning set.
pub fn winning_numbers(random_words: &[[u8; 32]]) -> Result<[u8; NUMBERS_PER_TICKET]> {
    require!(
        random_words.len() == NUMBERS_PER_TICKET,
        LottoError::InvalidRandomWords
    );
    let mut numbers = [0u8; NUMBERS_PER_TICKET];
    for (slot, word) in numbers.iter_mut().zip(random_words) {
        *slot = word_to_number(word);
    }
    Ok(numbers)
}

/// Count `(j, k)` pairs with `ticket[j] == winning[k]`.
///
/// This is a cross-product count, not a set intersection: repeated values on
/// either side count once per pairing.
pub fn count_matches(
    ticket: &[u8; NUMBERS_PER_TICKET],
    winning: &[u8; NUMBERS_PER_TICKET],
) -> u8 {
    ticket
        .iter()
        .map(|n| winning.iter().filter(|w| *w == n).count() as u8)
        .sum()
}

impl Round {
    /// Settle the in-flight draw and reset the round.
    ///
    /// Scans every entrant, lowering each registered flag whatever the outcome.
    /// With winners the prize pool is split evenly and both pools are zeroed;
    /// without winners the prize pool rolls over.
    pub fn settle(
        &mut self,
        request_id: u64,
        winning: [u8; NUMBERS_PER_TICKET],
        now: i64,
    ) -> Result<DrawOutcome> {
        require!(self.phase == RoundPhase::Drawing, LottoError::RoundNotDrawing);
        require!(
            self.pending_request == Some(request_id),
            LottoError::RequestMismatch
        );

        let entrants = self.registry.entrants().to_vec();
        let mut winners = Vec::new();
        for entrant in &entrants {
            if count_matches(&entrant.numbers, &winning) >= REQUIRED_MATCHES {
                winners.push(entrant.player);
            }
            self.registry.clear_flag(&entrant.player);
        }

        let (share, rollover) = if winners.is_empty() {
            (0, self.ledger.prize_pool)
        } else {
            let share = self.ledger.split_pool(winners.len())?;
            self.last_winner = winners.last().copied();
            self.last_payout = share;
            self.ledger.reset();
            (share, 0)
        };

        let round_id = self.round_id;
        self.last_winning_numbers = winning;
        self.last_draw_timestamp = now;
        self.registry.clear_entrants();
        self.phase = RoundPhase::Open;
        self.pending_request = None;
        self.draw_requested_at = 0;
        self.round_id = round_id.checked_add(1).ok_or(LottoError::MathOverflow)?;

        Ok(DrawOutcome {
            round_id,
            request_id,
            winning_numbers: winning,
            winners,
            share,
            rollover,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRICE: u64 = 1_000;
    const FEE_PER_MILLE: u16 = 50;
    const WINNING: [u8; 6] = [1, 2, 3, 4, 5, 6];

    fn word(value: u64) -> [u8; 32] {
        let mut word = [0u8; 32];
        word[..8].copy_from_slice(&value.to_le_bytes());
        word
    }

    fn round_with(tickets: &[[u8; 6]]) -> (Round, Vec<Pubkey>) {
        let mut round = Round::open(0, 255);
        let players: Vec<Pubkey> = tickets.iter().map(|_| Pubkey::new_unique()).collect();
        for (player, ticket) in players.iter().zip(tickets) {
            round
                .register(*player, ticket, PRICE, PRICE, FEE_PER_MILLE)
                .unwrap();
        }
        (round, players)
    }

    #[test]
    fn word_reduces_over_full_width() {
        assert_eq!(word_to_number(&word(0)), 1);
        assert_eq!(word_to_number(&word(48)), 49);
        assert_eq!(word_to_number(&word(49)), 1);
        assert_eq!(word_to_number(&word(100)), 3);
        assert_eq!(word_to_number(&word(u64::MAX)), (u64::MAX % 49) as u8 + 1);

        // 2^248 mod 49 = 46
        let mut high = [0u8; 32];
        high[31] = 1;
        assert_eq!(word_to_number(&high), 47);

        // (2^256 - 1) mod 49 = 15
        assert_eq!(word_to_number(&[0xff; 32]), 16);
    }

    #[test]
    fn fifty_is_never_drawn() {
        for value in 0..1_000u64 {
            let n = word_to_number(&word(value));
            assert!((1..=49).contains(&n));
        }
    }

    #[test]
    fn winning_numbers_requires_six_words() {
        let words: Vec<[u8; 32]> = (0..6).map(word).collect();
        assert_eq!(winning_numbers(&words).unwrap(), WINNING);

        let err = winning_numbers(&words[..5]).unwrap_err();
        assert_eq!(err, LottoError::InvalidRandomWords.into());
        let seven: Vec<[u8; 32]> = (0..7).map(word).collect();
        assert!(winning_numbers(&seven).is_err());
    }

    #[test]
    fn counts_matches_across_positions() {
        assert_eq!(count_matches(&[1, 2, 3, 10, 11, 12], &WINNING), 3);
        assert_eq!(count_matches(&[1, 2, 10, 11, 12, 13], &WINNING), 2);
        assert_eq!(count_matches(&[6, 5, 4, 3, 2, 1], &WINNING), 6);
        assert_eq!(count_matches(&[7, 8, 9, 10, 11, 12], &WINNING), 0);
    }

    #[test]
    fn duplicates_inflate_match_count() {
        assert_eq!(count_matches(&[1, 1, 1, 1, 1, 1], &WINNING), 6);
        assert_eq!(count_matches(&[1, 7, 8, 9, 10, 11], &[1, 1, 1, 2, 3, 4]), 3);
        assert_eq!(count_matches(&[1, 1, 8, 9, 10, 11], &[1, 1, 2, 3, 4, 5]), 4);
    }

    #[test]
    fn settles_three_entrants_end_to_end() {
        let (mut round, players) = round_with(&[
            [1, 2, 3, 10, 11, 12],
            [1, 2, 10, 11, 12, 13],
            [4, 5, 6, 7, 8, 9],
        ]);
        // 3 x (1000 - 50 fee)
        assert_eq!(round.ledger.prize_pool, 2_850);
        assert_eq!(round.ledger.fee_pool, 150);
        let pool_before = round.ledger.prize_pool;

        round.begin_draw(9, 500).unwrap();
        let outcome = round.settle(9, WINNING, 900).unwrap();

        assert_eq!(outcome.winners, vec![players[0], players[2]]);
        assert_eq!(outcome.share, 1_425);
        assert_eq!(outcome.rollover, 0);
        assert!(outcome.total_paid() <= pool_before);
        assert_eq!(outcome.round_id, 1);
        assert_eq!(outcome.request_id, 9);

        assert_eq!(round.ledger.prize_pool, 0);
        assert_eq!(round.ledger.fee_pool, 0);
        assert_eq!(round.last_winner, Some(players[2]));
        assert_eq!(round.last_payout, 1_425);
        assert_eq!(round.last_winning_numbers, WINNING);
        for player in &players {
            assert!(!round.is_registered(player));
        }
        assert_eq!(round.entrant_count(), 0);
        assert_eq!(round.phase, RoundPhase::Open);
        assert_eq!(round.pending_request, None);
        assert_eq!(round.last_draw_timestamp, 900);
        assert_eq!(round.round_id, 2);
    }

    #[test]
    fn remainder_is_forfeited() {
        let (mut round, _) = round_with(&[WINNING, WINNING, WINNING]);
        round.ledger.prize_pool = 100;
        round.begin_draw(1, 0).unwrap();
        let outcome = round.settle(1, WINNING, 10).unwrap();
        assert_eq!(outcome.share, 33);
        assert_eq!(outcome.total_paid(), 99);
        assert_eq!(round.ledger.prize_pool, 0);
    }

    #[test]
    fn no_winner_rolls_pool_over() {
        let (mut round, players) = round_with(&[[10, 11, 12, 13, 14, 15], [1, 2, 20, 21, 22, 23]]);
        let pool_before = round.ledger.prize_pool;
        let fees_before = round.ledger.fee_pool;

        round.begin_draw(4, 0).unwrap();
        let outcome = round.settle(4, WINNING, 10).unwrap();

        assert!(outcome.winners.is_empty());
        assert_eq!(outcome.share, 0);
        assert_eq!(outcome.rollover, pool_before);
        assert_eq!(round.ledger.prize_pool, pool_before);
        assert_eq!(round.ledger.fee_pool, fees_before);
        assert_eq!(round.last_winner, None);
        assert_eq!(round.entrant_count(), 0);
        assert!(players.iter().all(|p| !round.is_registered(p)));

        // Cleared flags let the same players play again next round.
        round
            .register(players[0], &WINNING, PRICE, PRICE, FEE_PER_MILLE)
            .unwrap();
    }

    #[test]
    fn second_fulfillment_is_rejected() {
        let (mut round, _) = round_with(&[WINNING]);
        round.begin_draw(5, 0).unwrap();
        round.settle(5, WINNING, 10).unwrap();

        let snapshot = round.clone();
        let err = round.settle(5, WINNING, 20).unwrap_err();
        assert_eq!(err, LottoError::RoundNotDrawing.into());
        assert_eq!(round.round_id, snapshot.round_id);
        assert_eq!(round.last_draw_timestamp, 10);
    }

    #[test]
    fn fulfillment_for_other_request_is_rejected() {
        let (mut round, players) = round_with(&[WINNING]);
        round.begin_draw(5, 0).unwrap();

        let err = round.settle(6, WINNING, 10).unwrap_err();
        assert_eq!(err, LottoError::RequestMismatch.into());
        assert_eq!(round.phase, RoundPhase::Drawing);
        assert!(round.is_registered(&players[0]));
    }

    #[test]
    fn open_round_cannot_be_settled() {
        let (mut round, _) = round_with(&[WINNING]);
        let err = round.settle(0, WINNING, 10).unwrap_err();
        assert_eq!(err, LottoError::RoundNotDrawing.into());
    }
}
