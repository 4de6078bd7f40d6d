use anchor_lang::prelude::*;

use crate::constants::PER_MILLE;
use crate::errors::LottoError;

/// Lamport accounting for the pot held by the round PDA.
///
/// The prize pool and the protocol fee pool are tracked separately; the
/// actual lamports of both live on the round account.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq, InitSpace)]
pub struct PrizeLedger {
    /// Net entry value available to winners.
    pub prize_pool: u64,
    /// Accrued protocol fee, withdrawable by the admin.
    pub fee_pool: u64,
}

impl PrizeLedger {
    /// Split an entry payment into fee and pool, returning `(fee, net)`.
    ///
    /// The fee is floored, so any rounding dust stays in the prize pool.
    pub fn deposit(&mut self, amount: u64, fee_per_mille: u16) -> Result<(u64, u64)> {
        let fee = (amount as u128)
            .checked_mul(fee_per_mille as u128)
            .ok_or(LottoError::MathOverflow)?
            / PER_MILLE as u128;
        let fee = u64::try_from(fee).map_err(|_| LottoError::MathOverflow)?;
        let net = amount.checked_sub(fee).ok_or(LottoError::MathOverflow)?;

        self.fee_pool = self
            .fee_pool
            .checked_add(fee)
            .ok_or(LottoError::MathOverflow)?;
        self.prize_pool = self
            .prize_pool
            .checked_add(net)
            .ok_or(LottoError::MathOverflow)?;
        Ok((fee, net))
    }

    /// Return and zero the fee pool.
    pub fn drain_fees(&mut self) -> u64 {
        std::mem::take(&mut self.fee_pool)
    }

    /// Equal share of the prize pool per winner. The remainder is forfeited.
    pub fn split_pool(&self, winner_count: usize) -> Result<u64> {
        require!(winner_count > 0, LottoError::NoWinners);
        Ok(self.prize_pool / winner_count as u64)
    }

    /// Lamports the ledger accounts for in total.
    pub fn total(&self) -> u64 {
        self.prize_pool.saturating_add(self.fee_pool)
    }

    pub fn reset(&mut self) {
        self.prize_pool = 0;
        self.fee_pool = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deposit_splits_fee_per_mille() {
        let mut ledger = PrizeLedger::default();
        let (fee, net) = ledger.deposit(1_000_000, 50).unwrap();
        assert_eq!(fee, 50_000);
        assert_eq!(net, 950_000);
        assert_eq!(ledger.fee_pool, 50_000);
        assert_eq!(ledger.prize_pool, 950_000);
    }

    #[test]
    fn deposit_floors_fee() {
        let mut ledger = PrizeLedger::default();
        let (fee, net) = ledger.deposit(999, 1).unwrap();
        assert_eq!(fee, 0);
        assert_eq!(net, 999);
    }

    #[test]
    fn deposits_accumulate() {
        let mut ledger = PrizeLedger::default();
        ledger.deposit(1_000, 100).unwrap();
        ledger.deposit(3_000, 100).unwrap();
        assert_eq!(ledger.fee_pool, 400);
        assert_eq!(ledger.prize_pool, 3_600);
        assert_eq!(ledger.total(), 4_000);
    }

    #[test]
    fn drain_fees_zeroes_fee_pool_only() {
        let mut ledger = PrizeLedger {
            prize_pool: 900,
            fee_pool: 100,
        };
        assert_eq!(ledger.drain_fees(), 100);
        assert_eq!(ledger.fee_pool, 0);
        assert_eq!(ledger.prize_pool, 900);
        assert_eq!(ledger.drain_fees(), 0);
    }

    #[test]
    fn split_pool_floors_and_forfeits_remainder() {
        let ledger = PrizeLedger {
            prize_pool: 100,
            fee_pool: 0,
        };
        assert_eq!(ledger.split_pool(3).unwrap(), 33);
        assert_eq!(ledger.split_pool(1).unwrap(), 100);
    }

    #[test]
    fn split_pool_requires_a_winner() {
        let ledger = PrizeLedger {
            prize_pool: 100,
            fee_pool: 7,
        };
        assert_eq!(
            ledger.split_pool(0).unwrap_err(),
            LottoError::NoWinners.into()
        );
    }
}
