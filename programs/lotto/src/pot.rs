//! Lamport movement out of the round PDA.
//!
//! The round account is owned by this program, so lamports are debited
//! directly instead of going through the system program.

use anchor_lang::prelude::*;

use crate::errors::LottoError;

/// Balance the pot keeps after paying `amount`, or `PayoutTransferFailed` when
/// the debit would take it below `rent_floor`.
pub fn remaining_after_debit(balance: u64, rent_floor: u64, amount: u64) -> Result<u64> {
    let remaining = balance
        .checked_sub(amount)
        .ok_or(LottoError::PayoutTransferFailed)?;
    require!(remaining >= rent_floor, LottoError::PayoutTransferFailed);
    Ok(remaining)
}

/// Move `amount` lamports from the pot to `recipient`.
pub fn transfer_from_pot(pot: &AccountInfo, recipient: &AccountInfo, amount: u64) -> Result<()> {
    if amount == 0 {
        return Ok(());
    }
    require!(recipient.is_writable, LottoError::PayoutTransferFailed);

    let rent_floor = Rent::get()?.minimum_balance(pot.data_len());
    let pot_after = remaining_after_debit(pot.lamports(), rent_floor, amount)?;
    let recipient_after = recipient
        .lamports()
        .checked_add(amount)
        .ok_or(LottoError::MathOverflow)?;

    **pot.try_borrow_mut_lamports()? = pot_after;
    **recipient.try_borrow_mut_lamports()? = recipient_after;
    Ok(())
}

/// Pay `amount` to `winner`, whose wallet must be among `wallets`.
pub fn pay_winner<'info>(
    pot: &AccountInfo<'info>,
    wallets: &[AccountInfo<'info>],
    winner: &Pubkey,
    amount: u64,
) -> Result<()> {
    let wallet = wallets
        .iter()
        .find(|wallet| wallet.key == winner)
        .ok_or(LottoError::PayoutTransferFailed)?;
    transfer_from_pot(pot, wallet, amount)
}
