use anchor_lang::prelude::*;

use crate::constants::{CONFIG_SEED, ROUND_SEED};
use crate::errors::LottoError;
use crate::events::{DrawSettled, WinnerPaid};
use crate::pot;
use crate::settlement::winning_numbers;
use crate::state::{LotteryConfig, Round};

/// Accounts passed by the coordinator's fulfillment callback.
///
/// The coordinator always puts its config PDA first, as a signer; anything
/// after the named accounts is forwarded from its own remaining accounts.
#[derive(Accounts)]
pub struct FulfillRandomWords<'info> {
    /// Coordinator config PDA, signing through `invoke_signed`.
    #[account(address = config.coordinator_authority @ LottoError::Unauthorized)]
    pub coordinator_config: Signer<'info>,

    #[account(seeds = [CONFIG_SEED], bump = config.bump)]
    pub config: Account<'info, LotteryConfig>,

    #[account(mut, seeds = [ROUND_SEED], bump = round.bump)]
    pub round: Account<'info, Round>,
    // remaining_accounts: writable wallets of this round's entrants
}

/// Settle the pending draw and pay every winner from the pot.
///
/// A missing or read-only winner wallet fails the whole callback, which
/// leaves the round in `Drawing`.
pub fn handler<'info>(
    ctx: Context<'_, '_, '_, 'info, FulfillRandomWords<'info>>,
    request_id: u64,
    random_words: Vec<[u8; 32]>,
) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let winning = winning_numbers(&random_words)?;

    let round = &mut ctx.accounts.round;
    let outcome = round.settle(request_id, winning, now)?;

    let pot_info = round.to_account_info();
    for winner in &outcome.winners {
        pot::pay_winner(&pot_info, ctx.remaining_accounts, winner, outcome.share)?;
        emit!(WinnerPaid {
            round_id: outcome.round_id,
            winner: *winner,
            amount: outcome.share,
        });
    }

    msg!(
        "round {} settled: request_id={} numbers={:?} winners={} share={} rollover={}",
        outcome.round_id,
        request_id,
        outcome.winning_numbers,
        outcome.winners.len(),
        outcome.share,
        outcome.rollover
    );
    emit!(DrawSettled {
        round_id: outcome.round_id,
        request_id,
        winning_numbers: outcome.winning_numbers,
        winner_count: outcome.winners.len() as u32,
        share: outcome.share,
        rollover: outcome.rollover,
    });

    Ok(())
}
