use anchor_lang::prelude::*;

use crate::constants::{CONFIG_SEED, ROUND_SEED};
use crate::errors::LottoError;
use crate::events::FeesWithdrawn;
use crate::pot;
use crate::state::{LotteryConfig, Round};

/// Accounts required to withdraw the protocol fee pool (admin-only).
#[derive(Accounts)]
pub struct WithdrawFees<'info> {
    #[account(mut)]
    pub admin: Signer<'info>,

    #[account(
        seeds = [CONFIG_SEED],
        bump = config.bump,
        constraint = config.admin == admin.key() @ LottoError::Unauthorized,
    )]
    pub config: Account<'info, LotteryConfig>,

    #[account(mut, seeds = [ROUND_SEED], bump = round.bump)]
    pub round: Account<'info, Round>,
}

pub fn handler(ctx: Context<WithdrawFees>) -> Result<()> {
    let round = &mut ctx.accounts.round;
    let amount = round.ledger.drain_fees();

    let admin = ctx.accounts.admin.to_account_info();
    pot::transfer_from_pot(&round.to_account_info(), &admin, amount)?;

    msg!("withdrew {} lamports of fees to {}", amount, admin.key);
    emit!(FeesWithdrawn {
        admin: admin.key(),
        amount,
    });

    Ok(())
}
