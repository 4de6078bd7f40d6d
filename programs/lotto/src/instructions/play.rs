use anchor_lang::prelude::*;
use anchor_lang::system_program::{self, Transfer};

use super::ticket_price::current_ticket_price;
use crate::constants::{CONFIG_SEED, ROUND_SEED};
use crate::errors::LottoError;
use crate::events::EntrantRegistered;
use crate::state::{LotteryConfig, Round};

/// Accounts required to buy a ticket.
#[derive(Accounts)]
pub struct Play<'info> {
    /// The player paying the entry value.
    #[account(mut)]
    pub player: Signer<'info>,

    #[account(seeds = [CONFIG_SEED], bump = config.bump)]
    pub config: Account<'info, LotteryConfig>,

    /// Round PDA; receives the entry lamports.
    #[account(mut, seeds = [ROUND_SEED], bump = round.bump)]
    pub round: Account<'info, Round>,

    /// CHECK: Key and owner are checked against config; data is parsed by offset.
    #[account(
        address = config.price_feed @ LottoError::InvalidPriceFeed,
        owner = config.price_feed_owner @ LottoError::InvalidPriceFeed,
    )]
    pub price_feed: UncheckedAccount<'info>,

    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<Play>, numbers: Vec<u8>, amount: u64) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let config = &ctx.accounts.config;
    let price = current_ticket_price(config, &ctx.accounts.price_feed, now)?;

    let player = ctx.accounts.player.key();
    let round = &mut ctx.accounts.round;
    let numbers = round.register(player, &numbers, amount, price, config.fee_per_mille)?;

    system_program::transfer(
        CpiContext::new(
            ctx.accounts.system_program.to_account_info(),
            Transfer {
                from: ctx.accounts.player.to_account_info(),
                to: round.to_account_info(),
            },
        ),
        amount,
    )?;

    msg!(
        "round {}: {} entered with {} lamports (price {})",
        round.round_id,
        player,
        amount,
        price
    );
    emit!(EntrantRegistered {
        round_id: round.round_id,
        player,
        numbers,
        amount,
    });

    Ok(())
}
