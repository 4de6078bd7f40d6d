use anchor_lang::prelude::*;

use crate::constants::CONFIG_SEED;
use crate::errors::LottoError;
use crate::price::{self, PriceReading};
use crate::state::LotteryConfig;

/// Accounts required to quote the current ticket price.
#[derive(Accounts)]
pub struct TicketPrice<'info> {
    #[account(seeds = [CONFIG_SEED], bump = config.bump)]
    pub config: Account<'info, LotteryConfig>,

    /// Pyth price account quoting the native unit.
    /// CHECK: Key and owner are checked against config; data is parsed by offset.
    #[account(
        address = config.price_feed @ LottoError::InvalidPriceFeed,
        owner = config.price_feed_owner @ LottoError::InvalidPriceFeed,
    )]
    pub price_feed: UncheckedAccount<'info>,
}

/// Ticket price in lamports from the configured fiat price and feed.
pub(crate) fn current_ticket_price(
    config: &LotteryConfig,
    price_feed: &AccountInfo,
    now: i64,
) -> Result<u64> {
    let data = price_feed.try_borrow_data()?;
    let reading = PriceReading::from_pyth_account(&data)?;
    price::ticket_price(config.ticket_price_usd, &reading, now, config.max_price_age)
}

pub fn handler(ctx: Context<TicketPrice>) -> Result<u64> {
    let now = Clock::get()?.unix_timestamp;
    current_ticket_price(&ctx.accounts.config, &ctx.accounts.price_feed, now)
}
