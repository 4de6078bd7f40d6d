use anchor_lang::prelude::*;

use crate::constants::{CONFIG_SEED, ROUND_SEED};
use crate::state::{LotteryConfig, Round};
use crate::trigger::UpkeepCheck;

/// Read-only accounts for evaluating the draw trigger.
#[derive(Accounts)]
pub struct CheckUpkeep<'info> {
    #[account(seeds = [CONFIG_SEED], bump = config.bump)]
    pub config: Account<'info, LotteryConfig>,

    #[account(seeds = [ROUND_SEED], bump = round.bump)]
    pub round: Account<'info, Round>,
}

pub fn handler(ctx: Context<CheckUpkeep>) -> Result<bool> {
    let now = Clock::get()?.unix_timestamp;
    let check = UpkeepCheck::evaluate(&ctx.accounts.round, ctx.accounts.config.interval, now);
    check.log();
    Ok(check.needed())
}
