use anchor_lang::prelude::*;

use crate::constants::{CONFIG_SEED, ROUND_SEED};
use crate::coordinator::{CoordinatorAccounts, RandomWordsRequest};
use crate::errors::LottoError;
use crate::events::DrawRequested;
use crate::program::Lotto;
use crate::state::{LotteryConfig, Round};
use crate::trigger::UpkeepCheck;

/// Accounts required to start a draw.
///
/// Callable by anyone; the trigger is re-evaluated on-chain. The coordinator
/// accounts are forwarded unchanged and validated by the coordinator itself.
#[derive(Accounts)]
pub struct PerformUpkeep<'info> {
    /// Pays rent for the coordinator's request PDA.
    #[account(mut)]
    pub caller: Signer<'info>,

    #[account(seeds = [CONFIG_SEED], bump = config.bump)]
    pub config: Account<'info, LotteryConfig>,

    #[account(mut, seeds = [ROUND_SEED], bump = round.bump)]
    pub round: Account<'info, Round>,

    /// Coordinator config PDA; its `request_counter` becomes the request id.
    /// CHECK: Address checked against config; owned and validated by the coordinator.
    #[account(mut, address = config.coordinator_authority @ LottoError::InvalidConfig)]
    pub coordinator_config: UncheckedAccount<'info>,

    /// CHECK: Validated by the coordinator.
    #[account(mut)]
    pub subscription: UncheckedAccount<'info>,

    /// CHECK: Validated by the coordinator.
    pub consumer_registration: UncheckedAccount<'info>,

    /// New request PDA, created by the coordinator.
    /// CHECK: Validated by the coordinator.
    #[account(mut)]
    pub request: UncheckedAccount<'info>,

    /// CHECK: Address checked against config.
    #[account(
        address = config.coordinator_program @ LottoError::InvalidConfig,
        executable,
    )]
    pub coordinator_program: UncheckedAccount<'info>,

    pub lotto_program: Program<'info, Lotto>,

    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<PerformUpkeep>) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let check = UpkeepCheck::evaluate(&ctx.accounts.round, ctx.accounts.config.interval, now);
    if !check.needed() {
        check.log();
        return err!(LottoError::UpkeepNotNeeded);
    }

    let coordinator = CoordinatorAccounts {
        coordinator_program: ctx.accounts.coordinator_program.to_account_info(),
        requester: ctx.accounts.caller.to_account_info(),
        coordinator_config: ctx.accounts.coordinator_config.to_account_info(),
        subscription: ctx.accounts.subscription.to_account_info(),
        consumer_registration: ctx.accounts.consumer_registration.to_account_info(),
        consumer_program: ctx.accounts.lotto_program.to_account_info(),
        request: ctx.accounts.request.to_account_info(),
        system_program: ctx.accounts.system_program.to_account_info(),
    };
    let request_id = coordinator.next_request_id()?;

    let round = &mut ctx.accounts.round;
    round.begin_draw(request_id, now)?;

    coordinator.request_random_words(&RandomWordsRequest::for_draw(
        &ctx.accounts.config,
        round.round_id,
    ))?;

    msg!(
        "round {}: draw requested, request_id={} pool={} entrants={}",
        round.round_id,
        request_id,
        round.ledger.prize_pool,
        check.entrant_count
    );
    emit!(DrawRequested {
        round_id: round.round_id,
        request_id,
        prize_pool: round.ledger.prize_pool,
        entrant_count: check.entrant_count as u32,
    });

    Ok(())
}
