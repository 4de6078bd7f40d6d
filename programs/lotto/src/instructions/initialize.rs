use anchor_lang::prelude::*;

use crate::constants::{CONFIG_SEED, COORDINATOR_CONFIG_SEED, PER_MILLE, ROUND_SEED};
use crate::errors::LottoError;
use crate::state::{LotteryConfig, Round};

/// Deployment parameters stored in [`LotteryConfig`].
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct InitializeParams {
    pub coordinator_program: Pubkey,
    pub key_hash: [u8; 32],
    pub subscription_id: u64,
    pub request_confirmations: u16,
    pub callback_compute_limit: u32,
    pub price_feed: Pubkey,
    pub price_feed_owner: Pubkey,
    pub max_price_age: i64,
    pub ticket_price_usd: u64,
    pub fee_per_mille: u16,
    pub interval: i64,
}

impl InitializeParams {
    pub fn validate(&self) -> Result<()> {
        require!(
            self.coordinator_program != Pubkey::default()
                && self.price_feed != Pubkey::default()
                && self.price_feed_owner != Pubkey::default(),
            LottoError::InvalidConfig
        );
        require!(
            self.fee_per_mille as u64 <= PER_MILLE,
            LottoError::InvalidConfig
        );
        require!(self.interval > 0, LottoError::InvalidConfig);
        require!(self.ticket_price_usd > 0, LottoError::InvalidConfig);
        require!(self.max_price_age > 0, LottoError::InvalidConfig);
        Ok(())
    }
}

/// Accounts required to set up the lottery.
#[derive(Accounts)]
pub struct Initialize<'info> {
    /// Becomes the config admin and pays for both PDAs.
    #[account(mut)]
    pub admin: Signer<'info>,

    /// Singleton configuration PDA. Seeds: `["lotto-config"]`.
    #[account(
        init,
        payer = admin,
        space = 8 + LotteryConfig::INIT_SPACE,
        seeds = [CONFIG_SEED],
        bump,
    )]
    pub config: Account<'info, LotteryConfig>,

    /// Singleton round PDA and pot. Seeds: `["round"]`.
    #[account(
        init,
        payer = admin,
        space = 8 + Round::INIT_SPACE,
        seeds = [ROUND_SEED],
        bump,
    )]
    pub round: Account<'info, Round>,

    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<Initialize>, params: InitializeParams) -> Result<()> {
    params.validate()?;

    let (coordinator_authority, _) =
        Pubkey::find_program_address(&[COORDINATOR_CONFIG_SEED], &params.coordinator_program);

    let config = &mut ctx.accounts.config;
    config.admin = ctx.accounts.admin.key();
    config.coordinator_program = params.coordinator_program;
    config.coordinator_authority = coordinator_authority;
    config.key_hash = params.key_hash;
    config.subscription_id = params.subscription_id;
    config.request_confirmations = params.request_confirmations;
    config.callback_compute_limit = params.callback_compute_limit;
    config.price_feed = params.price_feed;
    config.price_feed_owner = params.price_feed_owner;
    config.max_price_age = params.max_price_age;
    config.ticket_price_usd = params.ticket_price_usd;
    config.fee_per_mille = params.fee_per_mille;
    config.interval = params.interval;
    config.bump = ctx.bumps.config;

    let now = Clock::get()?.unix_timestamp;
    ctx.accounts
        .round
        .set_inner(Round::open(now, ctx.bumps.round));

    msg!(
        "lottery initialized: admin={} coordinator={} interval={}s",
        config.admin,
        config.coordinator_program,
        config.interval
    );
    Ok(())
}
