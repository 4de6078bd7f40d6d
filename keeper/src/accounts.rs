//! Decoding of the lottery's on-chain accounts and PDA derivation.
//!
//! Accounts are parsed from their Borsh layout by hand, so the keeper does
//! not link against the program crate.

use anyhow::{bail, ensure, Context, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};
use solana_sdk::instruction::AccountMeta;
use solana_sdk::pubkey::Pubkey;

pub const CONFIG_SEED: &[u8] = b"lotto-config";
pub const ROUND_SEED: &[u8] = b"round";

/// Entrant capacity of a round, as enforced by the program.
pub const MAX_ENTRANTS: usize = 16;

/// Offset of `request_counter` in the coordinator config account.
const REQUEST_COUNTER_OFFSET: usize = 84;

/// Compute the Anchor account discriminator: `sha256("account:<Name>")[..8]`.
pub fn account_discriminator(account_name: &str) -> [u8; 8] {
    let mut hasher = Sha256::new();
    hasher.update(format!("account:{account_name}"));
    let hash = hasher.finalize();
    let mut disc = [0u8; 8];
    disc.copy_from_slice(&hash[..8]);
    disc
}

/// Sequential little-endian reader over account data.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self.pos + len;
        let bytes = self
            .data
            .get(self.pos..end)
            .with_context(|| format!("account data too short: need {end}, have {}", self.data.len()))?;
        self.pos = end;
        Ok(bytes)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.array()?))
    }

    fn u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    fn u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.array()?))
    }

    fn i64(&mut self) -> Result<i64> {
        Ok(i64::from_le_bytes(self.array()?))
    }

    fn pubkey(&mut self) -> Result<Pubkey> {
        Ok(Pubkey::new_from_array(self.array()?))
    }

    fn option<T>(&mut self, read: impl FnOnce(&mut Self) -> Result<T>) -> Result<Option<T>> {
        match self.u8()? {
            0 => Ok(None),
            1 => read(self).map(Some),
            tag => bail!("invalid option tag {tag}"),
        }
    }

    fn discriminator(&mut self, account_name: &str) -> Result<()> {
        let disc: [u8; 8] = self.array()?;
        ensure!(
            disc == account_discriminator(account_name),
            "account is not a {account_name}"
        );
        Ok(())
    }
}

/// The fields of `LotteryConfig` the keeper needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LotteryConfigView {
    pub coordinator_program: Pubkey,
    pub coordinator_authority: Pubkey,
    pub subscription_id: u64,
    pub interval: i64,
}

impl LotteryConfigView {
    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut r = Reader::new(data);
        r.discriminator("LotteryConfig")?;
        let _admin = r.pubkey()?;
        let coordinator_program = r.pubkey()?;
        let coordinator_authority = r.pubkey()?;
        let _key_hash: [u8; 32] = r.array()?;
        let subscription_id = r.u64()?;
        let _request_confirmations = r.u16()?;
        let _callback_compute_limit = r.u32()?;
        let _price_feed = r.pubkey()?;
        let _price_feed_owner = r.pubkey()?;
        let _max_price_age = r.i64()?;
        let _ticket_price_usd = r.u64()?;
        let _fee_per_mille = r.u16()?;
        let interval = r.i64()?;
        Ok(Self {
            coordinator_program,
            coordinator_authority,
            subscription_id,
            interval,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Open,
    Drawing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrantView {
    pub player: Pubkey,
    pub numbers: [u8; 6],
}

/// Decoded `Round` account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundView {
    pub round_id: u64,
    pub phase: Phase,
    pub last_draw_timestamp: i64,
    pub draw_requested_at: i64,
    pub pending_request: Option<u64>,
    pub prize_pool: u64,
    pub fee_pool: u64,
    pub entrants: Vec<EntrantView>,
    pub last_winner: Option<Pubkey>,
    pub last_payout: u64,
    pub last_winning_numbers: [u8; 6],
}

impl RoundView {
    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut r = Reader::new(data);
        r.discriminator("Round")?;
        let round_id = r.u64()?;
        let phase = match r.u8()? {
            0 => Phase::Open,
            1 => Phase::Drawing,
            other => bail!("invalid round phase {other}"),
        };
        let last_draw_timestamp = r.i64()?;
        let draw_requested_at = r.i64()?;
        let pending_request = r.option(Reader::u64)?;
        let prize_pool = r.u64()?;
        let fee_pool = r.u64()?;

        let count = r.u32()? as usize;
        ensure!(count <= MAX_ENTRANTS, "round holds {count} entrants, capacity is {MAX_ENTRANTS}");
        let mut entrants = Vec::with_capacity(count);
        for _ in 0..count {
            entrants.push(EntrantView {
                player: r.pubkey()?,
                numbers: r.array()?,
            });
        }
        let registered = r.u32()? as usize;
        r.take(registered * 32)?;

        let last_winner = r.option(Reader::pubkey)?;
        let last_payout = r.u64()?;
        let last_winning_numbers = r.array()?;

        Ok(Self {
            round_id,
            phase,
            last_draw_timestamp,
            draw_requested_at,
            pending_request,
            prize_pool,
            fee_pool,
            entrants,
            last_winner,
            last_payout,
            last_winning_numbers,
        })
    }

    /// Same trigger the program evaluates in `check_upkeep`.
    pub fn upkeep_needed(&self, interval: i64, now: i64) -> bool {
        now.saturating_sub(self.last_draw_timestamp) >= interval
            && self.phase == Phase::Open
            && self.prize_pool.saturating_add(self.fee_pool) > 0
            && !self.entrants.is_empty()
    }

    /// Seconds the current draw has waited for fulfillment, if one is in flight.
    pub fn draw_pending_for(&self, now: i64) -> Option<i64> {
        match self.phase {
            Phase::Drawing => Some(now.saturating_sub(self.draw_requested_at)),
            Phase::Open => None,
        }
    }

    /// A draw stuck in `Drawing` for longer than `threshold` seconds.
    pub fn is_unresolved(&self, now: i64, threshold: i64) -> bool {
        self.draw_pending_for(now)
            .is_some_and(|pending| pending > threshold)
    }
}

/// Read the id the coordinator will assign to its next request.
pub fn coordinator_request_counter(data: &[u8]) -> Result<u64> {
    let bytes = data
        .get(REQUEST_COUNTER_OFFSET..REQUEST_COUNTER_OFFSET + 8)
        .context("coordinator config too short")?;
    let mut counter = [0u8; 8];
    counter.copy_from_slice(bytes);
    Ok(u64::from_le_bytes(counter))
}

pub fn config_pda(program_id: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[CONFIG_SEED], program_id).0
}

pub fn round_pda(program_id: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[ROUND_SEED], program_id).0
}

pub fn subscription_pda(coordinator: &Pubkey, subscription_id: u64) -> Pubkey {
    Pubkey::find_program_address(&[b"subscription", &subscription_id.to_le_bytes()], coordinator).0
}

pub fn consumer_registration_pda(
    coordinator: &Pubkey,
    subscription_id: u64,
    consumer: &Pubkey,
) -> Pubkey {
    Pubkey::find_program_address(
        &[b"consumer", &subscription_id.to_le_bytes(), consumer.as_ref()],
        coordinator,
    )
    .0
}

pub fn request_pda(coordinator: &Pubkey, request_id: u64) -> Pubkey {
    Pubkey::find_program_address(&[b"request", &request_id.to_le_bytes()], coordinator).0
}

/// Remaining accounts the coordinator must forward to the lottery's
/// `fulfill_random_words` callback.
///
/// The coordinator adds its own config PDA first; after it come the lottery
/// config, the round, and every entrant wallet so winners can be paid.
pub fn fulfillment_callback_accounts(program_id: &Pubkey, round: &RoundView) -> Vec<AccountMeta> {
    let mut accounts = Vec::with_capacity(2 + round.entrants.len());
    accounts.push(AccountMeta::new_readonly(config_pda(program_id), false));
    accounts.push(AccountMeta::new(round_pda(program_id), false));
    for entrant in &round.entrants {
        accounts.push(AccountMeta::new(entrant.player, false));
    }
    accounts
}
