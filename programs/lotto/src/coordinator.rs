//! Outbound randomness requests to the VRF coordinator.
//!
//! The coordinator is reached through a hand-built CPI so this program does
//! not link against it. Answers come back through the `fulfill_random_words`
//! instruction, signed by the coordinator's config PDA.

use anchor_lang::prelude::*;
use anchor_lang::solana_program::instruction::Instruction;
use anchor_lang::solana_program::program::invoke;
use sha2::{Digest, Sha256};

use crate::constants::NUMBERS_PER_TICKET;
use crate::errors::LottoError;
use crate::state::LotteryConfig;

/// Offset of `request_counter` in the coordinator config account.
///
/// Layout: discriminator (8) + admin (32) + authority (32) + fee_per_word (8) +
/// max_num_words (4) = 84.
const REQUEST_COUNTER_OFFSET: usize = 84;

/// Arguments of the coordinator's `request_random_words` instruction.
///
/// Wire order is `(num_words: u32, seed: [u8; 32], callback_compute_limit: u32)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RandomWordsRequest {
    pub num_words: u32,
    pub seed: [u8; 32],
    pub callback_compute_limit: u32,
}

impl RandomWordsRequest {
    /// One word per drawn number, seeded by the oracle key hash and the round.
    pub fn for_draw(config: &LotteryConfig, round_id: u64) -> Self {
        Self {
            num_words: NUMBERS_PER_TICKET as u32,
            seed: draw_seed(&config.key_hash, round_id),
            callback_compute_limit: config.callback_compute_limit,
        }
    }

    /// Anchor instruction data: discriminator followed by Borsh-encoded args.
    pub fn instruction_data(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(8 + 4 + 32 + 4);
        data.extend_from_slice(&request_discriminator());
        data.extend_from_slice(&self.num_words.to_le_bytes());
        data.extend_from_slice(&self.seed);
        data.extend_from_slice(&self.callback_compute_limit.to_le_bytes());
        data
    }
}

/// `sha256(key_hash || round_id_le)`, distinct for every round.
pub fn draw_seed(key_hash: &[u8; 32], round_id: u64) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(key_hash);
    hasher.update(round_id.to_le_bytes());
    hasher.finalize().into()
}

/// `sha256("global:request_random_words")[..8]`
fn request_discriminator() -> [u8; 8] {
    let mut hasher = Sha256::new();
    hasher.update(b"global:request_random_words");
    let hash = hasher.finalize();
    let mut disc = [0u8; 8];
    disc.copy_from_slice(&hash[..8]);
    disc
}

/// Read the id the coordinator will assign to the next request.
pub fn read_request_counter(coordinator_config: &[u8]) -> Result<u64> {
    coordinator_config
        .get(REQUEST_COUNTER_OFFSET..REQUEST_COUNTER_OFFSET + 8)
        .and_then(|bytes| bytes.try_into().ok())
        .map(u64::from_le_bytes)
        .ok_or_else(|| error!(LottoError::InvalidConfig))
}

/// Accounts forwarded to the coordinator's `request_random_words`.
pub struct CoordinatorAccounts<'info> {
    pub coordinator_program: AccountInfo<'info>,
    /// Pays rent for the request PDA; must sign the outer transaction.
    pub requester: AccountInfo<'info>,
    pub coordinator_config: AccountInfo<'info>,
    pub subscription: AccountInfo<'info>,
    pub consumer_registration: AccountInfo<'info>,
    /// This program, registered as a consumer of the subscription.
    pub consumer_program: AccountInfo<'info>,
    pub request: AccountInfo<'info>,
    pub system_program: AccountInfo<'info>,
}

impl<'info> CoordinatorAccounts<'info> {
    pub fn next_request_id(&self) -> Result<u64> {
        let data = self.coordinator_config.try_borrow_data()?;
        read_request_counter(&data)
    }

    /// CPI into the coordinator. Errors from the coordinator are propagated.
    pub fn request_random_words(&self, request: &RandomWordsRequest) -> Result<()> {
        let ix = Instruction {
            program_id: self.coordinator_program.key(),
            accounts: vec![
                AccountMeta::new(self.requester.key(), true),
                AccountMeta::new(self.coordinator_config.key(), false),
                AccountMeta::new(self.subscription.key(), false),
                AccountMeta::new_readonly(self.consumer_registration.key(), false),
                AccountMeta::new_readonly(self.consumer_program.key(), false),
                AccountMeta::new(self.request.key(), false),
                AccountMeta::new_readonly(self.system_program.key(), false),
            ],
            data: request.instruction_data(),
        };

        invoke(
            &ix,
            &[
                self.requester.clone(),
                self.coordinator_config.clone(),
                self.subscription.clone(),
                self.consumer_registration.clone(),
                self.consumer_program.clone(),
                self.request.clone(),
                self.system_program.clone(),
                self.coordinator_program.clone(),
            ],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(key_hash: [u8; 32], callback_compute_limit: u32) -> LotteryConfig {
        LotteryConfig {
            admin: Pubkey::default(),
            coordinator_program: Pubkey::default(),
            coordinator_authority: Pubkey::default(),
            key_hash,
            subscription_id: 3,
            request_confirmations: 2,
            callback_compute_limit,
            price_feed: Pubkey::default(),
            price_feed_owner: Pubkey::default(),
            max_price_age: 60,
            ticket_price_usd: 5_000_000_000,
            fee_per_mille: 50,
            interval: 300,
            bump: 255,
        }
    }

    #[test]
    fn coordinator_decodes_six_words_and_compute_limit() {
        let request = RandomWordsRequest::for_draw(&config([0xab; 32], 400_000), 7);
        let data = request.instruction_data();
        assert_eq!(data.len(), 48);
        assert_eq!(data[..8], request_discriminator());

        // Decode with the coordinator's (u32, [u8; 32], u32) argument layout.
        let mut args = &data[8..];
        let (num_words, seed, callback_compute_limit) =
            <(u32, [u8; 32], u32)>::deserialize(&mut args).unwrap();
        assert!(args.is_empty());
        assert_eq!(num_words, 6);
        assert_eq!(seed, draw_seed(&[0xab; 32], 7));
        assert_eq!(callback_compute_limit, 400_000);
    }

    #[test]
    fn seed_changes_with_round_and_key_hash() {
        let seed = draw_seed(&[1; 32], 1);
        assert_ne!(seed, draw_seed(&[1; 32], 2));
        assert_ne!(seed, draw_seed(&[2; 32], 1));
        assert_eq!(seed, draw_seed(&[1; 32], 1));
    }

    #[test]
    fn discriminator_matches_anchor_sighash() {
        let hash = Sha256::digest(b"global:request_random_words");
        assert_eq!(request_discriminator(), hash[..8]);
    }

    #[test]
    fn reads_request_counter_from_coordinator_config() {
        let mut data = vec![0u8; 120];
        data[REQUEST_COUNTER_OFFSET..REQUEST_COUNTER_OFFSET + 8]
            .copy_from_slice(&41u64.to_le_bytes());
        assert_eq!(read_request_counter(&data).unwrap(), 41);

        assert_eq!(
            read_request_counter(&data[..90]).unwrap_err(),
            LottoError::InvalidConfig.into()
        );
    }
}
