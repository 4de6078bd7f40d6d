//! Upkeep loop: polls the round and submits `perform_upkeep` when the draw
//! trigger holds.
//!
//! The loop wakes on a fixed interval and whenever the listener forwards a
//! lottery event. Each wake-up:
//! 1. Fetches the lottery config and round and publishes a snapshot.
//! 2. Warns when a draw has been waiting longer than `UNRESOLVED_AFTER_SECS`.
//! 3. If the trigger holds, reads the coordinator's request counter, derives
//!    the request accounts and submits `perform_upkeep`.
//!
//! The program re-evaluates the trigger, so a lost race surfaces as
//! `UpkeepNotNeeded` and is not counted as a failure.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_commitment_config::CommitmentConfig;
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signer;
use solana_sdk::transaction::Transaction;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};

use crate::accounts::{
    config_pda, consumer_registration_pda, coordinator_request_counter, request_pda, round_pda,
    subscription_pda, LotteryConfigView, RoundView,
};
use crate::config::AppConfig;
use crate::listener::LottoEvent;
use crate::metrics::{Metrics, RoundSnapshot};

/// `LottoError::UpkeepNotNeeded` (6000 + variant index 6).
const ERROR_UPKEEP_NOT_NEEDED: u32 = 6006;

/// The system program id is the all-zero key.
const SYSTEM_PROGRAM_ID: Pubkey = Pubkey::new_from_array([0u8; 32]);

fn perform_upkeep_discriminator() -> [u8; 8] {
    let mut hasher = Sha256::new();
    hasher.update(b"global:perform_upkeep");
    let hash = hasher.finalize();
    let mut disc = [0u8; 8];
    disc.copy_from_slice(&hash[..8]);
    disc
}

/// The program refused because the trigger no longer holds.
fn is_upkeep_not_needed(err_str: &str) -> bool {
    err_str.contains(&format!("0x{:x}", ERROR_UPKEEP_NOT_NEEDED))
        || err_str.contains("UpkeepNotNeeded")
}

fn unix_now() -> Result<i64> {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system clock is before the unix epoch")?;
    Ok(elapsed.as_secs() as i64)
}

pub async fn run_upkeep_loop(
    config: AppConfig,
    mut events: mpsc::Receiver<LottoEvent>,
    metrics: Arc<Metrics>,
) {
    let rpc_client = RpcClient::new_with_commitment(
        config.rpc_url.clone(),
        CommitmentConfig::confirmed(),
    );
    let mut ticker = tokio::time::interval(config.poll_interval);
    let mut listening = true;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            event = events.recv(), if listening => match event {
                Some(event) => {
                    metrics.record_event();
                    if matches!(event, LottoEvent::DrawSettled { .. }) {
                        metrics.record_settlement();
                    }
                }
                None => {
                    warn!("Event channel closed, falling back to polling");
                    listening = false;
                    continue;
                }
            },
        }

        if let Err(e) = check_round(&rpc_client, &config, &metrics).await {
            error!(error = %format!("{e:#}"), "Upkeep check failed");
        }
    }
}

/// Fetch the round, publish its snapshot and request a draw if one is due.
#[instrument(skip_all)]
async fn check_round(rpc_client: &RpcClient, config: &AppConfig, metrics: &Metrics) -> Result<()> {
    let config_data = rpc_client
        .get_account_data(&config_pda(&config.program_id))
        .await
        .context("failed to fetch lottery config")?;
    let lotto_config = LotteryConfigView::decode(&config_data)?;

    let round_data = rpc_client
        .get_account_data(&round_pda(&config.program_id))
        .await
        .context("failed to fetch round")?;
    let round = RoundView::decode(&round_data)?;

    let now = unix_now()?;
    let snapshot = RoundSnapshot::observe(&round, now, config.unresolved_after_secs);
    if snapshot.unresolved {
        warn!(
            round_id = round.round_id,
            request_id = ?round.pending_request,
            pending_secs = ?snapshot.draw_pending_secs,
            "Draw unresolved: coordinator has not fulfilled the request"
        );
    }
    metrics.set_round(snapshot);

    if !round.upkeep_needed(lotto_config.interval, now) {
        debug!(
            round_id = round.round_id,
            phase = ?round.phase,
            entrants = round.entrants.len(),
            "Upkeep not needed"
        );
        return Ok(());
    }

    info!(
        round_id = round.round_id,
        entrants = round.entrants.len(),
        prize_pool = round.prize_pool,
        "Upkeep needed, requesting draw"
    );

    match perform_upkeep(rpc_client, config, &lotto_config).await {
        Ok(sig) => {
            metrics.record_upkeep();
            info!(
                round_id = round.round_id,
                signature = %sig,
                explorer = %config.explorer_url(&sig),
                "Draw requested"
            );
        }
        Err(e) => handle_upkeep_error(round.round_id, e, metrics),
    }
    Ok(())
}

fn handle_upkeep_error(round_id: u64, error: anyhow::Error, metrics: &Metrics) {
    let err_str = format!("{error:#}");
    if is_upkeep_not_needed(&err_str) {
        metrics.record_not_needed();
        warn!(round_id, reason = %err_str, "Upkeep refused by program");
    } else {
        metrics.record_failure();
        error!(round_id, error = %err_str, "Failed to perform upkeep");
    }
}

/// Build, sign and submit a `perform_upkeep` transaction.
#[instrument(skip_all, fields(coordinator = %lotto_config.coordinator_program))]
async fn perform_upkeep(
    rpc_client: &RpcClient,
    config: &AppConfig,
    lotto_config: &LotteryConfigView,
) -> Result<String> {
    let coordinator_data = rpc_client
        .get_account_data(&lotto_config.coordinator_authority)
        .await
        .context("failed to fetch coordinator config")?;
    let request_id = coordinator_request_counter(&coordinator_data)?;
    debug!(request_id, "Next coordinator request id");

    let upkeep_ix = build_perform_upkeep_instruction(
        &config.program_id,
        &config.keeper_keypair.pubkey(),
        lotto_config,
        request_id,
    );

    let mut instructions = Vec::with_capacity(2);
    if config.priority_fee_micro_lamports > 0 {
        instructions.push(build_set_compute_unit_price_instruction(
            config.priority_fee_micro_lamports,
        )?);
    }
    instructions.push(upkeep_ix);

    send_with_retries(rpc_client, config, &instructions).await
}

/// Send a transaction with exponential backoff on BlockhashNotFound.
async fn send_with_retries(
    rpc_client: &RpcClient,
    config: &AppConfig,
    instructions: &[Instruction],
) -> Result<String> {
    let mut retry_delay = Duration::from_millis(config.initial_retry_delay_ms);

    for attempt in 0..config.max_retries {
        let blockhash = rpc_client
            .get_latest_blockhash()
            .await
            .context("failed to fetch latest blockhash")?;

        let tx = Transaction::new_signed_with_payer(
            instructions,
            Some(&config.keeper_keypair.pubkey()),
            &[config.keeper_keypair.as_ref()],
            blockhash,
        );

        match rpc_client.send_and_confirm_transaction(&tx).await {
            Ok(sig) => return Ok(sig.to_string()),
            Err(e) if e.to_string().contains("BlockhashNotFound") && attempt + 1 < config.max_retries => {
                warn!(
                    attempt = attempt + 1,
                    delay = ?retry_delay,
                    "BlockhashNotFound, retrying"
                );
                tokio::time::sleep(retry_delay).await;
                retry_delay = retry_delay.saturating_mul(2).min(Duration::from_secs(60));
            }
            Err(e) => return Err(e).context("send_and_confirm_transaction failed"),
        }
    }

    anyhow::bail!("max retries ({}) exceeded for perform_upkeep", config.max_retries)
}

/// Build a `SetComputeUnitPrice` instruction.
fn build_set_compute_unit_price_instruction(micro_lamports: u64) -> Result<Instruction> {
    let compute_budget_id: Pubkey = "ComputeBudget111111111111111111111111111111"
        .parse()
        .context("invalid compute budget program id")?;
    let mut data = Vec::with_capacity(9);
    data.push(3u8);
    data.extend_from_slice(&micro_lamports.to_le_bytes());
    Ok(Instruction {
        program_id: compute_budget_id,
        accounts: vec![],
        data,
    })
}

/// Build the lottery's `perform_upkeep` instruction for coordinator request
/// `request_id`.
fn build_perform_upkeep_instruction(
    program_id: &Pubkey,
    caller: &Pubkey,
    lotto_config: &LotteryConfigView,
    request_id: u64,
) -> Instruction {
    let coordinator = &lotto_config.coordinator_program;
    let subscription_id = lotto_config.subscription_id;

    let accounts = vec![
        AccountMeta::new(*caller, true),
        AccountMeta::new_readonly(config_pda(program_id), false),
        AccountMeta::new(round_pda(program_id), false),
        AccountMeta::new(lotto_config.coordinator_authority, false),
        AccountMeta::new(subscription_pda(coordinator, subscription_id), false),
        AccountMeta::new_readonly(
            consumer_registration_pda(coordinator, subscription_id, program_id),
            false,
        ),
        AccountMeta::new(request_pda(coordinator, request_id), false),
        AccountMeta::new_readonly(*coordinator, false),
        AccountMeta::new_readonly(*program_id, false),
        AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data: perform_upkeep_discriminator().to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lotto_config() -> LotteryConfigView {
        LotteryConfigView {
            coordinator_program: Pubkey::new_from_array([2u8; 32]),
            coordinator_authority: Pubkey::new_from_array([3u8; 32]),
            subscription_id: 5,
            interval: 300,
        }
    }

    #[test]
    fn upkeep_instruction_orders_accounts_like_the_program() {
        let program_id = Pubkey::new_from_array([9u8; 32]);
        let caller = Pubkey::new_from_array([8u8; 32]);
        let cfg = lotto_config();
        let ix = build_perform_upkeep_instruction(&program_id, &caller, &cfg, 41);

        assert_eq!(ix.program_id, program_id);
        assert_eq!(ix.data, perform_upkeep_discriminator().to_vec());
        assert_eq!(ix.accounts.len(), 10);

        assert!(ix.accounts[0].is_signer && ix.accounts[0].is_writable);
        assert_eq!(ix.accounts[2].pubkey, round_pda(&program_id));
        assert!(ix.accounts[2].is_writable);
        assert_eq!(ix.accounts[3].pubkey, cfg.coordinator_authority);
        assert_eq!(
            ix.accounts[6].pubkey,
            request_pda(&cfg.coordinator_program, 41)
        );
        assert_eq!(ix.accounts[7].pubkey, cfg.coordinator_program);
        assert_eq!(ix.accounts[8].pubkey, program_id);
        assert_eq!(ix.accounts[9].pubkey, SYSTEM_PROGRAM_ID);
        assert!(ix.accounts[1..].iter().all(|meta| !meta.is_signer));
    }

    #[test]
    fn recognizes_upkeep_not_needed() {
        assert!(is_upkeep_not_needed(
            "send_and_confirm_transaction failed: custom program error: 0x1776"
        ));
        assert!(is_upkeep_not_needed("Error Code: UpkeepNotNeeded"));
        assert!(!is_upkeep_not_needed("custom program error: 0x1777"));
        assert!(!is_upkeep_not_needed("BlockhashNotFound"));
    }

    #[test]
    fn compute_unit_price_instruction_layout() {
        let ix = build_set_compute_unit_price_instruction(1_000).unwrap();
        assert_eq!(ix.data[0], 3);
        assert_eq!(ix.data[1..], 1_000u64.to_le_bytes());
        assert!(ix.accounts.is_empty());
    }
}
