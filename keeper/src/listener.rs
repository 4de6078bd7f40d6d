//! Live stream of lottery events.
//!
//! Subscribes to program logs via WebSocket, decodes the Anchor events the
//! lottery emits, and forwards them to the upkeep loop so it can re-check the
//! round without waiting for the next poll. Reconnects on disconnection.

use base64::Engine;
use sha2::{Digest, Sha256};
use solana_client::nonblocking::pubsub_client::PubsubClient;
use solana_client::rpc_config::{RpcTransactionLogsConfig, RpcTransactionLogsFilter};
use solana_commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::AppConfig;

/// Delay before reconnecting to the WebSocket after a disconnect or error.
const WS_RECONNECT_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LottoEvent {
    EntrantRegistered {
        round_id: u64,
        player: Pubkey,
        numbers: [u8; 6],
        amount: u64,
    },
    DrawRequested {
        round_id: u64,
        request_id: u64,
        prize_pool: u64,
        entrant_count: u32,
    },
    WinnerPaid {
        round_id: u64,
        winner: Pubkey,
        amount: u64,
    },
    DrawSettled {
        round_id: u64,
        request_id: u64,
        winning_numbers: [u8; 6],
        winner_count: u32,
        share: u64,
        rollover: u64,
    },
    FeesWithdrawn {
        admin: Pubkey,
        amount: u64,
    },
}

/// Compute the Anchor event discriminator: `sha256("event:<Name>")[..8]`.
fn event_discriminator(event_name: &str) -> [u8; 8] {
    let mut hasher = Sha256::new();
    hasher.update(format!("event:{event_name}"));
    let hash = hasher.finalize();
    let mut disc = [0u8; 8];
    disc.copy_from_slice(&hash[..8]);
    disc
}

fn u64_at(data: &[u8], offset: usize) -> Option<u64> {
    Some(u64::from_le_bytes(data.get(offset..offset + 8)?.try_into().ok()?))
}

fn u32_at(data: &[u8], offset: usize) -> Option<u32> {
    Some(u32::from_le_bytes(data.get(offset..offset + 4)?.try_into().ok()?))
}

fn pubkey_at(data: &[u8], offset: usize) -> Option<Pubkey> {
    Pubkey::try_from(data.get(offset..offset + 32)?).ok()
}

fn numbers_at(data: &[u8], offset: usize) -> Option<[u8; 6]> {
    data.get(offset..offset + 6)?.try_into().ok()
}

/// Decode one `Program data:` payload (discriminator included).
pub fn parse_event(data: &[u8]) -> Option<LottoEvent> {
    let disc: [u8; 8] = data.get(..8)?.try_into().ok()?;
    let body = &data[8..];

    if disc == event_discriminator("EntrantRegistered") {
        Some(LottoEvent::EntrantRegistered {
            round_id: u64_at(body, 0)?,
            player: pubkey_at(body, 8)?,
            numbers: numbers_at(body, 40)?,
            amount: u64_at(body, 46)?,
        })
    } else if disc == event_discriminator("DrawRequested") {
        Some(LottoEvent::DrawRequested {
            round_id: u64_at(body, 0)?,
            request_id: u64_at(body, 8)?,
            prize_pool: u64_at(body, 16)?,
            entrant_count: u32_at(body, 24)?,
        })
    } else if disc == event_discriminator("WinnerPaid") {
        Some(LottoEvent::WinnerPaid {
            round_id: u64_at(body, 0)?,
            winner: pubkey_at(body, 8)?,
            amount: u64_at(body, 40)?,
        })
    } else if disc == event_discriminator("DrawSettled") {
        Some(LottoEvent::DrawSettled {
            round_id: u64_at(body, 0)?,
            request_id: u64_at(body, 8)?,
            winning_numbers: numbers_at(body, 16)?,
            winner_count: u32_at(body, 22)?,
            share: u64_at(body, 26)?,
            rollover: u64_at(body, 34)?,
        })
    } else if disc == event_discriminator("FeesWithdrawn") {
        Some(LottoEvent::FeesWithdrawn {
            admin: pubkey_at(body, 0)?,
            amount: u64_at(body, 32)?,
        })
    } else {
        None
    }
}

/// Collect every lottery event in a transaction's log lines.
///
/// Anchor emits events as base64-encoded `Program data:` entries; anything
/// else, including events of other programs, is skipped.
pub fn parse_log_lines(logs: &[String]) -> Vec<LottoEvent> {
    let mut events = Vec::new();
    for log_line in logs {
        let Some(data_str) = log_line.strip_prefix("Program data: ") else {
            continue;
        };

        let decoded = match base64::engine::general_purpose::STANDARD.decode(data_str.trim()) {
            Ok(d) => d,
            Err(e) => {
                debug!(error = %e, "Failed to decode base64 log data");
                continue;
            }
        };

        if let Some(event) = parse_event(&decoded) {
            events.push(event);
        }
    }
    events
}

fn log_event(event: &LottoEvent) {
    match event {
        LottoEvent::EntrantRegistered { round_id, player, numbers, amount } => {
            info!(round_id, player = %player, numbers = ?numbers, amount, "Entrant registered");
        }
        LottoEvent::DrawRequested { round_id, request_id, prize_pool, entrant_count } => {
            info!(round_id, request_id, prize_pool, entrant_count, "Draw requested");
        }
        LottoEvent::WinnerPaid { round_id, winner, amount } => {
            info!(round_id, winner = %winner, amount, "Winner paid");
        }
        LottoEvent::DrawSettled { round_id, request_id, winning_numbers, winner_count, share, rollover } => {
            info!(
                round_id,
                request_id,
                numbers = ?winning_numbers,
                winner_count,
                share,
                rollover,
                "Draw settled"
            );
        }
        LottoEvent::FeesWithdrawn { admin, amount } => {
            info!(admin = %admin, amount, "Fees withdrawn");
        }
    }
}

/// Subscribe to program logs and forward lottery events to the upkeep loop.
pub async fn listen_for_events(config: AppConfig, tx: mpsc::Sender<LottoEvent>) {
    loop {
        info!(url = %config.ws_url, "Connecting to WebSocket");

        match PubsubClient::new(&config.ws_url).await {
            Ok(pubsub) => {
                info!("WebSocket connected");

                let filter =
                    RpcTransactionLogsFilter::Mentions(vec![config.program_id.to_string()]);
                let logs_config = RpcTransactionLogsConfig {
                    commitment: Some(CommitmentConfig::confirmed()),
                };

                match pubsub.logs_subscribe(filter, logs_config).await {
                    Ok((mut stream, _unsub)) => {
                        use futures_util::StreamExt;
                        while let Some(log_result) = stream.next().await {
                            if log_result.value.err.is_some() {
                                continue;
                            }
                            for event in parse_log_lines(&log_result.value.logs) {
                                log_event(&event);
                                if tx.send(event).await.is_err() {
                                    error!("Channel closed, stopping listener");
                                    return;
                                }
                            }
                        }
                        warn!("WebSocket stream ended, reconnecting");
                    }
                    Err(e) => {
                        error!(error = %e, "Failed to subscribe to logs");
                    }
                }
            }
            Err(e) => {
                error!(error = %e, "Failed to connect to WebSocket");
            }
        }

        info!(delay = ?WS_RECONNECT_DELAY, "Reconnecting");
        tokio::time::sleep(WS_RECONNECT_DELAY).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program_data(name: &str, body: &[u8]) -> String {
        let mut data = event_discriminator(name).to_vec();
        data.extend_from_slice(body);
        format!(
            "Program data: {}",
            base64::engine::general_purpose::STANDARD.encode(data)
        )
    }

    #[test]
    fn parses_entrant_registered() {
        let player = Pubkey::new_from_array([4u8; 32]);
        let mut body = 7u64.to_le_bytes().to_vec();
        body.extend_from_slice(player.as_ref());
        body.extend_from_slice(&[1, 2, 3, 4, 5, 50]);
        body.extend_from_slice(&33_333_333u64.to_le_bytes());

        let events = parse_log_lines(&[program_data("EntrantRegistered", &body)]);
        assert_eq!(
            events,
            vec![LottoEvent::EntrantRegistered {
                round_id: 7,
                player,
                numbers: [1, 2, 3, 4, 5, 50],
                amount: 33_333_333,
            }]
        );
    }

    #[test]
    fn parses_draw_settled() {
        let mut body = 2u64.to_le_bytes().to_vec();
        body.extend_from_slice(&9u64.to_le_bytes());
        body.extend_from_slice(&[1, 2, 3, 4, 5, 6]);
        body.extend_from_slice(&2u32.to_le_bytes());
        body.extend_from_slice(&1_425u64.to_le_bytes());
        body.extend_from_slice(&0u64.to_le_bytes());

        let event = parse_event(&{
            let mut data = event_discriminator("DrawSettled").to_vec();
            data.extend_from_slice(&body);
            data
        });
        assert_eq!(
            event,
            Some(LottoEvent::DrawSettled {
                round_id: 2,
                request_id: 9,
                winning_numbers: [1, 2, 3, 4, 5, 6],
                winner_count: 2,
                share: 1_425,
                rollover: 0,
            })
        );
    }

    #[test]
    fn skips_unrelated_and_truncated_lines() {
        let logs = vec![
            "Program log: Instruction: Play".to_string(),
            "Program data: not-base64!".to_string(),
            program_data("RandomWordsRequested", &[0u8; 64]),
            program_data("DrawRequested", &[0u8; 10]),
            program_data("FeesWithdrawn", &[0u8; 40]),
        ];
        assert_eq!(
            parse_log_lines(&logs),
            vec![LottoEvent::FeesWithdrawn {
                admin: Pubkey::new_from_array([0u8; 32]),
                amount: 0,
            }]
        );
    }
}
