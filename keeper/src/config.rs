//! Keeper configuration loaded from environment variables.
//!
//! Required: `PROGRAM_ID`
//! Optional: `RPC_URL`, `WS_URL`, `KEEPER_KEYPAIR_PATH`, `CLUSTER`,
//!           `HTTP_PORT`, `MAX_RETRIES`, `INITIAL_RETRY_DELAY_MS`,
//!           `PRIORITY_FEE_MICRO_LAMPORTS`, `POLL_INTERVAL_SECS`,
//!           `UNRESOLVED_AFTER_SECS`

use anyhow::{Context, Result};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{read_keypair_file, Keypair};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Default seconds a draw may stay unfulfilled before it is reported.
pub const DEFAULT_UNRESOLVED_AFTER_SECS: i64 = 600;

#[derive(Clone)]
pub struct AppConfig {
    /// Solana JSON-RPC endpoint (HTTP).
    pub rpc_url: String,
    /// Solana PubSub endpoint (WebSocket) for log subscriptions.
    pub ws_url: String,
    /// Signs and pays for `perform_upkeep` transactions.
    pub keeper_keypair: Arc<Keypair>,
    /// The deployed lottery program ID.
    pub program_id: Pubkey,
    /// Cluster name for explorer URLs.
    pub cluster: String,
    pub http_port: u16,
    /// Maximum send attempts per upkeep transaction.
    pub max_retries: u32,
    pub initial_retry_delay_ms: u64,
    /// Priority fee in micro-lamports per compute unit.
    pub priority_fee_micro_lamports: u64,
    /// How often the round is polled when no event arrives.
    pub poll_interval: Duration,
    /// Seconds in `Drawing` after which a round is reported as unresolved.
    pub unresolved_after_secs: i64,
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let rpc_url = std::env::var("RPC_URL").unwrap_or_else(|_| "http://127.0.0.1:8899".into());
        let ws_url = std::env::var("WS_URL").unwrap_or_else(|_| "ws://127.0.0.1:8900".into());

        let keypair_path = std::env::var("KEEPER_KEYPAIR_PATH")
            .unwrap_or_else(|_| "~/.config/solana/id.json".into());
        let keypair_path = shellexpand::tilde(&keypair_path).to_string();
        let keeper_keypair = read_keypair_file(&keypair_path)
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("failed to read keypair from {keypair_path}"))?;

        let program_id_str = std::env::var("PROGRAM_ID").context("PROGRAM_ID env var must be set")?;
        let program_id = Pubkey::from_str(&program_id_str)
            .with_context(|| format!("invalid PROGRAM_ID: {program_id_str}"))?;

        let cluster = std::env::var("CLUSTER").unwrap_or_else(|_| "devnet".into());

        let poll_interval_secs: u64 = env_or("POLL_INTERVAL_SECS", 15);
        anyhow::ensure!(poll_interval_secs > 0, "POLL_INTERVAL_SECS must be positive");

        Ok(Self {
            rpc_url,
            ws_url,
            keeper_keypair: Arc::new(keeper_keypair),
            program_id,
            cluster,
            http_port: env_or("HTTP_PORT", 8080),
            max_retries: env_or("MAX_RETRIES", 5),
            initial_retry_delay_ms: env_or("INITIAL_RETRY_DELAY_MS", 500),
            priority_fee_micro_lamports: env_or("PRIORITY_FEE_MICRO_LAMPORTS", 0),
            poll_interval: Duration::from_secs(poll_interval_secs),
            unresolved_after_secs: env_or("UNRESOLVED_AFTER_SECS", DEFAULT_UNRESOLVED_AFTER_SECS),
        })
    }

    /// Return the Solscan explorer URL for a given transaction signature.
    pub fn explorer_url(&self, signature: &str) -> String {
        match self.cluster.as_str() {
            "mainnet-beta" => format!("https://solscan.io/tx/{signature}"),
            cluster => format!("https://solscan.io/tx/{signature}?cluster={cluster}"),
        }
    }
}
