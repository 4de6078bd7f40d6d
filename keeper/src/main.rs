//! Lottery keeper
//!
//! Off-chain automation for the lottery program. Runs three concurrent
//! subsystems:
//!
//! - **Listener** — WebSocket subscription to lottery events; wakes the loop.
//! - **Upkeep loop** — polls the round and submits `perform_upkeep` when due.
//! - **HTTP server** — liveness (`/health`), status (`/status`) and the
//!   accounts the coordinator must forward to the settlement callback
//!   (`/callback-accounts`).

use actix_web::{web, App, HttpResponse, HttpServer};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signer;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

mod accounts;
mod config;
mod listener;
mod metrics;
mod upkeep;

use accounts::{fulfillment_callback_accounts, round_pda, RoundView};
use config::AppConfig;
use metrics::Metrics;

struct AppState {
    metrics: Arc<Metrics>,
    rpc_url: String,
    program_id: Pubkey,
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"status": "ok"}))
}

async fn status(data: web::Data<AppState>) -> HttpResponse {
    let unresolved = data
        .metrics
        .round()
        .is_some_and(|round| round.unresolved);
    HttpResponse::Ok().json(serde_json::json!({
        "status": if unresolved { "draw_unresolved" } else { "running" },
        "metrics": data.metrics.to_json(),
    }))
}

/// Remaining accounts for the current round's `fulfill_random_words` callback.
async fn callback_accounts(data: web::Data<AppState>) -> HttpResponse {
    let rpc_client =
        RpcClient::new_with_commitment(data.rpc_url.clone(), CommitmentConfig::confirmed());

    let round = match rpc_client.get_account_data(&round_pda(&data.program_id)).await {
        Ok(bytes) => RoundView::decode(&bytes),
        Err(e) => Err(anyhow::Error::new(e).context("failed to fetch round")),
    };

    match round {
        Ok(round) => {
            let accounts: Vec<_> = fulfillment_callback_accounts(&data.program_id, &round)
                .into_iter()
                .map(|meta| {
                    serde_json::json!({
                        "pubkey": meta.pubkey.to_string(),
                        "is_writable": meta.is_writable,
                    })
                })
                .collect();
            HttpResponse::Ok().json(serde_json::json!({
                "round_id": round.round_id,
                "pending_request": round.pending_request,
                "accounts": accounts,
            }))
        }
        Err(e) => {
            error!(error = %format!("{e:#}"), "Failed to build callback accounts");
            HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "error": format!("{e:#}"),
            }))
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,solana_client=warn,solana_rpc_client=warn,hyper=warn")),
        )
        .with_target(true)
        .with_ansi(true)
        .init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %format!("{e:#}"), "Invalid configuration");
            return Err(std::io::Error::other(format!("{e:#}")));
        }
    };

    info!(
        program = %config.program_id,
        keeper = %config.keeper_keypair.pubkey(),
        poll_interval = ?config.poll_interval,
        "Starting lottery keeper"
    );
    info!(rpc = %config.rpc_url, ws = %config.ws_url, "Endpoints configured");

    let metrics = Arc::new(Metrics::new());
    let (tx, rx) = mpsc::channel(256);

    // Background: stream lottery events and wake the upkeep loop.
    let listener_config = config.clone();
    tokio::spawn(async move {
        listener::listen_for_events(listener_config, tx).await;
    });

    // Background: poll the round and request draws.
    let upkeep_config = config.clone();
    let upkeep_metrics = metrics.clone();
    tokio::spawn(async move {
        upkeep::run_upkeep_loop(upkeep_config, rx, upkeep_metrics).await;
    });

    let state = web::Data::new(AppState {
        metrics,
        rpc_url: config.rpc_url.clone(),
        program_id: config.program_id,
    });

    let addr = ("0.0.0.0", config.http_port);
    info!(port = config.http_port, "Starting HTTP server");

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .route("/health", web::get().to(health))
            .route("/status", web::get().to(status))
            .route("/callback-accounts", web::get().to(callback_accounts))
    })
    .bind(addr)?
    .run()
    .await
}
