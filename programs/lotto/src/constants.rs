/// Seed of the singleton [`LotteryConfig`](crate::state::LotteryConfig) PDA.
pub const CONFIG_SEED: &[u8] = b"lotto-config";

/// Seed of the singleton [`Round`](crate::state::Round) PDA, which also holds the pot lamports.
pub const ROUND_SEED: &[u8] = b"round";

/// Seed the coordinator uses for the config PDA that signs fulfillment callbacks.
pub const COORDINATOR_CONFIG_SEED: &[u8] = b"coordinator-config";

/// Numbers on every ticket, and random words requested per draw.
pub const NUMBERS_PER_TICKET: usize = 6;

/// Lowest number a player may pick.
pub const MIN_NUMBER: u8 = 1;

/// Highest number a player may pick.
pub const MAX_NUMBER: u8 = 50;

/// Drawn numbers are `word % DRAW_MODULUS + 1`, so 50 is never drawn.
pub const DRAW_MODULUS: u16 = 49;

/// Matches needed for a ticket to share the pot.
pub const REQUIRED_MATCHES: u8 = 3;

/// Entrant capacity of a round.
///
/// Every entrant wallet is forwarded to the callback, and the oracle's
/// fulfillment transaction (priority fee, ed25519 verify, coordinator
/// `fulfill_random_words`) stays under the 1232-byte packet limit up to 16.
pub const MAX_ENTRANTS: usize = 16;

/// Denominator of `fee_per_mille`.
pub const PER_MILLE: u64 = 1_000;
