use anchor_lang::prelude::*;

pub mod constants;
pub mod coordinator;
pub mod errors;
pub mod events;
pub mod instructions;
pub mod ledger;
pub mod pot;
pub mod price;
pub mod registry;
pub mod settlement;
pub mod state;
pub mod trigger;

use instructions::*;

declare_id!("3TEWMTQgH9bH8LwW8m1zhCLD81yPtjmyE6JXbruhJe6v");

/// Six-number lottery settled with VRF randomness.
///
/// Players buy one ticket per round, priced in fiat and converted to lamports
/// through a Pyth feed. Once the draw interval has elapsed anyone may start a
/// draw; the coordinator answers with six random words and the round is
/// settled in the same callback.
///
/// ## Round lifecycle
///
/// 1. **Open** — `play` registers tickets; entry lamports land on the round PDA.
/// 2. **Draw** — `perform_upkeep` re-checks the trigger, moves the round to
///    `Drawing` and requests random words from the coordinator.
/// 3. **Settle** — the coordinator CPIs `fulfill_random_words`; every ticket
///    with at least three matches shares the prize pool, then the round
///    reopens. Without a winner the pool rolls over.
#[program]
pub mod lotto {
    use super::*;

    /// Create the config and round PDAs.
    ///
    /// Must be called exactly once. The caller becomes the admin.
    pub fn initialize(ctx: Context<Initialize>, params: InitializeParams) -> Result<()> {
        instructions::initialize::handler(ctx, params)
    }

    /// Buy a ticket for the open round.
    ///
    /// `amount` lamports are moved from the player to the pot and must cover
    /// the current ticket price. Emits [`events::EntrantRegistered`].
    pub fn play(ctx: Context<Play>, numbers: Vec<u8>, amount: u64) -> Result<()> {
        instructions::play::handler(ctx, numbers, amount)
    }

    /// Whether a draw may be started now. Read-only.
    pub fn check_upkeep(ctx: Context<CheckUpkeep>) -> Result<bool> {
        instructions::check_upkeep::handler(ctx)
    }

    /// Start a draw if the trigger holds, requesting six random words.
    pub fn perform_upkeep(ctx: Context<PerformUpkeep>) -> Result<()> {
        instructions::perform_upkeep::handler(ctx)
    }

    /// Coordinator callback delivering the random words of a draw.
    ///
    /// Only the coordinator's config PDA may sign this instruction.
    pub fn fulfill_random_words<'info>(
        ctx: Context<'_, '_, '_, 'info, FulfillRandomWords<'info>>,
        request_id: u64,
        random_words: Vec<[u8; 32]>,
    ) -> Result<()> {
        instructions::fulfill_random_words::handler(ctx, request_id, random_words)
    }

    /// Move the accrued fee pool to the admin.
    pub fn withdraw_fees(ctx: Context<WithdrawFees>) -> Result<()> {
        instructions::withdraw_fees::handler(ctx)
    }

    /// Current ticket price in lamports.
    pub fn ticket_price(ctx: Context<TicketPrice>) -> Result<u64> {
        instructions::ticket_price::handler(ctx)
    }
}
