use anchor_lang::prelude::*;

/// Emitted when a player buys a ticket.
///
/// The keeper watches for this event to re-evaluate the draw trigger early.
#[event]
pub struct EntrantRegistered {
    pub round_id: u64,
    pub player: Pubkey,
    pub numbers: [u8; 6],
    pub amount: u64,
}

/// Emitted when a draw is requested from the coordinator.
#[event]
pub struct DrawRequested {
    pub round_id: u64,
    pub request_id: u64,
    pub prize_pool: u64,
    pub entrant_count: u32,
}

/// Emitted once per winner during settlement.
#[event]
pub struct WinnerPaid {
    pub round_id: u64,
    pub winner: Pubkey,
    pub amount: u64,
}

/// Emitted when a round is settled and reset.
#[event]
pub struct DrawSettled {
    pub round_id: u64,
    pub request_id: u64,
    pub winning_numbers: [u8; 6],
    pub winner_count: u32,
    pub share: u64,
    /// Prize pool carried into the next round (non-zero only without winners).
    pub rollover: u64,
}

/// Emitted when the admin drains the fee pool.
#[event]
pub struct FeesWithdrawn {
    pub admin: Pubkey,
    pub amount: u64,
}
