use anchor_lang::prelude::*;

/// Error codes for the lotto program.
///
/// Anchor encodes these as `6000 + variant index` in on-chain error responses.
#[error_code]
pub enum LottoError {
    /// Registration attempted while a draw is in flight.
    #[msg("Round is not open")]
    RoundNotOpen,
    /// The player already holds a ticket in the current round.
    #[msg("Player is already registered in this round")]
    AlreadyRegistered,
    /// The lamports offered are below the converted ticket price.
    #[msg("Not enough lamports for a ticket")]
    InsufficientEntryValue,
    /// A ticket must carry exactly six numbers.
    #[msg("Ticket must have exactly 6 numbers")]
    InvalidPredictionLength,
    /// A picked number is outside `1..=50`.
    #[msg("Ticket number out of range")]
    NumberOutOfRange,
    /// The round has reached `MAX_ENTRANTS`.
    #[msg("Round is full")]
    RoundFull,
    /// `perform_upkeep` was called while the draw trigger does not hold.
    #[msg("Upkeep not needed")]
    UpkeepNotNeeded,
    /// A fulfillment arrived while no draw is in flight.
    #[msg("Round is not drawing")]
    RoundNotDrawing,
    /// The fulfilled request id is not the pending one.
    #[msg("Fulfillment does not match the pending request")]
    RequestMismatch,
    /// The coordinator delivered a number of words other than six.
    #[msg("Expected exactly 6 random words")]
    InvalidRandomWords,
    /// A winner could not be paid; the whole settlement is rolled back.
    #[msg("Payout transfer failed")]
    PayoutTransferFailed,
    /// The oracle reported a non-positive price.
    #[msg("Oracle price is not positive")]
    InvalidPrice,
    /// The oracle price is older than `max_price_age`.
    #[msg("Oracle price is stale")]
    StalePrice,
    /// The price account is not a readable Pyth price account.
    #[msg("Invalid price feed account")]
    InvalidPriceFeed,
    /// Signer does not have permission for this action.
    #[msg("Unauthorized")]
    Unauthorized,
    /// An initialization parameter is out of bounds.
    #[msg("Invalid configuration")]
    InvalidConfig,
    /// Checked arithmetic overflowed.
    #[msg("Math overflow")]
    MathOverflow,
    /// The prize pool was split among zero winners.
    #[msg("No winners to split the pool between")]
    NoWinners,
}
