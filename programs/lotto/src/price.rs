//! Fiat ticket price → lamports, using a Pyth v2 price account.
//!
//! The price account is parsed by offset rather than through an SDK:
//!
//! ```text
//! [0..4]      magic         (u32)  0xa1b2c3d4
//! [20..24]    exponent      (i32)  e.g. -8
//! [96..104]   timestamp     (i64)  publish time of the aggregate
//! [208..216]  agg.price     (i64)
//! ```

use anchor_lang::prelude::*;

use crate::errors::LottoError;

const PYTH_MAGIC: u32 = 0xa1b2_c3d4;
const EXPONENT_OFFSET: usize = 20;
const TIMESTAMP_OFFSET: usize = 96;
const AGG_PRICE_OFFSET: usize = 208;
const MIN_PRICE_ACCOUNT_LEN: usize = AGG_PRICE_OFFSET + 8;

/// Widest exponent accepted from a feed.
const MAX_FEED_DECIMALS: u32 = 18;

/// Latest aggregate price read from the oracle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PriceReading {
    /// Fiat price of one native unit, scaled by `10^decimals`.
    pub price: i64,
    pub decimals: u32,
    pub publish_time: i64,
}

fn read_array<const N: usize>(data: &[u8], offset: usize) -> Result<[u8; N]> {
    data.get(offset..offset + N)
        .and_then(|slice| slice.try_into().ok())
        .ok_or_else(|| error!(LottoError::InvalidPriceFeed))
}

impl PriceReading {
    /// Parse the aggregate price out of raw Pyth v2 price account data.
    pub fn from_pyth_account(data: &[u8]) -> Result<Self> {
        require!(
            data.len() >= MIN_PRICE_ACCOUNT_LEN,
            LottoError::InvalidPriceFeed
        );
        let magic = u32::from_le_bytes(read_array(data, 0)?);
        require!(magic == PYTH_MAGIC, LottoError::InvalidPriceFeed);

        let exponent = i32::from_le_bytes(read_array(data, EXPONENT_OFFSET)?);
        require!(exponent <= 0, LottoError::InvalidPriceFeed);
        let decimals = exponent.unsigned_abs();
        require!(decimals <= MAX_FEED_DECIMALS, LottoError::InvalidPriceFeed);

        Ok(Self {
            price: i64::from_le_bytes(read_array(data, AGG_PRICE_OFFSET)?),
            decimals,
            publish_time: i64::from_le_bytes(read_array(data, TIMESTAMP_OFFSET)?),
        })
    }

    /// Fail with `StalePrice` when the reading is older than `max_age` seconds.
    pub fn ensure_fresh(&self, now: i64, max_age: i64) -> Result<()> {
        let age = now.saturating_sub(self.publish_time);
        require!(age <= max_age, LottoError::StalePrice);
        Ok(())
    }
}

/// Lamports whose market value equals `fiat_amount`.
///
/// `fiat_amount` carries the native unit's 9 decimals (5 USD = `5_000_000_000`).
/// Computes `fiat * 10^9 / (price * 10^(9 - feed_decimals))` in its reduced form
/// `fiat * 10^feed_decimals / price`, flooring once at the end.
pub fn convert(fiat_amount: u64, price: i64, feed_decimals: u32) -> Result<u64> {
    require!(price > 0, LottoError::InvalidPrice);
    require!(
        feed_decimals <= MAX_FEED_DECIMALS,
        LottoError::InvalidPriceFeed
    );

    let scaled = (fiat_amount as u128)
        .checked_mul(10u128.pow(feed_decimals))
        .ok_or(LottoError::MathOverflow)?;
    let lamports = scaled / price as u128;
    u64::try_from(lamports).map_err(|_| error!(LottoError::MathOverflow))
}

/// Current ticket price in lamports, rejecting stale or non-positive prices.
pub fn ticket_price(fiat_amount: u64, reading: &PriceReading, now: i64, max_age: i64) -> Result<u64> {
    reading.ensure_fresh(now, max_age)?;
    convert(fiat_amount, reading.price, reading.decimals)
}
