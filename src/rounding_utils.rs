use rust_decimal::Decimal;
use rust_decimal::prelude::*;

pub const WEIGHT_DECIMALS: u32 = 4;
pub const PRICE_DECIMALS: u32 = 2;

/// Round an f64 to `dp` decimal places through `Decimal` (midpoints go to the even digit).
/// Values `Decimal` cannot represent are returned unchanged.
pub fn round_dp(value: f64, dp: u32) -> f64 {
    match Decimal::from_f64(value) {
        Some(d) => d.round_dp(dp).to_f64().unwrap_or(value),
        None => value,
    }
}

pub fn round_weight(value: f64) -> f64 {
    round_dp(value, WEIGHT_DECIMALS)
}

pub fn round_price(value: f64) -> f64 {
    round_dp(value, PRICE_DECIMALS)
}
