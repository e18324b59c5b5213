//! Cart pricing.
//!
//! Pure functions over cart items: no I/O, no clock, no state. Prices arrive
//! from the storefront as display strings ("₹2,999") and are normalized here
//! into integer minor units; all downstream money stays integral.

use crate::cart::CartItem;
use crate::errors::ServiceError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Basis points in a whole.
const BPS_SCALE: i64 = 10_000;

/// Computed totals for a cart, in integer minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Pricing {
    pub subtotal: i64,
    pub tax_amount: i64,
    pub total_amount: i64,
}

/// Parses a display price into a non-negative integer amount.
///
/// Leading currency symbols, whitespace and thousand separators are
/// stripped; anything else left over (letters, decimals, signs) rejects the
/// whole string rather than guessing.
pub fn parse_price(raw: &str) -> Result<i64, ServiceError> {
    let compact: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .collect();

    if compact.contains('-') {
        return Err(ServiceError::InvalidPriceFormat(raw.to_string()));
    }

    // Whatever precedes the digits must be symbols (₹, $, ...), not text.
    let digits = compact.trim_start_matches(|c: char| !c.is_ascii_alphanumeric());

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ServiceError::InvalidPriceFormat(raw.to_string()));
    }

    digits
        .parse::<i64>()
        .map_err(|_| ServiceError::InvalidPriceFormat(raw.to_string()))
}

/// Tax on a subtotal at the given rate, rounded half-up to the nearest unit.
pub fn tax_for(subtotal: i64, tax_rate_bps: u32) -> Result<i64, ServiceError> {
    subtotal
        .checked_mul(tax_rate_bps as i64)
        .map(|scaled| (scaled + BPS_SCALE / 2) / BPS_SCALE)
        .ok_or_else(|| ServiceError::ValidationError("cart total too large".to_string()))
}

/// Prices a cart: subtotal is the sum of parsed item prices, tax is a fixed
/// rate on the subtotal, total is their sum.
pub fn price_cart(items: &[CartItem], tax_rate_bps: u32) -> Result<Pricing, ServiceError> {
    let mut subtotal: i64 = 0;
    for item in items {
        let price = parse_price(&item.price)?;
        subtotal = subtotal
            .checked_add(price)
            .ok_or_else(|| ServiceError::ValidationError("cart total too large".to_string()))?;
    }

    let tax_amount = tax_for(subtotal, tax_rate_bps)?;

    Ok(Pricing {
        subtotal,
        tax_amount,
        total_amount: subtotal + tax_amount,
    })
}
