//! Request DTOs for the position API
//!
//! Defines the structure of incoming HTTP request bodies.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::cache::codec::to_scaled;

pub const MAX_CLIENT_ID_LENGTH: usize = 64;
pub const MAX_SYMBOL_LENGTH: usize = 32;

/// Request body for POST /positions
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePositionRequest {
    pub client_id: String,
    pub symbol: String,
    pub quantity: i64,
    pub avg_price: Decimal,
}

impl CreatePositionRequest {
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        validate_text("clientId", &self.client_id, MAX_CLIENT_ID_LENGTH)
            .or_else(|| validate_holding(&self.symbol, self.quantity, self.avg_price))
    }
}

/// Request body for PUT /positions/:id
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePositionRequest {
    pub symbol: String,
    pub quantity: i64,
    pub avg_price: Decimal,
}

impl UpdatePositionRequest {
    pub fn validate(&self) -> Option<String> {
        validate_holding(&self.symbol, self.quantity, self.avg_price)
    }
}

fn validate_text(field: &str, value: &str, max: usize) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Some(format!("{} cannot be blank", field));
    }
    if trimmed.chars().count() > max {
        return Some(format!("{} exceeds maximum length of {} characters", field, max));
    }
    None
}

fn validate_holding(symbol: &str, quantity: i64, avg_price: Decimal) -> Option<String> {
    if let Some(msg) = validate_text("symbol", symbol, MAX_SYMBOL_LENGTH) {
        return Some(msg);
    }
    if quantity < 0 {
        return Some("quantity must be zero or positive".to_string());
    }
    if avg_price.is_sign_negative() && !avg_price.is_zero() {
        return Some("avgPrice must be zero or positive".to_string());
    }
    if to_scaled(avg_price).is_err() {
        return Some("avgPrice exceeds the supported range".to_string());
    }
    None
}
