//! Position Model
//!
//! The record served by the cache-aside read path.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One holding of a symbol by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub id: Uuid,
    /// Owning client; positions are grouped by it
    pub client_id: String,
    pub symbol: String,
    pub quantity: i64,
    /// Average acquisition price
    pub avg_price: Decimal,
    pub updated_at: DateTime<Utc>,
}

impl Position {
    /// Creates a position with a fresh id, stamped now.
    pub fn new(
        client_id: impl Into<String>,
        symbol: impl Into<String>,
        quantity: i64,
        avg_price: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            client_id: client_id.into(),
            symbol: symbol.into(),
            quantity,
            avg_price,
            updated_at: Utc::now(),
        }
    }
}
