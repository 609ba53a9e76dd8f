//! Binary Codec
//!
//! Compact protobuf envelopes for cached positions. Prices travel as integers
//! scaled by 10^4 (half-up on encode, exact on decode) and timestamps as epoch
//! seconds plus nanoseconds, so a decoded value is identical to the encoded
//! one.
//!
//! A position list with no items encodes to a zero-length payload. Stored
//! under a key, that payload is still a present value, and decodes to an
//! empty list rather than to a miss.

use chrono::{DateTime, Utc};
use prost::Message;
use rust_decimal::{Decimal, RoundingStrategy};
use uuid::Uuid;

use crate::error::{DecodeError, EncodeError};
use crate::positions::Position;

/// Decimal places kept for monetary amounts.
pub const PRICE_SCALE: u32 = 4;

// == Wire Messages ==
#[derive(Clone, PartialEq, Message)]
pub struct PositionMessage {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub client_id: String,
    #[prost(string, tag = "3")]
    pub symbol: String,
    #[prost(int64, tag = "4")]
    pub quantity: i64,
    #[prost(int64, tag = "5")]
    pub avg_price_scaled: i64,
    #[prost(message, optional, tag = "6")]
    pub updated_at: Option<TimestampMessage>,
}

#[derive(Clone, PartialEq, Message)]
pub struct TimestampMessage {
    #[prost(int64, tag = "1")]
    pub seconds: i64,
    #[prost(int32, tag = "2")]
    pub nanos: i32,
}

#[derive(Clone, PartialEq, Message)]
pub struct PositionListMessage {
    #[prost(message, repeated, tag = "1")]
    pub items: Vec<PositionMessage>,
}

// == Codec Trait ==
/// Values the cache-aside orchestrator can store.
pub trait CacheCodec: Sized {
    fn encode(&self) -> Result<Vec<u8>, EncodeError>;
    fn decode(bytes: &[u8]) -> Result<Self, DecodeError>;
}

impl CacheCodec for Position {
    fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        Ok(to_message(self)?.encode_to_vec())
    }

    fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.is_empty() {
            return Err(DecodeError::Empty);
        }
        from_message(PositionMessage::decode(bytes)?)
    }
}

impl CacheCodec for Vec<Position> {
    fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        let items = self
            .iter()
            .map(to_message)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PositionListMessage { items }.encode_to_vec())
    }

    fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        PositionListMessage::decode(bytes)?
            .items
            .into_iter()
            .map(from_message)
            .collect()
    }
}

// == Field Mapping ==
fn to_message(position: &Position) -> Result<PositionMessage, EncodeError> {
    Ok(PositionMessage {
        id: position.id.to_string(),
        client_id: position.client_id.clone(),
        symbol: position.symbol.clone(),
        quantity: position.quantity,
        avg_price_scaled: to_scaled(position.avg_price)?,
        updated_at: Some(to_timestamp(position.updated_at)),
    })
}

fn from_message(msg: PositionMessage) -> Result<Position, DecodeError> {
    let id = Uuid::parse_str(&msg.id).map_err(|e| DecodeError::Field {
        field: "id",
        reason: e.to_string(),
    })?;
    let updated_at = msg.updated_at.ok_or(DecodeError::Field {
        field: "updated_at",
        reason: "missing".to_string(),
    })?;

    Ok(Position {
        id,
        client_id: msg.client_id,
        symbol: msg.symbol,
        quantity: msg.quantity,
        avg_price: from_scaled(msg.avg_price_scaled),
        updated_at: from_timestamp(&updated_at)?,
    })
}

/// Rounds half-up to `PRICE_SCALE` places and returns the unscaled integer.
pub fn to_scaled(amount: Decimal) -> Result<i64, EncodeError> {
    let mut rounded = amount.round_dp_with_strategy(PRICE_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(PRICE_SCALE);
    i64::try_from(rounded.mantissa()).map_err(|_| EncodeError::AmountOutOfRange(amount))
}

pub fn from_scaled(scaled: i64) -> Decimal {
    Decimal::new(scaled, PRICE_SCALE)
}

/// The amount exactly as it reads back from the cache.
pub fn normalize_amount(amount: Decimal) -> Result<Decimal, EncodeError> {
    to_scaled(amount).map(from_scaled)
}

fn to_timestamp(at: DateTime<Utc>) -> TimestampMessage {
    TimestampMessage {
        seconds: at.timestamp(),
        nanos: at.timestamp_subsec_nanos() as i32,
    }
}

fn from_timestamp(ts: &TimestampMessage) -> Result<DateTime<Utc>, DecodeError> {
    let nanos = u32::try_from(ts.nanos)
        .ok()
        .filter(|n| *n < 1_000_000_000)
        .ok_or(DecodeError::Field {
            field: "updated_at.nanos",
            reason: format!("{} out of range", ts.nanos),
        })?;

    DateTime::from_timestamp(ts.seconds, nanos).ok_or(DecodeError::Field {
        field: "updated_at.seconds",
        reason: format!("{} out of range", ts.seconds),
    })
}
