//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the codec, jitter, rate limiter and lock against
//! arbitrary inputs.

use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;

use chrono::DateTime;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::cache::codec::{from_scaled, to_scaled};
use crate::cache::jitter::with_jitter;
use crate::cache::rate_limit::window_start;
use crate::cache::{CacheCodec, DistributedLock, MemoryStore, RateLimiter};
use crate::positions::Position;

// == Strategies ==
/// Prices with at most four decimal places, inside the scaled i64 range.
fn price_strategy() -> impl Strategy<Value = Decimal> {
    (-100_000_000_000_000i64..100_000_000_000_000i64).prop_map(|units| Decimal::new(units, 4))
}

fn position_strategy() -> impl Strategy<Value = Position> {
    (
        any::<u128>(),
        "[a-zA-Z0-9_-]{0,64}",
        "[A-Z]{0,32}",
        any::<i64>(),
        price_strategy(),
        -62_135_596_800i64..253_402_300_799i64,
        0u32..1_000_000_000u32,
    )
        .prop_map(|(id, client_id, symbol, quantity, avg_price, secs, nanos)| Position {
            id: Uuid::from_u128(id),
            client_id,
            symbol,
            quantity,
            avg_price,
            updated_at: DateTime::from_timestamp(secs, nanos).unwrap(),
        })
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Decoding an encoded position yields the same position.
    #[test]
    fn prop_position_round_trip(position in position_strategy()) {
        let bytes = position.encode().unwrap();
        prop_assert_eq!(Position::decode(&bytes).unwrap(), position);
    }

    // Lists keep length, order and content, including the empty list.
    #[test]
    fn prop_list_round_trip(list in prop::collection::vec(position_strategy(), 0..8)) {
        let bytes = list.encode().unwrap();
        prop_assert_eq!(Vec::<Position>::decode(&bytes).unwrap(), list);
    }

    // Scaling is exact for values that already have four places or fewer.
    #[test]
    fn prop_scaling_is_exact(units in any::<i64>()) {
        let amount = from_scaled(units);
        prop_assert_eq!(to_scaled(amount).unwrap(), units);
    }

    // Arbitrary bytes either fail to decode or decode into a valid position;
    // decoding never panics.
    #[test]
    fn prop_decode_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..128)) {
        let _ = Position::decode(&bytes);
        let _ = Vec::<Position>::decode(&bytes);
    }

    // A jittered TTL always lies in [base, base + jitter].
    #[test]
    fn prop_jitter_within_bounds(base_secs in 0u64..3_600, jitter in 0u64..120) {
        let base = Duration::from_secs(base_secs);
        let ttl = with_jitter(base, jitter);

        prop_assert!(ttl >= base);
        prop_assert!(ttl <= base + Duration::from_secs(jitter));
    }

    // Window starts are aligned and contain `now`.
    #[test]
    fn prop_window_start_contains_now(now in 0u64..4_000_000_000, window in 1u64..86_400) {
        let start = window_start(now, window);

        prop_assert_eq!(start % window, 0);
        prop_assert!(start <= now && now < start + window);
    }

    // The first `limit` calls pass and every later call in the window fails.
    #[test]
    fn prop_rate_limit_counts(limit in 1u64..20, extra in 0usize..10) {
        let rt = runtime();
        rt.block_on(async {
            let limiter = RateLimiter::new(Arc::new(MemoryStore::new()));
            let key = "prod:default:rl:client:getPosition:0";

            for _ in 0..limit {
                prop_assert!(limiter.allow(key, 10, limit).await);
            }
            for _ in 0..=extra {
                prop_assert!(!limiter.allow(key, 10, limit).await);
            }
            Ok(())
        })?;
    }

    // Only the token that acquired a lock can release it.
    #[test]
    fn prop_lock_release_needs_owner(attempts in 1usize..8) {
        let rt = runtime();
        rt.block_on(async {
            let lock = DistributedLock::new(Arc::new(MemoryStore::new()));
            let ttl = Duration::from_secs(5);
            let owner = lock.try_acquire("lock", ttl).await.unwrap();
            prop_assert!(owner.is_some());

            for _ in 0..attempts {
                prop_assert!(lock.try_acquire("lock", ttl).await.unwrap().is_none());
            }

            let owner = owner.unwrap();
            prop_assert!(lock.release("lock", &owner).await.unwrap());
            prop_assert!(!lock.release("lock", &owner).await.unwrap());
            Ok(())
        })?;
    }
}
