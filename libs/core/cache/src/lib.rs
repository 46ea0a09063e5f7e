// [libs/core/cache/src/lib.rs]
//! Deterministic memoisation and invalidation for the monthly water
//! balance. Not a general object cache: the balance
//! cache is keyed by the Calculator's semantic inputs, the facility
//! cache expires on a plain TTL, and invalidation is always an
//! explicit caller action, never inferred from writes this crate
//! cannot see.

pub mod cache;
pub mod facility_cache;
pub mod key;
pub mod listener;
pub mod source_watch;
pub mod stats;

pub use cache::BalanceCache;
pub use facility_cache::FacilityCache;
pub use key::BalanceKey;
pub use listener::{Listener, ListenerRegistry};
pub use source_watch::{SourceKind, SourcePathWatch};
pub use stats::CacheStatsSnapshot;
