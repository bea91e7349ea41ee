//! Remote embedding store.
//!
//! The store holds one row per camera. `upsert` is the write the hosted
//! workflow performs after computing an embedding; the poller itself never
//! calls it. `seed` renders the SQL that creates the initial rows.

pub mod seed;
pub mod upsert;

pub use seed::{seed_sql, DEFAULT_EMBEDDING_DIMENSION};
pub use upsert::{StoreClient, UpsertStatus, DEFAULT_TABLE};

/// Attach the store's service key as both `apikey` and bearer token.
pub(crate) fn authorize(request: ureq::Request, key: &str) -> ureq::Request {
    request
        .set("apikey", key)
        .set("Authorization", &format!("Bearer {}", key))
}
