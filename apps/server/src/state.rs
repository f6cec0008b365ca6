//! Shared server state: pool, RNG, and the injected TTL caches.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use persistence::NetworkEntry;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sim_core::constants::{NETWORK_CACHE_SECONDS, REPUTATION_CACHE_SECONDS, TECH_CACHE_TTL_MS};
use sim_core::AcquiredTech;
use sim_engine::TtlCache;
use sqlx::SqlitePool;

/// One entry of the cached network projection.
#[derive(Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkBusiness {
    pub business_name: String,
    pub tech_level: i64,
    pub orders_shipped: i64,
    pub reputation: u8,
}

impl NetworkBusiness {
    pub fn from_entry(entry: &NetworkEntry, reputation: u8) -> Self {
        Self {
            business_name: entry.business_name.clone(),
            tech_level: entry.tech_level,
            orders_shipped: entry.orders_shipped,
            reputation,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub rng: Arc<Mutex<ChaCha8Rng>>,
    /// Acquired-technology lists, keyed by business, ~2s TTL.
    pub tech_cache: Arc<TtlCache<i64, Vec<AcquiredTech>>>,
    /// Reputation scores, keyed by business, 60s TTL.
    pub reputation_cache: Arc<TtlCache<i64, u8>>,
    /// The network projection, one shared entry.
    pub network_cache: Arc<TtlCache<(), Vec<NetworkBusiness>>>,
}

impl AppState {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            rng: Arc::new(Mutex::new(ChaCha8Rng::from_entropy())),
            tech_cache: Arc::new(TtlCache::new(Duration::from_millis(TECH_CACHE_TTL_MS))),
            reputation_cache: Arc::new(TtlCache::new(Duration::from_secs(
                REPUTATION_CACHE_SECONDS,
            ))),
            network_cache: Arc::new(TtlCache::new(Duration::from_secs(NETWORK_CACHE_SECONDS))),
        }
    }

    /// A fresh session token from the server RNG.
    pub fn new_token(&self) -> String {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        let bytes: u128 = rand::Rng::gen(&mut *rng);
        format!("{bytes:032x}")
    }
}
