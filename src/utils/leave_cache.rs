use crate::error::ApiError;
use crate::model::leave_policy::{Allocation, LeavePolicy};
use moka::future::Cache;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Read-through cache for the company policy and per-employee allocations.
///
/// Concurrent misses on one key share a single load. Writers bump
/// `generation` before invalidating; a load that overlapped a write drops its
/// own entry afterwards, so a value read before a commit is never kept past
/// that commit. The caller of such a load still gets the value it read.
#[derive(Clone)]
pub struct LeaveCache {
    policy: Cache<(), LeavePolicy>,
    allocations: Cache<u64, Allocation>,
    generation: Arc<AtomicU64>,
}

impl LeaveCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            policy: Cache::builder().max_capacity(1).time_to_live(ttl).build(),
            allocations: Cache::builder()
                .max_capacity(50_000)
                .time_to_live(ttl)
                .build(),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    async fn read_through<K, V, F, Fut>(&self, cache: &Cache<K, V>, key: K, load: F) -> Result<V, ApiError>
    where
        K: Hash + Eq + Clone + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, ApiError>>,
    {
        let seen = self.generation.load(Ordering::Acquire);

        let value = cache
            .try_get_with(key.clone(), load())
            .await
            .map_err(Arc::unwrap_or_clone)?;

        if self.generation.load(Ordering::Acquire) != seen {
            cache.invalidate(&key).await;
        }
        Ok(value)
    }

    pub async fn policy<F, Fut>(&self, load: F) -> Result<LeavePolicy, ApiError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<LeavePolicy, ApiError>>,
    {
        self.read_through(&self.policy, (), load).await
    }

    pub async fn allocation<F, Fut>(&self, employee_id: u64, load: F) -> Result<Allocation, ApiError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Allocation, ApiError>>,
    {
        self.read_through(&self.allocations, employee_id, load).await
    }

    pub async fn invalidate_policy(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.policy.invalidate(&()).await;
    }

    pub async fn invalidate_allocation(&self, employee_id: u64) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.allocations.invalidate(&employee_id).await;
    }
}
