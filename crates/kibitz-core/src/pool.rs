//! Concurrent engine pool.
//!
//! A fixed-size set of engines behind an acquire/release interface. Two
//! separate locks: the idle queue (semaphore + deque) that callers wait
//! on, and the tracked-slot set used for restart bookkeeping and health,
//! so replace-on-failure cannot race concurrent acquires. An engine that
//! is checked out is owned by exactly one caller; the pool keeps only its
//! slot entry (id, shared liveness flag, version) until release.
//!
//! Recovery is lazy: a dead engine is noticed when acquired, restarted in
//! place a bounded number of times, then replaced by a fresh spawn swapped
//! into the same slot so the tracked total stays at N.

use std::collections::VecDeque;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use serde::Serialize;
use tokio::sync::{Mutex, Semaphore};
use tracing::{debug, info, warn};

use crate::config::{EngineConfig, PoolConfig};
use crate::engine::UciEngine;
use crate::error::{EngineError, PoolError};

/// Pool health snapshot: `{total, available, healthy, version}`.
#[derive(Debug, Clone, Serialize)]
pub struct PoolHealth {
    /// Tracked engines (N when healthy, fewer after a discard).
    pub total: usize,
    /// Engines sitting in the idle queue right now.
    pub available: usize,
    /// Tracked engines whose process is alive, checked out or not.
    pub healthy: usize,
    /// Version of the first tracked engine, `"unknown"` when none.
    pub version: String,
}

/// An engine checked out of the pool.
///
/// Dereferences to [`UciEngine`]. Hand it back with
/// [`EnginePool::release`], or use [`EnginePool::with_engine`] which
/// always does.
#[derive(Debug)]
pub struct PooledEngine {
    slot: u64,
    engine: UciEngine,
}

impl Deref for PooledEngine {
    type Target = UciEngine;

    fn deref(&self) -> &UciEngine {
        &self.engine
    }
}

impl DerefMut for PooledEngine {
    fn deref_mut(&mut self) -> &mut UciEngine {
        &mut self.engine
    }
}

struct Slot {
    id: u64,
    alive: Arc<AtomicBool>,
    version: String,
}

#[derive(Default)]
struct PoolState {
    started: bool,
    shutdown: bool,
    next_id: u64,
    slots: Vec<Slot>,
}

/// Fixed-size pool of UCI engines.
pub struct EnginePool {
    pool_config: PoolConfig,
    engine_config: EngineConfig,
    state: Mutex<PoolState>,
    idle: Mutex<VecDeque<PooledEngine>>,
    permits: Semaphore,
}

impl EnginePool {
    pub fn new(pool_config: PoolConfig, engine_config: EngineConfig) -> Self {
        Self {
            pool_config,
            engine_config,
            state: Mutex::new(PoolState::default()),
            idle: Mutex::new(VecDeque::new()),
            permits: Semaphore::new(0),
        }
    }

    /// Configured pool size. The tracked total can differ after failures;
    /// see [`EnginePool::health_check`].
    pub fn size(&self) -> usize {
        self.pool_config.size
    }

    pub async fn is_started(&self) -> bool {
        self.state.lock().await.started
    }

    pub async fn is_shutdown(&self) -> bool {
        self.state.lock().await.shutdown
    }

    /// Starts all N engines sequentially. A no-op (with a warning) when
    /// already started; an error after shutdown. If any engine fails to
    /// start, every engine started so far is stopped so a partial pool is
    /// never left running.
    pub async fn start(&self) -> Result<(), PoolError> {
        let mut st = self.state.lock().await;
        if st.started {
            warn!("pool already started");
            return Ok(());
        }
        if st.shutdown {
            return Err(PoolError::Shutdown);
        }

        let n = self.pool_config.size;
        info!(size = n, "starting engine pool");
        let mut spawned: Vec<PooledEngine> = Vec::with_capacity(n);
        for i in 0..n {
            let mut engine = UciEngine::new(self.engine_config.clone());
            match engine.start().await {
                Ok(()) => {
                    let id = st.next_id;
                    st.next_id += 1;
                    st.slots.push(Slot {
                        id,
                        alive: engine.alive_flag(),
                        version: engine.version().unwrap_or("unknown").to_string(),
                    });
                    spawned.push(PooledEngine { slot: id, engine });
                    debug!(engine = i + 1, total = n, "pool engine started");
                }
                Err(e) => {
                    warn!("failed to start engine {}/{n}: {e}", i + 1);
                    for mut handle in spawned {
                        handle.engine.stop().await;
                    }
                    st.slots.clear();
                    return Err(e.into());
                }
            }
        }

        let version = st
            .slots
            .first()
            .map_or_else(|| "unknown".to_string(), |s| s.version.clone());
        let count = spawned.len();
        {
            let mut idle = self.idle.lock().await;
            idle.extend(spawned);
        }
        self.permits.add_permits(count);
        st.started = true;
        info!(engines = count, version = %version, "engine pool started");
        Ok(())
    }

    /// Takes an engine out of the pool, waiting up to `timeout` (the
    /// pool-wide default when `None`). A dead engine is revived before it
    /// is handed out.
    pub async fn acquire(&self, timeout: Option<Duration>) -> Result<PooledEngine, PoolError> {
        {
            let st = self.state.lock().await;
            if st.shutdown {
                return Err(PoolError::Shutdown);
            }
            if !st.started {
                return Err(PoolError::NotStarted);
            }
        }

        let wait = timeout.unwrap_or(self.pool_config.acquire_timeout);
        let permit = match tokio::time::timeout(wait, self.permits.acquire()).await {
            Ok(Ok(permit)) => permit,
            // The semaphore is closed by shutdown.
            Ok(Err(_)) => return Err(PoolError::Shutdown),
            Err(_) => return Err(PoolError::Exhausted(wait)),
        };
        permit.forget();

        let handle = self.idle.lock().await.pop_front();
        let Some(mut handle) = handle else {
            // A permit with an empty queue means a shutdown drain won.
            return Err(PoolError::Shutdown);
        };

        if handle.engine.is_alive() {
            return Ok(handle);
        }
        warn!("acquired engine is dead, reviving");
        self.revive(handle).await
    }

    /// Returns an engine to the pool. The engine's session state is reset
    /// first; if the reset fails the engine is stopped and dropped from
    /// the tracked set, shrinking capacity below N (deliberate: recovery
    /// happens at acquire time, not release time). During shutdown the
    /// engine is simply stopped.
    pub async fn release(&self, mut handle: PooledEngine) {
        let shutting_down = self.state.lock().await.shutdown;
        if shutting_down {
            handle.engine.stop().await;
            return;
        }

        match handle.engine.new_game().await {
            Ok(()) => {
                self.idle.lock().await.push_back(handle);
                self.permits.add_permits(1);
            }
            Err(e) => {
                warn!("engine reset failed, discarding from pool: {e}");
                handle.engine.stop().await;
                let mut st = self.state.lock().await;
                st.slots.retain(|s| s.id != handle.slot);
            }
        }
    }

    /// Runs `f` with an acquired engine and releases it on every path,
    /// error included.
    pub async fn with_engine<T, F>(&self, timeout: Option<Duration>, f: F) -> Result<T, PoolError>
    where
        F: for<'a> FnOnce(&'a mut UciEngine) -> BoxFuture<'a, Result<T, EngineError>>,
    {
        let mut handle = self.acquire(timeout).await?;
        let result = f(&mut handle.engine).await;
        self.release(handle).await;
        result.map_err(PoolError::from)
    }

    /// Idempotent. Marks the pool shut down (waking queued acquirers with
    /// a Shutdown error), gives in-flight operations a short grace period,
    /// then stops every idle engine. Engines still checked out are stopped
    /// when their holder releases them.
    pub async fn shutdown(&self, timeout: Duration) {
        {
            let mut st = self.state.lock().await;
            if st.shutdown {
                return;
            }
            st.shutdown = true;
            st.started = false;
        }
        info!("shutting down engine pool");
        self.permits.close();

        let grace = (timeout / 2).min(Duration::from_secs(1));
        tokio::time::sleep(grace).await;

        let drained: Vec<PooledEngine> = {
            let mut idle = self.idle.lock().await;
            idle.drain(..).collect()
        };
        for mut handle in drained {
            handle.engine.stop().await;
        }
        self.state.lock().await.slots.clear();
        info!("engine pool shutdown complete");
    }

    /// Health snapshot without mutating anything.
    pub async fn health_check(&self) -> PoolHealth {
        let (total, healthy, version) = {
            let st = self.state.lock().await;
            (
                st.slots.len(),
                st.slots
                    .iter()
                    .filter(|s| s.alive.load(Ordering::Relaxed))
                    .count(),
                st.slots
                    .first()
                    .map_or_else(|| "unknown".to_string(), |s| s.version.clone()),
            )
        };
        let available = self.idle.lock().await.len();
        PoolHealth {
            total,
            available,
            healthy,
            version,
        }
    }

    /// Brings a dead acquired engine back: in-place restarts up to the
    /// retry bound, then a fresh spawn swapped into the same slot so the
    /// tracked total is preserved.
    async fn revive(&self, mut handle: PooledEngine) -> Result<PooledEngine, PoolError> {
        handle.engine.stop().await;
        for attempt in 1..=self.pool_config.max_retries {
            match handle.engine.start().await {
                Ok(()) => {
                    info!(attempt, "engine restarted");
                    self.refresh_slot(&handle).await;
                    return Ok(handle);
                }
                Err(e) => warn!(attempt, "engine restart failed: {e}"),
            }
        }

        warn!("restart retries exhausted, spawning a replacement");
        let mut fresh = UciEngine::new(self.engine_config.clone());
        if let Err(e) = fresh.start().await {
            // No handle is left to repair this slot, so stop tracking it.
            let mut st = self.state.lock().await;
            st.slots.retain(|s| s.id != handle.slot);
            return Err(e.into());
        }
        let replacement = PooledEngine {
            slot: handle.slot,
            engine: fresh,
        };
        self.refresh_slot(&replacement).await;
        Ok(replacement)
    }

    async fn refresh_slot(&self, handle: &PooledEngine) {
        let mut st = self.state.lock().await;
        if let Some(slot) = st.slots.iter_mut().find(|s| s.id == handle.slot) {
            slot.alive = handle.engine.alive_flag();
            slot.version = handle.engine.version().unwrap_or("unknown").to_string();
        }
    }
}
