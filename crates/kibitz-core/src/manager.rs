//! Single-instance engine manager.
//!
//! One engine behind a mutex for low-frequency work where a pool is not
//! justified. The mutex serializes whole operations, so there is never a
//! concurrent command on the wire. Restart philosophy matches the pool's
//! but without the retry ladder: found dead at time of use, the engine is
//! respawned once, synchronously.

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::breakdown::ClassicalBreakdown;
use crate::config::EngineConfig;
use crate::engine::UciEngine;
use crate::error::PoolError;
use crate::model::{EvaluationResult, SearchLimit};

/// Manager health snapshot: `{healthy, version}`.
#[derive(Debug, Clone, Serialize)]
pub struct ManagerHealth {
    pub healthy: bool,
    /// Engine version, `"not started"` before start.
    pub version: String,
}

struct ManagerState {
    engine: Option<UciEngine>,
    shutdown: bool,
}

/// Mutex-serialized manager of a single engine.
pub struct EngineManager {
    config: EngineConfig,
    inner: Mutex<ManagerState>,
}

impl EngineManager {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(ManagerState {
                engine: None,
                shutdown: false,
            }),
        }
    }

    /// Starts the engine. A no-op (with a warning) when already started;
    /// an error after shutdown.
    pub async fn start(&self) -> Result<(), PoolError> {
        let mut st = self.inner.lock().await;
        if st.engine.is_some() {
            warn!("engine manager already started");
            return Ok(());
        }
        if st.shutdown {
            return Err(PoolError::Shutdown);
        }
        let mut engine = UciEngine::new(self.config.clone());
        engine.start().await?;
        info!(
            version = engine.version().unwrap_or("unknown"),
            "engine manager started"
        );
        st.engine = Some(engine);
        Ok(())
    }

    /// Started and currently alive.
    pub async fn is_started(&self) -> bool {
        let mut st = self.inner.lock().await;
        st.engine.as_mut().is_some_and(|e| e.is_alive())
    }

    /// Idempotent; stops the engine if one is running.
    pub async fn shutdown(&self) {
        let mut st = self.inner.lock().await;
        st.shutdown = true;
        if let Some(mut engine) = st.engine.take() {
            info!("shutting down managed engine");
            engine.stop().await;
        }
    }

    pub async fn evaluate(
        &self,
        fen: &str,
        limit: &SearchLimit,
        multipv: i32,
    ) -> Result<EvaluationResult, PoolError> {
        let mut st = self.inner.lock().await;
        let engine = Self::usable_engine(&mut st).await?;
        engine
            .evaluate(fen, limit, multipv)
            .await
            .map_err(PoolError::from)
    }

    pub async fn breakdown(&self, fen: &str) -> Result<ClassicalBreakdown, PoolError> {
        let mut st = self.inner.lock().await;
        let engine = Self::usable_engine(&mut st).await?;
        engine.breakdown(fen).await.map_err(PoolError::from)
    }

    /// Health snapshot without mutating anything.
    pub async fn health(&self) -> ManagerHealth {
        let mut st = self.inner.lock().await;
        match st.engine.as_mut() {
            Some(engine) => {
                let healthy = engine.is_alive();
                ManagerHealth {
                    healthy,
                    version: engine.version().unwrap_or("unknown").to_string(),
                }
            }
            None => ManagerHealth {
                healthy: false,
                version: "not started".to_string(),
            },
        }
    }

    /// Returns the engine, respawning it once if it died since last use.
    async fn usable_engine(st: &mut ManagerState) -> Result<&mut UciEngine, PoolError> {
        if st.shutdown {
            return Err(PoolError::Shutdown);
        }
        let Some(engine) = st.engine.as_mut() else {
            return Err(PoolError::NotStarted);
        };
        if !engine.is_alive() {
            warn!("managed engine died, respawning");
            // start() on a dead-but-started engine clears the old session
            // first.
            engine.start().await?;
        }
        Ok(engine)
    }
}
