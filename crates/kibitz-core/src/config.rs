//! Engine and pool configuration.
//!
//! Plain data with `Default` impls; nothing here reads the environment.
//! The CLI maps `KIBITZ_*` variables and flags onto these structs.

use std::path::PathBuf;
use std::time::Duration;

/// Configuration for one engine process. Immutable once an engine is
/// constructed from it.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Path to the engine binary (resolved via PATH if bare).
    pub path: PathBuf,
    /// UCI `Threads` option; only sent when not 1 (the engine default).
    pub threads: u32,
    /// UCI `Hash` option in MiB; only sent when not 16 (the engine default).
    pub hash_mb: u32,
    /// Deadline for the spawn-to-ready handshake, and for ready-checks.
    pub startup_timeout: Duration,
    /// Deadline for a single evaluate/breakdown call.
    pub command_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("stockfish"),
            threads: 1,
            hash_mb: 128,
            startup_timeout: Duration::from_secs(5),
            command_timeout: Duration::from_secs(60),
        }
    }
}

/// Configuration for [`crate::pool::EnginePool`].
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Number of engine processes the pool keeps.
    pub size: usize,
    /// Default wait for an available engine when `acquire` gets no timeout.
    pub acquire_timeout: Duration,
    /// In-place restart attempts for a dead engine before spawning a
    /// replacement.
    pub max_retries: u32,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            size: 2,
            acquire_timeout: Duration::from_secs(30),
            max_retries: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_config_defaults() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.path, PathBuf::from("stockfish"));
        assert_eq!(cfg.threads, 1);
        assert_eq!(cfg.hash_mb, 128);
        assert_eq!(cfg.startup_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_pool_config_defaults() {
        let cfg = PoolConfig::default();
        assert_eq!(cfg.size, 2);
        assert_eq!(cfg.acquire_timeout, Duration::from_secs(30));
        assert_eq!(cfg.max_retries, 3);
    }
}
