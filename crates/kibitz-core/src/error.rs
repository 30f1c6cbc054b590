//! Error taxonomy for engine and pool operations.
//!
//! Two closed enums, one per layer: [`EngineError`] for anything a single
//! engine process can produce, [`PoolError`] for pool/manager lifecycle and
//! capacity failures. Transport-level status mapping (gRPC, HTTP, ...) is
//! deliberately not here; callers match on the variants instead.

use std::time::Duration;

use thiserror::Error;

/// Failures of a single engine process or its protocol session.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine binary could not be spawned or never completed the
    /// handshake (missing binary, premature exit, startup deadline).
    #[error("engine failed to start: {0}")]
    Startup(String),

    /// An operation was invoked before `start()` (or after `stop()`).
    #[error("engine is not started")]
    NotStarted,

    /// The position string was rejected before any process I/O.
    #[error("invalid FEN: {0}")]
    InvalidFen(String),

    /// A protocol read exceeded its deadline. The process is left running;
    /// the pool reclaims it lazily on the next acquire.
    #[error("engine did not respond within {0:?}")]
    Timeout(Duration),

    /// The breakdown table was requested from a binary that does not
    /// produce one (NNUE-only builds dropped the classical eval report).
    #[error("engine does not support the classical eval breakdown")]
    EvalNotSupported,

    /// Catch-all for unexpected output shape or a crash mid-call.
    #[error("engine protocol failure: {0}")]
    Protocol(String),
}

/// Failures of the pool or single-instance manager.
#[derive(Debug, Error)]
pub enum PoolError {
    /// No engine became available within the acquire timeout.
    #[error("no engine available within {0:?}")]
    Exhausted(Duration),

    /// The pool/manager was never started.
    #[error("pool is not started")]
    NotStarted,

    /// The pool/manager has been shut down (terminal state).
    #[error("pool has been shut down")]
    Shutdown,

    /// An engine-level failure surfaced through the pool.
    #[error(transparent)]
    Engine(#[from] EngineError),
}
