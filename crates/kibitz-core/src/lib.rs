pub mod breakdown;
pub mod config;
pub mod engine;
pub mod error;
pub mod fen;
pub mod manager;
pub mod model;
pub mod pool;

// Convenience re-exports
pub use breakdown::{parse_breakdown, ClassicalBreakdown, PhaseScore, TermScore};
pub use config::{EngineConfig, PoolConfig};
pub use engine::UciEngine;
pub use error::{EngineError, PoolError};
pub use fen::Color;
pub use manager::{EngineManager, ManagerHealth};
pub use model::{EvaluationResult, Score, SearchLimit};
pub use pool::{EnginePool, PoolHealth, PooledEngine};
