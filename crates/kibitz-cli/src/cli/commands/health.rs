use std::time::Duration;

use anyhow::Context;

use kibitz_core::{EnginePool, PoolConfig};

use crate::cli::args::{EngineOpts, HealthArgs};
use crate::exit_codes;

/// Doubles as a smoke test of the configured binary: starting the pool
/// exercises spawn, handshake and option setup for every engine.
pub async fn run(opts: &EngineOpts, args: HealthArgs) -> anyhow::Result<i32> {
    let pool = EnginePool::new(
        PoolConfig {
            size: args.pool_size,
            ..PoolConfig::default()
        },
        opts.engine_config(),
    );
    pool.start()
        .await
        .with_context(|| format!("failed to start engine pool ({})", opts.engine.display()))?;

    let health = pool.health_check().await;
    pool.shutdown(Duration::from_millis(200)).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&health)?);
    } else {
        println!("engines:   {}/{} healthy", health.healthy, health.total);
        println!("available: {}", health.available);
        println!("version:   {}", health.version);
    }
    Ok(if health.healthy == health.total {
        exit_codes::SUCCESS
    } else {
        exit_codes::COMMAND_FAILED
    })
}
