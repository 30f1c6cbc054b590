use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use futures::future::FutureExt;
use serde_json::json;
use tracing::debug;

use kibitz_core::{EnginePool, PoolConfig};

use crate::cli::args::{BatchArgs, EngineOpts};
use crate::cli::helpers;
use crate::exit_codes;

pub async fn run(opts: &EngineOpts, args: BatchArgs) -> anyhow::Result<i32> {
    let fens = read_fens(&args.input)?;
    if fens.is_empty() {
        eprintln!("no positions in input");
        return Ok(exit_codes::SUCCESS);
    }
    debug!(positions = fens.len(), pool = args.pool_size, "starting batch");

    let pool = Arc::new(EnginePool::new(
        PoolConfig {
            size: args.pool_size,
            ..PoolConfig::default()
        },
        opts.engine_config(),
    ));
    pool.start()
        .await
        .with_context(|| format!("failed to start engine pool ({})", opts.engine.display()))?;

    let limit = args.limit.to_limit();
    let total = fens.len();
    let mut tasks = Vec::with_capacity(total);
    for fen in fens {
        let pool = Arc::clone(&pool);
        tasks.push(tokio::spawn(async move {
            let position = fen.clone();
            let result = pool
                .with_engine(None, move |engine| {
                    async move { engine.evaluate(&position, &limit, 1).await }.boxed()
                })
                .await;
            (fen, result)
        }));
    }

    // Join in submission order so output lines match the input order.
    let mut failed = 0usize;
    for task in tasks {
        let (fen, result) = task.await.context("batch task panicked")?;
        match result {
            Ok(result) => {
                if args.json {
                    println!("{}", json!({ "fen": fen, "result": result }));
                } else {
                    helpers::print_batch_line(&fen, &result);
                }
            }
            Err(e) => {
                failed += 1;
                if args.json {
                    println!("{}", json!({ "fen": fen, "error": e.to_string() }));
                } else {
                    eprintln!("✗ {fen}: {e}");
                }
            }
        }
    }
    pool.shutdown(Duration::from_millis(200)).await;

    if failed > 0 {
        eprintln!("{failed} of {total} positions failed");
        return Ok(exit_codes::COMMAND_FAILED);
    }
    Ok(exit_codes::SUCCESS)
}

fn read_fens(input: &Path) -> anyhow::Result<Vec<String>> {
    let text = if input.as_os_str() == "-" {
        std::io::read_to_string(std::io::stdin()).context("failed to read stdin")?
    } else {
        std::fs::read_to_string(input)
            .with_context(|| format!("failed to read {}", input.display()))?
    };
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect())
}
