use anyhow::Context;

use kibitz_core::EngineManager;

use crate::cli::args::{BreakdownArgs, EngineOpts};
use crate::exit_codes;

pub async fn run(opts: &EngineOpts, args: BreakdownArgs) -> anyhow::Result<i32> {
    let manager = EngineManager::new(opts.engine_config());
    manager
        .start()
        .await
        .with_context(|| format!("failed to start engine {}", opts.engine.display()))?;

    let result = manager.breakdown(&args.fen).await;
    manager.shutdown().await;

    match result {
        Ok(breakdown) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&breakdown)?);
            } else {
                println!("{breakdown}");
            }
            Ok(exit_codes::SUCCESS)
        }
        Err(e) => {
            eprintln!("✗ {e}");
            Ok(exit_codes::COMMAND_FAILED)
        }
    }
}
