use anyhow::Context;

use kibitz_core::EngineManager;

use crate::cli::args::{EngineOpts, EvalArgs};
use crate::cli::helpers;
use crate::exit_codes;

pub async fn run(opts: &EngineOpts, args: EvalArgs) -> anyhow::Result<i32> {
    let manager = EngineManager::new(opts.engine_config());
    manager
        .start()
        .await
        .with_context(|| format!("failed to start engine {}", opts.engine.display()))?;

    let limit = args.limit.to_limit();
    let result = manager.evaluate(&args.fen, &limit, args.multipv).await;
    manager.shutdown().await;

    match result {
        Ok(result) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                helpers::print_result(&result);
            }
            Ok(exit_codes::SUCCESS)
        }
        Err(e) => {
            eprintln!("✗ {e}");
            Ok(exit_codes::COMMAND_FAILED)
        }
    }
}
