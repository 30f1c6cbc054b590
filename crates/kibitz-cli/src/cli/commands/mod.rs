use super::args::{Cli, Command};

pub mod batch;
pub mod breakdown;
pub mod eval;
pub mod health;

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    let Cli { engine, cmd } = cli;
    match cmd {
        Command::Eval(args) => eval::run(&engine, args).await,
        Command::Batch(args) => batch::run(&engine, args).await,
        Command::Breakdown(args) => breakdown::run(&engine, args).await,
        Command::Health(args) => health::run(&engine, args).await,
    }
}
