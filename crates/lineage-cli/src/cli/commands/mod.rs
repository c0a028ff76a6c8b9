use super::args::{Cli, Command};

pub mod generate;
pub mod metrics;
pub mod plot;
pub mod run;

pub mod exit_codes {
    pub const OK: i32 = 0;
    pub const CONFIG_ERROR: i32 = 2;
}

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Generate(args) => generate::run(args).await,
        Command::Run(args) => run::run(args).await,
        Command::Metrics(args) => metrics::run(args).await,
        Command::Plot(args) => plot::run(args).await,
    }
}
