use super::super::args::*;
use crate::exit_codes::EXIT_SUCCESS;

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Run(args) => super::run::run(args).await,
        Command::Score(args) => super::score::run(args).await,
        Command::Cache(args) => match args.cmd {
            CacheSub::Clear(target) => super::cache::cmd_clear(target).await,
            CacheSub::List(target) => super::cache::cmd_list(target).await,
        },
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(EXIT_SUCCESS)
        }
    }
}
