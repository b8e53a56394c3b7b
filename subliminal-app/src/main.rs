mod app;
mod cli;
mod command;
mod logging;
mod simulate;

use anyhow::Result;
use clap::Parser;

use crate::app::{App, load_config};
use crate::cli::{Cli, Commands};
use crate::logging::init_logging;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.verbose);

    match cli.command {
        Commands::Run(args) => App::run(args),
        Commands::Simulate(args) => {
            let result = simulate::simulate(&args)?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Commands::ValidateConfig(args) => {
            let config = load_config(Some(&args.path))?;
            println!(
                "{}: ok ({} words, {} mask tiles, waits {}..={} ms)",
                args.path.display(),
                config.vocabulary.len(),
                config.mask.tile_count,
                config.wait_range_ms.0,
                config.wait_range_ms.1
            );
            Ok(())
        }
    }
}
