use anyhow::Result;
use clap::Parser;

use sdata_cli::{
    cli::{Cli, Commands},
    commands, config,
};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(cli.env_filter()))
        .with_writer(std::io::stderr)
        .init();

    let dialect = config::load_dialect(cli.config.as_deref())?;

    let output = match cli.command {
        Commands::Inspect { uri, compact } => commands::inspect::execute(&dialect, &uri, compact)?,
        Commands::Translate {
            file,
            base,
            resources,
        } => commands::translate::execute(&dialect, &file, base.as_deref(), &resources)?,
    };
    println!("{}", output);

    Ok(())
}
