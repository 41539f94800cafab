use clap::Parser;
use poly_watch::cli::{Cli, Commands};
use poly_watch::config::CoreConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = CoreConfig::load(cli.config.as_deref())?;

    poly_watch::telemetry::init_logging(&config.log_level)?;

    match cli.command {
        Commands::Run(args) => {
            tracing::info!(tape = %args.tape.display(), "starting tape replay");
            args.execute(config).await?;
        }
        Commands::Params(args) => {
            args.execute(config)?;
        }
    }

    Ok(())
}
