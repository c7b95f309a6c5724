//! CLI entry point - the composition root.
//!
//! Infrastructure is wired together once in bootstrap; command
//! dispatch routes to handlers which work through the composed
//! context.

use clap::Parser;

use lector_cli::handlers;
use lector_cli::{Cli, CliConfig, Commands, bootstrap};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug"))
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let ctx = bootstrap(CliConfig::with_defaults()).await?;

    let Some(command) = cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Read { text, speed, follow } => {
            let args = handlers::read::ReadArgs { text, speed, follow };
            handlers::read::execute(&ctx, args, cli.verbose).await?;
        }
        Commands::Select { text, watch } => {
            handlers::select::execute(&ctx, text, watch).await?;
        }
        Commands::Voices { refresh, languages } => {
            handlers::voices::execute(&ctx, refresh, languages).await?;
        }
        Commands::Settings { command } => {
            handlers::settings::execute(&ctx, command).await?;
        }
    }

    Ok(())
}
