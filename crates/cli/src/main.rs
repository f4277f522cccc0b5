use clap::{Parser, Subcommand};

mod commands;

use commands::{RecordArgs, SettleArgs, SolveArgs, StatsArgs};

#[derive(Parser)]
#[command(name = "surebet")]
#[command(about = "Surebet stake calculator and bankroll tracker", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, global = true, default_value = "config/Config.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute stakes for a set of outcome legs
    Solve(SolveArgs),
    /// Solve and record the legs as pending bets
    Record(RecordArgs),
    /// Compute the profit of a bet, or settle a recorded one
    Settle(SettleArgs),
    /// Show bankroll statistics and monthly history
    Stats(StatsArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = surebet_core::ConfigLoader::load_from(&cli.config)?;

    match cli.command {
        Commands::Solve(args) => commands::run_solve(args, &config)?,
        Commands::Record(args) => commands::run_record(args, &config).await?,
        Commands::Settle(args) => commands::run_settle(args, &config).await?,
        Commands::Stats(args) => commands::run_stats(args, &config).await?,
    }

    Ok(())
}
