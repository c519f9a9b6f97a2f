use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use dipalert::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Fetch prices and print the plan without sending email
    #[arg(short = 'n', long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for dipalert::AppCommand {
    fn from(cmd: Commands) -> dipalert::AppCommand {
        match cmd {
            Commands::Weekly => dipalert::AppCommand::Weekly,
            Commands::Threshold => dipalert::AppCommand::Threshold,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Weekly budget: $200 base plus a dip bonus, capped at $1000
    Weekly,
    /// Threshold buy: invest only when the dip reaches 5%, no email otherwise
    Threshold,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    init_logging(cli.verbose);

    let result = match cli.command {
        Some(cmd) => dipalert::run_command(cmd.into(), cli.dry_run).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!("Application failed: {e:#}");
    }
    result
}
