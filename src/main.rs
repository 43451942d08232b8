//! k6 command-line entry point.
//!
//! # Architecture Overview
//!
//! ```text
//!   argv + env
//!       │
//!       ▼
//!   ┌──────────┐    ┌─────────────────────┐    ┌──────────────────────┐
//!   │  config  │───▶│ LifecycleController │───▶│ LogSinkConfigurator  │
//!   │ Settings │    │  INIT → RUNNING     │    │ stderr|stdout|none|  │
//!   └──────────┘    │  → SUCCESS/FAILURE  │    │ remote-uri           │
//!                   │  → DRAINING         │    └──────────┬───────────┘
//!                   │  → TERMINATED       │               │ remote only
//!                   └─────────┬───────────┘               ▼
//!                             │                  ┌──────────────────┐
//!                             ▼                  │ delivery worker  │──▶ TCP
//!                      subcommand                └──────────────────┘
//!                      (version | modules | config)
//! ```

use clap::{Parser, Subcommand};

use k6_core::config::{resolve_settings, GlobalFlags};
use k6_core::lifecycle::{CommandContext, CommandResult, ExitCode, LifecycleController};
use k6_core::modules::{self, normalize_name};
use k6_core::observability::Console;

#[derive(Parser)]
#[command(name = "k6")]
#[command(about = "a next-generation load generator", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    flags: GlobalFlags,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show application version
    Version,
    /// List registered extension modules
    Modules {
        /// Look up a single module by name
        #[arg(long)]
        lookup: Option<String>,
    },
    /// Print the resolved configuration
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let settings = resolve_settings(&cli.flags, |key| std::env::var(key).ok());

    let outcome = LifecycleController::new(settings, Console::detect())
        .install_global(true)
        .execute(|ctx| run(cli.command, ctx))
        .await;

    std::process::exit(outcome.exit_code);
}

async fn run(command: Commands, ctx: CommandContext) -> CommandResult {
    match command {
        Commands::Version => {
            println!("k6 v{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::Modules { lookup: Some(name) } => {
            let key = normalize_name(&name);
            if modules::get_module(&key).is_none() {
                return Err(ExitCode::new(1, format!("module not found: {key}"))
                    .with_hint("run `k6 modules` to list registered extensions")
                    .into());
            }
            println!("{key}");
        }
        Commands::Modules { lookup: None } => {
            let names = modules::global().names();
            tracing::debug!(count = names.len(), "Listing registered modules");
            for name in names {
                println!("{name}");
            }
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(ctx.settings.as_ref())?);
        }
    }
    Ok(())
}
