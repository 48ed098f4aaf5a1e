pub mod api;
pub mod channels;
pub mod config;
pub mod db;
pub mod event;
pub mod flows;
pub mod gate;
pub mod menu;
pub mod server;
pub mod session;
pub mod socket;
pub mod utils;

use clap::{Parser, Subcommand};

use callboard_common::error::CallboardError;

/// The Callboard server
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Run(server::RunArgs),
    Migrate(server::MigrateArgs),
}

////////////////////////////////////////////////////////////////////////////////
// PUBLIC FUNCTION
////////////////////////////////////////////////////////////////////////////////

#[tokio::main]
async fn main() -> Result<(), CallboardError> {
    let args = Cli::parse();
    match args.command {
        Commands::Run(run) => server::init_run(run).await,
        Commands::Migrate(migrate) => server::init_migrate(migrate).await,
    }
}
