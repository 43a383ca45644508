pub(crate) mod ai;
mod cli;
mod error;
pub(crate) mod git;
mod logging;

pub(crate) use error::{AppError, AppResult};

use clap::Parser;
use tracing::error;

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();
    logging::setup_logger(cli.verbosity.tracing_level_filter());

    if let Err(e) = cli.run().await {
        error!("{e}");
        std::process::exit(1);
    }
}
