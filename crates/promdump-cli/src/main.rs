use clap::Parser;
use promdump_core::logging;

mod cli;

use crate::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging as early as possible.
    if let Err(err) = logging::init_logging(cli.log_format(), cli.log_file.as_deref()) {
        logging::init_logging_stderr(cli.log_format());
        tracing::warn!("falling back to stderr logging: {:#}", err);
    }

    if let Err(err) = cli.run().await {
        tracing::error!("{:#}", err);
        eprintln!("promdump error: {:#}", err);
        std::process::exit(1);
    }
}
