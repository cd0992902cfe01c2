use clap::Parser;
use tracing::error;

use ai_hub::cli::{self, Cli};
use ai_hub::logging;

fn main() {
    let cli = Cli::parse();
    // Keep the guard alive so the log file is flushed on exit
    let _guard = logging::init();

    if let Err(e) = cli::execute(&cli) {
        error!(error = %e, "ai-hub exited with an error");
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}
