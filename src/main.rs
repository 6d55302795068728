//! app-harness - inspect the harness option surface and marker vocabulary
//!
//! The harness itself is a library used from test binaries; this CLI shows
//! what a test run would see: registered markers and resolved options.

use clap::Parser;
use app_harness::commands::{self, Commands};
use app_harness::common::logging;
use app_harness::harness::HarnessOptions;

#[derive(Parser)]
#[command(name = "app-harness", about = "Web application test harness")]
#[command(version, long_about = None)]
struct Cli {
    #[command(flatten)]
    options: HarnessOptions,

    #[command(subcommand)]
    command: Commands,
}

fn main() {
    logging::init();

    let cli = Cli::parse();

    if let Err(e) = commands::dispatch(cli.command, cli.options) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
