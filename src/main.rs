//! ktest - build-grouped kernel integration tests
//!
//! Builds each kernel variant once, boots it under the scenario's emulator
//! command, and checks the console with expect scripts.

use clap::Parser;
use ktest::common::logging;
use ktest::{cli, commands::Commands};

#[derive(Parser)]
#[command(name = "ktest", about = "Build-grouped kernel integration tests")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    logging::init_cli(cli.command.verbose());

    match cli::dispatch(cli.command).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e}");
            if e.is_configuration() {
                eprintln!("No build was started.");
            }
            std::process::exit(1);
        }
    }
}
