use clap::Parser;

use depaudit::cli::{Cli, Output};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let quiet = cli.quiet;

    if let Err(e) = cli.run().await {
        Output::new(false, quiet).error(&format!("{e:#}"));
        std::process::exit(depaudit::error::exit_code(&e));
    }
}
