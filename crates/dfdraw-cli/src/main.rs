//! dfdraw CLI - Render and edit data flow diagrams

mod cli;
mod colorizer;

use clap::Parser;

fn main() {
    let cli_args = cli::Cli::parse();

    // Logging is initialized in run() from flags and environment
    let mut app = cli::DfdrawApp::new();

    if let Err(e) = app.run(cli_args) {
        tracing::debug!(error = ?e, "Command failed");
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
