//! Café Speed Tester - Main CLI Application
//!
//! Runs a short series of WiFi speed measurements, averages them and reports
//! how much the average can be trusted.

use cafe_speed_tester::{
    app::{self, App},
    cli::Cli,
    error::AppError,
};
use clap::Parser;
use std::process;

#[tokio::main]
async fn main() {
    app::install_panic_hook();

    let cli = Cli::parse();
    let use_color = cli.use_colors();
    let verbose = cli.verbose || cli.debug;

    let result = match App::new(cli) {
        Ok(app) => app.run().await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("{}", e.format_for_console(use_color));
        if verbose || !matches!(e, AppError::Cancelled(_)) {
            print_error_suggestions(&e);
        }
        process::exit(e.exit_code());
    }
}

/// Print the remedy part of the user-facing message
fn print_error_suggestions(error: &AppError) {
    let message = error.user_friendly_message();
    if let Some((_, suggestion)) = message.split_once("\n\n") {
        eprintln!();
        eprintln!("{}", suggestion);
    }
}
