//! polybuild CLI entry point.
//!
//! Parses command-line arguments, runs the graph pipeline, and reports any
//! fatal error in user-friendly form before exiting non-zero.

use clap::Parser;
use polybuild::cli;
use polybuild::core::error::user_friendly_error;

fn main() {
    let cli = cli::Cli::parse();

    if let Err(e) = cli.execute() {
        let error_ctx = user_friendly_error(e);
        error_ctx.display();
        std::process::exit(1);
    }
}
