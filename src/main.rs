//! WebShell packager - release packaging pipeline.
//!
//! Runs the onefile, portable, installer and AppImage targets and exits with
//! a code naming the first failure.

use clap::Parser;
use std::process;
use webshell_packager::{cli, error::EXIT_USAGE};

#[tokio::main]
async fn main() {
    let args = match cli::Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            process::exit(if e.use_stderr() { EXIT_USAGE } else { 0 });
        }
    };

    let level = if args.verbose {
        "debug"
    } else if args.quiet {
        "warn"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();

    let exit_code = match cli::run(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            for suggestion in e.recovery_suggestions() {
                eprintln!("  {suggestion}");
            }
            e.exit_code()
        }
    };

    process::exit(exit_code);
}
