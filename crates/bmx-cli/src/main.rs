//! `bmx` entry point.

use std::{process, str::FromStr};

use clap::Parser;
use log::{debug, LevelFilter};

use bmx_cli::{error_adapter::to_reportable, Args};

fn main() {
    miette::set_panic_hook();

    let args = Args::parse();

    let log_level = LevelFilter::from_str(&args.log_level).unwrap_or_else(|_| {
        eprintln!(
            "Invalid log level: {}. Using 'warn' instead.",
            args.log_level
        );
        LevelFilter::Warn
    });

    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();

    debug!("parsed arguments: {args:?}");

    match bmx_cli::run(&args) {
        Ok(output) => print!("{output}"),
        Err(err) => {
            let reportable = to_reportable(&err);
            let mut report = String::new();
            match miette::GraphicalReportHandler::new().render_report(&mut report, &reportable) {
                Ok(()) => eprint!("{report}"),
                Err(_) => eprintln!("Error: {err}"),
            }
            process::exit(1);
        }
    }
}
