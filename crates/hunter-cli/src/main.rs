mod cli;
mod cli_utils;
mod commands;
mod control;
mod input;
mod render;
mod samples;
mod value;

use anyhow::Result;
use clap::Parser;
use cli::{Args, Command};
use commands::read::ReadRequest;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = Args::parse();

    // RUST_LOG wins; otherwise warn, raised by -v
    let default_filter = match args.verbose {
        0 => "hunter=warn,hunter_core=warn",
        1 => "hunter=debug,hunter_core=debug",
        _ => "hunter=trace,hunter_core=trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let options = cli_utils::browser_options(&args)?;

    match args.command {
        Command::Regions { pid, replay, json } => {
            commands::regions::run(pid, replay.as_deref(), json, options)
        }
        Command::Dump { pid, dir } => commands::dump::run(pid, &dir, options),
        Command::Scan {
            pid,
            replay,
            patterns,
            relative,
            debug_all,
        } => commands::scan::run(
            pid,
            replay.as_deref(),
            patterns.as_deref(),
            relative,
            debug_all,
            options,
        ),
        Command::Read {
            pid,
            replay,
            address,
            relative,
            chain,
            value_type,
            text,
            encoding,
        } => commands::read::run(
            pid,
            replay.as_deref(),
            ReadRequest {
                address: &address,
                relative,
                chain: chain.as_deref(),
                value_type,
                text,
                encoding,
            },
            options,
        ),
        Command::Watch {
            pid,
            watches,
            interval,
            output,
        } => commands::watch::run(pid, &watches, interval, output, options),
    }
}
