//! # Stock Server
//!
//! Multithreaded HTTP server applying stock transactions to a shared ledger.
//!
//! ## Command-line Options
//! - `--addr` / `-a`: listen address (default `127.0.0.1:8080`).
//! - `--max-threads` / `-m`: maximum number of connection threads running at once.
//! - `--log-level` / `-l`: Log level (`error`, `warn`, `info`, `debug`, `trace`).

use std::sync::Arc;
use stock_exchange::errors::CliError;
use stock_exchange::http_server::HttpServer;
use stock_exchange::ledger::Ledger;
use structopt::StructOpt;

/// Command-line options for the stock server
#[derive(Debug, StructOpt)]
#[structopt(name = "stock_server", about = "Multithreaded stock exchange web server")]
struct Opt {
    /// Listen address, e.g., 127.0.0.1:8080
    #[structopt(short, long, default_value = "127.0.0.1:8080")]
    addr: String,

    /// Maximum number of connection threads running at once (unbounded if omitted)
    #[structopt(short, long)]
    max_threads: Option<usize>,

    /// Log level: error, warn, info, debug, trace
    #[structopt(short, long, default_value = "info")]
    log_level: String,
}

/// Initializes the logger using env_logger with the given level
fn init_logger(level: &str) {
    let log_level = match level.to_lowercase().as_str() {
        "error" => log::LevelFilter::Error,
        "warn" => log::LevelFilter::Warn,
        "info" => log::LevelFilter::Info,
        "debug" => log::LevelFilter::Debug,
        "trace" => log::LevelFilter::Trace,
        _ => log::LevelFilter::Info,
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp_micros()
        .format_module_path(false)
        .format_target(false)
        .init();
}

fn main() -> Result<(), CliError> {
    let opt = Opt::from_args();
    init_logger(&opt.log_level);

    log::info!("Starting stock server");
    log::debug!("Command line options: {:?}", opt);

    let ledger = Arc::new(Ledger::new());
    let server = HttpServer::new(&opt.addr, ledger, opt.max_threads)?;

    match opt.max_threads {
        Some(max) => log::info!("Accepting connections, at most {} at a time", max),
        None => log::info!("Accepting connections, no thread limit"),
    }

    // Blocks for the lifetime of the process.
    server.start()?;

    log::info!("Server shutdown complete");
    Ok(())
}
