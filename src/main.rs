use anyhow::{bail, Result};
use clap::{ArgAction, Parser};
use log::LevelFilter;
use std::{
    process::ExitCode,
    sync::mpsc::{self, RecvTimeoutError},
    thread,
    time::Duration,
};
use winsta_sessions::{HostName, PassSummary, SessionRecord, SessionSink};

/// Lists the terminal-services sessions of a host and their logged-on users
#[derive(Parser)]
#[command(version)]
struct Cli {
    /// Host to query, at most 20 characters
    server: String,

    /// Capability module to load
    #[arg(long, default_value = "winsta.dll")]
    module: String,

    /// Give up after this many seconds. Without it an unreachable host
    /// blocks forever.
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Verbose logging (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

/// Prints each session to stdout as soon as it is decoded
#[cfg_attr(not(windows), allow(dead_code))]
struct Console;

impl SessionSink for Console {
    fn enumerated(&mut self, count: usize) {
        println!("Number of sessions: {count}");
    }

    fn session(&mut self, record: SessionRecord) {
        println!("{record}");
    }
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Error,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger(cli.verbose);
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let host = HostName::new(cli.server)?;
    let module = cli.module;
    let summary = match cli.timeout {
        None => query(&module, &host)?,
        Some(secs) => {
            let (tx, rx) = mpsc::channel();
            let worker_host = host.clone();
            thread::spawn(move || {
                let _ = tx.send(query(&module, &worker_host));
            });
            match rx.recv_timeout(Duration::from_secs(secs)) {
                Ok(result) => result?,
                // the worker stays blocked in the open call, exiting takes it down
                Err(RecvTimeoutError::Timeout) => {
                    bail!("no answer from {} within {}s", host, secs)
                }
                Err(RecvTimeoutError::Disconnected) => {
                    bail!("query worker exited without a result")
                }
            }
        }
    };
    if !summary.enumerated {
        println!("Failed to enumerate sessions.");
    }
    Ok(())
}

#[cfg(windows)]
fn query(module: &str, host: &HostName) -> Result<PassSummary> {
    use winsta_sessions::{SessionQuery, WinStation};

    let api = WinStation::load(module)?;
    let summary = SessionQuery::new(api).run(host, &mut Console)?;
    Ok(summary)
}

#[cfg(not(windows))]
fn query(_module: &str, _host: &HostName) -> Result<PassSummary> {
    bail!("winstation queries are only available on Windows")
}
