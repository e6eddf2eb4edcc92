#![allow(clippy::print_stdout)]

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Parser, Subcommand};

use emberline_client::{Connection, Settings};
use emberline_core::{Session, register_handlers, replay_capture};
use emberline_wire::Dispatcher;

#[derive(Parser)]
#[command(name = "emberline", version, about = "Live profiling timeline engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay a capture file and summarize what it contained.
    Replay { file: PathBuf },
    /// Attach to a profiled peer and stream ingest statistics.
    Connect {
        /// Peer address; overrides the saved one.
        addr: Option<String>,
        /// Settings file holding the last good address.
        #[arg(long, default_value = "emberline.json")]
        settings: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    match Cli::parse().command {
        Command::Replay { file } => replay(&file),
        Command::Connect { addr, settings } => connect(addr, &settings),
    }
}

fn replay(file: &Path) -> anyhow::Result<()> {
    let bytes = std::fs::read(file).with_context(|| format!("reading {}", file.display()))?;

    let mut dispatcher = Dispatcher::new();
    register_handlers(&mut dispatcher);
    let mut session = Session::new();
    let stats = replay_capture(&bytes, &mut dispatcher, &mut session)
        .with_context(|| format!("replaying {}", file.display()))?;

    println!(
        "{} messages{}",
        stats.messages,
        if stats.truncated {
            " (capture ends mid-message)"
        } else {
            ""
        }
    );
    for (thread, history) in session.threads.iter() {
        let (Some(first), Some(last)) = (history.get(0), history.last()) else {
            continue;
        };
        println!(
            "  {thread}: {} frames, {:.1}ms – {:.1}ms",
            history.len(),
            first.start_us / 1_000.0,
            last.end_us / 1_000.0,
        );
    }
    for slot in 0..session.processors.slot_count() {
        if let Some(history) = session.processors.history(slot) {
            println!("  processor {slot}: {} busy spans", history.len());
        }
    }
    println!(
        "  {} sample names, {} thread names, {} properties",
        session.sample_names.len(),
        session.thread_names.len(),
        session.properties.latest().len(),
    );
    Ok(())
}

fn connect(addr: Option<String>, settings_path: &Path) -> anyhow::Result<()> {
    let mut settings = Settings::load(settings_path);
    let addr = addr.unwrap_or_else(|| settings.connection_address.clone());

    let mut dispatcher = Dispatcher::new();
    register_handlers(&mut dispatcher);
    let mut session = Session::new();
    let mut connection = Connection::new(dispatcher);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("starting runtime")?;

    println!("dialing {addr} (ctrl-c to quit)");
    runtime.block_on(async {
        let report_every = Duration::from_secs(2);
        let mut last_report = Instant::now();
        let mut was_connected = false;
        loop {
            connection.step(&mut session, &addr).await;

            if connection.is_connected() && !was_connected {
                // Remember the peer that actually answered.
                settings.connection_address = addr.clone();
                if let Err(err) = settings.save(settings_path) {
                    log::warn!("could not save settings: {err}");
                }
            }
            was_connected = connection.is_connected();

            if last_report.elapsed() >= report_every {
                last_report = Instant::now();
                let frames: usize = session.threads.iter().map(|(_, h)| h.len()).sum();
                println!(
                    "{} | {} threads, {frames} frames, {} processors, {} names",
                    if connection.is_connected() {
                        "connected"
                    } else {
                        "waiting"
                    },
                    session.threads.thread_count(),
                    session.processors.slot_count(),
                    session.sample_names.len(),
                );
            }
        }
    })
}
