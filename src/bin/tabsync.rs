//! tabsync: read, edit, and watch a shared slot in a directory.
//!
//! Every process pointed at the same `--dir` (and slot name) shares one object.
//! Set `RUST_LOG=tabsync=debug` to see merge cycles.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use tabsync::core::DEFAULT_SLOT_NAME;
use tabsync::notify::BroadcastNotifier;
use tabsync::storage::FileStore;
use tabsync::sync::load_slot;
use tabsync::{Settings, SyncClient, TabsyncError};

/// Share a key-value object between processes through a directory
#[derive(Parser, Debug)]
#[command(name = "tabsync", version)]
struct Args {
    /// Directory holding the slot files
    #[arg(short, long, default_value = ".")]
    dir: PathBuf,

    /// Slot name
    #[arg(short, long, default_value = DEFAULT_SLOT_NAME)]
    name: String,

    /// Poll delay in milliseconds (watch only)
    #[arg(long, default_value_t = 100)]
    delay_ms: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the whole object, or one key
    Get {
        /// Key to print
        key: Option<String>,
    },
    /// Set a key; VALUE is parsed as JSON, falling back to a string
    Set {
        /// Key to set
        key: String,
        /// New value (`null` deletes)
        value: String,
    },
    /// Delete a key
    Delete {
        /// Key to delete
        key: String,
    },
    /// Delete every key
    Clear,
    /// Print every change event as a JSON line until interrupted
    Watch,
}

fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn print_json(value: &Value) {
    match serde_json::to_string(value) {
        Ok(line) => println!("{line}"),
        Err(e) => eprintln!("error: {e}"),
    }
}

async fn run(args: Args) -> Result<(), TabsyncError> {
    let settings = Settings::builder()
        .name(args.name)
        .delay(Duration::from_millis(args.delay_ms))
        .storage(Arc::new(FileStore::new(args.dir)))
        .build()?;

    if let Command::Watch = args.command {
        let notifier = Arc::new(BroadcastNotifier::new());
        let mut events = notifier.subscribe();
        let client = SyncClient::spawn(settings, notifier);

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Ok(event) => match serde_json::to_string(&event) {
                        Ok(line) => println!("{line}"),
                        Err(e) => eprintln!("error: {e}"),
                    },
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(missed)) => {
                        tracing::warn!(missed, "watcher fell behind");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                },
                _ = tokio::signal::ctrl_c() => break,
            }
        }
        client.shutdown().await;
        return Ok(());
    }

    // Reads never persist, so a missing slot stays missing.
    if let Command::Get { key } = &args.command {
        let object = load_slot(&settings)?;
        match key {
            None => print_json(&Value::Object(object)),
            Some(key) => print_json(object.get(key).unwrap_or(&Value::Null)),
        }
        return Ok(());
    }

    // One-shot edits: load the slot, edit, persist.
    let client = SyncClient::new(settings, Arc::new(tabsync::core::NullNotifier));
    client.tick()?;

    match args.command {
        Command::Set { key, value } => client.set(&key, parse_value(&value)),
        Command::Delete { key } => client.delete(&key),
        Command::Clear => {
            client.clear();
        }
        Command::Get { .. } | Command::Watch => {}
    }

    client.tick()?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    match run(Args::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
