//! Host-side scoreboard tool.
//!
//! Inspects and provisions the settings image that the scoreboard keeps in
//! non-volatile memory, and replays remote button presses through the same
//! event buffer the firmware uses.
//!
//! ```text
//! scoreboard-host show
//! scoreboard-host set-ssid <value>
//! scoreboard-host set-password <value>
//! scoreboard-host set <ssid> <password>
//! scoreboard-host events <button>...
//! ```
//!
//! Environment:
//! - `SCOREBOARD_NV_IMAGE`: image file (default `scoreboard-nv.bin`)
//! - `SCOREBOARD_CONFIG`: optional JSON storage config
//! - `RUST_LOG`: log filter

mod file_nvm;

use std::path::PathBuf;

use anyhow::{bail, Context};
use scoreboard_core::{Button, PersistentSettingsStore, RingStack, StorageConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::file_nvm::FileNvm;

/// Button presses kept by the event buffer, as on the device.
const EVENT_CAPACITY: usize = 8;

const DEFAULT_IMAGE: &str = "scoreboard-nv.bin";

const USAGE: &str = "usage: scoreboard-host <show | set-ssid <value> | set-password <value> | set <ssid> <password> | events <button>...>";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Show,
    SetSsid(String),
    SetPassword(String),
    Set { ssid: String, password: String },
    Events(Vec<Button>),
}

fn parse_args(args: &[String]) -> anyhow::Result<Command> {
    let Some((name, rest)) = args.split_first() else {
        bail!(USAGE);
    };

    let command = match (name.as_str(), rest) {
        ("show", []) => Command::Show,
        ("set-ssid", [value]) => Command::SetSsid(value.clone()),
        ("set-password", [value]) => Command::SetPassword(value.clone()),
        ("set", [ssid, password]) => Command::Set {
            ssid: ssid.clone(),
            password: password.clone(),
        },
        ("events", buttons) if !buttons.is_empty() => Command::Events(
            buttons
                .iter()
                .map(|b| b.parse::<Button>())
                .collect::<Result<_, _>>()?,
        ),
        _ => bail!(USAGE),
    };
    Ok(command)
}

fn load_config() -> anyhow::Result<StorageConfig> {
    let Ok(path) = std::env::var("SCOREBOARD_CONFIG") else {
        return Ok(StorageConfig::default());
    };
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config {}", path))?;
    let config: StorageConfig =
        serde_json::from_str(&text).with_context(|| format!("Invalid config {}", path))?;
    config.validate()?;
    Ok(config)
}

fn open_store() -> anyhow::Result<PersistentSettingsStore<FileNvm>> {
    let image = std::env::var("SCOREBOARD_NV_IMAGE")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_IMAGE));
    let config = load_config()?;

    tracing::info!(
        "Opening settings image {} (region {} bytes, offset {})",
        image.display(),
        config.region_size,
        config.base_offset
    );
    let store = PersistentSettingsStore::open(FileNvm::new(image), config)?;
    Ok(store)
}

fn show(store: &PersistentSettingsStore<FileNvm>) -> anyhow::Result<()> {
    let report = if store.is_valid() {
        let credentials = store.credentials()?;
        serde_json::json!({
            "valid": true,
            "ssid": credentials.ssid,
            // Only reveal whether a password is set.
            "passwordLength": credentials.password.len(),
        })
    } else {
        serde_json::json!({ "valid": false })
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn commit(store: &mut PersistentSettingsStore<FileNvm>) -> anyhow::Result<()> {
    store
        .commit()
        .with_context(|| format!("Failed to write {}", store.nvm().path().display()))?;
    if store.is_valid() {
        tracing::info!("Settings saved");
    } else {
        tracing::warn!("Settings saved but still invalid; set both ssid and password");
    }
    Ok(())
}

fn replay_events(presses: &[Button]) {
    let mut events = RingStack::<Button, EVENT_CAPACITY>::new();
    for &button in presses {
        tracing::debug!("Pressed {} (switch {})", button, button.switch_index());
        events.push(button);
    }
    if presses.len() > EVENT_CAPACITY {
        tracing::info!(
            "Buffer holds {} events, {} oldest dropped",
            EVENT_CAPACITY,
            presses.len() - EVENT_CAPACITY
        );
    }

    while let Ok(button) = events.pop() {
        match button.points() {
            Some(points) => println!("{} (+{})", button, points),
            None => println!("{}", button),
        }
    }
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,scoreboard_core=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = parse_args(&args)?;

    match command {
        Command::Show => show(&open_store()?)?,
        Command::SetSsid(ssid) => {
            let mut store = open_store()?;
            store.set_ssid(&ssid)?;
            commit(&mut store)?;
        }
        Command::SetPassword(password) => {
            let mut store = open_store()?;
            store.set_password(&password)?;
            commit(&mut store)?;
        }
        Command::Set { ssid, password } => {
            let mut store = open_store()?;
            store.set_ssid(&ssid)?;
            store.set_password(&password)?;
            commit(&mut store)?;
        }
        Command::Events(presses) => replay_events(&presses),
    }

    Ok(())
}
