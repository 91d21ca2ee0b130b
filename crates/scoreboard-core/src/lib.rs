//! # scoreboard-core
//!
//! Data primitives shared by the scoreboard firmware and host tools.
//!
//! This crate provides:
//! - `RingStack`, a fixed-capacity LIFO buffer for recent button events
//! - The remote button map
//! - The 258-byte WiFi credential record and its byte codec
//! - `PersistentSettingsStore`, which keeps that record in non-volatile memory
//! - The `NonVolatileMemory` driver abstraction and an in-memory emulation
//!
//! This crate is intentionally runtime-agnostic and contains no async code.
//! Hardware access goes through the injected `NonVolatileMemory` driver, so
//! the same store runs on the device and in host-side tests.

pub mod buttons;
pub mod config;
pub mod nvm;
pub mod record;
pub mod ring_stack;
pub mod settings;

pub use buttons::{Button, ParseButtonError, SWITCH_COUNT};
pub use config::{ConfigError, StorageConfig};
pub use nvm::{MemoryNvm, NonVolatileMemory, NvmError};
pub use record::{CredentialRecord, FIELD_CAPACITY, MAX_FIELD_LEN, RECORD_SIZE};
pub use ring_stack::{EmptyError, RingStack};
pub use settings::{PersistentSettingsStore, SettingsError, SettingsField, WifiCredentials};
