//! Persistent WiFi settings.
//!
//! [`PersistentSettingsStore`] keeps a [`CredentialRecord`] in memory and
//! mirrors it to a non-volatile region on [`commit`](PersistentSettingsStore::commit).
//!
//! # State
//!
//! The store is either valid or invalid. Validity is computed from the two
//! length fields, and only when the record is loaded or committed:
//!
//! ```text
//! open ──► load ──► valid | invalid
//! set_ssid / set_password      state unchanged
//! load / commit                state recomputed
//! ```
//!
//! Setters work in both states, so an erased or corrupted region can be
//! repaired by setting both fields and committing.

use core::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{ConfigError, StorageConfig};
use crate::nvm::{NonVolatileMemory, NvmError};
use crate::record::{CredentialRecord, MAX_FIELD_LEN, RECORD_SIZE};

/// Names one of the two stored fields in errors and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsField {
    Ssid,
    Password,
}

impl fmt::Display for SettingsField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsField::Ssid => f.write_str("ssid"),
            SettingsField::Password => f.write_str("password"),
        }
    }
}

/// Errors that can occur during settings operations.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// A value longer than the field can hold was rejected.
    #[error("{field} is {len} bytes long, maximum is {max}")]
    ValueTooLong {
        field: SettingsField,
        len: usize,
        max: usize,
    },

    /// The stored record failed validation; its fields cannot be read.
    #[error("Stored settings are invalid")]
    InvalidState,

    /// The record was written but the flush to durable storage failed.
    #[error("Failed to persist settings: {0}")]
    PersistFailure(#[source] NvmError),

    /// The driver failed outside of commit (e.g. initialization).
    #[error("Non-volatile memory error: {0}")]
    Nvm(#[from] NvmError),

    /// Storage configuration does not fit the record.
    #[error("Invalid storage configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Both credentials as text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WifiCredentials {
    /// WiFi network SSID.
    pub ssid: String,

    /// WiFi network password (empty for open networks).
    pub password: String,
}

/// WiFi credentials backed by non-volatile memory.
///
/// # Example
///
/// ```
/// use scoreboard_core::{MemoryNvm, PersistentSettingsStore};
///
/// let mut store = PersistentSettingsStore::new(MemoryNvm::new()).unwrap();
/// // A fresh device is erased (0xFF), which is not a valid record.
/// assert!(!store.is_valid());
///
/// store.set_ssid("court-1").unwrap();
/// store.set_password("").unwrap();
/// store.commit().unwrap();
///
/// assert!(store.is_valid());
/// assert_eq!(store.ssid().unwrap(), "court-1");
/// ```
#[derive(Debug)]
pub struct PersistentSettingsStore<N> {
    nvm: N,
    config: StorageConfig,
    record: CredentialRecord,
    valid: bool,
}

impl<N: NonVolatileMemory> PersistentSettingsStore<N> {
    /// Open the store with the default layout (512-byte region, offset 0).
    pub fn new(nvm: N) -> Result<Self, SettingsError> {
        Self::open(nvm, StorageConfig::default())
    }

    /// Initialize the driver and load the record.
    ///
    /// Succeeds whether or not the stored record is valid; check
    /// [`is_valid`](Self::is_valid) afterwards.
    pub fn open(mut nvm: N, config: StorageConfig) -> Result<Self, SettingsError> {
        config.validate()?;
        nvm.initialize(config.region_size)?;
        if config.record_end().map_or(true, |end| nvm.region_size() < end) {
            return Err(ConfigError::RegionTooSmall {
                region_size: nvm.region_size(),
                base_offset: config.base_offset,
            }
            .into());
        }

        let mut store = Self {
            nvm,
            config,
            record: CredentialRecord::default(),
            valid: false,
        };
        store.load();
        Ok(store)
    }

    /// Re-read the record from non-volatile memory, discarding unsaved changes.
    pub fn reload(&mut self) {
        self.load();
    }

    fn load(&mut self) {
        let mut bytes = [0u8; RECORD_SIZE];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = self.nvm.read_byte(self.config.base_offset + i);
        }

        self.record = CredentialRecord::decode(&bytes);
        self.valid = self.record.validate();

        if self.valid {
            debug!(
                ssid_len = self.record.ssid.declared_len(),
                password_len = self.record.password.declared_len(),
                "Loaded settings"
            );
        } else {
            warn!(
                ssid_len = self.record.ssid.declared_len(),
                password_len = self.record.password.declared_len(),
                "Stored settings are invalid"
            );
        }
    }

    /// Whether the last load or commit saw in-range lengths.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Network name as text. Non-UTF-8 bytes are replaced.
    pub fn ssid(&self) -> Result<String, SettingsError> {
        self.ssid_bytes()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// Network password as text. Non-UTF-8 bytes are replaced.
    pub fn password(&self) -> Result<String, SettingsError> {
        self.password_bytes()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// Network name bytes, bounded by the length field and the first zero byte.
    pub fn ssid_bytes(&self) -> Result<&[u8], SettingsError> {
        self.field_value(SettingsField::Ssid)
    }

    /// Password bytes, bounded like [`ssid_bytes`](Self::ssid_bytes).
    pub fn password_bytes(&self) -> Result<&[u8], SettingsError> {
        self.field_value(SettingsField::Password)
    }

    /// Both fields at once.
    pub fn credentials(&self) -> Result<WifiCredentials, SettingsError> {
        Ok(WifiCredentials {
            ssid: self.ssid()?,
            password: self.password()?,
        })
    }

    fn field_value(&self, field: SettingsField) -> Result<&[u8], SettingsError> {
        if !self.valid {
            return Err(SettingsError::InvalidState);
        }
        let value = match field {
            SettingsField::Ssid => self.record.ssid.value(),
            SettingsField::Password => self.record.password.value(),
        };
        value.ok_or(SettingsError::InvalidState)
    }

    /// Set the network name in memory. Call [`commit`](Self::commit) to persist.
    pub fn set_ssid(&mut self, value: &str) -> Result<(), SettingsError> {
        self.set_ssid_bytes(value.as_bytes())
    }

    /// Set the password in memory. Call [`commit`](Self::commit) to persist.
    pub fn set_password(&mut self, value: &str) -> Result<(), SettingsError> {
        self.set_password_bytes(value.as_bytes())
    }

    pub fn set_ssid_bytes(&mut self, value: &[u8]) -> Result<(), SettingsError> {
        check_len(SettingsField::Ssid, value)?;
        self.record.set_ssid(value);
        Ok(())
    }

    pub fn set_password_bytes(&mut self, value: &[u8]) -> Result<(), SettingsError> {
        check_len(SettingsField::Password, value)?;
        self.record.set_password(value);
        Ok(())
    }

    /// Set both fields in memory.
    ///
    /// Both lengths are checked first, so an error leaves the record unchanged.
    pub fn set_credentials(&mut self, credentials: &WifiCredentials) -> Result<(), SettingsError> {
        check_len(SettingsField::Ssid, credentials.ssid.as_bytes())?;
        check_len(SettingsField::Password, credentials.password.as_bytes())?;
        self.record.set_ssid(credentials.ssid.as_bytes());
        self.record.set_password(credentials.password.as_bytes());
        Ok(())
    }

    /// Write the record to non-volatile memory and flush it.
    ///
    /// Validity is recomputed from the written lengths before the flush
    /// result is reported. On [`SettingsError::PersistFailure`] the in-memory
    /// record is kept as is; the caller decides whether to retry.
    pub fn commit(&mut self) -> Result<(), SettingsError> {
        let bytes = self.record.encode();
        for (i, &byte) in bytes.iter().enumerate() {
            self.nvm.write_byte(self.config.base_offset + i, byte);
        }
        self.valid = self.record.validate();

        match self.nvm.flush() {
            Ok(()) => {
                debug!(valid = self.valid, "Committed settings");
                Ok(())
            }
            Err(e) => {
                warn!("Settings flush failed: {}", e);
                Err(SettingsError::PersistFailure(e))
            }
        }
    }

    /// In-memory record, including fields not yet committed.
    pub fn record(&self) -> &CredentialRecord {
        &self.record
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    pub fn nvm(&self) -> &N {
        &self.nvm
    }

    pub fn nvm_mut(&mut self) -> &mut N {
        &mut self.nvm
    }

    /// Give back the driver.
    pub fn into_inner(self) -> N {
        self.nvm
    }
}

fn check_len(field: SettingsField, value: &[u8]) -> Result<(), SettingsError> {
    if value.len() > MAX_FIELD_LEN {
        return Err(SettingsError::ValueTooLong {
            field,
            len: value.len(),
            max: MAX_FIELD_LEN,
        });
    }
    Ok(())
}
