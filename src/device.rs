//! Device identifier handling.
//!
//! KKBOX identifies installs by a client-generated `kkid` of 32 hexadecimal
//! digits. It must stay the same across runs, otherwise every start counts
//! as a new device against the account, so the host persists it in a small
//! state file:
//!
//! ```toml
//! kkid = "0A1B2C3D4E5F60718293A4B5C6D7E8F9"
//! ```

use std::{fmt, fs, io, ops::Deref, path::Path, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Stable per-install device identifier.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceId(String);

/// On-disk state persisted between runs.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub kkid: Option<DeviceId>,
}

impl DeviceId {
    /// Number of hexadecimal digits in a device identifier.
    pub const LENGTH: usize = 32;

    /// Largest state file accepted, to avoid reading arbitrary files.
    const MAX_FILE_SIZE: u64 = 1024;

    /// Generates a new random identifier.
    #[must_use]
    pub fn random() -> Self {
        Self(format!("{:032X}", fastrand::u128(..)))
    }

    /// Reads the identifier from a state file.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the file does not exist or holds no `kkid`,
    /// and an I/O or parse error when it cannot be read.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let attributes = fs::metadata(path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                Error::not_found(format!("{} does not exist", path.display()))
            } else {
                e.into()
            }
        })?;
        if attributes.len() > Self::MAX_FILE_SIZE {
            return Err(Error::invalid_argument(format!(
                "{} is too large",
                path.display()
            )));
        }

        let contents = fs::read_to_string(path)?;
        let state: State = toml::from_str(&contents)?;
        state
            .kkid
            .ok_or_else(|| Error::not_found(format!("{} does not contain a kkid", path.display())))
    }

    /// Writes the identifier to a state file, replacing its contents.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be written.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let state = State {
            kkid: Some(self.clone()),
        };
        fs::write(path, toml::to_string(&state)?)?;
        Ok(())
    }

    /// Loads the identifier from `path`, or generates and stores a new one.
    ///
    /// # Errors
    ///
    /// Returns an error when an existing file is invalid, or when a new
    /// identifier cannot be written.
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match Self::from_file(path) {
            Ok(device_id) => Ok(device_id),
            Err(e) if e.kind == crate::error::ErrorKind::NotFound => {
                let device_id = Self::random();
                info!("registering new device id in {}", path.display());
                device_id.to_file(path)?;
                Ok(device_id)
            }
            Err(e) => Err(e),
        }
    }
}

impl FromStr for DeviceId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let len = s.len();
        if len != Self::LENGTH {
            return Err(Error::invalid_argument(format!(
                "device id length is {len} but should be {}",
                Self::LENGTH
            )));
        }
        if !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::invalid_argument(
                "device id should only contain hexadecimal digits",
            ));
        }

        Ok(Self(s.to_owned()))
    }
}

impl TryFrom<String> for DeviceId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<DeviceId> for String {
    fn from(value: DeviceId) -> Self {
        value.0
    }
}

impl Deref for DeviceId {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
