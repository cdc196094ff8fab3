//! Wire types of the KKBOX mobile API.
//!
//! Every response body is RC4-encrypted with the static response key and
//! decrypts to JSON. Two response styles are in use:
//!
//! * session endpoints (login, session check, device activation, tickets)
//!   carry an integer `status` code, see [`login`] and [`ticket`]
//! * catalogue endpoints wrap their payload in an [`Envelope`] whose
//!   `status.type` is `"OK"` on success
//!
//! # Example
//!
//! ```json
//! {
//!     "status": { "type": "OK" },
//!     "data": { "songs": [...] }
//! }
//! ```

pub mod album;
pub mod artist;
pub mod login;
pub mod lyrics;
pub mod playlist;
pub mod search;
pub mod song;
pub mod ticket;

use std::fmt;

use serde::{Deserialize, Deserializer};

use crate::error::{Error, Result};

/// The API hosts, each with its own domain.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Host {
    /// Catalogue data and device activation
    Data,
    /// Login and session checks
    Login,
    /// Playback tickets
    Ticket,
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Data => write!(f, "data"),
            Self::Login => write!(f, "login"),
            Self::Ticket => write!(f, "ticket"),
        }
    }
}

/// Client version reported to the service.
pub const CLIENT_VERSION: &str = "06090076";

/// Operating system reported to the service.
pub const CLIENT_OS: &str = "android";

/// Operating system version reported to the service.
pub const CLIENT_OS_VERSION: &str = "11";

/// Distribution channel reported to the service.
pub const CLIENT_DIST: &str = "0021";

/// Query parameters sent with every request.
///
/// These take precedence over caller-supplied parameters of the same name.
pub const BASE_PARAMS: [(&str, &str); 11] = [
    ("enc", "u"),
    ("ver", CLIENT_VERSION),
    ("os", CLIENT_OS),
    ("osver", CLIENT_OS_VERSION),
    ("lang", "en"),
    ("ui_lang", "en"),
    ("dist", CLIENT_DIST),
    ("dist2", CLIENT_DIST),
    ("resolution", "411x683"),
    ("of", "j"),
    ("oenc", "kc1"),
];

/// Response carrying only an integer status code.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
pub struct StatusCode {
    pub status: i64,
}

/// Status of a catalogue response.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
pub struct Status {
    #[serde(rename = "type")]
    pub typ: String,
}

impl Status {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.typ == "OK"
    }
}

/// Catalogue response envelope.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Envelope<T> {
    pub status: Status,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// Unwraps the payload of a successful response.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` naming `what` if the status is not `OK` or the
    /// payload is missing.
    pub fn into_data(self, what: &str) -> Result<T> {
        match self.data {
            Some(data) if self.status.is_ok() => Ok(data),
            _ => Err(Error::not_found(format!(
                "{what} not found (status {})",
                self.status.typ
            ))),
        }
    }
}

/// Image location with `{width}`, `{height}` and `{format}` placeholders.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
pub struct PhotoInfo {
    pub url_template: String,
}

/// Deserializes identifiers that are sent as either strings or numbers.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        String(String),
        Number(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::String(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_with_error_status_is_not_found() {
        let envelope: Envelope<serde_json::Value> =
            serde_json::from_str(r#"{"status":{"type":"NOT_FOUND"}}"#).unwrap();
        let err = envelope.into_data("album").unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::NotFound);
        assert!(err.to_string().contains("album"));
    }

    #[test]
    fn identifiers_accept_numbers() {
        #[derive(Deserialize)]
        struct Id {
            #[serde(deserialize_with = "string_or_number")]
            id: String,
        }

        let id: Id = serde_json::from_str(r#"{"id": 12345}"#).unwrap();
        assert_eq!(id.id, "12345");
        let id: Id = serde_json::from_str(r#"{"id": "abc"}"#).unwrap();
        assert_eq!(id.id, "abc");
    }
}
