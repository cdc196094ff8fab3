//! Playback ticket types.
//!
//! Tickets are requested from `v1/ticket` on the ticket host with a JSON
//! body, and answered with the playback URLs of every available format:
//!
//! ```json
//! {
//!     "status": 1,
//!     "uris": [
//!         { "name": "aac_320_download_kkdrm", "url": "https://..." },
//!         { "name": "flac_16_download_kkdrm", "url": "https://..." }
//!     ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use url::Url;
use veil::Redact;

/// Path of the ticket endpoint.
pub const PATH: &str = "v1/ticket";

/// Ticket issued.
pub const STATUS_OK: i64 = 1;

/// Session expired; renew and retry.
pub const STATUS_SESSION_EXPIRED: i64 = -1;

/// Device not activated for this session; activate and retry.
pub const STATUS_DEVICE_UNAUTHORIZED: i64 = -4;

/// Transient server condition; back off and retry.
pub const STATUS_TRANSIENT: i64 = 2;

/// Ticket request body.
#[derive(Clone, Eq, PartialEq, Serialize, Redact)]
pub struct Request<'a> {
    #[redact]
    pub sid: &'a str,

    pub song_id: &'a str,
    pub ver: &'a str,
    pub os: &'a str,
    pub osver: &'a str,
    pub kkid: &'a str,
    pub dist: &'a str,
    pub dist2: &'a str,
    pub timestamp: u64,
    pub play_mode: Option<&'a str>,
}

/// Ticket response.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
pub struct Response {
    pub status: i64,

    #[serde(default)]
    pub uris: Vec<Uri>,
}

/// A signed playback URL for one format.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Deserialize)]
pub struct Uri {
    /// Format name, for example `flac_16_download_kkdrm`
    pub name: String,
    pub url: Url,
}
