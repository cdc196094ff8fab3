//! Login and session check types.
//!
//! `login.php` and `check.php` share the response shape. Credentials are
//! posted form-encoded, with the password as an MD5 hex digest:
//!
//! ```text
//! uid=user@example.com&passwd=<md5 hex>&kkid=<device id>&registration_id=
//! ```
//!
//! Response:
//! ```json
//! {
//!     "status": 3,
//!     "sid": "session id",
//!     "lic_content_key": "content key",
//!     "high_quality": true
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_with::{formats::Flexible, serde_as, BoolFromInt, PickFirst};
use veil::Redact;

/// Path of the login endpoint.
pub const LOGIN_PATH: &str = "login.php";

/// Path of the session check endpoint.
pub const CHECK_PATH: &str = "check.php";

/// Login succeeded.
pub const STATUS_OK: i64 = 3;

/// Login succeeded on an already registered device, or a session check
/// found the session still valid.
pub const STATUS_VALID: i64 = -4;

/// No account with this email address.
pub const STATUS_UNKNOWN_ACCOUNT: i64 = -1;

/// Password does not match.
pub const STATUS_WRONG_PASSWORD: i64 = -2;

/// Login form.
#[derive(Clone, Eq, PartialEq, Serialize, Redact)]
pub struct Request {
    pub uid: String,

    #[redact]
    pub passwd: String,

    pub kkid: String,
    pub registration_id: String,
}

/// Login or session check response.
#[serde_as]
#[derive(Clone, Eq, PartialEq, Deserialize, Redact)]
pub struct Response {
    pub status: i64,

    #[redact]
    pub sid: Option<String>,

    #[redact]
    pub lic_content_key: Option<String>,

    #[serde_as(as = "PickFirst<(_, BoolFromInt<Flexible>)>")]
    #[serde(default)]
    pub high_quality: bool,
}
