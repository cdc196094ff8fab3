//! Error handling for kkstream.
//!
//! Every fallible operation returns [`Result`], carrying an [`ErrorKind`]
//! that names the phase that failed and the underlying error for details.
//!
//! # Error Categories
//!
//! Kinds are grouped into the categories a host application cares about:
//! * Authentication: unknown account, wrong credentials, other login failures
//! * Session: renewal or device activation refused by the server
//! * Ticket: no playback URLs could be obtained
//! * Transport: network failures and non-success HTTP statuses
//! * Decode: API responses that do not decrypt or parse
//!
//! Only the ticket state machine in [`Gateway`](crate::gateway::Gateway)
//! recovers from errors locally. Everything else propagates to the caller.
//!
//! # Example
//!
//! ```rust
//! use kkstream::error::{Category, Error, ErrorKind};
//!
//! let err = Error::invalid_credentials("incorrect password");
//! assert_eq!(err.kind, ErrorKind::InvalidCredentials);
//! assert_eq!(err.kind.category(), Category::Authentication);
//! ```

#![allow(clippy::enum_glob_use)]

use std::fmt;
use thiserror::Error;

/// Main error type combining error kind and details.
#[derive(Debug)]
pub struct Error {
    /// Classification of the error
    pub kind: ErrorKind,

    /// Details of the underlying error
    pub error: Box<dyn std::error::Error + Send + Sync>,
}

impl Error {
    /// Attempts to downcast the underlying error to a concrete type.
    #[must_use]
    pub fn downcast<E>(&self) -> Option<&E>
    where
        E: std::error::Error + 'static,
    {
        self.error.downcast_ref::<E>()
    }
}

/// Standard result type for kkstream operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error kinds surfaced to the host.
///
/// The display text names the phase that failed, so that a message like
/// `ticket acquisition failed: status 7` is self-explanatory in logs.
#[expect(clippy::module_name_repetitions)]
#[derive(Clone, Copy, Debug, Eq, Error, Hash, Ord, PartialEq, PartialOrd)]
pub enum ErrorKind {
    /// Login status -1: the email address is not registered.
    #[error("login failed: account not found")]
    InvalidAccount,

    /// Login status -2: the password does not match.
    #[error("login failed: invalid credentials")]
    InvalidCredentials,

    /// Any other unsuccessful login status.
    #[error("login failed")]
    LoginFailed,

    /// Session check returned something other than "still valid".
    #[error("session renewal failed")]
    SessionRenewalFailed,

    /// The server refused to activate this device for the session.
    #[error("device authentication failed")]
    DeviceAuthFailed,

    /// Unrecoverable ticket status, or the retry ceiling was reached.
    #[error("ticket acquisition failed")]
    TicketAcquisitionFailed,

    /// Network failure or non-success HTTP status.
    #[error("transport error")]
    Transport,

    /// API response could not be decrypted or parsed.
    #[error("decode error")]
    Decode,

    /// The catalogue does not know the requested item.
    #[error("not found")]
    NotFound,

    /// Input rejected before anything was sent.
    #[error("invalid argument specified")]
    InvalidArgument,

    /// Operation was cancelled by the caller.
    #[error("operation was cancelled")]
    Cancelled,

    /// Local file system failure.
    #[error("I/O error")]
    Io,
}

/// Coarse taxonomy over [`ErrorKind`].
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Category {
    Authentication,
    Session,
    Ticket,
    Transport,
    Decode,
    Other,
}

impl ErrorKind {
    /// Returns the category this kind belongs to.
    #[must_use]
    pub fn category(self) -> Category {
        use ErrorKind::*;
        match self {
            InvalidAccount | InvalidCredentials | LoginFailed => Category::Authentication,
            SessionRenewalFailed | DeviceAuthFailed => Category::Session,
            TicketAcquisitionFailed => Category::Ticket,
            Transport => Category::Transport,
            Decode => Category::Decode,
            NotFound | InvalidArgument | Cancelled | Io => Category::Other,
        }
    }
}

impl Error {
    /// Creates a new error with specified kind and details.
    pub fn new<E>(kind: ErrorKind, error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self {
            kind,
            error: error.into(),
        }
    }

    pub fn invalid_account<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::new(ErrorKind::InvalidAccount, error)
    }

    pub fn invalid_credentials<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::new(ErrorKind::InvalidCredentials, error)
    }

    pub fn login_failed<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::new(ErrorKind::LoginFailed, error)
    }

    pub fn session_renewal_failed<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::new(ErrorKind::SessionRenewalFailed, error)
    }

    pub fn device_auth_failed<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::new(ErrorKind::DeviceAuthFailed, error)
    }

    pub fn ticket_acquisition_failed<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::new(ErrorKind::TicketAcquisitionFailed, error)
    }

    /// Creates a transport error.
    ///
    /// Used for connection failures as well as HTTP statuses outside the
    /// 2xx range, both for API calls and for audio downloads.
    pub fn transport<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::new(ErrorKind::Transport, error)
    }

    /// Creates a decode error.
    ///
    /// API payloads that fail to decrypt or parse are corrupted or of an
    /// unexpected shape, and are never retried.
    pub fn decode<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::new(ErrorKind::Decode, error)
    }

    pub fn not_found<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::new(ErrorKind::NotFound, error)
    }

    pub fn invalid_argument<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::new(ErrorKind::InvalidArgument, error)
    }

    pub fn cancelled<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::new(ErrorKind::Cancelled, error)
    }

    pub fn io<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::new(ErrorKind::Io, error)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.error.as_ref())
    }
}

impl fmt::Display for Error {
    /// Formats as `<phase>: <details>`.
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "{}: {}", self.kind, self.error)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::io(err)
    }
}

/// Converts HTTP client errors.
///
/// Body decoding failures are payload problems and map to `Decode`;
/// everything else (connect, timeout, status, redirect) is `Transport`.
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::decode(err)
        } else {
            Self::transport(err)
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::decode(e)
    }
}

impl From<std::str::Utf8Error> for Error {
    fn from(e: std::str::Utf8Error) -> Self {
        Self::decode(e)
    }
}

impl From<http::header::InvalidHeaderValue> for Error {
    fn from(e: http::header::InvalidHeaderValue) -> Self {
        Self::invalid_argument(e)
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Self::invalid_argument(e)
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Self::invalid_argument(e)
    }
}

impl From<toml::ser::Error> for Error {
    fn from(e: toml::ser::Error) -> Self {
        Self::io(e.to_string())
    }
}

impl From<time::error::Parse> for Error {
    fn from(e: time::error::Parse) -> Self {
        Self::decode(e)
    }
}
