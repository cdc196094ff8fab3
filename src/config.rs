//! Configuration for the KKBOX gateway and provider.
//!
//! Credentials and the response key are read from a secrets file:
//!
//! ```toml
//! kc1_key = "..."
//! email = "user@example.com"
//! password = "..."
//!
//! # Optional, for testing against other servers.
//! [hosts]
//! data = "https://api-ds-http2.kkbox.com.tw/"
//! login = "https://api-login-http2.kkbox.com.tw/"
//! ticket = "https://api-ticket.kkbox.com.tw/"
//! ```
//!
//! Keep this file private: it grants access to the account.

use std::{fs, path::Path};

use serde::Deserialize;
use url::Url;
use veil::Redact;

use crate::{
    device::DeviceId,
    error::{Error, Result},
    image::ImageFormat,
    protocol::Host,
    quality::AudioQuality,
};

/// Base URLs of the three API hosts.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Deserialize)]
pub struct Hosts {
    /// Catalogue and device activation
    pub data: Url,
    /// Login and session checks
    pub login: Url,
    /// Playback tickets
    pub ticket: Url,
}

impl Hosts {
    /// Returns the base URL for `host`.
    #[must_use]
    pub fn get(&self, host: Host) -> &Url {
        match host {
            Host::Data => &self.data,
            Host::Login => &self.login,
            Host::Ticket => &self.ticket,
        }
    }

    /// Ends every base URL with a slash, so joining a path appends to it
    /// instead of replacing the last segment.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            data: with_trailing_slash(self.data),
            login: with_trailing_slash(self.login),
            ticket: with_trailing_slash(self.ticket),
        }
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

impl Default for Hosts {
    fn default() -> Self {
        // These are compile-time constants known to be valid URLs.
        let parse = |url: &str| Url::parse(url).expect("invalid default host");
        Self {
            data: parse("https://api-ds-http2.kkbox.com.tw/"),
            login: parse("https://api-login-http2.kkbox.com.tw/"),
            ticket: parse("https://api-ticket.kkbox.com.tw/"),
        }
    }
}

/// Contents of the secrets file.
#[derive(Clone, Eq, PartialEq, Deserialize, Redact)]
pub struct Secrets {
    /// Static key to decrypt API responses
    #[redact]
    pub kc1_key: String,

    pub email: String,

    #[redact]
    pub password: String,

    #[serde(default)]
    pub hosts: Option<Hosts>,
}

impl Secrets {
    /// Largest secrets file accepted, to avoid reading arbitrary files.
    const MAX_FILE_SIZE: u64 = 1024;

    /// Reads and validates a secrets file.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read, is too large, is not
    /// valid TOML, or lacks any of the required keys.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file_size = fs::metadata(path)?.len();
        if file_size > Self::MAX_FILE_SIZE {
            return Err(Error::invalid_argument(format!(
                "{} is too large",
                path.display()
            )));
        }

        let contents = fs::read_to_string(path)?;
        let secrets: Self = toml::from_str(&contents)?;

        if secrets.kc1_key.is_empty() || !secrets.kc1_key.is_ascii() {
            return Err(Error::invalid_argument(
                "kc1_key should be a non-empty ASCII string",
            ));
        }
        if secrets.email.is_empty() || secrets.password.is_empty() {
            return Err(Error::invalid_argument("email and password are required"));
        }

        Ok(secrets)
    }
}

/// Gateway configuration.
#[derive(Clone, Eq, PartialEq, Redact)]
pub struct Config {
    pub app_lang: String,
    pub user_agent: String,

    /// Static key to decrypt API responses
    #[redact]
    pub kc1_key: String,

    pub device_id: DeviceId,
    pub hosts: Hosts,
}

impl Config {
    /// The user agent of the Android client.
    pub const USER_AGENT: &'static str = "okhttp/3.14.9";

    #[must_use]
    pub fn new(kc1_key: impl Into<String>, device_id: DeviceId) -> Self {
        Self {
            app_lang: "en".to_owned(),
            user_agent: Self::USER_AGENT.to_owned(),
            kc1_key: kc1_key.into(),
            device_id,
            hosts: Hosts::default(),
        }
    }

    #[must_use]
    pub fn with_hosts(mut self, hosts: Hosts) -> Self {
        self.hosts = hosts.normalized();
        self
    }
}

/// Options of the metadata provider.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ProviderOptions {
    /// Requested audio quality
    pub quality: AudioQuality,

    /// Cover edge length in pixels
    pub cover_size: u32,

    /// Cover image format
    pub cover_format: ImageFormat,

    /// Warn when the requested quality is not part of the subscription
    pub check_subscription: bool,
}

impl Default for ProviderOptions {
    fn default() -> Self {
        Self {
            quality: AudioQuality::default(),
            cover_size: 1400,
            cover_format: ImageFormat::Jpg,
            check_subscription: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(contents: &str) -> std::path::PathBuf {
        let path =
            std::env::temp_dir().join(format!("kkstream-secrets-{}.toml", uuid::Uuid::new_v4()));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn loads_secrets_with_host_override() {
        let path = write_temp(
            r#"
            kc1_key = "abc"
            email = "user@example.com"
            password = "hunter2"

            [hosts]
            data = "http://127.0.0.1:1/"
            login = "http://127.0.0.1:2/"
            ticket = "http://127.0.0.1:3/"
            "#,
        );
        let secrets = Secrets::from_file(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(secrets.email, "user@example.com");
        let hosts = secrets.hosts.unwrap();
        assert_eq!(hosts.get(Host::Ticket).as_str(), "http://127.0.0.1:3/");
    }

    #[test]
    fn rejects_missing_password() {
        let path = write_temp("kc1_key = \"abc\"\nemail = \"a@b.c\"\npassword = \"\"\n");
        let result = Secrets::from_file(&path);
        fs::remove_file(&path).unwrap();

        assert!(result.is_err());
    }

    #[test]
    fn rejects_oversized_file() {
        let padding = "#".repeat(2000);
        let path = write_temp(&format!(
            "{padding}\nkc1_key = \"abc\"\nemail = \"a@b.c\"\npassword = \"x\"\n"
        ));
        let result = Secrets::from_file(&path);
        fs::remove_file(&path).unwrap();

        assert_eq!(result.unwrap_err().kind, crate::error::ErrorKind::InvalidArgument);
    }

    #[test]
    fn host_overrides_join_below_their_path() {
        let hosts = Hosts {
            data: Url::parse("http://127.0.0.1:1/data").unwrap(),
            login: Url::parse("http://127.0.0.1:1/login/").unwrap(),
            ticket: Url::parse("http://127.0.0.1:1").unwrap(),
        };
        let config = Config::new("key", DeviceId::random()).with_hosts(hosts);

        let data = config.hosts.get(Host::Data).join("v2/song").unwrap();
        assert_eq!(data.as_str(), "http://127.0.0.1:1/data/v2/song");
        let login = config.hosts.get(Host::Login).join("login.php").unwrap();
        assert_eq!(login.as_str(), "http://127.0.0.1:1/login/login.php");
        let ticket = config.hosts.get(Host::Ticket).join("v1/ticket").unwrap();
        assert_eq!(ticket.as_str(), "http://127.0.0.1:1/v1/ticket");
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let config = Config::new("very-secret-key", DeviceId::random());
        let debug = format!("{config:?}");
        assert!(!debug.contains("very-secret-key"));
    }
}
