use std::collections::BTreeSet;

use veil::Redact;

use crate::{
    device::DeviceId,
    error::{Error, Result},
    protocol::login,
    quality::AudioQuality,
};

/// Authenticated session state.
///
/// Created by login and replaced as a whole on renewal, so the content key
/// never changes between two ticket requests of the same session.
#[derive(Clone, Eq, PartialEq, Redact)]
pub struct Session {
    #[redact]
    session_id: String,

    device_id: DeviceId,

    /// Key to decrypt audio streams
    #[redact]
    content_key: Vec<u8>,

    qualities: BTreeSet<AudioQuality>,
}

impl Session {
    /// Builds a session out of a successful login or session check.
    ///
    /// # Errors
    ///
    /// Returns a `Decode` error when the session id or content key is
    /// missing or empty.
    pub fn from_response(response: login::Response, device_id: DeviceId) -> Result<Self> {
        let session_id = response
            .sid
            .filter(|sid| !sid.is_empty())
            .ok_or_else(|| Error::decode("response has no session id"))?;
        let content_key = response
            .lic_content_key
            .filter(|key| !key.is_empty())
            .ok_or_else(|| Error::decode("response has no content key"))?;

        let mut qualities: BTreeSet<_> = AudioQuality::BASE.into_iter().collect();
        if response.high_quality {
            qualities.extend(AudioQuality::HIGH);
        }

        Ok(Self {
            session_id,
            device_id,
            content_key: content_key.into_bytes(),
            qualities,
        })
    }

    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    #[must_use]
    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    #[must_use]
    pub fn content_key(&self) -> &[u8] {
        &self.content_key
    }

    /// Quality tiers the subscription may stream, ascending.
    #[must_use]
    pub fn qualities(&self) -> &BTreeSet<AudioQuality> {
        &self.qualities
    }

    #[must_use]
    pub fn allows(&self, quality: AudioQuality) -> bool {
        self.qualities.contains(&quality)
    }
}
