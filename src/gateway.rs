//! Session and transport layer for the KKBOX mobile API.
//!
//! The [`Gateway`] owns the HTTP client, the static key that decrypts API
//! responses, and the active [`Session`]. It provides:
//! * login, session renewal and device activation
//! * playback tickets, with recovery from expired sessions, unactivated
//!   devices and transient server errors
//! * catalogue lookups for songs, albums, artists, playlists, lyrics and
//!   search
//!
//! # Request Format
//!
//! Every request carries a fixed set of client parameters, the session id
//! once logged in, and a timestamp computed for that attempt. Requests
//! without a body are sent as GET. Requests with a body are sent as POST:
//! JSON to the ticket host, form-encoded to the others.
//!
//! # Ticket Recovery
//!
//! ```text
//! status  1  -> done
//! status -1  -> renew session, retry
//! status -4  -> activate device, retry
//! status  2  -> sleep 1 s, retry
//! otherwise  -> TicketAcquisitionFailed
//! ```
//!
//! At most [`Gateway::MAX_TICKET_ATTEMPTS`] ticket requests are made per call.
//!
//! # Concurrency
//!
//! Operations that touch the session take `&mut self`, so a renewal can
//! never interleave with another ticket request on the same gateway. Share
//! a gateway between tasks by wrapping it in a `tokio::sync::Mutex`.

use std::time::Duration;

use md5::{Digest, Md5};
use serde::{de::DeserializeOwned, Serialize};
use url::Url;

use crate::{
    cipher::Rc4,
    config::{Config, Hosts},
    device::DeviceId,
    error::{Error, Result},
    http::Client as HttpClient,
    protocol::{
        album, artist, login, lyrics, playlist, search, song, ticket, Envelope, Host, StatusCode,
        BASE_PARAMS, CLIENT_DIST, CLIENT_OS, CLIENT_OS_VERSION, CLIENT_VERSION,
    },
    session::Session,
    util,
};

pub struct Gateway {
    http_client: HttpClient,
    hosts: Hosts,
    kc1_key: Vec<u8>,
    device_id: DeviceId,
    session: Option<Session>,
}

/// Next step of the ticket state machine after a response.
#[derive(Clone, Debug, Eq, PartialEq)]
enum TicketStep {
    Done(Vec<ticket::Uri>),
    Retry(Recovery),
    Failed(i64),
}

/// What to do before requesting a ticket again.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Recovery {
    RenewSession,
    AuthenticateDevice,
    Backoff,
}

impl From<ticket::Response> for TicketStep {
    fn from(response: ticket::Response) -> Self {
        match response.status {
            ticket::STATUS_OK => Self::Done(response.uris),
            ticket::STATUS_SESSION_EXPIRED => Self::Retry(Recovery::RenewSession),
            ticket::STATUS_DEVICE_UNAUTHORIZED => Self::Retry(Recovery::AuthenticateDevice),
            ticket::STATUS_TRANSIENT => Self::Retry(Recovery::Backoff),
            other => Self::Failed(other),
        }
    }
}

/// Sets a query parameter, replacing an earlier value of the same name.
fn set_param<'a>(params: &mut Vec<(&'a str, String)>, key: &'a str, value: String) {
    match params.iter_mut().find(|(k, _)| *k == key) {
        Some(param) => param.1 = value,
        None => params.push((key, value)),
    }
}

impl Gateway {
    /// Upper bound on ticket requests per [`get_ticket`](Self::get_ticket)
    /// call.
    pub const MAX_TICKET_ATTEMPTS: usize = 5;

    /// Delay before retrying a ticket after a transient status.
    pub const TICKET_BACKOFF: Duration = Duration::from_secs(1);

    /// Path of the device activation endpoint.
    const ACTIVATE_PATH: &'static str = "active_sid.php";

    /// Device activation succeeded.
    const ACTIVATE_STATUS_OK: i64 = 1;

    /// Creates a gateway that is not logged in yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the response key is empty or the HTTP client
    /// cannot be built.
    pub fn new(config: &Config) -> Result<Self> {
        if config.kc1_key.is_empty() {
            return Err(Error::invalid_argument("response key is empty"));
        }

        Ok(Self {
            http_client: HttpClient::new(config)?,
            hosts: config.hosts.clone(),
            kc1_key: config.kc1_key.as_bytes().to_vec(),
            device_id: config.device_id.clone(),
            session: None,
        })
    }

    #[must_use]
    pub fn http_client(&self) -> &HttpClient {
        &self.http_client
    }

    #[must_use]
    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    /// The active session, if logged in.
    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    fn active_session(&self) -> Result<&Session> {
        self.session
            .as_ref()
            .ok_or_else(|| Error::login_failed("not logged in"))
    }

    /// Builds the full URL of a request.
    ///
    /// Caller parameters are overlaid by the base parameters, the session
    /// id and a fresh timestamp, in that order.
    fn url(&self, host: Host, path: &str, query: &[(&str, String)]) -> Result<Url> {
        let mut params: Vec<(&str, String)> = query.to_vec();
        for (key, value) in BASE_PARAMS {
            set_param(&mut params, key, value.to_owned());
        }
        if let Some(session) = &self.session {
            set_param(&mut params, "sid", session.session_id().to_owned());
        }
        set_param(&mut params, "timestamp", util::now_from_epoch().to_string());

        let mut url = self.hosts.get(host).join(path)?;
        url.query_pairs_mut().extend_pairs(params);
        Ok(url)
    }

    /// Decrypts and parses an API response body.
    fn decode<T>(&self, body: &[u8]) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let mut cipher = Rc4::new(&self.kc1_key)
            .ok_or_else(|| Error::invalid_argument("response key is empty"))?;
        let mut plaintext = body.to_vec();
        cipher.apply_keystream(&mut plaintext);

        let json = std::str::from_utf8(&plaintext)?;
        serde_json::from_str(json).map_err(Into::into)
    }

    /// Sends one API request and returns the decrypted response.
    ///
    /// Sent as GET when `body` is `None`, as POST otherwise.
    ///
    /// # Errors
    ///
    /// Returns `Transport` on network failures and non-success statuses,
    /// and `Decode` when the body does not decrypt to the expected JSON.
    pub async fn api_call<T, B>(
        &self,
        host: Host,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.url(host, path, query)?;
        let client = &self.http_client.unlimited;

        let request = match body {
            None => client.get(url),
            Some(body) => match host {
                Host::Ticket => client.post(url).json(body),
                Host::Data | Host::Login => client.post(url).form(body),
            },
        }
        .build()?;

        let response = self.http_client.execute(request).await?;
        let response = response.error_for_status()?;
        let body = response.bytes().await?;

        self.decode(&body)
            .map_err(|e| Error::decode(format!("{host}/{path}: {}", e.error)))
    }

    async fn get<T>(&self, host: Host, path: &str, query: &[(&str, String)]) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.api_call::<T, ()>(host, path, query, None).await
    }

    fn set_session(&mut self, response: login::Response) -> Result<Session> {
        let session = Session::from_response(response, self.device_id.clone())?;
        debug!(
            "session established; qualities: {}",
            session
                .qualities()
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        );

        self.session = Some(session.clone());
        Ok(session)
    }

    /// Logs in with email and password.
    ///
    /// # Errors
    ///
    /// * `InvalidAccount` when the email address is unknown
    /// * `InvalidCredentials` when the password is wrong
    /// * `LoginFailed` for any other refusal
    /// * `Transport` or `Decode` when the request itself fails
    pub async fn login(&mut self, email: &str, password: &str) -> Result<Session> {
        // MD5 is what the protocol expects, not a choice of ours.
        let passwd = format!("{:x}", Md5::digest(password.as_bytes()));
        let request = login::Request {
            uid: email.to_owned(),
            passwd,
            kkid: self.device_id.to_string(),
            registration_id: String::new(),
        };

        let response: login::Response = self
            .api_call(Host::Login, login::LOGIN_PATH, &[], Some(&request))
            .await?;

        match response.status {
            login::STATUS_OK | login::STATUS_VALID => {
                info!("logged in as {email}");
                self.set_session(response)
            }
            login::STATUS_UNKNOWN_ACCOUNT => Err(Error::invalid_account(format!(
                "email {email} not found"
            ))),
            login::STATUS_WRONG_PASSWORD => Err(Error::invalid_credentials("incorrect password")),
            status => Err(Error::login_failed(format!("status {status}"))),
        }
    }

    /// Renews the session of this device.
    ///
    /// # Errors
    ///
    /// Returns `SessionRenewalFailed` unless the server reports the session
    /// as still valid. There is no fallback to a fresh login.
    pub async fn renew_session(&mut self) -> Result<Session> {
        let response: login::Response = self.get(Host::Login, login::CHECK_PATH, &[]).await?;

        if response.status != login::STATUS_VALID {
            return Err(Error::session_renewal_failed(format!(
                "status {}",
                response.status
            )));
        }

        debug!("session renewed");
        self.set_session(response)
    }

    /// Activates this device for the current session.
    ///
    /// # Errors
    ///
    /// Returns `DeviceAuthFailed` when the server refuses, and `LoginFailed`
    /// when not logged in.
    pub async fn authenticate_device(&mut self) -> Result<()> {
        let session = self.active_session()?;
        let kkid = self.device_id.to_string();
        let form = [
            ("ui_lang", "en"),
            ("of", "j"),
            ("os", CLIENT_OS),
            ("enc", "u"),
            ("sid", session.session_id()),
            ("ver", CLIENT_VERSION),
            ("kkid", kkid.as_str()),
            ("lang", "en"),
            ("oenc", "kc1"),
            ("osver", CLIENT_OS_VERSION),
        ];

        let response: StatusCode = self
            .api_call(Host::Data, Self::ACTIVATE_PATH, &[], Some(&form))
            .await?;

        if response.status != Self::ACTIVATE_STATUS_OK {
            return Err(Error::device_auth_failed(format!(
                "status {}",
                response.status
            )));
        }

        debug!("device {} activated", self.device_id);
        Ok(())
    }

    /// Sends a single ticket request.
    async fn request_ticket(
        &self,
        track_id: &str,
        play_mode: Option<&str>,
    ) -> Result<ticket::Response> {
        let session = self.active_session()?;
        let kkid = self.device_id.to_string();
        let request = ticket::Request {
            sid: session.session_id(),
            song_id: track_id,
            ver: CLIENT_VERSION,
            os: CLIENT_OS,
            osver: CLIENT_OS_VERSION,
            kkid: &kkid,
            dist: CLIENT_DIST,
            dist2: CLIENT_DIST,
            timestamp: util::now_from_epoch(),
            play_mode,
        };

        self.api_call(Host::Ticket, ticket::PATH, &[], Some(&request))
            .await
    }

    /// Gets the playback URLs of a track, in server order.
    ///
    /// Expired sessions are renewed, unactivated devices are activated, and
    /// transient statuses are retried after a delay, up to
    /// [`MAX_TICKET_ATTEMPTS`](Self::MAX_TICKET_ATTEMPTS) requests.
    ///
    /// # Errors
    ///
    /// * `TicketAcquisitionFailed` on an unrecognized status or when the
    ///   attempts are exhausted
    /// * `SessionRenewalFailed` or `DeviceAuthFailed` when recovery fails
    /// * `Transport` or `Decode` when a request fails
    pub async fn get_ticket(
        &mut self,
        track_id: &str,
        play_mode: Option<&str>,
    ) -> Result<Vec<ticket::Uri>> {
        for attempt in 1..=Self::MAX_TICKET_ATTEMPTS {
            let response = self.request_ticket(track_id, play_mode).await?;
            let step = TicketStep::from(response);
            trace!("ticket for track {track_id}, attempt {attempt}: {step:?}");

            let recovery = match step {
                TicketStep::Done(uris) => return Ok(uris),
                TicketStep::Failed(status) => {
                    return Err(Error::ticket_acquisition_failed(format!(
                        "status {status} for track {track_id}"
                    )));
                }
                TicketStep::Retry(recovery) => recovery,
            };

            if attempt == Self::MAX_TICKET_ATTEMPTS {
                break;
            }

            match recovery {
                Recovery::RenewSession => {
                    debug!("session expired, renewing");
                    self.renew_session().await?;
                }
                Recovery::AuthenticateDevice => {
                    debug!("device not authorized, activating");
                    self.authenticate_device().await?;
                }
                Recovery::Backoff => {
                    debug!(
                        "ticket server busy, retrying in {}s",
                        Self::TICKET_BACKOFF.as_secs()
                    );
                    tokio::time::sleep(Self::TICKET_BACKOFF).await;
                }
            }
        }

        Err(Error::ticket_acquisition_failed(format!(
            "no ticket for track {track_id} after {} attempts",
            Self::MAX_TICKET_ATTEMPTS
        )))
    }

    /// Looks up songs by public id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the catalogue does not know the songs.
    pub async fn get_songs(&self, ids: &[&str]) -> Result<Vec<song::Song>> {
        let form = [("ids", ids.join(",")), ("fields", song::FIELDS.to_owned())];
        let envelope: Envelope<song::Songs> = self
            .api_call(Host::Data, song::PATH, &[], Some(&form))
            .await?;
        Ok(envelope.into_data("track")?.songs)
    }

    /// Gets the lyrics of a song. The envelope is returned as is, since
    /// missing lyrics are not an error.
    pub async fn get_song_lyrics(&self, id: &str) -> Result<Envelope<lyrics::Lyrics>> {
        self.get(Host::Data, &lyrics::path(id), &[]).await
    }

    /// Resolves a public album id.
    pub async fn get_album(&self, id: &str) -> Result<album::Lookup> {
        let envelope: Envelope<album::Lookup> =
            self.get(Host::Data, &album::path(id), &[]).await?;
        envelope.into_data("album")
    }

    /// Gets album details and the track listing by raw album id.
    pub async fn get_album_more(&self, raw_id: &str) -> Result<album::More> {
        self.get(Host::Data, album::MORE_PATH, &[("album", raw_id.to_owned())])
            .await
    }

    pub async fn get_artist(&self, id: &str) -> Result<artist::Artist> {
        let envelope: Envelope<artist::Artist> =
            self.get(Host::Data, &artist::path(id), &[]).await?;
        envelope.into_data("artist")
    }

    pub async fn get_artist_albums(
        &self,
        raw_id: &str,
        limit: u32,
        offset: usize,
    ) -> Result<Vec<artist::Album>> {
        let query = [("limit", limit.to_string()), ("offset", offset.to_string())];
        let envelope: Envelope<artist::Albums> = self
            .get(Host::Data, &artist::albums_path(raw_id), &query)
            .await?;
        Ok(envelope.into_data("artist")?.album)
    }

    pub async fn get_playlists(&self, ids: &[&str]) -> Result<Vec<playlist::Playlist>> {
        let query = [("playlist_ids", ids.join(","))];
        let envelope: Envelope<playlist::Playlists> =
            self.get(Host::Data, playlist::PATH, &query).await?;
        Ok(envelope.into_data("playlist")?.playlists)
    }

    pub async fn search(
        &self,
        query: &str,
        kind: search::Kind,
        limit: usize,
    ) -> Result<search::Response> {
        let params = [
            ("sf", kind.as_str().to_owned()),
            ("limit", limit.to_string()),
            ("query", query.to_owned()),
            ("search_ranking", search::RANKING.to_owned()),
        ];
        self.get(Host::Data, search::PATH, &params).await
    }
}
