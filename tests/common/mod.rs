//! In-process stand-in for the KKBOX API hosts and the audio CDN.
//!
//! One server answers for all hosts, each under its own path prefix:
//! `/login/`, `/data/`, `/ticket/` and `/audio/`. API responses are
//! encrypted with [`KC1_KEY`] like the real service does.

#![allow(dead_code)]

use std::{
    collections::{HashMap, VecDeque},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use serde_json::{json, Value};
use url::Url;

use kkstream::{
    cipher::Rc4,
    config::{Config, Hosts},
    decrypt,
    device::DeviceId,
    gateway::Gateway,
};

pub const KC1_KEY: &str = "fixture-kc1-key";
pub const CONTENT_KEY: &str = "fixture-content-key";
pub const EMAIL: &str = "user@example.com";
pub const PASSWORD: &str = "password";

/// MD5 of [`PASSWORD`].
pub const PASSWORD_MD5: &str = "5f4dcc3b5aa765d61d8327deb882cf99";

pub const PROTECTED_FORMAT: &str = "aac_320_download_kkdrm";
pub const CAST_FORMAT: &str = "mp3_128k_chromecast";

/// A request as seen by the fixture.
#[derive(Clone, Debug)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub query: HashMap<String, String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Recorded {
    /// Form-encoded body as a map.
    pub fn form(&self) -> HashMap<String, String> {
        url::form_urlencoded::parse(&self.body).into_owned().collect()
    }

    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

pub struct Fixture {
    pub base: Url,
    pub requests: Mutex<Vec<Recorded>>,

    pub login_status: Mutex<i64>,
    pub check_status: Mutex<i64>,
    pub activate_status: Mutex<i64>,

    /// Ticket statuses, in order; the last one repeats.
    pub ticket_statuses: Mutex<VecDeque<i64>>,

    /// Complete audio file, header included.
    pub audio: Mutex<Vec<u8>>,
    pub audio_status: Mutex<StatusCode>,

    /// Abort audio responses halfway through the body.
    pub audio_fails_midway: AtomicBool,

    /// Catalogue responses by request path, for example `/data/v2/song`.
    pub catalogue: Mutex<HashMap<String, Value>>,

    /// Send API responses unencrypted.
    pub plaintext: AtomicBool,
}

impl Fixture {
    /// Starts a fixture server on an ephemeral port.
    pub async fn start() -> Arc<Self> {
        let listener =
            std::net::TcpListener::bind("127.0.0.1:0").expect("failed to bind fixture server");
        listener
            .set_nonblocking(true)
            .expect("failed to set fixture listener nonblocking");
        let addr = listener.local_addr().unwrap();

        let fixture = Arc::new(Self {
            base: Url::parse(&format!("http://{addr}/")).unwrap(),
            requests: Mutex::default(),
            login_status: Mutex::new(3),
            check_status: Mutex::new(-4),
            activate_status: Mutex::new(1),
            ticket_statuses: Mutex::new(VecDeque::from([1])),
            audio: Mutex::new(encrypt_audio(b"")),
            audio_status: Mutex::new(StatusCode::PARTIAL_CONTENT),
            audio_fails_midway: AtomicBool::new(false),
            catalogue: Mutex::default(),
            plaintext: AtomicBool::new(false),
        });

        let app = Router::new().fallback(handle).with_state(fixture.clone());
        tokio::spawn(async move {
            let listener = tokio::net::TcpListener::from_std(listener)
                .expect("failed to convert fixture listener");
            axum::serve(listener, app).await.unwrap();
        });

        fixture
    }

    pub fn hosts(&self) -> Hosts {
        Hosts {
            data: self.base.join("data/").unwrap(),
            login: self.base.join("login/").unwrap(),
            ticket: self.base.join("ticket/").unwrap(),
        }
    }

    pub fn config(&self) -> Config {
        Config::new(KC1_KEY, DeviceId::random()).with_hosts(self.hosts())
    }

    pub fn gateway(&self) -> Gateway {
        Gateway::new(&self.config()).unwrap()
    }

    /// Gateway that has logged in already.
    pub async fn session(&self) -> Gateway {
        let mut gateway = self.gateway();
        gateway.login(EMAIL, PASSWORD).await.unwrap();
        gateway
    }

    pub fn audio_url(&self) -> Url {
        self.base.join("audio/track.m4a").unwrap()
    }

    pub fn cast_url(&self) -> Url {
        self.base.join("audio/cast.mp3").unwrap()
    }

    pub fn set_ticket_statuses(&self, statuses: &[i64]) {
        *self.ticket_statuses.lock().unwrap() = statuses.iter().copied().collect();
    }

    pub fn set_audio(&self, plaintext: &[u8]) {
        *self.audio.lock().unwrap() = encrypt_audio(plaintext);
    }

    pub fn set_catalogue(&self, path: &str, value: Value) {
        self.catalogue.lock().unwrap().insert(path.to_owned(), value);
    }

    /// Recorded requests to `path`.
    pub fn requests_to(&self, path: &str) -> Vec<Recorded> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|request| request.path == path)
            .cloned()
            .collect()
    }

    fn next_ticket_status(&self) -> i64 {
        let mut statuses = self.ticket_statuses.lock().unwrap();
        if statuses.len() > 1 {
            statuses.pop_front().unwrap()
        } else {
            statuses.front().copied().unwrap_or(1)
        }
    }

    fn api_response(&self, value: &Value) -> Response {
        let mut body = serde_json::to_vec(value).unwrap();
        if !self.plaintext.load(Ordering::SeqCst) {
            Rc4::new(KC1_KEY.as_bytes())
                .unwrap()
                .apply_keystream(&mut body);
        }
        body.into_response()
    }

    fn session_response(&self, status: i64, sid: &str) -> Value {
        json!({
            "status": status,
            "sid": sid,
            "lic_content_key": CONTENT_KEY,
            "high_quality": 1,
        })
    }

    fn audio_response(&self, headers: &HeaderMap) -> Response {
        let status = *self.audio_status.lock().unwrap();
        if !status.is_success() {
            return status.into_response();
        }

        let audio = self.audio.lock().unwrap().clone();
        // Anything but 206 stands for a server that ignores the range.
        let start = if status == StatusCode::PARTIAL_CONTENT {
            headers
                .get(header::RANGE)
                .and_then(|range| range.to_str().ok())
                .and_then(|range| range.strip_prefix("bytes="))
                .and_then(|range| range.strip_suffix('-'))
                .and_then(|start| start.parse::<usize>().ok())
                .unwrap_or(0)
                .min(audio.len())
        } else {
            0
        };
        let body = audio[start..].to_vec();

        if self.audio_fails_midway.load(Ordering::SeqCst) {
            let half = Bytes::from(body[..body.len() / 2].to_vec());
            let chunks: Vec<std::io::Result<Bytes>> = vec![
                Ok(half),
                Err(std::io::Error::other("connection reset")),
            ];
            return (status, Body::from_stream(futures_util::stream::iter(chunks))).into_response();
        }

        (status, body).into_response()
    }
}

/// Builds an audio file the way the CDN serves it: a header of junk
/// followed by the encrypted audio.
pub fn encrypt_audio(plaintext: &[u8]) -> Vec<u8> {
    let mut audio = vec![0xAB; decrypt::HEADER_LEN as usize];
    let mut encrypted = plaintext.to_vec();
    decrypt::keystream(CONTENT_KEY.as_bytes())
        .unwrap()
        .apply_keystream(&mut encrypted);
    audio.extend(encrypted);
    audio
}

/// Deterministic test audio.
pub fn plaintext(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 % 256) as u8).collect()
}

async fn handle(
    State(fixture): State<Arc<Fixture>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_owned();
    let query = url::form_urlencoded::parse(uri.query().unwrap_or_default().as_bytes())
        .into_owned()
        .collect();

    fixture.requests.lock().unwrap().push(Recorded {
        method,
        path: path.clone(),
        query,
        headers: headers.clone(),
        body,
    });

    match path.as_str() {
        "/login/login.php" => {
            let status = *fixture.login_status.lock().unwrap();
            let value = if matches!(status, 3 | -4) {
                fixture.session_response(status, "sid-1")
            } else {
                json!({ "status": status })
            };
            fixture.api_response(&value)
        }
        "/login/check.php" => {
            let status = *fixture.check_status.lock().unwrap();
            fixture.api_response(&fixture.session_response(status, "sid-2"))
        }
        "/data/active_sid.php" => {
            let status = *fixture.activate_status.lock().unwrap();
            fixture.api_response(&json!({ "status": status }))
        }
        "/ticket/v1/ticket" => {
            let status = fixture.next_ticket_status();
            fixture.api_response(&json!({
                "status": status,
                "uris": [
                    { "name": CAST_FORMAT, "url": fixture.cast_url() },
                    { "name": PROTECTED_FORMAT, "url": fixture.audio_url() },
                ],
            }))
        }
        path if path.starts_with("/audio/") => fixture.audio_response(&headers),
        path => {
            let value = fixture.catalogue.lock().unwrap().get(path).cloned();
            match value {
                Some(value) => fixture.api_response(&value),
                None => StatusCode::NOT_FOUND.into_response(),
            }
        }
    }
}
