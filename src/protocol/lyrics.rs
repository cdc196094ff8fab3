//! Lyrics via `v1/song/{id}/lyrics`.
//!
//! ```json
//! {
//!     "status": { "type": "OK" },
//!     "data": {
//!         "lyrics": [
//!             { "content": "First line", "start_time": 12340 },
//!             { "content": "", "start_time": 15000 }
//!         ]
//!     }
//! }
//! ```

use serde::Deserialize;

#[must_use]
pub fn path(id: &str) -> String {
    format!("v1/song/{id}/lyrics")
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Lyrics {
    #[serde(default)]
    pub lyrics: Vec<Line>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Line {
    pub content: Option<String>,

    /// Milliseconds from the start of the song
    pub start_time: u64,
}
