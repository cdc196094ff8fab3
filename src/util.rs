use std::time;

/// Get the current system time in epoch format.
///
/// API requests carry this as their `timestamp` parameter, computed anew for
/// every attempt.
///
/// # Panics
///
/// Panics if the system time is before epoch.
#[must_use]
pub fn now_from_epoch() -> u64 {
    time::SystemTime::now()
        .duration_since(time::UNIX_EPOCH)
        .expect("system time is before epoch")
        .as_secs()
}

/// Returns the last path segment of a catalogue URL.
///
/// Fields like `song_more_url` end in the public identifier of the item,
/// for example `https://www.kkbox.com/tw/tc/song/4oyaB1dN3wk8IEfRcI`.
#[must_use]
pub fn last_segment(url: &str) -> &str {
    url.trim_end_matches('/').rsplit('/').next().unwrap_or_default()
}

/// Extracts the year from a `YYYY-MM-DD` date as used by the catalogue.
pub fn year_of(date: &str) -> crate::error::Result<i32> {
    let format = ::time::macros::format_description!("[year]-[month]-[day]");
    let prefix = date.get(..10).unwrap_or(date);
    Ok(::time::Date::parse(prefix, format)?.year())
}
