//! Lyrics formatting.
//!
//! Lines without content become empty lines in both outputs. Synced lyrics
//! use LRC time tags:
//!
//! ```text
//! [00:12.34]First line
//!
//! [00:18.00]Third line
//! ```

use crate::protocol::lyrics::Line;

/// Formats a start time in milliseconds as an LRC tag `[mm:ss.xx]`.
#[must_use]
pub fn time_tag(millis: u64) -> String {
    let minutes = millis / 60_000;
    let seconds = (millis / 1000) % 60;
    let centis = (millis % 1000) / 10;
    format!("[{minutes:02}:{seconds:02}.{centis:02}]")
}

/// Returns the plain and synced renditions of `lines`.
#[must_use]
pub fn format(lines: &[Line]) -> (String, String) {
    let mut plain = String::new();
    let mut synced = String::new();

    for line in lines {
        match line.content.as_deref() {
            Some(content) if !content.is_empty() => {
                plain.push_str(content);
                plain.push('\n');
                synced.push_str(&time_tag(line.start_time));
                synced.push_str(content);
                synced.push('\n');
            }
            _ => {
                plain.push('\n');
                synced.push('\n');
            }
        }
    }

    (plain, synced)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(content: Option<&str>, start_time: u64) -> Line {
        Line {
            content: content.map(ToOwned::to_owned),
            start_time,
        }
    }

    #[test]
    fn formats_time_tags() {
        assert_eq!(time_tag(0), "[00:00.00]");
        assert_eq!(time_tag(12_340), "[00:12.34]");
        assert_eq!(time_tag(61_005), "[01:01.00]");
        assert_eq!(time_tag(754_999), "[12:34.99]");
    }

    #[test]
    fn preserves_empty_lines() {
        let (plain, synced) = format(&[
            line(Some("First"), 12_340),
            line(Some(""), 15_000),
            line(None, 16_000),
            line(Some("Last"), 18_000),
        ]);

        assert_eq!(plain, "First\n\n\nLast\n");
        assert_eq!(synced, "[00:12.34]First\n\n\n[00:18.00]Last\n");
    }

    #[test]
    fn no_lines_is_empty() {
        assert_eq!(format(&[]), (String::new(), String::new()));
    }
}
