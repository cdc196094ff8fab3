//! RC4 stream cipher used by the KKBOX wire formats.
//!
//! Two keys are in play:
//! * the static response key, which decrypts every API response body from
//!   the start of the keystream
//! * the per-session content key, which decrypts audio after discarding the
//!   first 512 keystream bytes
//!
//! Keys are arbitrary-length ASCII strings, so the cipher takes a byte slice
//! instead of a fixed-size key type.

use std::fmt;

/// RC4 keystream generator.
///
/// Encryption and decryption are the same operation. State advances with
/// every byte processed, so buffers must be fed in stream order.
#[derive(Clone)]
pub struct Rc4 {
    state: [u8; 256],
    i: u8,
    j: u8,
}

impl Rc4 {
    /// Runs the key schedule.
    ///
    /// Returns `None` for an empty key, which RC4 cannot schedule.
    #[must_use]
    #[expect(clippy::cast_possible_truncation)]
    pub fn new(key: &[u8]) -> Option<Self> {
        if key.is_empty() {
            return None;
        }

        let mut state = [0u8; 256];
        for (i, slot) in state.iter_mut().enumerate() {
            *slot = i as u8;
        }

        let mut j = 0u8;
        for i in 0..256 {
            j = j.wrapping_add(state[i]).wrapping_add(key[i % key.len()]);
            state.swap(i, usize::from(j));
        }

        Some(Self { state, i: 0, j: 0 })
    }

    /// Runs the key schedule and discards the first `drop` keystream bytes.
    #[must_use]
    pub fn with_drop(key: &[u8], drop: usize) -> Option<Self> {
        let mut cipher = Self::new(key)?;
        for _ in 0..drop {
            cipher.next_byte();
        }
        Some(cipher)
    }

    #[inline]
    fn next_byte(&mut self) -> u8 {
        self.i = self.i.wrapping_add(1);
        self.j = self.j.wrapping_add(self.state[usize::from(self.i)]);
        self.state.swap(usize::from(self.i), usize::from(self.j));
        let index = self.state[usize::from(self.i)].wrapping_add(self.state[usize::from(self.j)]);
        self.state[usize::from(index)]
    }

    /// XORs the keystream into `buf` in place.
    pub fn apply_keystream(&mut self, buf: &mut [u8]) {
        for byte in buf {
            *byte ^= self.next_byte();
        }
    }
}

impl fmt::Debug for Rc4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Internal state reveals the key.
        f.debug_struct("Rc4").finish_non_exhaustive()
    }
}
