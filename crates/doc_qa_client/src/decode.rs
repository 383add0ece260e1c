//! Incremental UTF-8 decoding for bodies whose chunk boundaries may fall
//! inside a multi-byte character.

use crate::error::DecodeError;

/// What to do with bytes that can never form valid UTF-8.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DecodeMode {
    /// Fail with [`DecodeError`].
    #[default]
    Strict,
    /// Substitute U+FFFD and keep going.
    Lossy,
}

/// Stateful decoder: an incomplete sequence at the end of a fragment is held
/// back until the next fragment completes it.
#[derive(Debug, Default)]
pub struct Utf8StreamDecoder {
    mode: DecodeMode,
    pending: Vec<u8>,
    consumed: u64,
}

impl Utf8StreamDecoder {
    pub fn new(mode: DecodeMode) -> Self {
        Self {
            mode,
            pending: Vec::new(),
            consumed: 0,
        }
    }

    /// Bytes held back waiting for the rest of a character (at most 3).
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Decode one fragment, appending complete characters to `out`.
    ///
    /// On a malformed sequence in strict mode, everything before it has
    /// already been pushed to `out` when the error is returned.
    pub fn decode(&mut self, fragment: &[u8], out: &mut String) -> Result<(), DecodeError> {
        self.pending.extend_from_slice(fragment);

        let mut start = 0;
        while start < self.pending.len() {
            let rest = &self.pending[start..];
            match std::str::from_utf8(rest) {
                Ok(text) => {
                    out.push_str(text);
                    start = self.pending.len();
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    out.push_str(valid_prefix(&rest[..valid]));
                    match e.error_len() {
                        // Truncated at the end of the buffer: wait for more.
                        None => {
                            start += valid;
                            break;
                        }
                        Some(bad) => match self.mode {
                            DecodeMode::Strict => {
                                let offset = self.consumed + (start + valid) as u64;
                                self.pending.clear();
                                return Err(DecodeError::Malformed { offset });
                            }
                            DecodeMode::Lossy => {
                                out.push(char::REPLACEMENT_CHARACTER);
                                start += valid + bad;
                            }
                        },
                    }
                }
            }
        }

        self.consumed += start as u64;
        self.pending.drain(..start);
        Ok(())
    }

    /// Final pass at end of data: anything still pending can no longer be
    /// completed.
    pub fn finish(&mut self, out: &mut String) -> Result<(), DecodeError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let pending = self.pending.len();
        self.pending.clear();
        match self.mode {
            DecodeMode::Strict => Err(DecodeError::Incomplete { pending }),
            DecodeMode::Lossy => {
                out.push(char::REPLACEMENT_CHARACTER);
                Ok(())
            }
        }
    }
}

/// The bytes before `Utf8Error::valid_up_to`, which are always well-formed.
fn valid_prefix(bytes: &[u8]) -> &str {
    std::str::from_utf8(bytes).unwrap_or_default()
}
