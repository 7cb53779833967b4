// Copyright 2026 The Revise Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Author/committer signature parsing (§3: "Signature").

use crate::error::ObjectError;

/// A parsed `NAME <EMAIL> TIMESTAMP[ OFFSET]` signature line.
///
/// Stored and transported verbatim: [`Signature::raw`] always returns bytes
/// identical to what was parsed, even though the individual fields are
/// trimmed for convenience.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Signature {
    raw: Vec<u8>,
    name_end: usize,
    email_start: usize,
    email_end: usize,
    timestamp_start: usize,
    timestamp_end: usize,
    offset: Option<(usize, usize)>,
}

impl Signature {
    /// Parses `raw` into a `Signature`, or fails if it does not match
    /// `NAME<EMAIL> TIMESTAMP[ OFFSET]`.
    pub fn parse(raw: Vec<u8>) -> Result<Self, ObjectError> {
        let open = raw.iter().position(|&b| b == b'<');
        let close = raw.iter().position(|&b| b == b'>');
        let (open, close) = match (open, close) {
            (Some(o), Some(c)) if o < c => (o, c),
            _ => return Err(ObjectError::BadSignature(raw)),
        };

        // Walk the space-separated fields after the closing '>': a decimal
        // timestamp, then an optional signed offset.
        let mut cursor = close + 1;
        while raw.get(cursor) == Some(&b' ') {
            cursor += 1;
        }
        let timestamp_start = cursor;
        while raw.get(cursor).is_some_and(u8::is_ascii_digit) {
            cursor += 1;
        }
        let timestamp_end = cursor;
        if timestamp_end == timestamp_start {
            return Err(ObjectError::BadSignature(raw));
        }

        while raw.get(cursor) == Some(&b' ') {
            cursor += 1;
        }
        let offset_start = cursor;
        let offset = if raw.get(cursor).is_some_and(|b| *b == b'+' || b'-' == *b) {
            cursor += 1;
            while raw.get(cursor).is_some_and(u8::is_ascii_digit) {
                cursor += 1;
            }
            Some((offset_start, cursor))
        } else {
            None
        };

        Ok(Self {
            name_end: open,
            email_start: open + 1,
            email_end: close,
            timestamp_start,
            timestamp_end,
            offset,
            raw,
        })
    }

    /// Bytes exactly as originally parsed; re-serialization must reproduce
    /// this verbatim (§3 invariant).
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn name(&self) -> &[u8] {
        trim(&self.raw[..self.name_end])
    }

    pub fn email(&self) -> &[u8] {
        trim(&self.raw[self.email_start..self.email_end])
    }

    pub fn timestamp(&self) -> &[u8] {
        &self.raw[self.timestamp_start..self.timestamp_end]
    }

    pub fn offset(&self) -> Option<&[u8]> {
        self.offset.map(|(s, e)| &self.raw[s..e])
    }

    /// `"NAME<EMAIL>"`, used as a default signing-key identifier.
    pub fn signing_key(&self) -> Vec<u8> {
        let mut key = self.name().to_vec();
        key.push(b'<');
        key.extend_from_slice(self.email());
        key.push(b'>');
        key
    }
}

fn trim(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|b| !b.is_ascii_whitespace()).unwrap_or(bytes.len());
    let end = bytes.iter().rposition(|b| !b.is_ascii_whitespace()).map_or(start, |i| i + 1);
    &bytes[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_name_email_timestamp_offset() {
        let sig = Signature::parse(b"A U Thor <author@example.com> 1112911993 +0100".to_vec()).unwrap();
        assert_eq!(sig.name(), b"A U Thor");
        assert_eq!(sig.email(), b"author@example.com");
        assert_eq!(sig.timestamp(), b"1112911993");
        assert_eq!(sig.offset(), Some(&b"+0100"[..]));
        assert_eq!(sig.signing_key(), b"A U Thor<author@example.com>");
    }

    #[test]
    fn parses_without_offset() {
        let sig = Signature::parse(b"A U Thor <author@example.com> 1112911993".to_vec()).unwrap();
        assert_eq!(sig.offset(), None);
    }

    #[test]
    fn raw_is_verbatim() {
        let raw = b"A U Thor <author@example.com> 1112911993 -0500".to_vec();
        let sig = Signature::parse(raw.clone()).unwrap();
        assert_eq!(sig.raw(), raw.as_slice());
    }

    #[test]
    fn rejects_malformed() {
        assert!(Signature::parse(b"no angle brackets here".to_vec()).is_err());
    }
}
