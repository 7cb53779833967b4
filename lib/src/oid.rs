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

//! Content-addressed object identifiers (§3: "Object identifier (Oid)").

use std::fmt;

use sha1::Digest as _;
use sha1::Sha1;

use crate::hex_util;

/// A 20-byte SHA-1 content hash identifying a git object.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Oid([u8; 20]);

impl Oid {
    /// Wraps a raw 20-byte hash.
    pub fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// The all-zero id, used to probe the batch reader on startup.
    pub fn null() -> Self {
        Self([0; 20])
    }

    /// Parses a full 40-character hex string.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let bytes = hex_util::decode_hex(hex)?;
        let bytes: [u8; 20] = bytes.try_into().ok()?;
        Some(Self(bytes))
    }

    /// Hashes `body` under the git object-store convention: the ASCII type
    /// tag, a space, the decimal byte length, a NUL, then the body.
    pub fn for_object(type_tag: &str, body: &[u8]) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(type_tag.as_bytes());
        hasher.update(b" ");
        hasher.update(body.len().to_string().as_bytes());
        hasher.update(b"\0");
        hasher.update(body);
        let digest = hasher.finalize();
        Self(digest.into())
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Full 40-character lowercase hex form.
    pub fn hex(&self) -> String {
        hex_util::encode_hex(&self.0)
    }

    /// The leading 12 hex characters, used for display.
    pub fn short(&self) -> String {
        self.hex()[..12].to_string()
    }

    /// First byte of the hash, used to shard the object cache.
    pub fn shard(&self) -> u8 {
        self.0[0]
    }
}

impl fmt::Debug for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Oid({})", self.hex())
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_is_all_zero() {
        assert_eq!(Oid::null().as_bytes(), &[0u8; 20]);
    }

    #[test]
    fn hex_roundtrip() {
        let oid = Oid::for_object("blob", b"hello\n");
        let parsed = Oid::from_hex(&oid.hex()).unwrap();
        assert_eq!(oid, parsed);
        // Known git blob hash for "hello\n".
        assert_eq!(oid.hex(), "ce013625030ba8dba906f756967f9e9ca394464a");
    }

    #[test]
    fn short_is_12_chars() {
        let oid = Oid::for_object("blob", b"x");
        assert_eq!(oid.short().len(), 12);
        assert!(oid.hex().starts_with(&oid.short()));
    }
}
