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

//! Hex string helpers for [`Oid`](crate::oid::Oid).

/// Decodes a full hex string into bytes, or `None` if it is not valid hex.
pub fn decode_hex(hex: impl AsRef<[u8]>) -> Option<Vec<u8>> {
    hex::decode(hex.as_ref()).ok()
}

/// Decodes a (possibly odd-length) hex prefix into bytes, zero-filling the
/// low nibble of the final byte when the prefix has an odd number of
/// digits. Returns `(bytes, has_odd_digit)`.
pub fn decode_hex_prefix(hex: impl AsRef<[u8]>) -> Option<(Vec<u8>, bool)> {
    let hex = hex.as_ref();
    if !hex.iter().all(u8::is_ascii_hexdigit) {
        return None;
    }
    if hex.len() % 2 == 0 {
        Some((self::decode_hex(hex)?, false))
    } else {
        let mut padded = hex.to_vec();
        padded.push(b'0');
        Some((self::decode_hex(padded)?, true))
    }
}

/// Encodes bytes as a lowercase hex string.
pub fn encode_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_roundtrip() {
        assert_eq!(decode_hex_prefix("12").unwrap(), (vec![0x12], false));
        assert_eq!(decode_hex_prefix("123").unwrap(), (vec![0x12, 0x30], true));
        assert_eq!(decode_hex_prefix(""), Some((vec![], false)));
        assert_eq!(decode_hex_prefix("zz"), None);
    }
}
