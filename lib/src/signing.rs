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

//! Commit signing via an external helper (§4.2 `new_commit`, §6
//! `gpg.program`/`user.signingKey`).

use std::io::Write as _;
use std::process::Command;
use std::process::Stdio;

use bstr::ByteSlice as _;

use crate::error::SignError;

/// Pipes `content` (the commit body up to, but not including, the signature
/// header) through `program`, asking it to produce a detached, armored
/// signature for `signing_key`.
///
/// Mirrors `git commit -S`'s protocol: the helper is asked to emit a
/// `[GNUPG:] SIG_CREATED` status line; its absence is treated as failure even
/// when the exit code is zero, since some helpers exit 0 on partial failure.
pub fn sign(program: &str, signing_key: &[u8], content: &[u8]) -> Result<Vec<u8>, SignError> {
    let signing_key = String::from_utf8_lossy(signing_key).into_owned();
    let mut cmd = Command::new(program);
    cmd.args(["--status-fd=2", "-bsau", &signing_key])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    tracing::debug!(program, signing_key, "spawning signing helper");
    let mut child = cmd.spawn()?;
    child
        .stdin
        .take()
        .expect("stdin was piped")
        .write_all(content)?;

    let output = child.wait_with_output()?;
    let status_stream = output.stderr.to_str_lossy();
    if !status_stream.contains("SIG_CREATED") {
        return Err(SignError::Failed {
            program: program.to_string(),
            stderr: status_stream.into_owned(),
        });
    }

    if output.stdout.is_empty() {
        return Err(SignError::NoSignature);
    }
    Ok(output.stdout)
}

/// Wraps a raw signature blob as a `gpgsig` commit header, indenting every
/// continuation line with a single space per git's header-continuation
/// convention (§3 commit body invariant).
pub fn format_gpgsig_header(signature: &[u8]) -> Vec<u8> {
    let mut header = b"gpgsig ".to_vec();
    header.extend_from_slice(&signature.replace(b"\n", b"\n "));
    if header.ends_with(b" ") {
        header.pop();
    }
    header
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_multiline_signature_with_continuation_indent() {
        let sig = b"-----BEGIN PGP SIGNATURE-----\nabc\n-----END PGP SIGNATURE-----\n";
        let header = format_gpgsig_header(sig);
        assert_eq!(
            header,
            b"gpgsig -----BEGIN PGP SIGNATURE-----\n abc\n -----END PGP SIGNATURE-----\n".to_vec()
        );
    }
}
