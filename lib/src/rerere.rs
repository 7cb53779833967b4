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

//! Conflict resolution record/replay cache, compatible with git's own
//! `rr-cache` on-disk layout (§4.6).

use std::path::PathBuf;

use sha1::Digest as _;
use sha1::Sha1;

use crate::editor::Prompter;
use crate::error::ConflictParseError;
use crate::error::MergeError;
use crate::hex_util;
use crate::repo::Repository;

fn is_marker(line: &[u8], ch: u8) -> bool {
    line.len() >= 7 && line[..7].iter().all(|&b| b == ch) && line.get(7) != Some(&ch)
}

fn split_keep_newlines(data: &[u8]) -> Vec<&[u8]> {
    let mut lines = Vec::new();
    let mut start = 0;
    for (i, &b) in data.iter().enumerate() {
        if b == b'\n' {
            lines.push(&data[start..=i]);
            start = i + 1;
        }
    }
    if start < data.len() {
        lines.push(&data[start..]);
    }
    lines
}

/// Parses a conflict-marked file, stripping diff3 original sections and
/// marker labels, sorting each block's two hunks so that hashing and
/// rendering are independent of which side happened to be "current" this
/// time, and hashing the sorted hunks (each null-terminated) into a single
/// running digest as each block completes.
///
/// Returns `(normalized_bytes, hex_digest)`, the latter used as the rr-cache
/// key (§4.6 "Normalization").
pub fn normalize_conflicted_file(data: &[u8]) -> Result<(Vec<u8>, String), ConflictParseError> {
    let lines = split_keep_newlines(data);
    let mut hasher = Sha1::new();
    let mut pos = 0usize;
    let out = parse_section(&lines, &mut pos, &mut hasher, true)?;
    Ok((out, hex_util::encode_hex(&hasher.finalize())))
}

fn parse_section(
    lines: &[&[u8]],
    pos: &mut usize,
    hasher: &mut Sha1,
    top_level: bool,
) -> Result<Vec<u8>, ConflictParseError> {
    let mut out = Vec::new();
    while *pos < lines.len() {
        let line = lines[*pos];
        if is_marker(line, b'<') {
            out.extend_from_slice(&parse_block(lines, pos, hasher)?);
        } else if is_marker(line, b'|') || is_marker(line, b'=') || is_marker(line, b'>') {
            if top_level {
                return Err(ConflictParseError::UnexpectedMarker(
                    *pos + 1,
                    String::from_utf8_lossy(line).trim_end().to_string(),
                ));
            }
            return Ok(out);
        } else {
            out.extend_from_slice(line);
            *pos += 1;
        }
    }
    if top_level { Ok(out) } else { Err(ConflictParseError::Unterminated(*pos)) }
}

fn parse_block(lines: &[&[u8]], pos: &mut usize, hasher: &mut Sha1) -> Result<Vec<u8>, ConflictParseError> {
    let start_line = *pos + 1;
    *pos += 1;
    let left = parse_section(lines, pos, hasher, false)?;

    if *pos >= lines.len() {
        return Err(ConflictParseError::Unterminated(start_line));
    }
    if is_marker(lines[*pos], b'|') {
        *pos += 1;
        while *pos < lines.len() && !is_marker(lines[*pos], b'=') {
            *pos += 1;
        }
        if *pos >= lines.len() {
            return Err(ConflictParseError::Unterminated(start_line));
        }
    }
    if !is_marker(lines[*pos], b'=') {
        return Err(ConflictParseError::UnexpectedMarker(
            *pos + 1,
            String::from_utf8_lossy(lines[*pos]).trim_end().to_string(),
        ));
    }
    *pos += 1;

    let right = parse_section(lines, pos, hasher, false)?;
    if *pos >= lines.len() || !is_marker(lines[*pos], b'>') {
        return Err(ConflictParseError::Unterminated(start_line));
    }
    *pos += 1;

    let (first, second) = if left <= right { (left, right) } else { (right, left) };
    hasher.update(&first);
    hasher.update([0u8]);
    hasher.update(&second);
    hasher.update([0u8]);

    let mut block = Vec::new();
    block.extend_from_slice(b"<<<<<<<\n");
    block.extend_from_slice(&first);
    block.extend_from_slice(b"=======\n");
    block.extend_from_slice(&second);
    block.extend_from_slice(b">>>>>>>\n");
    Ok(block)
}

fn rr_cache_dir(repo: &Repository) -> PathBuf {
    repo.git_dir().join("rr-cache")
}

/// A handle onto the repository's `rr-cache` directory, resolved against
/// the `revise.rerere`/`rerere.enabled`/`rerere.autoUpdate` config chain.
pub struct RerereCache {
    repo: Repository,
    enabled: bool,
    auto_update: bool,
}

impl RerereCache {
    pub fn open(repo: &Repository) -> Result<Self, MergeError> {
        let exists = rr_cache_dir(repo).is_dir();
        let enabled = repo.config().rerere_enabled(exists)?;
        let auto_update = repo.config().rerere_auto_update()?;
        Ok(Self {
            repo: repo.clone(),
            enabled,
            auto_update,
        })
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    fn entry_dir(&self, conflict_id: &str) -> PathBuf {
        rr_cache_dir(&self.repo).join(conflict_id)
    }

    /// Looks for a previously recorded resolution of `preimage`, replaying
    /// it via a three-way merge against the recorded preimage/postimage pair
    /// so that unrelated context drift since the recording does not prevent
    /// reuse (§4.6 "Replay").
    pub fn replay(&self, preimage: &[u8], prompter: &dyn Prompter) -> Result<Option<Vec<u8>>, MergeError> {
        if !self.enabled {
            return Ok(None);
        }
        let (normalized_preimage, conflict_id) = normalize_conflicted_file(preimage)?;
        let entry_dir = self.entry_dir(&conflict_id);
        if !entry_dir.is_dir() {
            return Ok(None);
        }
        if !self.auto_update && !prompter.confirm("Reuse recorded resolution for this conflict? (Y/n)", true)? {
            return Ok(None);
        }

        let recorded_preimage = match std::fs::read(entry_dir.join("preimage")) {
            Ok(bytes) => bytes,
            Err(_) => {
                eprintln!("(warning) could not read rerere cache entry {conflict_id}");
                return Ok(None);
            }
        };
        let recorded_postimage = match std::fs::read(entry_dir.join("postimage")) {
            Ok(bytes) => bytes,
            Err(_) => {
                eprintln!("(warning) could not read rerere cache entry {conflict_id}");
                return Ok(None);
            }
        };

        let tmpdir = self.repo.tempdir()?;
        let postimage_path = tmpdir.join("rr-postimage");
        let preimage_path = tmpdir.join("rr-preimage");
        let current_path = tmpdir.join("rr-current");
        std::fs::write(&postimage_path, &recorded_postimage)?;
        std::fs::write(&preimage_path, &recorded_preimage)?;
        std::fs::write(&current_path, &normalized_preimage)?;

        let (status, stdout, _stderr) = self.repo.git_allow_failure(
            &[
                "merge-file",
                "-q",
                "-p",
                postimage_path.to_str().expect("tempdir path is utf8"),
                preimage_path.to_str().expect("tempdir path is utf8"),
                current_path.to_str().expect("tempdir path is utf8"),
            ],
            None,
        )?;

        if status != 0 {
            return Ok(None);
        }
        // Touch the postimage's mtime as a GC hint by rewriting it verbatim.
        std::fs::write(entry_dir.join("postimage"), &recorded_postimage)?;
        Ok(Some(stdout))
    }

    /// Records a successful manual resolution, keyed by the normalized
    /// preimage (§4.6 "Recording").
    pub fn record(&self, preimage: &[u8], postimage: &[u8]) -> Result<(), MergeError> {
        if !self.enabled {
            return Ok(());
        }
        let (_, conflict_id) = normalize_conflicted_file(preimage)?;
        let entry_dir = self.entry_dir(&conflict_id);
        std::fs::create_dir_all(&entry_dir)?;
        std::fs::write(entry_dir.join("preimage"), preimage)?;
        std::fs::write(entry_dir.join("postimage"), postimage)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(text: &str) -> (String, String) {
        let (bytes, digest) = normalize_conflicted_file(text.as_bytes()).unwrap();
        (String::from_utf8(bytes).unwrap(), digest)
    }

    #[test]
    fn strips_labels_and_ignores_longer_marker_runs() {
        let (normalized, digest) = n(
            "<<<<<<< HEAD\na\n=======\nb\n>>>>>>> original thingamabob\n\nunrelated line\n\n<<<<<<<<<< HEAD\nc\n==========\nd\n>>>>>>>>>> longer conflict marker, to be ignored\n",
        );
        assert_eq!(
            normalized,
            "<<<<<<<\na\n=======\nb\n>>>>>>>\n\nunrelated line\n\n<<<<<<<<<< HEAD\nc\n==========\nd\n>>>>>>>>>> longer conflict marker, to be ignored\n"
        );
        assert_eq!(digest, "0630df854874fc5ffb92a197732cce0d8928e898");
    }

    #[test]
    fn discards_diff3_original_section() {
        let (normalized, _) = n("<<<<<<< theirs\na\n||||||| common origin\nb\n=======\nc\n>>>>>>> ours\n");
        assert_eq!(normalized, "<<<<<<<\na\n=======\nc\n>>>>>>>\n");
    }

    #[test]
    fn sorts_sides_lexicographically() {
        let (normalized, _) = n("<<<<<<< this way round\nb\n=======\na\n>>>>>>> (unsorted)\n");
        assert_eq!(normalized, "<<<<<<<\na\n=======\nb\n>>>>>>>\n");
    }

    #[test]
    fn splices_normalized_nested_block() {
        let (normalized, _) = n(concat!(
            "<<<<<<< ours (outer)\n",
            "outer left\n",
            "<<<<<<< ours (inner)\n",
            "inner left\n",
            "|||||||\n",
            "inner diff3 original section\n",
            "=======\n",
            "inner right\n",
            ">>>>>>> theirs (inner)\n",
            "=======\n",
            "outer right\n",
            ">>>>>>> theirs (outer)\n",
        ));
        assert_eq!(
            normalized,
            "<<<<<<<\nouter left\n<<<<<<<\ninner left\n=======\ninner right\n>>>>>>>\n=======\nouter right\n>>>>>>>\n"
        );
    }

    #[test]
    fn rejects_unterminated_block() {
        assert!(normalize_conflicted_file(b"<<<<<<< a\nx\n=======\ny\n").is_err());
    }
}
