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

//! Enumerating the commit ranges revise operates on (§4.2 "Commit ranges").

use crate::error::ObjectError;
use crate::oid::Oid;
use crate::repo::Commit;
use crate::repo::Repository;

/// Oldest-first list of commits strictly after `base` up to and including
/// `tip`, walking first-parent links.
pub fn commit_range(base: &Commit, tip: &Commit) -> Result<Vec<Commit>, ObjectError> {
    let mut commits = Vec::new();
    let mut tip = tip.clone();
    while &tip != base {
        let parent = tip.parent()?;
        commits.push(tip);
        tip = parent;
    }
    commits.reverse();
    Ok(commits)
}

/// Oldest-first list of commits reachable from `tip` but not present on any
/// remote-tracking branch, plus the base commit they are stacked on (the
/// first commit in the chain that either has no single parent or is
/// otherwise not "local"). Used to pick a sensible default range to revise
/// when the user did not name one explicitly.
pub fn local_commits(repo: &Repository, tip: &Commit) -> Result<(Commit, Vec<Commit>), ObjectError> {
    let mut base = tip.clone();
    let log = repo.git(&["log", &tip.oid().hex(), "--not", "--remotes", "--pretty=%H"], None)?;

    let mut commits = Vec::new();
    for line in log.split(|&b| b == b'\n').filter(|l| !l.is_empty()) {
        let hex = std::str::from_utf8(line)
            .ok()
            .and_then(|s| Oid::from_hex(s))
            .ok_or_else(|| ObjectError::InternalConsistency("malformed `git log --pretty=%H` output".to_string()))?;
        let commit = repo.get_commit(&hex.hex())?;

        if commit.parent_oids()?.len() != 1 || commit != base {
            break;
        }
        base = commit.parent()?;
        commits.push(commit);
    }

    commits.reverse();
    Ok((base, commits))
}
