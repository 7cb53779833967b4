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

//! A throwaway git index file, isolated from the repository's real index via
//! `GIT_INDEX_FILE` (§3 "Index handle"; used by the cut operation's
//! isolated-index patch selection, §4.7).

use std::path::PathBuf;

use crate::error::ObjectError;
use crate::object::Entry;
use crate::object::Mode;
use crate::oid::Oid;
use crate::repo::Commit;
use crate::repo::Repository;
use crate::repo::Tree;

/// An index file living outside the repository's `.git/index`, so
/// operations against it (`read-tree`, `update-index`, `write-tree`,
/// `reset --patch`) never disturb the user's staged changes.
pub struct Index {
    repo: Repository,
    path: PathBuf,
}

impl Index {
    /// Allocates a new, empty index file inside the repository's scratch
    /// directory.
    pub fn new(repo: &Repository) -> Result<Self, ObjectError> {
        let path = repo.tempdir()?.join(format!("index.{}", std::process::id()));
        Ok(Self { repo: repo.clone(), path })
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    fn env(&self) -> [(&str, &std::ffi::OsStr); 1] {
        [("GIT_INDEX_FILE", self.path.as_os_str())]
    }

    /// Runs a `git` subcommand with `GIT_INDEX_FILE` pointed at this index.
    pub fn git(&self, args: &[&str], stdin: Option<&[u8]>) -> Result<Vec<u8>, ObjectError> {
        self.repo.git_with_env(args, stdin, &self.env())
    }

    /// Populates this index from `tree`, discarding whatever was there
    /// before.
    pub fn read_tree(&self, tree: &Tree) -> Result<(), ObjectError> {
        self.git(&["read-tree", &tree.oid().hex()], None)?;
        Ok(())
    }

    /// Like [`Self::read_tree`], but merges `tree` onto the current index
    /// contents using the standard one-sided merge strategy (used to seed a
    /// cut's working copy with `HEAD^{tree}` before interactive selection).
    pub fn read_tree_merge_onto(&self, tree: &Tree) -> Result<(), ObjectError> {
        self.git(&["read-tree", "-m", &tree.oid().hex()], None)?;
        Ok(())
    }

    /// Writes the current index contents out as a tree object.
    pub fn write_tree(&self) -> Result<Tree, ObjectError> {
        let out = self.git(&["write-tree"], None)?;
        let oid = Oid::from_hex(String::from_utf8_lossy(&out).trim())
            .ok_or_else(|| ObjectError::InternalConsistency("write-tree returned non-hex output".into()))?;
        self.repo.get_tree(&oid.hex())
    }

    /// Stages a single path at `mode`/`oid` directly, without touching the
    /// working tree (`update-index --cacheinfo`).
    pub fn stage_entry(&self, path: &[u8], entry: Entry) -> Result<(), ObjectError> {
        let cacheinfo = format!("{},{},{}", entry.mode.as_str(), entry.oid.hex(), String::from_utf8_lossy(path));
        self.git(&["update-index", "--add", "--cacheinfo", &cacheinfo], None)?;
        Ok(())
    }

    /// Removes a path from the index entirely.
    pub fn remove_entry(&self, path: &[u8]) -> Result<(), ObjectError> {
        self.git(
            &["update-index", "--force-remove", "--", &String::from_utf8_lossy(path)],
            None,
        )?;
        Ok(())
    }

    /// Drives `git reset --patch <commit>` against the real working tree
    /// while keeping this scratch index as the target, letting the user
    /// interactively select which hunks to pull into the cut's first part
    /// (§4.7 "Cut").
    pub fn reset_patch(&self, commit: &Commit) -> Result<i32, ObjectError> {
        self.repo
            .git_interactive_with_env(&["reset", "--patch", &commit.oid().hex()], &self.env())
    }
}

/// A file-mode pair ready to stage, derived from a tree entry lookup; kept
/// here rather than in `object` since it is only meaningful alongside an
/// [`Index`].
pub fn entry_at(tree: &Tree, path: &[u8]) -> Result<Option<Entry>, ObjectError> {
    Ok(tree.entries()?.entries.get(path).copied())
}

/// Whether `mode` names something `update-index --cacheinfo` can stage
/// directly (files and symlinks; directories are walked instead).
pub fn is_stageable(mode: Mode) -> bool {
    !matches!(mode, Mode::Dir)
}
