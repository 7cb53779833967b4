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

//! In-memory three-way tree merge (§4.6 "Merge engine"), used for rebasing
//! one commit onto a new parent without touching the working tree or the
//! real index.

use std::collections::BTreeSet;
use std::path::Path;

use crate::editor::Editor;
use crate::editor::Prompter;
use crate::editor::edit_file;
use crate::error::MergeError;
use crate::error::ObjectError;
use crate::object::Entry;
use crate::object::Mode;
use crate::repo::Blob;
use crate::repo::Commit;
use crate::repo::Repository;
use crate::repo::Tree;
use crate::rerere::RerereCache;

/// The three human-readable labels shown in conflict prompts and
/// `merge-file -L` markers: `(current, base, other)`.
pub type Labels<'a> = (&'a str, &'a str, &'a str);

/// Replays `commit`'s changes onto `parent` (root if `None`), three-way
/// merging against `commit`'s own parent as the merge base. Returns `commit`
/// unchanged if it is already parented on `parent` (§4.6 `rebase`).
pub fn rebase(
    commit: &Commit,
    parent: Option<&Commit>,
    prompter: &dyn Prompter,
    editor: &dyn Editor,
) -> Result<Commit, MergeError> {
    let repo = commit.repo().clone();
    let commit_parent = commit.parents()?.into_iter().next();
    if commit_parent.as_ref() == parent {
        return Ok(commit.clone());
    }

    let commit_parent_tree = match &commit_parent {
        Some(p) => p.tree()?,
        None => repo.empty_tree(),
    };
    let parent_tree = match parent {
        Some(p) => p.tree()?,
        None => repo.empty_tree(),
    };

    let rerere = RerereCache::open(&repo)?;
    let tree = merge_trees(
        Path::new("/"),
        ("new parent", "old parent", "incoming"),
        &parent_tree,
        &commit_parent_tree,
        &commit.tree()?,
        &rerere,
        prompter,
        editor,
    )?;

    let parents: Vec<Commit> = parent.into_iter().cloned().collect();
    // The committer is deliberately left unset so it is populated from the
    // environment at persist time.
    Ok(repo.new_commit(&tree, &parents, commit.message()?, Some(commit.author()?), None)?)
}

/// Merges every entry named in any of `current`, `base`, or `other`.
pub fn merge_trees(
    path: &Path,
    labels: Labels<'_>,
    current: &Tree,
    base: &Tree,
    other: &Tree,
    rerere: &RerereCache,
    prompter: &dyn Prompter,
    editor: &dyn Editor,
) -> Result<Tree, MergeError> {
    let repo = current.repo().clone();
    let current_entries = current.entries()?;
    let base_entries = base.entries()?;
    let other_entries = other.entries()?;

    let mut names: BTreeSet<&Vec<u8>> = BTreeSet::new();
    names.extend(current_entries.entries.keys());
    names.extend(base_entries.entries.keys());
    names.extend(other_entries.entries.keys());

    let mut entries = std::collections::BTreeMap::new();
    for name in names {
        let child_path = path.join(String::from_utf8_lossy(name).into_owned());
        let merged = merge_entries(
            &child_path,
            labels,
            &repo,
            current_entries.entries.get(name).copied(),
            base_entries.entries.get(name).copied(),
            other_entries.entries.get(name).copied(),
            rerere,
            prompter,
            editor,
        )?;
        if let Some(entry) = merged {
            entries.insert(name.clone(), entry);
        }
    }
    Ok(repo.new_tree(entries))
}

#[allow(clippy::too_many_arguments)]
fn merge_entries(
    path: &Path,
    labels: Labels<'_>,
    repo: &Repository,
    current: Option<Entry>,
    base: Option<Entry>,
    other: Option<Entry>,
    rerere: &RerereCache,
    prompter: &dyn Prompter,
    editor: &dyn Editor,
) -> Result<Option<Entry>, MergeError> {
    if base == current {
        return Ok(other);
    }
    if base == other {
        return Ok(current);
    }
    if current == other {
        return Ok(current);
    }

    let (current, other) = match (current, other) {
        (None, Some(other)) => {
            return prompt_or(path, "Deletion", labels, prompter, None, "deleted", Some(other), "modified");
        }
        (Some(current), None) => {
            return prompt_or(path, "Deletion", labels, prompter, Some(current), "modified", None, "deleted");
        }
        (Some(c), Some(o)) => (c, o),
        (None, None) => unreachable!("current == other handled above"),
    };

    let mode = if current.mode == other.mode {
        current.mode
    } else if current.mode.is_file() && other.mode.is_file() {
        match base {
            Some(base) if base.mode == current.mode => other.mode,
            Some(base) if base.mode == other.mode => current.mode,
            _ => Mode::Exec,
        }
    } else {
        let choice = prompter.resolve_conflict(
            path,
            "Entry type",
            labels.0,
            current.mode.as_str(),
            labels.1,
            other.mode.as_str(),
        )?;
        return Ok(Some(if choice { current } else { other }));
    };

    if mode.is_file() {
        let base_blob = match base {
            Some(base) if base.mode.is_file() => Some(repo.entry_blob(base)?),
            _ => None,
        };
        let merged = merge_blobs(
            path,
            labels,
            &repo.entry_blob(current)?,
            base_blob.as_ref(),
            &repo.entry_blob(other)?,
            rerere,
            prompter,
            editor,
        )?;
        return Ok(Some(Entry::new(mode, merged.oid())));
    }

    if mode == Mode::Dir {
        let base_tree = match base {
            Some(base) if base.mode == Mode::Dir => repo.entry_tree(base)?,
            _ => repo.empty_tree(),
        };
        let merged = merge_trees(
            path,
            labels,
            &repo.entry_tree(current)?,
            &base_tree,
            &repo.entry_tree(other)?,
            rerere,
            prompter,
            editor,
        )?;
        return Ok(Some(Entry::new(mode, merged.oid())));
    }

    if mode == Mode::Symlink {
        let current_target = String::from_utf8_lossy(repo.entry_blob(current)?.body()).into_owned();
        let other_target = String::from_utf8_lossy(repo.entry_blob(other)?.body()).into_owned();
        let choice =
            prompter.resolve_conflict(path, "Symlink", labels.0, &current_target, labels.1, &other_target)?;
        return Ok(Some(if choice { current } else { other }));
    }

    if mode == Mode::Gitlink {
        let choice = prompter.resolve_conflict(
            path,
            "Submodule",
            labels.0,
            &current.oid.hex(),
            labels.1,
            &other.oid.hex(),
        )?;
        return Ok(Some(if choice { current } else { other }));
    }

    unreachable!("every Mode variant is handled above")
}

#[allow(clippy::too_many_arguments)]
fn prompt_or(
    path: &Path,
    descr: &str,
    labels: Labels<'_>,
    prompter: &dyn Prompter,
    current: Option<Entry>,
    current_descr: &str,
    other: Option<Entry>,
    other_descr: &str,
) -> Result<Option<Entry>, MergeError> {
    let choice = prompter.resolve_conflict(path, descr, labels.0, current_descr, labels.1, other_descr)?;
    Ok(if choice { current } else { other })
}

/// Attempts an automatic three-way blob merge via `git merge-file`, falling
/// back to an interactive conflict-marker edit when it reports conflicts
/// (§4.6 `merge_blobs`).
#[allow(clippy::too_many_arguments)]
fn merge_blobs(
    path: &Path,
    labels: Labels<'_>,
    current: &Blob,
    base: Option<&Blob>,
    other: &Blob,
    rerere: &RerereCache,
    prompter: &dyn Prompter,
    editor: &dyn Editor,
) -> Result<Blob, MergeError> {
    let repo = current.repo().clone();
    let tmpdir = repo.tempdir()?;
    let current_path = tmpdir.join("current");
    let base_path = tmpdir.join("base");
    let other_path = tmpdir.join("other");
    std::fs::write(&current_path, current.body()).map_err(wrap_io)?;
    std::fs::write(&base_path, base.map(Blob::body).unwrap_or_default()).map_err(wrap_io)?;
    std::fs::write(&other_path, other.body()).map_err(wrap_io)?;

    let label_current = format!("-L{} ({})", path.display(), labels.0);
    let label_base = format!("-L{} ({})", path.display(), labels.1);
    let label_other = format!("-L{} ({})", path.display(), labels.2);

    let (status, stdout, _stderr) = repo.git_allow_failure(
        &[
            "merge-file",
            "-q",
            "-p",
            &label_current,
            &label_base,
            &label_other,
            current_path.to_str().expect("tempdir path is utf8"),
            base_path.to_str().expect("tempdir path is utf8"),
            other_path.to_str().expect("tempdir path is utf8"),
        ],
        None,
    )?;

    if status == 0 {
        return Ok(repo.new_blob(stdout));
    }
    if status < 0 {
        return Err(MergeError::Object(ObjectError::CommandFailed {
            command: "merge-file".to_string(),
            status,
            stderr: "merge-file terminated abnormally".to_string(),
        }));
    }

    println!("Merge conflict for '{}'", path.display());

    if let Some(resolved) = rerere.replay(&stdout, prompter)? {
        println!("(note) reused recorded resolution for '{}'", path.display());
        return Ok(repo.new_blob(resolved));
    }

    if !prompter.confirm("  Edit conflicted file? (Y/n)", true)? {
        return Err(MergeError::UserAborted(path.to_path_buf()));
    }

    let conflict_path = tmpdir.join("conflict").join(path.strip_prefix("/").unwrap_or(path));
    if let Some(parent) = conflict_path.parent() {
        std::fs::create_dir_all(parent).map_err(wrap_io)?;
    }
    std::fs::write(&conflict_path, &stdout).map_err(wrap_io)?;
    let merged = edit_file(&repo, editor, &conflict_path)?;

    if merged == stdout {
        println!("(note) conflicted file is unchanged");
    }
    if merged.windows(7).any(|w| w == b"<<<<<<<")
        || merged.windows(7).any(|w| w == b"=======")
        || merged.windows(7).any(|w| w == b">>>>>>>")
    {
        println!("(note) conflict markers found in the merged file");
    }

    if !prompter.confirm("  Merge successful? (y/N)", false)? {
        return Err(MergeError::UserAborted(path.to_path_buf()));
    }

    rerere.record(&stdout, &merged)?;
    Ok(repo.new_blob(merged))
}

fn wrap_io(e: std::io::Error) -> MergeError {
    MergeError::Object(ObjectError::Subprocess("merge-file scratch write".to_string(), e))
}
