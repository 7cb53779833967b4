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

//! The todo list: step kinds, construction, autosquash reordering,
//! validation, and application (§4.8).

use std::collections::HashSet;
use std::fmt;

use crate::cut::cut_commit;
use crate::cut::edit_commit_message;
use crate::editor::Editor;
use crate::editor::Prompter;
use crate::editor::run_sequence_editor;
use crate::error::ObjectError;
use crate::error::TodoError;
use crate::merge::rebase;
use crate::oid::Oid;
use crate::repo::Commit;
use crate::repo::Repository;

/// The action a single todo line performs on its commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Pick,
    Fixup,
    Squash,
    Reword,
    Cut,
    Index,
}

impl StepKind {
    /// Parses a unique-prefix abbreviation of a step keyword, same as git's
    /// own rebase todo list accepts (e.g. `p`, `pi`, `pick` all mean `Pick`).
    pub fn parse(instr: &str) -> Result<Self, TodoError> {
        let candidates: &[(&str, StepKind)] = &[
            ("pick", StepKind::Pick),
            ("fixup", StepKind::Fixup),
            ("squash", StepKind::Squash),
            ("reword", StepKind::Reword),
            ("cut", StepKind::Cut),
            ("index", StepKind::Index),
        ];
        candidates
            .iter()
            .find(|(word, _)| word.starts_with(instr) && !instr.is_empty())
            .map(|(_, kind)| *kind)
            .ok_or_else(|| TodoError::BadStepKind(instr.to_string()))
    }

    fn as_str(self) -> &'static str {
        match self {
            StepKind::Pick => "pick",
            StepKind::Fixup => "fixup",
            StepKind::Squash => "squash",
            StepKind::Reword => "reword",
            StepKind::Cut => "cut",
            StepKind::Index => "index",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single line of the todo list: an action paired with the commit it
/// applies to.
#[derive(Clone)]
pub struct Step {
    pub kind: StepKind,
    pub commit: Commit,
}

impl Step {
    pub fn new(kind: StepKind, commit: Commit) -> Self {
        Self { kind, commit }
    }

    /// Parses one `<keyword> <sha>` todo line (any trailing summary text is
    /// ignored, matching how it round-trips through [`Step::fmt`]).
    pub fn parse(repo: &Repository, instr: &str) -> Result<Self, TodoError> {
        let mut parts = instr.splitn(3, char::is_whitespace);
        let (Some(command), Some(hash)) = (parts.next(), parts.next()) else {
            return Err(TodoError::BadStepSyntax(instr.to_string()));
        };
        let kind = StepKind::parse(command)?;
        let commit = repo.get_commit(hash)?;
        Ok(Step::new(kind, commit))
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summary = self.commit.summary().unwrap_or_default();
        write!(f, "{} {} {}", self.kind, self.commit.oid().short(), summary)
    }
}

/// Emits a `pick` step per commit (oldest-first), followed by an `index`
/// step for `index_commit` when staged changes exist.
pub fn build_todos(commits: &[Commit], index_commit: Option<&Commit>) -> Vec<Step> {
    let mut steps: Vec<Step> = commits.iter().map(|c| Step::new(StepKind::Pick, c.clone())).collect();
    if let Some(commit) = index_commit {
        steps.push(Step::new(StepKind::Index, commit.clone()));
    }
    steps
}

/// Reorders `fixup!`/`squash!`-prefixed commits to immediately follow the
/// pick they target, converting their step kind in the process (§4.8
/// "Autosquash").
pub fn autosquash_todos(todos: &[Step]) -> Result<Vec<Step>, ObjectError> {
    let mut new_todos: Vec<Step> = todos.to_vec();

    for step in todos.iter().rev() {
        let summary = step.commit.summary()?;
        let kind = if summary.starts_with("fixup! ") {
            StepKind::Fixup
        } else if summary.starts_with("squash! ") {
            StepKind::Squash
        } else {
            continue;
        };

        let Some(needle) = summary.splitn(2, ' ').nth(1) else {
            continue;
        };

        let found = new_todos.iter().position(|target| {
            target.commit.summary().map(|s| s.starts_with(needle)).unwrap_or(false)
        });

        if let Some(idx) = found {
            let position = new_todos.iter().position(|t| t.commit == step.commit && t.kind == step.kind);
            new_todos.insert(idx + 1, Step::new(kind, step.commit.clone()));
            if let Some(removed_at) = position {
                let removed_at = if removed_at > idx { removed_at + 1 } else { removed_at };
                new_todos.remove(removed_at);
            }
        }
    }

    Ok(new_todos)
}

/// Serializes `todos` into an editable todo-list file and opens the
/// sequence editor on it, re-parsing and validating the result (§4.8
/// "Validation").
pub fn edit_todos(repo: &Repository, editor: &dyn Editor, todos: &[Step]) -> Result<Vec<Step>, TodoError> {
    let text = todos.iter().map(Step::to_string).collect::<Vec<_>>().join("\n");
    let comments = format!(
        "Interactive revise todos ({} commands)\n\
         \n\
         Commands:\n\
         \x20p, pick <commit> = use commit\n\
         \x20r, reword <commit> = use commit, but edit the commit message\n\
         \x20f, fixup <commit> = use commit, but fuse changes into previous commit\n\
         \x20s, squash <commit> = like fixup, but also edit the commit message\n\
         \x20c, cut <commit> = interactively split commit into two smaller commits\n\
         \x20i, index <commit> = leave commit changes unstaged\n\
         \n\
         These lines can be re-ordered; they are executed from top to bottom.\n\
         \n\
         If a line is removed, it will be treated like an 'index' line.\n\
         \n\
         However, if you remove everything, these changes will be aborted.\n",
        todos.len()
    );
    let response = run_sequence_editor(repo, editor, "git-revise-todo", text.as_bytes(), Some(&comments), false)?;

    let mut result = Vec::new();
    for line in response.split(|&b| b == b'\n') {
        let line = String::from_utf8_lossy(line);
        if line.trim().is_empty() {
            continue;
        }
        result.push(Step::parse(repo, line.trim())?);
    }

    validate_todos(todos, &result)?;
    Ok(result)
}

/// Enforces the todo-list invariants from §4.8: no duplicated, added, or
/// omitted commits, and `index` steps only trailing.
pub fn validate_todos(original: &[Step], edited: &[Step]) -> Result<(), TodoError> {
    let mut seen: HashSet<Oid> = HashSet::new();
    for step in edited {
        if !seen.insert(step.commit.oid()) {
            return Err(TodoError::DuplicateCommit(step.commit.oid()));
        }
    }

    let before: HashSet<Oid> = original.iter().map(|s| s.commit.oid()).collect();
    let after: HashSet<Oid> = edited.iter().map(|s| s.commit.oid()).collect();
    if let Some(&oid) = before.difference(&after).next() {
        return Err(TodoError::MissingCommit(oid));
    }
    if let Some(&oid) = after.difference(&before).next() {
        return Err(TodoError::AddedCommit(oid));
    }

    let mut seen_index = false;
    for step in edited {
        if step.kind == StepKind::Index {
            seen_index = true;
        } else if seen_index {
            return Err(TodoError::IndexNotTrailing);
        }
    }

    Ok(())
}

/// Runs the todo list, returning the new tip. An `index` step stops
/// iteration, surfacing the remaining steps to the caller as the "staged
/// remainder" (§4.8 "Apply").
pub fn apply_todos(
    repo: &Repository,
    base: Option<&Commit>,
    todos: &[Step],
    reauthor: bool,
    prompter: &dyn Prompter,
    editor: &dyn Editor,
) -> Result<Commit, TodoError> {
    let mut current = base.cloned();

    for step in todos {
        match step.kind {
            StepKind::Pick => {
                current = Some(rebase(&step.commit, current.as_ref(), prompter, editor)?);
            }
            StepKind::Fixup => {
                let Some(current_commit) = &current else {
                    return Err(TodoError::EmptyHistory);
                };
                let rebased = rebase(&step.commit, Some(current_commit), prompter, editor)?;
                current = Some(current_commit.update(Some(rebased.tree()?), None, None, None)?);
            }
            StepKind::Reword => {
                let rebased = rebase(&step.commit, current.as_ref(), prompter, editor)?;
                current = Some(edit_commit_message(&rebased, editor)?);
            }
            StepKind::Squash => {
                let Some(current_commit) = &current else {
                    return Err(TodoError::EmptyHistory);
                };
                let rebased = rebase(&step.commit, Some(current_commit), prompter, editor)?;
                let mut fused = current_commit.message()?;
                fused.extend_from_slice(b"\n\n");
                fused.extend_from_slice(&rebased.message()?);
                let squashed = current_commit.update(Some(rebased.tree()?), None, Some(fused), None)?;
                current = Some(edit_commit_message(&squashed, editor)?);
            }
            StepKind::Cut => {
                let rebased = rebase(&step.commit, current.as_ref(), prompter, editor)?;
                current = Some(cut_commit(&rebased, editor)?);
            }
            StepKind::Index => break,
        }

        if reauthor {
            if let Some(commit) = &current {
                current = Some(commit.update(None, None, None, Some(repo.default_author().clone()))?);
            }
        }

        if let Some(commit) = &current {
            println!("{:6} {}  {}", step.kind, commit.oid().short(), commit.summary()?);
        }
    }

    current.ok_or(TodoError::EmptyHistory)
}
