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

//! Error taxonomy for the object database, merge, and todo engines.
//!
//! Each variant corresponds to one of the error kinds named in the design
//! (§7): they are not meant to be caught and recovered from except at the
//! few call sites documented there (config lookups defaulting, rerere cache
//! reads warning and falling back, `merge-file`'s conflict exit code).

use std::path::PathBuf;

use thiserror::Error;

use crate::oid::Oid;

/// Failures from reading, parsing, or persisting objects through the batch
/// reader / one-shot subprocess helpers.
#[derive(Debug, Error)]
pub enum ObjectError {
    #[error("object {0} does not exist")]
    ObjectMissing(String),

    #[error("{reference} resolved to a {actual}, but a {expected} was required")]
    UnexpectedKind {
        reference: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("internal consistency failure: {0}")]
    InternalConsistency(String),

    #[error("failed to persist object: {0}")]
    PersistFailed(String),

    #[error("failed to run `git {0}`: {1}")]
    Subprocess(String, std::io::Error),

    #[error("git {command} exited with status {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: i32,
        stderr: String,
    },

    #[error("malformed signature: {0:?}")]
    BadSignature(Vec<u8>),

    #[error("malformed commit body")]
    BadCommitBody,

    #[error("malformed tree body")]
    BadTreeBody,
}

/// Failures from the three-way merge engine.
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("merge conflict at {path}: {reason}")]
    Conflict { path: PathBuf, reason: String },

    #[error("user aborted conflict resolution at {0}")]
    UserAborted(PathBuf),

    #[error(transparent)]
    Object(#[from] ObjectError),

    #[error(transparent)]
    Editor(#[from] EditorError),

    #[error(transparent)]
    ConflictParse(#[from] ConflictParseError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failures while normalizing or replaying rerere conflict resolutions.
#[derive(Debug, Error)]
pub enum ConflictParseError {
    #[error("unterminated conflict block starting at line {0}")]
    Unterminated(usize),

    #[error("unexpected conflict marker at line {0}: {1}")]
    UnexpectedMarker(usize, String),
}

/// Failures launching or reading back from an editor.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("editor exited with non-zero status: {0}")]
    NonZeroExit(i32),

    #[error("empty file - aborting")]
    EmptyFile,

    #[error("unable to automatically select a comment character")]
    NoCommentChar,

    #[error("core.commentChar must not be empty")]
    EmptyCommentChar,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failures invoking the commit-signing helper.
#[derive(Debug, Error)]
pub enum SignError {
    #[error("gpg.program `{program}` failed: {stderr}")]
    Failed { program: String, stderr: String },

    #[error("signing helper produced no signature")]
    NoSignature,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failures validating or applying a todo list (§4.8).
#[derive(Debug, Error)]
pub enum TodoError {
    #[error("commit {0} referenced multiple times in todo list")]
    DuplicateCommit(Oid),

    #[error("commit {0} missing from todo list")]
    MissingCommit(Oid),

    #[error("commit {0} not in original todo list")]
    AddedCommit(Oid),

    #[error("non-index todo found after index todo")]
    IndexNotTrailing,

    #[error("step kind '{0}' must be one of: pick, fixup, squash, reword, cut, or index")]
    BadStepKind(String),

    #[error("todo entry '{0}' must follow format <keyword> <sha>")]
    BadStepSyntax(String),

    #[error("apply loop ended with no head commit")]
    EmptyHistory,

    #[error("cut part [{0}] is empty - aborting")]
    EmptyCutPart(u8),

    #[error("commit {0} has {1} parents, expected exactly one")]
    NotSingleParent(Oid, usize),

    #[error(transparent)]
    Object(#[from] ObjectError),

    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error(transparent)]
    Editor(#[from] EditorError),
}
