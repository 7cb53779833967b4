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

//! Launching the user's configured editor, and prompting them through a
//! merge conflict (§4.3 "Editor invocation", §4.6 "Conflict prompting").
//!
//! Both concerns are abstracted behind traits so that tests can drive them
//! with scripted, non-interactive doubles instead of a real terminal.

use std::io::Write as _;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;

use crate::error::EditorError;
use crate::error::MergeError;
use crate::repo::Repository;

/// Runs an editor command against a file on disk, in place.
pub trait Editor {
    fn edit(&self, editor_cmd: &str, path: &Path) -> Result<(), EditorError>;
}

/// Spawns the user's real `$EDITOR`/`core.editor` command through a shell,
/// the way `git` itself does, so editor strings containing arguments
/// (`"emacs -nw"`) work without us having to parse them.
pub struct ProcessEditor;

impl Editor for ProcessEditor {
    fn edit(&self, editor_cmd: &str, path: &Path) -> Result<(), EditorError> {
        let mut cmd = if cfg!(windows) {
            let mut parts = editor_cmd.split_whitespace();
            let program = parts.next().unwrap_or(editor_cmd);
            let mut cmd = Command::new(program);
            cmd.args(parts).arg(path);
            cmd
        } else {
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(format!("{editor_cmd} \"$@\"")).arg(editor_cmd).arg(path);
            cmd
        };
        let status = cmd.status()?;
        if !status.success() {
            return Err(EditorError::NonZeroExit(status.code().unwrap_or(-1)));
        }
        Ok(())
    }
}

/// A side the user picked when resolving a conflict, or the chosen
/// yes/no answer to a confirmation prompt.
pub trait Prompter {
    /// Presents a two-way choice for a conflicting path; `Ok(true)` selects
    /// `current_descr`, `Ok(false)` selects `other_descr`.
    fn resolve_conflict(
        &self,
        path: &Path,
        descr: &str,
        label_current: &str,
        current_descr: &str,
        label_other: &str,
        other_descr: &str,
    ) -> Result<bool, MergeError>;

    /// A yes/no confirmation with the given default if the user presses
    /// enter without typing anything.
    fn confirm(&self, question: &str, default_yes: bool) -> Result<bool, MergeError>;
}

/// Prompts on the real terminal via stdin/stdout.
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn resolve_conflict(
        &self,
        path: &Path,
        descr: &str,
        label_current: &str,
        current_descr: &str,
        label_other: &str,
        other_descr: &str,
    ) -> Result<bool, MergeError> {
        println!("{descr} conflict for '{}'", path.display());
        println!("  (1) {label_current}: {current_descr}");
        println!("  (2) {label_other}: {other_descr}");
        print!("Resolution or (A)bort? ");
        std::io::stdout().flush().ok();
        let mut line = String::new();
        std::io::stdin().read_line(&mut line).map_err(EditorError::from)?;
        match line.trim() {
            "1" => Ok(true),
            "2" => Ok(false),
            _ => Err(MergeError::UserAborted(path.to_path_buf())),
        }
    }

    fn confirm(&self, question: &str, default_yes: bool) -> Result<bool, MergeError> {
        print!("{question} ");
        std::io::stdout().flush().ok();
        let mut line = String::new();
        std::io::stdin().read_line(&mut line).map_err(EditorError::from)?;
        let answer = line.trim().to_lowercase();
        Ok(match answer.as_str() {
            "y" | "yes" => true,
            "n" | "no" => false,
            _ => default_yes,
        })
    }
}

/// Resolves `core.commentChar`, auto-selecting an unused leading character
/// from a fixed candidate set when it is set to `"auto"` (§4.3 "comment
/// character resolution").
pub fn get_commentchar(repo: &Repository, text: &[u8]) -> Result<Vec<u8>, EditorError> {
    let configured = repo
        .config()
        .get("core.commentChar")
        .map_err(|e| EditorError::Io(std::io::Error::other(e.to_string())))?
        .unwrap_or_else(|| b"#".to_vec());

    if configured == b"auto" {
        let mut candidates: Vec<u8> = b"#;@!$%^&|:".to_vec();
        for line in text.split(|&b| b == b'\n') {
            if let Some(&first) = line.first() {
                candidates.retain(|&c| c != first);
            }
        }
        return candidates.first().map(|&c| vec![c]).ok_or(EditorError::NoCommentChar);
    }
    if configured.is_empty() {
        return Err(EditorError::EmptyCommentChar);
    }
    Ok(configured)
}

/// Strips comment lines (those starting with `commentchar`, optionally after
/// leading whitespace) and trims trailing blank lines, re-adding exactly one
/// trailing newline if anything remains.
pub fn strip_comments(data: &[u8], commentchar: &[u8], allow_preceding_whitespace: bool) -> Vec<u8> {
    let is_comment_line = |line: &[u8]| -> bool {
        let trimmed: &[u8] = if allow_preceding_whitespace {
            let start = line.iter().position(|b| !b.is_ascii_whitespace()).unwrap_or(line.len());
            &line[start..]
        } else {
            line
        };
        trimmed.starts_with(commentchar)
    };

    let mut out = Vec::new();
    for line in split_keep_newlines(data) {
        if !is_comment_line(line) {
            out.extend_from_slice(line);
        }
    }
    while out.last().is_some_and(u8::is_ascii_whitespace) {
        out.pop();
    }
    if !out.is_empty() {
        out.push(b'\n');
    }
    out
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

/// Writes `text` (plus, if given, a comment-prefixed `comments` block) to a
/// scratch file, launches `editor_cmd` on it, strips comments back out of
/// the result, and fails on an empty file unless `allow_empty` (§4.3
/// `run_specific_editor`).
pub fn run_specific_editor(
    repo: &Repository,
    editor: &dyn Editor,
    editor_cmd: &str,
    filename: &str,
    text: &[u8],
    comments: Option<&str>,
    allow_empty: bool,
    allow_whitespace_before_comments: bool,
) -> Result<Vec<u8>, EditorError> {
    let path = repo
        .tempdir()
        .map_err(|e| EditorError::Io(std::io::Error::other(e.to_string())))?
        .join(filename);
    let commentchar = get_commentchar(repo, text)?;

    {
        let mut file = std::fs::File::create(&path)?;
        for line in text.split(|&b| b == b'\n') {
            file.write_all(line)?;
            file.write_all(b"\n")?;
        }
        if let Some(comments) = comments {
            file.write_all(b"\n")?;
            for comment in textwrap::dedent(comments).lines() {
                file.write_all(&commentchar)?;
                if !comment.is_empty() {
                    file.write_all(b" ")?;
                    file.write_all(comment.as_bytes())?;
                }
                file.write_all(b"\n")?;
            }
        }
    }

    editor.edit(editor_cmd, &path)?;
    let mut data = std::fs::read(&path)?;
    if comments.is_some() {
        data = strip_comments(&data, &commentchar, allow_whitespace_before_comments);
    }

    if !allow_empty && data.is_empty() {
        return Err(EditorError::EmptyFile);
    }
    Ok(data)
}

/// `GIT_EDITOR` as resolved by `git var`.
pub fn git_editor(repo: &Repository) -> Result<String, EditorError> {
    let out = repo
        .git(&["var", "GIT_EDITOR"], None)
        .map_err(|e| EditorError::Io(std::io::Error::other(e.to_string())))?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}

/// `GIT_SEQUENCE_EDITOR`, then `sequence.editor`, then falling back to
/// [`git_editor`] (mirrors `editor.c:sequence_editor`'s lookup order).
pub fn git_sequence_editor(repo: &Repository) -> Result<String, EditorError> {
    if let Ok(env) = std::env::var("GIT_SEQUENCE_EDITOR") {
        if !env.is_empty() {
            return Ok(env);
        }
    }
    let configured = repo
        .config()
        .get("sequence.editor")
        .map_err(|e| EditorError::Io(std::io::Error::other(e.to_string())))?;
    if let Some(editor) = configured {
        return Ok(String::from_utf8_lossy(&editor).into_owned());
    }
    git_editor(repo)
}

/// Edits `text` with the commit-message comment preamble using `GIT_EDITOR`.
pub fn run_editor(
    repo: &Repository,
    editor: &dyn Editor,
    filename: &str,
    text: &[u8],
    comments: Option<&str>,
    allow_empty: bool,
) -> Result<Vec<u8>, EditorError> {
    let editor_cmd = git_editor(repo)?;
    run_specific_editor(repo, editor, &editor_cmd, filename, text, comments, allow_empty, false)
}

/// Edits `text` with the sequence-editor comment preamble, allowing comment
/// lines to be preceded by whitespace (matches `git rebase -i`'s todo-file
/// convention).
pub fn run_sequence_editor(
    repo: &Repository,
    editor: &dyn Editor,
    filename: &str,
    text: &[u8],
    comments: Option<&str>,
    allow_empty: bool,
) -> Result<Vec<u8>, EditorError> {
    let editor_cmd = git_sequence_editor(repo)?;
    run_specific_editor(repo, editor, &editor_cmd, filename, text, comments, allow_empty, true)
}

/// Edits an existing file in place with `GIT_EDITOR`, returning its new
/// contents (§4.6, used for manually resolving a conflicted blob merge).
pub fn edit_file(repo: &Repository, editor: &dyn Editor, path: &Path) -> Result<Vec<u8>, EditorError> {
    let editor_cmd = git_editor(repo)?;
    editor.edit(&editor_cmd, path)?;
    Ok(std::fs::read(path)?)
}
