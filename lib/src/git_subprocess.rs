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

//! Process management for the `git` binary: a long-lived `cat-file --batch`
//! pipe for object retrieval, and one-shot commands for everything else
//! (§4.1 "Object retrieval and caching", §6 "Subprocess inventory").

use std::io::BufRead as _;
use std::io::BufReader;
use std::io::Read as _;
use std::io::Write as _;
use std::path::Path;
use std::path::PathBuf;
use std::process::Child;
use std::process::ChildStdin;
use std::process::ChildStdout;
use std::process::Command;
use std::process::Stdio;

use bstr::ByteSlice as _;

use crate::error::ObjectError;
use crate::object::Kind;
use crate::oid::Oid;

/// Result of a single `cat-file --batch` request.
pub enum BatchResult {
    Found { oid: Oid, kind: Kind, body: Vec<u8> },
    Missing,
}

/// Owns the `git` subprocesses used by a [`crate::repo::Repository`]: a
/// persistent batch reader, plus a helper for one-shot commands. Both run
/// with `--git-dir` pointed at the repository in question.
pub struct GitProcess {
    git_dir: PathBuf,
    workdir: PathBuf,
    batch: std::cell::RefCell<Option<BatchReader>>,
}

impl GitProcess {
    pub(crate) fn new(workdir: PathBuf, git_dir: PathBuf) -> Self {
        Self {
            git_dir,
            workdir,
            batch: std::cell::RefCell::new(None),
        }
    }

    fn base_command(&self) -> Command {
        let mut cmd = Command::new("git");
        cmd.current_dir(&self.workdir)
            .arg("--git-dir")
            .arg(&self.git_dir)
            .env("LC_ALL", "C");
        cmd
    }

    /// Runs a one-shot git command, returning stdout with a single trailing
    /// newline stripped (matching the convention most plumbing subcommands
    /// use). Fails with [`ObjectError::CommandFailed`] on nonzero exit.
    pub fn run(&self, args: &[&str], stdin: Option<&[u8]>) -> Result<Vec<u8>, ObjectError> {
        self.run_with_env(args, stdin, &[])
    }

    /// Like [`Self::run`], but with extra environment variables set on the
    /// child (used by the index helpers to set `GIT_INDEX_FILE`).
    pub fn run_with_env(
        &self,
        args: &[&str],
        stdin: Option<&[u8]>,
        env: &[(&str, &std::ffi::OsStr)],
    ) -> Result<Vec<u8>, ObjectError> {
        let (status, stdout, stderr) = self.run_allow_failure(args, stdin, env)?;
        if status != 0 {
            return Err(ObjectError::CommandFailed {
                command: args.join(" "),
                status,
                stderr: stderr.to_str_lossy().into_owned(),
            });
        }
        let mut stdout = stdout;
        if stdout.last() == Some(&b'\n') {
            stdout.pop();
        }
        Ok(stdout)
    }

    /// Like [`Self::run_with_env`], but returns the raw exit code and
    /// stdout/stderr instead of erroring on nonzero exit: some plumbing
    /// commands (`merge-file`) use the exit code to report a conflict
    /// count rather than failure.
    pub fn run_allow_failure(
        &self,
        args: &[&str],
        stdin: Option<&[u8]>,
        env: &[(&str, &std::ffi::OsStr)],
    ) -> Result<(i32, Vec<u8>, Vec<u8>), ObjectError> {
        let mut cmd = self.base_command();
        cmd.args(args);
        for (key, value) in env {
            cmd.env(key, value);
        }
        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        tracing::debug!(cmd = ?cmd, "spawning a git subprocess");
        let mut child = cmd
            .spawn()
            .map_err(|e| ObjectError::Subprocess(args.join(" "), e))?;

        if let Some(input) = stdin {
            child
                .stdin
                .take()
                .expect("stdin was piped")
                .write_all(input)
                .map_err(|e| ObjectError::Subprocess(args.join(" "), e))?;
        } else {
            drop(child.stdin.take());
        }

        let output = child
            .wait_with_output()
            .map_err(|e| ObjectError::Subprocess(args.join(" "), e))?;

        Ok((output.status.code().unwrap_or(-1), output.stdout, output.stderr))
    }

    /// Runs a git command that drives the terminal directly (interactive
    /// editors, `reset --patch`), inheriting stdio rather than capturing it.
    pub fn run_interactive(&self, args: &[&str]) -> Result<i32, ObjectError> {
        self.run_interactive_with_env(args, &[])
    }

    /// Like [`Self::run_interactive`], but with extra environment variables
    /// (used to point an interactive `reset --patch` at a scratch index).
    pub fn run_interactive_with_env(
        &self,
        args: &[&str],
        env: &[(&str, &std::ffi::OsStr)],
    ) -> Result<i32, ObjectError> {
        let mut cmd = self.base_command();
        cmd.args(args);
        for (key, value) in env {
            cmd.env(key, value);
        }
        tracing::debug!(cmd = ?cmd, "spawning an interactive git subprocess");
        let status = cmd
            .status()
            .map_err(|e| ObjectError::Subprocess(args.join(" "), e))?;
        Ok(status.code().unwrap_or(-1))
    }

    /// Looks up `reference` (an oid or rev-parse-able name) through the
    /// batch reader, spawning it lazily on first use.
    pub fn cat_file_batch(&self, reference: &str) -> Result<BatchResult, ObjectError> {
        let mut slot = self.batch.borrow_mut();
        if slot.is_none() {
            *slot = Some(BatchReader::spawn(&self.workdir, &self.git_dir)?);
        }
        slot.as_mut().expect("just initialized").request(reference)
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }
}

/// A long-lived `git cat-file --batch` child process, fed one reference per
/// line and returning framed `<oid> <kind> <size>\n<body>\n` responses (or
/// `<reference> missing\n`).
struct BatchReader {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl BatchReader {
    fn spawn(workdir: &Path, git_dir: &Path) -> Result<Self, ObjectError> {
        let mut cmd = Command::new("git");
        cmd.current_dir(workdir)
            .arg("--git-dir")
            .arg(git_dir)
            .env("LC_ALL", "C")
            .args(["cat-file", "--batch"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        tracing::debug!(cmd = ?cmd, "spawning the cat-file --batch reader");
        let mut child = cmd
            .spawn()
            .map_err(|e| ObjectError::Subprocess("cat-file --batch".into(), e))?;
        let stdin = child.stdin.take().expect("stdin was piped");
        let stdout = BufReader::new(child.stdout.take().expect("stdout was piped"));
        Ok(Self { child, stdin, stdout })
    }

    fn request(&mut self, reference: &str) -> Result<BatchResult, ObjectError> {
        writeln!(self.stdin, "{reference}")
            .map_err(|e| ObjectError::Subprocess("cat-file --batch".into(), e))?;
        self.stdin
            .flush()
            .map_err(|e| ObjectError::Subprocess("cat-file --batch".into(), e))?;

        let mut header = String::new();
        self.stdout
            .read_line(&mut header)
            .map_err(|e| ObjectError::Subprocess("cat-file --batch".into(), e))?;
        let header = header.trim_end();

        if header.ends_with("missing") {
            return Ok(BatchResult::Missing);
        }

        let mut parts = header.splitn(3, ' ');
        let (Some(oid_hex), Some(kind_str), Some(size_str)) = (parts.next(), parts.next(), parts.next()) else {
            return Err(ObjectError::InternalConsistency(format!(
                "unparseable cat-file --batch header: {header:?}"
            )));
        };
        let oid = Oid::from_hex(oid_hex)
            .ok_or_else(|| ObjectError::InternalConsistency(format!("bad oid in batch header: {oid_hex}")))?;
        let kind = match kind_str {
            "commit" => Kind::Commit,
            "tree" => Kind::Tree,
            "blob" => Kind::Blob,
            other => {
                return Err(ObjectError::InternalConsistency(format!(
                    "unexpected object kind from cat-file --batch: {other}"
                )));
            }
        };
        let size: usize = size_str
            .parse()
            .map_err(|_| ObjectError::InternalConsistency(format!("bad size in batch header: {size_str}")))?;

        let mut body = vec![0u8; size];
        self.stdout
            .read_exact(&mut body)
            .map_err(|e| ObjectError::Subprocess("cat-file --batch".into(), e))?;
        let mut trailing_newline = [0u8; 1];
        self.stdout
            .read_exact(&mut trailing_newline)
            .map_err(|e| ObjectError::Subprocess("cat-file --batch".into(), e))?;

        Ok(BatchResult::Found { oid, kind, body })
    }
}

impl Drop for BatchReader {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
