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

//! Git-backed fixtures and scripted `Editor`/`Prompter` doubles for
//! exercising `revise-lib` against a real, disposable repository instead of
//! a terminal.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::collections::VecDeque;
use std::path::Path;
use std::process::Command;

use revise_lib::Commit;
use revise_lib::Entry;
use revise_lib::Mode;
use revise_lib::Repository;
use revise_lib::editor::Editor;
use revise_lib::editor::Prompter;
use revise_lib::error::EditorError;
use revise_lib::error::MergeError;
use tempfile::TempDir;

/// A disposable git repository in a fresh temp directory, with a fixed
/// commit identity so fixture commits are reproducible across runs.
pub struct TestRepo {
    dir: TempDir,
    repo: Repository,
}

impl TestRepo {
    /// Runs `git init`, pins `user.name`/`user.email`, and opens the result
    /// as a [`Repository`].
    pub fn new() -> Self {
        let dir = tempfile::Builder::new().prefix("revise-test-").tempdir().expect("mkdtemp");
        run_git(dir.path(), &["init", "-q", "-b", "main"]);
        run_git(dir.path(), &["config", "user.name", "Test User"]);
        run_git(dir.path(), &["config", "user.email", "test@example.com"]);
        run_git(dir.path(), &["config", "commit.gpgsign", "false"]);
        let repo = Repository::open(Some(dir.path())).expect("open fixture repo");
        Self { dir, repo }
    }

    pub fn repo(&self) -> &Repository {
        &self.repo
    }

    /// Sets a local git config value (e.g. `"rerere.enabled"`, `"true"`).
    pub fn set_config(&self, key: &str, value: &str) {
        run_git(self.path(), &["config", key, value]);
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Builds and persists a commit whose entire tree is the given flat set
    /// of `(name, content)` files, parented on `parent`.
    pub fn commit(&self, parent: Option<&Commit>, files: &[(&str, &str)], message: &str) -> Commit {
        let mut entries = BTreeMap::new();
        for (name, content) in files {
            let blob = self.repo.new_blob(content.as_bytes().to_vec());
            entries.insert(name.as_bytes().to_vec(), Entry::new(Mode::Regular, blob.oid()));
        }
        let tree = self.repo.new_tree(entries);
        let parents: Vec<Commit> = parent.into_iter().cloned().collect();
        let commit = self.repo.new_commit(&tree, &parents, message.as_bytes().to_vec(), None, None).expect("build commit");
        commit.persist().expect("persist fixture commit");
        commit
    }
}

impl Default for TestRepo {
    fn default() -> Self {
        Self::new()
    }
}

fn run_git(dir: &Path, args: &[&str]) {
    let status = Command::new("git").current_dir(dir).args(args).status().expect("spawn git");
    assert!(status.success(), "git {args:?} failed");
}

/// Applies a fixed transform to whatever file an [`Editor::edit`] call
/// names, simulating a user's edit without a real subprocess.
pub struct ScriptedEditor<F: Fn(&[u8]) -> Vec<u8>>(pub F);

impl<F: Fn(&[u8]) -> Vec<u8>> Editor for ScriptedEditor<F> {
    fn edit(&self, _editor_cmd: &str, path: &Path) -> Result<(), EditorError> {
        let data = std::fs::read(path)?;
        std::fs::write(path, (self.0)(&data))?;
        Ok(())
    }
}

/// A pre-scripted answer for one [`ScriptedPrompter`] call.
pub enum Answer {
    Current,
    Other,
    Abort,
    Yes,
    No,
}

/// Replays a fixed queue of answers, failing with [`MergeError::UserAborted`]
/// if it runs dry.
pub struct ScriptedPrompter(pub RefCell<VecDeque<Answer>>);

impl ScriptedPrompter {
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        Self(RefCell::new(answers.into_iter().collect()))
    }

    fn next(&self, path: &Path) -> Result<Answer, MergeError> {
        self.0.borrow_mut().pop_front().ok_or_else(|| MergeError::UserAborted(path.to_path_buf()))
    }
}

impl Prompter for ScriptedPrompter {
    fn resolve_conflict(
        &self,
        path: &Path,
        _descr: &str,
        _label_current: &str,
        _current_descr: &str,
        _label_other: &str,
        _other_descr: &str,
    ) -> Result<bool, MergeError> {
        match self.next(path)? {
            Answer::Current => Ok(true),
            Answer::Other => Ok(false),
            Answer::Abort => Err(MergeError::UserAborted(path.to_path_buf())),
            _ => Err(MergeError::UserAborted(path.to_path_buf())),
        }
    }

    fn confirm(&self, _question: &str, default_yes: bool) -> Result<bool, MergeError> {
        match self.0.borrow_mut().pop_front() {
            Some(Answer::Yes) => Ok(true),
            Some(Answer::No) => Ok(false),
            Some(_) | None => Ok(default_yes),
        }
    }
}
