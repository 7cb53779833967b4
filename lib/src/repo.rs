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

//! Process-wide handle onto one on-disk git store (§3 "Repository", §4.1,
//! §4.2).

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;
use std::rc::Rc;

use tempfile::TempDir;

use crate::config::Config;
use crate::error::ObjectError;
use crate::git_subprocess::BatchResult;
use crate::git_subprocess::GitProcess;
use crate::object::Entry;
use crate::object::Kind;
use crate::object::Object;
use crate::object::TreeFields;
use crate::object::serialize_commit;
use crate::object::serialize_tree;
use crate::oid::Oid;
use crate::signature::Signature;
use crate::signing;

/// The two-level object cache: first byte of the id, then the full id
/// (§3 "Object cache is a two-level map").
type ObjectCache = RefCell<HashMap<u8, HashMap<Oid, Rc<Object>>>>;

struct RepoInner {
    process: GitProcess,
    cache: ObjectCache,
    default_author: Signature,
    default_committer: Signature,
    sign_commits: bool,
    signing_program: String,
    signing_key: Vec<u8>,
    tempdir: RefCell<Option<TempDir>>,
}

/// Cheaply cloneable handle onto a repository: every [`Commit`], [`Tree`],
/// and [`Blob`] carries one of these back to its store instead of borrowing
/// it, sidestepping the lifetime bookkeeping a borrowed back-reference would
/// otherwise force onto every object method (§9 "Shared/weak references via
/// back-pointers").
#[derive(Clone)]
pub struct Repository(Rc<RepoInner>);

impl Repository {
    /// Opens the repository containing `start_dir` (or the current
    /// directory, if `None`), reading `user.name`/`user.email` and the
    /// signing policy out of `git config` up front.
    pub fn open(start_dir: Option<&Path>) -> Result<Self, ObjectError> {
        let cwd = match start_dir {
            Some(p) => p.to_path_buf(),
            None => std::env::current_dir().map_err(|e| ObjectError::Subprocess("pwd".into(), e))?,
        };

        let bootstrap = GitProcess::new(cwd.clone(), cwd.clone());
        let toplevel = bootstrap.run(&["rev-parse", "--show-toplevel"], None)?;
        let git_dir = bootstrap.run(&["rev-parse", "--absolute-git-dir"], None)?;
        let workdir = PathBuf::from(String::from_utf8_lossy(&toplevel).into_owned());
        let git_dir = PathBuf::from(String::from_utf8_lossy(&git_dir).into_owned());

        let process = GitProcess::new(workdir, git_dir);
        let config = Config::new(&process);

        let author_name = process.run(&["var", "GIT_AUTHOR_IDENT"], None)?;
        let committer_name = process.run(&["var", "GIT_COMMITTER_IDENT"], None)?;
        let default_author = Signature::parse(author_name)?;
        let default_committer = Signature::parse(committer_name)?;

        let sign_commits = config.sign_commits()?;
        let signing_program = config.signing_program()?;
        let signing_key = config
            .get("user.signingKey")?
            .unwrap_or_else(|| default_committer.signing_key());

        Ok(Self(Rc::new(RepoInner {
            process,
            cache: RefCell::new(HashMap::new()),
            default_author,
            default_committer,
            sign_commits,
            signing_program,
            signing_key,
            tempdir: RefCell::new(None),
        })))
    }

    pub fn workdir(&self) -> &Path {
        self.0.process.workdir()
    }

    pub fn git_dir(&self) -> &Path {
        self.0.process.git_dir()
    }

    pub fn default_author(&self) -> &Signature {
        &self.0.default_author
    }

    pub fn default_committer(&self) -> &Signature {
        &self.0.default_committer
    }

    pub fn sign_commits(&self) -> bool {
        self.0.sign_commits
    }

    pub fn config(&self) -> Config<'_> {
        Config::new(&self.0.process)
    }

    /// Runs a one-shot `git` subcommand against this repository.
    pub fn git(&self, args: &[&str], stdin: Option<&[u8]>) -> Result<Vec<u8>, ObjectError> {
        self.0.process.run(args, stdin)
    }

    /// Like [`Self::git`], but with extra environment variables (used by
    /// [`crate::index::Index`] to point at an alternate index file).
    pub fn git_with_env(
        &self,
        args: &[&str],
        stdin: Option<&[u8]>,
        env: &[(&str, &std::ffi::OsStr)],
    ) -> Result<Vec<u8>, ObjectError> {
        self.0.process.run_with_env(args, stdin, env)
    }

    /// Runs a one-shot `git` subcommand whose nonzero exit code is
    /// meaningful data rather than failure (`merge-file`'s conflict count).
    pub fn git_allow_failure(&self, args: &[&str], stdin: Option<&[u8]>) -> Result<(i32, Vec<u8>, Vec<u8>), ObjectError> {
        self.0.process.run_allow_failure(args, stdin, &[])
    }

    /// Runs a `git` subcommand that needs the real terminal (an interactive
    /// patch selection), returning its exit code.
    pub fn git_interactive(&self, args: &[&str]) -> Result<i32, ObjectError> {
        self.0.process.run_interactive(args)
    }

    /// Like [`Self::git_interactive`], but with extra environment variables
    /// set on the child (used to target a scratch index, see
    /// [`crate::index::Index::reset_patch`]).
    pub fn git_interactive_with_env(
        &self,
        args: &[&str],
        env: &[(&str, &std::ffi::OsStr)],
    ) -> Result<i32, ObjectError> {
        self.0.process.run_interactive_with_env(args, env)
    }

    /// Lazily creates (once per process) a scratch directory inside the
    /// git directory, used for the isolated-index cut operation (§4.7).
    pub fn tempdir(&self) -> Result<PathBuf, ObjectError> {
        let mut slot = self.0.tempdir.borrow_mut();
        if slot.is_none() {
            let dir = tempfile::Builder::new()
                .prefix("revise-")
                .tempdir_in(self.git_dir())
                .map_err(|e| ObjectError::Subprocess("mkdtemp".into(), e))?;
            *slot = Some(dir);
        }
        Ok(slot.as_ref().expect("just initialized").path().to_path_buf())
    }

    fn cache_get(&self, oid: Oid) -> Option<Rc<Object>> {
        self.0.cache.borrow().get(&oid.shard()).and_then(|shard| shard.get(&oid)).cloned()
    }

    fn cache_insert(&self, obj: Rc<Object>) -> Rc<Object> {
        let mut cache = self.0.cache.borrow_mut();
        let shard = cache.entry(obj.oid.shard()).or_default();
        shard.entry(obj.oid).or_insert(obj).clone()
    }

    /// Resolves `reference` (an oid, abbreviation, or any `rev-parse`-able
    /// name) through the batch reader, returning the cached instance if one
    /// already exists for its id (§3 "at most one instance per id").
    pub fn get_obj(&self, reference: &str) -> Result<GitObj, ObjectError> {
        let (oid, kind, body) = match self.0.process.cat_file_batch(reference)? {
            BatchResult::Missing => return Err(ObjectError::ObjectMissing(reference.to_string())),
            BatchResult::Found { oid, kind, body } => (oid, kind, body),
        };
        let obj = match self.cache_get(oid) {
            Some(obj) => obj,
            None => self.cache_insert(Rc::new(Object::new(kind, body))),
        };
        debug_assert_eq!(obj.oid, oid);
        Ok(GitObj::wrap(self.clone(), obj))
    }

    pub fn get_obj_by_oid(&self, oid: Oid) -> Result<GitObj, ObjectError> {
        self.get_obj(&oid.hex())
    }

    pub fn get_commit(&self, reference: &str) -> Result<Commit, ObjectError> {
        self.get_obj(reference)?.into_commit()
    }

    pub fn get_tree(&self, reference: &str) -> Result<Tree, ObjectError> {
        self.get_obj(reference)?.into_tree()
    }

    pub fn get_blob(&self, reference: &str) -> Result<Blob, ObjectError> {
        self.get_obj(reference)?.into_blob()
    }

    /// Constructs a new, not-yet-persisted tree from `entries`.
    pub fn new_tree(&self, entries: BTreeMap<Vec<u8>, Entry>) -> Tree {
        let obj = Rc::new(Object::new(Kind::Tree, serialize_tree(&entries)));
        let obj = self.cache_insert(obj);
        Tree { repo: self.clone(), obj }
    }

    pub fn empty_tree(&self) -> Tree {
        self.new_tree(BTreeMap::new())
    }

    /// Constructs a new, not-yet-persisted blob from raw bytes.
    pub fn new_blob(&self, body: Vec<u8>) -> Blob {
        let obj = self.cache_insert(Rc::new(Object::new(Kind::Blob, body)));
        Blob { repo: self.clone(), obj }
    }

    /// Composes a new commit body (§4.2): header lines in order, the
    /// signing helper's output spliced in as a `gpgsig` header when signing
    /// is enabled, then the message.
    pub fn new_commit(
        &self,
        tree: &Tree,
        parents: &[Commit],
        message: Vec<u8>,
        author: Option<Signature>,
        committer: Option<Signature>,
    ) -> Result<Commit, ObjectError> {
        let author = author.unwrap_or_else(|| self.default_author().clone());
        let committer = committer.unwrap_or_else(|| self.default_committer().clone());
        let parent_oids: Vec<Oid> = parents.iter().map(Commit::oid).collect();

        let extra_header = if self.0.sign_commits {
            let unsigned = serialize_commit(tree.oid(), &parent_oids, &author, &committer, None, &message);
            let signature = signing::sign(&self.0.signing_program, &self.0.signing_key, &unsigned)
                .map_err(|e| ObjectError::PersistFailed(e.to_string()))?;
            Some(signing::format_gpgsig_header(&signature))
        } else {
            None
        };

        let body = serialize_commit(
            tree.oid(),
            &parent_oids,
            &author,
            &committer,
            extra_header.as_deref(),
            &message,
        );
        let obj = self.cache_insert(Rc::new(Object::new(Kind::Commit, body)));
        Ok(Commit { repo: self.clone(), obj })
    }

    /// Looks up a tree entry's object, typed and reference-counted through
    /// this repository's cache.
    pub fn entry_blob(&self, entry: Entry) -> Result<Blob, ObjectError> {
        self.get_obj_by_oid(entry.oid)?.into_blob()
    }

    pub fn entry_tree(&self, entry: Entry) -> Result<Tree, ObjectError> {
        self.get_obj_by_oid(entry.oid)?.into_tree()
    }
}

/// A git object whose kind has not yet been narrowed to a specific type.
pub enum GitObj {
    Commit(Commit),
    Tree(Tree),
    Blob(Blob),
}

impl GitObj {
    fn wrap(repo: Repository, obj: Rc<Object>) -> Self {
        match obj.kind {
            Kind::Commit => Self::Commit(Commit { repo, obj }),
            Kind::Tree => Self::Tree(Tree { repo, obj }),
            Kind::Blob => Self::Blob(Blob { repo, obj }),
        }
    }

    pub fn oid(&self) -> Oid {
        match self {
            Self::Commit(c) => c.oid(),
            Self::Tree(t) => t.oid(),
            Self::Blob(b) => b.oid(),
        }
    }

    pub fn kind(&self) -> Kind {
        match self {
            Self::Commit(_) => Kind::Commit,
            Self::Tree(_) => Kind::Tree,
            Self::Blob(_) => Kind::Blob,
        }
    }

    pub fn into_commit(self) -> Result<Commit, ObjectError> {
        match self {
            Self::Commit(c) => Ok(c),
            other => Err(unexpected(other, "commit")),
        }
    }

    pub fn into_tree(self) -> Result<Tree, ObjectError> {
        match self {
            Self::Tree(t) => Ok(t),
            other => Err(unexpected(other, "tree")),
        }
    }

    pub fn into_blob(self) -> Result<Blob, ObjectError> {
        match self {
            Self::Blob(b) => Ok(b),
            other => Err(unexpected(other, "blob")),
        }
    }
}

fn unexpected(obj: GitObj, expected: &'static str) -> ObjectError {
    ObjectError::UnexpectedKind {
        reference: obj.oid().hex(),
        expected,
        actual: obj.kind().as_str(),
    }
}

/// A persisted-or-pending commit object, paired with the repository it was
/// read from or will be written to.
#[derive(Clone)]
pub struct Commit {
    repo: Repository,
    obj: Rc<Object>,
}

impl Commit {
    pub fn oid(&self) -> Oid {
        self.obj.oid
    }

    pub fn repo(&self) -> &Repository {
        &self.repo
    }

    pub fn tree(&self) -> Result<Tree, ObjectError> {
        self.repo.get_obj_by_oid(self.obj.commit_fields()?.tree_oid)?.into_tree()
    }

    pub fn parent_oids(&self) -> Result<Vec<Oid>, ObjectError> {
        Ok(self.obj.commit_fields()?.parent_oids.clone())
    }

    pub fn parents(&self) -> Result<Vec<Commit>, ObjectError> {
        self.parent_oids()?
            .into_iter()
            .map(|oid| self.repo.get_obj_by_oid(oid)?.into_commit())
            .collect()
    }

    /// The sole parent, or [`ObjectError::InternalConsistency`] if this
    /// commit does not have exactly one.
    pub fn parent(&self) -> Result<Commit, ObjectError> {
        let parents = self.parents()?;
        match parents.len() {
            1 => Ok(parents.into_iter().next().expect("checked len")),
            n => Err(ObjectError::InternalConsistency(format!(
                "commit {} has {n} parents, expected exactly one",
                self.oid()
            ))),
        }
    }

    pub fn message(&self) -> Result<Vec<u8>, ObjectError> {
        Ok(self.obj.commit_fields()?.message.clone())
    }

    /// First line of the message, used in todo-list and summary output.
    pub fn summary(&self) -> Result<String, ObjectError> {
        let message = self.message()?;
        let line = message.split(|&b| b == b'\n').next().unwrap_or(&[]);
        Ok(String::from_utf8_lossy(line).into_owned())
    }

    pub fn author(&self) -> Result<Signature, ObjectError> {
        Ok(self.obj.commit_fields()?.author.clone())
    }

    pub fn committer(&self) -> Result<Signature, ObjectError> {
        Ok(self.obj.commit_fields()?.committer.clone())
    }

    pub fn gpgsig(&self) -> Result<Option<Vec<u8>>, ObjectError> {
        Ok(self.obj.commit_fields()?.gpgsig.clone())
    }

    /// Writes this commit (and, transitively, anything it references that
    /// is not yet persisted) into the object database via `hash-object -w`.
    pub fn persist(&self) -> Result<Oid, ObjectError> {
        if self.obj.is_persisted() {
            return Ok(self.oid());
        }
        self.tree()?.persist()?;
        for parent in self.parents()? {
            parent.persist()?;
        }
        let written = self.repo.git(&["hash-object", "-t", "commit", "-w", "--stdin"], Some(&self.obj.body))?;
        let written = Oid::from_hex(&String::from_utf8_lossy(&written))
            .ok_or_else(|| ObjectError::PersistFailed("hash-object returned non-hex output".into()))?;
        if written != self.oid() {
            return Err(ObjectError::InternalConsistency(format!(
                "hash-object wrote {written} for commit body hashing to {}",
                self.oid()
            )));
        }
        self.obj.mark_persisted();
        Ok(self.oid())
    }

    /// Builds a new commit from this one with some fields replaced,
    /// re-signing and re-parenting as needed (§4.5 "Commit.update").
    pub fn update(
        &self,
        tree: Option<Tree>,
        parents: Option<Vec<Commit>>,
        message: Option<Vec<u8>>,
        author: Option<Signature>,
    ) -> Result<Commit, ObjectError> {
        let tree = match tree {
            Some(t) => t,
            None => self.tree()?,
        };
        let parents = match parents {
            Some(p) => p,
            None => self.parents()?,
        };
        let message = message.unwrap_or(self.message()?);
        let author = Some(author.unwrap_or(self.author()?));
        self.repo.new_commit(&tree, &parents, message, author, None)
    }
}

impl PartialEq for Commit {
    fn eq(&self, other: &Self) -> bool {
        self.oid() == other.oid()
    }
}
impl Eq for Commit {}

/// A persisted-or-pending tree object.
#[derive(Clone)]
pub struct Tree {
    repo: Repository,
    obj: Rc<Object>,
}

impl Tree {
    pub fn oid(&self) -> Oid {
        self.obj.oid
    }

    pub fn repo(&self) -> &Repository {
        &self.repo
    }

    pub fn entries(&self) -> Result<Rc<TreeFields>, ObjectError> {
        self.obj.tree_fields()
    }

    /// Writes this tree (and any unpersisted sub-trees) via `hash-object -w`.
    pub fn persist(&self) -> Result<Oid, ObjectError> {
        if self.obj.is_persisted() {
            return Ok(self.oid());
        }
        for entry in self.entries()?.entries.values() {
            if entry.mode == crate::object::Mode::Dir {
                self.repo.entry_tree(*entry)?.persist()?;
            }
        }
        let written = self.repo.git(&["hash-object", "-t", "tree", "-w", "--stdin"], Some(&self.obj.body))?;
        let written = Oid::from_hex(&String::from_utf8_lossy(&written))
            .ok_or_else(|| ObjectError::PersistFailed("hash-object returned non-hex output".into()))?;
        if written != self.oid() {
            return Err(ObjectError::InternalConsistency(format!(
                "hash-object wrote {written} for tree body hashing to {}",
                self.oid()
            )));
        }
        self.obj.mark_persisted();
        Ok(self.oid())
    }
}

impl PartialEq for Tree {
    fn eq(&self, other: &Self) -> bool {
        self.oid() == other.oid()
    }
}
impl Eq for Tree {}

/// A persisted-or-pending blob object.
#[derive(Clone)]
pub struct Blob {
    repo: Repository,
    obj: Rc<Object>,
}

impl Blob {
    pub fn oid(&self) -> Oid {
        self.obj.oid
    }

    pub fn repo(&self) -> &Repository {
        &self.repo
    }

    pub fn body(&self) -> &[u8] {
        &self.obj.body
    }

    pub fn persist(&self) -> Result<Oid, ObjectError> {
        if self.obj.is_persisted() {
            return Ok(self.oid());
        }
        let written = self.repo.git(&["hash-object", "-w", "--stdin"], Some(&self.obj.body))?;
        let written = Oid::from_hex(&String::from_utf8_lossy(&written))
            .ok_or_else(|| ObjectError::PersistFailed("hash-object returned non-hex output".into()))?;
        if written != self.oid() {
            return Err(ObjectError::InternalConsistency(format!(
                "hash-object wrote {written} for blob body hashing to {}",
                self.oid()
            )));
        }
        self.obj.mark_persisted();
        Ok(self.oid())
    }
}

impl PartialEq for Blob {
    fn eq(&self, other: &Self) -> bool {
        self.oid() == other.oid()
    }
}
impl Eq for Blob {}
