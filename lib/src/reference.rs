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

//! Typed, compare-and-swap git references (§3 "Reference").

use crate::error::ObjectError;
use crate::oid::Oid;
use crate::repo::Blob;
use crate::repo::Commit;
use crate::repo::GitObj;
use crate::repo::Repository;
use crate::repo::Tree;

/// A git object type a [`Reference`] can be typed over.
pub trait TypedObject: Sized {
    const KIND_NAME: &'static str;

    fn oid(&self) -> Oid;
    fn from_git_obj(obj: GitObj) -> Result<Self, ObjectError>;

    /// Writes this object (and anything it references) into the object
    /// database via `hash-object -w`, a no-op if already persisted.
    fn persist(&self) -> Result<Oid, ObjectError>;
}

impl TypedObject for Commit {
    const KIND_NAME: &'static str = "commit";
    fn oid(&self) -> Oid {
        Commit::oid(self)
    }
    fn from_git_obj(obj: GitObj) -> Result<Self, ObjectError> {
        obj.into_commit()
    }
    fn persist(&self) -> Result<Oid, ObjectError> {
        Commit::persist(self)
    }
}

impl TypedObject for Tree {
    const KIND_NAME: &'static str = "tree";
    fn oid(&self) -> Oid {
        Tree::oid(self)
    }
    fn from_git_obj(obj: GitObj) -> Result<Self, ObjectError> {
        obj.into_tree()
    }
    fn persist(&self) -> Result<Oid, ObjectError> {
        Tree::persist(self)
    }
}

impl TypedObject for Blob {
    const KIND_NAME: &'static str = "blob";
    fn oid(&self) -> Oid {
        Blob::oid(self)
    }
    fn from_git_obj(obj: GitObj) -> Result<Self, ObjectError> {
        obj.into_blob()
    }
    fn persist(&self) -> Result<Oid, ObjectError> {
        Blob::persist(self)
    }
}

/// A named ref (e.g. `HEAD`, `refs/heads/main`) resolved to its target,
/// supporting compare-and-swap updates through `update-ref` (§4.4).
pub struct Reference<T: TypedObject> {
    repo: Repository,
    name: String,
    target: Option<T>,
}

impl<T: TypedObject> Reference<T> {
    /// Resolves `shortname` (e.g. `HEAD`, `main`) to its fully-qualified
    /// name and current target.
    pub fn new(repo: &Repository, shortname: &str) -> Result<Self, ObjectError> {
        let full = repo.git(&["rev-parse", "--symbolic-full-name", shortname], None)?;
        let name = String::from_utf8_lossy(&full).into_owned();
        let mut reference = Self {
            repo: repo.clone(),
            name,
            target: None,
        };
        reference.refresh()?;
        Ok(reference)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target(&self) -> Option<&T> {
        self.target.as_ref()
    }

    /// Re-reads this reference's current value from disk.
    pub fn refresh(&mut self) -> Result<(), ObjectError> {
        match self.repo.git(&["rev-parse", "--verify", "--quiet", &self.name], None) {
            Ok(out) => {
                let oid = Oid::from_hex(String::from_utf8_lossy(&out).trim())
                    .ok_or_else(|| ObjectError::InternalConsistency(format!("bad rev-parse output for {}", self.name)))?;
                let obj = self.repo.get_obj_by_oid(oid)?;
                self.target = Some(T::from_git_obj(obj)?);
            }
            Err(ObjectError::CommandFailed { status, .. }) if status == 1 => {
                self.target = None;
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }

    /// Points this reference at `new`, failing atomically (via
    /// `update-ref`'s compare-and-swap) if it has moved since the last
    /// [`Self::refresh`] (§4.4 "Reference update").
    pub fn update(&mut self, new: &T, reason: &str) -> Result<(), ObjectError> {
        new.persist()?;
        let new_hex = new.oid().hex();
        let old_hex = match &self.target {
            Some(old) => old.oid().hex(),
            None => Oid::null().hex(),
        };
        self.repo
            .git(&["update-ref", "-m", reason, &self.name, &new_hex, &old_hex], None)?;
        self.refresh()
    }

    /// Deletes this reference outright, compare-and-swapped against its
    /// last-known value.
    pub fn delete(&mut self, reason: &str) -> Result<(), ObjectError> {
        let Some(old) = &self.target else {
            return Ok(());
        };
        let old_hex = old.oid().hex();
        self.repo.git(&["update-ref", "-m", reason, "-d", &self.name, &old_hex], None)?;
        self.target = None;
        Ok(())
    }
}
