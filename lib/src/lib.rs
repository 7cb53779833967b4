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

//! Core object database, merge, and rebase engine behind `git-revise`: an
//! interactive history-rewriting tool that edits a git repository's commit
//! graph in place, offline, without touching the working tree.

pub mod config;
pub mod cut;
pub mod editor;
pub mod error;
mod git_subprocess;
pub mod hex_util;
pub mod index;
pub mod merge;
pub mod object;
pub mod oid;
pub mod range;
pub mod reference;
pub mod repo;
pub mod rerere;
pub mod signature;
mod signing;
pub mod todo;

pub use object::Entry;
pub use object::Kind;
pub use object::Mode;
pub use oid::Oid;
pub use repo::Blob;
pub use repo::Commit;
pub use repo::GitObj;
pub use repo::Repository;
pub use repo::Tree;
pub use signature::Signature;
