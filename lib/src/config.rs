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

//! Lookups against `git config --get [--bool|--int] <key>` (§6 "Configuration
//! surface"), with the precedence chains the design table specifies.

use crate::error::ObjectError;
use crate::git_subprocess::GitProcess;

/// Thin wrapper around the repository's `git config` subprocess, exposing
/// typed getters with the fallback-key chains listed in §6.
pub struct Config<'a> {
    process: &'a GitProcess,
}

impl<'a> Config<'a> {
    pub(crate) fn new(process: &'a GitProcess) -> Self {
        Self { process }
    }

    /// Raw string value of `key`, or `None` if unset.
    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>, ObjectError> {
        match self.process.run(&["config", "--get", key], None) {
            Ok(out) => Ok(Some(out)),
            Err(ObjectError::CommandFailed { status, .. }) if status == 1 => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Boolean value of `key` per `git config --bool` parsing rules, or
    /// `None` if unset.
    pub fn get_bool(&self, key: &str) -> Result<Option<bool>, ObjectError> {
        match self.process.run(&["config", "--get", "--bool", key], None) {
            Ok(out) => Ok(Some(out == b"true")),
            Err(ObjectError::CommandFailed { status, .. }) if status == 1 => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Integer value of `key` (accepting git's `k`/`m`/`g` suffixes), or
    /// `None` if unset.
    pub fn get_int(&self, key: &str) -> Result<Option<i64>, ObjectError> {
        match self.process.run(&["config", "--get", "--int", key], None) {
            Ok(out) => {
                let text = String::from_utf8_lossy(&out);
                Ok(text.trim().parse().ok())
            }
            Err(ObjectError::CommandFailed { status, .. }) if status == 1 => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Tries `key`, falling back to `fallback_key`, defaulting to `default`.
    pub fn bool_with_fallback(&self, key: &str, fallback_key: &str, default: bool) -> Result<bool, ObjectError> {
        if let Some(v) = self.get_bool(key)? {
            return Ok(v);
        }
        if let Some(v) = self.get_bool(fallback_key)? {
            return Ok(v);
        }
        Ok(default)
    }

    /// Tries `key`, falling back to `fallback_key`, then `default`.
    pub fn str_with_fallback(
        &self,
        key: &str,
        fallback_key: &str,
        default: &[u8],
    ) -> Result<Vec<u8>, ObjectError> {
        if let Some(v) = self.get(key)? {
            return Ok(v);
        }
        if let Some(v) = self.get(fallback_key)? {
            return Ok(v);
        }
        Ok(default.to_vec())
    }

    /// `revise.gpgSign`, falling back to `commit.gpgSign`.
    pub fn sign_commits(&self) -> Result<bool, ObjectError> {
        self.bool_with_fallback("revise.gpgSign", "commit.gpgSign", false)
    }

    /// `gpg.program`, defaulting to `gpg`.
    pub fn signing_program(&self) -> Result<String, ObjectError> {
        Ok(String::from_utf8_lossy(&self.str_with_fallback("gpg.program", "gpg.program", b"gpg")?).into_owned())
    }

    /// `revise.autoSquash`, falling back to `rebase.autoSquash`.
    pub fn autosquash(&self) -> Result<bool, ObjectError> {
        self.bool_with_fallback("revise.autoSquash", "rebase.autoSquash", false)
    }

    /// `revise.rerere`, falling back to `rerere.enabled`, defaulting to
    /// whether the `rr-cache` directory already exists.
    pub fn rerere_enabled(&self, rr_cache_exists: bool) -> Result<bool, ObjectError> {
        self.bool_with_fallback("revise.rerere", "rerere.enabled", rr_cache_exists)
    }

    /// `rerere.autoUpdate`, defaulting to `false`.
    pub fn rerere_auto_update(&self) -> Result<bool, ObjectError> {
        Ok(self.get_bool("rerere.autoUpdate")?.unwrap_or(false))
    }
}
