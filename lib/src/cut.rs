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

//! Splitting a single commit into two via an interactive patch selection
//! (§4.7 "Cut").

use crate::editor::Editor;
use crate::editor::run_editor;
use crate::error::TodoError;
use crate::index::Index;
use crate::reference::Reference;
use crate::repo::Commit;
use crate::repo::Tree;

/// Splits `commit` into two commits: the first containing the hunks the user
/// selects via an interactive `git reset --patch`, the second containing
/// whatever remains. Both halves are re-prompted for a commit message.
pub fn cut_commit(commit: &Commit, editor: &dyn Editor) -> Result<Commit, TodoError> {
    println!("Cutting commit {}", commit.oid().short());
    println!("Select changes to be included in part [1]:");

    let base_tree = commit.parent()?.tree()?;
    let final_tree = commit.tree()?;

    let index = Index::new(commit.repo())?;
    index.read_tree(&base_tree)?;
    index.reset_patch(commit)?;

    let mid_tree = index.write_tree()?;

    if mid_tree == base_tree {
        return Err(TodoError::EmptyCutPart(1));
    }
    if mid_tree == final_tree {
        return Err(TodoError::EmptyCutPart(2));
    }

    let mut message = commit.message()?;
    let mut part1_message = b"[1] ".to_vec();
    part1_message.extend_from_slice(&message);
    let part1 = commit.update(Some(mid_tree), None, Some(part1_message), None)?;
    let part1 = edit_commit_message(&part1, editor)?;

    let mut part2_message = b"[2] ".to_vec();
    message = commit.message()?;
    part2_message.extend_from_slice(&message);
    let part2 = commit.update(None, Some(vec![part1]), Some(part2_message), None)?;
    let part2 = edit_commit_message(&part2, editor)?;

    Ok(part2)
}

/// Launches an editor on `commit`'s message, seeded with a `diff --stat`
/// against its parent as editing context (§4.3 "Commit message editing").
pub fn edit_commit_message(commit: &Commit, editor: &dyn Editor) -> Result<Commit, TodoError> {
    let repo = commit.repo();
    let mut comments = "Please enter the commit message for your changes. Lines starting\n\
         with '#' will be ignored, and an empty message aborts the commit.\n"
        .to_string();

    if commit.parent_oids()?.len() == 1 {
        let tree_a = commit.parent()?.tree()?.persist()?.hex();
        let tree_b = commit.tree()?.persist()?.hex();
        let stat = repo.git(&["diff-tree", "--stat", &tree_a, &tree_b], None)?;
        comments.push('\n');
        comments.push_str(&String::from_utf8_lossy(&stat));
    }

    let message = run_editor(repo, editor, "COMMIT_EDITMSG", &commit.message()?, Some(&comments), false)?;
    Ok(commit.update(None, None, Some(message), None)?)
}

/// Points `reference` at `new`, warning (rather than failing) if the result's
/// tree does not match `expected` — the working tree and index are left
/// untouched either way (§4.4 "HEAD update").
pub fn update_head(reference: &mut Reference<Commit>, new: &Commit, expected: Option<&Tree>) -> Result<(), TodoError> {
    let old_oid = reference.target().map(|c| c.oid()).unwrap_or_else(crate::oid::Oid::null);
    println!("Updating {} ({} => {})", reference.name(), old_oid, new.oid());
    reference.update(new, "git-revise rewrite")?;

    if let Some(expected) = expected {
        let actual = new.tree()?;
        if &actual != expected {
            eprintln!(
                "(warning) unexpected final tree\n\
                 (note) expected: {}\n\
                 (note) actual: {}\n\
                 (note) working directory & index have not been updated.\n\
                 (note) use `git status` to see what has changed.",
                expected.oid(),
                actual.oid()
            );
        }
    }
    Ok(())
}
