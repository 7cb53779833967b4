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

use revise_lib::todo::Step;
use revise_lib::todo::StepKind;
use revise_lib::todo::apply_todos;
use revise_testutil::ScriptedEditor;
use revise_testutil::ScriptedPrompter;
use revise_testutil::TestRepo;

fn noop_editor() -> ScriptedEditor<impl Fn(&[u8]) -> Vec<u8>> {
    ScriptedEditor(|data: &[u8]| data.to_vec())
}

#[test]
fn fixup_fuses_staged_change_into_head_keeping_its_identity() {
    let repo = TestRepo::new();
    let c1 = repo.commit(None, &[("a", "v1\n")], "adds a");
    let c2 = repo.commit(Some(&c1), &[("a", "v2\n")], "modifies a");
    let staged = repo.commit(Some(&c2), &[("a", "staged-v2\n")], "index");

    let todos = vec![
        Step::new(StepKind::Pick, c1.clone()),
        Step::new(StepKind::Pick, c2.clone()),
        Step::new(StepKind::Fixup, staged),
    ];

    let prompter = ScriptedPrompter::new([]);
    let editor = noop_editor();
    let new_tip = apply_todos(repo.repo(), None, &todos, false, &prompter, &editor).expect("apply_todos");

    assert_eq!(new_tip.message().unwrap(), c2.message().unwrap());
    assert_eq!(new_tip.parent_oids().unwrap(), vec![c1.oid()]);
    assert_eq!(new_tip.author().unwrap(), c2.author().unwrap());
    assert_eq!(new_tip.committer().unwrap(), repo.repo().default_committer().clone());

    let entries = new_tip.tree().unwrap().entries().unwrap();
    let a = entries.entries.get(b"a".as_slice()).copied().expect("entry a");
    let blob = repo.repo().entry_blob(a).unwrap();
    assert_eq!(blob.body(), b"staged-v2\n");
}

#[test]
fn reorder_independent_commits_reproduces_original_tip_tree() {
    let repo = TestRepo::new();
    let c1 = repo.commit(None, &[("a", "v1\n")], "adds a");
    let c2 = repo.commit(Some(&c1), &[("a", "v1\n"), ("b", "vb\n")], "adds b");
    let c3 = repo.commit(Some(&c2), &[("a", "v2\n"), ("b", "vb\n")], "modifies a");

    let todos = vec![Step::new(StepKind::Pick, c3.clone()), Step::new(StepKind::Pick, c2.clone())];

    let prompter = ScriptedPrompter::new([]);
    let editor = noop_editor();
    let new_tip = apply_todos(repo.repo(), Some(&c1), &todos, false, &prompter, &editor).expect("apply_todos");

    assert_eq!(new_tip.tree().unwrap().oid(), c3.tree().unwrap().oid());
}

#[test]
fn reword_replaces_message_but_keeps_tree_and_parent() {
    let repo = TestRepo::new();
    let c1 = repo.commit(None, &[("a", "v1\n")], "adds a");
    let c2 = repo.commit(Some(&c1), &[("a", "v2\n")], "modifies a");

    let todos = vec![Step::new(StepKind::Pick, c1.clone()), Step::new(StepKind::Reword, c2.clone())];

    let prompter = ScriptedPrompter::new([]);
    let editor = ScriptedEditor(|_: &[u8]| b"rewritten message\n".to_vec());
    let new_tip = apply_todos(repo.repo(), None, &todos, false, &prompter, &editor).expect("apply_todos");

    assert_eq!(new_tip.message().unwrap(), b"rewritten message\n");
    assert_eq!(new_tip.tree().unwrap().oid(), c2.tree().unwrap().oid());
    assert_eq!(new_tip.parent_oids().unwrap(), vec![c1.oid()]);
}

#[test]
fn squash_concatenates_messages_and_then_allows_editing() {
    let repo = TestRepo::new();
    let c1 = repo.commit(None, &[("a", "v1\n")], "adds a");
    let c2 = repo.commit(Some(&c1), &[("a", "v2\n")], "modifies a");

    let todos = vec![Step::new(StepKind::Pick, c1.clone()), Step::new(StepKind::Squash, c2.clone())];

    let prompter = ScriptedPrompter::new([]);
    let editor = ScriptedEditor(|data: &[u8]| data.to_vec());
    let new_tip = apply_todos(repo.repo(), None, &todos, false, &prompter, &editor).expect("apply_todos");

    let message = String::from_utf8(new_tip.message().unwrap()).unwrap();
    assert!(message.contains("adds a"));
    assert!(message.contains("modifies a"));
    assert_eq!(new_tip.tree().unwrap().oid(), c2.tree().unwrap().oid());
}

#[test]
fn reauthor_resets_author_on_every_applied_step() {
    let repo = TestRepo::new();
    let c1 = repo.commit(None, &[("a", "v1\n")], "adds a");

    let todos = vec![Step::new(StepKind::Pick, c1.clone())];
    let prompter = ScriptedPrompter::new([]);
    let editor = noop_editor();
    let new_tip = apply_todos(repo.repo(), None, &todos, true, &prompter, &editor).expect("apply_todos");

    assert_eq!(new_tip.author().unwrap(), repo.repo().default_author().clone());
}
