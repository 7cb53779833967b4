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

//! Exercises the conflict record/replay path: a reorder that conflicts once,
//! gets resolved manually, and is recorded; re-running the identical reorder
//! must reuse that resolution without touching the editor again.

use revise_lib::todo::Step;
use revise_lib::todo::StepKind;
use revise_lib::todo::apply_todos;
use revise_testutil::Answer;
use revise_testutil::ScriptedEditor;
use revise_testutil::ScriptedPrompter;
use revise_testutil::TestRepo;

#[test]
fn conflicting_reorder_is_recorded_and_then_replayed_without_prompting_again() {
    let repo = TestRepo::new();
    repo.set_config("rerere.enabled", "true");

    let base = repo.commit(None, &[("f", "x\n")], "base");
    let one = repo.commit(Some(&base), &[("f", "one\n")], "one");
    let two = repo.commit(Some(&base), &[("f", "two\n")], "two");

    let todos = vec![Step::new(StepKind::Pick, two.clone()), Step::new(StepKind::Pick, one.clone())];

    let prompter = ScriptedPrompter::new([Answer::Yes, Answer::Yes]);
    let editor = ScriptedEditor(|_: &[u8]| b"resolved\n".to_vec());
    let first_tip = apply_todos(repo.repo(), Some(&base), &todos, false, &prompter, &editor).expect("first apply_todos");

    let first_entries = first_tip.tree().unwrap().entries().unwrap();
    let first_entry = first_entries.entries.get(b"f".as_slice()).copied().expect("entry f");
    assert_eq!(repo.repo().entry_blob(first_entry).unwrap().body(), b"resolved\n");

    // Re-running the same conflicting reorder must reuse the recorded
    // resolution: only the "reuse recorded resolution?" prompt fires, and
    // the editor is never invoked.
    let prompter2 = ScriptedPrompter::new([Answer::Yes]);
    let editor2 = ScriptedEditor(|_: &[u8]| panic!("editor should not run when rerere replays a recorded resolution"));
    let second_tip = apply_todos(repo.repo(), Some(&base), &todos, false, &prompter2, &editor2).expect("second apply_todos");

    assert_eq!(second_tip.tree().unwrap().oid(), first_tip.tree().unwrap().oid());
}
