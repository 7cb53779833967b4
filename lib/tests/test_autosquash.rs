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
use revise_lib::todo::autosquash_todos;
use revise_testutil::TestRepo;

#[test]
fn autosquash_moves_fixup_and_squash_next_to_their_target_regardless_of_interleaving() {
    let repo = TestRepo::new();
    let t = repo.commit(None, &[("a", "v1\n")], "add widget");
    let u = repo.commit(Some(&t), &[("b", "v1\n")], "unrelated change");
    let f1 = repo.commit(Some(&u), &[("a", "v2\n")], "fixup! add widget");
    let s1 = repo.commit(Some(&f1), &[("a", "v3\n")], "squash! add widget");

    let todos = vec![
        Step::new(StepKind::Pick, f1.clone()),
        Step::new(StepKind::Pick, u.clone()),
        Step::new(StepKind::Pick, s1.clone()),
        Step::new(StepKind::Pick, t.clone()),
    ];

    let reordered = autosquash_todos(&todos).expect("autosquash_todos");
    let oids: Vec<_> = reordered.iter().map(|s| s.commit.oid()).collect();
    assert_eq!(oids, vec![t.oid(), f1.oid(), s1.oid(), u.oid()]);

    let kinds: Vec<_> = reordered.iter().map(|s| s.kind).collect();
    assert_eq!(kinds, vec![StepKind::Pick, StepKind::Fixup, StepKind::Squash, StepKind::Pick]);
}
