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

//! `git-revise`: an interactive history-rewriting tool. Resolves a commit
//! range, builds a todo list, optionally edits it interactively, applies it,
//! and moves `HEAD` to the result (§4 "CLI surface").

use clap::Parser;
use revise_lib::editor::ProcessEditor;
use revise_lib::editor::TerminalPrompter;
use revise_lib::range::commit_range;
use revise_lib::range::local_commits;
use revise_lib::reference::Reference;
use revise_lib::repo::Commit;
use revise_lib::repo::Repository;
use revise_lib::cut::update_head;
use revise_lib::todo::StepKind;
use revise_lib::todo::apply_todos;
use revise_lib::todo::autosquash_todos;
use revise_lib::todo::build_todos;
use revise_lib::todo::edit_todos;

#[derive(Parser, Debug)]
#[command(name = "git-revise", about = "Rebase commits interactively without leaving history behind")]
struct Args {
    /// Open the sequence editor on the todo list before applying it.
    #[arg(short, long)]
    interactive: bool,

    /// Reorder `fixup!`/`squash!` commits onto the commit they target.
    #[arg(long)]
    autosquash: bool,

    /// Reset each rewritten commit's author to the repository default.
    #[arg(long)]
    reauthor: bool,

    /// Split a single commit into two via interactive patch selection,
    /// instead of revising a range.
    #[arg(long, value_name = "commit")]
    cut: Option<String>,

    /// Revise everything after this commit (defaults to the first commit
    /// not present on any remote-tracking branch).
    base: Option<String>,

    /// Increase logging verbosity; repeat for more (`-v`, `-vv`).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    use tracing_subscriber::EnvFilter;

    let default_directive = match verbose {
        0 => "error",
        1 => "revise_lib=info,revise_cli=info",
        _ => "revise_lib=debug,revise_cli=debug",
    };
    let filter = EnvFilter::try_from_env("REVISE_LOG").unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    if let Err(err) = run(args) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let repo = Repository::open(None)?;
    let prompter = TerminalPrompter;
    let editor = ProcessEditor;

    let mut head_ref: Reference<Commit> = Reference::new(&repo, "HEAD")?;
    let head = head_ref.target().cloned().ok_or("no commits to revise yet")?;
    let expected_tree = head.tree()?;

    let (base, mut todos) = if let Some(cut_ref) = &args.cut {
        let target = repo.get_commit(cut_ref)?;
        let base = target.parent()?;
        let commits = commit_range(&base, &head)?;
        let mut todos = build_todos(&commits, None);
        for step in &mut todos {
            if step.commit == target {
                step.kind = StepKind::Cut;
            }
        }
        (base, todos)
    } else if let Some(base_ref) = &args.base {
        let base = repo.get_commit(base_ref)?;
        let commits = commit_range(&base, &head)?;
        (base, build_todos(&commits, None))
    } else {
        let (base, commits) = local_commits(&repo, &head)?;
        (base, build_todos(&commits, None))
    };

    if args.autosquash {
        todos = autosquash_todos(&todos)?;
    }
    if args.interactive {
        todos = edit_todos(&repo, &editor, &todos)?;
    }

    let new_tip = apply_todos(&repo, Some(&base), &todos, args.reauthor, &prompter, &editor)?;
    update_head(&mut head_ref, &new_tip, Some(&expected_tree))?;

    Ok(())
}
