//! The `check` command: probe a registry against the fixtures on disk.

use fixa_corpus::{check, TargetBackend};

use super::load_tree;

/// Check every scope of a manifest's registry; exit 1 on any drift.
pub fn check_manifest(path: &str, backend: Option<TargetBackend>) {
    let tree = load_tree(path, backend);
    let report = check(&tree);

    println!("{report}");
    println!();
    if report.is_consistent() {
        println!(
            "OK ({} fixtures in {} scopes)",
            tree.entry_count(),
            report.scopes.len()
        );
    } else {
        println!("FAILED ({} scopes drifted)", report.failures().count());
        std::process::exit(1);
    }
}
