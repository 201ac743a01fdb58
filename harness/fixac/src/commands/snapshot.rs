//! The `snapshot` command: freeze the current corpus into a manifest.

use std::path::Path;

use fixa_corpus::{snapshot, MatchRule, SnapshotOptions};

/// Print a manifest describing every fixture under `base/root`.
pub fn snapshot_corpus(
    root: &str,
    base: Option<&str>,
    rule: &MatchRule,
    options: &SnapshotOptions,
) {
    let base = Path::new(base.unwrap_or("."));
    let root = Path::new(root);
    let root = root.strip_prefix(base).unwrap_or(root);

    let manifest = match snapshot(base, root, rule, options) {
        Ok(manifest) => manifest,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };
    match manifest.to_json() {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}
