//! The `locate` command: list what the locator sees under a root.

use std::path::Path;

use fixa_corpus::{locate, normalize, MatchRule};

/// Print every located fixture with the id it normalizes to.
pub fn locate_fixtures(root: &str, rule: &MatchRule) {
    let root = Path::new(root);
    let found = match locate(root, rule) {
        Ok(found) => found,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    let width = found
        .iter()
        .map(|rel| normalize(rel, rule).as_str().len())
        .max()
        .unwrap_or(0);
    for rel in &found {
        let id = normalize(rel, rule);
        println!("{:<width$}  {}", id.as_str(), rel.display());
    }
    eprintln!("{} fixtures", found.len());
}
