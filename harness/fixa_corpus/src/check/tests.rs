use super::*;
use crate::backend::TargetBackend;
use crate::locate::MatchRule;
use crate::scope::{EntryDecl, ScopeDecl};
use pretty_assertions::assert_eq;
use std::fs::{self, File};
use tempfile::{tempdir, TempDir};

fn corpus(files: &[&str]) -> TempDir {
    let dir = tempdir().unwrap();
    for file in files {
        let path = dir.path().join(file);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        File::create(path).unwrap();
    }
    dir
}

fn test_rule() -> MatchRule {
    MatchRule::files(r"(.+)\.test").unwrap()
}

fn flat(dir: &TempDir, entries: &[&str]) -> ScopeTree {
    let decl = ScopeDecl::new("", test_rule()).entries(entries.iter().map(|e| EntryDecl::new(*e)));
    ScopeTree::build(dir.path(), TargetBackend::Any, decl).unwrap()
}

fn root_findings(report: &ConsistencyReport) -> ScopeFindings {
    report.findings(ScopeId::ROOT).cloned().unwrap()
}

#[test]
fn test_exact_match_is_clean() {
    let dir = corpus(&["a.test", "b.test"]);
    let report = check(&flat(&dir, &["a.test", "b.test"]));
    assert!(report.is_consistent());
    assert_eq!(root_findings(&report), ScopeFindings::default());
    assert!(report.into_result().is_ok());
}

#[test]
fn test_extra_fixture_is_unregistered() {
    let dir = corpus(&["a.test", "b.test", "c.test"]);
    let report = check(&flat(&dir, &["a.test", "b.test"]));
    assert!(!report.is_consistent());
    let findings = root_findings(&report);
    assert_eq!(findings.unregistered, vec![PathBuf::from("c.test")]);
    assert!(findings.stale.is_empty());
}

#[test]
fn test_missing_fixture_is_stale() {
    let dir = corpus(&["a.test", "b.test"]);
    let report = check(&flat(&dir, &["a.test", "b.test", "c.test"]));
    let findings = root_findings(&report);
    assert!(findings.unregistered.is_empty());
    assert_eq!(
        findings.stale,
        vec![StaleEntry {
            id: normalize(Path::new("c.test"), &test_rule()),
            path: PathBuf::from("c.test"),
        }]
    );
}

#[test]
fn test_empty_corpus_and_registry_is_clean() {
    let dir = corpus(&[]);
    assert!(check(&flat(&dir, &[])).is_consistent());
}

#[test]
fn test_colliding_fixtures_on_disk() {
    let dir = corpus(&["Kt-18728.test", "kt18728.test", "other.test"]);
    let report = check(&flat(&dir, &["kt18728.test", "other.test"]));
    let findings = root_findings(&report);
    assert!(findings.unregistered.is_empty());
    assert!(findings.stale.is_empty());
    assert_eq!(
        findings.collisions,
        vec![IdCollision {
            id: normalize(Path::new("Kt-18728.test"), &test_rule()),
            paths: vec![PathBuf::from("Kt-18728.test"), PathBuf::from("kt18728.test")],
        }]
    );
    assert!(!report.is_consistent());
}

#[test]
fn test_child_scope_claims_its_directory() {
    let dir = corpus(&["topLevel.test", "bound/simple.test"]);
    let decl = ScopeDecl::new("", test_rule().recursive(true))
        .entry("topLevel.test")
        .child(ScopeDecl::new("bound", test_rule()).entry("simple.test"));
    let tree = ScopeTree::build(dir.path(), TargetBackend::Any, decl).unwrap();

    let report = check(&tree);
    assert_eq!(report.scopes.len(), 2);
    assert!(report.is_consistent(), "{report}");
}

#[test]
fn test_new_subdirectory_under_recursive_parent_is_unregistered() {
    let dir = corpus(&["topLevel.test", "bound/simple.test", "fresh/new.test"]);
    let decl = ScopeDecl::new("", test_rule().recursive(true))
        .entry("topLevel.test")
        .child(ScopeDecl::new("bound", test_rule()).entry("simple.test"));
    let tree = ScopeTree::build(dir.path(), TargetBackend::Any, decl).unwrap();

    let report = check(&tree);
    assert_eq!(
        root_findings(&report).unregistered,
        vec![PathBuf::from("fresh/new.test")]
    );
    let (bound, _) = tree.children(ScopeId::ROOT).next().unwrap();
    assert!(report.findings(bound).unwrap().is_clean());
}

#[test]
fn test_unreachable_child_skips_descendants() {
    let dir = corpus(&["topLevel.test"]);
    let decl = ScopeDecl::new("", test_rule().recursive(true))
        .entry("topLevel.test")
        .child(
            ScopeDecl::new("gone", test_rule())
                .child(ScopeDecl::new("gone/deeper", test_rule())),
        );
    let tree = ScopeTree::build(dir.path(), TargetBackend::Any, decl).unwrap();

    let report = check(&tree);
    assert!(report.scopes[0].is_clean());
    assert!(matches!(
        report.scopes[1].outcome,
        ScopeOutcome::Unreachable(LocatorError::Missing { .. })
    ));
    assert_eq!(
        report.scopes[2].outcome,
        ScopeOutcome::Skipped {
            unreachable_ancestor: PathBuf::from("gone"),
        }
    );
    assert_eq!(report.failures().count(), 2);
}

#[test]
fn test_report_lists_every_offending_path() {
    let dir = corpus(&["a.test", "c.test"]);
    let report = check(&flat(&dir, &["a.test", "b.test"]));
    let message = report.clone().into_result().unwrap_err().to_string();
    assert!(message.contains("unregistered fixture: c.test"), "{message}");
    assert!(message.contains("stale entry: B (b.test)"), "{message}");
}

#[test]
fn test_check_is_idempotent() {
    let dir = corpus(&["a.test", "c.test", "sub/d.test"]);
    let tree = flat(&dir, &["a.test", "b.test"]);
    assert_eq!(check(&tree), check(&tree));
}

#[test]
fn test_directory_fixtures() {
    let dir = tempdir().unwrap();
    for name in ["classFlags", "clinit", "constant"] {
        fs::create_dir(dir.path().join(name)).unwrap();
    }
    let decl = ScopeDecl::new("", MatchRule::directories(r"([^\.]+)").unwrap())
        .entry("classFlags")
        .entry("clinit");
    let tree = ScopeTree::build(dir.path(), TargetBackend::Any, decl).unwrap();

    let findings = root_findings(&check(&tree));
    assert_eq!(findings.unregistered, vec![PathBuf::from("constant")]);
}

#[test]
fn test_renamed_fixture_with_same_id_is_drift() {
    let dir = corpus(&["Foo.test", "a_b.test"]);
    let tree = flat(&dir, &["foo.test", "a-b.test"]);
    assert_eq!(
        tree.root().entries()[1].id(),
        &normalize(Path::new("Foo.test"), &test_rule())
    );

    let report = check(&tree);
    assert!(!report.is_consistent());
    let findings = root_findings(&report);
    assert_eq!(
        findings.unregistered,
        vec![PathBuf::from("Foo.test"), PathBuf::from("a_b.test")]
    );
    let stale: Vec<PathBuf> = findings.stale.into_iter().map(|s| s.path).collect();
    assert_eq!(stale, vec![PathBuf::from("a-b.test"), PathBuf::from("foo.test")]);
}

#[test]
fn test_dot_prefixed_entry_matches_located_path() {
    let dir = corpus(&["a.test"]);
    let report = check(&flat(&dir, &["./a.test"]));
    assert!(report.is_consistent(), "{report}");
}

#[test]
fn test_directory_boundaries_do_not_collide() {
    let dir = corpus(&["a/bc.test", "ab/c.test"]);
    let decl = ScopeDecl::new("", test_rule().recursive(true))
        .entry("a/bc.test")
        .entry("ab/c.test");
    let tree = ScopeTree::build(dir.path(), TargetBackend::Any, decl).unwrap();

    let report = check(&tree);
    assert!(report.is_consistent(), "{report}");
}
