use super::*;
use pretty_assertions::assert_eq;
use tempfile::tempdir;

const CALLABLE_REFERENCE: &str = r#"{
    "base": "testData",
    "scope": {
        "root": "callableReference",
        "pattern": "(.+)\\.kt",
        "recursive": true,
        "entries": ["topLevel.kt", { "path": "classLevel.kt", "label": "class" }],
        "children": [
            {
                "root": "callableReference/bound",
                "pattern": "(.+)\\.kt",
                "backend": "JS_IR",
                "entries": ["simple.kt"]
            }
        ]
    }
}"#;

#[test]
fn test_parse_and_build() {
    let manifest: Manifest = CALLABLE_REFERENCE.parse().unwrap();
    assert_eq!(manifest.base, PathBuf::from("testData"));
    assert_eq!(manifest.default_backend, TargetBackend::Any);
    assert_eq!(manifest.scope.mode, LocateMode::Files);

    let tree = manifest.to_tree(None).unwrap();
    let dispatched: Vec<(String, TargetBackend)> = tree
        .entries()
        .map(|e| (tree.entry_name(e), e.backend()))
        .collect();
    assert_eq!(
        dispatched,
        vec![
            ("CallableReference::class".to_string(), TargetBackend::Any),
            ("CallableReference::TopLevel".to_string(), TargetBackend::Any),
            ("CallableReference::Bound::Simple".to_string(), TargetBackend::JsIr),
        ]
    );
}

#[test]
fn test_backend_override_replaces_default_only() {
    let manifest: Manifest = CALLABLE_REFERENCE.parse().unwrap();
    let tree = manifest.to_tree(Some(TargetBackend::Jvm)).unwrap();
    let backends: Vec<TargetBackend> = tree.entries().map(|e| e.backend()).collect();
    assert_eq!(
        backends,
        vec![TargetBackend::Jvm, TargetBackend::Jvm, TargetBackend::JsIr]
    );
}

#[test]
fn test_unknown_fields_are_rejected() {
    let text = r#"{ "scope": { "root": "a", "pattern": ".*", "recursve": true } }"#;
    assert!(matches!(
        text.parse::<Manifest>(),
        Err(ManifestError::Json(_))
    ));
}

#[test]
fn test_defaults() {
    let manifest: Manifest = r#"{ "scope": { "root": "a", "pattern": "(.+)\\.test" } }"#
        .parse()
        .unwrap();
    assert_eq!(manifest.base, PathBuf::from("."));
    let rule = manifest.scope.rule().unwrap();
    assert!(!rule.is_recursive());
    assert_eq!(rule.exclude(), None);
    assert_eq!(manifest.to_tree(None).unwrap().entry_count(), 0);
}

#[test]
fn test_registry_defects_surface_at_build() {
    let bad_pattern: Manifest = r#"{ "scope": { "root": "a", "pattern": "(" } }"#
        .parse()
        .unwrap();
    assert!(matches!(
        bad_pattern.to_tree(None),
        Err(RegistryDefect::InvalidPattern { .. })
    ));

    let collision: Manifest = r#"{ "scope": {
        "root": "multiFile",
        "pattern": "(.+)\\.test",
        "entries": ["Kt-18728.test", "kt18728.test"]
    } }"#
        .parse()
        .unwrap();
    assert!(matches!(
        collision.to_tree(None),
        Err(RegistryDefect::DuplicateId { .. })
    ));
}

#[test]
fn test_from_path_resolves_base_against_manifest_dir() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("fixtures.json");
    fs::write(&path, CALLABLE_REFERENCE).unwrap();

    let manifest = Manifest::from_path(&path).unwrap();
    assert_eq!(manifest.base, dir.path().join("testData"));

    let tree = Manifest::load(&path, None).unwrap();
    assert_eq!(
        tree.scope_dir(crate::scope::ScopeId::ROOT),
        dir.path().join("testData/callableReference")
    );
}

#[test]
fn test_from_path_keeps_absolute_base() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("fixtures.json");
    let manifest = Manifest {
        base: dir.path().join("elsewhere"),
        default_backend: TargetBackend::Native,
        scope: ScopeManifest::new("a", &MatchRule::files(r"(.+)\.test").unwrap()),
    };
    fs::write(&path, manifest.to_json().unwrap()).unwrap();
    assert_eq!(Manifest::from_path(&path).unwrap(), manifest);
}

#[test]
fn test_missing_file() {
    let dir = tempdir().unwrap();
    assert!(matches!(
        Manifest::from_path(&dir.path().join("absent.json")),
        Err(ManifestError::Io { .. })
    ));
}

#[test]
fn test_scope_manifest_mirrors_rule() {
    let rule = MatchRule::directories(r"([^\.]+)")
        .unwrap()
        .recursive(true)
        .with_exclude("build")
        .unwrap();
    let scope = ScopeManifest::new("codegen/box", &rule);
    assert_eq!(scope.mode, LocateMode::Directories);
    assert!(scope.recursive);
    assert_eq!(scope.exclude.as_deref(), Some("build"));

    let json = serde_json::to_string(&scope).unwrap();
    assert!(json.contains(r#""mode":"directories""#), "{json}");
    assert!(!json.contains("children"), "{json}");
}
