//! Fixture identifiers.
//!
//! A [`FixtureId`] is derived from a fixture path relative to its scope root:
//!
//! ```text
//! fakeJvmFieldConstant/fakeJvmFieldConstant.test  (pattern (.+)\.test)
//!     segments:  fakeJvmFieldConstant | fakeJvmFieldConstant
//!     id:        FakeJvmFieldConstant_FakeJvmFieldConstant
//! ```
//!
//! Directory components are kept as segments, the final component is reduced
//! to the rule's stem. Within a segment every run of non-alphanumeric
//! characters, `_` included, becomes a single `_`, and the first character
//! is upper-cased.

use std::fmt;
use std::path::{Component, Path};

use crate::locate::MatchRule;

/// Canonical test identifier, unique within its scope.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FixtureId(String);

impl FixtureId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FixtureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Map a fixture path, relative to its scope root, to its identifier.
///
/// Pure: the same path and rule always give the same id.
pub fn normalize(rel: &Path, rule: &MatchRule) -> FixtureId {
    let id = segments(rel, rule).join("_");
    if id.is_empty() {
        FixtureId("_".to_string())
    } else {
        FixtureId(id)
    }
}

/// Key under which two fixtures of one scope are the same test.
///
/// Each segment is case-folded with its separators removed, so `Kt-18728`
/// and `kt18728` collide. Segment boundaries are kept: `a/bc` and `ab/c`
/// do not.
pub fn collision_key(rel: &Path, rule: &MatchRule) -> String {
    segments(rel, rule)
        .iter()
        .map(|segment| {
            segment
                .chars()
                .filter(|&c| c != '_')
                .flat_map(char::to_lowercase)
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn segments(rel: &Path, rule: &MatchRule) -> Vec<String> {
    let names: Vec<&str> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(name) => name.to_str(),
            _ => None,
        })
        .collect();

    names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            if i + 1 == names.len() {
                identifier_segment(rule.stem(name))
            } else {
                identifier_segment(name)
            }
        })
        .filter(|segment| !segment.is_empty())
        .collect()
}

/// Display name for a scope rooted at `dir` (last path component only).
pub(crate) fn scope_name(dir: &Path) -> String {
    let name = dir
        .file_name()
        .and_then(|n| n.to_str())
        .map(identifier_segment)
        .unwrap_or_default();
    if name.is_empty() {
        "Root".to_string()
    } else {
        name
    }
}

/// Runs of separators, `_` included, become one `_`; leading and trailing
/// runs are dropped.
fn identifier_segment(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_separator = false;

    for c in raw.chars() {
        if c.is_alphanumeric() {
            if pending_separator && !out.is_empty() {
                out.push('_');
            }
            pending_separator = false;
            out.push(c);
        } else {
            pending_separator = true;
        }
    }

    let mut chars = out.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => out,
    }
}
