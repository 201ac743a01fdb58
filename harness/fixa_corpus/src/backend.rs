//! Target backends.
//!
//! The harness threads a backend through to the execution engine and never
//! interprets it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Symbolic execution target for a fixture.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetBackend {
    /// No particular backend (default).
    #[default]
    Any,
    Jvm,
    JvmIr,
    Js,
    JsIr,
    Wasm,
    Native,
}

impl TargetBackend {
    /// All backends, in declaration order.
    pub const ALL: &'static [TargetBackend] = &[
        TargetBackend::Any,
        TargetBackend::Jvm,
        TargetBackend::JvmIr,
        TargetBackend::Js,
        TargetBackend::JsIr,
        TargetBackend::Wasm,
        TargetBackend::Native,
    ];

    /// Canonical spelling, as used in manifests and on the command line.
    pub const fn as_str(self) -> &'static str {
        match self {
            TargetBackend::Any => "ANY",
            TargetBackend::Jvm => "JVM",
            TargetBackend::JvmIr => "JVM_IR",
            TargetBackend::Js => "JS",
            TargetBackend::JsIr => "JS_IR",
            TargetBackend::Wasm => "WASM",
            TargetBackend::Native => "NATIVE",
        }
    }
}

impl fmt::Display for TargetBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unrecognized backend name.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown target backend '{0}' (expected one of ANY, JVM, JVM_IR, JS, JS_IR, WASM, NATIVE)")]
pub struct UnknownBackend(pub String);

impl FromStr for TargetBackend {
    type Err = UnknownBackend;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace('-', "_");
        TargetBackend::ALL
            .iter()
            .copied()
            .find(|b| b.as_str().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| UnknownBackend(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("js_ir".parse::<TargetBackend>(), Ok(TargetBackend::JsIr));
        assert_eq!("JVM-IR".parse::<TargetBackend>(), Ok(TargetBackend::JvmIr));
        assert_eq!("any".parse::<TargetBackend>(), Ok(TargetBackend::Any));
        assert!("llvm".parse::<TargetBackend>().is_err());
    }

    #[test]
    fn display_round_trips_every_backend() {
        for &backend in TargetBackend::ALL {
            assert_eq!(backend.to_string().parse::<TargetBackend>(), Ok(backend));
        }
    }

    #[test]
    fn serde_uses_screaming_snake_case() {
        let json = serde_json::to_string(&TargetBackend::JsIr).unwrap_or_default();
        assert_eq!(json, "\"JS_IR\"");
    }
}
