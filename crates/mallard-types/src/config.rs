//! Knobs for an inference run.
//!
//! Frontends build one of these from their own configuration (the CLI reads
//! it from JSON when the `serde` feature is on) and hand it to the checker.

/// What the solver does with a message no receiver type answers.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum UnresolvedPolicy {
    /// Stop inference with the first unresolved message.
    #[default]
    Abort,
    /// Record every unresolved message as a diagnostic and keep solving.
    Collect,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferConfig {
    pub unresolved: UnresolvedPolicy,
    /// Packages under these namespaces get no constraints of their own.
    /// Their method signatures are still declared.
    pub skipped_namespaces: Vec<String>,
    /// Nesting limit for constraint generation.
    pub max_depth: u32,
}

impl Default for InferConfig {
    fn default() -> Self {
        InferConfig {
            unresolved: UnresolvedPolicy::Abort,
            skipped_namespaces: vec!["mallard".to_string()],
            max_depth: 512,
        }
    }
}

impl InferConfig {
    pub fn collecting() -> Self {
        InferConfig {
            unresolved: UnresolvedPolicy::Collect,
            ..InferConfig::default()
        }
    }

    /// Whether the package with qualified name `package` lies in a
    /// skipped namespace.
    pub fn skips_package(&self, package: &str) -> bool {
        self.skipped_namespaces.iter().any(|ns| {
            package == ns
                || package
                    .strip_prefix(ns.as_str())
                    .is_some_and(|rest| rest.starts_with('.'))
        })
    }
}
