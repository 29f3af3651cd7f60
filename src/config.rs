//! Configuration surface for the Logpoint query compiler.

use serde::Serialize;

/// How the compiler treats modifier combinations it cannot translate.
///
/// Neither mode ever downgrades an unsupported modifier to an equality
/// match; lenient mode drops the field match and records a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ModifierPolicy {
    /// An unsupported modifier combination fails the whole rule.
    #[default]
    Strict,
    /// Unsupported field matches are skipped with a reported warning, as
    /// long as the selection retains at least one supported field.
    Lenient,
}

/// Compiler configuration, consumed read-only by every compilation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CompilerConfig {
    /// Optional search-scope clause prepended verbatim (plus one space) to
    /// every emitted query, e.g. `norm_id=WinServer`. A disjunctive
    /// expression is parenthesized before the qualifier is applied.
    pub scope_qualifier: Option<String>,
    /// Strict/lenient handling of unsupported modifier combinations.
    pub modifier_policy: ModifierPolicy,
    /// Backend limit on query length, in bytes. A rule whose expression
    /// exceeds this is split on its top-level disjuncts into multiple
    /// queries; when no split fits, compilation fails with
    /// `UnsupportedRule`. `None` disables the limit.
    pub max_query_len: Option<usize>,
}

impl CompilerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scope_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.scope_qualifier = Some(qualifier.into());
        self
    }

    pub fn with_modifier_policy(mut self, policy: ModifierPolicy) -> Self {
        self.modifier_policy = policy;
        self
    }

    pub fn with_max_query_len(mut self, limit: usize) -> Self {
        self.max_query_len = Some(limit);
        self
    }

    pub fn is_lenient(&self) -> bool {
        self.modifier_policy == ModifierPolicy::Lenient
    }
}
