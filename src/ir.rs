//! Intermediate representation for rule-to-query compilation.
//!
//! This module defines the input data model (condition tree, selections,
//! field matches) and the output data model (rendered fragments, compiled
//! queries) shared across the compilation pipeline.

use serde::Serialize;

/// A raw field value as it appears in a detection rule.
///
/// `Null` (an absence test) and `Scalar("")` (an explicit empty string)
/// are distinct conditions and render to distinct fragments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldValue {
    Scalar(String),
    Null,
}

impl FieldValue {
    pub fn scalar(value: impl Into<String>) -> Self {
        FieldValue::Scalar(value.into())
    }

    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            FieldValue::Scalar(s) => Some(s),
            FieldValue::Null => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Scalar(value.to_string())
    }
}

/// Recognized value-transform directives attached to a field name.
///
/// The set is closed: an unknown tag fails resolution instead of silently
/// falling back to equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModifierTag {
    Contains,
    StartsWith,
    EndsWith,
    Re,
    Cidr,
    All,
    Base64,
}

impl ModifierTag {
    /// Parse a single tag as written in a `field|tag` spec.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "contains" => Some(ModifierTag::Contains),
            "startswith" => Some(ModifierTag::StartsWith),
            "endswith" => Some(ModifierTag::EndsWith),
            "re" => Some(ModifierTag::Re),
            "cidr" => Some(ModifierTag::Cidr),
            "all" => Some(ModifierTag::All),
            "base64" => Some(ModifierTag::Base64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModifierTag::Contains => "contains",
            ModifierTag::StartsWith => "startswith",
            ModifierTag::EndsWith => "endswith",
            ModifierTag::Re => "re",
            ModifierTag::Cidr => "cidr",
            ModifierTag::All => "all",
            ModifierTag::Base64 => "base64",
        }
    }
}

/// One field of a selection: a field name, its ordered raw values, and the
/// ordered modifier tags attached to the field.
///
/// Multiple values are OR-combined unless the `all` tag forces AND.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMatch {
    pub field: String,
    pub values: Vec<FieldValue>,
    pub modifiers: Vec<ModifierTag>,
}

impl FieldMatch {
    pub fn new(
        field: impl Into<String>,
        values: Vec<FieldValue>,
        modifiers: Vec<ModifierTag>,
    ) -> Self {
        Self {
            field: field.into(),
            values,
            modifiers,
        }
    }

    /// Shorthand for a single unmodified scalar value.
    pub fn scalar(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(field, vec![FieldValue::Scalar(value.into())], vec![])
    }

    /// Parse a `field|modifier|...` spec into a [`FieldMatch`].
    ///
    /// Examples:
    /// - `"Image"` -> field `Image`, no modifiers
    /// - `"CommandLine|contains|all"` -> field `CommandLine`, tags `[contains, all]`
    pub fn from_spec(spec: &str, values: Vec<FieldValue>) -> crate::Result<Self> {
        let mut parts = spec.split('|');
        let field = parts.next().unwrap_or_default().to_string();
        let mut modifiers = Vec::new();
        for part in parts {
            match ModifierTag::parse(part) {
                Some(tag) => modifiers.push(tag),
                None => {
                    return Err(crate::BackendError::UnsupportedModifier(format!(
                        "field '{field}': unknown modifier '{part}'"
                    )))
                }
            }
        }
        Ok(Self::new(field, values, modifiers))
    }
}

/// A named group of field matches.
///
/// Fields are implicitly AND-combined in declaration order; the order is
/// pinned by the `Vec` so compilation is deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub name: String,
    pub fields: Vec<FieldMatch>,
}

impl Selection {
    pub fn new(name: impl Into<String>, fields: Vec<FieldMatch>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }
}

/// Quantifier flavor in `N of pattern` / `all of pattern` constructs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantifierKind {
    CountOf,
    AllOf,
}

/// A parsed boolean condition over selection names.
///
/// Immutable once built; owned exclusively by the compiler invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionNode {
    /// Reference to a named selection.
    Leaf(String),
    And(Vec<ConditionNode>),
    Or(Vec<ConditionNode>),
    Not(Box<ConditionNode>),
    /// `N of pattern` or `all of pattern`. The pattern `them` covers every
    /// selection whose name does not start with `_`.
    Quantified {
        kind: QuantifierKind,
        pattern: String,
        count: Option<u32>,
    },
}

impl ConditionNode {
    pub fn leaf(name: impl Into<String>) -> Self {
        ConditionNode::Leaf(name.into())
    }

    pub fn not(child: ConditionNode) -> Self {
        ConditionNode::Not(Box::new(child))
    }
}

/// A complete detection: ordered selections plus the condition tree over
/// their names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub selections: Vec<Selection>,
    pub condition: ConditionNode,
}

impl Detection {
    pub fn new(selections: Vec<Selection>, condition: ConditionNode) -> Self {
        Self {
            selections,
            condition,
        }
    }
}

/// Precedence class of a rendered fragment, ordered from loosest to
/// tightest binding. The tree compiler parenthesizes a child only when its
/// class binds looser than the enclosing operator requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    Disjunction,
    Conjunction,
    Negation,
    Comparison,
}

/// An opaque backend-syntax string plus its precedence class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub text: String,
    pub precedence: Precedence,
}

impl Fragment {
    pub fn new(text: impl Into<String>, precedence: Precedence) -> Self {
        Self {
            text: text.into(),
            precedence,
        }
    }

    pub fn comparison(text: impl Into<String>) -> Self {
        Self::new(text, Precedence::Comparison)
    }

    /// The fragment text, parenthesized when its class binds looser than
    /// `required`.
    pub fn text_at(&self, required: Precedence) -> String {
        if self.precedence < required {
            format!("({})", self.text)
        } else {
            self.text.clone()
        }
    }
}

/// One finished Logpoint query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompiledQuery {
    pub text: String,
    /// When a rule is split across queries, describes which top-level
    /// sub-condition this query covers.
    pub covers: Option<String>,
}

impl CompiledQuery {
    pub fn whole(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            covers: None,
        }
    }
}

/// The full compilation result for one rule: the emitted queries plus the
/// observability data consumed by corpus-level coverage accounting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompiledRule {
    pub queries: Vec<CompiledQuery>,
    /// Sorted, deduplicated descriptors of the modifier strategies this
    /// rule exercised (e.g. `"equals"`, `"contains|all"`).
    pub strategies: Vec<String>,
    /// Lenient-mode warnings: unsupported field matches that were skipped.
    pub warnings: Vec<String>,
}
