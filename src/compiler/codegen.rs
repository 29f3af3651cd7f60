//! Query expression generation from condition trees.
//!
//! Quantifiers (`1 of sel*`, `all of them`, `N of pattern`) are first
//! expanded into plain And/Or nodes over the matched selection names, in
//! declaration order; the expanded tree is then rendered bottom-up into
//! precedence-tagged fragments with minimal parenthesization.

use std::collections::BTreeSet;

use crate::compiler::{modifiers, render};
use crate::config::CompilerConfig;
use crate::error::{BackendError, Result};
use crate::ir::{ConditionNode, Fragment, Precedence, QuantifierKind, Selection};

/// Upper bound on `N of M` combination expansion. Beyond this the rule is
/// rejected as unsupported rather than emitting a combinatorial query.
const MAX_QUANTIFIER_EXPANSION: usize = 64;

/// A compiled rule-scope expression. `disjuncts` carries the top-level OR
/// branches (when the root is a disjunction) so the emitter can split the
/// rule across multiple queries under backend length limits.
#[derive(Debug, Clone)]
pub(crate) struct RootExpression {
    pub fragment: Fragment,
    pub disjuncts: Vec<Fragment>,
}

/// Walks one rule's condition tree, resolving selections and collecting
/// observability data as it goes.
pub(crate) struct TreeCompiler<'a> {
    selections: &'a [Selection],
    config: &'a CompilerConfig,
    pub coverage: BTreeSet<String>,
    pub warnings: Vec<String>,
}

impl<'a> TreeCompiler<'a> {
    pub(crate) fn new(selections: &'a [Selection], config: &'a CompilerConfig) -> Self {
        Self {
            selections,
            config,
            coverage: BTreeSet::new(),
            warnings: Vec::new(),
        }
    }

    /// Compile the rule-scope condition into a [`RootExpression`].
    pub(crate) fn compile_root(&mut self, node: &ConditionNode) -> Result<RootExpression> {
        let expanded = self.expand_quantifiers(node)?;

        if let ConditionNode::Or(children) = &expanded {
            let disjuncts = children
                .iter()
                .map(|child| self.compile_node(child))
                .collect::<Result<Vec<_>>>()?;
            let fragment = join_fragments(&disjuncts, BoolOp::Or);
            return Ok(RootExpression {
                fragment,
                disjuncts,
            });
        }

        Ok(RootExpression {
            fragment: self.compile_node(&expanded)?,
            disjuncts: Vec::new(),
        })
    }

    fn compile_node(&mut self, node: &ConditionNode) -> Result<Fragment> {
        match node {
            ConditionNode::Leaf(name) => self.compile_leaf(name),
            ConditionNode::And(children) => {
                let fragments = children
                    .iter()
                    .map(|child| self.compile_node(child))
                    .collect::<Result<Vec<_>>>()?;
                Ok(join_fragments(&fragments, BoolOp::And))
            }
            ConditionNode::Or(children) => {
                let fragments = children
                    .iter()
                    .map(|child| self.compile_node(child))
                    .collect::<Result<Vec<_>>>()?;
                Ok(join_fragments(&fragments, BoolOp::Or))
            }
            ConditionNode::Not(child) => {
                let fragment = self.compile_node(child)?;
                // A compound child is always parenthesized before negation.
                let text = if fragment.precedence == Precedence::Comparison {
                    format!("NOT {}", fragment.text)
                } else {
                    format!("NOT ({})", fragment.text)
                };
                Ok(Fragment::new(text, Precedence::Negation))
            }
            ConditionNode::Quantified { .. } => {
                let expanded = self.expand_quantifiers(node)?;
                self.compile_node(&expanded)
            }
        }
    }

    /// Resolve one selection reference into a fragment: each field renders
    /// per its strategy and the field fragments are AND-combined in
    /// declaration order.
    fn compile_leaf(&mut self, name: &str) -> Result<Fragment> {
        let selection = self
            .selections
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| BackendError::UnresolvedSelection(name.to_string()))?;

        if selection.fields.is_empty() {
            return Err(BackendError::InvalidValue(format!(
                "selection '{name}' has no field matches"
            )));
        }

        let mut fragments = Vec::with_capacity(selection.fields.len());
        for field_match in &selection.fields {
            let strategy = match modifiers::resolve(&field_match.field, &field_match.modifiers) {
                Ok(strategy) => strategy,
                Err(BackendError::UnsupportedModifier(msg)) if self.config.is_lenient() => {
                    self.warnings
                        .push(format!("selection '{name}': {msg} (skipped)"));
                    continue;
                }
                Err(e) => return Err(e),
            };
            self.coverage.insert(strategy.descriptor());
            fragments.push(render::render_field(
                &strategy,
                &field_match.field,
                &field_match.values,
            )?);
        }

        if fragments.is_empty() {
            return Err(BackendError::UnsupportedModifier(format!(
                "selection '{name}' has no supported field matches"
            )));
        }

        Ok(join_fragments(&fragments, BoolOp::And))
    }

    /// Rewrite quantifier nodes into plain And/Or nodes over leaf
    /// references, recursing through the whole tree.
    fn expand_quantifiers(&self, node: &ConditionNode) -> Result<ConditionNode> {
        match node {
            ConditionNode::Leaf(_) => Ok(node.clone()),
            ConditionNode::And(children) => Ok(ConditionNode::And(
                children
                    .iter()
                    .map(|c| self.expand_quantifiers(c))
                    .collect::<Result<_>>()?,
            )),
            ConditionNode::Or(children) => Ok(ConditionNode::Or(
                children
                    .iter()
                    .map(|c| self.expand_quantifiers(c))
                    .collect::<Result<_>>()?,
            )),
            ConditionNode::Not(child) => {
                Ok(ConditionNode::not(self.expand_quantifiers(child)?))
            }
            ConditionNode::Quantified {
                kind,
                pattern,
                count,
            } => self.expand_quantifier(*kind, pattern, *count),
        }
    }

    fn expand_quantifier(
        &self,
        kind: QuantifierKind,
        pattern: &str,
        count: Option<u32>,
    ) -> Result<ConditionNode> {
        let matched = self.match_selection_names(pattern);
        if matched.is_empty() {
            return Err(BackendError::NoMatchingSelections(pattern.to_string()));
        }

        let leaves: Vec<ConditionNode> = matched
            .iter()
            .map(|&name| ConditionNode::leaf(name))
            .collect();

        match kind {
            QuantifierKind::AllOf => Ok(group(leaves, BoolOp::And)),
            QuantifierKind::CountOf => {
                let n = count.unwrap_or(1) as usize;
                self.expand_count_of(pattern, leaves, n)
            }
        }
    }

    fn expand_count_of(
        &self,
        pattern: &str,
        leaves: Vec<ConditionNode>,
        n: usize,
    ) -> Result<ConditionNode> {
        let m = leaves.len();
        if n == 0 {
            return Err(BackendError::UnsupportedRule(format!(
                "'0 of {pattern}' matches nothing"
            )));
        }
        if n == 1 {
            return Ok(group(leaves, BoolOp::Or));
        }
        if n > m {
            return Err(BackendError::UnsupportedRule(format!(
                "'{n} of {pattern}' requires {n} selections but only {m} match"
            )));
        }
        if n == m {
            return Ok(group(leaves, BoolOp::And));
        }

        // 1 < n < m: disjunction of every n-sized conjunction.
        if binomial(m, n) > MAX_QUANTIFIER_EXPANSION {
            return Err(BackendError::UnsupportedRule(format!(
                "'{n} of {pattern}' expands past {MAX_QUANTIFIER_EXPANSION} combinations"
            )));
        }

        let combos = combinations(m, n)
            .into_iter()
            .map(|indices| {
                ConditionNode::And(indices.iter().map(|&i| leaves[i].clone()).collect())
            })
            .collect();
        Ok(ConditionNode::Or(combos))
    }

    /// Selection names matching a quantifier target, in declaration order.
    /// The `them` target covers every selection whose name does not start
    /// with `_` (internal selections stay out of `of them`).
    fn match_selection_names(&self, pattern: &str) -> Vec<&str> {
        self.selections
            .iter()
            .map(|s| s.name.as_str())
            .filter(|name| {
                if pattern == "them" {
                    !name.starts_with('_')
                } else {
                    glob_match(pattern, name)
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BoolOp {
    And,
    Or,
}

fn join_fragments(fragments: &[Fragment], op: BoolOp) -> Fragment {
    if fragments.len() == 1 {
        return fragments[0].clone();
    }
    let (separator, precedence) = match op {
        BoolOp::And => (" AND ", Precedence::Conjunction),
        BoolOp::Or => (" OR ", Precedence::Disjunction),
    };
    let text = fragments
        .iter()
        .map(|f| f.text_at(precedence))
        .collect::<Vec<_>>()
        .join(separator);
    Fragment::new(text, precedence)
}

fn group(mut children: Vec<ConditionNode>, op: BoolOp) -> ConditionNode {
    if children.len() == 1 {
        children.pop().unwrap()
    } else {
        match op {
            BoolOp::And => ConditionNode::And(children),
            BoolOp::Or => ConditionNode::Or(children),
        }
    }
}

/// Match a selection-name glob where `*` spans any run of characters.
fn glob_match(pattern: &str, name: &str) -> bool {
    if !pattern.contains('*') {
        return pattern == name;
    }

    let segments: Vec<&str> = pattern.split('*').collect();
    let last = segments.len() - 1;
    let mut rest = name;

    for (i, segment) in segments.iter().enumerate() {
        if i == 0 {
            match rest.strip_prefix(segment) {
                Some(tail) => rest = tail,
                None => return false,
            }
        } else if i == last {
            return rest.ends_with(segment);
        } else if !segment.is_empty() {
            match rest.find(segment) {
                Some(idx) => rest = &rest[idx + segment.len()..],
                None => return false,
            }
        }
    }
    true
}

fn binomial(m: usize, n: usize) -> usize {
    let n = n.min(m - n);
    let mut result: usize = 1;
    for i in 0..n {
        result = result.saturating_mul(m - i) / (i + 1);
        if result > MAX_QUANTIFIER_EXPANSION {
            return result;
        }
    }
    result
}

/// All n-sized index combinations of `0..m`, in lexicographic order.
fn combinations(m: usize, n: usize) -> Vec<Vec<usize>> {
    let mut out = Vec::new();
    let mut current = Vec::with_capacity(n);
    combine(0, m, n, &mut current, &mut out);
    out
}

fn combine(start: usize, m: usize, n: usize, current: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
    if current.len() == n {
        out.push(current.clone());
        return;
    }
    for i in start..m {
        current.push(i);
        combine(i + 1, m, n, current, out);
        current.pop();
    }
}
