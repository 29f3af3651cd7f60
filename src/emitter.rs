//! Final query assembly.
//!
//! Wraps the compiled rule-scope expression with the configured scope
//! qualifier and applies the one enumerated backend limit, maximum query
//! length. A too-long rule is split on its top-level disjuncts into
//! multiple queries, each labeled with the sub-conditions it covers; a
//! rule that cannot be split fails with `UnsupportedRule` rather than
//! emitting a truncated approximation.

use crate::compiler::codegen::RootExpression;
use crate::config::CompilerConfig;
use crate::error::{BackendError, Result};
use crate::ir::{CompiledQuery, Fragment, Precedence};

pub(crate) fn emit(root: &RootExpression, config: &CompilerConfig) -> Result<Vec<CompiledQuery>> {
    let full = finalize(&root.fragment, config);

    let limit = match config.max_query_len {
        Some(limit) if full.len() > limit => limit,
        _ => return Ok(vec![CompiledQuery::whole(full)]),
    };

    if root.disjuncts.len() < 2 {
        return Err(BackendError::UnsupportedRule(format!(
            "query is {} bytes, exceeds the {limit} byte limit and has no \
             top-level disjunction to split on",
            full.len()
        )));
    }

    split_disjuncts(&root.disjuncts, limit, config)
}

/// Greedily pack top-level disjuncts into as few queries as fit the limit,
/// preserving their order.
fn split_disjuncts(
    disjuncts: &[Fragment],
    limit: usize,
    config: &CompilerConfig,
) -> Result<Vec<CompiledQuery>> {
    let total = disjuncts.len();
    let mut queries = Vec::new();
    let mut group_start = 0;

    while group_start < total {
        let mut group_end = group_start + 1;
        let mut query = finalize(&disjuncts[group_start], config);

        if query.len() > limit {
            return Err(BackendError::UnsupportedRule(format!(
                "sub-condition {} is {} bytes on its own, exceeds the {limit} byte limit",
                group_start + 1,
                query.len()
            )));
        }

        while group_end < total {
            let candidate = finalize(&join_disjuncts(&disjuncts[group_start..=group_end]), config);
            if candidate.len() > limit {
                break;
            }
            query = candidate;
            group_end += 1;
        }

        let covers = if group_end - group_start == 1 {
            format!("sub-condition {} of {total}", group_start + 1)
        } else {
            format!(
                "sub-conditions {}-{} of {total}",
                group_start + 1,
                group_end
            )
        };
        queries.push(CompiledQuery {
            text: query,
            covers: Some(covers),
        });
        group_start = group_end;
    }

    Ok(queries)
}

fn join_disjuncts(fragments: &[Fragment]) -> Fragment {
    if fragments.len() == 1 {
        return fragments[0].clone();
    }
    let text = fragments
        .iter()
        .map(|f| f.text_at(Precedence::Disjunction))
        .collect::<Vec<_>>()
        .join(" OR ");
    Fragment::new(text, Precedence::Disjunction)
}

/// Prefix the expression with the scope qualifier, parenthesizing a
/// disjunctive expression first so the qualifier scopes the whole rule.
fn finalize(fragment: &Fragment, config: &CompilerConfig) -> String {
    match &config.scope_qualifier {
        Some(qualifier) => {
            let expr = fragment.text_at(Precedence::Conjunction);
            format!("{qualifier} {expr}")
        }
        None => fragment.text.clone(),
    }
}
