//! Value rendering into Logpoint comparison fragments.
//!
//! This module owns the backend quoting and escaping contract:
//!
//! - A token (field name or value) is emitted bare when it is non-empty and
//!   consists only of ASCII alphanumerics and `_ . - : * ?`. Any other
//!   token is double-quoted with `\` escaped as `\\` and `"` as `\"`.
//! - `*` and `?` are wildcards and pass through unescaped in both forms.
//! - Regex values render as `field=/pattern/`; the single delimiter escape
//!   is `/` -> `\/`, the pattern is otherwise passed through verbatim.
//! - CIDR values render as `field IN "network/prefix"`.
//! - `field: null` renders the absence test `-field=*`; an explicit empty
//!   string renders `field=""`.
//!
//! Multiple plain-equality values without wildcards collapse into the
//! Logpoint list form `field IN ["v1", "v2"]`; every other multi-value
//! field renders one fragment per value, conjoined under `all` and
//! disjoined otherwise.

use std::net::IpAddr;
use std::str::FromStr;

use base64::{engine::general_purpose, Engine as _};
use regex::Regex;

use crate::compiler::modifiers::{BaseMatch, MatchStrategy};
use crate::error::{BackendError, Result};
use crate::ir::{FieldValue, Fragment, Precedence};

/// Render one field match as a single fragment.
///
/// Rendering never silently drops a value: an empty value list or a value
/// malformed for the strategy fails with `InvalidValue`.
pub(crate) fn render_field(
    strategy: &MatchStrategy,
    field: &str,
    values: &[FieldValue],
) -> Result<Fragment> {
    if values.is_empty() {
        return Err(BackendError::InvalidValue(format!(
            "field '{field}': empty value list"
        )));
    }

    let field_token = render_token(field);

    if let Some(fragment) = try_render_in_list(strategy, field, &field_token, values)? {
        return Ok(fragment);
    }

    let mut fragments = Vec::with_capacity(values.len());
    for value in values {
        fragments.push(render_value(strategy, field, &field_token, value)?);
    }

    Ok(join_values(fragments, strategy.match_all))
}

fn render_value(
    strategy: &MatchStrategy,
    field: &str,
    field_token: &str,
    value: &FieldValue,
) -> Result<Fragment> {
    let scalar = match value {
        FieldValue::Scalar(s) => s.as_str(),
        FieldValue::Null => {
            if strategy.base == BaseMatch::Equals && !strategy.encode_base64 {
                return Ok(Fragment::comparison(format!("-{field_token}=*")));
            }
            return Err(BackendError::InvalidValue(format!(
                "field '{field}': null value is only valid for plain equality"
            )));
        }
    };

    match strategy.base {
        BaseMatch::Cidr => render_cidr(field, field_token, scalar),
        BaseMatch::Regex => render_regex(field, field_token, scalar),
        base => {
            let encoded;
            let scalar = if strategy.encode_base64 {
                encoded = general_purpose::STANDARD.encode(scalar);
                encoded.as_str()
            } else {
                scalar
            };
            let anchored = match base {
                BaseMatch::Equals => scalar.to_string(),
                BaseMatch::Contains => format!("*{scalar}*"),
                BaseMatch::StartsWith => format!("{scalar}*"),
                // End anchor only; the start stays open.
                BaseMatch::EndsWith => format!("*{scalar}"),
                BaseMatch::Regex | BaseMatch::Cidr => unreachable!(),
            };
            Ok(Fragment::comparison(format!(
                "{field_token}={}",
                render_token(&anchored)
            )))
        }
    }
}

fn render_cidr(field: &str, field_token: &str, literal: &str) -> Result<Fragment> {
    validate_cidr(field, literal)?;
    Ok(Fragment::comparison(format!(
        "{field_token} IN {}",
        quote(literal)
    )))
}

fn render_regex(field: &str, field_token: &str, pattern: &str) -> Result<Fragment> {
    Regex::new(pattern).map_err(|e| {
        BackendError::InvalidValue(format!("field '{field}': invalid regex: {e}"))
    })?;
    let escaped = pattern.replace('/', "\\/");
    Ok(Fragment::comparison(format!("{field_token}=/{escaped}/")))
}

/// `field IN ["a", "b"]` applies only to plain equality over two or more
/// wildcard-free scalar values without `all`.
fn try_render_in_list(
    strategy: &MatchStrategy,
    _field: &str,
    field_token: &str,
    values: &[FieldValue],
) -> Result<Option<Fragment>> {
    if strategy.base != BaseMatch::Equals || strategy.match_all || values.len() < 2 {
        return Ok(None);
    }

    let mut rendered = Vec::with_capacity(values.len());
    for value in values {
        let scalar = match value.as_scalar() {
            Some(s) => s,
            None => return Ok(None),
        };
        let scalar = if strategy.encode_base64 {
            general_purpose::STANDARD.encode(scalar)
        } else {
            scalar.to_string()
        };
        if scalar.contains('*') || scalar.contains('?') {
            return Ok(None);
        }
        rendered.push(quote(&scalar));
    }

    Ok(Some(Fragment::comparison(format!(
        "{field_token} IN [{}]",
        rendered.join(", ")
    ))))
}

fn join_values(fragments: Vec<Fragment>, conjoin: bool) -> Fragment {
    if fragments.len() == 1 {
        return fragments.into_iter().next().unwrap();
    }
    let (separator, precedence) = if conjoin {
        (" AND ", Precedence::Conjunction)
    } else {
        (" OR ", Precedence::Disjunction)
    };
    let text = fragments
        .iter()
        .map(|f| f.text_at(precedence))
        .collect::<Vec<_>>()
        .join(separator);
    Fragment::new(text, precedence)
}

fn validate_cidr(field: &str, literal: &str) -> Result<()> {
    let invalid =
        || BackendError::InvalidValue(format!("field '{field}': bad CIDR literal: {literal}"));

    let (addr, prefix) = literal.split_once('/').ok_or_else(invalid)?;
    let addr = IpAddr::from_str(addr).map_err(|_| invalid())?;
    let prefix: u8 = prefix.parse().map_err(|_| invalid())?;

    let max = match addr {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    };
    if prefix > max {
        return Err(invalid());
    }
    Ok(())
}

/// Emit a token bare when it needs no quoting, quoted otherwise.
pub(crate) fn render_token(raw: &str) -> String {
    if is_bare(raw) {
        raw.to_string()
    } else {
        quote(raw)
    }
}

fn is_bare(raw: &str) -> bool {
    !raw.is_empty()
        && raw.chars().all(|c| {
            c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-' | ':' | '*' | '?')
        })
}

fn quote(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 2);
    out.push('"');
    for c in raw.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}
