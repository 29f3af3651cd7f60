//! Modifier resolution for field matches.
//!
//! Maps a field name plus its ordered modifier tags to a single
//! value-transformation strategy. The supported combinations form a closed
//! set; anything outside it fails with `UnsupportedModifier` instead of
//! silently falling back to equality.

use crate::error::{BackendError, Result};
use crate::ir::ModifierTag;

/// The base match operation selected by the modifier tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BaseMatch {
    /// Exact match, with `*`/`?` in the raw value acting as wildcards.
    Equals,
    Contains,
    StartsWith,
    EndsWith,
    Regex,
    Cidr,
}

impl BaseMatch {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            BaseMatch::Equals => "equals",
            BaseMatch::Contains => "contains",
            BaseMatch::StartsWith => "startswith",
            BaseMatch::EndsWith => "endswith",
            BaseMatch::Regex => "re",
            BaseMatch::Cidr => "cidr",
        }
    }
}

/// A resolved value-transformation strategy for one field match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MatchStrategy {
    pub base: BaseMatch,
    /// Force conjunction across the field's value list. A no-op for a
    /// single value.
    pub match_all: bool,
    /// Base64-encode each raw value before the base match applies.
    pub encode_base64: bool,
}

impl MatchStrategy {
    pub(crate) fn equals() -> Self {
        Self {
            base: BaseMatch::Equals,
            match_all: false,
            encode_base64: false,
        }
    }

    /// Canonical descriptor for coverage reporting, e.g. `"equals"`,
    /// `"contains|all"`, `"base64|contains"`.
    pub(crate) fn descriptor(&self) -> String {
        let mut parts = Vec::new();
        if self.encode_base64 {
            parts.push("base64");
        }
        if !(self.encode_base64 && self.base == BaseMatch::Equals) {
            parts.push(self.base.as_str());
        }
        if self.match_all {
            parts.push("all");
        }
        parts.join("|")
    }
}

/// Resolve an ordered modifier tag sequence into a [`MatchStrategy`].
///
/// Pure lookup with no side effects. `field` only appears in error
/// messages.
pub(crate) fn resolve(field: &str, tags: &[ModifierTag]) -> Result<MatchStrategy> {
    let mut strategy = MatchStrategy::equals();
    let mut base_tag: Option<ModifierTag> = None;

    for &tag in tags {
        match tag {
            ModifierTag::All => strategy.match_all = true,
            ModifierTag::Base64 => strategy.encode_base64 = true,
            _ => {
                if let Some(previous) = base_tag {
                    return Err(conflict(field, previous, tag));
                }
                base_tag = Some(tag);
                strategy.base = match tag {
                    ModifierTag::Contains => BaseMatch::Contains,
                    ModifierTag::StartsWith => BaseMatch::StartsWith,
                    ModifierTag::EndsWith => BaseMatch::EndsWith,
                    ModifierTag::Re => BaseMatch::Regex,
                    ModifierTag::Cidr => BaseMatch::Cidr,
                    ModifierTag::All | ModifierTag::Base64 => unreachable!(),
                };
            }
        }
    }

    if strategy.encode_base64
        && matches!(strategy.base, BaseMatch::Regex | BaseMatch::Cidr)
    {
        return Err(BackendError::UnsupportedModifier(format!(
            "field '{field}': base64 cannot combine with {}",
            strategy.base.as_str()
        )));
    }

    Ok(strategy)
}

fn conflict(field: &str, previous: ModifierTag, tag: ModifierTag) -> BackendError {
    BackendError::UnsupportedModifier(format!(
        "field '{field}': {}|{} has no defined translation",
        previous.as_str(),
        tag.as_str()
    ))
}
