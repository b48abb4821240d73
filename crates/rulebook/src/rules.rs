//! The variety/block size table.
//!
//! Both the form-options query and intake re-validation read this table, so
//! what a form offers and what intake accepts cannot drift apart. The list a
//! form shows is advisory; intake always re-checks.
use std::collections::BTreeSet;

use crate::size::SizeCode;

/// One row of the size table.
///
/// `block: None` means the rule applies to every block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeRule {
    pub variety: &'static str,
    pub block: Option<&'static str>,
    pub sizes: &'static [SizeCode],
}

/// The production table. First matching row wins.
pub const STANDARD_RULES: &[SizeRule] = &[
    SizeRule {
        variety: "freedom",
        block: None,
        sizes: &[SizeCode::Largo, SizeCode::Corto, SizeCode::Ruso],
    },
    SizeRule {
        variety: "vendela",
        block: Some("1"),
        sizes: &[SizeCode::Ruso, SizeCode::NotApplicable],
    },
];

/// Pure lookup from `(variety, block)` to the legal size codes.
///
/// Unknown combinations yield an empty set: size selection is neither
/// offered nor required for them.
///
/// ```
/// use rulebook::{SizeCode, SizeRulebook};
///
/// let rules = SizeRulebook::standard();
/// assert!(rules.is_allowed("Freedom ", "7", "LARGO"));
/// assert!(rules.allowed_sizes("momentum", "3").is_empty());
/// assert_eq!(rules.offered_sizes("vendela", "1"), &[SizeCode::Ruso, SizeCode::NotApplicable]);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SizeRulebook {
    rules: &'static [SizeRule],
}

impl SizeRulebook {
    pub fn standard() -> Self {
        Self::from_rules(STANDARD_RULES)
    }

    /// Builds a rulebook over an arbitrary static table (used by tests).
    pub fn from_rules(rules: &'static [SizeRule]) -> Self {
        Self { rules }
    }

    /// Sizes in form display order; empty when no rule matches.
    pub fn offered_sizes(&self, variety: &str, block: &str) -> &'static [SizeCode] {
        self.find(variety, block).map(|rule| rule.sizes).unwrap_or(&[])
    }

    pub fn allowed_sizes(&self, variety: &str, block: &str) -> BTreeSet<SizeCode> {
        self.offered_sizes(variety, block).iter().copied().collect()
    }

    /// `true` when `size` (any case, surrounding whitespace ignored) is legal
    /// for the variety/block. Unknown tokens are never allowed.
    pub fn is_allowed(&self, variety: &str, block: &str, size: &str) -> bool {
        match SizeCode::parse_lenient(size) {
            Some(code) => self.offered_sizes(variety, block).contains(&code),
            None => false,
        }
    }

    fn find(&self, variety: &str, block: &str) -> Option<&'static SizeRule> {
        let variety = variety.trim().to_lowercase();
        let block = block.trim();
        self.rules.iter().find(|rule| {
            rule.variety == variety && rule.block.map_or(true, |b| b == block)
        })
    }
}

impl Default for SizeRulebook {
    fn default() -> Self {
        Self::standard()
    }
}
