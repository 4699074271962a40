// SPDX-License-Identifier: MIT OR Apache-2.0
//! Level-spec normalization and the parsed rule table.
//!
//! A raw level spec looks like `"0.3,1.2 4.verbose"` or `all`. It is
//! normalized once into the colon-bounded form `:0.3:1.2:4.verbose:` and then
//! parsed into a [`LevelRules`] table keyed by major level, so evaluating a
//! `(major, minor)` pair never rescans the string.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Sentinel spec that enables every level.
pub const ALL_LEVELS: &str = "all";

// ---------------------------------------------------------------------------
// CompareMode
// ---------------------------------------------------------------------------

/// How a requested numeric minor level is compared with the configured one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareMode {
    /// Enabled when the requested minor is less than or equal to the threshold.
    #[default]
    Le,
    /// Enabled when the requested minor is greater than or equal to the threshold.
    Ge,
}

impl fmt::Display for CompareMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Le => "le",
            Self::Ge => "ge",
        })
    }
}

impl FromStr for CompareMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "le" => Ok(Self::Le),
            "ge" => Ok(Self::Ge),
            other => Err(format!("unknown compare mode: {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// MinorLevel
// ---------------------------------------------------------------------------

/// The minor half of a level pair as supplied by a caller.
///
/// Callers pass either an integer or a string tag. A tag made only of ASCII
/// digits is treated as the number it spells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MinorLevel {
    /// Numeric granularity.
    Number(u32),
    /// Literal tag, matched exactly against literal rules.
    Tag(String),
}

impl MinorLevel {
    /// Numeric value of this minor level, if it has one.
    #[must_use]
    pub fn as_number(&self) -> Option<u32> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Tag(t) if is_decimal(t) => t.parse().ok(),
            Self::Tag(_) => None,
        }
    }
}

impl From<u32> for MinorLevel {
    fn from(n: u32) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for MinorLevel {
    fn from(s: &str) -> Self {
        Self::Tag(s.to_string())
    }
}

impl From<String> for MinorLevel {
    fn from(s: String) -> Self {
        Self::Tag(s)
    }
}

impl fmt::Display for MinorLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Tag(t) => f.write_str(t),
        }
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// The configured minor field for one major level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MinorRule {
    /// Numeric threshold compared with [`CompareMode`].
    Threshold(u32),
    /// Literal tag that must be requested verbatim.
    Literal(String),
}

/// Parsed form of a normalized level spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LevelRules {
    /// The `all` sentinel: every pair is enabled.
    All,
    /// Per-major rules. Tokens without a `major.minor` shape are ignored.
    ByMajor(BTreeMap<u32, MinorRule>),
}

impl LevelRules {
    /// Parse a normalized (colon-bounded) level spec.
    ///
    /// When the same major appears more than once the last token wins.
    #[must_use]
    pub fn parse(normalized: &str) -> Self {
        let tokens: Vec<&str> = normalized.split(':').filter(|t| !t.is_empty()).collect();
        if tokens == [ALL_LEVELS] {
            return Self::All;
        }

        let mut rules = BTreeMap::new();
        for token in tokens {
            let Some((major, minor)) = token.split_once('.') else {
                continue;
            };
            let Some(major) = parse_canonical_u32(major) else {
                continue;
            };
            let threshold = is_decimal(minor).then(|| minor.parse::<u32>().ok()).flatten();
            let rule = match threshold {
                Some(t) => MinorRule::Threshold(t),
                None => MinorRule::Literal(minor.to_string()),
            };
            rules.insert(major, rule);
        }
        Self::ByMajor(rules)
    }

    /// Whether `(major, minor)` is enabled under these rules.
    ///
    /// A numeric request against a literal rule is simply not enabled.
    #[must_use]
    pub fn is_enabled(&self, compare: CompareMode, major: u32, minor: &MinorLevel) -> bool {
        let rules = match self {
            Self::All => return true,
            Self::ByMajor(rules) => rules,
        };
        let Some(rule) = rules.get(&major) else {
            return false;
        };

        match (minor.as_number(), rule) {
            (Some(requested), MinorRule::Threshold(threshold)) => match compare {
                CompareMode::Le => requested <= *threshold,
                CompareMode::Ge => requested >= *threshold,
            },
            (Some(_), MinorRule::Literal(_)) => false,
            (None, MinorRule::Literal(literal)) => matches!(minor, MinorLevel::Tag(t) if t == literal),
            (None, MinorRule::Threshold(_)) => false,
        }
    }

    /// Number of majors with a rule (0 for [`LevelRules::All`]).
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::All => 0,
            Self::ByMajor(rules) => rules.len(),
        }
    }

    /// Whether no rule is configured and the spec is not `all`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::ByMajor(rules) if rules.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Normalize a raw level spec.
///
/// Quote characters are dropped, each run of `,`, `|`, space or `:`
/// separators becomes one `:`, and the result is bounded by colons on both
/// ends.
///
/// ```
/// assert_eq!(srg_debug::normalize_levels("1,2 3"), ":1:2:3:");
/// assert_eq!(srg_debug::normalize_levels("1, 2||3"), ":1:2:3:");
/// assert_eq!(srg_debug::normalize_levels("\"3.5\""), ":3.5:");
/// ```
#[must_use]
pub fn normalize_levels(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 2);
    out.push(':');
    for ch in raw.chars() {
        match ch {
            '"' => {}
            ',' | '|' | ' ' | ':' => {
                if !out.ends_with(':') {
                    out.push(':');
                }
            }
            c => out.push(c),
        }
    }
    if !out.ends_with(':') || out.len() == 1 {
        out.push(':');
    }
    out
}

fn is_decimal(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Parse `s` only when it is the canonical decimal spelling of a `u32`,
/// so `03` never matches major `3`.
fn parse_canonical_u32(s: &str) -> Option<u32> {
    if !is_decimal(s) {
        return None;
    }
    let n: u32 = s.parse().ok()?;
    (n.to_string() == s).then_some(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(raw: &str) -> LevelRules {
        LevelRules::parse(&normalize_levels(raw))
    }

    #[test]
    fn normalizes_mixed_separators() {
        assert_eq!(normalize_levels("1,2 3"), ":1:2:3:");
        assert_eq!(normalize_levels("1|2"), ":1:2:");
    }

    #[test]
    fn normalization_collapses_separator_runs() {
        assert_eq!(normalize_levels("0.1, 2.3"), ":0.1:2.3:");
    }

    #[test]
    fn normalization_keeps_existing_bounds() {
        assert_eq!(normalize_levels(":3.5:"), ":3.5:");
        assert_eq!(normalize_levels(""), "::");
    }

    #[test]
    fn all_sentinel_survives_quotes() {
        assert_eq!(rules("\"all\""), LevelRules::All);
    }

    #[test]
    fn threshold_le_and_ge() {
        let r = rules("3.5");
        assert!(r.is_enabled(CompareMode::Le, 3, &5.into()));
        assert!(r.is_enabled(CompareMode::Le, 3, &1.into()));
        assert!(!r.is_enabled(CompareMode::Le, 3, &6.into()));
        assert!(r.is_enabled(CompareMode::Ge, 3, &6.into()));
        assert!(!r.is_enabled(CompareMode::Ge, 3, &4.into()));
    }

    #[test]
    fn major_must_match_exactly() {
        let r = rules("13.5");
        assert!(!r.is_enabled(CompareMode::Le, 3, &1.into()));
        assert!(r.is_enabled(CompareMode::Le, 13, &1.into()));
        assert!(!rules("03.5").is_enabled(CompareMode::Le, 3, &1.into()));
    }

    #[test]
    fn literal_minor_requires_exact_tag() {
        let r = rules("4.net");
        assert!(r.is_enabled(CompareMode::Le, 4, &"net".into()));
        assert!(!r.is_enabled(CompareMode::Le, 4, &"disk".into()));
        assert!(!r.is_enabled(CompareMode::Le, 4, &2.into()));
    }

    #[test]
    fn digit_tag_is_coerced_to_number() {
        let r = rules("2.4");
        assert!(r.is_enabled(CompareMode::Le, 2, &"3".into()));
        assert!(!r.is_enabled(CompareMode::Le, 2, &"abc".into()));
    }

    #[test]
    fn last_token_for_a_major_wins() {
        let r = rules("1.1:1.9");
        assert!(r.is_enabled(CompareMode::Le, 1, &9.into()));
    }

    #[test]
    fn bare_numbers_carry_no_rules() {
        let r = rules("1,2 3");
        assert!(r.is_empty());
        assert!(!r.is_enabled(CompareMode::Le, 1, &0.into()));
    }

    #[test]
    fn empty_minor_field_is_a_literal() {
        let r = rules("5.");
        assert!(!r.is_enabled(CompareMode::Le, 5, &0.into()));
        assert!(r.is_enabled(CompareMode::Le, 5, &"".into()));
    }

    #[test]
    fn compare_mode_parses() {
        assert_eq!("ge".parse::<CompareMode>().unwrap(), CompareMode::Ge);
        assert!("gt".parse::<CompareMode>().is_err());
    }
}
