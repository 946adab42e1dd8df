use serde::{Deserialize, Serialize};
use std::fmt;

/// How the non-ideograph part of a name is cleaned up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyPolicy {
    /// Keep letters and digits only.
    #[default]
    Compact,
    /// Keep letters and digits, collapse everything else to single spaces.
    Spaced,
}

impl KeyPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" | "strip" => Some(Self::Compact),
            "spaced" | "collapse" => Some(Self::Spaced),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Spaced => "spaced",
        }
    }
}

/// Comparison form of a display name.
///
/// Ideographs always lead the key, followed by the cleaned remainder, so the
/// ideograph substring can be recovered without re-partitioning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NormalizedKey {
    value: String,
    ideograph_end: usize,
}

impl NormalizedKey {
    fn from_parts(ideographs: String, remainder: &str, policy: KeyPolicy) -> Self {
        let ideograph_end = ideographs.len();
        let mut value = ideographs;
        if policy == KeyPolicy::Spaced && !value.is_empty() && !remainder.is_empty() {
            value.push(' ');
        }
        value.push_str(remainder);
        Self {
            value,
            ideograph_end,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn has_cjk(&self) -> bool {
        self.ideograph_end > 0
    }

    /// The CJK ideographs of the name, in their original order.
    pub fn ideographs(&self) -> &str {
        &self.value[..self.ideograph_end]
    }
}

impl fmt::Display for NormalizedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl AsRef<str> for NormalizedKey {
    fn as_ref(&self) -> &str {
        &self.value
    }
}

/// Both key shapes for one name, for callers that need word boundaries and a
/// compact form at the same time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameKeys {
    pub spaced: NormalizedKey,
    pub compact: NormalizedKey,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NameNormalizer {
    policy: KeyPolicy,
}

impl NameNormalizer {
    pub fn new(policy: KeyPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> KeyPolicy {
        self.policy
    }

    pub fn normalize(&self, raw: &str) -> NormalizedKey {
        normalize_with(raw, self.policy)
    }

    pub fn keys(raw: &str) -> NameKeys {
        NameKeys {
            spaced: normalize_with(raw, KeyPolicy::Spaced),
            compact: normalize_with(raw, KeyPolicy::Compact),
        }
    }
}

fn normalize_with(raw: &str, policy: KeyPolicy) -> NormalizedKey {
    let stripped = strip_annotations(raw);
    let mut ideographs = String::new();
    let mut remainder = String::with_capacity(stripped.len());

    for ch in stripped.chars().flat_map(char::to_lowercase) {
        if is_cjk_ideograph(ch) {
            ideographs.push(ch);
            // keeps "jane李doe" from fusing into one word under the spaced policy
            remainder.push(' ');
        } else {
            remainder.push(ch);
        }
    }

    let remainder = match policy {
        KeyPolicy::Compact => remainder.chars().filter(|ch| ch.is_alphanumeric()).collect(),
        KeyPolicy::Spaced => collapse_separators(&remainder),
    };

    NormalizedKey::from_parts(ideographs, &remainder, policy)
}

fn is_cjk_ideograph(ch: char) -> bool {
    matches!(ch, '\u{4E00}'..='\u{9FFF}' | '\u{3400}'..='\u{4DBF}')
}

/// Drops parenthesised annotations such as locations or roles.
fn strip_annotations(raw: &str) -> String {
    let mut depth = 0usize;
    let mut out = String::with_capacity(raw.len());

    for ch in raw.chars() {
        match ch {
            '(' | '（' => {
                if depth == 0 {
                    out.push(' ');
                }
                depth += 1;
            }
            ')' | '）' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    out.push(' ');
                }
            }
            _ if depth == 0 => out.push(ch),
            _ => {}
        }
    }

    out
}

fn collapse_separators(value: &str) -> String {
    value
        .split(|ch: char| !ch.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
