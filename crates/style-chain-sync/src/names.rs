//! Style name validation and slot labels.
//!
//! Invalid names are ordinary input, not errors: they map to the
//! placeholder label.

/// Validation applied to incoming style names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameRule {
    /// Non-empty after trimming and not a placeholder ("-", "none").
    Standard,
    /// Must begin with a double quote.
    Quoted,
}

impl NameRule {
    /// Check a name against this rule.
    pub fn accepts(self, name: &str) -> bool {
        match self {
            NameRule::Standard => is_valid_style_name(name),
            NameRule::Quoted => is_quoted_style_name(name),
        }
    }
}

/// How a consumer renders a valid name in its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelFormat {
    /// `"{rank} - {name}"`, rank starting at 1.
    Ranked,
    /// The name as received.
    Raw,
}

impl LabelFormat {
    /// Label for slot `index` holding `name`.
    pub fn label(self, index: usize, name: &str) -> String {
        match self {
            LabelFormat::Ranked => format!("{} - {}", index + 1, name),
            LabelFormat::Raw => name.to_string(),
        }
    }
}

/// True unless the name is empty, whitespace, "-" or "none" (any case).
pub fn is_valid_style_name(name: &str) -> bool {
    let normalized = name.trim().to_lowercase();
    !matches!(normalized.as_str(), "" | "-" | "none")
}

/// True when the name starts with a double quote.
pub fn is_quoted_style_name(name: &str) -> bool {
    name.starts_with('"')
}

/// Strip one pair of surrounding single or double quotes.
///
/// Returns an empty string for invalid names.
pub fn normalize_style_name(name: &str) -> String {
    if !is_valid_style_name(name) {
        return String::new();
    }
    let name = name.trim();
    let quoted = name.len() >= 2
        && ((name.starts_with('"') && name.ends_with('"'))
            || (name.starts_with('\'') && name.ends_with('\'')));
    if quoted {
        name[1..name.len() - 1].to_string()
    } else {
        name.to_string()
    }
}
