//! Address cleanup before geocoding.
//!
//! Cleaning is an ordered table of regex rules. Each rule removes every
//! match of its pattern; the whole table is re-applied until the string
//! stops changing, so `clean(clean(x)) == clean(x)`.

use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

/// (name, pattern, replacement), applied in order.
const STANDARD_RULES: &[(&str, &str, &str)] = &[
    (
        "label_prefix",
        r"(?i)^(?:\s*(?:dirección|direccion|address|calle|street|avenida|avda\.?|av\.?)\s*:)+\s*",
        "",
    ),
    (
        "unit",
        r"(?i)[,\s]*(?:\b(?:apartamento|apto|apt|unidad|unit|departamento|depto|dept|dpto|dpt|número|numero|num|no)\b\.?|#)\s*\d+[a-z]?\b",
        "",
    ),
    (
        "floor_word_number",
        r"(?i)[,\s]*\b(?:piso|floor|nivel|level)\s*\d+\b",
        "",
    ),
    (
        "floor_number_word",
        r"(?i)[,\s]*\b\d+(?:er|ro|do|to|vo|no|th|st|nd|rd|°|º)?\s*(?:piso|floor|nivel|level)\b",
        "",
    ),
    (
        "building",
        r"(?i)[,\s]*\b(?:edificio|building|bloque|block|torre|tower|complejo|complex)\s+[a-z0-9]+\b",
        "",
    ),
    ("collapse_whitespace", r"\s+", " "),
    ("trim_whitespace", r"^\s+|\s+$", ""),
    ("trim_punctuation", r"^[\s,;:]+|[\s,;:]+$", ""),
];

static STANDARD_CLEANER: LazyLock<AddressCleaner> = LazyLock::new(AddressCleaner::standard);

#[derive(Debug, Clone)]
pub struct CleaningRule {
    name: &'static str,
    pattern: Regex,
    replacement: &'static str,
}

impl CleaningRule {
    pub fn new(
        name: &'static str,
        pattern: &str,
        replacement: &'static str,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            name,
            pattern: Regex::new(pattern)?,
            replacement,
        })
    }

    pub fn name(&self) -> &str {
        self.name
    }

    pub fn apply<'a>(&self, input: &'a str) -> Cow<'a, str> {
        self.pattern.replace_all(input, self.replacement)
    }
}

#[derive(Debug, Clone)]
pub struct AddressCleaner {
    rules: Vec<CleaningRule>,
}

impl AddressCleaner {
    pub fn new(rules: Vec<CleaningRule>) -> Self {
        Self { rules }
    }

    /// Cleaner built from the standard rule table.
    pub fn standard() -> Self {
        let rules = STANDARD_RULES
            .iter()
            .map(|(name, pattern, replacement)| {
                CleaningRule::new(name, pattern, replacement)
                    .unwrap_or_else(|e| panic!("built-in cleaning rule '{}' is invalid: {}", name, e))
            })
            .collect();
        Self::new(rules)
    }

    pub fn rules(&self) -> &[CleaningRule] {
        &self.rules
    }

    /// Never fails; empty or whitespace-only input yields `""`.
    pub fn clean(&self, address: &str) -> String {
        let mut current = address.to_string();
        loop {
            let next = self.apply_once(&current);
            // A pass that lengthens the string can never settle.
            if next == current || next.len() > current.len() {
                return current;
            }
            current = next;
        }
    }

    fn apply_once(&self, input: &str) -> String {
        self.rules.iter().fold(input.to_string(), |acc, rule| {
            match rule.apply(&acc) {
                Cow::Borrowed(_) => acc,
                Cow::Owned(changed) => {
                    tracing::trace!(rule = rule.name(), "address rewritten: {}", changed);
                    changed
                }
            }
        })
    }
}

impl Default for AddressCleaner {
    fn default() -> Self {
        STANDARD_CLEANER.clone()
    }
}

pub fn clean_address(address: &str) -> String {
    STANDARD_CLEANER.clean(address)
}
