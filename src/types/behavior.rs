use std::fmt;

use serde::Serialize;

/// Short-circuit policy attached to one expression by its leading marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Behavior {
    /// No marker: every rule is evaluated.
    #[default]
    Normal,
    /// `?` prefix: stop at the first rule that passes.
    Optimistic,
    /// `!` prefix: stop at the first rule that fails.
    Pessimistic,
}

impl Behavior {
    /// The behavior named by a marker character, if any.
    #[must_use]
    pub fn from_marker(marker: char) -> Option<Self> {
        match marker {
            '?' => Some(Behavior::Optimistic),
            '!' => Some(Behavior::Pessimistic),
            _ => None,
        }
    }

    #[must_use]
    pub fn marker(self) -> Option<char> {
        match self {
            Behavior::Normal => None,
            Behavior::Optimistic => Some('?'),
            Behavior::Pessimistic => Some('!'),
        }
    }

    /// Split a leading marker off an expression.
    #[must_use]
    pub fn strip(expression: &str) -> (Self, &str) {
        let mut chars = expression.chars();
        match chars.next().and_then(Behavior::from_marker) {
            Some(behavior) => (behavior, chars.as_str()),
            None => (Behavior::Normal, expression),
        }
    }

    /// Whether a rule outcome ends evaluation early under this behavior.
    #[must_use]
    pub fn stops_on(self, outcome: bool) -> bool {
        match self {
            Behavior::Normal => false,
            Behavior::Optimistic => outcome,
            Behavior::Pessimistic => !outcome,
        }
    }

    /// Bit written in place of every rule skipped by a short-circuit.
    #[must_use]
    pub fn terminal_bit(self) -> Option<char> {
        match self {
            Behavior::Normal => None,
            Behavior::Optimistic => Some('1'),
            Behavior::Pessimistic => Some('0'),
        }
    }
}

impl fmt::Display for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Behavior::Normal => write!(f, "normal"),
            Behavior::Optimistic => write!(f, "optimistic"),
            Behavior::Pessimistic => write!(f, "pessimistic"),
        }
    }
}
