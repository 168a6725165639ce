//! Answer classification

use std::fmt;

/// How an answer string is presented
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    /// Exactly `"Yes"` or `"No"`
    YesNo(bool),
    /// Any other non-empty answer
    Full(String),
}

impl Answer {
    /// `None` for an empty answer
    pub fn classify(raw: &str) -> Option<Self> {
        match raw {
            "" => None,
            "Yes" => Some(Self::YesNo(true)),
            "No" => Some(Self::YesNo(false)),
            other => Some(Self::Full(other.to_string())),
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::YesNo(_) => "Yes/No Answer",
            Self::Full(_) => "Full Answer",
        }
    }

    pub fn is_yes_no(&self) -> bool {
        matches!(self, Self::YesNo(_))
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::YesNo(true) => f.write_str("Yes"),
            Self::YesNo(false) => f.write_str("No"),
            Self::Full(text) => f.write_str(text),
        }
    }
}
