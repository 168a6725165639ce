//! Pipeline view - fixed four-stage view over named artifacts
//!
//! The service returns a variable-length list of named steps in the order it
//! produced them. [`PipelineView::build`] maps that list onto four fixed
//! stages (plus the auxiliary `result_raw` slot) by name lookup, using an
//! ordered alias list per slot. The first alias that matches any step wins,
//! regardless of where that step sits in the raw list.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::value::SemanticValue;

// ─────────────────────────────────────────────────────────────────────────────
// Slot alias tables (must match the backend's step names exactly)
// ─────────────────────────────────────────────────────────────────────────────

pub const TOKENS_ALIASES: &[&str] = &["tokens"];
pub const PARSE_ALIASES: &[&str] = &["parse"];
pub const SEMANTIC_FORM_ALIASES: &[&str] = &["dịch", "dịch_FOL"];
pub const LOGIC_QUERY_ALIASES: &[&str] = &[
    "wh_query",
    "yn_query",
    "wh_query_pattern_1",
    "yn_query_pattern_1",
    "logic",
    "prover",
];
pub const RESULT_RAW_ALIASES: &[&str] = &[
    "wh_result",
    "yn_result",
    "wh_result_pattern_1",
    "yn_result_pattern_1",
];

/// Number of stages in the view
pub const STAGE_COUNT: usize = 4;

/// Index of the last stage
pub const LAST_STAGE: usize = STAGE_COUNT - 1;

// ─────────────────────────────────────────────────────────────────────────────
// Raw steps
// ─────────────────────────────────────────────────────────────────────────────

/// One named artifact produced by the service: `{ "step": ..., "data": ... }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawStep {
    /// Free-form label; not guaranteed unique
    #[serde(rename = "step")]
    pub name: String,
    #[serde(rename = "data", default)]
    pub payload: Arc<SemanticValue>,
}

impl RawStep {
    pub fn new(name: impl Into<String>, payload: SemanticValue) -> Self {
        Self {
            name: name.into(),
            payload: Arc::new(payload),
        }
    }
}

/// Payload of the first step matching the earliest alias in `aliases`.
///
/// A step whose payload is `null` does not count as a match.
pub fn find_step(steps: &[RawStep], aliases: &[&str]) -> Option<Arc<SemanticValue>> {
    aliases.iter().find_map(|alias| {
        steps
            .iter()
            .find(|s| s.name == *alias && !s.payload.is_null())
            .map(|s| Arc::clone(&s.payload))
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Stages
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Tokens,
    Parse,
    SemanticForm,
    LogicQuery,
}

impl Stage {
    pub const ALL: [Stage; STAGE_COUNT] = [
        Stage::Tokens,
        Stage::Parse,
        Stage::SemanticForm,
        Stage::LogicQuery,
    ];

    pub fn index(self) -> usize {
        match self {
            Self::Tokens => 0,
            Self::Parse => 1,
            Self::SemanticForm => 2,
            Self::LogicQuery => 3,
        }
    }

    /// Stage at `index`, clamped to the last stage
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index.min(LAST_STAGE)]
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Tokens => "1. Tokenize",
            Self::Parse => "2. Parse",
            Self::SemanticForm => "3. Semantic Form",
            Self::LogicQuery => "4. Logic Query",
        }
    }

    /// Short title for narrow terminals
    pub fn compact_title(self) -> &'static str {
        match self {
            Self::Tokens => "1. Words",
            Self::Parse => "2. Grammar",
            Self::SemanticForm => "3. Meaning",
            Self::LogicQuery => "4. Answer",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Tokens => "Breaking text into words",
            Self::Parse => "Understanding sentence structure",
            Self::SemanticForm => "Extracting meaning",
            Self::LogicQuery => "Finding the answer",
        }
    }

    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Tokens => TOKENS_ALIASES,
            Self::Parse => PARSE_ALIASES,
            Self::SemanticForm => SEMANTIC_FORM_ALIASES,
            Self::LogicQuery => LOGIC_QUERY_ALIASES,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Pipeline view
// ─────────────────────────────────────────────────────────────────────────────

/// Fixed-shape view derived from a raw step list
#[derive(Debug, Clone, Default)]
pub struct PipelineView {
    pub tokens: Option<Arc<SemanticValue>>,
    pub parse: Option<Arc<SemanticValue>>,
    pub semantic_form: Option<Arc<SemanticValue>>,
    pub logic_query: Option<Arc<SemanticValue>>,
    pub result_raw: Option<Arc<SemanticValue>>,
}

impl PipelineView {
    /// Build the view. Total: an empty or unrecognised list gives all-`None`.
    ///
    /// Slots share the payload allocations of `steps`, so building twice from
    /// the same list yields views with the same identity.
    pub fn build(steps: &[RawStep]) -> Self {
        let view = Self {
            tokens: find_step(steps, TOKENS_ALIASES),
            parse: find_step(steps, PARSE_ALIASES),
            semantic_form: find_step(steps, SEMANTIC_FORM_ALIASES),
            logic_query: find_step(steps, LOGIC_QUERY_ALIASES),
            result_raw: find_step(steps, RESULT_RAW_ALIASES),
        };
        tracing::debug!(
            raw_steps = steps.len(),
            filled = view.filled_stages(),
            has_result = view.result_raw.is_some(),
            "Built pipeline view"
        );
        view
    }

    pub fn slot(&self, stage: Stage) -> Option<&Arc<SemanticValue>> {
        match stage {
            Stage::Tokens => self.tokens.as_ref(),
            Stage::Parse => self.parse.as_ref(),
            Stage::SemanticForm => self.semantic_form.as_ref(),
            Stage::LogicQuery => self.logic_query.as_ref(),
        }
    }

    /// Whether any of the four stages has data (`result_raw` is not a stage)
    pub fn has_data(&self) -> bool {
        Stage::ALL.iter().any(|s| self.slot(*s).is_some())
    }

    pub fn filled_stages(&self) -> usize {
        Stage::ALL.iter().filter(|s| self.slot(**s).is_some()).count()
    }

    /// Identity comparison: every slot points at the same payload allocation.
    pub fn same_identity(&self, other: &PipelineView) -> bool {
        fn same(a: &Option<Arc<SemanticValue>>, b: &Option<Arc<SemanticValue>>) -> bool {
            match (a, b) {
                (None, None) => true,
                (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                _ => false,
            }
        }
        same(&self.tokens, &other.tokens)
            && same(&self.parse, &other.parse)
            && same(&self.semantic_form, &other.semantic_form)
            && same(&self.logic_query, &other.logic_query)
            && same(&self.result_raw, &other.result_raw)
    }
}
