//! Pipeviz - step-by-step viewer for a question-answering NLP pipeline
//!
//! A question goes through tokenization, parsing, a semantic form (DRS) and
//! a logic query. Pipeviz fetches those artifacts from the service, maps
//! them onto four fixed stages and replays them one stage at a time, with
//! tree, logical-notation and raw JSON renderings of each payload.

pub mod answer;
pub mod backend;
pub mod catalog;
pub mod classify;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod playback;
pub mod tui;
pub mod value;

pub use answer::Answer;
pub use backend::{Backend, HttpBackend, MockBackend, QueryResult};
pub use catalog::{Catalog, Question, QuestionGroup, QuestionId};
pub use classify::{classify, contains_functor_node, Kind, StructuralClassifier};
pub use config::ViewerConfig;
pub use error::{FixSuggestion, PipevizError};
pub use pipeline::{PipelineView, RawStep, Stage};
pub use playback::{PlaybackController, PlaybackEvent};
pub use tui::widgets::{ExpressionRenderer, StageRenderer, TreeRenderer, TreeState, ViewMode};
pub use value::{FunctorNode, SemanticValue};
