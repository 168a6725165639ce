//! AppState - Domain Layer
//!
//! Query lifecycle, playback and per-stage view state. Every transition that
//! depends on time takes `now` explicitly.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::answer::Answer;
use crate::backend::QueryResult;
use crate::catalog::{default_question, Catalog};
use crate::config::ViewerConfig;
use crate::pipeline::{PipelineView, RawStep, Stage, STAGE_COUNT};
use crate::playback::{PlaybackController, PlaybackEvent};
use crate::tui::runtime::RuntimeEvent;
use crate::tui::theme::PipelineTheme;
use crate::tui::widgets::{StageRenderer, TreeRow, TreeState, ViewMode};
use crate::value::SemanticValue;

/// Terminals narrower than this use compact stage titles
pub const COMPACT_WIDTH: u16 = 100;

// ─────────────────────────────────────────────────────────────────────────────
// Core State
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct AppState {
    // Questions
    pub catalog: Catalog,
    pub selected: usize,

    // Query lifecycle
    pub status: QueryStatus,
    pub question: String,
    pub answer: String,
    pub steps: Vec<RawStep>,
    pub pipeline: PipelineView,
    pub error: Option<ErrorBanner>,
    pub show_results: bool,
    pending_request: Option<u64>,
    next_request: u64,

    // Playback
    pub playback: PlaybackController,
    pub speed_step_ms: u64,

    // Per-stage view state
    view_modes: HashMap<Stage, ViewMode>,
    trees: [TreeState; STAGE_COUNT],

    // Rendering
    pub theme: PipelineTheme,
    search_depth: usize,
    max_render_depth: usize,
    tree_stagger: Duration,

    // UI state
    pub focus: Focus,
    pub show_help: bool,
    pub show_raw_details: bool,
    pub should_quit: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(&ViewerConfig::default())
    }
}

impl AppState {
    pub fn new(config: &ViewerConfig) -> Self {
        let catalog = Catalog::builtin();
        let selected = catalog.position(default_question()).unwrap_or(0);
        Self {
            catalog,
            selected,
            status: QueryStatus::Idle,
            question: String::new(),
            answer: String::new(),
            steps: Vec::new(),
            pipeline: PipelineView::default(),
            error: None,
            show_results: false,
            pending_request: None,
            next_request: 0,
            playback: PlaybackController::new(config.advance_interval_ms),
            speed_step_ms: config.speed_step_ms,
            view_modes: HashMap::new(),
            trees: Default::default(),
            theme: PipelineTheme::new(),
            search_depth: config.functor_search_depth,
            max_render_depth: config.max_render_depth,
            tree_stagger: config.tree_stagger(),
            focus: Focus::Questions,
            show_help: true,
            show_raw_details: false,
            should_quit: false,
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Questions
    // ─────────────────────────────────────────────────────────────────────

    /// Text of the selected question, trimmed
    pub fn selected_question(&self) -> &str {
        self.catalog
            .get(self.selected)
            .map(|e| e.text.trim())
            .unwrap_or_default()
    }

    pub fn select_next_question(&mut self) {
        if !self.catalog.is_empty() {
            self.selected = (self.selected + 1) % self.catalog.len();
        }
    }

    pub fn select_prev_question(&mut self) {
        if !self.catalog.is_empty() {
            self.selected = (self.selected + self.catalog.len() - 1) % self.catalog.len();
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Query lifecycle
    // ─────────────────────────────────────────────────────────────────────

    /// Clear previous results and start a query for the selected question.
    /// Returns the request id and question to submit.
    pub fn begin_query(&mut self, now: Instant) -> Option<(u64, String)> {
        let question = self.selected_question().to_string();
        if question.is_empty() {
            return None;
        }
        self.next_request += 1;
        let id = self.next_request;
        self.pending_request = Some(id);
        self.question = question.clone();
        self.status = QueryStatus::Loading;
        self.clear_results(now);
        Some((id, question))
    }

    /// Apply an event from the runtime. Responses to superseded requests are
    /// dropped.
    pub fn apply_runtime_event(&mut self, event: RuntimeEvent, now: Instant) {
        tracing::debug!(event = %event.description(), "Runtime event");
        match event {
            RuntimeEvent::QuestionsLoaded(questions) => {
                let current = self.selected_question().to_string();
                self.catalog = Catalog::from_remote(questions);
                self.selected = self
                    .catalog
                    .position(&current)
                    .or_else(|| self.catalog.position(default_question()))
                    .unwrap_or(0);
            }
            RuntimeEvent::QueryCompleted { request_id, result } => {
                if self.pending_request != Some(request_id) {
                    return;
                }
                self.pending_request = None;
                self.finish_query(result, now);
            }
            RuntimeEvent::QueryFailed {
                request_id,
                message,
                hint,
            } => {
                if self.pending_request != Some(request_id) {
                    return;
                }
                self.pending_request = None;
                self.status = QueryStatus::Failed;
                self.clear_results(now);
                self.error = Some(ErrorBanner { message, hint });
            }
        }
    }

    fn finish_query(&mut self, result: QueryResult, now: Instant) {
        self.status = QueryStatus::Ready;
        self.pipeline = result.pipeline();
        self.answer = result.answer;
        self.steps = result.steps;
        self.reload_pipeline(now);
    }

    fn clear_results(&mut self, now: Instant) {
        self.answer.clear();
        self.steps.clear();
        self.error = None;
        self.show_results = false;
        self.pipeline = PipelineView::default();
        self.reload_pipeline(now);
    }

    /// Hand the current view to the controller; a reset drops view state
    fn reload_pipeline(&mut self, now: Instant) {
        if self.playback.load(&self.pipeline, now) {
            // completion belongs to the previous view
            self.show_results = false;
            self.view_modes.clear();
            for tree in &mut self.trees {
                tree.clear();
            }
        }
        self.drain_playback_events();
    }

    pub fn dismiss_error(&mut self) -> bool {
        self.error.take().is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Loading
    }

    /// Answer to present, once playback has reached the last stage
    pub fn visible_answer(&self) -> Option<Answer> {
        if self.show_results {
            Answer::classify(&self.answer)
        } else {
            None
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Playback
    // ─────────────────────────────────────────────────────────────────────

    /// Fire due timers and keep the current tree in sync
    pub fn tick(&mut self, now: Instant) {
        self.playback.tick(now);
        self.drain_playback_events();
        self.sync_current_tree(now);
    }

    pub fn drain_playback_events(&mut self) {
        for event in self.playback.take_events() {
            match event {
                PlaybackEvent::Completed => {
                    self.show_results = true;
                    tracing::debug!("Pipeline completed, revealing results");
                }
                PlaybackEvent::StepChanged { from, to, auto } => {
                    tracing::trace!(from, to, auto, "Stage changed");
                }
            }
        }
    }

    pub fn speed_up(&mut self) {
        let ms = self.playback.interval_ms().saturating_sub(self.speed_step_ms);
        self.playback.set_speed(ms);
    }

    pub fn slow_down(&mut self) {
        let ms = self.playback.interval_ms().saturating_add(self.speed_step_ms);
        self.playback.set_speed(ms);
    }

    pub fn current_stage(&self) -> Stage {
        Stage::from_index(self.playback.current_index())
    }

    /// Stages at or before the current one
    pub fn is_visited(&self, stage: Stage) -> bool {
        stage.index() <= self.playback.current_index()
    }

    pub fn stage_data(&self, stage: Stage) -> Option<&Arc<SemanticValue>> {
        self.pipeline.slot(stage)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Stage view
    // ─────────────────────────────────────────────────────────────────────

    pub fn stage_renderer(&self) -> StageRenderer<'_> {
        StageRenderer::new(&self.theme)
            .search_depth(self.search_depth)
            .max_depth(self.max_render_depth)
            .stagger(self.tree_stagger)
    }

    /// Mode requested for `stage` (may not be offered; the view resolves it)
    pub fn requested_mode(&self, stage: Stage) -> Option<ViewMode> {
        self.view_modes.get(&stage).copied()
    }

    /// Effective mode of the current stage, `None` when it has no data
    pub fn active_mode(&self) -> Option<ViewMode> {
        let stage = self.current_stage();
        let data = self.stage_data(stage)?;
        Some(self.stage_renderer().resolve(data, self.requested_mode(stage)))
    }

    pub fn cycle_view_mode(&mut self) {
        let stage = self.current_stage();
        let Some(data) = self.stage_data(stage).cloned() else {
            return;
        };
        let renderer = self.stage_renderer();
        let offered = renderer.modes(&data);
        let current = renderer.resolve(&data, self.requested_mode(stage));
        let next = current.cycle(&offered);
        self.view_modes.insert(stage, next);
    }

    pub fn tree_state(&self, stage: Stage) -> &TreeState {
        &self.trees[stage.index()]
    }

    fn sync_current_tree(&mut self, now: Instant) {
        let stage = self.current_stage();
        match self.pipeline.slot(stage).cloned() {
            Some(data) => {
                self.trees[stage.index()].sync(&data, now);
            }
            None => self.trees[stage.index()].clear(),
        }
    }

    /// Rows of the current stage's tree (empty when not in tree mode)
    pub fn current_tree_rows(&self) -> Vec<TreeRow> {
        let stage = self.current_stage();
        match (self.stage_data(stage), self.active_mode()) {
            (Some(data), Some(ViewMode::Tree)) => self
                .stage_renderer()
                .tree_rows(data, self.tree_state(stage)),
            _ => Vec::new(),
        }
    }

    pub fn move_tree_cursor(&mut self, delta: isize) {
        let count = self.current_tree_rows().len();
        let stage = self.current_stage();
        self.trees[stage.index()].move_cursor(delta, count);
    }

    /// Toggle the node under the cursor; false when nothing toggled
    pub fn toggle_tree_node(&mut self) -> bool {
        let rows = self.current_tree_rows();
        let stage = self.current_stage();
        self.trees[stage.index()].toggle_at_cursor(&rows)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Query Status
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    Idle,
    Loading,
    Ready,
    Failed,
}

impl std::fmt::Display for QueryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "IDLE"),
            Self::Loading => write!(f, "ANALYZING"),
            Self::Ready => write!(f, "READY"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

/// Dismissible transport error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorBanner {
    pub message: String,
    pub hint: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// UI State
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Focus {
    Questions,
    Stage,
}

impl Focus {
    pub fn next(&self) -> Self {
        match self {
            Self::Questions => Self::Stage,
            Self::Stage => Self::Questions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;

    fn completed(state: &mut AppState, now: Instant) -> u64 {
        let (id, question) = state.begin_query(now).unwrap();
        state.apply_runtime_event(
            RuntimeEvent::QueryCompleted {
                request_id: id,
                result: MockBackend::demo_result(&question),
            },
            now,
        );
        id
    }

    #[test]
    fn test_defaults() {
        let state = AppState::default();
        assert_eq!(state.status, QueryStatus::Idle);
        assert_eq!(state.selected_question(), "Smaug là rồng phải không?");
        assert_eq!(state.focus, Focus::Questions);
        assert!(state.active_mode().is_none());
    }

    #[test]
    fn test_skipping_ahead_while_loading_does_not_reveal_next_answer() {
        let now = Instant::now();
        let mut state = AppState::default();
        let (id, question) = state.begin_query(now).unwrap();

        // Jump to the end of the empty placeholder view
        state.playback.show_all();
        state.drain_playback_events();

        state.apply_runtime_event(
            RuntimeEvent::QueryCompleted {
                request_id: id,
                result: MockBackend::demo_result(&question),
            },
            now,
        );
        assert_eq!(state.playback.current_index(), 0);
        assert!(state.playback.is_playing());
        assert!(state.visible_answer().is_none());

        state.playback.show_all();
        state.drain_playback_events();
        assert!(state.visible_answer().is_some());
    }

    #[test]
    fn test_begin_query_clears_previous_results() {
        let now = Instant::now();
        let mut state = AppState::default();
        completed(&mut state, now);
        state.playback.show_all();
        state.drain_playback_events();
        assert!(state.visible_answer().is_some());

        state.begin_query(now);
        assert!(state.is_loading());
        assert!(state.answer.is_empty());
        assert!(state.steps.is_empty());
        assert!(!state.show_results);
        assert!(!state.pipeline.has_data());
    }

    #[test]
    fn test_completion_starts_playback_and_hides_answer() {
        let now = Instant::now();
        let mut state = AppState::default();
        completed(&mut state, now);
        assert_eq!(state.status, QueryStatus::Ready);
        assert!(state.playback.is_playing());
        assert_eq!(state.current_stage(), Stage::Tokens);
        assert!(state.visible_answer().is_none());
    }

    #[test]
    fn test_results_revealed_after_last_stage() {
        let now = Instant::now();
        let mut state = AppState::default();
        completed(&mut state, now);
        let step = state.playback.interval();
        for i in 1..=3u32 {
            state.tick(now + step * i);
        }
        assert_eq!(state.current_stage(), Stage::LogicQuery);
        assert_eq!(state.visible_answer(), Some(Answer::YesNo(true)));
    }

    #[test]
    fn test_failure_clears_answer_and_sets_banner() {
        let now = Instant::now();
        let mut state = AppState::default();
        completed(&mut state, now);
        let (id, _) = state.begin_query(now).unwrap();
        state.apply_runtime_event(
            RuntimeEvent::QueryFailed {
                request_id: id,
                message: "HTTP 500".to_string(),
                hint: None,
            },
            now,
        );
        assert_eq!(state.status, QueryStatus::Failed);
        assert!(state.answer.is_empty());
        assert_eq!(state.error.as_ref().map(|e| e.message.as_str()), Some("HTTP 500"));
        assert!(state.dismiss_error());
        assert!(state.error.is_none());
    }

    #[test]
    fn test_stale_response_is_ignored() {
        let now = Instant::now();
        let mut state = AppState::default();
        let (old, _) = state.begin_query(now).unwrap();
        state.begin_query(now);
        state.apply_runtime_event(
            RuntimeEvent::QueryCompleted {
                request_id: old,
                result: MockBackend::demo_result("Ai bảo vệ Camelot?"),
            },
            now,
        );
        assert!(state.is_loading());
        assert!(state.answer.is_empty());
    }

    #[test]
    fn test_speed_steps_are_clamped() {
        let mut state = AppState::default();
        for _ in 0..10 {
            state.speed_up();
        }
        assert_eq!(state.playback.interval_ms(), 1000);
        state.slow_down();
        assert_eq!(state.playback.interval_ms(), 1500);
    }

    #[test]
    fn test_cycle_view_mode_on_functor_stage() {
        let now = Instant::now();
        let mut state = AppState::default();
        completed(&mut state, now);
        state.playback.jump_to(Stage::SemanticForm.index());
        assert_eq!(state.active_mode(), Some(ViewMode::Expression));
        state.cycle_view_mode();
        assert_eq!(state.active_mode(), Some(ViewMode::Tree));
        state.cycle_view_mode();
        assert_eq!(state.active_mode(), Some(ViewMode::Raw));
        state.cycle_view_mode();
        assert_eq!(state.active_mode(), Some(ViewMode::Expression));
    }

    #[test]
    fn test_tree_toggle_on_tokens_stage() {
        let now = Instant::now();
        let mut state = AppState::default();
        completed(&mut state, now);
        state.tick(now);
        let rows = state.current_tree_rows();
        assert!(rows.len() > 1);
        assert!(state.toggle_tree_node());
        assert_eq!(state.current_tree_rows().len(), 1);
    }

    #[test]
    fn test_questions_loaded_keeps_selection() {
        let now = Instant::now();
        let mut state = AppState::default();
        state.select_next_question();
        let before = state.selected_question().to_string();
        state.apply_runtime_event(RuntimeEvent::QuestionsLoaded(Vec::new()), now);
        assert_eq!(state.selected_question(), before);
    }

    #[test]
    fn test_question_selection_wraps() {
        let mut state = AppState::default();
        state.select_prev_question();
        assert_eq!(state.selected, state.catalog.len() - 1);
        state.select_next_question();
        assert_eq!(state.selected, 0);
    }
}
