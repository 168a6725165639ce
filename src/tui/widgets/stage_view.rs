//! Stage View - one pipeline stage with its view-mode switch
//!
//! Chooses between the expression notation, the generic tree and raw JSON
//! for a stage payload and delegates to the matching renderer. The
//! expression mode is only offered when the payload actually contains a
//! functor node.

use std::time::Duration;

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::classify::{Kind, StructuralClassifier};
use crate::pipeline::Stage;
use crate::tui::theme::PipelineTheme;
use crate::tui::widgets::expr_view::ExpressionRenderer;
use crate::tui::widgets::raw_view::raw_lines;
use crate::tui::widgets::tree_view::{
    TreeRenderer, TreeRow, TreeState, TreeView, DEFAULT_MAX_RENDER_DEPTH, DEFAULT_STAGGER_MS,
};
use crate::tui::widgets::utils::lines_to_text;
use crate::value::SemanticValue;

/// Placeholder for a stage whose slot is empty
pub const NO_DATA: &str = "No data yet";

/// Presentation strategy for a stage payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum ViewMode {
    /// Logical notation (λ, ∃, DRS)
    #[value(name = "expr")]
    Expression,
    /// Collapsible generic tree
    Tree,
    /// Pretty-printed JSON
    Raw,
}

impl ViewMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Expression => "Expression",
            Self::Tree => "Tree",
            Self::Raw => "Raw",
        }
    }

    /// Next mode in `offered`, wrapping around
    pub fn cycle(self, offered: &[ViewMode]) -> ViewMode {
        match offered.iter().position(|m| *m == self) {
            Some(i) => offered[(i + 1) % offered.len()],
            None => offered.first().copied().unwrap_or(ViewMode::Raw),
        }
    }
}

/// Modes offered for a payload, in preference order. Raw is always last.
pub fn available_modes(data: &SemanticValue, search_depth: usize) -> Vec<ViewMode> {
    offered_modes(&StructuralClassifier::new(search_depth), data)
}

fn offered_modes(classifier: &StructuralClassifier, data: &SemanticValue) -> Vec<ViewMode> {
    let mut modes = Vec::with_capacity(3);
    if classifier.contains_functor_node(data) {
        modes.push(ViewMode::Expression);
    }
    if !matches!(classifier.classify(data), Kind::Null | Kind::Scalar) {
        modes.push(ViewMode::Tree);
    }
    modes.push(ViewMode::Raw);
    modes
}

/// First offered mode
pub fn default_mode(data: &SemanticValue, search_depth: usize) -> ViewMode {
    available_modes(data, search_depth)
        .first()
        .copied()
        .unwrap_or(ViewMode::Raw)
}

/// Renders stage payloads to lines in any of the three modes
#[derive(Debug, Clone)]
pub struct StageRenderer<'t> {
    theme: &'t PipelineTheme,
    classifier: StructuralClassifier,
    max_depth: usize,
    stagger: Duration,
}

impl<'t> StageRenderer<'t> {
    pub fn new(theme: &'t PipelineTheme) -> Self {
        Self {
            theme,
            classifier: StructuralClassifier::default(),
            max_depth: DEFAULT_MAX_RENDER_DEPTH,
            stagger: Duration::from_millis(DEFAULT_STAGGER_MS),
        }
    }

    pub fn search_depth(mut self, depth: usize) -> Self {
        self.classifier = StructuralClassifier::new(depth);
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn stagger(mut self, stagger: Duration) -> Self {
        self.stagger = stagger;
        self
    }

    pub fn theme(&self) -> &'t PipelineTheme {
        self.theme
    }

    pub fn modes(&self, data: &SemanticValue) -> Vec<ViewMode> {
        offered_modes(&self.classifier, data)
    }

    /// The requested mode if it is offered for `data`, else the default
    pub fn resolve(&self, data: &SemanticValue, requested: Option<ViewMode>) -> ViewMode {
        let offered = self.modes(data);
        match requested {
            Some(mode) if offered.contains(&mode) => mode,
            _ => offered.first().copied().unwrap_or(ViewMode::Raw),
        }
    }

    pub fn tree_renderer(&self) -> TreeRenderer<'t> {
        TreeRenderer::new(self.theme)
            .max_depth(self.max_depth)
            .stagger(self.stagger)
    }

    /// Tree rows for an interactive tree
    pub fn tree_rows(&self, data: &SemanticValue, state: &TreeState) -> Vec<TreeRow> {
        self.tree_renderer().render(data, state)
    }

    /// Static rendering, tree fully expanded
    pub fn lines(&self, data: Option<&SemanticValue>, mode: ViewMode) -> Vec<Line<'static>> {
        let Some(data) = data else {
            return vec![Line::from(Span::styled(NO_DATA, self.theme.dimmed()))];
        };
        match mode {
            ViewMode::Expression => ExpressionRenderer::new(self.theme)
                .max_depth(self.max_depth)
                .render(data),
            ViewMode::Tree => self
                .tree_rows(data, &TreeState::default())
                .into_iter()
                .map(|row| row.line)
                .collect(),
            ViewMode::Raw => raw_lines(data, self.theme),
        }
    }

    /// Plain-text rendering (used by the CLI)
    pub fn text(&self, data: Option<&SemanticValue>, mode: ViewMode) -> String {
        lines_to_text(&self.lines(data, mode))
    }
}

/// Bordered panel: stage title, description, mode tabs and the body
pub struct StageView<'a> {
    stage: Stage,
    data: Option<&'a SemanticValue>,
    renderer: &'a StageRenderer<'a>,
    mode: Option<ViewMode>,
    tree_rows: &'a [TreeRow],
    cursor: Option<usize>,
    elapsed: Duration,
    focused: bool,
    compact: bool,
}

impl<'a> StageView<'a> {
    pub fn new(
        stage: Stage,
        data: Option<&'a SemanticValue>,
        renderer: &'a StageRenderer<'a>,
    ) -> Self {
        Self {
            stage,
            data,
            renderer,
            mode: None,
            tree_rows: &[],
            cursor: None,
            elapsed: Duration::MAX,
            focused: false,
            compact: false,
        }
    }

    /// Requested mode; falls back to the default when not offered
    pub fn mode(mut self, mode: Option<ViewMode>) -> Self {
        self.mode = mode;
        self
    }

    /// Rows, cursor and entrance clock for tree mode
    pub fn tree(mut self, rows: &'a [TreeRow], cursor: Option<usize>, elapsed: Duration) -> Self {
        self.tree_rows = rows;
        self.cursor = cursor;
        self.elapsed = elapsed;
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    pub fn compact(mut self, compact: bool) -> Self {
        self.compact = compact;
        self
    }

    fn tabs(&self, offered: &[ViewMode], active: ViewMode) -> Line<'static> {
        let theme = self.renderer.theme();
        let mut spans = Vec::new();
        for mode in offered {
            if *mode == active {
                spans.push(Span::styled(format!("[{}]", mode.label()), theme.highlight()));
            } else {
                spans.push(Span::styled(format!(" {} ", mode.label()), theme.dimmed()));
            }
            spans.push(Span::raw(" "));
        }
        spans.push(Span::styled("(v) switch", theme.dimmed()));
        Line::from(spans)
    }
}

impl Widget for StageView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let theme = self.renderer.theme();
        let title = if self.compact {
            self.stage.compact_title()
        } else {
            self.stage.title()
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border(self.focused))
            .title(Span::styled(format!(" {} ", title), theme.header()));
        let inner = block.inner(area);
        block.render(area, buf);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Description
                Constraint::Length(1), // Mode tabs
                Constraint::Min(1),    // Body
            ])
            .split(inner);

        Paragraph::new(Line::from(Span::styled(
            self.stage.description(),
            theme.dimmed(),
        )))
        .render(chunks[0], buf);

        let Some(data) = self.data else {
            Paragraph::new(Line::from(Span::styled(NO_DATA, theme.dimmed())))
                .render(chunks[2], buf);
            return;
        };

        let offered = self.renderer.modes(data);
        let active = self.renderer.resolve(data, self.mode);
        self.tabs(&offered, active).render(chunks[1], buf);

        match active {
            ViewMode::Tree => TreeView::new(self.tree_rows, theme)
                .cursor(self.cursor)
                .elapsed(self.elapsed)
                .render(chunks[2], buf),
            mode => Paragraph::new(self.renderer.lines(Some(data), mode)).render(chunks[2], buf),
        }
    }
}
