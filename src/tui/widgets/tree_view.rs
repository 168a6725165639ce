//! Tree View Widget
//!
//! Generic collapsible tree for any semantic value. Every list, record and
//! functor node gets its own expand/collapse toggle (expanded by default),
//! keyed by the node's structural path. List elements and record entries
//! make a staggered entrance in index order.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::classify::{classify, Kind};
use crate::tui::theme::{icons, PipelineTheme};
use crate::value::{SemanticValue, ENVELOPE_KEY};

/// Default recursion limit for rendering
pub const DEFAULT_MAX_RENDER_DEPTH: usize = 64;

/// Default delay between sibling entrances
pub const DEFAULT_STAGGER_MS: u64 = 100;

// ─────────────────────────────────────────────────────────────────────────────
// Node paths
// ─────────────────────────────────────────────────────────────────────────────

/// Structural path of a node: `$`, `$[0]`, `$["key"]`, `$[0].args`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodePath(String);

impl NodePath {
    pub fn root() -> Self {
        Self("$".to_string())
    }

    pub fn index(&self, index: usize) -> Self {
        Self(format!("{}[{}]", self.0, index))
    }

    pub fn key(&self, key: &str) -> Self {
        Self(format!("{}[{:?}]", self.0, key))
    }

    /// The `args` subtree of a functor node
    pub fn args(&self) -> Self {
        Self(format!("{}.args", self.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Toggle state
// ─────────────────────────────────────────────────────────────────────────────

/// Expand/collapse flags and cursor for one rendered tree.
///
/// Flags survive re-renders of the same root allocation and are dropped
/// when a different root is synced in.
#[derive(Debug, Default)]
pub struct TreeState {
    root: Option<Arc<SemanticValue>>,
    collapsed: HashSet<NodePath>,
    shown_at: Option<Instant>,
    cursor: usize,
}

impl TreeState {
    /// Track `root`. Returns `true` when the state was reset.
    pub fn sync(&mut self, root: &Arc<SemanticValue>, now: Instant) -> bool {
        if let Some(current) = &self.root {
            if Arc::ptr_eq(current, root) {
                return false;
            }
        }
        self.root = Some(Arc::clone(root));
        self.collapsed.clear();
        self.cursor = 0;
        self.shown_at = Some(now);
        true
    }

    /// Forget the tracked root (slot became empty)
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_expanded(&self, path: &NodePath) -> bool {
        !self.collapsed.contains(path)
    }

    /// Flip a node; returns the new expanded flag
    pub fn toggle(&mut self, path: &NodePath) -> bool {
        if self.collapsed.remove(path) {
            true
        } else {
            self.collapsed.insert(path.clone());
            false
        }
    }

    /// Time since the current root appeared. Unsynced trees count as fully
    /// revealed.
    pub fn elapsed(&self, now: Instant) -> Duration {
        self.shown_at
            .map(|t| now.saturating_duration_since(t))
            .unwrap_or(Duration::MAX)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Move the cursor by `delta` rows, staying within `row_count`
    pub fn move_cursor(&mut self, delta: isize, row_count: usize) {
        let max = row_count.saturating_sub(1);
        self.cursor = if delta < 0 {
            self.cursor.saturating_sub(delta.unsigned_abs())
        } else {
            self.cursor.saturating_add(delta as usize).min(max)
        };
    }

    /// Toggle the node under the cursor, if that row is toggleable
    pub fn toggle_at_cursor(&mut self, rows: &[TreeRow]) -> bool {
        match rows.get(self.cursor).and_then(|r| r.path.as_ref()) {
            Some(path) => {
                let path = path.clone();
                self.toggle(&path);
                true
            }
            None => false,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Renderer
// ─────────────────────────────────────────────────────────────────────────────

/// One rendered row
#[derive(Debug, Clone)]
pub struct TreeRow {
    /// Set on rows that carry a toggle
    pub path: Option<NodePath>,
    pub depth: usize,
    pub line: Line<'static>,
    /// Entrance delay relative to when the root appeared
    pub reveal_after: Duration,
}

impl TreeRow {
    pub fn text(&self) -> String {
        self.line
            .spans
            .iter()
            .map(|s| s.content.as_ref())
            .collect()
    }
}

pub struct TreeRenderer<'t> {
    theme: &'t PipelineTheme,
    max_depth: usize,
    stagger: Duration,
}

impl<'t> TreeRenderer<'t> {
    pub fn new(theme: &'t PipelineTheme) -> Self {
        Self {
            theme,
            max_depth: DEFAULT_MAX_RENDER_DEPTH,
            stagger: Duration::from_millis(DEFAULT_STAGGER_MS),
        }
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn stagger(mut self, stagger: Duration) -> Self {
        self.stagger = stagger;
        self
    }

    /// Render `value` into rows. The input is never modified.
    ///
    /// A record whose only key is the envelope key is unwrapped once.
    pub fn render(&self, value: &SemanticValue, state: &TreeState) -> Vec<TreeRow> {
        let value = match value {
            SemanticValue::Record(entries) if entries.len() == 1 && entries[0].0 == ENVELOPE_KEY => {
                &entries[0].1
            }
            other => other,
        };
        let mut rows = Vec::new();
        self.node(
            value,
            NodePath::root(),
            0,
            Vec::new(),
            Duration::ZERO,
            state,
            &mut rows,
        );
        rows
    }

    /// Reveal delay of the `index`-th child; saturates instead of overflowing
    fn stagger_after(&self, delay: Duration, index: usize) -> Duration {
        let steps = u32::try_from(index).unwrap_or(u32::MAX);
        delay.saturating_add(self.stagger.saturating_mul(steps))
    }

    #[allow(clippy::too_many_arguments)]
    fn node(
        &self,
        value: &SemanticValue,
        path: NodePath,
        depth: usize,
        mut lead: Vec<Span<'static>>,
        delay: Duration,
        state: &TreeState,
        out: &mut Vec<TreeRow>,
    ) {
        let theme = self.theme;
        if depth > self.max_depth {
            lead.push(Span::styled(icons::ELLIPSIS, theme.dimmed()));
            out.push(leaf(lead, depth, delay));
            return;
        }

        match (classify(value), value) {
            (Kind::Null, _) => {
                lead.push(Span::styled("null", theme.null_marker()));
                out.push(leaf(lead, depth, delay));
            }
            (Kind::EmptyList, _) => {
                lead.push(Span::styled("[]", theme.dimmed()));
                out.push(leaf(lead, depth, delay));
            }
            (Kind::EmptyRecord, _) => {
                lead.push(Span::styled("{}", theme.dimmed()));
                out.push(leaf(lead, depth, delay));
            }
            (Kind::List, SemanticValue::List(items)) => {
                let expanded = state.is_expanded(&path);
                lead.push(marker(expanded, theme));
                lead.push(Span::styled(
                    plural(items.len(), "item", "items", '[', ']'),
                    theme.collection_header(),
                ));
                out.push(toggle_row(lead, &path, depth, delay));
                if !expanded {
                    return;
                }
                for (i, item) in items.iter().enumerate() {
                    let lead = vec![
                        indent(depth + 1),
                        Span::styled(format!("[{}] ", i), theme.index_label()),
                    ];
                    let child_delay = self.stagger_after(delay, i);
                    self.node(item, path.index(i), depth + 1, lead, child_delay, state, out);
                }
            }
            (Kind::Record, SemanticValue::Record(entries)) => {
                let expanded = state.is_expanded(&path);
                lead.push(marker(expanded, theme));
                lead.push(Span::styled(
                    plural(entries.len(), "key", "keys", '{', '}'),
                    theme.collection_header(),
                ));
                out.push(toggle_row(lead, &path, depth, delay));
                if !expanded {
                    return;
                }
                for (i, (key, item)) in entries.iter().enumerate() {
                    let lead = vec![
                        indent(depth + 1),
                        Span::styled(format!("{}:", key), theme.key_label()),
                        Span::raw(" "),
                    ];
                    let child_delay = self.stagger_after(delay, i);
                    self.node(item, path.key(key), depth + 1, lead, child_delay, state, out);
                }
            }
            (Kind::Functor, SemanticValue::Functor(node)) => {
                let expanded = state.is_expanded(&path);
                lead.push(marker(expanded, theme));
                lead.push(Span::styled(
                    node.functor.clone().unwrap_or_else(|| "node".to_string()),
                    theme.functor_name(),
                ));
                out.push(toggle_row(lead, &path, depth, delay));
                let Some(args) = node.args.as_deref() else {
                    return;
                };
                if !expanded {
                    return;
                }
                let args_delay = delay.saturating_add(self.stagger.saturating_mul(3) / 2);
                out.push(leaf(
                    vec![indent(depth + 1), Span::styled("args:", theme.dimmed())],
                    depth + 1,
                    args_delay,
                ));
                self.node(
                    args,
                    path.args(),
                    depth + 2,
                    vec![indent(depth + 2)],
                    args_delay,
                    state,
                    out,
                );
            }
            (_, SemanticValue::String(s)) => {
                lead.push(Span::styled(format!("\"{}\"", s), theme.string_literal()));
                out.push(leaf(lead, depth, delay));
            }
            (_, other) => {
                let text = other.scalar_text().unwrap_or_default();
                lead.push(Span::styled(text, theme.literal()));
                out.push(leaf(lead, depth, delay));
            }
        }
    }
}

fn indent(depth: usize) -> Span<'static> {
    Span::raw("  ".repeat(depth))
}

fn marker(expanded: bool, theme: &PipelineTheme) -> Span<'static> {
    let glyph = if expanded {
        icons::EXPANDED
    } else {
        icons::COLLAPSED
    };
    Span::styled(format!("{} ", glyph), theme.dimmed())
}

fn plural(n: usize, one: &str, many: &str, open: char, close: char) -> String {
    let noun = if n == 1 { one } else { many };
    format!("{}{} {}{}", open, n, noun, close)
}

fn leaf(spans: Vec<Span<'static>>, depth: usize, delay: Duration) -> TreeRow {
    TreeRow {
        path: None,
        depth,
        line: Line::from(spans),
        reveal_after: delay,
    }
}

fn toggle_row(spans: Vec<Span<'static>>, path: &NodePath, depth: usize, delay: Duration) -> TreeRow {
    TreeRow {
        path: Some(path.clone()),
        depth,
        line: Line::from(spans),
        reveal_after: delay,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Widget
// ─────────────────────────────────────────────────────────────────────────────

/// Draws rendered rows with cursor highlight and entrance dimming
pub struct TreeView<'a> {
    rows: &'a [TreeRow],
    cursor: Option<usize>,
    elapsed: Duration,
    theme: &'a PipelineTheme,
}

impl<'a> TreeView<'a> {
    pub fn new(rows: &'a [TreeRow], theme: &'a PipelineTheme) -> Self {
        Self {
            rows,
            cursor: None,
            elapsed: Duration::MAX,
            theme,
        }
    }

    pub fn cursor(mut self, cursor: Option<usize>) -> Self {
        self.cursor = cursor;
        self
    }

    /// Time since the tree appeared (drives the staggered entrance)
    pub fn elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    pub fn lines(&self) -> Vec<Line<'static>> {
        self.rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let line = if row.reveal_after > self.elapsed {
                    Line::from(Span::styled(row.text(), self.theme.pending_entrance()))
                } else {
                    row.line.clone()
                };
                if self.cursor == Some(i) {
                    line.patch_style(self.theme.cursor())
                } else {
                    line
                }
            })
            .collect()
    }
}

impl Widget for TreeView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let height = area.height.max(1) as usize;
        let scroll = self
            .cursor
            .map(|c| c.saturating_sub(height - 1))
            .unwrap_or(0);
        Paragraph::new(self.lines())
            .scroll((scroll.min(u16::MAX as usize) as u16, 0))
            .render(area, buf);
    }
}
