//! Expression View - logical notation for functor trees
//!
//! Renders `{functor, args}` trees as lambda-calculus / DRS notation:
//!
//! ```text
//! λx.
//!   ∃
//!     y
//!     (dog(y) @ x)
//! ┌ DRS
//! │ referents: x1, x2
//! │ conditions:
//! │   dog(x1)
//! └
//! ```
//!
//! Output is built as a list of lines of spans. Inline composition joins the
//! last line of the left part with the first line of the right part, so
//! multi-line arguments still nest sensibly inside `f(...)`.

use ratatui::text::{Line, Span};

use crate::tui::theme::{icons, PipelineTheme};
use crate::tui::widgets::tree_view::DEFAULT_MAX_RENDER_DEPTH;
use crate::value::{FunctorNode, SemanticValue};

type Block = Vec<Vec<Span<'static>>>;

/// Specialized renderer for functor-node trees
pub struct ExpressionRenderer<'t> {
    theme: &'t PipelineTheme,
    max_depth: usize,
}

impl<'t> ExpressionRenderer<'t> {
    pub fn new(theme: &'t PipelineTheme) -> Self {
        Self {
            theme,
            max_depth: DEFAULT_MAX_RENDER_DEPTH,
        }
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Render a top-level value.
    ///
    /// A list holding any structured element is rendered as a sequence of
    /// expressions (blank line between them), each unwrapped from its
    /// envelope on its own. Anything else is unwrapped once and rendered.
    pub fn render(&self, value: &SemanticValue) -> Vec<Line<'static>> {
        let block = match value {
            SemanticValue::List(items) if items.iter().any(|v| !is_plain_scalar(v)) => {
                let mut out = Block::new();
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(Vec::new());
                    }
                    out.extend(self.expr(item.unwrap_envelope(), 0));
                }
                out
            }
            other => self.expr(other.unwrap_envelope(), 0),
        };
        block.into_iter().map(Line::from).collect()
    }

    fn expr(&self, value: &SemanticValue, depth: usize) -> Block {
        if depth > self.max_depth {
            return inline(vec![Span::styled(icons::ELLIPSIS, self.theme.dimmed())]);
        }
        match value {
            SemanticValue::Functor(node) => self.functor(node, depth),
            SemanticValue::String(s) => inline(vec![Span::styled(s.clone(), self.theme.atom())]),
            SemanticValue::List(items) => self.stacked(items, depth),
            SemanticValue::Record(_) => {
                inline(vec![Span::styled(value.to_compact_json(), self.theme.text())])
            }
            other => inline(vec![Span::styled(
                other.scalar_text().unwrap_or_default(),
                self.theme.literal(),
            )]),
        }
    }

    /// Elements one per line; `[]` when empty
    fn stacked(&self, items: &[SemanticValue], depth: usize) -> Block {
        if items.is_empty() {
            return inline(vec![Span::styled("[]", self.theme.dimmed())]);
        }
        items
            .iter()
            .flat_map(|item| self.expr(item, depth + 1))
            .collect()
    }

    fn functor(&self, node: &FunctorNode, depth: usize) -> Block {
        let args = node.arg_slice();
        match node.name() {
            "drs" => self.drs(args, depth),
            "lambda" => self.lambda(args, depth),
            "@" => self.application(args, depth),
            "," => self.conjunction(args, depth),
            "x" => self.exists(args, depth),
            name => self.generic(name, args, depth),
        }
    }

    fn drs(&self, args: &[SemanticValue], depth: usize) -> Block {
        let theme = self.theme;
        let referents = args.first().and_then(SemanticValue::as_list).unwrap_or(&[]);
        let conditions = args.get(1).and_then(SemanticValue::as_list).unwrap_or(&[]);
        let side = || Span::styled(format!("{} ", icons::DRS_SIDE), theme.drs_frame());

        let mut out: Block = vec![vec![
            Span::styled(format!("{} ", icons::DRS_TOP), theme.drs_frame()),
            Span::styled("DRS", theme.drs_label()),
        ]];

        if !referents.is_empty() {
            let parts: Vec<Block> = referents.iter().map(|r| self.expr(r, depth + 1)).collect();
            let list = join(parts, Span::styled(", ", theme.punctuation()));
            let head = inline(vec![side(), Span::styled("referents: ", theme.drs_label())]);
            out.extend(prefix_rest(concat(head, list), side));
        }

        if !conditions.is_empty() {
            out.push(vec![side(), Span::styled("conditions:", theme.drs_label())]);
            for condition in conditions {
                for mut line in indent(self.expr(condition, depth + 1), 2) {
                    line.insert(0, side());
                    out.push(line);
                }
            }
        }

        out.push(vec![Span::styled(icons::DRS_BOTTOM, theme.drs_frame())]);
        out
    }

    fn lambda(&self, args: &[SemanticValue], depth: usize) -> Block {
        let theme = self.theme;
        let mut head = vec![Span::styled(icons::LAMBDA, theme.lambda())];
        if let Some(var) = args.first() {
            head.push(Span::styled(
                var.as_str().unwrap_or("?").to_string(),
                theme.text(),
            ));
            head.push(Span::styled(".", theme.punctuation()));
        }
        let mut out = inline(head);
        if let Some(body) = args.get(1) {
            out.extend(indent(self.expr(body, depth + 1), 2));
        }
        out
    }

    fn application(&self, args: &[SemanticValue], depth: usize) -> Block {
        let theme = self.theme;
        let parts: Vec<Block> = args.iter().map(|a| self.expr(a, depth + 1)).collect();
        let body = join(parts, Span::styled(" @ ", theme.punctuation()));
        let open = inline(vec![Span::styled("(", theme.punctuation())]);
        let close = inline(vec![Span::styled(")", theme.punctuation())]);
        concat(concat(open, body), close)
    }

    /// Only pairs are rendered; other arities produce nothing.
    fn conjunction(&self, args: &[SemanticValue], depth: usize) -> Block {
        let [left, right] = args else {
            return Block::new();
        };
        let left = self.expr(left, depth + 1);
        let right = self.expr(right, depth + 1);
        join(
            vec![left, right],
            Span::styled(", ", self.theme.connective()),
        )
    }

    fn exists(&self, args: &[SemanticValue], depth: usize) -> Block {
        let mut out = inline(vec![Span::styled(icons::EXISTS, self.theme.connective())]);
        for arg in args {
            out.extend(indent(self.expr(arg, depth + 1), 2));
        }
        out
    }

    fn generic(&self, name: &str, args: &[SemanticValue], depth: usize) -> Block {
        let theme = self.theme;
        let head = inline(vec![Span::styled(name.to_string(), theme.functor_name())]);
        if args.is_empty() {
            return head;
        }
        let parts: Vec<Block> = args.iter().map(|a| self.expr(a, depth + 1)).collect();
        let body = join(parts, Span::styled(", ", theme.punctuation()));
        let open = inline(vec![Span::styled("(", theme.punctuation())]);
        let close = inline(vec![Span::styled(")", theme.punctuation())]);
        concat(concat(concat(head, open), body), close)
    }
}

fn is_plain_scalar(value: &SemanticValue) -> bool {
    matches!(
        value,
        SemanticValue::Bool(_) | SemanticValue::Number(_) | SemanticValue::String(_)
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Block composition
// ─────────────────────────────────────────────────────────────────────────────

fn inline(spans: Vec<Span<'static>>) -> Block {
    vec![spans]
}

/// Glue `right` onto the end of `left`
fn concat(mut left: Block, right: Block) -> Block {
    let mut right = right.into_iter();
    match (left.last_mut(), right.next()) {
        (Some(last), Some(first)) => last.extend(first),
        (None, Some(first)) => left.push(first),
        _ => {}
    }
    left.extend(right);
    left
}

/// Inline join with a separator span
fn join(parts: Vec<Block>, separator: Span<'static>) -> Block {
    let mut out = Block::new();
    for (i, part) in parts.into_iter().enumerate() {
        if i > 0 {
            out = concat(out, inline(vec![separator.clone()]));
        }
        out = concat(out, part);
    }
    out
}

fn indent(block: Block, width: usize) -> Block {
    block
        .into_iter()
        .map(|mut line| {
            line.insert(0, Span::raw(" ".repeat(width)));
            line
        })
        .collect()
}

/// Prefix every line after the first with a fresh span
fn prefix_rest(block: Block, prefix: impl Fn() -> Span<'static>) -> Block {
    block
        .into_iter()
        .enumerate()
        .map(|(i, mut line)| {
            if i > 0 {
                line.insert(0, prefix());
            }
            line
        })
        .collect()
}
