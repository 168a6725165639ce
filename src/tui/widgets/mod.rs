//! TUI Widgets - UI Components
//!
//! Renderers turn a [`SemanticValue`](crate::value::SemanticValue) into
//! Ratatui lines; the widgets wrap those lines with borders, cursor and
//! scrolling. Business logic stays in the Domain Layer.

pub mod expr_view;
pub mod raw_view;
pub mod stage_view;
pub mod tree_view;

pub use expr_view::ExpressionRenderer;
pub use raw_view::raw_lines;
pub use stage_view::{available_modes, default_mode, StageRenderer, StageView, ViewMode};
pub use tree_view::{NodePath, TreeRenderer, TreeRow, TreeState, TreeView};

/// Common widget utilities
pub mod utils {
    use ratatui::text::Line;

    /// Format milliseconds as seconds, e.g. `2.5s`
    pub fn format_interval(ms: u64) -> String {
        if ms % 1000 == 0 {
            format!("{}s", ms / 1000)
        } else {
            format!("{:.1}s", ms as f64 / 1000.0)
        }
    }

    /// Truncate string with ellipsis (char-aware)
    pub fn truncate(s: &str, max_len: usize) -> String {
        let count = s.chars().count();
        if count <= max_len {
            s.to_string()
        } else if max_len <= 3 {
            s.chars().take(max_len).collect()
        } else {
            let head: String = s.chars().take(max_len - 3).collect();
            format!("{}...", head)
        }
    }

    /// Flatten styled lines into plain text, one line per row
    pub fn lines_to_text(lines: &[Line<'_>]) -> String {
        lines
            .iter()
            .map(|line| {
                line.spans
                    .iter()
                    .map(|span| span.content.as_ref())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::utils::*;
    use ratatui::text::{Line, Span};

    #[test]
    fn test_format_interval() {
        assert_eq!(format_interval(3000), "3s");
        assert_eq!(format_interval(2500), "2.5s");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 8), "hello...");
        assert_eq!(truncate("hi", 2), "hi");
        assert_eq!(truncate("Tiên Nữ trao", 7), "Tiên...");
    }

    #[test]
    fn test_lines_to_text() {
        let lines = vec![
            Line::from(vec![Span::raw("λ"), Span::raw("x.")]),
            Line::from("  body"),
        ];
        assert_eq!(lines_to_text(&lines), "λx.\n  body");
    }
}
