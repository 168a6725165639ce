//! Pipeline Theme - Visual Design System
//!
//! Violet/indigo accents with pink for logical connectives. All colors and
//! glyphs used by the renderers live here.

use ratatui::style::{Color, Modifier, Style};

/// Color palette
#[derive(Debug, Clone)]
pub struct PipelineTheme {
    // Accents
    pub violet: Color,
    pub indigo: Color,
    pub pink: Color,

    // Status colors
    pub success_green: Color,
    pub warning_amber: Color,
    pub error_red: Color,
    pub info_blue: Color,

    // Neutrals
    pub text_white: Color,
    pub neutral_400: Color,
    pub neutral_500: Color,
    pub neutral_700: Color,
}

impl Default for PipelineTheme {
    fn default() -> Self {
        Self {
            violet: Color::Rgb(124, 58, 237),  // #7C3AED
            indigo: Color::Rgb(79, 70, 229),   // #4F46E5
            pink: Color::Rgb(236, 72, 153),    // #EC4899

            success_green: Color::Rgb(16, 185, 129), // #10B981
            warning_amber: Color::Rgb(245, 158, 11), // #F59E0B
            error_red: Color::Rgb(239, 68, 68),      // #EF4444
            info_blue: Color::Rgb(59, 130, 246),     // #3B82F6

            text_white: Color::Rgb(229, 229, 229),
            neutral_400: Color::Rgb(163, 163, 163),
            neutral_500: Color::Rgb(115, 115, 115),
            neutral_700: Color::Rgb(64, 64, 64),
        }
    }
}

impl PipelineTheme {
    pub fn new() -> Self {
        Self::default()
    }

    // ─────────────────────────────────────────────────────────────────────
    // General styles
    // ─────────────────────────────────────────────────────────────────────

    pub fn text(&self) -> Style {
        Style::default().fg(self.text_white)
    }

    pub fn dimmed(&self) -> Style {
        Style::default().fg(self.neutral_500)
    }

    pub fn header(&self) -> Style {
        Style::default().fg(self.violet).add_modifier(Modifier::BOLD)
    }

    pub fn accent(&self) -> Style {
        Style::default().fg(self.pink)
    }

    pub fn highlight(&self) -> Style {
        Style::default().fg(self.info_blue).add_modifier(Modifier::BOLD)
    }

    pub fn success(&self) -> Style {
        Style::default().fg(self.success_green)
    }

    pub fn warning(&self) -> Style {
        Style::default().fg(self.warning_amber)
    }

    pub fn error(&self) -> Style {
        Style::default().fg(self.error_red).add_modifier(Modifier::BOLD)
    }

    pub fn border(&self, focused: bool) -> Style {
        if focused {
            self.highlight()
        } else {
            self.dimmed()
        }
    }

    /// Row under the tree cursor
    pub fn cursor(&self) -> Style {
        Style::default().add_modifier(Modifier::REVERSED)
    }

    /// Rows that have not made their entrance yet
    pub fn pending_entrance(&self) -> Style {
        Style::default().fg(self.neutral_700)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Tree renderer
    // ─────────────────────────────────────────────────────────────────────

    pub fn string_literal(&self) -> Style {
        Style::default().fg(self.success_green)
    }

    pub fn literal(&self) -> Style {
        Style::default().fg(self.info_blue)
    }

    pub fn null_marker(&self) -> Style {
        Style::default()
            .fg(self.neutral_500)
            .add_modifier(Modifier::ITALIC)
    }

    pub fn index_label(&self) -> Style {
        Style::default().fg(self.neutral_400)
    }

    pub fn key_label(&self) -> Style {
        Style::default().fg(self.pink).add_modifier(Modifier::BOLD)
    }

    pub fn collection_header(&self) -> Style {
        Style::default()
            .fg(self.neutral_400)
            .add_modifier(Modifier::BOLD)
    }

    pub fn functor_name(&self) -> Style {
        Style::default().fg(self.violet).add_modifier(Modifier::BOLD)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Expression renderer
    // ─────────────────────────────────────────────────────────────────────

    pub fn atom(&self) -> Style {
        Style::default().fg(self.violet).add_modifier(Modifier::BOLD)
    }

    pub fn lambda(&self) -> Style {
        Style::default().fg(self.indigo).add_modifier(Modifier::BOLD)
    }

    pub fn connective(&self) -> Style {
        Style::default().fg(self.pink).add_modifier(Modifier::BOLD)
    }

    pub fn punctuation(&self) -> Style {
        Style::default().fg(self.neutral_500)
    }

    pub fn drs_frame(&self) -> Style {
        Style::default().fg(self.indigo)
    }

    pub fn drs_label(&self) -> Style {
        Style::default()
            .fg(self.neutral_400)
            .add_modifier(Modifier::BOLD)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Icons and Symbols
// ─────────────────────────────────────────────────────────────────────────────

/// Glyphs used throughout the TUI and the text renderers
pub mod icons {
    pub const EXPANDED: &str = "▼";
    pub const COLLAPSED: &str = "▶";
    pub const ELLIPSIS: &str = "…";

    pub const LAMBDA: &str = "λ";
    pub const EXISTS: &str = "∃";

    pub const DRS_TOP: &str = "┌";
    pub const DRS_SIDE: &str = "│";
    pub const DRS_BOTTOM: &str = "└";

    pub const PLAY: &str = "▶";
    pub const PAUSE: &str = "⏸";
    pub const DONE: &str = "✓";
    pub const WARNING: &str = "⚠";
    pub const PENDING: &str = "⏳";
}
