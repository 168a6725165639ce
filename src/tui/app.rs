//! TUI Application - Main entry point and run loop

use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::sync::mpsc;

use super::events::{handle_key_event, poll_event, Action};
use super::runtime::{BackendRuntime, RuntimeBridge, RuntimeEvent};
use super::state::{AppState, Focus, QueryStatus, COMPACT_WIDTH};
use super::theme::icons;
use super::widgets::utils::{format_interval, truncate};
use super::widgets::{raw_lines, StageView};
use crate::answer::Answer;
use crate::backend::Backend;
use crate::config::ViewerConfig;
use crate::pipeline::Stage;

/// Upper bound on a frame while nothing is scheduled (tree entrance, spinner)
const FRAME_INTERVAL: Duration = Duration::from_millis(50);

/// TUI Application
pub struct TuiApp {
    state: AppState,
    runtime: Box<dyn RuntimeBridge>,
    events: mpsc::UnboundedReceiver<RuntimeEvent>,
}

impl TuiApp {
    /// Create a new TUI application
    pub fn new(config: &ViewerConfig, backend: Arc<dyn Backend>) -> Self {
        let (runtime, events) = BackendRuntime::new(backend);
        Self {
            state: AppState::new(config),
            runtime: Box::new(runtime),
            events,
        }
    }

    /// Run the TUI application
    pub async fn run(mut self) -> anyhow::Result<()> {
        // Setup terminal
        let mut terminal = self.setup_terminal()?;

        tracing::info!(backend = self.runtime.name(), "Dashboard started");
        self.runtime.load_questions();

        // Main loop
        let result = self.main_loop(&mut terminal);

        // Tear down timers and in-flight calls before leaving the screen
        self.state.playback.cancel();
        self.runtime.shutdown();

        // Restore terminal
        self.restore_terminal(&mut terminal)?;

        result
    }

    /// Setup terminal for TUI
    fn setup_terminal(&self) -> anyhow::Result<Terminal<CrosstermBackend<Stdout>>> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(terminal)
    }

    /// Restore terminal to normal state
    fn restore_terminal(
        &self,
        terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    ) -> anyhow::Result<()> {
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;
        Ok(())
    }

    /// Main event loop
    fn main_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> anyhow::Result<()> {
        loop {
            let now = Instant::now();

            // Backend results
            while let Ok(event) = self.events.try_recv() {
                self.state.apply_runtime_event(event, now);
            }

            // Due playback timers
            self.state.tick(now);

            // Render
            terminal.draw(|frame| self.render(frame))?;

            // Never sleep past the next auto-advance
            let timeout = self
                .state
                .playback
                .next_deadline()
                .map(|d| d.saturating_duration_since(Instant::now()))
                .map_or(FRAME_INTERVAL, |left| left.min(FRAME_INTERVAL));

            if let Some(key) = poll_event(timeout)? {
                match handle_key_event(key, &mut self.state, Instant::now()) {
                    Action::Quit => self.state.should_quit = true,
                    Action::RunQuery => self.submit(),
                    Action::Handled | Action::None => {}
                }
            }

            if self.state.should_quit {
                break;
            }
        }

        Ok(())
    }

    fn submit(&mut self) {
        if let Some((request_id, question)) = self.state.begin_query(Instant::now()) {
            self.runtime.submit(request_id, question);
        }
    }

    /// Render the UI
    fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        let compact = area.width < COMPACT_WIDTH;

        // Main layout: Header, Question bar, Stage pills, Content, Footer
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Length(3), // Question bar
                Constraint::Length(1), // Stage pills
                Constraint::Min(8),    // Content
                Constraint::Length(1), // Footer
            ])
            .split(area);

        self.render_header(frame, main_chunks[0]);
        self.render_question_bar(frame, main_chunks[1]);
        self.render_pills(frame, main_chunks[2], compact);

        // Content: Stage panel | Answer + Details
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(main_chunks[3]);

        self.render_stage(frame, content_chunks[0], compact);

        let right_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(content_chunks[1]);

        self.render_answer(frame, right_chunks[0]);
        self.render_details(frame, right_chunks[1]);

        self.render_footer(frame, main_chunks[4]);

        if self.state.error.is_some() {
            self.render_error_banner(frame, main_chunks[3]);
        }
        if self.state.show_help {
            self.render_help(frame, area);
        }
    }

    /// Render header
    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let theme = &self.state.theme;
        let playback = &self.state.playback;

        let status_style = match self.state.status {
            QueryStatus::Loading => theme.warning(),
            QueryStatus::Ready => theme.success(),
            QueryStatus::Failed => theme.error(),
            QueryStatus::Idle => theme.dimmed(),
        };

        let play_icon = if playback.is_playing() {
            icons::PLAY
        } else {
            icons::PAUSE
        };

        let header = Line::from(vec![
            Span::styled(format!("{} PIPEVIZ", icons::LAMBDA), theme.header()),
            Span::raw("  │  "),
            Span::styled(self.runtime.name().to_string(), theme.accent()),
            Span::raw("  │  "),
            Span::styled(self.state.status.to_string(), status_style),
            Span::raw("  │  "),
            Span::styled(
                format!("Step {} / 4", playback.current_index() + 1),
                theme.text(),
            ),
            Span::raw("  │  "),
            Span::styled(
                format!("{} {}", play_icon, format_interval(playback.interval_ms())),
                theme.text(),
            ),
            Span::raw("  │  "),
            Span::styled("?:Help", theme.dimmed()),
        ]);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border(false))
            .title(" NLP PIPELINE ");

        frame.render_widget(Paragraph::new(header).block(block), area);
    }

    /// Render question selector
    fn render_question_bar(&self, frame: &mut Frame, area: Rect) {
        let theme = &self.state.theme;
        let focused = self.state.focus == Focus::Questions;
        let catalog = &self.state.catalog;

        let mut spans = Vec::new();
        match catalog.get(self.state.selected) {
            Some(entry) => {
                if let Some(group) = &entry.group {
                    spans.push(Span::styled(format!("{} › ", group), theme.dimmed()));
                }
                spans.push(Span::styled(entry.text.clone(), theme.text()));
            }
            None => spans.push(Span::styled("(No questions available)", theme.dimmed())),
        }

        let title = format!(
            " Question {}/{}  [ ] select · Enter run ",
            (self.state.selected + 1).min(catalog.len()),
            catalog.len()
        );
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border(focused))
            .title(title);

        frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
    }

    /// Render stage pills
    fn render_pills(&self, frame: &mut Frame, area: Rect, compact: bool) {
        let theme = &self.state.theme;
        let current = self.state.current_stage();

        let mut spans = vec![Span::raw(" ")];
        for (i, stage) in Stage::ALL.iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled(" → ", theme.dimmed()));
            }
            let title = if compact {
                stage.compact_title()
            } else {
                stage.title()
            };
            let has_data = self.state.stage_data(*stage).is_some();
            if *stage == current {
                spans.push(Span::styled(format!("[{}]", title), theme.highlight()));
            } else if self.state.is_visited(*stage) && has_data {
                spans.push(Span::styled(
                    format!("{} {}", icons::DONE, title),
                    theme.success(),
                ));
            } else {
                spans.push(Span::styled(title.to_string(), theme.dimmed()));
            }
        }

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    /// Render the current stage through the stage view
    fn render_stage(&self, frame: &mut Frame, area: Rect, compact: bool) {
        let state = &self.state;
        let stage = state.current_stage();
        let focused = state.focus == Focus::Stage;
        let renderer = state.stage_renderer();
        let rows = state.current_tree_rows();
        let tree = state.tree_state(stage);

        let view = StageView::new(stage, state.stage_data(stage).map(|d| d.as_ref()), &renderer)
            .mode(state.requested_mode(stage))
            .tree(
                &rows,
                focused.then(|| tree.cursor()),
                tree.elapsed(Instant::now()),
            )
            .focused(focused)
            .compact(compact);

        frame.render_widget(view, area);
    }

    /// Render answer panel
    fn render_answer(&self, frame: &mut Frame, area: Rect) {
        let theme = &self.state.theme;
        let mut title = " Answer ".to_string();

        let lines: Vec<Line> = if self.state.is_loading() {
            vec![Line::from(Span::styled(
                format!("{} Analyzing your question...", icons::PENDING),
                theme.warning(),
            ))]
        } else if let Some(answer) = self.state.visible_answer() {
            title = format!(" {} ", answer.title());
            let answer_style = match answer {
                Answer::YesNo(false) => theme.warning(),
                _ => theme.success(),
            };
            let mut lines = vec![
                Line::from(vec![
                    Span::styled("Question: ", theme.dimmed()),
                    Span::styled(self.state.question.clone(), theme.text()),
                ]),
                Line::from(""),
                Line::from(Span::styled(
                    format!("{} {}", icons::DONE, answer),
                    answer_style,
                )),
            ];
            if let Some(raw) = &self.state.pipeline.result_raw {
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled("Result:", theme.dimmed())));
                lines.push(Line::from(Span::styled(
                    truncate(&raw.to_compact_json(), 200),
                    theme.literal(),
                )));
            }
            lines
        } else if self.state.pipeline.has_data() {
            vec![Line::from(Span::styled(
                "The answer appears when the pipeline reaches step 4",
                theme.dimmed(),
            ))]
        } else {
            vec![Line::from(Span::styled(
                "Pick a question and press Enter",
                theme.dimmed(),
            ))]
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border(false))
            .title(title);

        frame.render_widget(
            Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
            area,
        );
    }

    /// Render technical details: every raw step in production order
    fn render_details(&self, frame: &mut Frame, area: Rect) {
        let theme = &self.state.theme;
        let steps = &self.state.steps;

        let mut lines = Vec::new();
        if steps.is_empty() {
            lines.push(Line::from(Span::styled("No steps yet", theme.dimmed())));
        }
        for (i, step) in steps.iter().enumerate() {
            lines.push(Line::from(vec![
                Span::styled(format!("{}. ", i + 1), theme.index_label()),
                Span::styled(step.name.clone(), theme.key_label()),
            ]));
            if self.state.show_raw_details {
                for mut line in raw_lines(&step.payload, theme) {
                    line.spans.insert(0, Span::raw("   "));
                    lines.push(line);
                }
            }
        }

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border(false))
            .title(format!(" Technical Details ({}) [d] raw ", steps.len()));

        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    /// Render the transport error over the top of the content
    fn render_error_banner(&self, frame: &mut Frame, content: Rect) {
        let Some(error) = &self.state.error else {
            return;
        };
        let theme = &self.state.theme;
        let height = if error.hint.is_some() { 4 } else { 3 };
        let area = Rect {
            height: height.min(content.height),
            ..content
        };

        let mut lines = vec![Line::from(vec![
            Span::styled(format!("{} ", icons::WARNING), theme.error()),
            Span::styled(error.message.clone(), theme.error()),
        ])];
        if let Some(hint) = &error.hint {
            lines.push(Line::from(Span::styled(
                format!("Fix: {}", hint),
                theme.warning(),
            )));
        }

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(theme.error())
            .title(" Error (Esc to dismiss) ");

        frame.render_widget(Clear, area);
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    /// Render key help overlay
    fn render_help(&self, frame: &mut Frame, area: Rect) {
        let theme = &self.state.theme;
        let bindings: &[(&str, &str)] = &[
            ("Enter", "run question / toggle tree node"),
            ("[  ]", "previous / next question"),
            ("Tab", "switch focus"),
            ("← →  h l", "previous / next stage"),
            ("1-4", "jump to stage"),
            ("Space p", "play / pause"),
            ("r", "replay from step 1"),
            ("e", "show all (jump to step 4)"),
            ("+  -", "faster / slower"),
            ("v", "switch view mode"),
            ("↑ ↓  k j", "move tree cursor"),
            ("d", "raw JSON in details"),
            ("Esc", "close help / dismiss error"),
            ("q", "quit"),
        ];

        let mut lines = vec![
            Line::from(Span::styled(
                "Watch a question travel through the pipeline:",
                theme.text(),
            )),
            Line::from(Span::styled(
                "words → grammar → meaning → answer",
                theme.accent(),
            )),
            Line::from(""),
        ];
        lines.extend(bindings.iter().map(|(key, what)| {
            Line::from(vec![
                Span::styled(format!("{:>10}  ", key), theme.highlight()),
                Span::styled(what.to_string(), theme.text()),
            ])
        }));

        let width = 56.min(area.width);
        let height = (lines.len() as u16 + 2).min(area.height);
        let popup = Rect {
            x: area.x + (area.width - width) / 2,
            y: area.y + (area.height - height) / 2,
            width,
            height,
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(theme.highlight())
            .title(" Help (? to close) ");

        frame.render_widget(Clear, popup);
        frame.render_widget(Paragraph::new(lines).block(block), popup);
    }

    /// Render footer
    fn render_footer(&self, frame: &mut Frame, area: Rect) {
        let theme = &self.state.theme;
        let help = Line::from(vec![
            Span::styled(" [q]", theme.accent()),
            Span::styled("uit  ", theme.dimmed()),
            Span::styled("[Space]", theme.accent()),
            Span::styled(" play  ", theme.dimmed()),
            Span::styled("[←→]", theme.accent()),
            Span::styled(" step  ", theme.dimmed()),
            Span::styled("[r]", theme.accent()),
            Span::styled("eplay  ", theme.dimmed()),
            Span::styled("[v]", theme.accent()),
            Span::styled("iew  ", theme.dimmed()),
            Span::styled("[+-]", theme.accent()),
            Span::styled(" speed  ", theme.dimmed()),
            Span::styled("[Tab]", theme.accent()),
            Span::styled(" focus  ", theme.dimmed()),
            Span::styled("[?]", theme.accent()),
            Span::styled(" help", theme.dimmed()),
        ]);

        frame.render_widget(Paragraph::new(help), area);
    }
}
