//! Event Handling - Keyboard input processing

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use std::time::{Duration, Instant};

use super::state::{AppState, Focus};

/// Actions the app loop must carry out after a key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    /// Submit the selected question
    RunQuery,
    /// State changed, nothing else to do
    Handled,
    None,
}

/// Handle keyboard events
pub fn handle_key_event(key: KeyEvent, state: &mut AppState, now: Instant) -> Action {
    // Global keybindings (work in any state)
    match (key.modifiers, key.code) {
        // Quit: q or Ctrl+C
        (KeyModifiers::NONE, KeyCode::Char('q')) => return Action::Quit,
        (KeyModifiers::CONTROL, KeyCode::Char('c')) => return Action::Quit,

        // Help: F1 or ?
        (_, KeyCode::F(1)) | (_, KeyCode::Char('?')) => {
            state.show_help = !state.show_help;
            return Action::Handled;
        }

        // Esc closes help first, then the error banner
        (_, KeyCode::Esc) => {
            if state.show_help {
                state.show_help = false;
            } else {
                state.dismiss_error();
            }
            return Action::Handled;
        }

        (_, KeyCode::Tab) | (_, KeyCode::BackTab) => {
            state.focus = state.focus.next();
            return Action::Handled;
        }

        _ => {}
    }

    // Playback control
    match key.code {
        KeyCode::Left | KeyCode::Char('h') => state.playback.previous(),
        KeyCode::Right | KeyCode::Char('l') => state.playback.next(),
        KeyCode::Char(c @ '1'..='4') => {
            state.playback.jump_to(c as usize - '1' as usize);
        }
        KeyCode::Char(' ') | KeyCode::Char('p') => state.playback.toggle_play(now),
        KeyCode::Char('r') => state.playback.replay(now),
        KeyCode::Char('e') => state.playback.show_all(),
        KeyCode::Char('+') | KeyCode::Char('=') => state.speed_up(),
        KeyCode::Char('-') => state.slow_down(),

        // Questions
        KeyCode::Char('[') => state.select_prev_question(),
        KeyCode::Char(']') => state.select_next_question(),

        // Stage view
        KeyCode::Char('v') => state.cycle_view_mode(),
        KeyCode::Char('d') => state.show_raw_details = !state.show_raw_details,
        KeyCode::Up | KeyCode::Char('k') => state.move_tree_cursor(-1),
        KeyCode::Down | KeyCode::Char('j') => state.move_tree_cursor(1),

        KeyCode::Enter => {
            return match state.focus {
                Focus::Questions => Action::RunQuery,
                Focus::Stage => {
                    state.toggle_tree_node();
                    Action::Handled
                }
            };
        }

        _ => return Action::None,
    }

    state.drain_playback_events();
    Action::Handled
}

/// Poll for keyboard events with timeout
pub fn poll_event(timeout: Duration) -> std::io::Result<Option<KeyEvent>> {
    if event::poll(timeout)? {
        if let Event::Key(key) = event::read()? {
            return Ok(Some(key));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;
    use crate::pipeline::Stage;
    use crate::tui::runtime::RuntimeEvent;
    use crate::tui::state::ErrorBanner;

    fn press(state: &mut AppState, code: KeyCode) -> Action {
        handle_key_event(KeyEvent::new(code, KeyModifiers::NONE), state, Instant::now())
    }

    fn loaded_state() -> AppState {
        let now = Instant::now();
        let mut state = AppState::default();
        let (id, question) = state.begin_query(now).unwrap();
        state.apply_runtime_event(
            RuntimeEvent::QueryCompleted {
                request_id: id,
                result: MockBackend::demo_result(&question),
            },
            now,
        );
        state
    }

    #[test]
    fn test_quit_action() {
        let mut state = AppState::default();
        assert_eq!(press(&mut state, KeyCode::Char('q')), Action::Quit);
    }

    #[test]
    fn test_ctrl_c_quit() {
        let mut state = AppState::default();
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(handle_key_event(key, &mut state, Instant::now()), Action::Quit);
    }

    #[test]
    fn test_tab_cycles_focus() {
        let mut state = AppState::default();
        assert_eq!(state.focus, Focus::Questions);
        press(&mut state, KeyCode::Tab);
        assert_eq!(state.focus, Focus::Stage);
    }

    #[test]
    fn test_enter_runs_question_when_bar_focused() {
        let mut state = AppState::default();
        assert_eq!(press(&mut state, KeyCode::Enter), Action::RunQuery);
    }

    #[test]
    fn test_navigation_pauses_playback() {
        let mut state = loaded_state();
        assert!(state.playback.is_playing());
        press(&mut state, KeyCode::Right);
        assert!(!state.playback.is_playing());
        assert_eq!(state.current_stage(), Stage::Parse);
        press(&mut state, KeyCode::Char('4'));
        assert_eq!(state.current_stage(), Stage::LogicQuery);
        assert!(state.show_results);
    }

    #[test]
    fn test_space_toggles_play() {
        let mut state = loaded_state();
        press(&mut state, KeyCode::Char(' '));
        assert!(!state.playback.is_playing());
        press(&mut state, KeyCode::Char(' '));
        assert!(state.playback.is_playing());
    }

    #[test]
    fn test_esc_closes_help_then_error() {
        let mut state = AppState::default();
        state.error = Some(ErrorBanner {
            message: "HTTP 500".to_string(),
            hint: None,
        });
        assert!(state.show_help);
        press(&mut state, KeyCode::Esc);
        assert!(!state.show_help);
        assert!(state.error.is_some());
        press(&mut state, KeyCode::Esc);
        assert!(state.error.is_none());
    }

    #[test]
    fn test_unbound_key() {
        let mut state = AppState::default();
        assert_eq!(press(&mut state, KeyCode::Char('z')), Action::None);
    }
}
