//! Playback controller - step sequencing over a pipeline view
//!
//! A small state machine: current stage index (0..=3) × playing/paused,
//! plus the auto-advance interval and at most one pending timer.
//!
//! The timer is plain data (a deadline) owned by the controller. The event
//! loop asks for [`PlaybackController::next_deadline`] to size its poll
//! timeout and calls [`PlaybackController::tick`] when it wakes up. Every
//! transition that touches the timer replaces it (cancel, then set), so a
//! timer that belonged to a previous pipeline can never fire.
//!
//! Notifications are queued and drained with
//! [`PlaybackController::take_events`].

use std::time::{Duration, Instant};

use crate::pipeline::{PipelineView, LAST_STAGE};

/// Default auto-advance interval
pub const DEFAULT_INTERVAL_MS: u64 = 3000;
/// Slowest and fastest accepted intervals
pub const MIN_INTERVAL_MS: u64 = 1000;
pub const MAX_INTERVAL_MS: u64 = 10_000;

/// Clamp a requested interval into the accepted range
pub fn clamp_interval_ms(ms: u64) -> u64 {
    ms.clamp(MIN_INTERVAL_MS, MAX_INTERVAL_MS)
}

/// The single pending auto-advance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerHandle {
    pub id: u64,
    pub deadline: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// Current stage changed
    StepChanged { from: usize, to: usize, auto: bool },
    /// Last stage reached; at most once per pipeline identity
    Completed,
}

#[derive(Debug)]
pub struct PlaybackController {
    index: usize,
    playing: bool,
    interval: Duration,
    pending: Option<TimerHandle>,
    next_timer_id: u64,
    view: PipelineView,
    completion_fired: bool,
    events: Vec<PlaybackEvent>,
}

impl Default for PlaybackController {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL_MS)
    }
}

impl PlaybackController {
    /// Index 0, paused, no pipeline.
    pub fn new(interval_ms: u64) -> Self {
        Self {
            index: 0,
            playing: false,
            interval: Duration::from_millis(clamp_interval_ms(interval_ms)),
            pending: None,
            next_timer_id: 0,
            view: PipelineView::default(),
            completion_fired: false,
            events: Vec::new(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────

    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval.as_millis() as u64
    }

    pub fn pending_timer(&self) -> Option<TimerHandle> {
        self.pending
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.map(|t| t.deadline)
    }

    pub fn completion_fired(&self) -> bool {
        self.completion_fired
    }

    pub fn is_at_end(&self) -> bool {
        self.index == LAST_STAGE
    }

    pub fn view(&self) -> &PipelineView {
        &self.view
    }

    /// Drain queued notifications
    pub fn take_events(&mut self) -> Vec<PlaybackEvent> {
        std::mem::take(&mut self.events)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Transitions
    // ─────────────────────────────────────────────────────────────────────

    /// Observe a (possibly new) pipeline view.
    ///
    /// Same identity: nothing happens. New identity: the pending timer is
    /// dropped, the index goes back to 0 and playback restarts only when the
    /// new view has data. Returns whether a reset happened.
    pub fn load(&mut self, view: &PipelineView, now: Instant) -> bool {
        if self.view.same_identity(view) {
            return false;
        }
        self.cancel_timer();
        let from = self.index;
        self.view = view.clone();
        self.index = 0;
        self.completion_fired = false;
        self.playing = self.view.has_data();
        if from != 0 {
            self.events.push(PlaybackEvent::StepChanged {
                from,
                to: 0,
                auto: false,
            });
        }
        tracing::debug!(
            playing = self.playing,
            filled = self.view.filled_stages(),
            "Playback reset for new pipeline"
        );
        self.reschedule(now);
        true
    }

    /// Pause and step forward (stops at the last stage)
    pub fn next(&mut self) {
        self.pause();
        self.move_to((self.index + 1).min(LAST_STAGE), false);
    }

    /// Pause and step back (stops at the first stage)
    pub fn previous(&mut self) {
        self.pause();
        self.move_to(self.index.saturating_sub(1), false);
    }

    /// Pause and jump to `index` (clamped)
    pub fn jump_to(&mut self, index: usize) {
        self.pause();
        self.move_to(index.min(LAST_STAGE), false);
    }

    /// Jump straight to the last stage
    pub fn show_all(&mut self) {
        self.jump_to(LAST_STAGE);
    }

    /// Flip play/pause. The index is untouched.
    pub fn toggle_play(&mut self, now: Instant) {
        self.playing = !self.playing;
        tracing::debug!(playing = self.playing, index = self.index, "Toggled playback");
        self.reschedule(now);
    }

    /// Back to the first stage and play again
    pub fn replay(&mut self, now: Instant) {
        self.move_to(0, false);
        self.playing = true;
        self.reschedule(now);
    }

    /// Change the interval used for later advances. An already scheduled
    /// advance keeps its deadline.
    pub fn set_speed(&mut self, interval_ms: u64) {
        self.interval = Duration::from_millis(clamp_interval_ms(interval_ms));
        tracing::debug!(interval_ms = self.interval_ms(), "Playback speed changed");
    }

    /// Fire the pending timer if it is due.
    pub fn tick(&mut self, now: Instant) {
        let Some(timer) = self.pending else {
            return;
        };
        if now < timer.deadline {
            return;
        }
        self.pending = None;
        if self.index < LAST_STAGE {
            self.move_to(self.index + 1, true);
        }
        self.reschedule(now);
    }

    /// Drop the pending timer and pause (view tear-down)
    pub fn cancel(&mut self) {
        self.pause();
    }

    // ─────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────

    fn pause(&mut self) {
        self.playing = false;
        self.cancel_timer();
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.pending.take() {
            tracing::trace!(timer_id = timer.id, "Cancelled playback timer");
        }
    }

    /// Replace the pending timer according to the current state.
    fn reschedule(&mut self, now: Instant) {
        self.cancel_timer();
        if self.playing && self.index < LAST_STAGE && self.view.has_data() {
            self.next_timer_id += 1;
            self.pending = Some(TimerHandle {
                id: self.next_timer_id,
                deadline: now + self.interval,
            });
        }
    }

    fn move_to(&mut self, to: usize, auto: bool) {
        let from = self.index;
        self.index = to;
        if from != to {
            self.events.push(PlaybackEvent::StepChanged { from, to, auto });
        }
        if to == LAST_STAGE && !self.completion_fired {
            self.completion_fired = true;
            self.events.push(PlaybackEvent::Completed);
            tracing::debug!("Playback reached last stage");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::RawStep;
    use crate::value::SemanticValue;

    fn view_with_tokens() -> PipelineView {
        PipelineView::build(&[RawStep::new("tokens", SemanticValue::string("a"))])
    }

    fn completions(events: &[PlaybackEvent]) -> usize {
        events
            .iter()
            .filter(|e| **e == PlaybackEvent::Completed)
            .count()
    }

    #[test]
    fn test_initial_state() {
        let c = PlaybackController::default();
        assert_eq!(c.current_index(), 0);
        assert!(!c.is_playing());
        assert_eq!(c.interval_ms(), DEFAULT_INTERVAL_MS);
        assert!(c.pending_timer().is_none());
    }

    #[test]
    fn test_load_with_data_starts_playing() {
        let now = Instant::now();
        let mut c = PlaybackController::default();
        assert!(c.load(&view_with_tokens(), now));
        assert!(c.is_playing());
        assert_eq!(c.next_deadline(), Some(now + c.interval()));
    }

    #[test]
    fn test_empty_view_stays_idle() {
        let now = Instant::now();
        let mut c = PlaybackController::default();
        c.toggle_play(now);
        assert!(c.is_playing());
        assert!(c.pending_timer().is_none());
        c.tick(now + Duration::from_secs(60));
        assert_eq!(c.current_index(), 0);
    }

    #[test]
    fn test_manual_navigation_pauses() {
        let now = Instant::now();
        let mut c = PlaybackController::default();
        c.load(&view_with_tokens(), now);
        c.next();
        assert!(!c.is_playing());
        assert!(c.pending_timer().is_none());
        assert_eq!(c.current_index(), 1);
        c.previous();
        c.previous();
        assert_eq!(c.current_index(), 0);
    }

    #[test]
    fn test_jump_clamps_and_completes_once() {
        let mut c = PlaybackController::default();
        c.load(&view_with_tokens(), Instant::now());
        c.take_events();
        c.jump_to(42);
        assert_eq!(c.current_index(), LAST_STAGE);
        c.jump_to(0);
        c.jump_to(LAST_STAGE);
        assert_eq!(completions(&c.take_events()), 1);
    }

    #[test]
    fn test_speed_change_keeps_pending_deadline() {
        let now = Instant::now();
        let mut c = PlaybackController::new(2000);
        c.load(&view_with_tokens(), now);
        let before = c.next_deadline();
        c.set_speed(5000);
        assert_eq!(c.next_deadline(), before);
        c.tick(now + Duration::from_millis(2000));
        assert_eq!(c.current_index(), 1);
        assert_eq!(
            c.next_deadline(),
            Some(now + Duration::from_millis(2000) + Duration::from_millis(5000))
        );
    }

    #[test]
    fn test_speed_is_clamped() {
        let mut c = PlaybackController::default();
        c.set_speed(10);
        assert_eq!(c.interval_ms(), MIN_INTERVAL_MS);
        c.set_speed(1_000_000);
        assert_eq!(c.interval_ms(), MAX_INTERVAL_MS);
    }

    #[test]
    fn test_replay_restarts_from_zero() {
        let now = Instant::now();
        let mut c = PlaybackController::default();
        c.load(&view_with_tokens(), now);
        c.show_all();
        c.replay(now);
        assert_eq!(c.current_index(), 0);
        assert!(c.is_playing());
        assert!(c.pending_timer().is_some());
    }

    #[test]
    fn test_cancel_drops_timer() {
        let now = Instant::now();
        let mut c = PlaybackController::default();
        c.load(&view_with_tokens(), now);
        c.cancel();
        c.tick(now + Duration::from_secs(60));
        assert_eq!(c.current_index(), 0);
    }
}
