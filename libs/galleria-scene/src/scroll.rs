use std::time::Duration;

use bevy::input::mouse::{MouseScrollUnit, MouseWheel};
use bevy::prelude::*;

/// Drift stays off until the user has been idle this long.
pub const DRIFT_IDLE: Duration = Duration::from_millis(100);
/// A user gesture counts as active until this long after its last event.
pub const USER_ACTIVE_DECAY: Duration = Duration::from_millis(150);
/// Pixel equivalent of one wheel line, for line-mode mice.
const LINE_SCROLL_PIXELS: f32 = 40.0;

/// The single scroll scalar fed by two writers: user gestures set it directly,
/// autonomous drift nudges it while the user is idle. The debounce timestamp
/// lives here, scoped to the scene, not on any global timer.
#[derive(Resource)]
pub struct ScrollState {
    pub position: f32,
    last_user_input: Option<Duration>,
    user_active: bool,
    pub drift_step: f32,
}

impl ScrollState {
    pub fn new(drift_step: f32) -> Self {
        Self {
            position: 0.0,
            last_user_input: None,
            user_active: false,
            drift_step,
        }
    }

    pub fn user_active(&self) -> bool {
        self.user_active
    }

    /// Applies a user scroll delta. Position mirrors a page scroll offset and
    /// never goes negative.
    pub fn user_scroll(&mut self, delta: f32, now: Duration) {
        self.position = (self.position + delta).max(0.0);
        self.user_active = true;
        self.last_user_input = Some(now);
    }

    /// Per-frame arbitration: decay the active flag once the gesture has gone
    /// quiet, then drift if the idle window has fully elapsed.
    pub fn tick(&mut self, now: Duration) {
        if self.user_active
            && let Some(last) = self.last_user_input
            && now.saturating_sub(last) >= USER_ACTIVE_DECAY
        {
            self.user_active = false;
        }
        if !self.user_active && self.idle_for(now) >= DRIFT_IDLE {
            self.position += self.drift_step;
        }
    }

    fn idle_for(&self, now: Duration) -> Duration {
        match self.last_user_input {
            Some(last) => now.saturating_sub(last),
            // No user event yet this scene: drift from the first frame.
            None => Duration::MAX,
        }
    }
}

/// Collects wheel and touch input into the scroll scalar. Runs first in the
/// per-tick chain so user input wins over drift within the same frame.
pub fn read_user_scroll(
    mut state: ResMut<ScrollState>,
    time: Res<Time>,
    mut wheel: EventReader<MouseWheel>,
    touches: Res<Touches>,
) {
    let mut delta = 0.0;
    for event in wheel.read() {
        let pixels = match event.unit {
            MouseScrollUnit::Line => event.y * LINE_SCROLL_PIXELS,
            MouseScrollUnit::Pixel => event.y,
        };
        // Wheel-down (negative y) scrolls the page down, advancing the tunnel.
        delta -= pixels;
    }
    for touch in touches.iter() {
        delta -= touch.delta().y;
    }
    if delta != 0.0 {
        state.user_scroll(delta, time.elapsed());
    }
}

pub fn apply_drift(mut state: ResMut<ScrollState>, time: Res<Time>) {
    state.tick(time.elapsed());
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: Duration = Duration::from_nanos(16_666_667); // 60 fps

    #[test]
    fn test_drift_only_advances_position() {
        let mut state = ScrollState::new(0.1);
        let mut now = Duration::ZERO;
        for _ in 0..600 {
            state.tick(now);
            now += FRAME;
        }
        // 10 simulated seconds of pure drift: 600 frames x 0.1.
        assert!((state.position - 60.0).abs() < 1e-3);
    }

    #[test]
    fn test_user_scroll_sets_position_and_suppresses_drift() {
        let mut state = ScrollState::new(0.1);
        let mut now = Duration::from_secs(1);
        state.tick(now);
        let drifted = state.position;
        assert!(drifted > 0.0);

        state.user_scroll(120.0, now);
        assert_eq!(state.position, drifted + 120.0);
        assert!(state.user_active());

        // Drift stays suppressed for the whole decay window (8 frames is
        // ~133ms: past the idle threshold but inside the decay window).
        let after_event = state.position;
        for _ in 0..8 {
            now += FRAME;
            state.tick(now);
        }
        assert_eq!(state.position, after_event);
        assert!(now - Duration::from_secs(1) >= DRIFT_IDLE);

        // Once the active flag decays, drift resumes seamlessly.
        now += FRAME;
        state.tick(now);
        assert!(!state.user_active());
        assert!(state.position > after_event);
    }

    #[test]
    fn test_position_clamped_at_zero() {
        let mut state = ScrollState::new(0.1);
        state.user_scroll(-500.0, Duration::ZERO);
        assert_eq!(state.position, 0.0);
    }

    #[test]
    fn test_repeated_events_rearm_decay() {
        let mut state = ScrollState::new(0.1);
        let mut now = Duration::ZERO;
        // Events every 100ms keep the gesture active even though each gap is
        // shorter than the decay window.
        for _ in 0..5 {
            state.user_scroll(10.0, now);
            now += Duration::from_millis(100);
            state.tick(now);
            assert!(state.user_active());
        }
    }
}
