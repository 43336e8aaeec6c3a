//! Swipe Tracker - Core session reducer for directional gesture detection
//!
//! Accumulates relative X/Y motion per device session and fires exactly one
//! directional action once the dominant axis crosses the configured threshold.
//! The reducer is synchronous and total: it never blocks, never suspends and
//! has no error path. Serialization of calls against one tracker is the
//! caller's responsibility (one engine task per device).

use std::time::{Duration, Instant};
use tracing::debug;

use crate::gesture::action::ActionBindings;
use crate::gesture::Direction;
use crate::input::event_collector::{MotionAxis, RawEventKind, RawInputEvent};

/// Configuration for one swipe tracker instance
///
/// One configuration belongs to exactly one physical input device. The caller
/// constructs the (configuration, state) pair explicitly; there is no global
/// instance registry.
///
/// # Tuning Impact
///
/// - `threshold`: Lower values make gestures easier to trigger but increase
///   false positives from sensor jitter. Units match the raw motion deltas.
/// - `timeout`: Maximum age of a session before a new event restarts it.
///   Values well above 500ms make slow drift accumulate into phantom swipes.
///
/// # Examples
///
/// ```rust
/// use std::time::{Duration, Instant};
/// use chrono::Local;
/// use trackswipe::gesture::tracker::{SwipeTracker, TrackerConfig};
/// use trackswipe::gesture::{ActionBindings, Direction};
/// use trackswipe::input::event_collector::{MotionAxis, RawEventKind, RawInputEvent};
///
/// let config = TrackerConfig {
///     threshold: 50,
///     timeout: Duration::from_millis(300),
///     bindings: ActionBindings::default(),
/// };
/// let mut tracker = SwipeTracker::new(config);
///
/// let event = RawInputEvent {
///     device: "trackball".to_string(),
///     kind: RawEventKind::Motion {
///         axis: MotionAxis::X,
///         delta: 60,
///     },
///     timestamp: Local::now(),
/// };
///
/// assert_eq!(tracker.process(&event, Instant::now()), Some(Direction::Right));
/// ```
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Minimum accumulated absolute displacement on the dominant axis
    /// required to fire a gesture. Must be positive; validated at
    /// configuration time, never re-checked here.
    pub threshold: i32,

    /// Maximum gap between session start and the current event before the
    /// session is considered stale and restarted. Must be non-zero.
    pub timeout: Duration,

    /// The four optional directional actions. An unbound direction fires
    /// nothing but still closes the session.
    pub bindings: ActionBindings,
}

/// Mutable session state, owned exclusively by one tracker
///
/// Accumulators are reset exactly when a new session starts; `started_at` is
/// written once per session and never mutated mid-session.
#[derive(Debug, Clone, Default)]
struct SessionState {
    sum_x: i32,
    sum_y: i32,
    started_at: Option<Instant>,
    active: bool,
}

/// The (configuration, state) pair for one physical input device
#[derive(Debug)]
pub struct SwipeTracker {
    config: TrackerConfig,
    state: SessionState,
}

impl SwipeTracker {
    /// Creates a tracker with an idle session
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            state: SessionState::default(),
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Whether a session is currently accumulating motion
    pub fn is_active(&self) -> bool {
        self.state.active
    }

    /// Feeds one raw input event into the session reducer
    ///
    /// Non-motion events are ignored and leave the state untouched. A stale
    /// or missing session is restarted before the current delta is applied,
    /// so the current event is the first contribution to the new session.
    ///
    /// Returns the fired direction if the accumulated motion crossed the
    /// threshold with this event. The bound action (if any) has already been
    /// invoked with a press/release pair by the time this returns; the
    /// return value exists for observability and testing.
    pub fn process(&mut self, event: &RawInputEvent, now: Instant) -> Option<Direction> {
        let (axis, delta) = match event.kind {
            RawEventKind::Motion { axis, delta } => (axis, delta),
            _ => return None,
        };

        let expired = match self.state.started_at {
            Some(started) => now.duration_since(started) > self.config.timeout,
            None => true,
        };

        if !self.state.active || expired {
            self.state.active = true;
            self.state.started_at = Some(now);
            self.state.sum_x = 0;
            self.state.sum_y = 0;
        }

        match axis {
            MotionAxis::X => self.state.sum_x = self.state.sum_x.saturating_add(delta),
            MotionAxis::Y => self.state.sum_y = self.state.sum_y.saturating_add(delta),
        }

        let ax = self.state.sum_x.abs();
        let ay = self.state.sum_y.abs();

        if ax < self.config.threshold && ay < self.config.threshold {
            return None;
        }

        let direction = resolve_direction(self.state.sum_x, self.state.sum_y);
        debug!(
            "Threshold crossed on {}: sum_x={}, sum_y={} -> {}",
            event.device, self.state.sum_x, self.state.sum_y, direction
        );

        if let Some(action) = self.config.bindings.get(direction) {
            action.invoke(true);
            action.invoke(false);
        }

        // Accumulators stay as-is; the next event restarts the session anyway.
        self.state.active = false;
        Some(direction)
    }
}

/// Dominant-axis tie-break: ties resolve horizontal, a zero sum on the
/// dominant axis resolves to the negative direction (Left/Up).
fn resolve_direction(sum_x: i32, sum_y: i32) -> Direction {
    if sum_x.abs() >= sum_y.abs() {
        if sum_x > 0 {
            Direction::Right
        } else {
            Direction::Left
        }
    } else if sum_y > 0 {
        Direction::Down
    } else {
        Direction::Up
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::action::SwipeAction;
    use chrono::Local;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct RecordingAction {
        calls: Mutex<Vec<bool>>,
    }

    impl RecordingAction {
        fn calls(&self) -> Vec<bool> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl SwipeAction for RecordingAction {
        fn invoke(&self, pressed: bool) {
            self.calls.lock().unwrap().push(pressed);
        }

        fn label(&self) -> String {
            "recording".to_string()
        }
    }

    fn motion(axis: MotionAxis, delta: i32) -> RawInputEvent {
        RawInputEvent {
            device: "trackball".to_string(),
            kind: RawEventKind::Motion { axis, delta },
            timestamp: Local::now(),
        }
    }

    fn wheel(delta: i32) -> RawInputEvent {
        RawInputEvent {
            device: "trackball".to_string(),
            kind: RawEventKind::Wheel { delta },
            timestamp: Local::now(),
        }
    }

    fn recording_tracker() -> (SwipeTracker, [Arc<RecordingAction>; 4]) {
        let up = Arc::new(RecordingAction::default());
        let down = Arc::new(RecordingAction::default());
        let left = Arc::new(RecordingAction::default());
        let right = Arc::new(RecordingAction::default());

        let config = TrackerConfig {
            threshold: 50,
            timeout: Duration::from_millis(300),
            bindings: ActionBindings {
                up: Some(up.clone()),
                down: Some(down.clone()),
                left: Some(left.clone()),
                right: Some(right.clone()),
            },
        };

        (SwipeTracker::new(config), [up, down, left, right])
    }

    #[test]
    fn below_threshold_never_invokes_actions() {
        let (mut tracker, actions) = recording_tracker();
        let t0 = Instant::now();

        assert_eq!(tracker.process(&motion(MotionAxis::X, 20), t0), None);
        assert_eq!(
            tracker.process(&motion(MotionAxis::X, 20), t0 + Duration::from_millis(10)),
            None
        );
        assert_eq!(
            tracker.process(&motion(MotionAxis::Y, -20), t0 + Duration::from_millis(20)),
            None
        );

        assert!(tracker.is_active());
        for action in &actions {
            assert!(action.calls().is_empty());
        }
    }

    #[test]
    fn accumulated_motion_fires_right_with_press_release_pair() {
        let (mut tracker, actions) = recording_tracker();
        let t0 = Instant::now();

        assert_eq!(tracker.process(&motion(MotionAxis::X, 20), t0), None);
        let fired = tracker.process(&motion(MotionAxis::X, 40), t0 + Duration::from_millis(10));

        assert_eq!(fired, Some(Direction::Right));
        assert!(!tracker.is_active());

        let [up, down, left, right] = actions;
        assert_eq!(right.calls(), vec![true, false]);
        assert!(up.calls().is_empty());
        assert!(down.calls().is_empty());
        assert!(left.calls().is_empty());
    }

    #[test]
    fn stale_session_resets_before_applying_delta() {
        let (mut tracker, actions) = recording_tracker();
        let t0 = Instant::now();

        assert_eq!(tracker.process(&motion(MotionAxis::X, 30), t0), None);
        // Gap above the 300ms timeout: the second event starts a fresh
        // session, so its 30 units alone stay below the threshold.
        assert_eq!(
            tracker.process(&motion(MotionAxis::X, 30), t0 + Duration::from_millis(500)),
            None
        );
        assert!(tracker.is_active());

        // The new session only holds 30 units; 20 more cross the threshold.
        let fired = tracker.process(&motion(MotionAxis::X, 20), t0 + Duration::from_millis(510));
        assert_eq!(fired, Some(Direction::Right));

        let [_, _, _, right] = actions;
        assert_eq!(right.calls(), vec![true, false]);
    }

    #[test]
    fn gap_exactly_at_timeout_keeps_session() {
        let (mut tracker, _) = recording_tracker();
        let t0 = Instant::now();

        assert_eq!(tracker.process(&motion(MotionAxis::X, 30), t0), None);
        // Strict comparison: a gap of exactly `timeout` does not reset.
        let fired = tracker.process(&motion(MotionAxis::X, 20), t0 + Duration::from_millis(300));
        assert_eq!(fired, Some(Direction::Right));
    }

    #[test]
    fn negative_horizontal_sum_fires_left() {
        let (mut tracker, actions) = recording_tracker();
        let t0 = Instant::now();

        let fired = tracker.process(&motion(MotionAxis::X, -60), t0);
        assert_eq!(fired, Some(Direction::Left));

        let [_, _, left, _] = actions;
        assert_eq!(left.calls(), vec![true, false]);
    }

    #[test]
    fn vertical_motion_fires_down_and_up() {
        let (mut tracker, _) = recording_tracker();
        let t0 = Instant::now();

        assert_eq!(
            tracker.process(&motion(MotionAxis::Y, 70), t0),
            Some(Direction::Down)
        );
        assert_eq!(
            tracker.process(&motion(MotionAxis::Y, -70), t0 + Duration::from_millis(10)),
            Some(Direction::Up)
        );
    }

    #[test]
    fn dominant_axis_tie_resolves_horizontal() {
        // ax == ay: the comparison is >=, so ties always go horizontal.
        assert_eq!(resolve_direction(50, -50), Direction::Right);
        assert_eq!(resolve_direction(-50, 50), Direction::Left);
        assert_eq!(resolve_direction(50, 50), Direction::Right);
    }

    #[test]
    fn zero_dominant_sum_resolves_to_negative_direction() {
        // Existing behavior of the strict `> 0` sign checks: an exactly-zero
        // dominant sum lands in the Left/Up branch.
        assert_eq!(resolve_direction(0, 0), Direction::Left);
        assert_eq!(resolve_direction(0, 60), Direction::Down);
        assert_eq!(resolve_direction(0, -60), Direction::Up);
    }

    #[test]
    fn at_most_one_gesture_per_session() {
        let (mut tracker, actions) = recording_tracker();
        let t0 = Instant::now();

        assert_eq!(
            tracker.process(&motion(MotionAxis::X, 80), t0),
            Some(Direction::Right)
        );
        assert!(!tracker.is_active());

        // The next event opens a new session instead of firing again from
        // the stale accumulators.
        assert_eq!(
            tracker.process(&motion(MotionAxis::X, 10), t0 + Duration::from_millis(10)),
            None
        );
        assert!(tracker.is_active());

        let [_, _, _, right] = actions;
        assert_eq!(right.calls(), vec![true, false]);
    }

    #[test]
    fn non_motion_events_leave_state_untouched() {
        let (mut tracker, _) = recording_tracker();
        let t0 = Instant::now();

        assert_eq!(tracker.process(&wheel(3), t0), None);
        assert!(!tracker.is_active());

        assert_eq!(tracker.process(&motion(MotionAxis::X, 30), t0), None);
        assert_eq!(
            tracker.process(&wheel(-2), t0 + Duration::from_millis(10)),
            None
        );
        assert!(tracker.is_active());

        // The wheel event neither reset nor contributed; 20 more units fire.
        assert_eq!(
            tracker.process(&motion(MotionAxis::X, 20), t0 + Duration::from_millis(20)),
            Some(Direction::Right)
        );
    }

    #[test]
    fn unbound_direction_closes_session_without_invocation() {
        let config = TrackerConfig {
            threshold: 50,
            timeout: Duration::from_millis(300),
            bindings: ActionBindings::default(),
        };
        let mut tracker = SwipeTracker::new(config);
        let t0 = Instant::now();

        assert_eq!(
            tracker.process(&motion(MotionAxis::Y, -60), t0),
            Some(Direction::Up)
        );
        assert!(!tracker.is_active());
    }

    #[test]
    fn only_one_axis_is_updated_per_event() {
        let (mut tracker, actions) = recording_tracker();
        let t0 = Instant::now();

        // Mixed-axis noise below threshold on both axes never fires.
        assert_eq!(tracker.process(&motion(MotionAxis::X, 25), t0), None);
        assert_eq!(
            tracker.process(&motion(MotionAxis::Y, 25), t0 + Duration::from_millis(5)),
            None
        );
        assert_eq!(
            tracker.process(&motion(MotionAxis::X, 24), t0 + Duration::from_millis(10)),
            None
        );

        // Crossing on Y while X stays at 49: vertical wins.
        let fired = tracker.process(&motion(MotionAxis::Y, 25), t0 + Duration::from_millis(15));
        assert_eq!(fired, Some(Direction::Down));

        let [_, down, _, _] = actions;
        assert_eq!(down.calls(), vec![true, false]);
    }
}
