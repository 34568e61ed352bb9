use crate::hotkey::trigger_key;
use crate::key_gestures::db::{ActionDescriptor, GestureConfigStore, GestureTable};
use crate::key_gestures::direction::{
    classify, is_valid_threshold, DirectionSlot, DEFAULT_THRESHOLD_PX,
};
use crate::key_gestures::dispatch::ActionDispatcher;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Point {
    fn from(value: (f64, f64)) -> Self {
        Self {
            x: value.0,
            y: value.1,
        }
    }
}

/// Input observed from the host's global event stream.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    KeyDown { key: String, position: Point },
    KeyUp { key: String, position: Point },
    PointerMove { position: Point },
}

impl InputEvent {
    pub fn key_down(key: impl Into<String>, position: impl Into<Point>) -> Self {
        InputEvent::KeyDown {
            key: key.into(),
            position: position.into(),
        }
    }

    pub fn key_up(key: impl Into<String>, position: impl Into<Point>) -> Self {
        InputEvent::KeyUp {
            key: key.into(),
            position: position.into(),
        }
    }

    pub fn pointer_move(position: impl Into<Point>) -> Self {
        InputEvent::PointerMove {
            position: position.into(),
        }
    }
}

/// State of the gesture in flight, if any.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GestureSession {
    pub active_key: Option<String>,
    pub is_active: bool,
    pub start_position: Option<Point>,
    pub last_position: Option<Point>,
}

impl GestureSession {
    fn begin(&mut self, key: String, position: Point) {
        self.active_key = Some(key);
        self.is_active = true;
        self.start_position = Some(position);
        self.last_position = Some(position);
    }

    fn clear(&mut self) {
        *self = GestureSession::default();
    }

    fn is_tracking(&self, key: &str) -> bool {
        self.is_active && self.active_key.as_deref() == Some(key)
    }

    fn displacement(&self) -> (f64, f64) {
        match (self.start_position, self.last_position) {
            (Some(start), Some(last)) => (last.x - start.x, last.y - start.y),
            _ => (0.0, 0.0),
        }
    }
}

/// A gesture resolved on key release, before dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedGesture {
    pub key: String,
    pub slot: DirectionSlot,
    pub distance: f64,
    pub action: Option<ActionDescriptor>,
}

/// What happened when a gesture was released.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureOutcome {
    pub gesture: ResolvedGesture,
    pub dispatched: bool,
}

/// Key + pointer gesture recognizer.
///
/// Observes events only; nothing is consumed or blocked. One session at a
/// time: the first trigger key pressed owns the gesture until it is
/// released.
#[derive(Debug)]
pub struct GestureDetector {
    store: GestureConfigStore,
    threshold_px: f64,
    session: GestureSession,
}

impl GestureDetector {
    pub fn new(store: GestureConfigStore) -> Self {
        Self::with_threshold(store, DEFAULT_THRESHOLD_PX)
    }

    pub fn with_threshold(store: GestureConfigStore, threshold_px: f64) -> Self {
        let mut detector = Self {
            store,
            threshold_px: DEFAULT_THRESHOLD_PX,
            session: GestureSession::default(),
        };
        detector.set_threshold(threshold_px);
        detector
    }

    pub fn threshold(&self) -> f64 {
        self.threshold_px
    }

    /// Invalid values (NaN, infinite, zero or negative) are ignored and the
    /// current threshold is kept. Returns whether the value was applied.
    pub fn set_threshold(&mut self, threshold_px: f64) -> bool {
        if !is_valid_threshold(threshold_px) {
            tracing::warn!(
                "threshold_px {} is invalid; keeping {}",
                threshold_px,
                self.threshold_px
            );
            return false;
        }
        self.threshold_px = threshold_px;
        true
    }

    pub fn session(&self) -> &GestureSession {
        &self.session
    }

    pub fn is_tracking(&self) -> bool {
        self.session.is_active
    }

    pub fn store(&self) -> &GestureConfigStore {
        &self.store
    }

    pub fn table(&self) -> &GestureTable {
        self.store.table()
    }

    /// Reload profiles in place. A gesture in flight keeps tracking and
    /// resolves against whatever table is current when its key is released.
    pub fn reload_configs(&mut self) -> bool {
        match self.store.reload() {
            Ok(count) => {
                tracing::info!(profiles = count, "gesture profiles reloaded");
                true
            }
            Err(err) => {
                tracing::error!(?err, "failed to reload gesture profiles");
                false
            }
        }
    }

    /// Feed one event and dispatch the bound action if a gesture resolves.
    pub fn handle_event(
        &mut self,
        event: &InputEvent,
        dispatcher: &ActionDispatcher,
    ) -> Option<GestureOutcome> {
        let gesture = self.advance(event)?;
        let dispatched = match gesture.action.as_ref() {
            Some(action) => dispatcher.dispatch(Some(action)),
            None => {
                tracing::debug!(key = %gesture.key, slot = %gesture.slot, "no action bound to gesture slot");
                false
            }
        };
        Some(GestureOutcome {
            gesture,
            dispatched,
        })
    }

    /// Advance the state machine without dispatching. Returns the resolved
    /// gesture when the active key is released.
    pub fn advance(&mut self, event: &InputEvent) -> Option<ResolvedGesture> {
        match event {
            InputEvent::KeyDown { key, position } => {
                let key = trigger_key(key)?;
                self.on_key_down(key, *position);
                None
            }
            InputEvent::KeyUp { key, position } => {
                let key = trigger_key(key)?;
                self.on_key_up(&key, *position)
            }
            InputEvent::PointerMove { position } => {
                if self.session.is_active {
                    self.session.last_position = Some(*position);
                }
                None
            }
        }
    }

    fn on_key_down(&mut self, key: String, position: Point) {
        if self.session.is_active {
            return;
        }
        if !self.store.table().contains_key(&key) {
            return;
        }
        tracing::trace!(key = %key, x = position.x, y = position.y, "gesture started");
        self.session.begin(key, position);
    }

    fn on_key_up(&mut self, key: &str, position: Point) -> Option<ResolvedGesture> {
        if !self.session.is_tracking(key) {
            return None;
        }
        // The release point counts even if no move arrived in between.
        self.session.last_position = Some(position);
        let (dx, dy) = self.session.displacement();
        self.session.clear();

        let slot = classify(dx, dy, self.threshold_px);
        let action = self.store.table().lookup(key, slot).cloned();
        let gesture = ResolvedGesture {
            key: key.to_string(),
            slot,
            distance: dx.hypot(dy),
            action,
        };
        tracing::debug!(
            key = %gesture.key,
            slot = %gesture.slot,
            distance = gesture.distance,
            "gesture resolved"
        );
        Some(gesture)
    }
}
