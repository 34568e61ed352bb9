pub mod db;
pub mod detector;
pub mod direction;
pub mod dispatch;
pub mod service;
pub mod stats;
pub mod usage;

pub use db::{
    load_profiles, ActionDescriptor, GestureConfigStore, GestureProfile, GestureTable,
    JsonDirSource, ProfileDocument, ProfileSource, StaticSource,
};
pub use detector::{GestureDetector, GestureOutcome, GestureSession, InputEvent, Point};
pub use direction::{classify, is_valid_threshold, DirectionSlot, DEFAULT_THRESHOLD_PX};
pub use dispatch::{ActionDispatcher, HostCapabilities, PanelInfo};
pub use service::{
    format_gesture_status, AttachStatus, EventSource, GestureManager, MockEventHandle,
    MockEventSource,
};
