use crate::error::GestureError;
use crate::key_gestures::db::{GestureConfigStore, JsonDirSource, ProfileSource};
use crate::key_gestures::detector::{GestureDetector, GestureOutcome, InputEvent};
use crate::key_gestures::direction::{is_valid_threshold, DEFAULT_THRESHOLD_PX};
use crate::key_gestures::dispatch::{ActionDispatcher, HostCapabilities};
use crate::key_gestures::stats::{gesture_stats, GestureStats};
use crate::key_gestures::usage::UsageLog;
use crate::settings::GestureSettings;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

/// The host's global input stream. Installing hands it the sending half of
/// a channel; the manager drains the other half on the UI thread.
pub trait EventSource: Send {
    /// Fails with [`GestureError::NoWindow`] while the host has no main
    /// window to hook into.
    fn install(&mut self, sender: Sender<InputEvent>) -> Result<(), GestureError>;
    fn uninstall(&mut self) -> Result<(), GestureError>;
    fn is_installed(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachStatus {
    Detached,
    /// Waiting for the host to report a main window.
    PendingWindow,
    Attached,
}

pub fn format_gesture_status(status: AttachStatus, profiles: usize) -> String {
    match status {
        AttachStatus::Attached => format!("Gestures active ({profiles} profiles)"),
        AttachStatus::PendingWindow => "Gestures waiting for main window".to_string(),
        AttachStatus::Detached => "Gestures inactive".to_string(),
    }
}

/// Owns the single gesture detector and its attachment to the host.
///
/// The host keeps this value and calls the lifecycle methods from its own
/// setup/teardown hooks; there is no process-wide instance.
pub struct GestureManager {
    enabled: bool,
    threshold_px: f64,
    profiles: Arc<dyn ProfileSource>,
    dispatcher: ActionDispatcher,
    events: Box<dyn EventSource>,
    detector: Option<GestureDetector>,
    receiver: Option<Receiver<InputEvent>>,
    status: AttachStatus,
    usage: UsageLog,
}

impl GestureManager {
    pub fn new(
        profiles: Arc<dyn ProfileSource>,
        host: Arc<dyn HostCapabilities>,
        events: Box<dyn EventSource>,
    ) -> Self {
        Self {
            enabled: true,
            threshold_px: DEFAULT_THRESHOLD_PX,
            profiles,
            dispatcher: ActionDispatcher::new(host),
            events,
            detector: None,
            receiver: None,
            status: AttachStatus::Detached,
            usage: UsageLog::default(),
        }
    }

    /// Build a manager reading profiles from the settings' gesture
    /// directory.
    pub fn from_settings(
        settings: &GestureSettings,
        settings_path: &Path,
        host: Arc<dyn HostCapabilities>,
        events: Box<dyn EventSource>,
    ) -> Self {
        let source = JsonDirSource::new(settings.gesture_dir(settings_path));
        let mut manager = Self::new(Arc::new(source), host, events);
        manager.enabled = settings.enabled;
        manager.set_threshold(settings.threshold_px);
        manager
    }

    pub fn with_threshold(mut self, threshold_px: f64) -> Self {
        self.set_threshold(threshold_px);
        self
    }

    /// Ignores invalid values and keeps the current threshold.
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
        if let Some(detector) = self.detector.as_mut() {
            detector.set_threshold(threshold_px);
        }
        true
    }

    /// Create, load and attach the detector. Does nothing if one already
    /// exists or gestures are disabled.
    pub fn initialize(&mut self) {
        if self.detector.is_some() {
            return;
        }
        if !self.enabled {
            tracing::info!("gestures disabled; not initializing");
            return;
        }
        let store = GestureConfigStore::new(Arc::clone(&self.profiles));
        let mut detector = GestureDetector::with_threshold(store, self.threshold_px);
        detector.reload_configs();
        self.detector = Some(detector);
        self.attach();
    }

    /// Retry a deferred attachment once the host has a main window.
    pub fn on_window_created(&mut self) {
        if self.detector.is_some() && self.status == AttachStatus::PendingWindow {
            self.attach();
        }
    }

    /// Reload profiles without touching the attachment or the gesture in
    /// flight.
    pub fn reload_configs(&mut self) -> bool {
        match self.detector.as_mut() {
            Some(detector) => detector.reload_configs(),
            None => {
                tracing::debug!("reload requested without an active detector");
                false
            }
        }
    }

    pub fn shutdown(&mut self) {
        if self.events.is_installed() {
            if let Err(err) = self.events.uninstall() {
                tracing::error!(?err, "failed to uninstall gesture event source");
            }
        }
        if self.detector.take().is_some() {
            tracing::info!("gesture detector shut down");
        }
        self.receiver = None;
        self.status = AttachStatus::Detached;
    }

    pub fn is_active(&self) -> bool {
        self.detector.is_some() && self.status == AttachStatus::Attached
    }

    pub fn status(&self) -> AttachStatus {
        self.status
    }

    pub fn status_text(&self) -> String {
        let profiles = self
            .detector
            .as_ref()
            .map(|detector| detector.table().len())
            .unwrap_or(0);
        format_gesture_status(self.status, profiles)
    }

    pub fn detector(&self) -> Option<&GestureDetector> {
        self.detector.as_ref()
    }

    pub fn usage(&self) -> &UsageLog {
        &self.usage
    }

    /// Summary of the loaded table and its load diagnostics.
    pub fn stats(&self) -> Option<GestureStats> {
        self.detector
            .as_ref()
            .map(|detector| gesture_stats(detector.table(), detector.store().diagnostics()))
    }

    /// Drain queued events in arrival order. Returns how many were
    /// processed.
    pub fn pump(&mut self) -> usize {
        let pending: Vec<InputEvent> = match self.receiver.as_ref() {
            Some(receiver) => receiver.try_iter().collect(),
            None => return 0,
        };
        for event in &pending {
            self.handle_event(event);
        }
        pending.len()
    }

    /// Feed one event straight to the detector.
    pub fn handle_event(&mut self, event: &InputEvent) -> Option<GestureOutcome> {
        let detector = self.detector.as_mut()?;
        let outcome = detector.handle_event(event, &self.dispatcher)?;
        self.usage.record(&outcome);
        Some(outcome)
    }

    fn attach(&mut self) {
        let (sender, receiver) = mpsc::channel();
        match self.events.install(sender) {
            Ok(()) => {
                self.receiver = Some(receiver);
                self.status = AttachStatus::Attached;
                tracing::info!("gesture detector attached");
            }
            Err(GestureError::NoWindow) => {
                self.status = AttachStatus::PendingWindow;
                tracing::debug!("no main window yet; gesture attachment deferred");
            }
            Err(err) => {
                self.status = AttachStatus::Detached;
                tracing::error!(?err, "failed to attach gesture detector");
            }
        }
    }
}

impl std::fmt::Debug for GestureManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GestureManager")
            .field("enabled", &self.enabled)
            .field("threshold_px", &self.threshold_px)
            .field("status", &self.status)
            .field("detector", &self.detector)
            .finish_non_exhaustive()
    }
}

/// In-process event source for tests and headless hosts.
#[derive(Clone)]
pub struct MockEventSource {
    state: Arc<MockEventState>,
}

struct MockEventState {
    install_count: AtomicUsize,
    uninstall_count: AtomicUsize,
    window_available: AtomicBool,
    sender: Mutex<Option<Sender<InputEvent>>>,
}

impl MockEventSource {
    pub fn new() -> (Self, MockEventHandle) {
        Self::with_window(true)
    }

    /// A source whose host has no main window until
    /// [`MockEventHandle::set_window_available`] is called.
    pub fn without_window() -> (Self, MockEventHandle) {
        Self::with_window(false)
    }

    fn with_window(available: bool) -> (Self, MockEventHandle) {
        let state = Arc::new(MockEventState {
            install_count: AtomicUsize::new(0),
            uninstall_count: AtomicUsize::new(0),
            window_available: AtomicBool::new(available),
            sender: Mutex::new(None),
        });
        (
            Self {
                state: Arc::clone(&state),
            },
            MockEventHandle { state },
        )
    }
}

impl EventSource for MockEventSource {
    fn install(&mut self, sender: Sender<InputEvent>) -> Result<(), GestureError> {
        if !self.state.window_available.load(Ordering::SeqCst) {
            return Err(GestureError::NoWindow);
        }
        let mut guard = self
            .state
            .sender
            .lock()
            .map_err(|_| GestureError::Install("lock".into()))?;
        if guard.is_none() {
            self.state.install_count.fetch_add(1, Ordering::SeqCst);
            *guard = Some(sender);
        }
        Ok(())
    }

    fn uninstall(&mut self) -> Result<(), GestureError> {
        let mut guard = self
            .state
            .sender
            .lock()
            .map_err(|_| GestureError::Install("lock".into()))?;
        if guard.is_some() {
            self.state.uninstall_count.fetch_add(1, Ordering::SeqCst);
        }
        *guard = None;
        Ok(())
    }

    fn is_installed(&self) -> bool {
        match self.state.sender.lock() {
            Ok(guard) => guard.is_some(),
            Err(_) => false,
        }
    }
}

pub struct MockEventHandle {
    state: Arc<MockEventState>,
}

impl MockEventHandle {
    pub fn install_count(&self) -> usize {
        self.state.install_count.load(Ordering::SeqCst)
    }

    pub fn uninstall_count(&self) -> usize {
        self.state.uninstall_count.load(Ordering::SeqCst)
    }

    pub fn set_window_available(&self, available: bool) {
        self.state.window_available.store(available, Ordering::SeqCst);
    }

    /// Push an event as the host would. Returns `false` when nothing is
    /// installed.
    pub fn emit(&self, event: InputEvent) -> bool {
        match self.state.sender.lock() {
            Ok(guard) => guard
                .as_ref()
                .map(|sender| sender.send(event).is_ok())
                .unwrap_or(false),
            Err(_) => false,
        }
    }
}
