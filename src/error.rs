use thiserror::Error;

/// Errors surfaced by the gesture subsystem's host-facing seams.
#[derive(Debug, Error)]
pub enum GestureError {
    /// The host has no main window yet; attachment must wait for
    /// [`crate::key_gestures::GestureManager::on_window_created`].
    #[error("host main window is not available yet")]
    NoWindow,
    #[error("failed to install event source: {0}")]
    Install(String),
}
