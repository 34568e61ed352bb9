pub mod error;
pub mod hotkey;
pub mod key_gestures;
pub mod logging;
pub mod settings;
