use gesture_dock::key_gestures::{
    AttachStatus, DirectionSlot, GestureManager, InputEvent, MockEventSource, ProfileDocument,
    StaticSource,
};
use gesture_dock::settings::GestureSettings;
use std::sync::Arc;
use tempfile::tempdir;

use mock_host::{HostCall, MockHost};

const W_PROFILE: &str = r#"{
    "gesture_key": "W",
    "center": {"type": "action", "action_id": "zoom_reset"},
    "up": {"type": "brush", "brush_name": "Inking"}
}"#;

fn manager_with(events: MockEventSource) -> (GestureManager, Arc<StaticSource>, Arc<MockHost>) {
    let source = Arc::new(StaticSource::new(vec![ProfileDocument::new("w", W_PROFILE)]));
    let host = Arc::new(MockHost::default());
    let manager = GestureManager::new(source.clone(), host.clone(), Box::new(events));
    (manager, source, host)
}

#[test]
fn initialize_and_shutdown_are_idempotent() {
    let (events, handle) = MockEventSource::new();
    let (mut manager, _source, _host) = manager_with(events);
    assert!(!manager.is_active());

    manager.initialize();
    manager.initialize();
    assert!(manager.is_active());
    assert_eq!(handle.install_count(), 1);

    manager.shutdown();
    manager.shutdown();
    assert!(!manager.is_active());
    assert!(manager.detector().is_none());
    assert_eq!(handle.uninstall_count(), 1);
    assert!(!handle.emit(InputEvent::key_down("W", (0.0, 0.0))));
}

#[test]
fn attachment_waits_for_main_window() {
    let (events, handle) = MockEventSource::without_window();
    let (mut manager, _source, _host) = manager_with(events);

    manager.initialize();
    assert_eq!(manager.status(), AttachStatus::PendingWindow);
    assert!(!manager.is_active());
    assert_eq!(manager.status_text(), "Gestures waiting for main window");

    manager.on_window_created();
    assert_eq!(manager.status(), AttachStatus::PendingWindow);

    handle.set_window_available(true);
    manager.on_window_created();
    assert!(manager.is_active());
    assert_eq!(handle.install_count(), 1);
    assert_eq!(manager.status_text(), "Gestures active (1 profiles)");
    assert_eq!(manager.stats().map(|s| s.configured_slots), Some(2));
}

#[test]
fn pump_dispatches_queued_events_in_order() {
    let (events, handle) = MockEventSource::new();
    let (mut manager, _source, host) = manager_with(events);
    manager.initialize();

    assert!(handle.emit(InputEvent::key_down("W", (200.0, 200.0))));
    assert!(handle.emit(InputEvent::pointer_move((198.0, 150.0))));
    assert!(handle.emit(InputEvent::key_up("W", (198.0, 150.0))));
    assert!(handle.emit(InputEvent::key_down("W", (0.0, 0.0))));
    assert!(handle.emit(InputEvent::key_up("W", (0.0, 0.0))));

    assert_eq!(manager.pump(), 5);
    assert_eq!(manager.pump(), 0);
    assert_eq!(
        host.calls(),
        vec![
            HostCall::SelectBrush("Inking".into()),
            HostCall::RunCommand("zoom_reset".into()),
        ]
    );

    let usage: Vec<_> = manager.usage().entries().cloned().collect();
    assert_eq!(usage.len(), 2);
    assert_eq!(usage[0].slot, DirectionSlot::Up);
    assert_eq!(usage[0].action.as_deref(), Some("brush:Inking"));
    assert!(usage[1].success);
}

#[test]
fn reload_keeps_attachment() {
    let (events, handle) = MockEventSource::new();
    let (mut manager, source, host) = manager_with(events);
    manager.initialize();

    source.replace(vec![ProfileDocument::new(
        "w",
        r#"{"gesture_key":"W","center":{"type":"action","action_id":"undo"}}"#,
    )]);
    assert!(manager.reload_configs());
    assert!(manager.is_active());
    assert_eq!(handle.install_count(), 1);

    manager.handle_event(&InputEvent::key_down("W", (0.0, 0.0)));
    manager.handle_event(&InputEvent::key_up("W", (0.0, 0.0)));
    assert_eq!(host.calls(), vec![HostCall::RunCommand("undo".into())]);
}

#[test]
fn reload_without_detector_is_a_no_op() {
    let (events, _handle) = MockEventSource::new();
    let (mut manager, _source, _host) = manager_with(events);
    assert!(!manager.reload_configs());
    assert!(manager.handle_event(&InputEvent::key_down("W", (0.0, 0.0))).is_none());
}

#[test]
fn settings_drive_directory_threshold_and_enablement() {
    let dir = tempdir().unwrap();
    let settings_path = dir.path().join("gesture_settings.json");
    std::fs::create_dir_all(dir.path().join("profiles")).unwrap();
    std::fs::write(dir.path().join("profiles").join("w.json"), W_PROFILE).unwrap();

    let settings = GestureSettings {
        threshold_px: 100.0,
        gesture_dir: "profiles".into(),
        ..GestureSettings::default()
    };
    let (events, handle) = MockEventSource::new();
    let host = Arc::new(MockHost::default());
    let mut manager =
        GestureManager::from_settings(&settings, &settings_path, host.clone(), Box::new(events));
    manager.initialize();
    assert!(manager.is_active());
    assert_eq!(manager.detector().map(|d| d.table().len()), Some(1));
    assert_eq!(manager.detector().map(|d| d.threshold()), Some(100.0));

    manager.handle_event(&InputEvent::key_down("W", (0.0, 0.0)));
    manager.handle_event(&InputEvent::pointer_move((0.0, -60.0)));
    let outcome = manager
        .handle_event(&InputEvent::key_up("W", (0.0, -60.0)))
        .unwrap();
    assert_eq!(outcome.gesture.slot, DirectionSlot::Center);

    let disabled = GestureSettings {
        enabled: false,
        ..settings
    };
    let (events, handle_disabled) = MockEventSource::new();
    let mut manager = GestureManager::from_settings(&disabled, &settings_path, host, Box::new(events));
    manager.initialize();
    assert!(!manager.is_active());
    assert_eq!(handle_disabled.install_count(), 0);
    assert_eq!(handle.install_count(), 1);
}

#[test]
fn manager_keeps_threshold_when_given_invalid_values() {
    let (events, _handle) = MockEventSource::new();
    let (manager, _source, _host) = manager_with(events);
    let mut manager = manager.with_threshold(f64::NAN);
    manager.initialize();
    assert_eq!(manager.detector().map(|d| d.threshold()), Some(20.0));

    assert!(manager.set_threshold(45.0));
    assert!(!manager.set_threshold(-1.0));
    assert!(!manager.set_threshold(f64::INFINITY));
    assert_eq!(manager.detector().map(|d| d.threshold()), Some(45.0));
}
