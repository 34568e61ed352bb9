use gesture_dock::key_gestures::db::{
    load_profiles, ActionDescriptor, DiagnosticKind, GestureConfigStore, GestureProfile,
    JsonDirSource, ProfileDocument, ProfileSource, StaticSource,
};
use gesture_dock::key_gestures::DirectionSlot;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tempfile::tempdir;

fn doc(name: &str, body: &str) -> ProfileDocument {
    ProfileDocument::new(name, body)
}

#[test]
fn duplicate_trigger_keys_keep_first_profile() {
    let report = load_profiles(&[
        doc("first", r#"{"gesture_key":"W","up":{"type":"brush","brush_name":"Inking"}}"#),
        doc("second", r#"{"gesture_key":"w","up":{"type":"brush","brush_name":"Airbrush"}}"#),
        doc("third", r#"{"gesture_key":"F3","center":{"type":"action","action_id":"undo"}}"#),
    ]);

    assert_eq!(report.table.len(), 2);
    assert_eq!(report.table.keys().collect::<Vec<_>>(), vec!["W", "F3"]);
    assert_eq!(
        report.table.lookup("W", DirectionSlot::Up),
        Some(&ActionDescriptor::Brush {
            brush_name: "Inking".into()
        })
    );
    assert_eq!(report.skipped_duplicates(), 1);
    assert_eq!(
        report.diagnostics[0].kind,
        DiagnosticKind::DuplicateKey {
            key: "W".into(),
            first: "first".into()
        }
    );
}

#[test]
fn malformed_documents_do_not_abort_the_load() {
    let report = load_profiles(&[
        doc("garbage", "{ not json"),
        doc("array", "[1, 2, 3]"),
        doc("keyless", r#"{"up":{"type":"brush","brush_name":"Inking"}}"#),
        doc("blank_key", r#"{"gesture_key":"  "}"#),
        doc("modifier", r#"{"gesture_key":"Shift"}"#),
        doc("numeric", r#"{"gesture_key":7}"#),
        doc("good", r#"{"gesture_key":"e","left":{"type":"docker_toggle","docker_name":"layers"}}"#),
    ]);

    assert_eq!(report.table.len(), 1);
    assert!(report.table.contains_key("E"));
    let kinds: Vec<_> = report.diagnostics.iter().map(|d| d.kind.clone()).collect();
    assert!(matches!(kinds[0], DiagnosticKind::InvalidJson(_)));
    assert_eq!(kinds[1], DiagnosticKind::NotAnObject);
    assert_eq!(kinds[2], DiagnosticKind::MissingKey);
    assert_eq!(kinds[3], DiagnosticKind::MissingKey);
    assert_eq!(kinds[4], DiagnosticKind::InvalidKey("Shift".into()));
    assert_eq!(kinds[5], DiagnosticKind::InvalidKey("7".into()));
}

#[test]
fn empty_and_malformed_slots_are_inert() {
    let report = load_profiles(&[doc(
        "mixed",
        r#"{
            "name": "Mixed",
            "gesture_key": "Q",
            "up": {"type": "brush", "brush_name": "Inking"},
            "down": null,
            "left": {},
            "right": {"type": ""},
            "right_up": {"type": "brush", "brush_name": ""},
            "left_up": {"type": "teleport", "target": "moon"},
            "left_down": {"type": "action"},
            "center": {"type": "action", "action_id": "zoom_reset", "extra": true}
        }"#,
    )]);

    let profile = report.table.get("Q").expect("profile");
    assert_eq!(profile.name, "Mixed");
    assert_eq!(profile.configured_slots(), 2);
    assert!(profile.slot(DirectionSlot::Down).is_none());
    assert!(profile.slot(DirectionSlot::RightUp).is_none());
    assert!(profile.slot(DirectionSlot::RightDown).is_none());
    assert_eq!(
        profile.slot(DirectionSlot::Center),
        Some(&ActionDescriptor::Action {
            action_id: "zoom_reset".into()
        })
    );

    let malformed: Vec<_> = report
        .diagnostics
        .iter()
        .filter_map(|d| match &d.kind {
            DiagnosticKind::MalformedSlot { slot, .. } => Some(*slot),
            _ => None,
        })
        .collect();
    assert_eq!(malformed, vec![DirectionSlot::LeftUp, DirectionSlot::LeftDown]);
}

#[test]
fn profile_name_falls_back_to_document_name() {
    let report = load_profiles(&[doc("quick_brushes", r#"{"gesture_key":"B"}"#)]);
    assert_eq!(report.table.get("B").map(|p| p.name.as_str()), Some("quick_brushes"));
}

#[test]
fn json_dir_source_reads_sorted_json_files() {
    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join("b_second.json"),
        r#"{"gesture_key":"W","up":{"type":"brush","brush_name":"Airbrush"}}"#,
    )
    .unwrap();
    std::fs::write(
        dir.path().join("a_first.json"),
        r#"{"gesture_key":"W","up":{"type":"brush","brush_name":"Inking"}}"#,
    )
    .unwrap();
    std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    let source = JsonDirSource::new(dir.path());
    let documents = source.documents().unwrap();
    let names: Vec<_> = documents.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["a_first", "b_second"]);

    let report = load_profiles(&documents);
    assert_eq!(
        report.table.lookup("W", DirectionSlot::Up).map(|a| a.payload()),
        Some("Inking")
    );
}

#[test]
fn json_dir_source_missing_directory_is_empty() {
    let dir = tempdir().unwrap();
    let source = JsonDirSource::new(dir.path().join("does_not_exist"));
    assert!(source.documents().unwrap().is_empty());
}

#[test]
fn saved_profile_loads_back() {
    let dir = tempdir().unwrap();
    let source = JsonDirSource::new(dir.path().join("gestures"));
    let profile = GestureProfile::new("Quick Inking", "W")
        .with_slot(
            DirectionSlot::Up,
            ActionDescriptor::Brush {
                brush_name: "Inking".into(),
            },
        )
        .with_slot(
            DirectionSlot::Center,
            ActionDescriptor::DockerToggle {
                docker_name: "Layers".into(),
            },
        );

    let path = source.save_profile(&profile).unwrap();
    assert_eq!(path.file_name().unwrap(), "quick-inking.json");

    let report = load_profiles(&source.documents().unwrap());
    assert!(report.diagnostics.is_empty());
    assert_eq!(report.table.get("W"), Some(&profile));
}

struct FlakySource {
    inner: StaticSource,
    fail: AtomicBool,
}

impl ProfileSource for FlakySource {
    fn documents(&self) -> anyhow::Result<Vec<ProfileDocument>> {
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("disk unplugged");
        }
        self.inner.documents()
    }
}

#[test]
fn reload_replaces_table_and_keeps_it_on_source_failure() {
    let source = Arc::new(FlakySource {
        inner: StaticSource::new(vec![
            doc("w", r#"{"gesture_key":"W"}"#),
            doc("e", r#"{"gesture_key":"E"}"#),
        ]),
        fail: AtomicBool::new(false),
    });
    let mut store = GestureConfigStore::new(source.clone());
    assert!(store.table().is_empty());
    assert_eq!(store.reload().unwrap(), 2);

    source.inner.replace(vec![doc("r", r#"{"gesture_key":"R"}"#)]);
    assert_eq!(store.reload().unwrap(), 1);
    assert_eq!(store.table().keys().collect::<Vec<_>>(), vec!["R"]);

    source.fail.store(true, Ordering::SeqCst);
    assert!(store.reload().is_err());
    assert_eq!(store.table().keys().collect::<Vec<_>>(), vec!["R"]);
}

#[test]
fn unreadable_profile_files_become_diagnostics() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("a.json"), [0xff, 0xfe, 0x00]).unwrap();
    std::fs::write(
        dir.path().join("b.json"),
        r#"{"gesture_key":"W","up":{"type":"brush","brush_name":"Inking"}}"#,
    )
    .unwrap();

    let mut store = GestureConfigStore::new(Arc::new(JsonDirSource::new(dir.path())));
    assert_eq!(store.reload().unwrap(), 1);
    assert_eq!(store.diagnostics().len(), 1);
    assert_eq!(store.diagnostics()[0].document, "a");
    assert!(matches!(
        store.diagnostics()[0].kind,
        DiagnosticKind::Unreadable(_)
    ));

    let stats = gesture_dock::key_gestures::stats::gesture_stats(
        store.table(),
        store.diagnostics(),
    );
    assert_eq!(stats.rejected_documents, 1);
}

#[test]
fn discarded_duplicates_do_not_report_slot_issues() {
    let report = load_profiles(&[
        doc("first", r#"{"gesture_key":"W","up":{"type":"brush","brush_name":"Inking"}}"#),
        doc("second", r#"{"gesture_key":"W","left":{"type":"teleport"}}"#),
    ]);

    assert_eq!(report.table.len(), 1);
    assert_eq!(report.diagnostics.len(), 1);
    assert!(matches!(
        report.diagnostics[0].kind,
        DiagnosticKind::DuplicateKey { .. }
    ));
}
