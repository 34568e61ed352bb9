use crate::hotkey::{is_modifier_key, normalize_key};
use crate::key_gestures::direction::DirectionSlot;
use anyhow::Context;
use hashlink::LinkedHashMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use walkdir::WalkDir;

pub const GESTURE_KEY_FIELD: &str = "gesture_key";
pub const NAME_FIELD: &str = "name";
pub const PROFILE_EXTENSION: &str = "json";

/// Action bound to a gesture slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionDescriptor {
    Brush { brush_name: String },
    Action { action_id: String },
    /// `docker_name` is matched case-insensitively as a substring of the
    /// host's panel titles.
    DockerToggle { docker_name: String },
}

impl ActionDescriptor {
    pub fn kind(&self) -> &'static str {
        match self {
            ActionDescriptor::Brush { .. } => "brush",
            ActionDescriptor::Action { .. } => "action",
            ActionDescriptor::DockerToggle { .. } => "docker_toggle",
        }
    }

    pub fn payload(&self) -> &str {
        match self {
            ActionDescriptor::Brush { brush_name } => brush_name,
            ActionDescriptor::Action { action_id } => action_id,
            ActionDescriptor::DockerToggle { docker_name } => docker_name,
        }
    }

    /// A descriptor with a blank payload is inert.
    pub fn is_empty(&self) -> bool {
        self.payload().trim().is_empty()
    }
}

impl fmt::Display for ActionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.payload())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GestureProfile {
    pub name: String,
    pub trigger_key: String,
    pub slots: HashMap<DirectionSlot, ActionDescriptor>,
}

impl GestureProfile {
    pub fn new(name: impl Into<String>, trigger_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            trigger_key: trigger_key.into(),
            slots: HashMap::new(),
        }
    }

    pub fn with_slot(mut self, slot: DirectionSlot, action: ActionDescriptor) -> Self {
        self.slots.insert(slot, action);
        self
    }

    pub fn slot(&self, slot: DirectionSlot) -> Option<&ActionDescriptor> {
        self.slots.get(&slot).filter(|action| !action.is_empty())
    }

    pub fn configured_slots(&self) -> usize {
        self.slots.values().filter(|action| !action.is_empty()).count()
    }

    /// Render the profile in the on-disk document shape, slots in compass
    /// order followed by `center`.
    pub fn to_document(&self) -> Value {
        let mut obj = Map::new();
        obj.insert(NAME_FIELD.into(), Value::String(self.name.clone()));
        obj.insert(
            GESTURE_KEY_FIELD.into(),
            Value::String(self.trigger_key.clone()),
        );
        for slot in DirectionSlot::ALL {
            let value = self
                .slot(slot)
                .and_then(|action| serde_json::to_value(action).ok())
                .unwrap_or(Value::Null);
            obj.insert(slot.as_str().into(), value);
        }
        Value::Object(obj)
    }
}

/// Loaded profiles keyed by normalized trigger key, in load order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GestureTable {
    profiles: LinkedHashMap<String, GestureProfile>,
}

impl GestureTable {
    /// Insert a profile unless its trigger key is already claimed. The
    /// rejected profile is handed back.
    pub fn insert(&mut self, profile: GestureProfile) -> Result<(), GestureProfile> {
        if self.profiles.contains_key(&profile.trigger_key) {
            return Err(profile);
        }
        self.profiles.insert(profile.trigger_key.clone(), profile);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&GestureProfile> {
        self.profiles.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.profiles.contains_key(key)
    }

    pub fn lookup(&self, key: &str, slot: DirectionSlot) -> Option<&ActionDescriptor> {
        self.get(key)?.slot(slot)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GestureProfile> {
        self.profiles.values()
    }
}

impl FromIterator<GestureProfile> for GestureTable {
    fn from_iter<I: IntoIterator<Item = GestureProfile>>(iter: I) -> Self {
        let mut table = GestureTable::default();
        for profile in iter {
            let _ = table.insert(profile);
        }
        table
    }
}

/// A named, unparsed profile document as handed over by storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileDocument {
    pub name: String,
    pub body: String,
    /// Set when storage found the document but could not read it.
    pub read_error: Option<String>,
}

impl ProfileDocument {
    pub fn new(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: body.into(),
            read_error: None,
        }
    }

    pub fn unreadable(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: String::new(),
            read_error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    Unreadable(String),
    InvalidJson(String),
    NotAnObject,
    MissingKey,
    InvalidKey(String),
    DuplicateKey { key: String, first: String },
    MalformedSlot { slot: DirectionSlot, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDiagnostic {
    pub document: String,
    pub kind: DiagnosticKind,
}

impl fmt::Display for ConfigDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DiagnosticKind::Unreadable(err) => write!(f, "{}: unreadable ({err})", self.document),
            DiagnosticKind::InvalidJson(err) => write!(f, "{}: invalid JSON ({err})", self.document),
            DiagnosticKind::NotAnObject => write!(f, "{}: expected a JSON object", self.document),
            DiagnosticKind::MissingKey => {
                write!(f, "{}: missing or empty '{GESTURE_KEY_FIELD}'", self.document)
            }
            DiagnosticKind::InvalidKey(key) => {
                write!(f, "{}: '{key}' cannot be used as a trigger key", self.document)
            }
            DiagnosticKind::DuplicateKey { key, first } => write!(
                f,
                "{}: trigger key '{key}' already used by '{first}'",
                self.document
            ),
            DiagnosticKind::MalformedSlot { slot, reason } => {
                write!(f, "{}: slot '{slot}' ignored ({reason})", self.document)
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub table: GestureTable,
    pub diagnostics: Vec<ConfigDiagnostic>,
}

impl LoadReport {
    pub fn skipped_duplicates(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|diag| matches!(diag.kind, DiagnosticKind::DuplicateKey { .. }))
            .count()
    }
}

/// Parse a single profile document. Slot-level problems are returned as
/// diagnostics next to the profile; document-level problems reject it.
pub fn parse_profile(
    document: &ProfileDocument,
) -> Result<(GestureProfile, Vec<ConfigDiagnostic>), ConfigDiagnostic> {
    let reject = |kind| ConfigDiagnostic {
        document: document.name.clone(),
        kind,
    };

    if let Some(err) = &document.read_error {
        return Err(reject(DiagnosticKind::Unreadable(err.clone())));
    }
    let value: Value = serde_json::from_str(&document.body)
        .map_err(|err| reject(DiagnosticKind::InvalidJson(err.to_string())))?;
    let obj = value
        .as_object()
        .ok_or_else(|| reject(DiagnosticKind::NotAnObject))?;

    let raw_key = match obj.get(GESTURE_KEY_FIELD) {
        None | Some(Value::Null) => return Err(reject(DiagnosticKind::MissingKey)),
        Some(Value::String(key)) if key.trim().is_empty() => {
            return Err(reject(DiagnosticKind::MissingKey))
        }
        Some(Value::String(key)) => key.clone(),
        Some(other) => return Err(reject(DiagnosticKind::InvalidKey(other.to_string()))),
    };
    let trigger_key = match normalize_key(&raw_key) {
        Some(key) if !is_modifier_key(&key) => key,
        _ => return Err(reject(DiagnosticKind::InvalidKey(raw_key))),
    };

    let name = obj
        .get(NAME_FIELD)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(document.name.as_str())
        .to_string();

    let mut profile = GestureProfile::new(name, trigger_key);
    let mut diagnostics = Vec::new();
    for slot in DirectionSlot::ALL {
        match parse_slot(obj.get(slot.as_str())) {
            Ok(Some(action)) => {
                profile.slots.insert(slot, action);
            }
            Ok(None) => {}
            Err(reason) => diagnostics.push(reject(DiagnosticKind::MalformedSlot { slot, reason })),
        }
    }
    Ok((profile, diagnostics))
}

fn parse_slot(value: Option<&Value>) -> Result<Option<ActionDescriptor>, String> {
    let value = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Object(obj)) if obj.is_empty() => return Ok(None),
        Some(value) => value,
    };
    if let Some(kind) = value.get("type").and_then(Value::as_str) {
        if kind.trim().is_empty() || kind.eq_ignore_ascii_case("none") {
            return Ok(None);
        }
    }
    let action: ActionDescriptor =
        serde_json::from_value(value.clone()).map_err(|err| err.to_string())?;
    Ok(Some(action).filter(|action| !action.is_empty()))
}

/// Build a table from documents in order. First claim on a trigger key
/// wins; everything skipped is reported and logged, never fatal.
pub fn load_profiles(documents: &[ProfileDocument]) -> LoadReport {
    let mut report = LoadReport::default();
    for document in documents {
        match parse_profile(document) {
            Ok((profile, slot_diagnostics)) => {
                if let Some(existing) = report.table.get(&profile.trigger_key) {
                    report.diagnostics.push(ConfigDiagnostic {
                        document: document.name.clone(),
                        kind: DiagnosticKind::DuplicateKey {
                            key: profile.trigger_key.clone(),
                            first: existing.name.clone(),
                        },
                    });
                    continue;
                }
                report.diagnostics.extend(slot_diagnostics);
                let _ = report.table.insert(profile);
            }
            Err(diagnostic) => report.diagnostics.push(diagnostic),
        }
    }
    for diagnostic in &report.diagnostics {
        tracing::warn!(%diagnostic, "gesture profile issue");
    }
    tracing::debug!(
        profiles = report.table.len(),
        issues = report.diagnostics.len(),
        "gesture profiles loaded"
    );
    report
}

/// External storage for profile documents.
pub trait ProfileSource: Send + Sync {
    fn documents(&self) -> anyhow::Result<Vec<ProfileDocument>>;

    fn describe(&self) -> String {
        "profile source".to_string()
    }
}

/// Every `*.json` file directly inside a directory is one profile,
/// named after its file stem.
#[derive(Debug, Clone)]
pub struct JsonDirSource {
    dir: PathBuf,
}

impl JsonDirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write a profile as `<slug-of-name>.json` and return its path.
    pub fn save_profile(&self, profile: &GestureProfile) -> anyhow::Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating {}", self.dir.display()))?;
        let mut stem = slug::slugify(&profile.name);
        if stem.is_empty() {
            stem = slug::slugify(&profile.trigger_key);
        }
        let path = self.dir.join(format!("{stem}.{PROFILE_EXTENSION}"));
        let json = serde_json::to_string_pretty(&profile.to_document())?;
        std::fs::write(&path, json)?;
        Ok(path)
    }
}

impl ProfileSource for JsonDirSource {
    fn documents(&self) -> anyhow::Result<Vec<ProfileDocument>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut documents = Vec::new();
        let walker = WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name();
        for entry in walker {
            let entry = entry.with_context(|| format!("listing {}", self.dir.display()))?;
            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().and_then(|ext| ext.to_str()) != Some(PROFILE_EXTENSION)
            {
                continue;
            }
            let name = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().to_string())
                .unwrap_or_default();
            match std::fs::read_to_string(path) {
                Ok(body) => documents.push(ProfileDocument::new(name, body)),
                Err(err) => documents.push(ProfileDocument::unreadable(name, err.to_string())),
            }
        }
        Ok(documents)
    }

    fn describe(&self) -> String {
        self.dir.display().to_string()
    }
}

/// In-memory documents; replaceable so tests and hosts can simulate edits.
#[derive(Debug, Default)]
pub struct StaticSource {
    documents: Mutex<Vec<ProfileDocument>>,
}

impl StaticSource {
    pub fn new(documents: Vec<ProfileDocument>) -> Self {
        Self {
            documents: Mutex::new(documents),
        }
    }

    pub fn replace(&self, documents: Vec<ProfileDocument>) {
        match self.documents.lock() {
            Ok(mut guard) => *guard = documents,
            Err(err) => tracing::error!(?err, "failed to lock static profile source"),
        }
    }
}

impl ProfileSource for StaticSource {
    fn documents(&self) -> anyhow::Result<Vec<ProfileDocument>> {
        self.documents
            .lock()
            .map(|guard| guard.clone())
            .map_err(|_| anyhow::anyhow!("static profile source lock poisoned"))
    }

    fn describe(&self) -> String {
        "in-memory profiles".to_string()
    }
}

/// Owns the current gesture table and the source it is reloaded from.
pub struct GestureConfigStore {
    source: Arc<dyn ProfileSource>,
    table: GestureTable,
    diagnostics: Vec<ConfigDiagnostic>,
}

impl GestureConfigStore {
    /// An empty store; call [`GestureConfigStore::reload`] to populate it.
    pub fn new(source: Arc<dyn ProfileSource>) -> Self {
        Self {
            source,
            table: GestureTable::default(),
            diagnostics: Vec::new(),
        }
    }

    /// Re-read the source and swap the whole table. On a source failure
    /// the previous table stays in place.
    pub fn reload(&mut self) -> anyhow::Result<usize> {
        let documents = self
            .source
            .documents()
            .with_context(|| format!("reading gesture profiles from {}", self.source.describe()))?;
        let report = load_profiles(&documents);
        self.table = report.table;
        self.diagnostics = report.diagnostics;
        Ok(self.table.len())
    }

    pub fn table(&self) -> &GestureTable {
        &self.table
    }

    pub fn diagnostics(&self) -> &[ConfigDiagnostic] {
        &self.diagnostics
    }

    pub fn source(&self) -> &Arc<dyn ProfileSource> {
        &self.source
    }
}

impl fmt::Debug for GestureConfigStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GestureConfigStore")
            .field("source", &self.source.describe())
            .field("table", &self.table)
            .field("diagnostics", &self.diagnostics.len())
            .finish()
    }
}
