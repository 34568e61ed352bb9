use crate::key_gestures::db::{ConfigDiagnostic, DiagnosticKind, GestureTable};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GestureStats {
    pub profiles: usize,
    pub empty_profiles: usize,
    pub configured_slots: usize,
    pub duplicate_keys: usize,
    pub rejected_documents: usize,
    pub malformed_slots: usize,
}

pub fn gesture_stats(table: &GestureTable, diagnostics: &[ConfigDiagnostic]) -> GestureStats {
    let mut stats = GestureStats {
        profiles: table.len(),
        ..GestureStats::default()
    };
    for profile in table.iter() {
        let configured = profile.configured_slots();
        if configured == 0 {
            stats.empty_profiles += 1;
        }
        stats.configured_slots += configured;
    }
    for diagnostic in diagnostics {
        match diagnostic.kind {
            DiagnosticKind::DuplicateKey { .. } => stats.duplicate_keys += 1,
            DiagnosticKind::MalformedSlot { .. } => stats.malformed_slots += 1,
            _ => stats.rejected_documents += 1,
        }
    }
    stats
}
