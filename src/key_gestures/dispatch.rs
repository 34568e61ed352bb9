use crate::key_gestures::db::ActionDescriptor;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// A dockable panel as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelInfo {
    pub id: String,
    pub title: String,
    pub visible: bool,
}

/// Capabilities the painting host lends to the gesture subsystem.
///
/// Implementations report "not found" as `Ok(false)` and reserve `Err` for
/// host failures; both end up as a failed dispatch.
pub trait HostCapabilities: Send + Sync {
    /// Activate a brush preset by exact name in the active editing context.
    fn select_brush_preset(&self, name: &str) -> anyhow::Result<bool>;

    /// Trigger an opaque host command.
    fn run_command(&self, id: &str) -> anyhow::Result<bool>;

    fn list_panels(&self) -> anyhow::Result<Vec<PanelInfo>>;

    fn set_panel_visible(&self, panel: &PanelInfo, visible: bool) -> anyhow::Result<()>;

    /// Bring a panel to the front after it was shown.
    fn raise_panel(&self, _panel: &PanelInfo) -> anyhow::Result<()> {
        Ok(())
    }
}

/// First panel whose title contains `keyword`, ignoring case.
pub fn find_panel<'a>(panels: &'a [PanelInfo], keyword: &str) -> Option<&'a PanelInfo> {
    let needle = keyword.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    panels
        .iter()
        .find(|panel| panel.title.to_lowercase().contains(&needle))
}

#[derive(Clone)]
pub struct ActionDispatcher {
    host: Arc<dyn HostCapabilities>,
}

impl ActionDispatcher {
    pub fn new(host: Arc<dyn HostCapabilities>) -> Self {
        Self { host }
    }

    /// Run the host capability named by `action`.
    ///
    /// Never panics and never returns an error: this runs from inside the
    /// host's event filter, so every failure becomes `false` plus a log
    /// line.
    pub fn dispatch(&self, action: Option<&ActionDescriptor>) -> bool {
        let action = match action {
            Some(action) if !action.is_empty() => action,
            _ => {
                tracing::debug!("no gesture action configured");
                return false;
            }
        };

        let result = catch_unwind(AssertUnwindSafe(|| self.invoke(action)));
        match result {
            Ok(Ok(true)) => {
                tracing::debug!(%action, "gesture action dispatched");
                true
            }
            Ok(Ok(false)) => {
                tracing::warn!(%action, "gesture action target not found");
                false
            }
            Ok(Err(err)) => {
                tracing::warn!(%action, ?err, "gesture action failed");
                false
            }
            Err(_) => {
                tracing::error!(%action, "gesture action panicked in host capability");
                false
            }
        }
    }

    fn invoke(&self, action: &ActionDescriptor) -> anyhow::Result<bool> {
        match action {
            ActionDescriptor::Brush { brush_name } => self.host.select_brush_preset(brush_name),
            ActionDescriptor::Action { action_id } => self.host.run_command(action_id),
            ActionDescriptor::DockerToggle { docker_name } => self.toggle_panel(docker_name),
        }
    }

    fn toggle_panel(&self, keyword: &str) -> anyhow::Result<bool> {
        let panels = self.host.list_panels()?;
        let Some(panel) = find_panel(&panels, keyword) else {
            return Ok(false);
        };
        if panel.visible {
            self.host.set_panel_visible(panel, false)?;
        } else {
            self.host.set_panel_visible(panel, true)?;
            self.host.raise_panel(panel)?;
        }
        tracing::debug!(panel = %panel.title, visible = !panel.visible, "panel toggled");
        Ok(true)
    }
}

impl std::fmt::Debug for ActionDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionDispatcher").finish_non_exhaustive()
    }
}
