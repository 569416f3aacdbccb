use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    error::StoreError,
    locator::{candidate::SelectorOption, formatter::Framework},
    sync::{
        channel::{AgentTransport, Delivery, RetryPolicy, deliver},
        history::refine_latest,
        message::AgentMessage,
        schema::{InspectionSnapshot, StoreKey, Theme},
        store::{SharedStore, StoreSubscription, decode_or_default},
    },
};

pub const STATUS_OPTIONS_UPDATED: &str = "Options updated!";
pub const STATUS_COPIED: &str = "Copied! Clearing...";
pub const STATUS_COPY_FAILED: &str = "Error copying";
pub const STATUS_CLEARED: &str = "Cleared!";
pub const STATUS_RELOAD: &str = "Error: reload the page";

/// Destination of the copy button.
pub trait Clipboard {
    fn write_text(&mut self, text: &str) -> Result<(), String>;
}

#[derive(Debug, Clone)]
pub struct PanelConfig {
    pub retry: RetryPolicy,
    pub status_duration: Duration,
    pub copy_clear_delay: Duration,
}

impl Default for PanelConfig {
    fn default() -> Self {
        PanelConfig {
            retry: RetryPolicy::default(),
            status_duration: Duration::from_secs(2),
            copy_clear_delay: Duration::from_millis(700),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Status {
    text: String,
    until: Instant,
}

/// The control surface: toggle, framework picker, candidate list, output
/// field and history, kept in sync with the shared store.
pub struct ControlPanel {
    store: SharedStore,
    store_changes: StoreSubscription,
    transport: Box<dyn AgentTransport>,
    config: PanelConfig,

    inspecting: bool,
    framework: Framework,
    theme: Theme,
    options: Vec<SelectorOption>,
    selected: usize,
    output: String,
    history: Vec<SelectorOption>,
    /// Capture timestamp the current option list was rendered from.
    rendered_capture: Option<u64>,

    status: Option<Status>,
    pending_clear: Option<Instant>,
}

impl ControlPanel {
    pub fn open(
        store: SharedStore,
        transport: Box<dyn AgentTransport>,
        config: PanelConfig,
    ) -> Result<Self, StoreError> {
        let store_changes = store.subscribe()?;
        let snapshot = InspectionSnapshot::read(&store)?;

        let mut panel = ControlPanel {
            store,
            store_changes,
            transport,
            config,
            inspecting: snapshot.inspecting,
            framework: snapshot.framework,
            theme: snapshot.theme,
            options: snapshot.selector_options,
            selected: 0,
            output: snapshot.last_selector,
            history: snapshot.history,
            rendered_capture: snapshot.capture_timestamp,
            status: None,
            pending_clear: None,
        };

        // Keep a refined choice from an earlier session selected
        if !panel.options.is_empty() {
            panel.selected = panel
                .options
                .iter()
                .position(|o| o.format(panel.framework) == panel.output)
                .unwrap_or(0);
            panel.output = panel.options[panel.selected].format(panel.framework);
        }

        debug!(
            inspecting = panel.inspecting,
            options = panel.options.len(),
            history = panel.history.len(),
            "control panel opened"
        );
        Ok(panel)
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn is_inspecting(&self) -> bool {
        self.inspecting
    }

    pub fn framework(&self) -> Framework {
        self.framework
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn options(&self) -> &[SelectorOption] {
        &self.options
    }

    pub fn selected_index(&self) -> Option<usize> {
        (!self.options.is_empty()).then_some(self.selected)
    }

    /// Formatted locator in the output field.
    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn history(&self) -> &[SelectorOption] {
        &self.history
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_ref().map(|s| s.text.as_str())
    }

    pub fn is_empty_state(&self) -> bool {
        self.options.is_empty()
    }

    pub fn has_pending_clear(&self) -> bool {
        self.pending_clear.is_some()
    }

    // ------------------------------------------------------------------
    // User actions
    // ------------------------------------------------------------------

    pub fn set_inspecting(&mut self, on: bool) -> Result<Delivery, StoreError> {
        self.inspecting = on;
        self.store.set(StoreKey::Inspecting.as_str(), on)?;
        Ok(self.send(AgentMessage::ToggleBox(on)))
    }

    pub fn set_framework(&mut self, framework: Framework) -> Result<(), StoreError> {
        self.framework = framework;
        self.store.set(StoreKey::Framework.as_str(), framework)?;
        if !self.options.is_empty() {
            self.show_selected()?;
        }
        Ok(())
    }

    /// Pick option `index` as the output. Within the capture that produced
    /// the list, the choice also replaces the newest history entry.
    pub fn select_option(&mut self, index: usize) -> Result<(), StoreError> {
        if index >= self.options.len() {
            return Ok(());
        }
        self.selected = index;
        self.show_selected()?;

        let stored: Option<u64> = decode_or_default(
            StoreKey::CaptureTimestamp.as_str(),
            self.store.get(StoreKey::CaptureTimestamp.as_str())?,
        );
        if stored.is_some() && stored == self.rendered_capture {
            let entry = self.options[index].clone();
            if refine_latest(&mut self.history, entry) {
                self.store.set(StoreKey::History.as_str(), &self.history)?;
            }
        }
        Ok(())
    }

    /// Ask the page to preview option `index`.
    pub fn hover_option(&mut self, index: usize) -> Option<Delivery> {
        let selector = self.options.get(index)?.unique_selector.clone();
        Some(self.send(AgentMessage::HighlightSelector(Some(selector))))
    }

    pub fn leave_list(&mut self) -> Delivery {
        self.send(AgentMessage::HighlightSelector(None))
    }

    pub fn copy(&mut self, clipboard: &mut dyn Clipboard, now: Instant) {
        if self.output.is_empty() {
            return;
        }
        match clipboard.write_text(&self.output) {
            Ok(()) => {
                self.show_status(STATUS_COPIED, now);
                self.pending_clear = Some(now + self.config.copy_clear_delay);
            }
            Err(e) => {
                warn!(error = %e, "failed to copy locator");
                self.show_status(STATUS_COPY_FAILED, now);
            }
        }
    }

    pub fn clear(&mut self) -> Result<(), StoreError> {
        self.clear_output()?;
        self.show_status(STATUS_CLEARED, Instant::now());
        Ok(())
    }

    pub fn clear_history(&mut self) -> Result<(), StoreError> {
        self.history.clear();
        self.store.remove(&[StoreKey::History.as_str()])
    }

    pub fn toggle_theme(&mut self) -> Result<Theme, StoreError> {
        self.theme = self.theme.toggled();
        self.store.set(StoreKey::Theme.as_str(), self.theme)?;
        Ok(self.theme)
    }

    // ------------------------------------------------------------------
    // Store and timers
    // ------------------------------------------------------------------

    /// Apply pending store changes, newest value per field.
    pub fn pump(&mut self) -> Result<(), StoreError> {
        let mut changes = self.store_changes.drain_latest();

        if let Some(value) = changes.remove(StoreKey::Inspecting.as_str()) {
            self.inspecting = decode_or_default(StoreKey::Inspecting.as_str(), value);
        }
        if let Some(value) = changes.remove(StoreKey::History.as_str()) {
            self.history = decode_or_default(StoreKey::History.as_str(), value);
        }
        if let Some(value) = changes.remove(StoreKey::SelectorOptions.as_str()) {
            self.render_options(value)?;
        }
        Ok(())
    }

    /// Expire the status line and run a scheduled clear.
    pub fn tick(&mut self, now: Instant) -> Result<(), StoreError> {
        if self.status.as_ref().is_some_and(|s| now >= s.until) {
            self.status = None;
        }
        if self.pending_clear.is_some_and(|at| now >= at) {
            self.pending_clear = None;
            self.clear_output()?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn render_options(&mut self, value: Option<Value>) -> Result<(), StoreError> {
        self.options = decode_or_default(StoreKey::SelectorOptions.as_str(), value);
        self.selected = 0;

        if self.options.is_empty() {
            self.output.clear();
            self.rendered_capture = None;
            return Ok(());
        }

        self.rendered_capture = decode_or_default(
            StoreKey::CaptureTimestamp.as_str(),
            self.store.get(StoreKey::CaptureTimestamp.as_str())?,
        );
        self.show_selected()?;
        self.show_status(STATUS_OPTIONS_UPDATED, Instant::now());
        info!(options = self.options.len(), output = %self.output, "selector options updated");
        Ok(())
    }

    fn show_selected(&mut self) -> Result<(), StoreError> {
        if let Some(option) = self.options.get(self.selected) {
            self.output = option.format(self.framework);
            self.store.set(StoreKey::LastSelector.as_str(), &self.output)?;
        }
        Ok(())
    }

    fn clear_output(&mut self) -> Result<(), StoreError> {
        self.store.remove(&[
            StoreKey::SelectorOptions.as_str(),
            StoreKey::LastSelector.as_str(),
        ])
    }

    fn send(&mut self, message: AgentMessage) -> Delivery {
        let delivery = deliver(self.transport.as_mut(), &message, &self.config.retry);
        if let Delivery::Failed(e) = &delivery {
            warn!(error = %e, ?message, "page agent unreachable");
            self.show_status(STATUS_RELOAD, Instant::now());
        }
        delivery
    }

    fn show_status(&mut self, text: &str, now: Instant) {
        self.status = Some(Status {
            text: text.to_string(),
            until: now + self.config.status_duration,
        });
    }
}
