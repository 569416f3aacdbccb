use std::fmt::Write as _;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing::info;

use crate::{
    cli::config::AppConfig,
    dom::dom_model::{Document, NodeId},
    error::{ChannelError, HelperError},
    host::{page_host::PageHost, transport::HostTransport},
    inspector::pointer::PointerEvent,
    locator::{
        candidate::{CandidateKind, SelectorOption},
        formatter::{Framework, format_locator},
        generator::CandidateGenerator,
    },
    panel::control_panel::ControlPanel,
    sync::{
        channel::Delivery,
        schema::{InspectionSnapshot, StoreKey},
        store::SharedStore,
    },
    trace::logger::TraceLogger,
};

// ============================================================================
// Shared helpers
// ============================================================================

/// CLI flag first, then the config file.
pub fn resolve_framework(flag: Option<&str>, config: &AppConfig) -> Result<Framework, HelperError> {
    match flag {
        Some(name) => name.parse::<Framework>().map_err(|value| HelperError::UnknownValue {
            what: "framework",
            value,
        }),
        None => Ok(config.framework),
    }
}

/// Persistent store at `path`, or an in-memory one.
pub fn open_store(path: Option<&str>) -> Result<SharedStore, HelperError> {
    match path {
        Some(p) => Ok(SharedStore::open(p)?),
        None => Ok(SharedStore::in_memory()),
    }
}

/// The single element `selector` designates.
pub fn resolve_target(doc: &Document, selector: &str) -> Result<NodeId, HelperError> {
    let found = doc.query_selector_all(selector)?;
    match found.as_slice() {
        [node] => Ok(*node),
        _ => Err(HelperError::AmbiguousTarget {
            selector: selector.to_string(),
            count: found.len(),
        }),
    }
}

fn render_options(out: &mut String, options: &[SelectorOption], selected: Option<usize>) {
    if options.is_empty() {
        let _ = writeln!(out, "No element selected.");
        return;
    }
    for (i, option) in options.iter().enumerate() {
        let marker = if Some(i) == selected { '*' } else { ' ' };
        let _ = writeln!(out, "  {} [{}] {}: {}", marker, i, option.label, option.value);
    }
}

// ============================================================================
// candidates subcommand
// ============================================================================

#[derive(Debug, Serialize)]
struct CandidateRow<'a> {
    #[serde(rename = "type")]
    kind: CandidateKind,
    value: &'a str,
    label: &'a str,
    priority: i32,
    #[serde(rename = "uniqueSelector")]
    unique_selector: &'a str,
    locator: String,
}

pub fn cmd_candidates(
    dom_path: &str,
    target: &str,
    framework: Framework,
    json: bool,
    config: &AppConfig,
) -> Result<String, HelperError> {
    let document = Document::load(dom_path)?;
    let node = resolve_target(&document, target)?;

    let generator = CandidateGenerator::with_config(&document, config.agent_config().generator);
    let candidates = generator.generate(node);

    if json {
        let rows: Vec<CandidateRow<'_>> = candidates
            .iter()
            .map(|c| CandidateRow {
                kind: c.kind,
                value: &c.value,
                label: &c.label,
                priority: c.priority,
                unique_selector: &c.unique_element_path,
                locator: c.format(framework),
            })
            .collect();
        return Ok(serde_json::to_string_pretty(&rows)? + "\n");
    }

    let mut out = String::new();
    let _ = writeln!(out, "{} candidates for '{}' ({}):", candidates.len(), target, framework);
    for candidate in &candidates {
        let _ = writeln!(
            out,
            "  [{:>2}] {:<32} {}",
            candidate.priority,
            candidate.label,
            candidate.format(framework)
        );
    }
    Ok(out)
}

// ============================================================================
// format subcommand
// ============================================================================

pub fn cmd_format(kind: &str, value: &str, framework: Framework) -> Result<String, HelperError> {
    let kind: CandidateKind = kind.parse().map_err(|value| HelperError::UnknownValue {
        what: "candidate kind",
        value,
    })?;
    Ok(format_locator(kind, value, framework) + "\n")
}

// ============================================================================
// capture subcommand
// ============================================================================

pub struct CaptureRequest<'a> {
    pub dom_path: &'a str,
    pub target: &'a str,
    pub select: Option<usize>,
    pub trace_path: Option<&'a str>,
    pub framework: Framework,
}

/// Drive a whole inspection round against a page built from a snapshot:
/// turn inspecting on from the panel, hover and click the target in the
/// page, then read the result back through the panel.
pub fn cmd_capture(
    request: &CaptureRequest<'_>,
    store: SharedStore,
    config: &AppConfig,
) -> Result<String, HelperError> {
    let document = Document::load(request.dom_path)?;
    let target = resolve_target(&document, request.target)?;
    store.set(StoreKey::Framework.as_str(), request.framework)?;

    let mut host = PageHost::new(document, store.clone()).with_agent_config(config.agent_config());
    if let Some(path) = request.trace_path.or(config.trace_path.as_deref()) {
        host = host.with_tracer(Arc::new(TraceLogger::new(path)));
    }
    let host = Arc::new(Mutex::new(host));

    let transport = HostTransport::new(Arc::clone(&host));
    let mut panel = ControlPanel::open(store, Box::new(transport), config.panel_config())?;

    if let Delivery::Failed(e) = panel.set_inspecting(true)? {
        return Err(e.into());
    }

    {
        let mut host = host
            .lock()
            .map_err(|e| ChannelError::HostUnavailable(e.to_string()))?;
        host.pump();
        host.dispatch_pointer(PointerEvent::over(target));
        host.dispatch_pointer(PointerEvent::click(target));
        host.pump();
    }
    panel.pump()?;

    if let Some(index) = request.select {
        if index >= panel.options().len() {
            return Err(HelperError::UnknownValue {
                what: "option index",
                value: index.to_string(),
            });
        }
        panel.select_option(index)?;
    }
    info!(output = panel.output(), "capture complete");

    let mut out = String::new();
    let _ = writeln!(out, "Captured: {}", panel.output());
    let _ = writeln!(out, "Options:");
    render_options(&mut out, panel.options(), panel.selected_index());
    Ok(out)
}

// ============================================================================
// history / clear subcommands
// ============================================================================

pub fn cmd_history(store: &SharedStore, framework: Framework, json: bool) -> Result<String, HelperError> {
    let snapshot = InspectionSnapshot::read(store)?;
    if json {
        return Ok(serde_json::to_string_pretty(&snapshot.history)? + "\n");
    }

    let mut out = String::new();
    if snapshot.history.is_empty() {
        let _ = writeln!(out, "History is empty.");
    }
    for (i, entry) in snapshot.history.iter().enumerate() {
        let _ = writeln!(out, "{:>3}. {:<32} {}", i + 1, entry.label, entry.format(framework));
    }
    Ok(out)
}

pub fn cmd_clear(store: &SharedStore, history: bool) -> Result<String, HelperError> {
    let mut keys = vec![StoreKey::SelectorOptions.as_str(), StoreKey::LastSelector.as_str()];
    if history {
        keys.push(StoreKey::History.as_str());
    }
    store.remove(&keys)?;
    Ok("Cleared!\n".to_string())
}
