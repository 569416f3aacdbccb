use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::locator::candidate::SelectorOption;
use crate::locator::formatter::Framework;
use crate::sync::store::{SharedStore, decode_or_default};

/// Field names of the shared store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKey {
    Inspecting,
    Framework,
    LastSelector,
    SelectorOptions,
    CaptureTimestamp,
    History,
    Theme,
}

impl StoreKey {
    pub const fn as_str(self) -> &'static str {
        match self {
            StoreKey::Inspecting => "inspecting",
            StoreKey::Framework => "framework",
            StoreKey::LastSelector => "lastSelector",
            StoreKey::SelectorOptions => "selectorOptions",
            StoreKey::CaptureTimestamp => "captureTimestamp",
            StoreKey::History => "history",
            StoreKey::Theme => "theme",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// Typed view of everything both contexts persist in the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InspectionSnapshot {
    pub inspecting: bool,
    pub framework: Framework,
    pub last_selector: String,
    pub selector_options: Vec<SelectorOption>,
    pub capture_timestamp: Option<u64>,
    pub history: Vec<SelectorOption>,
    pub theme: Theme,
}

impl InspectionSnapshot {
    /// Read all fields. Missing or malformed fields fall back to defaults.
    pub fn read(store: &SharedStore) -> Result<Self, StoreError> {
        let field = |key: StoreKey| store.get(key.as_str());

        Ok(InspectionSnapshot {
            inspecting: decode_or_default(StoreKey::Inspecting.as_str(), field(StoreKey::Inspecting)?),
            framework: decode_or_default(StoreKey::Framework.as_str(), field(StoreKey::Framework)?),
            last_selector: decode_or_default(
                StoreKey::LastSelector.as_str(),
                field(StoreKey::LastSelector)?,
            ),
            selector_options: decode_or_default(
                StoreKey::SelectorOptions.as_str(),
                field(StoreKey::SelectorOptions)?,
            ),
            capture_timestamp: decode_or_default(
                StoreKey::CaptureTimestamp.as_str(),
                field(StoreKey::CaptureTimestamp)?,
            ),
            history: decode_or_default(StoreKey::History.as_str(), field(StoreKey::History)?),
            theme: decode_or_default(StoreKey::Theme.as_str(), field(StoreKey::Theme)?),
        })
    }
}
