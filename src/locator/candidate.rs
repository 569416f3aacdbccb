use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::dom::dom_model::NodeId;
use crate::locator::formatter::{Framework, format_locator};

/// How a candidate's `value` should be turned into framework code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CandidateKind {
    #[serde(rename = "css")]
    AttributeCss,
    #[serde(rename = "placeholder")]
    Placeholder,
    #[serde(rename = "alt")]
    AltText,
    #[serde(rename = "text")]
    TextContent,
    #[serde(rename = "css-path")]
    CssPath,
}

impl CandidateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateKind::AttributeCss => "css",
            CandidateKind::Placeholder => "placeholder",
            CandidateKind::AltText => "alt",
            CandidateKind::TextContent => "text",
            CandidateKind::CssPath => "css-path",
        }
    }
}

impl fmt::Display for CandidateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CandidateKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "css" | "attribute-css" => Ok(CandidateKind::AttributeCss),
            "placeholder" => Ok(CandidateKind::Placeholder),
            "alt" | "alt-text" => Ok(CandidateKind::AltText),
            "text" | "text-content" => Ok(CandidateKind::TextContent),
            "css-path" => Ok(CandidateKind::CssPath),
            other => Err(other.to_string()),
        }
    }
}

/// A single locator proposal for the element under inspection.
///
/// `element` is a page-local handle; only `unique_element_path` survives
/// serialization (see `SelectorOption`).
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub kind: CandidateKind,
    pub value: String,
    pub label: String,
    pub priority: i32,
    pub unique_element_path: String,
    pub element: NodeId,
}

impl Candidate {
    pub fn format(&self, framework: Framework) -> String {
        format_locator(self.kind, &self.value, framework)
    }

    pub fn to_option(&self) -> SelectorOption {
        SelectorOption {
            kind: self.kind,
            value: self.value.clone(),
            label: self.label.clone(),
            unique_selector: self.unique_element_path.clone(),
        }
    }
}

/// The serialized shape of a candidate in the shared store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorOption {
    #[serde(rename = "type")]
    pub kind: CandidateKind,
    pub value: String,
    pub label: String,
    #[serde(rename = "uniqueSelector")]
    pub unique_selector: String,
}

impl SelectorOption {
    pub fn format(&self, framework: Framework) -> String {
        format_locator(self.kind, &self.value, framework)
    }
}

/// Candidates ordered by descending priority; index 0 is the best guess.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateSet {
    candidates: Vec<Candidate>,
}

impl CandidateSet {
    /// Stable-sorts by priority, so equal priorities keep generation order.
    pub fn from_generated(mut candidates: Vec<Candidate>) -> Self {
        candidates.sort_by(|a, b| b.priority.cmp(&a.priority));
        CandidateSet { candidates }
    }

    pub fn best(&self) -> Option<&Candidate> {
        self.candidates.first()
    }

    pub fn get(&self, index: usize) -> Option<&Candidate> {
        self.candidates.get(index)
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Candidate> {
        self.candidates.iter()
    }

    pub fn values(&self) -> Vec<&str> {
        self.candidates.iter().map(|c| c.value.as_str()).collect()
    }

    pub fn to_options(&self) -> Vec<SelectorOption> {
        self.candidates.iter().map(Candidate::to_option).collect()
    }
}

impl<'a> IntoIterator for &'a CandidateSet {
    type Item = &'a Candidate;
    type IntoIter = std::slice::Iter<'a, Candidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.candidates.iter()
    }
}
