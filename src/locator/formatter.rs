use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{dom::escape::escape_attr_value, locator::candidate::CandidateKind};

/// Test framework whose locator API the generated code targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Framework {
    #[default]
    Cypress,
    Playwright,
}

impl Framework {
    pub fn as_str(&self) -> &'static str {
        match self {
            Framework::Cypress => "cypress",
            Framework::Playwright => "playwright",
        }
    }
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Framework {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cypress" => Ok(Framework::Cypress),
            "playwright" => Ok(Framework::Playwright),
            other => Err(other.to_string()),
        }
    }
}

/// Render a locator as ready-to-paste framework code.
///
/// Every value lands inside a single-quoted JS string, so `\` and `'` are
/// escaped for that layer. Cypress attribute forms also nest the value in a
/// double-quoted CSS string and get CSS escaping first.
pub fn format_locator(kind: CandidateKind, value: &str, framework: Framework) -> String {
    match framework {
        Framework::Cypress => match kind {
            CandidateKind::TextContent => format!("cy.contains('{}')", escape_quote(value)),
            CandidateKind::Placeholder => {
                format!("cy.get('[placeholder=\"{}\"]')", escape_quote(&escape_attr_value(value)))
            }
            CandidateKind::AltText => {
                format!("cy.get('[alt=\"{}\"]')", escape_quote(&escape_attr_value(value)))
            }
            CandidateKind::AttributeCss | CandidateKind::CssPath => {
                format!("cy.get('{}')", escape_quote(value))
            }
        },
        Framework::Playwright => match kind {
            CandidateKind::TextContent => format!("page.getByText('{}')", escape_quote(value)),
            CandidateKind::Placeholder => {
                format!("page.getByPlaceholder('{}')", escape_quote(value))
            }
            CandidateKind::AltText => format!("page.getByAltText('{}')", escape_quote(value)),
            CandidateKind::AttributeCss | CandidateKind::CssPath => {
                format!("page.locator('{}')", escape_quote(value))
            }
        },
    }
}

/// Escape a value for a single-quoted JS string literal.
pub fn escape_quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            _ => out.push(ch),
        }
    }
    out
}
