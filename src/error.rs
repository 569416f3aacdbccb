use thiserror::Error;

/// A selector string could not be parsed.
///
/// Resolution failures (zero or several matches) are not errors; callers
/// get an empty or multi-element result and decide what that means.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,

    #[error("invalid selector '{selector}' at {position}: {reason}")]
    Syntax {
        selector: String,
        position: usize,
        reason: String,
    },
}

/// Building a `Document` from a JSON DOM snapshot failed.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read DOM snapshot '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("malformed DOM snapshot: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store file '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("store JSON error ({context}): {source}")]
    Json {
        context: String,
        source: serde_json::Error,
    },

    #[error("store lock poisoned")]
    Poisoned,
}

/// A one-shot message could not reach the page agent.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("no page agent is listening in the target page")]
    NoReceiver,

    #[error("page agent injection failed: {0}")]
    InjectionFailed(String),

    #[error("page host unavailable: {0}")]
    HostUnavailable(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("malformed config '{path}': {source}")]
    Yaml {
        path: String,
        source: serde_yaml::Error,
    },
}

/// Top-level error for the CLI and the capture pipeline.
#[derive(Debug, Error)]
pub enum HelperError {
    #[error(transparent)]
    Selector(#[from] SelectorError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("target '{selector}' matched {count} elements, expected exactly one")]
    AmbiguousTarget { selector: String, count: usize },

    #[error("failed to render output: {0}")]
    Output(#[from] serde_json::Error),

    #[error("unknown {what} '{value}'")]
    UnknownValue { what: &'static str, value: String },
}
