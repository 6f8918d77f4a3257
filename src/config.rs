//! Run configuration shared by the scanner, the registry and the CLI.

use std::path::PathBuf;

/// What to do when two messages (or two services) share a title.
///
/// Lookup by title always returns the first declaration; the policy only
/// controls whether the collision is reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    Allow,
    #[default]
    Warn,
    Reject,
}

impl std::str::FromStr for DuplicatePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "allow" => Ok(DuplicatePolicy::Allow),
            "warn" => Ok(DuplicatePolicy::Warn),
            "reject" => Ok(DuplicatePolicy::Reject),
            other => Err(format!("unknown duplicate policy `{}` (allow, warn, reject)", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Options {
    /// Extension of emitted message files (without the dot).
    pub message_extension: String,
    /// Extension of emitted service files (without the dot).
    pub service_extension: String,
    /// Directory import paths are joined onto. `None` uses the directory of
    /// the root source.
    pub import_root: Option<PathBuf>,
    pub duplicates: DuplicatePolicy,
    /// Legacy type prefix: each leading occurrence adds one array dimension.
    pub repeat_prefix: Option<String>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            message_extension: "msg".to_string(),
            service_extension: "srv".to_string(),
            import_root: None,
            duplicates: DuplicatePolicy::default(),
            repeat_prefix: None,
        }
    }
}

/// Extension appended to import targets that don't carry one.
pub const SOURCE_EXTENSION: &str = "proto";
