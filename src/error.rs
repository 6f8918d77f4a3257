//! Error kinds raised while scanning, resolving and emitting.

use std::path::PathBuf;

/// Which side of an rpc a dangling reference was found on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceRole {
    Request,
    Response,
}

impl std::fmt::Display for ReferenceRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReferenceRole::Request => f.write_str("request"),
            ReferenceRole::Response => f.write_str("response"),
        }
    }
}

/// Kind of definition involved in a title collision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionKind {
    Message,
    Service,
}

impl std::fmt::Display for DefinitionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DefinitionKind::Message => f.write_str("message"),
            DefinitionKind::Service => f.write_str("service"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProtoError {
    /// Root (or imported) source does not declare `syntax = "proto3";`.
    #[error("{}: unsupported syntax version {}, only proto3 is implemented", path.display(), found.as_deref().unwrap_or("<missing>"))]
    UnsupportedSyntaxVersion {
        path: PathBuf,
        found: Option<String>,
    },
    /// Non-fatal: recorded as a warning and the import is skipped.
    #[error("can't import {}: file not found", path.display())]
    MissingImport { path: PathBuf },
    #[error("unresolved alias `{name}`")]
    UnresolvedAlias { name: String },
    #[error("cyclic alias chain: {}", chain.join(" -> "))]
    CyclicAlias { chain: Vec<String> },
    #[error("cyclic import of {}", path.display())]
    CyclicImport { path: PathBuf },
    #[error("service `{service}`: {role} message `{title}` was not declared (or already claimed)")]
    DanglingReference {
        service: String,
        role: ReferenceRole,
        title: String,
    },
    #[error("duplicate {kind} `{title}`")]
    DuplicateDefinition { kind: DefinitionKind, title: String },
    #[error("{}: {}", path.display(), source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ProtoError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ProtoError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ProtoError>;
