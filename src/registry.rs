//! Definition registry: owns every message, service and alias of one run
//! (imports included) and drives emission once scanning is complete.

use crate::alias::AliasTable;
use crate::ast::{Message, Service};
use crate::config::{DuplicatePolicy, Options};
use crate::error::{DefinitionKind, ProtoError, ReferenceRole, Result};
use std::path::{Path, PathBuf};

/// Handle to a message created during scanning. Valid until emission starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Message,
    Service,
}

/// One rendered output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub title: String,
    pub path: PathBuf,
    pub contents: String,
}

/// Output directories and file extensions for emission.
#[derive(Debug, Clone)]
pub struct EmitTarget {
    pub message_dir: PathBuf,
    pub service_dir: PathBuf,
    pub message_extension: String,
    pub service_extension: String,
}

impl EmitTarget {
    pub fn new(options: &Options, message_dir: impl Into<PathBuf>, service_dir: impl Into<PathBuf>) -> Self {
        EmitTarget {
            message_dir: message_dir.into(),
            service_dir: service_dir.into(),
            message_extension: options.message_extension.clone(),
            service_extension: options.service_extension.clone(),
        }
    }

    fn message_path(&self, title: &str) -> PathBuf {
        file_path(&self.message_dir, title, &self.message_extension)
    }

    fn service_path(&self, title: &str) -> PathBuf {
        file_path(&self.service_dir, title, &self.service_extension)
    }
}

fn file_path(dir: &Path, title: &str, extension: &str) -> PathBuf {
    dir.join(format!("{}.{}", title, extension))
}

/// Outcome of a successful run.
#[derive(Debug, Default)]
pub struct EmitReport {
    pub messages: Vec<PathBuf>,
    pub services: Vec<PathBuf>,
    /// Non-fatal problems met while scanning (skipped imports, title collisions).
    pub warnings: Vec<ProtoError>,
}

#[derive(Debug, Default)]
pub struct Registry {
    messages: Vec<Message>,
    services: Vec<Service>,
    aliases: AliasTable,
    duplicates: DuplicatePolicy,
    warnings: Vec<ProtoError>,
}

impl Registry {
    pub fn new(duplicates: DuplicatePolicy) -> Self {
        Registry {
            duplicates,
            ..Default::default()
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    pub fn warnings(&self) -> &[ProtoError] {
        &self.warnings
    }

    /// Record a non-fatal problem.
    pub fn warn(&mut self, warning: ProtoError) {
        tracing::warn!("{}", warning);
        self.warnings.push(warning);
    }

    fn check_duplicate(&mut self, kind: DefinitionKind, title: &str) -> Result<()> {
        let exists = match kind {
            DefinitionKind::Message => self.messages.iter().any(|m| m.title == title),
            DefinitionKind::Service => self.services.iter().any(|s| s.title == title),
        };
        if !exists {
            return Ok(());
        }
        let err = ProtoError::DuplicateDefinition {
            kind,
            title: title.to_string(),
        };
        match self.duplicates {
            DuplicatePolicy::Allow => Ok(()),
            DuplicatePolicy::Warn => {
                self.warn(err);
                Ok(())
            }
            DuplicatePolicy::Reject => Err(err),
        }
    }

    pub fn create_message(&mut self, title: impl Into<String>) -> Result<MessageId> {
        let title = title.into();
        self.check_duplicate(DefinitionKind::Message, &title)?;
        tracing::debug!(title = %title, "message declared");
        self.messages.push(Message::new(title));
        Ok(MessageId(self.messages.len() - 1))
    }

    pub fn message_mut(&mut self, id: MessageId) -> Option<&mut Message> {
        self.messages.get_mut(id.0)
    }

    /// Register a service descriptor; its messages are bound at emission.
    pub fn create_service(
        &mut self,
        title: impl Into<String>,
        request_title: impl Into<String>,
        response_title: impl Into<String>,
        comment: Option<String>,
    ) -> Result<()> {
        let service = Service::new(title, request_title, response_title, comment);
        self.check_duplicate(DefinitionKind::Service, &service.title)?;
        tracing::debug!(title = %service.title, request = %service.request_title, response = %service.response_title, "service declared");
        self.services.push(service);
        Ok(())
    }

    pub fn define_alias(&mut self, name: &str, is_leaf: bool, referenced_type: &str) {
        tracing::debug!(alias = name, is_leaf, referenced = referenced_type, "alias defined");
        self.aliases.define(name, is_leaf, referenced_type);
    }

    /// Remove and return the first message titled `title`.
    pub fn take_message(&mut self, title: &str) -> Option<Message> {
        let index = self.messages.iter().position(|m| m.title == title)?;
        Some(self.messages.remove(index))
    }

    /// Render every service (claiming its two messages), then every leftover message.
    ///
    /// Services are processed in declaration order; the first dangling
    /// reference aborts the whole plan.
    pub fn render_all(&mut self, target: &EmitTarget) -> Result<Vec<Artifact>> {
        let services = std::mem::take(&mut self.services);
        let mut artifacts = Vec::with_capacity(services.len() + self.messages.len());

        for service in &services {
            let mut request = self.claim(service, ReferenceRole::Request, &service.request_title)?;
            let mut response = self.claim(service, ReferenceRole::Response, &service.response_title)?;
            request.resolve_fields(&self.aliases)?;
            response.resolve_fields(&self.aliases)?;
            artifacts.push(Artifact {
                kind: ArtifactKind::Service,
                title: service.title.clone(),
                path: target.service_path(&service.title),
                contents: service.render(&request, &response),
            });
        }

        for mut message in std::mem::take(&mut self.messages) {
            message.resolve_fields(&self.aliases)?;
            artifacts.push(Artifact {
                kind: ArtifactKind::Message,
                path: target.message_path(&message.title),
                contents: message.render(),
                title: message.title,
            });
        }

        Ok(artifacts)
    }

    fn claim(&mut self, service: &Service, role: ReferenceRole, title: &str) -> Result<Message> {
        self.take_message(title).ok_or_else(|| ProtoError::DanglingReference {
            service: service.title.clone(),
            role,
            title: title.to_string(),
        })
    }

    /// Render everything, then write it. Nothing is written if rendering fails.
    pub fn emit_all(&mut self, target: &EmitTarget) -> Result<EmitReport> {
        let artifacts = self.render_all(target)?;
        let mut report = EmitReport {
            warnings: std::mem::take(&mut self.warnings),
            ..Default::default()
        };
        for artifact in artifacts {
            std::fs::write(&artifact.path, &artifact.contents)
                .map_err(|e| ProtoError::io(&artifact.path, e))?;
            tracing::info!(path = %artifact.path.display(), "{} file written", match artifact.kind {
                ArtifactKind::Message => "message",
                ArtifactKind::Service => "service",
            });
            match artifact.kind {
                ArtifactKind::Message => report.messages.push(artifact.path),
                ArtifactKind::Service => report.services.push(artifact.path),
            }
        }
        Ok(report)
    }
}
