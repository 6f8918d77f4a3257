//! # proto2ros: proto3 to ROS 2 interface translator
//!
//! Reads a proto3 source (following its imports) and writes one `.msg` file
//! per message and one `.srv` file per rpc.
//!
//! ## Pipeline
//!
//! 1. **Scan**: [`Scanner`] walks the source line by line through four states
//!    (idle, message, service, alias block) and fills a [`Registry`].
//! 2. **Resolve**: fields that reference a repeated-message alias get the
//!    alias chain substituted, one `[]` per hop ([`AliasTable`]).
//! 3. **Emit**: every rpc claims its request and response messages and
//!    becomes a service file; leftover messages become message files.
//!
//! ## Repeated-message aliases
//!
//! proto3 has no nested repetition, so an alias declares a named array type:
//!
//! ```text
//! message repeated Row {
//!   float32 val = 1;        // leaf: Row = float32[]
//! }
//! message repeated Grid {
//!   repeated Row val = 1;   // chain: Grid = float32[][]
//! }
//! message Map {
//!   optional repeated Grid cells = 1;   // -> float32[][] cells
//!   repeated repeated Row rows = 2;     // -> float32[][] rows
//! }
//! ```
//!
//! ## Usage
//!
//! ```no_run
//! let report = proto2ros::run("robot.proto", "msg", "srv")?;
//! println!("{} messages, {} services", report.messages.len(), report.services.len());
//! # Ok::<(), proto2ros::ProtoError>(())
//! ```

pub mod alias;
pub mod ast;
pub mod config;
pub mod error;
pub mod output;
pub mod parser;
pub mod registry;
pub mod scanner;

pub use alias::{Alias, AliasTable};
pub use ast::{Field, Label, Message, Service};
pub use config::{DuplicatePolicy, Options};
pub use error::{ProtoError, Result};
pub use registry::{Artifact, ArtifactKind, EmitReport, EmitTarget, Registry};
pub use scanner::Scanner;

use std::path::{Path, PathBuf};

/// Translate `source` with default options.
pub fn run(
    source: impl AsRef<Path>,
    message_dest: impl Into<PathBuf>,
    service_dest: impl Into<PathBuf>,
) -> Result<EmitReport> {
    run_with_options(&Options::default(), source, message_dest, service_dest)
}

/// Scan `source` and its imports, then write message and service files.
///
/// The destination directories must exist.
pub fn run_with_options(
    options: &Options,
    source: impl AsRef<Path>,
    message_dest: impl Into<PathBuf>,
    service_dest: impl Into<PathBuf>,
) -> Result<EmitReport> {
    let source = source.as_ref();
    let import_root = options
        .import_root
        .clone()
        .unwrap_or_else(|| source.parent().map(Path::to_path_buf).unwrap_or_default());

    let mut registry = Registry::new(options.duplicates);
    Scanner::new(&mut registry, options, import_root).scan_file(source)?;
    tracing::debug!(
        messages = registry.messages().len(),
        services = registry.services().len(),
        aliases = registry.aliases().len(),
        "scan complete"
    );

    let target = EmitTarget::new(options, message_dest, service_dest);
    registry.emit_all(&target)
}

/// Scan in-memory source and render artifacts without touching the filesystem
/// (imports are still read, relative to `options.import_root` or the current directory).
pub fn render_str(options: &Options, source: &str, target: &EmitTarget) -> Result<Vec<Artifact>> {
    let import_root = options.import_root.clone().unwrap_or_default();
    let mut registry = Registry::new(options.duplicates);
    Scanner::new(&mut registry, options, import_root).scan_str(Path::new("<memory>"), source)?;
    registry.render_all(target)
}
