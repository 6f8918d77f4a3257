//! Line scanner: a four-state machine over the physical lines of a proto3
//! source, following imports into the same registry.
//!
//! ```text
//! IDLE --message--> IN_MESSAGE --}--> IDLE
//! IDLE --message repeated--> IN_ALIAS_BLOCK --}--> IDLE
//! IDLE --service--> IN_SERVICE --}--> IDLE
//! ```
//!
//! Import lines are honored in every state, before the line is evaluated
//! against the current state.

use crate::ast::{Field, Label};
use crate::config::{Options, SOURCE_EXTENSION};
use crate::error::{ProtoError, Result};
use crate::parser::{self, BlockLine, FieldDecl, Header, RpcDecl};
use crate::registry::{MessageId, Registry};
use std::collections::HashSet;
use std::ffi::OsString;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// The only syntax version translated.
pub const SUPPORTED_SYNTAX: &str = "proto3";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Nesting {
    /// `oneof`: fields still belong to the enclosing message.
    Transparent,
    /// Nested message, enum, option aggregate: skipped.
    Opaque,
}

#[derive(Debug, Clone, Default)]
struct Block {
    /// Header was written without `{`.
    awaiting_open: bool,
    nested: Vec<Nesting>,
    /// Kind of the next nested block, set by a `oneof` header without `{`.
    pending: Option<Nesting>,
    /// Inside a `/* */` comment that started on an earlier line.
    in_comment: bool,
}

impl Block {
    fn in_scope(&self) -> bool {
        !self.awaiting_open && self.nested.iter().all(|n| *n == Nesting::Transparent)
    }

    /// One `}`; returns true when it closes the block itself.
    fn close(&mut self) -> bool {
        if self.awaiting_open {
            return true;
        }
        self.nested.pop().is_none()
    }

    fn open(&mut self, nesting: Nesting) {
        if self.awaiting_open {
            self.awaiting_open = false;
        } else {
            self.nested.push(self.pending.take().unwrap_or(nesting));
        }
    }

    /// Braces of a line nothing else matched; returns true when the block closed.
    fn skip_line(&mut self, line: &str) -> bool {
        for brace in parser::braces(line, &mut self.in_comment) {
            match brace {
                '{' => self.open(Nesting::Opaque),
                _ => {
                    if self.close() {
                        return true;
                    }
                }
            }
        }
        false
    }
}

#[derive(Debug)]
enum State {
    Idle,
    Message { id: MessageId, block: Block },
    Alias { name: String, block: Block },
    Service { title: String, block: Block },
}

/// Where the fields of the current block go.
enum FieldSink<'s> {
    Message(MessageId),
    Alias(&'s str),
}

pub struct Scanner<'a> {
    registry: &'a mut Registry,
    options: &'a Options,
    import_root: PathBuf,
    /// Canonical paths of the files currently being scanned.
    stack: Vec<PathBuf>,
    scanned: HashSet<PathBuf>,
}

impl<'a> Scanner<'a> {
    pub fn new(registry: &'a mut Registry, options: &'a Options, import_root: impl Into<PathBuf>) -> Self {
        Scanner {
            registry,
            options,
            import_root: import_root.into(),
            stack: Vec::new(),
            scanned: HashSet::new(),
        }
    }

    /// Scan the root source file and, transitively, everything it imports.
    pub fn scan_file(&mut self, path: &Path) -> Result<()> {
        self.scan_path(path, true)
    }

    /// Scan root source text held in memory; `origin` names it in errors.
    pub fn scan_str(&mut self, origin: &Path, source: &str) -> Result<()> {
        self.scan_reader(origin, source.as_bytes(), true)
    }

    fn scan_path(&mut self, path: &Path, is_root: bool) -> Result<()> {
        let key = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        if self.stack.contains(&key) {
            return Err(ProtoError::CyclicImport {
                path: path.to_path_buf(),
            });
        }
        if !self.scanned.insert(key.clone()) {
            tracing::debug!(path = %path.display(), "already scanned, skipping");
            return Ok(());
        }
        let file = File::open(path).map_err(|e| ProtoError::io(path, e))?;
        self.stack.push(key);
        let result = self.scan_reader(path, BufReader::new(file), is_root);
        self.stack.pop();
        result
    }

    /// Run the state machine over every line of `reader`.
    ///
    /// The root source must declare `syntax = "proto3";` before anything
    /// other than blank or comment lines. Imported sources may omit it.
    pub fn scan_reader<R: BufRead>(&mut self, origin: &Path, reader: R, is_root: bool) -> Result<()> {
        let mut state = State::Idle;
        let mut syntax_seen = !is_root;
        for line in reader.lines() {
            let line = line.map_err(|e| ProtoError::io(origin, e))?;
            if let Some(version) = parser::parse_syntax(&line) {
                if version != SUPPORTED_SYNTAX {
                    return Err(ProtoError::UnsupportedSyntaxVersion {
                        path: origin.to_path_buf(),
                        found: Some(version),
                    });
                }
                tracing::debug!(path = %origin.display(), "{} detected", SUPPORTED_SYNTAX);
                syntax_seen = true;
                continue;
            }
            if !syntax_seen {
                if parser::parse_field_line(&line).is_some_and(|l| l.is_trivia()) {
                    continue;
                }
                return Err(ProtoError::UnsupportedSyntaxVersion {
                    path: origin.to_path_buf(),
                    found: None,
                });
            }
            state = self.scan_line(state, &line)?;
        }
        if !syntax_seen {
            return Err(ProtoError::UnsupportedSyntaxVersion {
                path: origin.to_path_buf(),
                found: None,
            });
        }
        Ok(())
    }

    fn scan_line(&mut self, state: State, line: &str) -> Result<State> {
        if let Some(target) = parser::parse_import(line) {
            self.import(&target)?;
        }
        match state {
            State::Idle => self.idle(line),
            State::Message { id, mut block } => {
                if self.field_block(&mut block, &FieldSink::Message(id), line)? {
                    Ok(State::Idle)
                } else {
                    Ok(State::Message { id, block })
                }
            }
            State::Alias { name, mut block } => {
                if self.field_block(&mut block, &FieldSink::Alias(&name), line)? {
                    Ok(State::Idle)
                } else {
                    Ok(State::Alias { name, block })
                }
            }
            State::Service { title, mut block } => {
                if self.service_block(&mut block, line)? {
                    tracing::debug!(service = %title, "service block closed");
                    Ok(State::Idle)
                } else {
                    Ok(State::Service { title, block })
                }
            }
        }
    }

    fn import_path(&self, target: &str) -> PathBuf {
        let path = self.import_root.join(target);
        if path.extension().is_some_and(|ext| ext == SOURCE_EXTENSION) {
            return path;
        }
        let mut with_ext = OsString::from(path);
        with_ext.push(".");
        with_ext.push(SOURCE_EXTENSION);
        PathBuf::from(with_ext)
    }

    fn import(&mut self, target: &str) -> Result<()> {
        let path = self.import_path(target);
        if !path.is_file() {
            self.registry.warn(ProtoError::MissingImport { path });
            return Ok(());
        }
        tracing::debug!(path = %path.display(), "importing");
        self.scan_path(&path, false)
    }

    fn idle(&mut self, line: &str) -> Result<State> {
        let Some(header) = parser::parse_header(line) else {
            return Ok(State::Idle);
        };
        match header {
            Header::Alias { name, body } => {
                for decl in &body.items {
                    self.accept_field(&FieldSink::Alias(&name), decl)?;
                }
                Ok(match enter(&body) {
                    Some(block) => State::Alias { name, block },
                    None => State::Idle,
                })
            }
            Header::Message { title, body } => {
                let id = self.registry.create_message(title)?;
                let sink = FieldSink::Message(id);
                for decl in &body.items {
                    self.accept_field(&sink, decl)?;
                }
                Ok(match enter(&body) {
                    Some(block) => State::Message { id, block },
                    None => State::Idle,
                })
            }
            Header::Service { title, body } => {
                let Some(mut block) = enter(&body) else {
                    for rpc in &body.items {
                        self.accept_rpc(rpc)?;
                    }
                    return Ok(State::Idle);
                };
                self.accept_rpcs(&mut block, &body)?;
                Ok(State::Service { title, block })
            }
        }
    }

    /// Shared handler for message and alias blocks. Returns true when the block closed.
    fn field_block(&mut self, block: &mut Block, sink: &FieldSink<'_>, line: &str) -> Result<bool> {
        if block.in_comment {
            return Ok(block.skip_line(line));
        }
        if let Some(fields) = parser::parse_field_line(line) {
            if block.in_scope() {
                for decl in &fields.items {
                    self.accept_field(sink, decl)?;
                }
            }
            return Ok(fields.closed && block.close());
        }
        if let Some(oneof) = parser::parse_oneof(line) {
            if block.in_scope() && oneof.opened {
                for decl in &oneof.items {
                    self.accept_field(sink, decl)?;
                }
            }
            if oneof.opened && !oneof.closed {
                block.open(Nesting::Transparent);
            } else if !oneof.opened && !oneof.closed {
                block.pending = Some(Nesting::Transparent);
            }
            return Ok(false);
        }
        Ok(block.skip_line(line))
    }

    fn service_block(&mut self, block: &mut Block, line: &str) -> Result<bool> {
        if block.in_comment {
            return Ok(block.skip_line(line));
        }
        if let Some(rpcs) = parser::parse_rpc_line(line) {
            if block.in_scope() {
                self.accept_rpcs(block, &rpcs)?;
            }
            return Ok(rpcs.closed && block.close());
        }
        Ok(block.skip_line(line))
    }

    fn accept_rpcs(&mut self, block: &mut Block, rpcs: &BlockLine<RpcDecl>) -> Result<()> {
        for rpc in &rpcs.items {
            self.accept_rpc(rpc)?;
            if rpc.opens_block {
                block.open(Nesting::Opaque);
            }
        }
        Ok(())
    }

    fn accept_rpc(&mut self, rpc: &RpcDecl) -> Result<()> {
        self.registry
            .create_service(&rpc.name, &rpc.request, &rpc.response, rpc.comment.clone())
    }

    fn accept_field(&mut self, sink: &FieldSink<'_>, decl: &FieldDecl) -> Result<()> {
        match sink {
            FieldSink::Alias(name) => {
                let is_leaf = !(decl.modifier || decl.label == Some(Label::Repeated));
                self.registry.define_alias(name, is_leaf, &decl.type_name);
            }
            FieldSink::Message(id) => {
                let (type_name, dims) = strip_repeat_prefix(&decl.type_name, self.options.repeat_prefix.as_deref());
                let field = Field::new(
                    decl.label,
                    type_name,
                    decl.name.as_str(),
                    decl.id.as_str(),
                    decl.comment.clone(),
                    decl.modifier,
                )
                .with_extra_dims(dims);
                if let Some(message) = self.registry.message_mut(*id) {
                    message.add_field(field);
                }
            }
        }
        Ok(())
    }
}

/// Block state after a header line, or `None` when the header closed its body inline.
fn enter<T>(body: &BlockLine<T>) -> Option<Block> {
    if body.closed {
        return None;
    }
    Some(Block {
        awaiting_open: !body.opened,
        ..Block::default()
    })
}

/// `RptRptFoo` with prefix `Rpt` -> (`Foo`, 2). A type made only of the prefix is left alone.
fn strip_repeat_prefix<'t>(type_name: &'t str, prefix: Option<&str>) -> (&'t str, usize) {
    let Some(prefix) = prefix.filter(|p| !p.is_empty()) else {
        return (type_name, 0);
    };
    let mut rest = type_name;
    let mut dims = 0;
    while let Some(stripped) = rest.strip_prefix(prefix) {
        if stripped.is_empty() {
            break;
        }
        rest = stripped;
        dims += 1;
    }
    (rest, dims)
}
