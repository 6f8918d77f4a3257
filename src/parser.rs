//! Classify single source lines using the PEST line grammar.
//!
//! Each `parse_*` function returns `None` when the line does not have the
//! requested shape; the scanner decides what a non-matching line means in
//! its current state.

use crate::alias::unqualified;
use crate::ast::Label;
use pest::iterators::{Pair, Pairs};
use pest::Parser;
use pest_derive::Parser as PestParser;

#[derive(PestParser)]
#[grammar = "grammar.pest"]
struct LineParser;

/// A field declaration as written, before any alias handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    pub label: Option<Label>,
    /// `repeated` directly before the type, after a label.
    pub modifier: bool,
    pub type_name: String,
    pub name: String,
    pub id: String,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcDecl {
    pub name: String,
    pub request: String,
    pub response: String,
    /// The rpc opens an options block that continues on following lines.
    pub opens_block: bool,
    pub comment: Option<String>,
}

/// Items found on one line plus the braces around them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockLine<T> {
    pub items: Vec<T>,
    pub opened: bool,
    pub closed: bool,
    /// Trailing comment not attached to an item.
    pub comment: Option<String>,
}

impl<T> Default for BlockLine<T> {
    fn default() -> Self {
        BlockLine {
            items: Vec::new(),
            opened: false,
            closed: false,
            comment: None,
        }
    }
}

impl<T> BlockLine<T> {
    /// Blank or comment-only line.
    pub fn is_trivia(&self) -> bool {
        self.items.is_empty() && !self.opened && !self.closed
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Header {
    /// `message repeated Name {`
    Alias { name: String, body: BlockLine<FieldDecl> },
    /// `message Name {`
    Message { title: String, body: BlockLine<FieldDecl> },
    /// `service Name {`
    Service { title: String, body: BlockLine<RpcDecl> },
}

trait BlockItem: Sized {
    const RULE: Rule;
    fn build(pair: Pair<'_, Rule>) -> Self;
    fn set_comment(&mut self, comment: String);
}

impl BlockItem for FieldDecl {
    const RULE: Rule = Rule::field;

    fn build(pair: Pair<'_, Rule>) -> Self {
        let mut decl = FieldDecl {
            label: None,
            modifier: false,
            type_name: String::new(),
            name: String::new(),
            id: String::new(),
            comment: None,
        };
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::label => decl.label = Label::parse(inner.as_str()),
                Rule::modifier => decl.modifier = true,
                Rule::type_name => decl.type_name = inner.as_str().to_string(),
                Rule::ident => decl.name = inner.as_str().to_string(),
                Rule::field_id => decl.id = inner.as_str().to_string(),
                _ => {}
            }
        }
        decl
    }

    fn set_comment(&mut self, comment: String) {
        self.comment = Some(comment);
    }
}

impl BlockItem for RpcDecl {
    const RULE: Rule = Rule::rpc;

    fn build(pair: Pair<'_, Rule>) -> Self {
        let mut decl = RpcDecl {
            name: String::new(),
            request: String::new(),
            response: String::new(),
            opens_block: false,
            comment: None,
        };
        let mut types = 0;
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::ident => decl.name = inner.as_str().to_string(),
                Rule::type_name => {
                    let title = unqualified(inner.as_str()).to_string();
                    if types == 0 {
                        decl.request = title;
                    } else {
                        decl.response = title;
                    }
                    types += 1;
                }
                Rule::open_brace => decl.opens_block = true,
                Rule::close_brace => decl.opens_block = false,
                _ => {}
            }
        }
        decl
    }

    fn set_comment(&mut self, comment: String) {
        self.comment = Some(comment);
    }
}

fn parse_rule(rule: Rule, line: &str) -> Option<Pair<'_, Rule>> {
    LineParser::parse(rule, line).ok().and_then(|mut pairs| pairs.next())
}

fn comment_text(pair: Pair<'_, Rule>) -> Option<String> {
    pair.into_inner()
        .next()
        .map(|text| text.as_str().trim_end().to_string())
        .filter(|text| !text.is_empty())
}

/// Collect items, braces and the trailing comment; the comment goes to the last item.
fn block_line<T: BlockItem>(pairs: Pairs<'_, Rule>) -> BlockLine<T> {
    let mut line = BlockLine::default();
    for pair in pairs {
        match pair.as_rule() {
            r if r == T::RULE => line.items.push(T::build(pair)),
            Rule::open_brace => line.opened = true,
            Rule::close_brace => line.closed = true,
            Rule::comment => line.comment = comment_text(pair),
            _ => {}
        }
    }
    if let Some(last) = line.items.last_mut() {
        if let Some(comment) = line.comment.take() {
            last.set_comment(comment);
        }
    }
    line
}

fn title(pair: &Pair<'_, Rule>) -> String {
    pair.clone()
        .into_inner()
        .find(|p| p.as_rule() == Rule::ident)
        .map(|p| p.as_str().to_string())
        .unwrap_or_default()
}

/// Value of a `syntax = "...";` declaration.
pub fn parse_syntax(line: &str) -> Option<String> {
    let pair = parse_rule(Rule::syntax_line, line)?;
    pair.into_inner()
        .find(|p| p.as_rule() == Rule::quoted)
        .and_then(|q| q.into_inner().next())
        .map(|text| text.as_str().to_string())
}

/// Target path of an `import "...";` declaration, as written.
pub fn parse_import(line: &str) -> Option<String> {
    let pair = parse_rule(Rule::import_line, line)?;
    pair.into_inner()
        .find(|p| p.as_rule() == Rule::import_path)
        .and_then(|p| p.into_inner().next())
        .map(|target| target.as_str().to_string())
}

/// Message, alias or service header, with any fields/rpcs written inline.
pub fn parse_header(line: &str) -> Option<Header> {
    if let Some(pair) = parse_rule(Rule::alias_line, line) {
        let name = title(&pair);
        return Some(Header::Alias {
            name,
            body: block_line(pair.into_inner()),
        });
    }
    if let Some(pair) = parse_rule(Rule::message_line, line) {
        let title = title(&pair);
        return Some(Header::Message {
            title,
            body: block_line(pair.into_inner()),
        });
    }
    if let Some(pair) = parse_rule(Rule::service_line, line) {
        let title = title(&pair);
        return Some(Header::Service {
            title,
            body: block_line(pair.into_inner()),
        });
    }
    None
}

/// `oneof name {` inside a message; its fields belong to the message.
pub fn parse_oneof(line: &str) -> Option<BlockLine<FieldDecl>> {
    parse_rule(Rule::oneof_line, line).map(|pair| block_line(pair.into_inner()))
}

/// Zero or more field declarations, optionally followed by `}`.
pub fn parse_field_line(line: &str) -> Option<BlockLine<FieldDecl>> {
    parse_rule(Rule::field_line, line).map(|pair| block_line(pair.into_inner()))
}

/// Zero or more rpc declarations, optionally followed by `}`.
pub fn parse_rpc_line(line: &str) -> Option<BlockLine<RpcDecl>> {
    parse_rule(Rule::rpc_line, line).map(|pair| block_line(pair.into_inner()))
}

/// Braces of a line that matched nothing else, in order.
///
/// Braces inside string literals, `//` comments and `/* */` comments are not
/// counted. `in_comment` carries an unterminated `/*` over to the next line.
pub fn braces(line: &str, in_comment: &mut bool) -> Vec<char> {
    let mut found = Vec::new();
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        if *in_comment {
            if c == '*' && chars.peek() == Some(&'/') {
                chars.next();
                *in_comment = false;
            }
            continue;
        }
        match c {
            '/' if chars.peek() == Some(&'/') => break,
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                *in_comment = true;
            }
            '"' | '\'' => {
                while let Some(q) = chars.next() {
                    match q {
                        '\\' => {
                            chars.next();
                        }
                        q if q == c => break,
                        _ => {}
                    }
                }
            }
            '{' | '}' => found.push(c),
            _ => {}
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_line_both_quotes() {
        assert_eq!(parse_syntax(r#"syntax = "proto3";"#).as_deref(), Some("proto3"));
        assert_eq!(parse_syntax("syntax='proto2';").as_deref(), Some("proto2"));
        assert_eq!(parse_syntax("syntaxx = \"proto3\";"), None);
        assert_eq!(parse_syntax("message Foo {"), None);
    }

    #[test]
    fn import_targets() {
        assert_eq!(parse_import(r#"import "common/types";"#).as_deref(), Some("common/types"));
        assert_eq!(
            parse_import(r#"import public "a/b/c.proto"; // shared"#).as_deref(),
            Some("a/b/c.proto")
        );
        assert_eq!(parse_import("// import \"x\";"), None);
    }

    #[test]
    fn plain_field() {
        let line = parse_field_line("  string name = 1;").unwrap();
        assert_eq!(line.items.len(), 1);
        let f = &line.items[0];
        assert_eq!(f.label, None);
        assert!(!f.modifier);
        assert_eq!(f.type_name, "string");
        assert_eq!(f.name, "name");
        assert_eq!(f.id, "1");
        assert!(!line.closed);
    }

    #[test]
    fn repeated_label_is_not_the_modifier() {
        let f = &parse_field_line("repeated int32 xs = 2;").unwrap().items[0];
        assert_eq!(f.label, Some(Label::Repeated));
        assert!(!f.modifier);
        assert_eq!(f.type_name, "int32");
    }

    #[test]
    fn label_then_modifier() {
        let f = &parse_field_line("repeated repeated Row rows = 3;").unwrap().items[0];
        assert_eq!(f.label, Some(Label::Repeated));
        assert!(f.modifier);
        assert_eq!(f.type_name, "Row");

        let f = &parse_field_line("optional repeated Row row = 4;").unwrap().items[0];
        assert_eq!(f.label, Some(Label::Optional));
        assert!(f.modifier);
    }

    #[test]
    fn field_comments() {
        let f = &parse_field_line("float64 x = 1; // metres").unwrap().items[0];
        assert_eq!(f.comment.as_deref(), Some(" metres"));
        let f = &parse_field_line("float64 y = 2; /* metres */").unwrap().items[0];
        assert_eq!(f.comment.as_deref(), Some(" metres"));
        let f = &parse_field_line("float64 z = 3; //").unwrap().items[0];
        assert_eq!(f.comment, None);
    }

    #[test]
    fn qualified_type_and_options() {
        let f = &parse_field_line("repeated geometry.Point pts = 5 [packed = true];").unwrap().items[0];
        assert_eq!(f.type_name, "geometry.Point");
        assert_eq!(f.id, "5");
    }

    #[test]
    fn closing_and_trivia_lines() {
        let line = parse_field_line("}").unwrap();
        assert!(line.closed && line.items.is_empty());
        assert!(parse_field_line("").unwrap().is_trivia());
        assert!(parse_field_line("   // just a note").unwrap().is_trivia());
        let line = parse_field_line("bool ok = 1; }").unwrap();
        assert_eq!(line.items.len(), 1);
        assert!(line.closed);
    }

    #[test]
    fn non_field_lines_do_not_match() {
        assert!(parse_field_line("reserved 2, 15;").is_none());
        assert!(parse_field_line("map<string, int32> m = 1;").is_none());
        assert!(parse_field_line("oneof choice {").is_none());
        assert!(parse_field_line("FOO = 0;").is_none());
    }

    #[test]
    fn headers() {
        match parse_header("message Pose {").unwrap() {
            Header::Message { title, body } => {
                assert_eq!(title, "Pose");
                assert!(body.opened && !body.closed);
            }
            other => panic!("unexpected {:?}", other),
        }
        match parse_header("message repeated Row {").unwrap() {
            Header::Alias { name, .. } => assert_eq!(name, "Row"),
            other => panic!("unexpected {:?}", other),
        }
        match parse_header("service Planner {").unwrap() {
            Header::Service { title, .. } => assert_eq!(title, "Planner"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(parse_header("enum Kind {").is_none());
        assert!(parse_header("messages Foo {").is_none());
    }

    #[test]
    fn header_without_brace() {
        match parse_header("message Pose").unwrap() {
            Header::Message { body, .. } => assert!(!body.opened),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn inline_bodies() {
        match parse_header("message Foo { string name = 1; }").unwrap() {
            Header::Message { body, .. } => {
                assert_eq!(body.items.len(), 1);
                assert!(body.opened && body.closed);
            }
            other => panic!("unexpected {:?}", other),
        }
        match parse_header("message repeated Bar { Foo val = 1; }").unwrap() {
            Header::Alias { name, body } => {
                assert_eq!(name, "Bar");
                assert_eq!(body.items[0].type_name, "Foo");
                assert!(body.closed);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn rpc_forms() {
        let line = parse_rpc_line("rpc GetPose(PoseRequest) returns (PoseResponse); // fetch").unwrap();
        let rpc = &line.items[0];
        assert_eq!(rpc.name, "GetPose");
        assert_eq!(rpc.request, "PoseRequest");
        assert_eq!(rpc.response, "PoseResponse");
        assert_eq!(rpc.comment.as_deref(), Some(" fetch"));
        assert!(!rpc.opens_block);

        let rpc = &parse_rpc_line("rpc Ping (nav.Empty) returns (nav.Empty) {}").unwrap().items[0];
        assert_eq!(rpc.request, "Empty");
        assert!(!rpc.opens_block);

        let rpc = &parse_rpc_line("rpc Stream(A) returns (B) {").unwrap().items[0];
        assert!(rpc.opens_block);
    }

    #[test]
    fn service_with_inline_rpc() {
        match parse_header("service S { rpc A(B) returns (C); }").unwrap() {
            Header::Service { body, .. } => {
                assert_eq!(body.items.len(), 1);
                assert!(body.closed);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn braces_skip_line_comments() {
        let mut in_comment = false;
        assert_eq!(braces("enum Kind { // }", &mut in_comment), vec!['{']);
        assert!(!in_comment);
    }

    #[test]
    fn braces_skip_string_literals() {
        let mut in_comment = false;
        assert!(braces("option (doc) = \"see {x\";", &mut in_comment).is_empty());
        assert!(braces("option (doc) = 'a \\' }';", &mut in_comment).is_empty());
        assert_eq!(braces("option (url) = \"http://x\"; }", &mut in_comment), vec!['}']);
    }

    #[test]
    fn block_comments_span_lines() {
        let mut in_comment = false;
        assert!(braces("/* Example:", &mut in_comment).is_empty());
        assert!(in_comment);
        assert!(braces(" * { x: 1", &mut in_comment).is_empty());
        assert_eq!(braces(" */ }", &mut in_comment), vec!['}']);
        assert!(!in_comment);
        assert_eq!(braces("{ /* } */ }", &mut in_comment), vec!['{', '}']);
    }
}
