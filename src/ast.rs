//! Parsed definitions: fields, messages and service descriptors, and their
//! rendering into ROS 2 interface text.

use crate::alias::{AliasTable, ARRAY_SUFFIX};
use crate::error::Result;

/// Separator between the request and response sections of a service file.
pub const SERVICE_SEPARATOR: &str = "---";

/// Protocol label in front of a field type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Repeated,
    Optional,
    Required,
}

impl Label {
    pub fn parse(s: &str) -> Option<Label> {
        match s {
            "repeated" => Some(Label::Repeated),
            "optional" => Some(Label::Optional),
            "required" => Some(Label::Required),
            _ => None,
        }
    }
}

/// One declared message field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub label: Option<Label>,
    pub type_name: String,
    pub field_name: String,
    /// Numeric tag as written; carried through, never emitted.
    pub declared_id: String,
    pub comment: Option<String>,
    /// Set while `type_name` still names an alias.
    pub pending_alias: bool,
    /// Extra array dimensions from the legacy repeat prefix.
    pub extra_dims: usize,
}

impl Field {
    pub fn new(
        label: Option<Label>,
        type_name: impl Into<String>,
        field_name: impl Into<String>,
        declared_id: impl Into<String>,
        comment: Option<String>,
        pending_alias: bool,
    ) -> Self {
        Field {
            label,
            type_name: type_name.into(),
            field_name: field_name.into(),
            declared_id: declared_id.into(),
            comment: comment.filter(|c| !c.is_empty()),
            pending_alias,
            extra_dims: 0,
        }
    }

    pub fn with_extra_dims(mut self, dims: usize) -> Self {
        self.extra_dims = dims;
        self
    }

    pub fn is_repeated(&self) -> bool {
        self.label == Some(Label::Repeated)
    }

    /// Substitute the alias chain into `type_name`. No-op once resolved.
    pub fn resolve_type(&mut self, aliases: &AliasTable) -> Result<()> {
        if self.pending_alias {
            self.type_name = aliases.resolve(&self.type_name)?;
            self.pending_alias = false;
        }
        Ok(())
    }

    /// `<type>[[]...] <name> [#comment]` terminated by a newline.
    pub fn render(&self) -> String {
        let mut out = self.type_name.trim_start_matches('.').replace('.', "/");
        out.push_str(&ARRAY_SUFFIX.repeat(self.extra_dims));
        if self.is_repeated() {
            out.push_str(ARRAY_SUFFIX);
        }
        if self.pending_alias {
            out.push_str(ARRAY_SUFFIX);
        }
        out.push(' ');
        out.push_str(&self.field_name);
        out.push(' ');
        if let Some(comment) = &self.comment {
            out.push('#');
            out.push_str(comment);
        }
        out.push('\n');
        out
    }
}

/// Ordered fields under a title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub title: String,
    pub fields: Vec<Field>,
}

impl Message {
    pub fn new(title: impl Into<String>) -> Self {
        Message {
            title: title.into(),
            fields: Vec::new(),
        }
    }

    pub fn add_field(&mut self, field: Field) {
        self.fields.push(field);
    }

    pub fn resolve_fields(&mut self, aliases: &AliasTable) -> Result<()> {
        for field in &mut self.fields {
            field.resolve_type(aliases)?;
        }
        Ok(())
    }

    pub fn render(&self) -> String {
        self.fields.iter().map(Field::render).collect()
    }
}

/// An rpc declaration; the request/response messages are bound by title at emission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Service {
    pub title: String,
    pub request_title: String,
    pub response_title: String,
    pub comment: Option<String>,
}

impl Service {
    pub fn new(
        title: impl Into<String>,
        request_title: impl Into<String>,
        response_title: impl Into<String>,
        comment: Option<String>,
    ) -> Self {
        Service {
            title: title.into(),
            request_title: request_title.into(),
            response_title: response_title.into(),
            comment: comment.filter(|c| !c.is_empty()),
        }
    }

    /// Both messages must already be resolved.
    pub fn render(&self, request: &Message, response: &Message) -> String {
        let mut out = String::new();
        if let Some(comment) = &self.comment {
            out.push('#');
            out.push_str(comment);
            out.push('\n');
        }
        out.push_str(&request.render());
        out.push_str(SERVICE_SEPARATOR);
        out.push('\n');
        out.push_str(&response.render());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(label: Option<Label>, ty: &str, name: &str) -> Field {
        Field::new(label, ty, name, "1", None, false)
    }

    #[test]
    fn render_plain_field() {
        assert_eq!(field(None, "string", "name").render(), "string name \n");
    }

    #[test]
    fn render_repeated_with_comment() {
        let f = Field::new(Some(Label::Repeated), "int32", "xs", "2", Some(" samples".into()), false);
        assert_eq!(f.render(), "int32[] xs # samples\n");
    }

    #[test]
    fn render_maps_package_separators() {
        assert_eq!(field(None, "geometry.Point", "p").render(), "geometry/Point p \n");
        assert_eq!(field(None, ".geometry.Point", "p").render(), "geometry/Point p \n");
    }

    #[test]
    fn empty_comment_is_absent() {
        let f = Field::new(None, "bool", "ok", "1", Some(String::new()), false);
        assert!(f.comment.is_none());
        assert_eq!(f.render(), "bool ok \n");
    }

    #[test]
    fn optional_label_is_not_rendered() {
        assert_eq!(field(Some(Label::Optional), "float", "v").render(), "float v \n");
    }

    #[test]
    fn unresolved_alias_renders_extra_suffix() {
        let f = Field::new(Some(Label::Repeated), "Bar", "rows", "1", None, true);
        assert_eq!(f.render(), "Bar[][] rows \n");
    }

    #[test]
    fn resolve_type_is_idempotent() {
        let mut aliases = AliasTable::new();
        aliases.define("Bar", true, "Foo");
        let mut f = Field::new(Some(Label::Repeated), "Bar", "rows", "1", None, true);
        f.resolve_type(&aliases).unwrap();
        let first = f.render();
        f.resolve_type(&aliases).unwrap();
        assert_eq!(f.render(), first);
        assert_eq!(first, "Foo[][] rows \n");
        assert!(!f.pending_alias);
    }

    #[test]
    fn extra_dims_render_as_suffixes() {
        let f = field(None, "Foo", "grid").with_extra_dims(2);
        assert_eq!(f.render(), "Foo[][] grid \n");
    }

    #[test]
    fn message_renders_in_declaration_order() {
        let mut m = Message::new("Pose");
        m.add_field(field(None, "float64", "x"));
        m.add_field(field(None, "float64", "y"));
        m.add_field(field(None, "float64", "z"));
        let out = m.render();
        let names: Vec<&str> = out.lines().map(|l| l.split(' ').nth(1).unwrap()).collect();
        assert_eq!(names, vec!["x", "y", "z"]);
    }

    #[test]
    fn service_render_layout() {
        let mut req = Message::new("Req");
        req.add_field(field(None, "string", "query"));
        let mut resp = Message::new("Resp");
        resp.add_field(field(Some(Label::Repeated), "string", "hits"));
        let srv = Service::new("Search", "Req", "Resp", Some(" find things".into()));
        assert_eq!(
            srv.render(&req, &resp),
            "# find things\nstring query \n---\nstring[] hits \n"
        );
    }

    #[test]
    fn service_without_comment_or_fields() {
        let srv = Service::new("Ping", "Empty", "Empty", None);
        assert_eq!(srv.render(&Message::new("Empty"), &Message::new("Empty")), "---\n");
    }
}
