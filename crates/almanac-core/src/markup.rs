//! Markup tree and serialiser.
//!
//! [`Document`] is an arena of nodes addressed by [`NodeId`]. It can be
//! driven two ways: directly through node ids (the fluent API in
//! [`crate::html5`] does this) or through the cursor-based
//! [`MarkupBuilder`] trait, which is all the calendar renderer needs.

use std::fmt::Write as _;
use std::str::FromStr;

use anyhow::anyhow;
use tracing::trace;

/// Id for node references inside a [`Document`].
pub type NodeId = usize;

/// Tree-construction primitives used to realise generated markup.
///
/// Implementors keep an "open element" cursor: `append_element` opens a
/// child of the current element and descends into it, `close_element`
/// climbs back to the parent.
pub trait MarkupBuilder {
    fn append_element(&mut self, tag: &str);

    /// Sets an attribute on the current element, replacing any previous
    /// value of the same name.
    fn set_attribute(&mut self, name: &str, value: &str);

    /// Adds a class token to the current element.
    fn set_class(&mut self, class: &str);

    fn append_text(&mut self, text: &str);

    fn close_element(&mut self);

    fn render(&self) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    #[default]
    Html,
    Xhtml,
}

impl FromStr for OutputMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "html" | "html5" => Ok(Self::Html),
            "xhtml" | "xhtml5" | "xml" => Ok(Self::Xhtml),
            other => Err(anyhow!("unknown output mode: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    Text(String),
    /// A boolean attribute such as `checked`.
    Flag,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: AttrValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NodeData {
    Element {
        tag: String,
        attributes: Vec<Attribute>,
    },
    Text(String),
    Raw(String),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

#[derive(Debug, Clone, Default)]
pub struct Document {
    mode: OutputMode,
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
    cursor: Vec<NodeId>,
}

impl Document {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|node| node.parent)
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.nodes.get(id)?.data {
            NodeData::Element { tag, .. } => Some(tag.as_str()),
            _ => None,
        }
    }

    /// Text value of an attribute. Flags read as their own name.
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        let NodeData::Element { attributes, .. } = &self.nodes.get(id)?.data else {
            return None;
        };
        attributes
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| match &attr.value {
                AttrValue::Text(value) => value.as_str(),
                AttrValue::Flag => attr.name.as_str(),
            })
    }

    /// Creates an element below `parent`, or at the top level for `None`.
    pub fn create_element(&mut self, parent: Option<NodeId>, tag: &str) -> NodeId {
        self.push_node(
            parent,
            NodeData::Element {
                tag: tag.to_string(),
                attributes: Vec::new(),
            },
        )
    }

    pub fn create_text(&mut self, parent: Option<NodeId>, text: &str) -> NodeId {
        self.push_node(parent, NodeData::Text(text.to_string()))
    }

    /// Appends pre-rendered markup that is written out unescaped.
    pub fn create_raw(&mut self, parent: Option<NodeId>, markup: &str) -> NodeId {
        self.push_node(parent, NodeData::Raw(markup.to_string()))
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: AttrValue) {
        let Some(attributes) = self.attributes_mut(id) else {
            trace!(id, name, "ignoring attribute on non-element node");
            return;
        };
        if let Some(existing) = attributes.iter_mut().find(|attr| attr.name == name) {
            existing.value = value;
        } else {
            attributes.push(Attribute {
                name: name.to_string(),
                value,
            });
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        if let Some(attributes) = self.attributes_mut(id) {
            attributes.retain(|attr| attr.name != name);
        }
    }

    /// Adds whitespace-separated class tokens, skipping duplicates.
    pub fn add_class(&mut self, id: NodeId, class: &str) {
        let mut tokens: Vec<String> = self
            .attribute(id, "class")
            .map(|current| current.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        let before = tokens.len();
        for token in class.split_whitespace() {
            if !tokens.iter().any(|existing| existing == token) {
                tokens.push(token.to_string());
            }
        }
        if tokens.len() != before {
            self.set_attr(id, "class", AttrValue::Text(tokens.join(" ")));
        }
    }

    /// Innermost element opened through [`MarkupBuilder`].
    pub fn current(&self) -> Option<NodeId> {
        self.cursor.last().copied()
    }

    /// Serialises the whole document without added whitespace.
    pub fn render_compact(&self) -> String {
        let mut out = String::new();
        for &root in &self.roots {
            self.write_compact(&mut out, root);
        }
        out
    }

    /// Serialises the whole document, one block-level element per line.
    pub fn render_pretty(&self, indent: &str) -> String {
        let mut out = String::new();
        for &root in &self.roots {
            self.write_pretty(&mut out, root, indent, 0);
        }
        trim_trailing_newline(out)
    }

    /// Serialises a single subtree.
    pub fn render_node(&self, id: NodeId, pretty: Option<&str>) -> String {
        let mut out = String::new();
        match pretty {
            Some(indent) => {
                self.write_pretty(&mut out, id, indent, 0);
                trim_trailing_newline(out)
            }
            None => {
                self.write_compact(&mut out, id);
                out
            }
        }
    }

    /// Full document text with doctype (and XML declaration in XHTML mode).
    pub fn to_document_string(&self, pretty: bool) -> String {
        let body = if pretty {
            self.render_pretty("\t")
        } else {
            self.render_compact()
        };
        let mut out = String::new();
        if self.mode == OutputMode::Xhtml {
            out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        }
        out.push_str("<!DOCTYPE html>\n");
        out.push_str(&body);
        out
    }

    fn push_node(&mut self, parent: Option<NodeId>, data: NodeData) -> NodeId {
        let id = self.nodes.len();
        let parent = parent.filter(|&pid| pid < id);
        self.nodes.push(Node {
            parent,
            children: Vec::new(),
            data,
        });
        match parent {
            Some(pid) => self.nodes[pid].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    fn attributes_mut(&mut self, id: NodeId) -> Option<&mut Vec<Attribute>> {
        match &mut self.nodes.get_mut(id)?.data {
            NodeData::Element { attributes, .. } => Some(attributes),
            _ => None,
        }
    }

    fn write_compact(&self, out: &mut String, id: NodeId) {
        let node = &self.nodes[id];
        match &node.data {
            NodeData::Text(text) => escape_into(out, text),
            NodeData::Raw(markup) => out.push_str(markup),
            NodeData::Element { tag, attributes } => {
                self.write_start_tag(out, tag, attributes);
                if is_void(tag) {
                    return;
                }
                for &child in &node.children {
                    self.write_compact(out, child);
                }
                let _ = write!(out, "</{tag}>");
            }
        }
    }

    fn write_pretty(&self, out: &mut String, id: NodeId, indent: &str, depth: usize) {
        let node = &self.nodes[id];
        let pad = indent.repeat(depth);
        match &node.data {
            NodeData::Element { tag, attributes }
                if !is_void(tag) && self.has_block_child(id) =>
            {
                out.push_str(&pad);
                self.write_start_tag(out, tag, attributes);
                out.push('\n');
                for &child in &node.children {
                    self.write_pretty(out, child, indent, depth + 1);
                }
                let _ = writeln!(out, "{pad}</{tag}>");
            }
            _ => {
                out.push_str(&pad);
                self.write_compact(out, id);
                out.push('\n');
            }
        }
    }

    fn write_start_tag(&self, out: &mut String, tag: &str, attributes: &[Attribute]) {
        out.push('<');
        out.push_str(tag);
        for attr in attributes {
            match (&attr.value, self.mode) {
                (AttrValue::Flag, OutputMode::Html) => {
                    let _ = write!(out, " {}", attr.name);
                }
                (AttrValue::Flag, OutputMode::Xhtml) => {
                    let _ = write!(out, " {0}=\"{0}\"", attr.name);
                }
                (AttrValue::Text(value), _) => {
                    let _ = write!(out, " {}=\"", attr.name);
                    escape_into(out, value);
                    out.push('"');
                }
            }
        }
        if self.mode == OutputMode::Xhtml && is_void(tag) {
            out.push_str(" />");
        } else {
            out.push('>');
        }
    }

    fn has_block_child(&self, id: NodeId) -> bool {
        self.nodes[id].children.iter().any(|&child| {
            matches!(&self.nodes[child].data, NodeData::Element { tag, .. } if is_block(tag))
        })
    }
}

impl MarkupBuilder for Document {
    fn append_element(&mut self, tag: &str) {
        let id = self.create_element(self.current(), tag);
        self.cursor.push(id);
    }

    fn set_attribute(&mut self, name: &str, value: &str) {
        match self.current() {
            Some(id) => self.set_attr(id, name, AttrValue::Text(value.to_string())),
            None => trace!(name, "no open element; attribute dropped"),
        }
    }

    fn set_class(&mut self, class: &str) {
        match self.current() {
            Some(id) => self.add_class(id, class),
            None => trace!(class, "no open element; class dropped"),
        }
    }

    fn append_text(&mut self, text: &str) {
        if !text.is_empty() {
            self.create_text(self.current(), text);
        }
    }

    fn close_element(&mut self) {
        self.cursor.pop();
    }

    fn render(&self) -> String {
        self.render_pretty("\t")
    }
}

/// Escapes text and attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    escape_into(&mut out, text);
    out
}

fn escape_into(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '\'' => out.push_str("&#39;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

fn trim_trailing_newline(mut out: String) -> String {
    if out.ends_with('\n') {
        out.pop();
    }
    out
}

/// Whether this is a void tag whose element may not have children.
pub fn is_void(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

/// Elements that get a line of their own when pretty printing.
fn is_block(tag: &str) -> bool {
    matches!(
        tag,
        "html"
            | "head"
            | "body"
            | "title"
            | "meta"
            | "link"
            | "script"
            | "style"
            | "section"
            | "article"
            | "nav"
            | "aside"
            | "header"
            | "footer"
            | "main"
            | "address"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "div"
            | "p"
            | "hr"
            | "pre"
            | "blockquote"
            | "figure"
            | "figcaption"
            | "ul"
            | "ol"
            | "li"
            | "dl"
            | "dt"
            | "dd"
            | "table"
            | "caption"
            | "colgroup"
            | "col"
            | "thead"
            | "tbody"
            | "tfoot"
            | "tr"
            | "th"
            | "td"
            | "form"
            | "fieldset"
            | "legend"
            | "select"
            | "optgroup"
            | "option"
            | "textarea"
    )
}
