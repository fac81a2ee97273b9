//! Fluent HTML5 element API.
//!
//! An [`Html5`] owns a [`Document`]; [`Element`] handles borrow it mutably
//! and hand out child handles, so markup is written the way it nests:
//!
//! ```
//! use almanac_core::html5::Html5;
//! use almanac_core::markup::OutputMode;
//!
//! let mut page = Html5::create_sub(OutputMode::Html);
//! page.root().p("Read the ").a("manual", "/manual").replace_class("doc");
//! assert_eq!(
//!     page.render_compact(),
//!     "<p>Read the <a href=\"/manual\" class=\"doc\">manual</a></p>"
//! );
//! ```

use crate::markup::{AttrValue, Document, MarkupBuilder, NodeId, OutputMode};

const XHTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

#[derive(Debug, Clone)]
pub struct Html5 {
    doc: Document,
    root: Option<NodeId>,
}

impl Html5 {
    /// Creates a document rooted at an `html` element, with optional `lang`
    /// and application cache `manifest` attributes.
    pub fn create_html(mode: OutputMode, lang: Option<&str>, manifest: Option<&str>) -> Self {
        let mut doc = Document::new(mode);
        let root = doc.create_element(None, "html");
        if mode == OutputMode::Xhtml {
            doc.set_attr(root, "xmlns", AttrValue::Text(XHTML_NAMESPACE.to_string()));
        }
        if let Some(lang) = lang {
            let name = match mode {
                OutputMode::Html => "lang",
                OutputMode::Xhtml => "xml:lang",
            };
            doc.set_attr(root, name, AttrValue::Text(lang.to_string()));
        }
        if let Some(manifest) = manifest {
            doc.set_attr(root, "manifest", AttrValue::Text(manifest.to_string()));
        }
        Self {
            doc,
            root: Some(root),
        }
    }

    /// Creates a fragment without a root element.
    pub fn create_sub(mode: OutputMode) -> Self {
        Self {
            doc: Document::new(mode),
            root: None,
        }
    }

    /// Handle to the `html` element, or to the top level of a fragment.
    pub fn root(&mut self) -> Element<'_> {
        Element::new(&mut self.doc, self.root)
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn render_compact(&self) -> String {
        self.doc.render_compact()
    }

    pub fn render_pretty(&self) -> String {
        self.doc.render_pretty("\t")
    }

    /// Markup with doctype; fragments render without one.
    pub fn to_document_string(&self, pretty: bool) -> String {
        match self.root {
            Some(_) => self.doc.to_document_string(pretty),
            None if pretty => self.render_pretty(),
            None => self.render_compact(),
        }
    }
}

/// Mutable handle to one element (or to the top level of a fragment).
///
/// Handles also implement [`MarkupBuilder`]; elements appended through it
/// are placed below the handle's element.
#[derive(Debug)]
pub struct Element<'a> {
    doc: &'a mut Document,
    id: Option<NodeId>,
    open: Vec<NodeId>,
}

macro_rules! content_elements {
    ($($(#[$meta:meta])* $name:ident => $tag:literal;)*) => {
        $(
            $(#[$meta])*
            pub fn $name(&mut self, content: &str) -> Element<'_> {
                self.child_with_text($tag, content)
            }
        )*
    };
}

macro_rules! container_elements {
    ($($name:ident => $tag:literal;)*) => {
        $(
            pub fn $name(&mut self) -> Element<'_> {
                self.child($tag)
            }
        )*
    };
}

macro_rules! flag_setters {
    ($($name:ident => $attr:literal;)*) => {
        $(
            pub fn $name(self, on: bool) -> Self {
                self.flag($attr, on)
            }
        )*
    };
}

impl<'a> Element<'a> {
    fn new(doc: &'a mut Document, id: Option<NodeId>) -> Self {
        Self {
            doc,
            id,
            open: Vec::new(),
        }
    }

    pub fn id(&self) -> Option<NodeId> {
        self.id
    }

    /// Appends a child element and returns its handle.
    pub fn child(&mut self, tag: &str) -> Element<'_> {
        let id = self.doc.create_element(self.id, tag);
        Element::new(&mut *self.doc, Some(id))
    }

    /// Appends a child element holding `content`; empty content adds no
    /// text node.
    pub fn child_with_text(&mut self, tag: &str, content: &str) -> Element<'_> {
        let id = self.doc.create_element(self.id, tag);
        if !content.is_empty() {
            self.doc.create_text(Some(id), content);
        }
        Element::new(&mut *self.doc, Some(id))
    }

    pub fn text(&mut self, text: &str) -> &mut Self {
        if !text.is_empty() {
            self.doc.create_text(self.id, text);
        }
        self
    }

    /// Inserts pre-rendered markup verbatim.
    pub fn raw(&mut self, markup: &str) -> &mut Self {
        self.doc.create_raw(self.id, markup);
        self
    }

    /// Sets an attribute; `None` leaves the element untouched.
    pub fn attrib(self, name: &str, value: Option<&str>) -> Self {
        if let (Some(id), Some(value)) = (self.id, value) {
            self.doc.set_attr(id, name, AttrValue::Text(value.to_string()));
        }
        self
    }

    /// Sets or removes a boolean attribute.
    pub fn flag(self, name: &str, on: bool) -> Self {
        if let Some(id) = self.id {
            if on {
                self.doc.set_attr(id, name, AttrValue::Flag);
            } else {
                self.doc.remove_attr(id, name);
            }
        }
        self
    }

    /// Sets a boolean attribute when the element's `value` is one of
    /// `values`.
    pub fn flag_for_values(self, name: &str, values: &[&str]) -> Self {
        let matches = self
            .id
            .and_then(|id| self.doc.attribute(id, "value"))
            .is_some_and(|value| values.iter().any(|candidate| *candidate == value));
        self.flag(name, matches)
    }

    pub fn set_id(self, id: &str) -> Self {
        self.attrib("id", Some(id))
    }

    /// Replaces the class attribute of this handle's element.
    pub fn replace_class(self, class: &str) -> Self {
        self.attrib("class", Some(class))
    }

    pub fn add_class(self, class: &str) -> Self {
        if let Some(id) = self.id {
            self.doc.add_class(id, class);
        }
        self
    }

    pub fn set_title(self, title: Option<&str>) -> Self {
        self.attrib("title", title)
    }

    pub fn set_lang(self, lang: &str) -> Self {
        self.attrib("lang", Some(lang))
    }

    pub fn set_name(self, name: &str) -> Self {
        self.attrib("name", Some(name))
    }

    pub fn set_value(self, value: &str) -> Self {
        self.attrib("value", Some(value))
    }

    pub fn set_size(self, size: u32) -> Self {
        self.attrib("size", Some(&size.to_string()))
    }

    pub fn set_checked_for(self, values: &[&str]) -> Self {
        self.flag_for_values("checked", values)
    }

    pub fn set_selected_for(self, values: &[&str]) -> Self {
        self.flag_for_values("selected", values)
    }

    pub fn set_disabled_for(self, values: &[&str]) -> Self {
        self.flag_for_values("disabled", values)
    }

    flag_setters! {
        set_checked => "checked";
        set_disabled => "disabled";
        set_selected => "selected";
        set_required => "required";
        set_readonly => "readonly";
        set_multiple => "multiple";
    }

    container_elements! {
        head => "head";
        body => "body";
        section => "section";
        article => "article";
        nav => "nav";
        aside => "aside";
        header => "header";
        footer => "footer";
        main => "main";
        div => "div";
        ul => "ul";
        ol => "ol";
        figure => "figure";
        table => "table";
        thead => "thead";
        tbody => "tbody";
        tfoot => "tfoot";
        tr => "tr";
        br => "br";
        wbr => "wbr";
        hr => "hr";
        fieldset => "fieldset";
    }

    content_elements! {
        title => "title";
        h1 => "h1";
        h2 => "h2";
        h3 => "h3";
        h4 => "h4";
        h5 => "h5";
        h6 => "h6";
        p => "p";
        li => "li";
        pre => "pre";
        figcaption => "figcaption";
        caption => "caption";
        legend => "legend";
        em => "em";
        strong => "strong";
        small => "small";
        s => "s";
        cite => "cite";
        code => "code";
        var => "var";
        samp => "samp";
        kbd => "kbd";
        sub => "sub";
        sup => "sup";
        i => "i";
        b => "b";
        u => "u";
        mark => "mark";
        span => "span";
        ruby => "ruby";
        rt => "rt";
        rp => "rp";
        /// Label for a form control.
        label => "label";
    }

    /// Hyperlink.
    pub fn a(&mut self, content: &str, href: &str) -> Element<'_> {
        self.child_with_text("a", content).attrib("href", Some(href))
    }

    pub fn abbr(&mut self, content: &str, title: Option<&str>) -> Element<'_> {
        self.child_with_text("abbr", content).attrib("title", title)
    }

    pub fn dfn(&mut self, content: &str, title: Option<&str>) -> Element<'_> {
        self.child_with_text("dfn", content).attrib("title", title)
    }

    pub fn q(&mut self, content: &str, cite: Option<&str>) -> Element<'_> {
        self.child_with_text("q", content).attrib("cite", cite)
    }

    pub fn blockquote(&mut self, cite: Option<&str>) -> Element<'_> {
        self.child("blockquote").attrib("cite", cite)
    }

    pub fn data(&mut self, content: &str, value: Option<&str>) -> Element<'_> {
        self.child_with_text("data", content).attrib("value", value)
    }

    /// Date or time with an optional machine-readable `datetime`.
    pub fn time(&mut self, content: &str, datetime: Option<&str>) -> Element<'_> {
        self.child_with_text("time", content)
            .attrib("datetime", datetime)
    }

    pub fn bdo(&mut self, content: &str, dir: Option<&str>) -> Element<'_> {
        self.child_with_text("bdo", content).attrib("dir", dir)
    }

    pub fn bdi(&mut self, content: &str, dir: Option<&str>) -> Element<'_> {
        self.child_with_text("bdi", content).attrib("dir", dir)
    }

    pub fn ins(&mut self, content: &str, datetime: Option<&str>, cite: Option<&str>) -> Element<'_> {
        self.child_with_text("ins", content)
            .attrib("datetime", datetime)
            .attrib("cite", cite)
    }

    pub fn del(&mut self, content: &str, datetime: Option<&str>, cite: Option<&str>) -> Element<'_> {
        self.child_with_text("del", content)
            .attrib("datetime", datetime)
            .attrib("cite", cite)
    }

    pub fn img(&mut self, src: &str, alt: &str) -> Element<'_> {
        self.child("img")
            .attrib("src", Some(src))
            .attrib("alt", Some(alt))
    }

    /// Column group; a span of 0 or 1 is left implicit.
    pub fn colgroup(&mut self, span: usize) -> Element<'_> {
        let span = span_value(span);
        self.child("colgroup").attrib("span", span.as_deref())
    }

    pub fn col(&mut self, span: usize) -> Element<'_> {
        let span = span_value(span);
        self.child("col").attrib("span", span.as_deref())
    }

    /// Header cell; a colspan of 0 or 1 is left implicit.
    pub fn th(&mut self, content: &str, colspan: usize) -> Element<'_> {
        let colspan = span_value(colspan);
        self.child_with_text("th", content)
            .attrib("colspan", colspan.as_deref())
    }

    pub fn td(&mut self, content: &str, colspan: usize) -> Element<'_> {
        let colspan = span_value(colspan);
        self.child_with_text("td", content)
            .attrib("colspan", colspan.as_deref())
    }

    pub fn form(&mut self, action: Option<&str>, method: Option<&str>) -> Element<'_> {
        self.child("form")
            .attrib("action", action)
            .attrib("method", method)
    }

    pub fn input(&mut self, kind: &str, name: Option<&str>, value: Option<&str>) -> Element<'_> {
        self.child("input")
            .attrib("type", Some(kind))
            .attrib("name", name)
            .attrib("value", value)
    }

    pub fn checkbox(&mut self, name: &str, value: &str) -> Element<'_> {
        self.input("checkbox", Some(name), Some(value))
    }

    pub fn radio(&mut self, name: &str, value: &str) -> Element<'_> {
        self.input("radio", Some(name), Some(value))
    }

    pub fn select(&mut self, name: Option<&str>) -> Element<'_> {
        self.child("select").attrib("name", name)
    }

    pub fn option(&mut self, content: &str, value: Option<&str>) -> Element<'_> {
        self.child_with_text("option", content)
            .attrib("value", value)
    }

    /// One `option` per `(value, label)` pair, pre-selecting `selected`.
    pub fn options(&mut self, choices: &[(&str, &str)], selected: &[&str]) -> &mut Self {
        for &(value, label) in choices {
            self.option(label, Some(value)).set_selected_for(selected);
        }
        self
    }

    pub fn textarea(&mut self, name: Option<&str>, content: &str) -> Element<'_> {
        self.child_with_text("textarea", content)
            .attrib("name", name)
    }

    pub fn button(&mut self, content: &str, kind: Option<&str>) -> Element<'_> {
        self.child_with_text("button", content)
            .attrib("type", kind)
    }

    /// Renders this element's subtree (the whole document for a fragment
    /// handle).
    pub fn markup(&self, pretty: bool) -> String {
        match (self.id, pretty) {
            (Some(id), true) => self.doc.render_node(id, Some("\t")),
            (Some(id), false) => self.doc.render_node(id, None),
            (None, true) => self.doc.render_pretty("\t"),
            (None, false) => self.doc.render_compact(),
        }
    }

    fn insertion_parent(&self) -> Option<NodeId> {
        self.open.last().copied().or(self.id)
    }
}

impl MarkupBuilder for Element<'_> {
    fn append_element(&mut self, tag: &str) {
        let id = self.doc.create_element(self.insertion_parent(), tag);
        self.open.push(id);
    }

    fn set_attribute(&mut self, name: &str, value: &str) {
        if let Some(id) = self.insertion_parent() {
            self.doc.set_attr(id, name, AttrValue::Text(value.to_string()));
        }
    }

    fn set_class(&mut self, class: &str) {
        if let Some(id) = self.insertion_parent() {
            self.doc.add_class(id, class);
        }
    }

    fn append_text(&mut self, text: &str) {
        if !text.is_empty() {
            self.doc.create_text(self.insertion_parent(), text);
        }
    }

    fn close_element(&mut self) {
        self.open.pop();
    }

    fn render(&self) -> String {
        self.markup(true)
    }
}

fn span_value(span: usize) -> Option<String> {
    (span > 1).then(|| span.to_string())
}
