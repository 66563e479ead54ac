//! Detached output tree produced by the sanitizer.
//!
//! `scraper` elements are immutable once parsed, so sanitized markup is
//! rebuilt into an [`ego_tree::Tree`] of [`Node`]s that the purifier hooks can
//! freely edit, and serialized back to HTML from there.

use std::fmt;

use ego_tree::{NodeRef, Tree};

/// Namespace of an element, as decided by the HTML parser.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Namespace {
    #[default]
    Html,
    Svg,
    MathMl,
}

impl Namespace {
    pub(crate) fn from_uri(uri: &str) -> Self {
        match uri {
            "http://www.w3.org/2000/svg" => Self::Svg,
            "http://www.w3.org/1998/Math/MathML" => Self::MathMl,
            _ => Self::Html,
        }
    }
}

/// A node of a sanitized [`Fragment`].
#[derive(Clone, Debug)]
pub enum Node {
    /// The container root.
    Fragment,
    Element(ElementData),
    Text(String),
}

/// An element with an ordered, editable attribute list.
#[derive(Clone, Debug, Default)]
pub struct ElementData {
    name: String,
    lower_name: String,
    namespace: Namespace,
    attrs: Vec<(String, String)>,
    saved_target: Option<String>,
}

impl ElementData {
    /// Create an HTML element without attributes.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_namespace(name, Namespace::Html)
    }

    pub fn with_namespace(name: impl Into<String>, namespace: Namespace) -> Self {
        let name = name.into();
        Self {
            lower_name: name.to_ascii_lowercase(),
            name,
            namespace,
            attrs: Vec::new(),
            saved_target: None,
        }
    }

    /// Builder-style attribute setter, mostly useful for constructing nodes to
    /// pass to [`Purifier::validate_attribute_change`](crate::Purifier::validate_attribute_change).
    pub fn attr_with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Name as it is serialized (SVG elements keep their camel case).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lowercase name, used for every policy lookup.
    pub fn tag(&self) -> &str {
        &self.lower_name
    }

    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    /// Whether this is an AMP custom element (`amp-*`).
    pub fn is_amp_element(&self) -> bool {
        self.lower_name.starts_with("amp-")
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|(k, _)| k == name)
    }

    /// Set an attribute, replacing the value in place if it already exists.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| *k == name) {
            Some((_, v)) => *v = value,
            None => self.attrs.push((name, value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let index = self.attrs.iter().position(|(k, _)| k == name)?;
        Some(self.attrs.remove(index).1)
    }

    /// Keep only the attributes for which `keep(name, value)` holds.
    pub fn retain_attrs(&mut self, mut keep: impl FnMut(&str, &str) -> bool) {
        self.attrs.retain(|(k, v)| keep(k, v));
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub(crate) fn attr_list(&self) -> Vec<(String, String)> {
        self.attrs.clone()
    }

    pub(crate) fn saved_target(&self) -> Option<&str> {
        self.saved_target.as_deref()
    }

    pub(crate) fn save_target(&mut self, target: Option<String>) {
        self.saved_target = target;
    }
}

/// HTML5 void elements that must not have a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose text content is serialized without escaping.
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "script", "style", "xmp", "iframe", "noembed", "noframes", "plaintext",
];

/// A detached, sanitized container (the equivalent of a detached `<body>`).
#[derive(Clone, Debug)]
pub struct Fragment {
    tree: Tree<Node>,
}

impl Default for Fragment {
    fn default() -> Self {
        Self::new()
    }
}

impl Fragment {
    pub fn new() -> Self {
        Self {
            tree: Tree::new(Node::Fragment),
        }
    }

    pub fn tree(&self) -> &Tree<Node> {
        &self.tree
    }

    pub(crate) fn tree_mut(&mut self) -> &mut Tree<Node> {
        &mut self.tree
    }

    /// All elements in document order.
    pub fn elements(&self) -> impl Iterator<Item = &ElementData> {
        self.tree.root().descendants().filter_map(|n| match n.value() {
            Node::Element(el) => Some(el),
            _ => None,
        })
    }

    /// The first element with the given (case-insensitive) tag name.
    pub fn find(&self, tag: &str) -> Option<&ElementData> {
        let tag = tag.to_ascii_lowercase();
        self.elements().find(|el| el.tag() == tag)
    }

    /// Concatenated text content.
    pub fn text(&self) -> String {
        self.tree
            .root()
            .descendants()
            .filter_map(|n| match n.value() {
                Node::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Serialize the children of the container (its "inner HTML").
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for child in self.tree.root().children() {
            serialize_node(child, false, &mut out);
        }
        out
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_html())
    }
}

fn serialize_node(node: NodeRef<Node>, raw_text: bool, out: &mut String) {
    match node.value() {
        Node::Fragment => {
            for child in node.children() {
                serialize_node(child, false, out);
            }
        }
        Node::Element(el) => {
            out.push('<');
            out.push_str(el.name());
            for (k, v) in el.attrs() {
                out.push(' ');
                out.push_str(k);
                out.push_str("=\"");
                escape_into(v, true, out);
                out.push('"');
            }
            out.push('>');

            if el.namespace() == Namespace::Html && VOID_ELEMENTS.contains(&el.tag()) {
                return;
            }

            let raw = el.namespace() == Namespace::Html && RAW_TEXT_ELEMENTS.contains(&el.tag());
            for child in node.children() {
                serialize_node(child, raw, out);
            }

            out.push_str("</");
            out.push_str(el.name());
            out.push('>');
        }
        Node::Text(text) if raw_text => out.push_str(text),
        Node::Text(text) => escape_into(text, false, out),
    }
}

fn escape_into(s: &str, attr_mode: bool, out: &mut String) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            '"' if attr_mode => out.push_str("&quot;"),
            '<' if !attr_mode => out.push_str("&lt;"),
            '>' if !attr_mode => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
}
