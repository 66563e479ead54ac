//! Generic allowlist-based HTML sanitizer.
//!
//! [`Engine`] parses markup as a body fragment with `scraper`, walks the tree
//! and rebuilds an allowlisted copy into a [`Fragment`]. Policy that goes
//! beyond the static [`EngineConfig`] is layered on through a [`Visitor`]:
//! every hook receives the element being built and returns a decision for it
//! alone, so nothing a hook decides can leak to the next element.
//!
//! [`Sanitizer`] is the string-in/string-out seam implemented by
//! [`Purifier`](crate::Purifier).

mod allowlist;

use std::collections::HashSet;

use ego_tree::NodeId;
use scraper::{Html, node::Node as ParsedNode};

use crate::dom::{ElementData, Fragment, Namespace, Node};

pub use allowlist::{HTML_ATTRS, HTML_TAGS, SVG_ATTRS, SVG_FILTER_TAGS, SVG_TAGS};
use allowlist::{
    ALLOWED_URI, ARIA_ATTR, ATTR_WHITESPACE, DATA_ATTR, DATA_URI_TAGS, FORBID_CONTENTS,
    SCRIPT_OR_DATA, URI_SAFE_ATTRS, XML_ATTRS,
};

/// Trait for HTML content sanitizers.
///
/// Each sanitizer receives an HTML string and returns a transformed version.
/// Implementations must be `Send + Sync` so they can be shared between
/// threads.
pub trait Sanitizer: Send + Sync {
    /// Transform the given HTML content, returning the sanitized result.
    fn sanitize(&self, html: &str) -> String;
}

/// Static configuration of an [`Engine`].
#[derive(Clone, Debug)]
pub struct EngineConfig {
    allowed_tags: HashSet<String>,
    allowed_attrs: HashSet<String>,
    forbidden_tags: HashSet<String>,
    keep_content: bool,
}

fn to_set(items: &[&str]) -> HashSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl EngineConfig {
    /// HTML, SVG and SVG-filter profiles with their default attributes.
    pub fn html_svg() -> Self {
        let mut allowed_tags = to_set(HTML_TAGS);
        allowed_tags.extend(to_set(SVG_TAGS));
        allowed_tags.extend(to_set(SVG_FILTER_TAGS));
        let mut allowed_attrs = to_set(HTML_ATTRS);
        allowed_attrs.extend(to_set(SVG_ATTRS));
        allowed_attrs.extend(to_set(XML_ATTRS));
        Self {
            allowed_tags,
            allowed_attrs,
            forbidden_tags: HashSet::new(),
            keep_content: true,
        }
    }

    /// Only the given tags, with the default HTML attributes.
    pub fn with_tags(tags: &[&str]) -> Self {
        Self {
            allowed_tags: to_set(tags),
            allowed_attrs: to_set(HTML_ATTRS),
            forbidden_tags: HashSet::new(),
            keep_content: true,
        }
    }

    pub fn add_tags(mut self, tags: &[&str]) -> Self {
        self.allowed_tags.extend(to_set(tags));
        self
    }

    pub fn add_attrs(mut self, attrs: &[&str]) -> Self {
        self.allowed_attrs.extend(to_set(attrs));
        self
    }

    /// Tags removed even when they appear in the allowlist.
    pub fn forbid_tags(mut self, tags: &[&str]) -> Self {
        self.forbidden_tags.extend(to_set(tags));
        self
    }

    /// Whether the children of removed elements are kept (default `true`).
    pub fn keep_content(mut self, keep: bool) -> Self {
        self.keep_content = keep;
        self
    }

    pub fn allowed_tags(&self) -> impl Iterator<Item = &str> {
        self.allowed_tags.iter().map(String::as_str)
    }

    pub fn is_tag_allowed(&self, tag: &str) -> bool {
        self.allowed_tags.contains(tag) && !self.forbidden_tags.contains(tag)
    }
}

/// One attribute as seen by [`Visitor::attribute`].
#[derive(Debug)]
pub struct AttributeVisit {
    /// Lowercase attribute name.
    pub name: String,
    /// Trimmed value; the hook may rewrite it.
    pub value: String,
    /// Set to `false` to drop the attribute.
    pub keep: bool,
    /// Treat the name as allowlisted for this element. The value is still checked.
    pub allow_name: bool,
}

/// What happens to an element after its attributes were sanitized.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Disposition {
    Keep,
    /// Drop the element together with its subtree.
    Remove,
}

/// Per-element hooks layered on top of the static configuration.
///
/// All methods have pass-through defaults.
pub trait Visitor {
    /// Called before the element's attributes are sanitized. `allowed` is the
    /// verdict of the static configuration; the return value replaces it for
    /// this element only. The hook may add attributes to `element`.
    fn element(&mut self, element: &mut ElementData, allowed: bool) -> bool {
        let _ = element;
        allowed
    }

    /// Called once per original attribute of a kept element.
    fn attribute(&mut self, element: &mut ElementData, attr: &mut AttributeVisit) {
        let _ = (element, attr);
    }

    /// Called once all attributes of a kept element have been sanitized.
    fn after_attributes(&mut self, element: &mut ElementData) -> Disposition {
        let _ = element;
        Disposition::Keep
    }
}

/// A visitor that applies the static configuration only.
pub struct NoopVisitor;

impl Visitor for NoopVisitor {}

/// The generic sanitizer.
#[derive(Clone, Debug)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Sanitize `dirty` as the content of a `<body>`.
    pub fn sanitize(&self, dirty: &str, visitor: &mut impl Visitor) -> Fragment {
        let document = Html::parse_fragment(dirty);
        let mut fragment = Fragment::new();
        let root_id = fragment.tree().root().id();
        // `parse_fragment` wraps the content in a synthesized `<html>` element.
        for child in document.root_element().children() {
            self.sanitize_node(child, &mut fragment, root_id, visitor);
        }
        fragment
    }

    fn sanitize_node(
        &self,
        node: ego_tree::NodeRef<ParsedNode>,
        out: &mut Fragment,
        parent: NodeId,
        visitor: &mut impl Visitor,
    ) {
        match node.value() {
            ParsedNode::Text(text) => {
                let text: &str = text;
                append(out, parent, Node::Text(text.to_string()));
            }
            ParsedNode::Element(el) => {
                let mut element = ElementData::with_namespace(
                    el.name.local.to_string(),
                    Namespace::from_uri(&el.name.ns),
                );
                for (name, value) in el.attrs() {
                    element.set_attr(name, value);
                }

                let allowed = self.config.is_tag_allowed(element.tag());
                if !visitor.element(&mut element, allowed) {
                    if self.config.keep_content && !FORBID_CONTENTS.contains(&element.tag()) {
                        for child in node.children() {
                            self.sanitize_node(child, out, parent, visitor);
                        }
                    }
                    tracing::debug!("Removed disallowed element <{}>", element.tag());
                    return;
                }

                self.sanitize_attributes(&mut element, visitor);
                if visitor.after_attributes(&mut element) == Disposition::Remove {
                    return;
                }

                let Some(id) = append(out, parent, Node::Element(element)) else {
                    return;
                };
                for child in node.children() {
                    self.sanitize_node(child, out, id, visitor);
                }
            }
            // `<template>` content lives in a document fragment of its own.
            ParsedNode::Fragment => {
                for child in node.children() {
                    self.sanitize_node(child, out, parent, visitor);
                }
            }
            // Comments, doctypes and processing instructions are dropped.
            _ => {}
        }
    }

    fn sanitize_attributes(&self, element: &mut ElementData, visitor: &mut impl Visitor) {
        let tag = element.tag().to_string();
        for (name, value) in element.attr_list() {
            let mut visit = AttributeVisit {
                name: name.to_ascii_lowercase(),
                value: value.trim().to_string(),
                keep: true,
                allow_name: false,
            };
            visitor.attribute(element, &mut visit);

            if visit.keep
                && self.is_valid_attribute_with(&tag, &visit.name, &visit.value, visit.allow_name)
            {
                element.set_attr(name, visit.value);
            } else {
                element.remove_attr(&name);
            }
        }
    }

    /// Whether the static configuration accepts `name="value"` on `tag`.
    pub fn is_valid_attribute(&self, tag: &str, name: &str, value: &str) -> bool {
        self.is_valid_attribute_with(tag, name, value, false)
    }

    fn is_valid_attribute_with(&self, tag: &str, name: &str, value: &str, allow_name: bool) -> bool {
        if DATA_ATTR.is_match(name) || ARIA_ATTR.is_match(name) {
            return true;
        }
        if !allow_name && !self.config.allowed_attrs.contains(name) {
            return false;
        }
        if URI_SAFE_ATTRS.contains(&name) {
            return true;
        }
        let compact = ATTR_WHITESPACE.replace_all(value, "");
        if ALLOWED_URI.is_match(&compact) {
            return true;
        }
        if matches!(name, "src" | "xlink:href" | "href")
            && tag != "script"
            && value.starts_with("data:")
            && DATA_URI_TAGS.contains(&tag)
        {
            return true;
        }
        // Unknown protocols are allowed; protocol policy lives in the AMP validator.
        if !SCRIPT_OR_DATA.is_match(&compact) {
            return true;
        }
        value.is_empty()
    }
}

fn append(out: &mut Fragment, parent: NodeId, node: Node) -> Option<NodeId> {
    let mut parent = out.tree_mut().get_mut(parent)?;
    Some(parent.append(node).id())
}
