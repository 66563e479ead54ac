//! The AMP purifier.
//!
//! [`Purifier`] layers the AMP policy (component allowances, link targets,
//! bindings, diffing markers, URL rewriting) over the generic
//! [`Engine`](crate::sanitizer::Engine). Each call builds a fresh output tree;
//! the only state shared between calls is the diffing key counter.

pub mod diffing;
mod mustache;

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::binding::{self, BINDING_MARKER, BIND_PREFIX, BindingType};
use crate::dom::{ElementData, Fragment};
use crate::format::DocumentFormat;
use crate::policy::{self, ALLOWED_ATTRS, DENYLISTED_TAGS};
use crate::sanitizer::{AttributeVisit, Disposition, Engine, EngineConfig, Sanitizer, Visitor};
use crate::url_rewrite::AttributeRewriter;
use crate::validator::is_valid_attr;

/// Attribute name prefix reserved for markers the runtime sets.
const RESERVED_ATTR_PREFIX: &str = "i-amphtml-";

/// AMP-significant tag categories, decided once per element.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TagKind {
    /// `amp-*` custom elements.
    Amp,
    Anchor,
    /// Allowed only with a qualifying `type`.
    Script,
    /// SVG `<use>`, restricted to fragment references.
    SvgUse,
    Template,
    Other,
}

impl TagKind {
    pub fn classify(tag: &str) -> Self {
        match tag {
            t if t.starts_with("amp-") => Self::Amp,
            "a" => Self::Anchor,
            "script" => Self::Script,
            "use" => Self::SvgUse,
            "template" => Self::Template,
            _ => Self::Other,
        }
    }
}

/// Sanitizes untrusted markup under the AMP policy for one document format.
///
/// Construct with [`Purifier::new`] or [`PurifierBuilder`](crate::PurifierBuilder).
pub struct Purifier {
    format: DocumentFormat,
    engine: Engine,
    mustache: Engine,
    rewriter: Option<Box<dyn AttributeRewriter>>,
    key_counter: AtomicU64,
}

impl Purifier {
    /// A purifier for `format` without an attribute rewriter.
    pub fn new(format: DocumentFormat) -> Self {
        Self::with_rewriter(format, None)
    }

    pub(crate) fn with_rewriter(
        format: DocumentFormat,
        rewriter: Option<Box<dyn AttributeRewriter>>,
    ) -> Self {
        let config = EngineConfig::html_svg()
            .add_attrs(ALLOWED_ATTRS)
            // SVG <use> with fragment-only references, see `after_attributes`.
            .add_tags(&["use"])
            .forbid_tags(DENYLISTED_TAGS);
        Self {
            format,
            engine: Engine::new(config),
            mustache: mustache::engine(format),
            rewriter,
            key_counter: AtomicU64::new(0),
        }
    }

    pub fn format(&self) -> DocumentFormat {
        self.format
    }

    /// Sanitize `dirty` as body content and return the detached result.
    pub fn purify_html(&self, dirty: &str) -> Fragment {
        let mut visitor = AmpVisitor { purifier: self };
        self.engine.sanitize(dirty, &mut visitor)
    }

    /// Sanitize unescaped template output with the stricter triple-mustache
    /// allowlist and return it serialized.
    pub fn purify_tags_for_triple_mustache(&self, dirty: &str) -> String {
        self.mustache
            .sanitize(dirty, &mut mustache::TemplateVisitor)
            .to_html()
    }

    /// Snapshot of the tags the purifier allows, with every denylisted tag
    /// explicitly mapped to `false`.
    pub fn get_allowed_tags(&self) -> BTreeMap<String, bool> {
        let mut tags: BTreeMap<String, bool> = self
            .engine
            .config()
            .allowed_tags()
            .map(|t| (t.to_string(), true))
            .collect();
        for tag in DENYLISTED_TAGS {
            tags.insert(tag.to_string(), false);
        }
        tags
    }

    /// Validate a single attribute mutation on an already sanitized `node`.
    ///
    /// `None` stands for removing the attribute. Bindings can only be set up
    /// by [`purify_html`](Self::purify_html), never by later mutations.
    pub fn validate_attribute_change(
        &self,
        node: &ElementData,
        attr: &str,
        value: Option<&str>,
    ) -> bool {
        let tag = node.tag();
        let kind = TagKind::classify(tag);

        if let Some(rule) = policy::qualifying_attr(tag) {
            if rule.attribute == attr && !rule.accepts(value) {
                return false;
            }
        }
        if kind == TagKind::Anchor && attr == "target" && !value.is_some_and(policy::is_allowed_target)
        {
            return false;
        }

        let Some(value) = value else {
            return true;
        };
        if binding::binding_type_for_attr(attr) != BindingType::None {
            return false;
        }

        if !self.engine.is_valid_attribute(tag, attr, value)
            && kind != TagKind::Amp
            && !policy::is_allowed_attr_for_tag(tag, attr)
        {
            return false;
        }

        is_valid_attr(tag, attr, Some(value), self.format, true)
    }

    fn next_key(&self) -> String {
        self.key_counter.fetch_add(1, Ordering::Relaxed).to_string()
    }
}

impl Sanitizer for Purifier {
    fn sanitize(&self, html: &str) -> String {
        self.purify_html(html).to_html()
    }
}

/// The AMP policy hooks for one `purify_html` call.
struct AmpVisitor<'a> {
    purifier: &'a Purifier,
}

impl Visitor for AmpVisitor<'_> {
    fn element(&mut self, element: &mut ElementData, allowed: bool) -> bool {
        // Runtime markers are only ever set by this visitor.
        element.retain_attrs(|name, _| !name.starts_with(RESERVED_ATTR_PREFIX));

        let tag = element.tag().to_string();
        match TagKind::classify(&tag) {
            TagKind::Amp => policy::is_amp_tag_allowed(&tag, self.purifier.format),
            TagKind::Anchor => {
                // Links navigate the top-level context unless told otherwise.
                if element.has_attr("href") && !element.has_attr("target") {
                    element.set_attr("target", "_top");
                }
                allowed
            }
            TagKind::Script => match policy::qualifying_attr(&tag) {
                Some(rule) => allowed || rule.accepts(element.attr(rule.attribute)),
                None => allowed,
            },
            TagKind::SvgUse | TagKind::Template | TagKind::Other => allowed,
        }
    }

    fn attribute(&mut self, element: &mut ElementData, attr: &mut AttributeVisit) {
        let tag = element.tag().to_string();
        let kind = TagKind::classify(&tag);

        if kind == TagKind::Amp {
            // Components define arbitrary attributes, e.g. amp-lightbox[scrollable].
            attr.allow_name = true;
        } else if kind == TagKind::Anchor && attr.name == "target" {
            let target = attr.value.to_ascii_lowercase();
            attr.value = if policy::is_allowed_target(&target) {
                target
            } else {
                "_top".to_string()
            };
        }
        if policy::is_allowed_attr_for_tag(&tag, &attr.name) {
            attr.allow_name = true;
        }

        let binding_type = binding::binding_type_for_attr(&attr.name);
        let alternative = binding::alternative_name(&attr.name);
        if let Some(name) = &alternative {
            element.set_attr(name.as_str(), attr.value.clone());
        }
        if binding_type != BindingType::None {
            element.set_attr(BINDING_MARKER, "");
        }
        if alternative.is_some() {
            // `[prop]` only survives in its `data-amp-bind-prop` spelling.
            attr.keep = false;
            return;
        }

        let purifier = self.purifier;
        if !is_valid_attr(&tag, &attr.name, Some(&attr.value), purifier.format, true) {
            tracing::warn!(
                "Removed invalid attribute {}[{}={:?}]",
                tag,
                attr.name,
                attr.value
            );
            attr.keep = false;
            return;
        }

        let Some(rewriter) = purifier.rewriter.as_deref() else {
            return;
        };
        if attr.value.is_empty() || attr.name.starts_with(BIND_PREFIX) {
            return;
        }
        match rewriter.rewrite(&tag, &attr.name, &attr.value) {
            Ok(value) => attr.value = value,
            Err(e) => {
                tracing::warn!("Removed attribute {}[{}] that failed to rewrite: {e}", tag, attr.name);
                attr.keep = false;
            }
        }
    }

    fn after_attributes(&mut self, element: &mut ElementData) -> Disposition {
        let purifier = self.purifier;
        diffing::mark_element_for_diffing(element, || purifier.next_key());

        if TagKind::classify(element.tag()) == TagKind::SvgUse {
            // An absolute <use> reference can pull in and run remote content.
            let external = ["href", "xlink:href"]
                .iter()
                .filter_map(|name| element.attr(name))
                .find(|href| !href.starts_with('#'));
            if let Some(href) = external {
                tracing::warn!("Removed invalid <use>, use[href] must start with \"#\": {href:?}");
                return Disposition::Remove;
            }
        }
        Disposition::Keep
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn purify(html: &str) -> String {
        Purifier::new(DocumentFormat::General).purify_html(html).to_html()
    }

    #[test]
    fn classifies_tag_kinds() {
        assert_eq!(TagKind::classify("amp-img"), TagKind::Amp);
        assert_eq!(TagKind::classify("a"), TagKind::Anchor);
        assert_eq!(TagKind::classify("abbr"), TagKind::Other);
        assert_eq!(TagKind::classify("script"), TagKind::Script);
        assert_eq!(TagKind::classify("use"), TagKind::SvgUse);
        assert_eq!(TagKind::classify("template"), TagKind::Template);
    }

    #[test]
    fn qualified_script_does_not_leak_to_siblings() {
        let out = purify(concat!(
            r#"<script type="application/ld+json">{"@type":"x"}</script>"#,
            "<script>evil()</script>",
            r#"<script type="text/javascript">evil()</script>"#,
        ));
        assert_eq!(out, r#"<script type="application/ld+json">{"@type":"x"}</script>"#);
    }

    #[test]
    fn anchor_targets_are_normalized() {
        assert_eq!(purify(r#"<a href="/x">x</a>"#), r#"<a href="/x" target="_top">x</a>"#);
        assert_eq!(
            purify(r#"<a href="/x" target="_BLANK">x</a>"#),
            r#"<a href="/x" target="_blank">x</a>"#
        );
        assert_eq!(
            purify(r#"<a href="/x" target="_parent">x</a>"#),
            r#"<a href="/x" target="_top">x</a>"#
        );
        assert_eq!(purify("<a>x</a>"), "<a>x</a>");
    }

    #[test]
    fn amp_attributes_survive_only_where_allowed() {
        assert_eq!(
            purify(r#"<div layout="nodisplay" on="tap:x.hide" submit-error="">x</div>"#),
            r#"<div layout="nodisplay" on="tap:x.hide" submit-error="">x</div>"#
        );
        assert_eq!(purify(r#"<span template="t">x</span>"#), r#"<span template="t">x</span>"#);
        assert_eq!(purify(r#"<span autoexpand="">x</span>"#), "<span>x</span>");
        assert_eq!(
            purify(r#"<textarea autoexpand=""></textarea>"#),
            r#"<textarea autoexpand=""></textarea>"#
        );
    }

    #[test]
    fn amp_elements_still_get_value_checks() {
        let out = purify(r#"<amp-list src="javascript:alert(1)" class="i-amphtml-x" items="."></amp-list>"#);
        assert_eq!(out, r#"<amp-list items="." i-amphtml-key="0"></amp-list>"#);
    }

    #[test]
    fn keys_increase_per_instance() {
        let purifier = Purifier::new(DocumentFormat::General);
        let first = purifier.purify_html("<amp-state></amp-state><p [text]=\"a\"></p>");
        let keys: Vec<_> = first
            .elements()
            .filter_map(|el| el.attr(diffing::KEY_ATTR).map(str::to_string))
            .collect();
        assert_eq!(keys, vec!["0", "1"]);
        let second = purifier.purify_html("<amp-state></amp-state>");
        assert_eq!(second.find("amp-state").unwrap().attr(diffing::KEY_ATTR), Some("2"));

        let other = Purifier::new(DocumentFormat::General);
        let fresh = other.purify_html("<amp-state></amp-state>");
        assert_eq!(fresh.find("amp-state").unwrap().attr(diffing::KEY_ATTR), Some("0"));
    }

    #[test]
    fn rewriter_runs_on_accepted_non_binding_attributes() {
        let purifier = crate::PurifierBuilder::new()
            .attribute_rewriter(|_tag: &str, attr: &str, value: &str| -> crate::Result<String> {
                Ok(format!("{attr}:{value}"))
            })
            .build();
        let out = purifier
            .purify_html(r#"<p title="t" data-amp-bind-text="x" onclick="y">z</p>"#)
            .to_html();
        assert!(out.contains(r#"title="title:t""#), "{out}");
        assert!(out.contains(r#"data-amp-bind-text="x""#), "{out}");
        assert!(!out.contains("onclick"), "{out}");
    }

    #[test]
    fn rewriter_errors_drop_the_attribute() {
        let purifier = crate::PurifierBuilder::new()
            .attribute_rewriter(|_tag: &str, attr: &str, value: &str| -> crate::Result<String> {
                if attr == "href" {
                    Err(crate::PurifierError::InvalidSrcset("boom".into()))
                } else {
                    Ok(value.to_string())
                }
            })
            .build();
        let out = purifier.purify_html(r#"<a href="/x" title="t">x</a>"#).to_html();
        assert_eq!(out, r#"<a title="t" target="_top">x</a>"#);
    }

    #[test]
    fn validate_attribute_change_follows_the_bulk_policy() {
        let purifier = Purifier::new(DocumentFormat::General);
        let div = ElementData::new("div");
        assert!(purifier.validate_attribute_change(&div, "title", Some("ok")));
        assert!(purifier.validate_attribute_change(&div, "class", None));
        assert!(!purifier.validate_attribute_change(&div, "class", Some("i-amphtml-x")));
        assert!(!purifier.validate_attribute_change(&div, "onclick", Some("x()")));
        assert!(!purifier.validate_attribute_change(&div, "[text]", Some("x")));
        assert!(!purifier.validate_attribute_change(&div, "data-amp-bind-text", Some("x")));
        assert!(!purifier.validate_attribute_change(&div, "scrollable", Some("")));

        let lightbox = ElementData::new("amp-lightbox");
        assert!(purifier.validate_attribute_change(&lightbox, "scrollable", Some("")));

        let form = ElementData::new("form");
        assert!(purifier.validate_attribute_change(&form, "action-xhr", Some("/submit")));
        assert!(purifier.validate_attribute_change(&form, "name", Some("")));
        let anim = ElementData::new("amp-anim");
        assert!(purifier.validate_attribute_change(&anim, "controls", Some("")));
    }

    #[test]
    fn email_denylisted_boolean_attributes_are_rejected() {
        let purifier = Purifier::new(DocumentFormat::Amp4Email);
        let anim = ElementData::new("amp-anim");
        let form = ElementData::new("form");
        assert!(!purifier.validate_attribute_change(&anim, "controls", Some("")));
        assert!(!purifier.validate_attribute_change(&form, "name", Some("")));
        assert!(!purifier.validate_attribute_change(&form, "name", Some("f")));
        assert!(purifier.validate_attribute_change(&anim, "width", Some("")));

        let out = purifier
            .purify_html(r#"<amp-anim controls></amp-anim><form name=""></form>"#)
            .to_html();
        assert_eq!(out, r#"<amp-anim i-amphtml-key="0"></amp-anim><form></form>"#);
    }

    #[test]
    fn input_runtime_markers_cannot_displace_generated_ones() {
        let fragment = Purifier::new(DocumentFormat::General)
            .purify_html(r#"<p [text]="a" i-amphtml-binding>x</p><amp-img src="a.png" i-amphtml-key="9"></amp-img>"#);
        assert_eq!(
            fragment.to_html(),
            concat!(
                r#"<p data-amp-bind-text="a" i-amphtml-binding="" i-amphtml-key="0">x</p>"#,
                r#"<amp-img src="a.png" i-amphtml-ignore=""></amp-img>"#,
            )
        );
    }

    #[test]
    fn bound_output_is_stable_across_passes() {
        let once = purify(r#"<p [text]="a">x</p>"#);
        assert_eq!(once, r#"<p data-amp-bind-text="a" i-amphtml-binding="" i-amphtml-key="0">x</p>"#);
        assert_eq!(purify(&once), once);
    }

    #[test]
    fn validate_attribute_change_removal_of_qualifying_attr_is_rejected() {
        let purifier = Purifier::new(DocumentFormat::General);
        let script = ElementData::new("script").attr_with("type", "application/json");
        assert!(!purifier.validate_attribute_change(&script, "type", None));
        let a = ElementData::new("a");
        assert!(!purifier.validate_attribute_change(&a, "target", None));
        assert!(purifier.validate_attribute_change(&a, "rel", None));
    }

    #[test]
    fn allowed_tags_zero_the_denylist() {
        let tags = Purifier::new(DocumentFormat::General).get_allowed_tags();
        assert_eq!(tags.get("p"), Some(&true));
        assert_eq!(tags.get("use"), Some(&true));
        assert_eq!(tags.get("img"), Some(&false));
        assert_eq!(tags.get("iframe"), Some(&false));
        assert_eq!(tags.get("script"), None);
    }

    #[test]
    fn sanitizer_trait_serializes_purified_html() {
        let purifier: Box<dyn Sanitizer> = Box::new(Purifier::new(DocumentFormat::General));
        assert_eq!(purifier.sanitize("<b onclick=x>y</b>"), "<b>y</b>");
    }
}
