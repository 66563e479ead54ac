//! Static AMP tag and attribute policy tables.
//!
//! Everything here is read-only. Per-element exceptions (a `<script>` that is
//! allowed because of its `type`, an AMP component whose attributes are all
//! accepted) are computed from these tables at visit time and never written
//! back.

use crate::format::DocumentFormat;

/// Tags removed regardless of their attributes.
pub const DENYLISTED_TAGS: &[&str] = &[
    "applet", "audio", "base", "embed", "frame", "frameset", "iframe", "img", "link", "meta",
    "object", "style", "video",
];

/// Non-standard attributes accepted on any element.
pub const ALLOWED_ATTRS: &[&str] = &[
    "amp-fx",
    "fallback",
    "heights",
    "layout",
    "min-font-size",
    "max-font-size",
    "on",
    "option",
    "placeholder",
    // amp-form
    "submitting",
    "submit-success",
    "submit-error",
    "validation-for",
    "verify-error",
    "visible-when-invalid",
    // amp-inputmask
    "mask",
    "mask-output",
    "mask-trim-zeros",
    // amp-nested-menu
    "amp-nested-submenu",
    "amp-nested-submenu-open",
    "amp-nested-submenu-close",
    // amp-list and amp-bind
    "binding",
    "items",
    "max-items",
    "noloading",
    "sizes",
    "srcset",
    "template",
    "width",
    "height",
];

/// Attributes accepted only on specific non-AMP tags.
pub const ALLOWED_ATTRS_BY_TAGS: &[(&str, &[&str])] = &[
    ("a", &["rel", "target"]),
    ("div", &["template"]),
    (
        "form",
        &["action-xhr", "verify-xhr", "custom-validation-reporting", "target"],
    ),
    ("input", &["mask-output"]),
    ("template", &["type"]),
    ("textarea", &["autoexpand"]),
];

/// Navigation targets an anchor may keep.
pub const ALLOWED_TARGETS: &[&str] = &["_top", "_blank"];

/// A tag that is only allowed when one of its attributes holds a known value.
#[derive(Debug)]
pub struct QualifyingAttr {
    pub attribute: &'static str,
    pub values: &'static [&'static str],
}

impl QualifyingAttr {
    /// Whether `value` qualifies the tag. Comparison is exact.
    pub fn accepts(&self, value: Option<&str>) -> bool {
        value.is_some_and(|v| self.values.contains(&v))
    }
}

pub const ALLOWED_TAGS_BY_ATTR_VALUE: &[(&str, QualifyingAttr)] = &[(
    "script",
    QualifyingAttr {
        attribute: "type",
        values: &["application/json", "application/ld+json"],
    },
)];

/// AMP components allowed in AMP4EMAIL documents. Any other `amp-*` tag is removed.
pub const EMAIL_ALLOWED_AMP_TAGS: &[&str] = &[
    "amp-accordion",
    "amp-anim",
    "amp-bind-macro",
    "amp-carousel",
    "amp-fit-text",
    "amp-form",
    "amp-image-lightbox",
    "amp-img",
    "amp-layout",
    "amp-lightbox",
    "amp-list",
    "amp-selector",
    "amp-sidebar",
    "amp-state",
    "amp-timeago",
];

/// Tags allowed in unescaped (triple-mustache) template output.
pub const TRIPLE_MUSTACHE_ALLOWED_TAGS: &[&str] = &[
    "a", "amp-img", "article", "aside", "b", "blockquote", "br", "caption", "code", "col",
    "colgroup", "dd", "del", "details", "div", "dl", "dt", "em", "figcaption", "figure", "footer",
    "h1", "h2", "h3", "header", "hr", "i", "ins", "li", "main", "mark", "nav", "ol", "p", "pre",
    "q", "s", "section", "small", "span", "strong", "sub", "summary", "sup", "table", "tbody",
    "td", "tfoot", "th", "thead", "time", "tr", "u", "ul",
];

/// Email variant of [`TRIPLE_MUSTACHE_ALLOWED_TAGS`]: no `amp-img`, plus `font`.
pub const EMAIL_TRIPLE_MUSTACHE_ALLOWED_TAGS: &[&str] = &[
    "a", "article", "aside", "b", "blockquote", "br", "caption", "code", "col", "colgroup", "dd",
    "del", "details", "div", "dl", "dt", "em", "figcaption", "figure", "font", "footer", "h1",
    "h2", "h3", "header", "hr", "i", "ins", "li", "main", "mark", "nav", "ol", "p", "pre", "q",
    "s", "section", "small", "span", "strong", "sub", "summary", "sup", "table", "tbody", "td",
    "tfoot", "th", "thead", "time", "tr", "u", "ul",
];

/// AMP elements whose listed attributes make in-place patching unsafe; they
/// are replaced wholesale by the differ unless they carry bindings.
pub const DIFFABLE_AMP_ELEMENTS: &[(&str, &[&str])] = &[(
    "amp-img",
    &["src", "srcset", "layout", "width", "height"],
)];

const FORM_ASSOCIATION_ATTRS: &[&str] = &[
    "form",
    "formaction",
    "formmethod",
    "formtarget",
    "formnovalidate",
    "formenctype",
];

const DENYLISTED_TAG_SPECIFIC_ATTRS: &[(&str, &[&str])] = &[
    ("amp-iframe", &["srcdoc"]),
    ("input", FORM_ASSOCIATION_ATTRS),
    ("select", FORM_ASSOCIATION_ATTRS),
    ("textarea", FORM_ASSOCIATION_ATTRS),
];

const EMAIL_DENYLISTED_TAG_SPECIFIC_ATTRS: &[(&str, &[&str])] =
    &[("form", &["name"]), ("amp-anim", &["controls"])];

/// `(tag, attribute, case-insensitive value pattern)` triples.
pub(crate) const DENYLISTED_TAG_SPECIFIC_ATTR_VALUES: &[(&str, &str, &str)] =
    &[("input", "type", "(?:image|button)")];

pub(crate) const EMAIL_DENYLISTED_TAG_SPECIFIC_ATTR_VALUES: &[(&str, &str, &str)] =
    &[("input", "type", "(?:button|file|image|password)")];

fn lookup<'a, T>(table: &'a [(&str, T)], tag: &str) -> Option<&'a T> {
    table.iter().find(|(t, _)| *t == tag).map(|(_, v)| v)
}

pub fn is_denylisted_tag(tag: &str) -> bool {
    DENYLISTED_TAGS.contains(&tag)
}

/// Whether `attr` is allowlisted for the non-AMP `tag`.
pub fn is_allowed_attr_for_tag(tag: &str, attr: &str) -> bool {
    lookup(ALLOWED_ATTRS_BY_TAGS, tag).is_some_and(|attrs| attrs.contains(&attr))
}

pub fn is_allowed_target(target: &str) -> bool {
    ALLOWED_TARGETS.contains(&target)
}

/// The attribute/value condition under which `tag` is allowed, if it has one.
pub fn qualifying_attr(tag: &str) -> Option<&'static QualifyingAttr> {
    lookup(ALLOWED_TAGS_BY_ATTR_VALUE, tag)
}

/// Whether the `amp-*` tag may appear in documents of `format`.
pub fn is_amp_tag_allowed(tag: &str, format: DocumentFormat) -> bool {
    !format.is_email() || EMAIL_ALLOWED_AMP_TAGS.contains(&tag)
}

pub fn triple_mustache_tags(format: DocumentFormat) -> &'static [&'static str] {
    match format {
        DocumentFormat::General => TRIPLE_MUSTACHE_ALLOWED_TAGS,
        DocumentFormat::Amp4Email => EMAIL_TRIPLE_MUSTACHE_ALLOWED_TAGS,
    }
}

/// The geometry/source attributes of a diffable AMP element.
pub fn diffable_attrs(tag: &str) -> Option<&'static [&'static str]> {
    lookup(DIFFABLE_AMP_ELEMENTS, tag).copied()
}

/// Whether the `(tag, attr)` pair is always rejected for `format`.
pub fn is_denylisted_tag_attr(tag: &str, attr: &str, format: DocumentFormat) -> bool {
    let denied = |table: &[(&str, &[&str])]| lookup(table, tag).is_some_and(|a| a.contains(&attr));
    denied(DENYLISTED_TAG_SPECIFIC_ATTRS)
        || (format.is_email() && denied(EMAIL_DENYLISTED_TAG_SPECIFIC_ATTRS))
}
