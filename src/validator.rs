//! The AMP attribute validator.
//!
//! [`is_valid_attr`] is a pure predicate layered on top of the generic
//! sanitizer's checks. The purifier calls it with `skip_basic_checks = true`
//! because the generic engine already handles event handlers and unsafe URI
//! schemes there; live attribute writes outside the purifier call it with
//! `false`.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

use crate::format::DocumentFormat;
use crate::policy::{
    self, DENYLISTED_TAG_SPECIFIC_ATTR_VALUES, EMAIL_DENYLISTED_TAG_SPECIFIC_ATTR_VALUES,
};

/// Query token the document and its embedder use as a trust signal.
pub const SOURCE_ORIGIN_PARAM: &str = "__amp_source_origin";

const DENYLISTED_SCHEMES: &[&str] = &["javascript:", "vbscript:", "data:"];
const DENYLISTED_MARKUP: &[&str] = &["<script", "</script"];
const EXTENDED_DENYLISTED_SCHEMES: &[&str] = &["blob:"];

static SCRIPT_SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\w+script:").expect("static regex"));

static INVALID_INLINE_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)!important|position\s*:\s*fixed|position\s*:\s*sticky").expect("static regex")
});

static RESERVED_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:^|\W)i-amphtml-").expect("static regex"));

type ValueRule = (&'static str, &'static str, Regex);

fn compile_value_rules(table: &[(&'static str, &'static str, &str)]) -> Vec<ValueRule> {
    table
        .iter()
        .map(|(tag, attr, pattern)| {
            let re = RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .expect("static regex");
            (*tag, *attr, re)
        })
        .collect()
}

static VALUE_RULES: LazyLock<Vec<ValueRule>> =
    LazyLock::new(|| compile_value_rules(DENYLISTED_TAG_SPECIFIC_ATTR_VALUES));

static EMAIL_VALUE_RULES: LazyLock<Vec<ValueRule>> =
    LazyLock::new(|| compile_value_rules(EMAIL_DENYLISTED_TAG_SPECIFIC_ATTR_VALUES));

/// Whether the attribute carries a URL that is resolved or fetched.
pub fn is_url_attribute(attr: &str) -> bool {
    matches!(attr, "src" | "href" | "xlink:href" | "srcset")
}

/// Lowercase `value` with every whitespace and control character removed, so
/// that scheme checks see `java\tscript:` as `javascript:`.
pub(crate) fn normalize_value(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Decide whether `attr="value"` may appear on `tag` in a document of `format`.
///
/// `tag` and `attr` are expected in lowercase. A `None` value stands for an
/// attribute without a value (or one being removed) and passes every value check.
pub fn is_valid_attr(
    tag: &str,
    attr: &str,
    value: Option<&str>,
    format: DocumentFormat,
    skip_basic_checks: bool,
) -> bool {
    let value = value.unwrap_or("");
    let normalized = normalize_value(value);

    if !skip_basic_checks {
        if attr.starts_with("on") && attr != "on" {
            return false;
        }
        if DENYLISTED_MARKUP.iter().any(|m| normalized.contains(m)) {
            return false;
        }
        if DENYLISTED_SCHEMES.iter().any(|s| normalized.starts_with(s))
            || SCRIPT_SCHEME.is_match(&normalized)
        {
            return false;
        }
    }

    // The generic engine treats these as safe in some contexts (e.g. `data-*`).
    if EXTENDED_DENYLISTED_SCHEMES
        .iter()
        .any(|s| normalized.starts_with(s))
    {
        return false;
    }

    if attr == "style" && INVALID_INLINE_STYLE.is_match(value) {
        return false;
    }

    // `i-amphtml-*` classes are reserved for the runtime.
    if attr == "class" && RESERVED_CLASS.is_match(value) {
        return false;
    }

    if is_url_attribute(attr) && value.contains(SOURCE_ORIGIN_PARAM) {
        return false;
    }

    if policy::is_denylisted_tag_attr(tag, attr, format) {
        return false;
    }

    let value_rules = if format.is_email() {
        &*EMAIL_VALUE_RULES
    } else {
        &*VALUE_RULES
    };
    let value_denied = value_rules
        .iter()
        .any(|(t, a, re)| *t == tag && *a == attr && re.is_match(value));

    !value_denied
}

#[cfg(test)]
mod tests {
    use super::*;

    const GENERAL: DocumentFormat = DocumentFormat::General;
    const EMAIL: DocumentFormat = DocumentFormat::Amp4Email;

    fn valid(tag: &str, attr: &str, value: &str) -> bool {
        is_valid_attr(tag, attr, Some(value), GENERAL, false)
    }

    #[test]
    fn rejects_event_handlers_but_not_amp_actions() {
        assert!(!valid("div", "onclick", "alert(1)"));
        assert!(!valid("div", "onload", ""));
        assert!(valid("div", "on", "tap:lightbox.open"));
    }

    #[test]
    fn rejects_script_markup_in_values() {
        assert!(!valid("div", "title", "<script>alert(1)</script>"));
        assert!(!valid("div", "title", "x</SCRIPT >"));
        assert!(!valid("div", "title", "< s c r i p t"));
    }

    #[test]
    fn rejects_obfuscated_schemes() {
        assert!(!valid("a", "href", "javascript:alert(1)"));
        assert!(!valid("a", "href", " JaVa\tScRiPt:alert(1)"));
        assert!(!valid("a", "href", "java\u{0}script:alert(1)"));
        assert!(!valid("a", "href", "vbscript:msgbox"));
        assert!(!valid("a", "href", "livescript:x"));
        assert!(!valid("a", "href", "DATA:text/html,<b>"));
        assert!(valid("a", "href", "https://example.com/?q=javascript"));
    }

    #[test]
    fn basic_checks_are_skippable() {
        assert!(is_valid_attr("div", "onclick", Some("x"), GENERAL, true));
        assert!(is_valid_attr("a", "href", Some("javascript:x"), GENERAL, true));
    }

    #[test]
    fn blob_scheme_is_always_rejected() {
        assert!(!is_valid_attr("div", "data-src", Some("blob:https://x/1"), GENERAL, true));
        assert!(!is_valid_attr("a", "href", Some(" B l o b:x"), GENERAL, false));
    }

    #[test]
    fn style_cannot_override_runtime_layout() {
        assert!(!valid("div", "style", "color: red !important"));
        assert!(!valid("div", "style", "position:fixed"));
        assert!(!valid("div", "style", "POSITION : Sticky; top: 0"));
        assert!(valid("div", "style", "position: relative; color: red"));
    }

    #[test]
    fn reserved_class_prefix() {
        assert!(!valid("div", "class", "i-amphtml-foo"));
        assert!(!valid("div", "class", "foo I-AMPHTML-bar"));
        assert!(!valid("div", "class", "foo-i-amphtml-bar"));
        assert!(valid("div", "class", "i-amphtml"));
        assert!(valid("div", "class", "xi-amphtml-foo"));
    }

    #[test]
    fn source_origin_token_only_matters_on_url_attributes() {
        assert!(!valid("a", "href", "/x?__amp_source_origin=https://evil.com"));
        assert!(!valid("amp-img", "srcset", "a.png?__amp_source_origin=1 1x"));
        assert!(valid("div", "title", "__amp_source_origin"));
    }

    #[test]
    fn form_association_attributes_are_denied() {
        for attr in ["form", "formaction", "formmethod", "formtarget", "formenctype"] {
            assert!(!valid("input", attr, "x"), "{attr}");
            assert!(!valid("textarea", attr, "x"), "{attr}");
        }
        assert!(valid("button", "formaction", "/x"));
    }

    #[test]
    fn input_type_values_depend_on_format() {
        assert!(!valid("input", "type", "image"));
        assert!(!valid("input", "type", "BUTTON"));
        assert!(valid("input", "type", "password"));
        assert!(!is_valid_attr("input", "type", Some("password"), EMAIL, false));
        assert!(!is_valid_attr("input", "type", Some("file"), EMAIL, false));
        assert!(is_valid_attr("input", "type", Some("text"), EMAIL, false));
    }

    #[test]
    fn email_only_attribute_pairs() {
        assert!(valid("form", "name", "signup"));
        assert!(!is_valid_attr("form", "name", Some("signup"), EMAIL, false));
        assert!(!is_valid_attr("amp-anim", "controls", None, EMAIL, false));
    }
}
