//! Markers consumed by the DOM differ that patches re-rendered templates.

use crate::binding::BINDING_MARKER;
use crate::dom::ElementData;
use crate::policy;

/// Identity marker: elements with the same key are patched in place.
pub const KEY_ATTR: &str = "i-amphtml-key";

/// Elements with this marker are always replaced, never patched.
pub const IGNORE_ATTR: &str = "i-amphtml-ignore";

/// Mark `element` for the differ.
///
/// Diffable AMP elements without bindings are ignored (replaced wholesale).
/// Bound elements and other AMP elements get a key from `generate_key`,
/// unless they already have one.
pub fn mark_element_for_diffing(element: &mut ElementData, generate_key: impl FnOnce() -> String) {
    // Bound elements are rescanned by amp-bind after render; reusing old nodes
    // would lose their bindings, so they always get a key.
    let has_bindings = element.has_attr(BINDING_MARKER);
    if !has_bindings && policy::diffable_attrs(element.tag()).is_some() {
        element.set_attr(IGNORE_ATTR, "");
    } else if (has_bindings || element.is_amp_element()) && !element.has_attr(KEY_ATTR) {
        element.set_attr(KEY_ATTR, generate_key());
    }
}
