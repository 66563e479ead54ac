//! Classification of reactive-binding attributes.

/// Attribute prefix of the alternative binding syntax.
pub const BIND_PREFIX: &str = "data-amp-bind-";

/// Presence-only marker set on every element that carries a binding.
pub const BINDING_MARKER: &str = "i-amphtml-binding";

/// The surface syntax an attribute name uses for a binding, if any.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BindingType {
    None,
    /// `[property]`
    Classic,
    /// `data-amp-bind-property`
    Alternative,
}

/// Classify an attribute name.
pub fn binding_type_for_attr(name: &str) -> BindingType {
    if name.len() > 2 && name.starts_with('[') && name.ends_with(']') {
        BindingType::Classic
    } else if name.starts_with(BIND_PREFIX) {
        BindingType::Alternative
    } else {
        BindingType::None
    }
}

/// Rewrite a classic `[property]` name to `data-amp-bind-property`.
///
/// Returns `None` for names that are not classic bindings.
pub fn alternative_name(name: &str) -> Option<String> {
    match binding_type_for_attr(name) {
        BindingType::Classic => Some(format!("{BIND_PREFIX}{}", &name[1..name.len() - 1])),
        _ => None,
    }
}
