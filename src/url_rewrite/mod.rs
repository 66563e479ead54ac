//! URL attribute resolution and rewriting.
//!
//! Relative URLs in sanitized markup are resolved against the publisher's
//! canonical URL (never the cache-proxy URL the page may be served from), and
//! `amp-img` sources are redirected through the cache's image endpoint when
//! the page itself is proxy-served.

pub mod proxy;
pub mod srcset;

use url::Url;

use crate::dom::ElementData;
use crate::error::{PurifierError, Result};
use crate::validator::{SOURCE_ORIGIN_PARAM, is_url_attribute};

/// Rewrites attribute values accepted by the purifier, e.g. to resolve URLs.
///
/// Implemented for any `Fn(tag, attr, value) -> Result<String>` closure.
pub trait AttributeRewriter: Send + Sync {
    /// Return the value to store for `attr` on `tag`. An error drops the attribute.
    fn rewrite(&self, tag: &str, attr: &str, value: &str) -> Result<String>;
}

impl<F> AttributeRewriter for F
where
    F: Fn(&str, &str, &str) -> Result<String> + Send + Sync,
{
    fn rewrite(&self, tag: &str, attr: &str, value: &str) -> Result<String> {
        self(tag, attr, value)
    }
}

/// [`AttributeRewriter`] that resolves URL attributes against a document location.
#[derive(Clone, Debug)]
pub struct UrlRewriter {
    location: Url,
}

impl UrlRewriter {
    pub fn new(location: Url) -> Self {
        Self { location }
    }

    pub fn location(&self) -> &Url {
        &self.location
    }
}

impl AttributeRewriter for UrlRewriter {
    fn rewrite(&self, tag: &str, attr: &str, value: &str) -> Result<String> {
        rewrite_attribute_value(tag, attr, value, &self.location)
    }
}

/// Resolve `value` if `attr` carries a URL, otherwise return it unchanged.
pub fn rewrite_attribute_value(tag: &str, attr: &str, value: &str, location: &Url) -> Result<String> {
    if is_url_attribute(attr) {
        resolve_url_attr(tag, attr, value, location)
    } else {
        Ok(value.to_string())
    }
}

/// Resolve a URL attribute value for a document at `location`.
///
/// # Errors
///
/// Fails with [`PurifierError::ForgedSourceOrigin`] when the value contains
/// the `__amp_source_origin` token, and with URL errors when the value or the
/// location cannot be resolved. A malformed `srcset` is not an error: it is
/// logged and returned unchanged.
pub fn resolve_url_attr(tag: &str, attr: &str, value: &str, location: &Url) -> Result<String> {
    if value.contains(SOURCE_ORIGIN_PARAM) {
        return Err(PurifierError::ForgedSourceOrigin(format!("{tag}[{attr}]")));
    }

    let is_proxy_host = proxy::is_proxy_origin(location);
    let base = proxy::source_url(location)?;

    match attr {
        "href" if value.starts_with('#') => Ok(value.to_string()),
        "href" => Ok(base.join(value)?.to_string()),
        "src" if tag == "amp-img" => resolve_image_url(value, &base, is_proxy_host),
        "src" => Ok(base.join(value)?.to_string()),
        "srcset" => {
            let parsed = match srcset::parse(value) {
                Ok(parsed) => parsed,
                Err(e) => {
                    tracing::warn!("Failed to parse srcset: {e}");
                    return Ok(value.to_string());
                }
            };
            parsed.stringify(|url| resolve_image_url(url, &base, is_proxy_host))
        }
        _ => Ok(value.to_string()),
    }
}

fn resolve_image_url(value: &str, base: &Url, is_proxy_host: bool) -> Result<String> {
    let src = base.join(value)?;
    // `data:` and already-proxied URLs are kept; unsafe schemes never get here.
    if src.scheme() == "data" || proxy::is_proxy_origin(&src) || !is_proxy_host {
        return Ok(src.to_string());
    }
    Ok(proxy::proxy_image_url(&src))
}

/// Rewrite `attr` on `element` and store the result.
///
/// On proxy-served documents the `target` of `<a href>` follows the link:
/// switching to a hash link saves and removes the target (in-document
/// navigation), switching away from a hash link restores the saved target, or
/// `_top`. Publisher-served documents keep their targets untouched.
pub fn rewrite_attributes_for_element(
    element: &mut ElementData,
    attr: &str,
    value: &str,
    location: &Url,
) -> Result<String> {
    let tag = element.tag().to_string();
    let attr = attr.to_ascii_lowercase();
    let rewritten = rewrite_attribute_value(&tag, &attr, value, location)?;

    if tag == "a" && attr == "href" && proxy::is_proxy_origin(location) {
        let new_is_hash = rewritten.is_empty() || rewritten.starts_with('#');
        let old_is_hash = element.attr(&attr).is_some_and(|v| v.starts_with('#'));
        if new_is_hash && !old_is_hash {
            if element.saved_target().is_none() {
                let target = element.attr("target").map(str::to_string);
                element.save_target(target);
            }
            element.remove_attr("target");
        } else if old_is_hash && !new_is_hash {
            let target = element.saved_target().unwrap_or("_top").to_string();
            element.set_attr("target", target);
        }
    }

    element.set_attr(attr, rewritten.clone());
    Ok(rewritten)
}
