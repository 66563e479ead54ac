//! Cache-proxy (CDN) URL handling.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::error::{PurifierError, Result};

/// Origin of the AMP cache.
pub const CDN_URL: &str = "https://cdn.ampproject.org";

/// Path prefixes under which the cache serves documents.
const SERVING_TYPE_PREFIXES: &[&str] = &["c", "v", "a", "ad"];

/// Query parameters the cache and runtime append to document URLs.
const AMP_RUNTIME_PARAMS: &[&str] = &["amp_gsa", "amp_r", "amp_kit", "usqp"];

/// Prefix of the runtime version parameters (`amp_js_v`, `amp_js_reader`, ...).
const AMP_JS_PARAM_PREFIX: &str = "amp_js";

fn is_runtime_param(pair: &str) -> bool {
    let name = pair.split_once('=').map_or(pair, |(name, _)| name);
    name.starts_with(AMP_JS_PARAM_PREFIX) || AMP_RUNTIME_PARAMS.contains(&name)
}

static PROXY_ORIGIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https://(?:[a-zA-Z0-9_-]+\.)?cdn\.ampproject\.org$").expect("static regex")
});

/// Whether `url` is served from the cache proxy.
pub fn is_proxy_origin(url: &Url) -> bool {
    PROXY_ORIGIN.is_match(&url.origin().ascii_serialization())
}

fn strip_runtime_params(query: &str) -> String {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter(|pair| !is_runtime_param(pair))
        .collect::<Vec<_>>()
        .join("&")
}

/// Recover the publisher URL of a document served from the cache proxy.
///
/// `https://cdn.ampproject.org/c/s/example.com/a?amp_js_v=0.1#x` becomes
/// `https://example.com/a#x`. URLs that are not proxy-served are returned as is.
pub fn source_url(url: &Url) -> Result<Url> {
    if !is_proxy_origin(url) {
        return Ok(url.clone());
    }

    let segments: Vec<&str> = url.path().split('/').skip(1).collect();
    let prefix = segments.first().copied().unwrap_or_default();
    if !SERVING_TYPE_PREFIXES.contains(&prefix) {
        return Err(PurifierError::UnknownServingPrefix(url.to_string()));
    }

    let (scheme, host, rest) = match segments.get(1).copied() {
        Some("s") => ("https", segments.get(2).copied().unwrap_or_default(), 3),
        signal => ("http", signal.unwrap_or_default(), 2),
    };
    if !host.contains('.') {
        return Err(PurifierError::InvalidProxyOrigin(format!("{scheme}://{host}")));
    }

    let mut source = format!("{scheme}://{host}");
    if let Some(path) = segments.get(rest..).filter(|p| !p.is_empty()) {
        source.push('/');
        source.push_str(&path.join("/"));
    }
    let query = strip_runtime_params(url.query().unwrap_or_default());
    if !query.is_empty() {
        source.push('?');
        source.push_str(&query);
    }
    if let Some(fragment) = url.fragment() {
        source.push('#');
        source.push_str(fragment);
    }
    Ok(Url::parse(&source)?)
}

/// Rewrite an image URL to be served through the cache's image endpoint.
pub fn proxy_image_url(src: &Url) -> String {
    let mut host = src.host_str().unwrap_or_default().to_string();
    if let Some(port) = src.port() {
        host.push_str(&format!("%3A{port}"));
    }
    let secure = if src.scheme() == "https" { "s/" } else { "" };
    let mut out = format!("{CDN_URL}/i/{secure}{host}{}", src.path());
    if let Some(query) = src.query() {
        out.push('?');
        out.push_str(query);
    }
    if let Some(fragment) = src.fragment() {
        out.push('#');
        out.push_str(fragment);
    }
    out
}
