//! Builder for configuring a [`Purifier`].

use url::Url;

use crate::format::DocumentFormat;
use crate::purifier::Purifier;
use crate::url_rewrite::{AttributeRewriter, UrlRewriter};

/// Builder for a [`Purifier`].
///
/// Provides a fluent API for setting the document format and the rewriter
/// applied to accepted attribute values.
///
/// # Example
///
/// ```rust
/// use amp_purifier::{DocumentFormat, PurifierBuilder};
/// use url::Url;
///
/// let purifier = PurifierBuilder::new()
///     .format(DocumentFormat::General)
///     .location(Url::parse("https://cdn.ampproject.org/c/s/acme.org/doc").unwrap())
///     .build();
///
/// let html = purifier.purify_html(r#"<a href="/about">About</a>"#).to_html();
/// assert_eq!(html, r#"<a href="https://acme.org/about" target="_top">About</a>"#);
/// ```
#[derive(Default)]
pub struct PurifierBuilder {
    format: DocumentFormat,
    rewriter: Option<Box<dyn AttributeRewriter>>,
}

impl PurifierBuilder {
    /// Create a builder for general AMP documents without attribute rewriting.
    pub fn new() -> Self {
        Self::default()
    }

    /// Document format whose policy the purifier applies.
    pub fn format(mut self, format: DocumentFormat) -> Self {
        self.format = format;
        self
    }

    /// Resolve URL attributes against the URL the document is served from.
    ///
    /// Shorthand for `attribute_rewriter(UrlRewriter::new(location))`.
    pub fn location(self, location: Url) -> Self {
        self.attribute_rewriter(UrlRewriter::new(location))
    }

    /// Rewrite every accepted, non-empty, non-binding attribute value.
    ///
    /// Replaces any rewriter set earlier, including one installed by
    /// [`location`](Self::location).
    pub fn attribute_rewriter(mut self, rewriter: impl AttributeRewriter + 'static) -> Self {
        self.rewriter = Some(Box::new(rewriter));
        self
    }

    /// Consume the builder and return the configured [`Purifier`].
    pub fn build(self) -> Purifier {
        Purifier::with_rewriter(self.format, self.rewriter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_general_without_rewriting() {
        let purifier = PurifierBuilder::new().build();
        assert_eq!(purifier.format(), DocumentFormat::General);
        assert_eq!(
            purifier.purify_html(r#"<a href="rel.html">x</a>"#).to_html(),
            r#"<a href="rel.html" target="_top">x</a>"#
        );
    }

    #[test]
    fn email_format_is_applied() {
        let purifier = PurifierBuilder::new().format(DocumentFormat::Amp4Email).build();
        assert!(purifier.format().is_email());
        assert_eq!(purifier.purify_html("<amp-analytics></amp-analytics>").to_html(), "");
    }

    #[test]
    fn location_resolves_relative_urls() {
        let purifier = PurifierBuilder::new()
            .location(Url::parse("https://acme.org/news/doc.html").unwrap())
            .build();
        assert_eq!(
            purifier.purify_html(r#"<a href="x.html">x</a>"#).to_html(),
            r#"<a href="https://acme.org/news/x.html" target="_top">x</a>"#
        );
    }
}
