//! # amp_purifier
//!
//! An HTML sanitizer for markup rendered into AMP documents at runtime, such
//! as the output of `amp-mustache` templates.
//!
//! ## Overview
//!
//! A [`Purifier`] parses untrusted markup as body content, drops everything
//! the AMP policy does not allow, and returns a detached [`Fragment`]. On top
//! of a generic allowlist [`Engine`](sanitizer::Engine) it:
//!
//! - admits AMP components (restricted per [`DocumentFormat`]),
//! - forces safe link targets and validates attribute values,
//! - rewrites `[prop]` bindings to `data-amp-bind-prop` and marks elements
//!   for the DOM differ,
//! - optionally resolves URL attributes against the document location,
//!   proxying images through the AMP cache when the page is cache-served.
//!
//! Rejections are never errors: rejected content is left out of the output
//! and a `tracing` warning is emitted.
//!
//! ## Quick start
//!
//! ```rust
//! use amp_purifier::{DocumentFormat, Purifier};
//!
//! let purifier = Purifier::new(DocumentFormat::General);
//! let clean = purifier.purify_html(r#"<p onclick="steal()">Hi <a href="/x">there</a></p>"#);
//!
//! assert_eq!(clean.to_html(), r#"<p>Hi <a href="/x" target="_top">there</a></p>"#);
//! ```
//!
//! Unescaped template output goes through the stricter
//! [`Purifier::purify_tags_for_triple_mustache`], and later attribute
//! mutations are checked with [`Purifier::validate_attribute_change`].

pub mod binding;
pub mod config;
pub mod dom;
pub mod error;
pub mod format;
pub mod policy;
pub mod purifier;
pub mod sanitizer;
pub mod url_rewrite;
pub mod validator;

pub use config::PurifierBuilder;
pub use dom::{ElementData, Fragment, Namespace, Node};
pub use error::{PurifierError, Result};
pub use format::DocumentFormat;
pub use purifier::Purifier;
pub use sanitizer::Sanitizer;
pub use url_rewrite::{AttributeRewriter, UrlRewriter, rewrite_attributes_for_element};
pub use validator::is_valid_attr;
