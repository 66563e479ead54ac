//! Error types for the `amp_purifier` crate.
//!
//! Policy rejections are not errors: a rejected attribute or element is
//! dropped from the output and a warning is logged. The variants below cover
//! the URL-resolution paths, which callers must be told about.

/// All errors that can occur while resolving or rewriting attribute values.
#[derive(Debug, thiserror::Error)]
pub enum PurifierError {
    /// A URL attribute value tried to carry the `__amp_source_origin` trust token.
    #[error("Source origin is not allowed in {0}")]
    ForgedSourceOrigin(String),

    /// A URL could not be parsed or resolved against its base.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A cache-proxy URL used a serving-type path prefix we do not know.
    #[error("Unknown path prefix in url {0}")]
    UnknownServingPrefix(String),

    /// The publisher origin recovered from a cache-proxy URL is malformed.
    #[error("Expected a . in origin {0}")]
    InvalidProxyOrigin(String),

    /// A `srcset` attribute value could not be parsed.
    #[error("Invalid srcset: {0}")]
    InvalidSrcset(String),
}

/// A type alias for `Result<T, PurifierError>`.
pub type Result<T> = std::result::Result<T, PurifierError>;
