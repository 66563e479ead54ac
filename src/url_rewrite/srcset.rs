//! `srcset` attribute parsing and serialization.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{PurifierError, Result};

static SRCSET_SOURCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\S+)(?:\s+(?:(-?\d+(?:\.\d+)?)([a-zA-Z]*)))?\s*(?:,|$)").expect("static regex")
});

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Descriptor {
    /// `123w`
    Width(u32),
    /// `1.5x`
    Density(f64),
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Width(w) => write!(f, "{w}w"),
            Self::Density(x) => write!(f, "{x}x"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Source {
    pub url: String,
    pub descriptor: Descriptor,
}

/// A parsed `srcset` value. Sources are either all width- or all
/// density-described.
#[derive(Clone, Debug, PartialEq)]
pub struct Srcset {
    sources: Vec<Source>,
}

impl Srcset {
    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    /// Serialize back to `url descriptor, ...`, passing each URL through `map_url`.
    pub fn stringify(&self, mut map_url: impl FnMut(&str) -> Result<String>) -> Result<String> {
        let parts = self
            .sources
            .iter()
            .map(|s| Ok(format!("{} {}", map_url(&s.url)?, s.descriptor)))
            .collect::<Result<Vec<_>>>()?;
        Ok(parts.join(", "))
    }
}

/// Parse a `srcset` value. Sources with an unknown descriptor unit are skipped;
/// a source without a descriptor means `1x`.
pub fn parse(value: &str) -> Result<Srcset> {
    let mut sources = Vec::new();
    for caps in SRCSET_SOURCE.captures_iter(value) {
        let url = caps[1].to_string();
        let descriptor = match (caps.get(2), caps.get(3)) {
            (Some(number), Some(unit)) => match unit.as_str().to_ascii_lowercase().as_str() {
                "w" => Descriptor::Width(number.as_str().parse().map_err(|_| {
                    PurifierError::InvalidSrcset(format!("invalid width in {value:?}"))
                })?),
                "x" => Descriptor::Density(number.as_str().parse().map_err(|_| {
                    PurifierError::InvalidSrcset(format!("invalid density in {value:?}"))
                })?),
                _ => continue,
            },
            _ => Descriptor::Density(1.0),
        };
        sources.push(Source { url, descriptor });
    }

    if sources.is_empty() {
        return Err(PurifierError::InvalidSrcset(
            "srcset must have at least one source".into(),
        ));
    }
    let widths = sources
        .iter()
        .filter(|s| matches!(s.descriptor, Descriptor::Width(_)))
        .count();
    if widths != 0 && widths != sources.len() {
        return Err(PurifierError::InvalidSrcset(
            "srcset must have width or dpr sources, but not both".into(),
        ));
    }
    Ok(Srcset { sources })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_density_and_width_lists() {
        let set = parse("a.png 1x, b.png 2.5x").unwrap();
        assert_eq!(
            set.sources(),
            &[
                Source { url: "a.png".into(), descriptor: Descriptor::Density(1.0) },
                Source { url: "b.png".into(), descriptor: Descriptor::Density(2.5) },
            ]
        );
        let set = parse("small.jpg 320W,large.jpg 1024w").unwrap();
        assert_eq!(set.sources()[1].descriptor, Descriptor::Width(1024));
    }

    #[test]
    fn missing_descriptor_means_one_x() {
        let set = parse("only.png").unwrap();
        assert_eq!(set.sources()[0].descriptor, Descriptor::Density(1.0));
    }

    #[test]
    fn rejects_empty_and_mixed_lists() {
        assert!(matches!(parse("   "), Err(PurifierError::InvalidSrcset(_))));
        assert!(matches!(parse("a.png 1x, b.png 100w"), Err(PurifierError::InvalidSrcset(_))));
        assert!(matches!(parse("a.png -5w"), Err(PurifierError::InvalidSrcset(_))));
    }

    #[test]
    fn stringify_maps_urls_and_keeps_descriptors() {
        let set = parse("a.png 100w, b.png 200w").unwrap();
        let out = set.stringify(|u| Ok(format!("https://x.com/{u}"))).unwrap();
        assert_eq!(out, "https://x.com/a.png 100w, https://x.com/b.png 200w");
        let set = parse("a.png 2x, b.png").unwrap();
        assert_eq!(set.stringify(|u| Ok(u.to_string())).unwrap(), "a.png 2x, b.png 1x");
    }
}
