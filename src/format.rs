//! Classification of the host document.

use scraper::Html;

/// The document format a [`Purifier`](crate::Purifier) sanitizes for.
///
/// The format selects which tag and attribute tables apply. It is fixed for
/// the lifetime of a purifier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    /// Regular AMP pages (`<html amp>` / `<html ⚡>`) and anything unmarked.
    #[default]
    General,
    /// AMP for email (`<html amp4email>` / `<html ⚡4email>`).
    Amp4Email,
}

const EMAIL_MARKERS: &[&str] = &["amp4email", "\u{26a1}4email"];

impl DocumentFormat {
    /// Derive the format from the attribute names of the root `<html>` element.
    pub fn from_root_attributes<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let is_email = names
            .into_iter()
            .any(|name| EMAIL_MARKERS.iter().any(|m| name.eq_ignore_ascii_case(m)));
        if is_email {
            Self::Amp4Email
        } else {
            Self::General
        }
    }

    /// Parse a full HTML document and classify it by its root element markers.
    pub fn detect(document: &str) -> Self {
        let html = Html::parse_document(document);
        let root = html.root_element();
        Self::from_root_attributes(root.value().attrs().map(|(name, _)| name))
    }

    /// Returns `true` for [`DocumentFormat::Amp4Email`].
    pub fn is_email(self) -> bool {
        self == Self::Amp4Email
    }
}
