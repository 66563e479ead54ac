//! Sanitization of unescaped (triple-mustache) template output.

use super::TagKind;
use crate::dom::ElementData;
use crate::format::DocumentFormat;
use crate::policy;
use crate::sanitizer::{Engine, EngineConfig, Visitor};

/// Engine for triple-mustache output: only the format's formatting and table tags.
pub(crate) fn engine(format: DocumentFormat) -> Engine {
    Engine::new(EngineConfig::with_tags(policy::triple_mustache_tags(format)))
}

/// Lets nested `<template type="amp-mustache">` elements round-trip.
pub(crate) struct TemplateVisitor;

impl Visitor for TemplateVisitor {
    fn element(&mut self, element: &mut ElementData, allowed: bool) -> bool {
        allowed
            || (TagKind::classify(element.tag()) == TagKind::Template
                && element
                    .attr("type")
                    .is_some_and(|t| t.eq_ignore_ascii_case("amp-mustache")))
    }
}
