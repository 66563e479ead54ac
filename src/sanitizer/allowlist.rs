//! Default allowlists of the generic sanitizer.
//!
//! These follow the conventional HTML + SVG + SVG-filter profiles of
//! general-purpose sanitizers. All names are lowercase; lookups lowercase the
//! element and attribute names first.

use std::sync::LazyLock;

use regex::Regex;

pub const HTML_TAGS: &[&str] = &[
    "a", "abbr", "acronym", "address", "area", "article", "aside", "audio", "b", "bdi", "bdo",
    "big", "blink", "blockquote", "body", "br", "button", "canvas", "caption", "center", "cite",
    "code", "col", "colgroup", "content", "data", "datalist", "dd", "decorator", "del", "details",
    "dfn", "dialog", "dir", "div", "dl", "dt", "element", "em", "fieldset", "figcaption",
    "figure", "font", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "head", "header",
    "hgroup", "hr", "html", "i", "img", "input", "ins", "kbd", "label", "legend", "li", "main",
    "map", "mark", "marquee", "menu", "menuitem", "meter", "nav", "nobr", "ol", "optgroup",
    "option", "output", "p", "picture", "pre", "progress", "q", "rp", "rt", "ruby", "s", "samp",
    "section", "select", "shadow", "small", "source", "spacer", "span", "strike", "strong",
    "style", "sub", "summary", "sup", "table", "tbody", "td", "template", "textarea", "tfoot",
    "th", "thead", "time", "tr", "track", "tt", "u", "ul", "var", "video", "wbr",
];

pub const SVG_TAGS: &[&str] = &[
    "svg", "a", "altglyph", "altglyphdef", "altglyphitem", "animatecolor", "animatemotion",
    "animatetransform", "circle", "clippath", "defs", "desc", "ellipse", "filter", "font", "g",
    "glyph", "glyphref", "hkern", "image", "line", "lineargradient", "marker", "mask",
    "metadata", "mpath", "path", "pattern", "polygon", "polyline", "radialgradient", "rect",
    "stop", "style", "switch", "symbol", "text", "textpath", "title", "tref", "tspan", "view",
    "vkern",
];

pub const SVG_FILTER_TAGS: &[&str] = &[
    "feblend", "fecolormatrix", "fecomponenttransfer", "fecomposite", "feconvolvematrix",
    "fediffuselighting", "fedisplacementmap", "fedistantlight", "feflood", "fefunca", "fefuncb",
    "fefuncg", "fefuncr", "fegaussianblur", "feimage", "femerge", "femergenode", "femorphology",
    "feoffset", "fepointlight", "fespecularlighting", "fespotlight", "fetile", "feturbulence",
];

pub const HTML_ATTRS: &[&str] = &[
    "accept", "action", "align", "alt", "autocapitalize", "autocomplete", "autopictureinpicture",
    "autoplay", "background", "bgcolor", "border", "capture", "cellpadding", "cellspacing",
    "checked", "cite", "class", "clear", "color", "cols", "colspan", "controls", "controlslist",
    "coords", "crossorigin", "datetime", "decoding", "default", "dir", "disabled",
    "disablepictureinpicture", "disableremoteplayback", "download", "draggable", "enctype",
    "enterkeyhint", "face", "for", "headers", "height", "hidden", "high", "href", "hreflang",
    "id", "inputmode", "integrity", "ismap", "kind", "label", "lang", "list", "loading", "loop",
    "low", "max", "maxlength", "media", "method", "min", "minlength", "multiple", "muted", "name",
    "nonce", "noshade", "novalidate", "nowrap", "open", "optimum", "pattern", "placeholder",
    "playsinline", "poster", "preload", "pubdate", "radiogroup", "readonly", "rel", "required",
    "rev", "reversed", "role", "rows", "rowspan", "spellcheck", "scope", "selected", "shape",
    "size", "sizes", "span", "srclang", "start", "src", "srcset", "step", "style", "summary",
    "tabindex", "title", "translate", "type", "usemap", "valign", "value", "width", "xmlns",
    "slot",
];

pub const SVG_ATTRS: &[&str] = &[
    "accent-height", "accumulate", "additive", "alignment-baseline", "ascent", "attributename",
    "attributetype", "azimuth", "basefrequency", "baseline-shift", "begin", "bias", "by",
    "class", "clip", "clippathunits", "clip-path", "clip-rule", "color", "color-interpolation",
    "color-interpolation-filters", "color-profile", "color-rendering", "cx", "cy", "d", "dx",
    "dy", "diffuseconstant", "direction", "display", "divisor", "dur", "edgemode", "elevation",
    "end", "fill", "fill-opacity", "fill-rule", "filter", "filterunits", "flood-color",
    "flood-opacity", "font-family", "font-size", "font-size-adjust", "font-stretch",
    "font-style", "font-variant", "font-weight", "fx", "fy", "g1", "g2", "glyph-name",
    "glyphref", "gradientunits", "gradienttransform", "height", "href", "id", "image-rendering",
    "in", "in2", "k", "k1", "k2", "k3", "k4", "kerning", "keypoints", "keysplines", "keytimes",
    "lang", "lengthadjust", "letter-spacing", "kernelmatrix", "kernelunitlength",
    "lighting-color", "local", "marker-end", "marker-mid", "marker-start", "markerheight",
    "markerunits", "markerwidth", "maskcontentunits", "maskunits", "max", "mask", "media",
    "method", "mode", "min", "name", "numoctaves", "offset", "operator", "opacity", "order",
    "orient", "orientation", "origin", "overflow", "paint-order", "path", "pathlength",
    "patterncontentunits", "patterntransform", "patternunits", "points", "preservealpha",
    "preserveaspectratio", "primitiveunits", "r", "rx", "ry", "radius", "refx", "refy",
    "repeatcount", "repeatdur", "restart", "result", "rotate", "scale", "seed",
    "shape-rendering", "specularconstant", "specularexponent", "spreadmethod", "startoffset",
    "stddeviation", "stitchtiles", "stop-color", "stop-opacity", "stroke-dasharray",
    "stroke-dashoffset", "stroke-linecap", "stroke-linejoin", "stroke-miterlimit",
    "stroke-opacity", "stroke", "stroke-width", "style", "surfacescale", "systemlanguage",
    "tabindex", "targetx", "targety", "transform", "text-anchor", "text-decoration",
    "text-rendering", "textlength", "type", "u1", "u2", "unicode", "values", "viewbox",
    "visibility", "version", "vert-adv-y", "vert-origin-x", "vert-origin-y", "width",
    "word-spacing", "wrap", "writing-mode", "xchannelselector", "ychannelselector", "x", "x1",
    "x2", "xmlns", "y", "y1", "y2", "z", "zoomandpan",
];

pub const XML_ATTRS: &[&str] = &["xlink:href", "xml:id", "xlink:title", "xml:space", "xmlns:xlink"];

/// Attributes whose values are never interpreted as URLs.
pub const URI_SAFE_ATTRS: &[&str] = &[
    "alt", "class", "for", "id", "label", "name", "pattern", "placeholder", "role", "summary",
    "title", "value", "style", "xmlns",
];

/// Tags that may load `data:` URIs through `src` / `href`.
pub const DATA_URI_TAGS: &[&str] = &["audio", "video", "img", "source", "image", "track"];

/// When one of these is removed, its whole subtree goes with it.
pub const FORBID_CONTENTS: &[&str] = &[
    "annotation-xml", "audio", "colgroup", "desc", "foreignobject", "head", "iframe", "math",
    "mi", "mn", "mo", "ms", "mtext", "noembed", "noframes", "noscript", "plaintext", "script",
    "style", "svg", "template", "thead", "title", "video", "xmp",
];

pub static ALLOWED_URI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:(?:(?:f|ht)tps?|mailto|tel|callto|sms|cid|xmpp):|[^a-z]|[a-z+.\-]+(?:[^a-z+.\-:]|$))",
    )
    .expect("static regex")
});

pub static SCRIPT_OR_DATA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:\w+script|data):").expect("static regex"));

pub static ATTR_WHITESPACE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\x00-\x20\x{a0}\x{1680}\x{180e}\x{2000}-\x{2029}\x{205f}\x{3000}]")
        .expect("static regex")
});

pub static DATA_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^data-[\-\w.\x{b7}-\x{ffff}]").expect("static regex"));

pub static ARIA_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^aria-[\-\w]+$").expect("static regex"));
