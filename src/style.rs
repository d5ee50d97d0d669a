use lightningcss::printer::PrinterOptions;
use lightningcss::properties::Property;
use lightningcss::properties::custom::{CustomPropertyName, Token, TokenOrValue};
use lightningcss::properties::svg::{SVGPaint, SVGPaintFallback};
use lightningcss::stylesheet::{ParserOptions, StyleAttribute};
use lightningcss::traits::ToCss;
use lightningcss::values::alpha::AlphaValue;
use lightningcss::values::color::{CssColor, SRGB};
use serde::Serialize;

use crate::types::Color;

/// Resolved paint for one channel. `None` is an explicit "no paint", distinct from
/// `Unset` (nothing specified anywhere up the tree).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Paint {
    Unset,
    None,
    Color(Color),
    Invalid(String),
}

impl Paint {
    pub fn is_none(&self) -> bool {
        matches!(self, Paint::None)
    }

    pub fn color(&self) -> Option<Color> {
        match self {
            Paint::Color(c) => Some(*c),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAnchor {
    Start,
    Middle,
    End,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Style {
    pub fill: Paint,
    pub stroke: Paint,
    pub stroke_width: f32,
    pub opacity: f32,
    pub fill_opacity: f32,
    pub stroke_opacity: f32,
    /// Alpha carried by the fill paint itself (`rgba()`); replaced with the paint.
    pub fill_paint_alpha: f32,
    pub stroke_paint_alpha: f32,
    pub font_size: f32,
    pub font_family: String,
    pub text_anchor: TextAnchor,
}

impl Style {
    /// Effective fill alpha before group `opacity`.
    pub fn fill_alpha(&self) -> f32 {
        self.fill_opacity * self.fill_paint_alpha
    }

    pub fn stroke_alpha(&self) -> f32 {
        self.stroke_opacity * self.stroke_paint_alpha
    }
}

impl Default for Style {
    fn default() -> Self {
        Self {
            fill: Paint::Unset,
            stroke: Paint::Unset,
            stroke_width: 1.0,
            opacity: 1.0,
            fill_opacity: 1.0,
            stroke_opacity: 1.0,
            fill_paint_alpha: 1.0,
            stroke_paint_alpha: 1.0,
            font_size: 16.0,
            font_family: "sans-serif".to_string(),
            text_anchor: TextAnchor::Start,
        }
    }
}

/// Declarations found on one element, before they are merged into the inherited style.
/// Paint alpha (from `rgba()` and friends) travels with the paint so an overriding
/// presentation attribute drops it too.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleDelta {
    pub fill: Option<(Paint, f32)>,
    pub stroke: Option<(Paint, f32)>,
    pub stroke_width: Option<f32>,
    pub opacity: Option<f32>,
    pub fill_opacity: Option<f32>,
    pub stroke_opacity: Option<f32>,
    pub font_size: Option<f32>,
    pub font_family: Option<String>,
    pub text_anchor: Option<TextAnchor>,
}

impl StyleDelta {
    /// Fields set in `other` win.
    pub fn overlay(&mut self, other: StyleDelta) {
        macro_rules! take {
            ($($field:ident),*) => {
                $(if other.$field.is_some() {
                    self.$field = other.$field;
                })*
            };
        }
        take!(
            fill,
            stroke,
            stroke_width,
            opacity,
            fill_opacity,
            stroke_opacity,
            font_size,
            font_family,
            text_anchor
        );
    }

    /// Applies the delta on top of the inherited style. Only `opacity` multiplies down
    /// the tree; `fill-opacity` and `stroke-opacity` are replaced like any inherited value.
    pub fn apply_to(self, inherited: &Style) -> Style {
        let mut out = inherited.clone();
        if let Some((paint, alpha)) = self.fill {
            out.fill = paint;
            out.fill_paint_alpha = alpha;
        }
        if let Some((paint, alpha)) = self.stroke {
            out.stroke = paint;
            out.stroke_paint_alpha = alpha;
        }
        if let Some(v) = self.stroke_width {
            out.stroke_width = v;
        }
        if let Some(v) = self.opacity {
            out.opacity *= v;
        }
        if let Some(v) = self.fill_opacity {
            out.fill_opacity = v;
        }
        if let Some(v) = self.stroke_opacity {
            out.stroke_opacity = v;
        }
        if let Some(v) = self.font_size {
            out.font_size = v;
        }
        if let Some(v) = self.font_family {
            out.font_family = v;
        }
        if let Some(v) = self.text_anchor {
            out.text_anchor = v;
        }
        out
    }
}

const PRESENTATION_ATTRIBUTES: [&str; 9] = [
    "fill",
    "stroke",
    "stroke-width",
    "opacity",
    "fill-opacity",
    "stroke-opacity",
    "font-size",
    "font-family",
    "text-anchor",
];

/// Resolves an element's style: inherited < CSS `style` string < presentation attributes.
pub fn resolve_style(node: roxmltree::Node<'_, '_>, inherited: &Style) -> Style {
    let mut delta = node
        .attribute("style")
        .map(parse_style_string)
        .unwrap_or_default();

    let mut attrs = StyleDelta::default();
    for name in PRESENTATION_ATTRIBUTES {
        if let Some(value) = node.attribute(name) {
            apply_declaration(name, value, &mut attrs);
        }
    }
    delta.overlay(attrs);

    // fill/stroke attributes are re-read last so nothing above can shadow them.
    if let Some(fill) = node.attribute("fill").and_then(parse_paint) {
        delta.fill = Some(fill);
    }
    if let Some(stroke) = node.attribute("stroke").and_then(parse_paint) {
        delta.stroke = Some(stroke);
    }

    for channel in [&mut delta.fill, &mut delta.stroke] {
        let solid = match channel.as_ref() {
            Some((Paint::Invalid(raw), _)) => resolve_paint_server(node, raw),
            _ => None,
        };
        if solid.is_some() {
            *channel = solid;
        }
    }

    delta.apply_to(inherited)
}

const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

/// Solid stand-in for a `url(#id)` paint: the first stop of the referenced gradient,
/// following `href` templates. Patterns and dangling references resolve to nothing,
/// leaving the paint `Invalid`.
fn resolve_paint_server(node: roxmltree::Node<'_, '_>, raw: &str) -> Option<(Paint, f32)> {
    let id = url_id(raw)?;
    let doc = node.document();
    let mut target = element_by_id(doc, id)?;
    // Bounded so a self-referencing href chain terminates.
    for _ in 0..8 {
        if !matches!(target.tag_name().name(), "linearGradient" | "radialGradient") {
            return None;
        }
        if let Some(stop) = target.children().find(|n| n.has_tag_name("stop")) {
            return Some(stop_paint(stop));
        }
        target = element_by_id(doc, href_id(target)?)?;
    }
    None
}

fn url_id(raw: &str) -> Option<&str> {
    let inner = raw.trim().strip_prefix("url(")?;
    let inner = &inner[..inner.find(')')?];
    let id = inner.trim().trim_matches('"').trim_matches('\'').strip_prefix('#')?;
    (!id.is_empty()).then_some(id)
}

fn href_id<'a>(node: roxmltree::Node<'a, '_>) -> Option<&'a str> {
    let raw = node
        .attribute("href")
        .or_else(|| node.attribute((XLINK_NS, "href")))?;
    let id = raw.trim().strip_prefix('#')?;
    (!id.is_empty()).then_some(id)
}

fn element_by_id<'a, 'input>(
    doc: &'a roxmltree::Document<'input>,
    id: &str,
) -> Option<roxmltree::Node<'a, 'input>> {
    doc.descendants()
        .find(|n| n.is_element() && n.attribute("id") == Some(id))
}

fn stop_paint(stop: roxmltree::Node<'_, '_>) -> (Paint, f32) {
    let mut color = stop.attribute("stop-color").map(str::to_string);
    let mut opacity = stop.attribute("stop-opacity").map(str::to_string);
    if let Some(style) = stop.attribute("style") {
        for decl in style.split(';') {
            let Some((k, v)) = decl.split_once(':') else {
                continue;
            };
            match k.trim().to_ascii_lowercase().as_str() {
                "stop-color" => color = Some(v.trim().to_string()),
                "stop-opacity" => opacity = Some(v.trim().to_string()),
                _ => {}
            }
        }
    }
    let stop_alpha = opacity
        .as_deref()
        .and_then(parse_number)
        .map_or(1.0, |v| v.clamp(0.0, 1.0));
    // An omitted stop-color is black.
    let raw = color.unwrap_or_else(|| "black".to_string());
    match parse_paint(&raw) {
        Some((Paint::Color(c), alpha)) => (Paint::Color(c), alpha * stop_alpha),
        _ => (Paint::Invalid(raw), 1.0),
    }
}

/// Parses a CSS declaration list with lightningcss, falling back to a plain
/// `name: value;` split when the typed parser rejects the input.
pub fn parse_style_string(input: &str) -> StyleDelta {
    let mut delta = StyleDelta::default();
    if let Ok(style_attr) = StyleAttribute::parse(input, ParserOptions::default()) {
        apply_property_list(&style_attr.declarations.declarations, &mut delta);
        apply_property_list(&style_attr.declarations.important_declarations, &mut delta);
        return delta;
    }
    for decl in input.split(';') {
        let Some((k, v)) = decl.split_once(':') else {
            continue;
        };
        let key = k.trim().to_ascii_lowercase();
        apply_declaration(&key, v.trim().trim_end_matches("!important").trim(), &mut delta);
    }
    delta
}

fn apply_property_list(props: &[Property], delta: &mut StyleDelta) {
    for prop in props {
        apply_property(prop, delta);
    }
}

fn apply_property(prop: &Property<'_>, delta: &mut StyleDelta) {
    match prop {
        Property::Fill(paint) => {
            if let Some(p) = svg_paint(paint) {
                delta.fill = Some(p);
            }
        }
        Property::Stroke(paint) => {
            if let Some(p) = svg_paint(paint) {
                delta.stroke = Some(p);
            }
        }
        Property::StrokeWidth(value) => {
            if let Ok(raw) = value.to_css_string(PrinterOptions::default()) {
                if let Some(v) = parse_number(&raw) {
                    delta.stroke_width = Some(v.max(0.0));
                }
            }
        }
        Property::Opacity(value) => delta.opacity = Some(alpha_value(value)),
        Property::FillOpacity(value) => delta.fill_opacity = Some(alpha_value(value)),
        Property::StrokeOpacity(value) => delta.stroke_opacity = Some(alpha_value(value)),
        Property::FontSize(value) => {
            if let Ok(raw) = value.to_css_string(PrinterOptions::default()) {
                if let Some(v) = parse_number(&raw) {
                    delta.font_size = Some(v.max(0.0));
                }
            }
        }
        Property::FontFamily(families) => {
            let names: Vec<String> = families
                .iter()
                .filter_map(|f| f.to_css_string(PrinterOptions::default()).ok())
                .map(|s| s.trim().trim_matches('"').trim_matches('\'').to_string())
                .filter(|s| !s.is_empty())
                .collect();
            if !names.is_empty() {
                delta.font_family = Some(names.join(", "));
            }
        }
        // Not a typed property in lightningcss; comes through as a custom declaration.
        Property::Custom(custom) => {
            let CustomPropertyName::Unknown(name) = &custom.name else {
                return;
            };
            if name.as_ref().eq_ignore_ascii_case("text-anchor") {
                let ident = custom.value.0.iter().find_map(|token| match token {
                    TokenOrValue::Token(Token::Ident(ident)) => Some(ident.as_ref().to_string()),
                    _ => None,
                });
                if let Some(raw) = ident {
                    delta.text_anchor = parse_text_anchor(&raw);
                }
            }
        }
        _ => {}
    }
}

fn svg_paint(paint: &SVGPaint<'_>) -> Option<(Paint, f32)> {
    match paint {
        SVGPaint::None => Some((Paint::None, 1.0)),
        SVGPaint::Color(color) => css_color(color).map(|(c, a)| (Paint::Color(c), a)),
        // Gradients and patterns fall back to their declared color. Without one the
        // reference is kept for `resolve_style` to replace with a solid stop color.
        SVGPaint::Url { url, fallback } => match fallback {
            Some(SVGPaintFallback::Color(color)) => {
                css_color(color).map(|(c, a)| (Paint::Color(c), a))
            }
            Some(SVGPaintFallback::None) => Some((Paint::None, 1.0)),
            None => Some((Paint::Invalid(format!("url({})", url.url.as_ref())), 1.0)),
        },
        SVGPaint::ContextFill | SVGPaint::ContextStroke => None,
    }
}

fn css_color(color: &CssColor) -> Option<(Color, f32)> {
    if let CssColor::RGBA(rgba) = color {
        let alpha = (rgba.alpha as f32 / 255.0).clamp(0.0, 1.0);
        return Some((Color::from_rgb8(rgba.red, rgba.green, rgba.blue), alpha));
    }
    if let Ok(srgb) = SRGB::try_from(color) {
        return Some((
            Color::rgb(srgb.r, srgb.g, srgb.b),
            srgb.alpha.clamp(0.0, 1.0),
        ));
    }
    None
}

fn alpha_value(value: &AlphaValue) -> f32 {
    value.0.clamp(0.0, 1.0)
}

/// Plain-string declaration handling, shared by presentation attributes and the
/// fallback CSS path.
fn apply_declaration(name: &str, value: &str, delta: &mut StyleDelta) {
    match name {
        "fill" => {
            if let Some(p) = parse_paint(value) {
                delta.fill = Some(p);
            }
        }
        "stroke" => {
            if let Some(p) = parse_paint(value) {
                delta.stroke = Some(p);
            }
        }
        "stroke-width" => {
            if let Some(v) = parse_number(value) {
                delta.stroke_width = Some(v.max(0.0));
            }
        }
        "opacity" => {
            if let Some(v) = parse_number(value) {
                delta.opacity = Some(v.clamp(0.0, 1.0));
            }
        }
        "fill-opacity" => {
            if let Some(v) = parse_number(value) {
                delta.fill_opacity = Some(v.clamp(0.0, 1.0));
            }
        }
        "stroke-opacity" => {
            if let Some(v) = parse_number(value) {
                delta.stroke_opacity = Some(v.clamp(0.0, 1.0));
            }
        }
        "font-size" => {
            if let Some(v) = parse_number(value) {
                delta.font_size = Some(v.max(0.0));
            }
        }
        "font-family" => {
            let v = value.trim();
            if !v.is_empty() {
                delta.font_family = Some(v.to_string());
            }
        }
        "text-anchor" => delta.text_anchor = parse_text_anchor(value),
        _ => {}
    }
}

fn parse_text_anchor(input: &str) -> Option<TextAnchor> {
    match input.trim().to_ascii_lowercase().as_str() {
        "start" => Some(TextAnchor::Start),
        "middle" => Some(TextAnchor::Middle),
        "end" => Some(TextAnchor::End),
        _ => None,
    }
}

/// Parses one paint value. `None` means "leave the inherited paint alone"
/// (`inherit`, `currentColor`, empty).
pub fn parse_paint(input: &str) -> Option<(Paint, f32)> {
    let v = input.trim();
    if v.is_empty() {
        return None;
    }
    let lower = v.to_ascii_lowercase();
    match lower.as_str() {
        "none" | "transparent" => return Some((Paint::None, 1.0)),
        "inherit" | "currentcolor" => return None,
        _ => {}
    }
    if lower.starts_with("url(") {
        // Gradient/pattern references: solid fallback after the url, else the raw
        // reference, resolved against the document in `resolve_style`.
        let fallback = v.rfind(')').map(|i| v[i + 1..].trim()).unwrap_or("");
        if fallback.is_empty() {
            return Some((Paint::Invalid(v.to_string()), 1.0));
        }
        return parse_paint(fallback);
    }
    if let Some((color, alpha)) = parse_functional_color(&lower) {
        return Some((Paint::Color(color), alpha));
    }
    match parse_color(v) {
        Some(color) => Some((Paint::Color(color), 1.0)),
        None => Some((Paint::Invalid(v.to_string()), 1.0)),
    }
}

/// `#RGB`, `#RRGGBB` or a named color.
pub fn parse_color(input: &str) -> Option<Color> {
    let v = input.trim();
    if let Some(hex) = v.strip_prefix('#') {
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        return match hex.len() {
            3 => {
                let digit = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|d| d * 17);
                Some(Color::from_rgb8(digit(0)?, digit(1)?, digit(2)?))
            }
            6 => {
                let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
                Some(Color::from_rgb8(byte(0)?, byte(2)?, byte(4)?))
            }
            _ => None,
        };
    }
    named_color(&v.to_ascii_lowercase())
}

fn named_color(name: &str) -> Option<Color> {
    let rgb = match name {
        "black" => (0, 0, 0),
        "white" => (255, 255, 255),
        "red" => (255, 0, 0),
        "green" => (0, 128, 0),
        "lime" => (0, 255, 0),
        "blue" => (0, 0, 255),
        "yellow" => (255, 255, 0),
        "orange" => (255, 165, 0),
        "purple" => (128, 0, 128),
        "gray" | "grey" => (128, 128, 128),
        "lightgray" | "lightgrey" => (211, 211, 211),
        "darkgray" | "darkgrey" => (169, 169, 169),
        "silver" => (192, 192, 192),
        "navy" => (0, 0, 128),
        "teal" => (0, 128, 128),
        "maroon" => (128, 0, 0),
        "olive" => (128, 128, 0),
        "aqua" | "cyan" => (0, 255, 255),
        "fuchsia" | "magenta" => (255, 0, 255),
        "pink" => (255, 192, 203),
        "brown" => (165, 42, 42),
        "gold" => (255, 215, 0),
        "steelblue" => (70, 130, 180),
        "skyblue" => (135, 206, 235),
        "coral" => (255, 127, 80),
        "crimson" => (220, 20, 60),
        "indigo" => (75, 0, 130),
        _ => return None,
    };
    Some(Color::from_rgb8(rgb.0, rgb.1, rgb.2))
}

/// `rgb(r, g, b)` / `rgba(r, g, b, a)` with integer or percentage channels.
fn parse_functional_color(lower: &str) -> Option<(Color, f32)> {
    let inner = lower
        .strip_prefix("rgba(")
        .or_else(|| lower.strip_prefix("rgb("))?
        .strip_suffix(')')?;
    let parts: Vec<&str> = inner
        .split(|c: char| c == ',' || c == '/' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .collect();
    if parts.len() != 3 && parts.len() != 4 {
        return None;
    }
    let channel = |s: &str| -> Option<f32> {
        if let Some(pct) = s.strip_suffix('%') {
            return pct.parse::<f32>().ok().map(|v| (v / 100.0).clamp(0.0, 1.0));
        }
        s.parse::<f32>().ok().map(|v| (v / 255.0).clamp(0.0, 1.0))
    };
    let alpha = match parts.get(3) {
        Some(a) => match a.strip_suffix('%') {
            Some(pct) => pct.parse::<f32>().ok()? / 100.0,
            None => a.parse::<f32>().ok()?,
        },
        None => 1.0,
    };
    Some((
        Color::rgb(channel(parts[0])?, channel(parts[1])?, channel(parts[2])?),
        alpha.clamp(0.0, 1.0),
    ))
}

/// Parses a number, ignoring a trailing unit (user units are taken as-is).
pub fn parse_number(input: &str) -> Option<f32> {
    let s = input.trim();
    let s = s
        .trim_end_matches("px")
        .trim_end_matches("pt")
        .trim_end_matches("mm")
        .trim_end_matches("cm")
        .trim_end_matches("in")
        .trim_end_matches("em")
        .trim();
    match s.parse::<f32>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => None,
    }
}
