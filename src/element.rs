use std::collections::BTreeMap;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use regex::Regex;
use serde::Serialize;

use crate::error::{ConvertError, Diagnostic, DiagnosticKind};
use crate::path::{PathCommand, parse_path};
use crate::style::{Style, parse_number, resolve_style};
use crate::transform::{Matrix, try_parse_transform};
use crate::types::Point;

const DEFAULT_WIDTH: f32 = 800.0;
const DEFAULT_HEIGHT: f32 = 600.0;

/// Below this document-space length a line has no usable direction.
pub const MIN_LENGTH: f32 = 1e-6;

const CONTAINER_TAGS: [&str; 4] = ["g", "svg", "a", "switch"];

const NON_DRAWABLE_TAGS: [&str; 14] = [
    "defs",
    "title",
    "desc",
    "metadata",
    "style",
    "script",
    "clipPath",
    "mask",
    "marker",
    "pattern",
    "linearGradient",
    "radialGradient",
    "symbol",
    "filter",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Element {
    pub tag: String,
    pub id: Option<String>,
    /// Resolved style; `stroke_width` and `font_size` are already in document units.
    pub style: Style,
    pub kind: ElementKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ElementKind {
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        rx: f32,
        ry: f32,
        transform: Matrix,
    },
    Circle {
        cx: f32,
        cy: f32,
        r: f32,
        transform: Matrix,
    },
    Ellipse {
        cx: f32,
        cy: f32,
        rx: f32,
        ry: f32,
        transform: Matrix,
    },
    Line {
        start: Point,
        end: Point,
    },
    Polyline {
        points: Vec<Point>,
    },
    Polygon {
        points: Vec<Point>,
    },
    Text {
        /// Anchor point on the baseline, in document space.
        position: Point,
        content: String,
    },
    Path {
        commands: Vec<PathCommand>,
    },
    Group {
        children: Vec<Element>,
    },
}

impl Element {
    pub fn is_group(&self) -> bool {
        matches!(self.kind, ElementKind::Group { .. })
    }

    /// Document-space center of the shape's outline, when it has one.
    pub fn center(&self) -> Option<Point> {
        match &self.kind {
            ElementKind::Rect {
                x,
                y,
                width,
                height,
                transform,
                ..
            } => Some(transform.apply_point(Point::new(x + width / 2.0, y + height / 2.0))),
            ElementKind::Circle {
                cx, cy, transform, ..
            }
            | ElementKind::Ellipse {
                cx, cy, transform, ..
            } => Some(transform.apply_point(Point::new(*cx, *cy))),
            _ => {
                let (min, max) = self.bounds()?;
                Some(min.lerp(max, 0.5))
            }
        }
    }

    /// Document-space width and height of the axis-aligned bounds.
    pub fn extent(&self) -> (f32, f32) {
        match self.bounds() {
            Some((min, max)) => (max.x - min.x, max.y - min.y),
            None => (0.0, 0.0),
        }
    }

    /// Axis-aligned document-space bounds as `(min, max)`.
    pub fn bounds(&self) -> Option<(Point, Point)> {
        match &self.kind {
            ElementKind::Circle {
                cx,
                cy,
                r,
                transform,
            } => Some(ellipse_bounds(*cx, *cy, *r, *r, *transform)),
            ElementKind::Ellipse {
                cx,
                cy,
                rx,
                ry,
                transform,
            } => Some(ellipse_bounds(*cx, *cy, *rx, *ry, *transform)),
            ElementKind::Rect { .. } => point_bounds(self.outline(1, 4)),
            ElementKind::Line { start, end } => point_bounds([*start, *end]),
            ElementKind::Polyline { points } | ElementKind::Polygon { points } => {
                point_bounds(points.iter().copied())
            }
            ElementKind::Text { position, .. } => Some((*position, *position)),
            ElementKind::Path { commands } => point_bounds(commands.iter().flat_map(command_points)),
            ElementKind::Group { children } => children
                .iter()
                .filter_map(Element::bounds)
                .reduce(|(amin, amax), (bmin, bmax)| {
                    (
                        Point::new(amin.x.min(bmin.x), amin.y.min(bmin.y)),
                        Point::new(amax.x.max(bmax.x), amax.y.max(bmax.y)),
                    )
                }),
        }
    }

    /// Closed document-space outline for area shapes; empty for everything else.
    ///
    /// Rounded rect corners get `corner_segments` steps each; circles and ellipses
    /// become `circle_segments`-gons. The first point is not repeated at the end.
    pub fn outline(&self, corner_segments: usize, circle_segments: usize) -> Vec<Point> {
        match &self.kind {
            ElementKind::Rect {
                x,
                y,
                width,
                height,
                rx,
                ry,
                transform,
            } => rect_outline(*x, *y, *width, *height, *rx, *ry, corner_segments)
                .into_iter()
                .map(|p| transform.apply_point(p))
                .collect(),
            ElementKind::Circle {
                cx,
                cy,
                r,
                transform,
            } => ellipse_outline(*cx, *cy, *r, *r, circle_segments, *transform),
            ElementKind::Ellipse {
                cx,
                cy,
                rx,
                ry,
                transform,
            } => ellipse_outline(*cx, *cy, *rx, *ry, circle_segments, *transform),
            ElementKind::Polygon { points } => points.clone(),
            _ => Vec::new(),
        }
    }
}

fn command_points(cmd: &PathCommand) -> Vec<Point> {
    match cmd {
        PathCommand::MoveTo(points) | PathCommand::LineTo(points) => points.clone(),
        PathCommand::CubicCurve(segs) => segs
            .iter()
            .flat_map(|s| [s.start, s.cp1, s.cp2, s.end])
            .collect(),
        PathCommand::QuadraticCurve(segs) => {
            segs.iter().flat_map(|s| [s.start, s.cp, s.end]).collect()
        }
        PathCommand::Arc(segs) => segs.iter().flat_map(|s| [s.start, s.end]).collect(),
        PathCommand::Close => Vec::new(),
    }
}

fn point_bounds(points: impl IntoIterator<Item = Point>) -> Option<(Point, Point)> {
    let mut it = points.into_iter();
    let first = it.next()?;
    Some(it.fold((first, first), |(min, max), p| {
        (
            Point::new(min.x.min(p.x), min.y.min(p.y)),
            Point::new(max.x.max(p.x), max.y.max(p.y)),
        )
    }))
}

fn ellipse_bounds(cx: f32, cy: f32, rx: f32, ry: f32, m: Matrix) -> (Point, Point) {
    let center = m.apply_point(Point::new(cx, cy));
    let hx = libm::hypotf(m.a * rx, m.c * ry);
    let hy = libm::hypotf(m.b * rx, m.d * ry);
    (
        Point::new(center.x - hx, center.y - hy),
        Point::new(center.x + hx, center.y + hy),
    )
}

fn ellipse_outline(
    cx: f32,
    cy: f32,
    rx: f32,
    ry: f32,
    segments: usize,
    transform: Matrix,
) -> Vec<Point> {
    let n = segments.max(3);
    (0..n)
        .map(|i| {
            let t = std::f32::consts::TAU * i as f32 / n as f32;
            transform.apply_point(Point::new(
                cx + rx * libm::cosf(t),
                cy + ry * libm::sinf(t),
            ))
        })
        .collect()
}

fn rect_outline(
    x: f32,
    y: f32,
    w: f32,
    h: f32,
    rx: f32,
    ry: f32,
    corner_segments: usize,
) -> Vec<Point> {
    if rx <= 0.0 || ry <= 0.0 {
        return vec![
            Point::new(x, y),
            Point::new(x + w, y),
            Point::new(x + w, y + h),
            Point::new(x, y + h),
        ];
    }

    // Corner arcs clockwise in document space (y down), starting at the top-right.
    let corners = [
        (x + w - rx, y + ry, -90.0_f32),
        (x + w - rx, y + h - ry, 0.0),
        (x + rx, y + h - ry, 90.0),
        (x + rx, y + ry, 180.0),
    ];
    let steps = corner_segments.max(1);
    let mut out = Vec::with_capacity(4 * (steps + 1));
    for (ccx, ccy, start_deg) in corners {
        for i in 0..=steps {
            let t = (start_deg + 90.0 * i as f32 / steps as f32).to_radians();
            out.push(Point::new(
                ccx + rx * libm::cosf(t),
                ccy + ry * libm::sinf(t),
            ));
        }
    }
    out
}

/// Result of walking one SVG document.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDocument {
    pub width: f32,
    pub height: f32,
    pub elements: Vec<Element>,
    pub diagnostics: Vec<Diagnostic>,
    /// Unrecognized tag name -> occurrences. Never reported as diagnostics.
    pub unsupported_tags: BTreeMap<String, usize>,
}

impl ParsedDocument {
    /// Number of leaf (non-group) elements in the tree.
    pub fn element_count(&self) -> usize {
        fn count(elements: &[Element]) -> usize {
            elements
                .iter()
                .map(|e| match &e.kind {
                    ElementKind::Group { children } => count(children),
                    _ => 1,
                })
                .sum()
        }
        count(&self.elements)
    }
}

/// Parses an SVG document into a tree of normalized elements.
///
/// Only malformed XML or a non-`<svg>` root is fatal; every per-element problem is
/// collected as a diagnostic and the element is skipped.
pub fn parse_document(svg: &str) -> Result<ParsedDocument, ConvertError> {
    parse_document_cancellable(svg, None)
}

pub(crate) fn parse_document_cancellable(
    svg: &str,
    cancel: Option<&AtomicBool>,
) -> Result<ParsedDocument, ConvertError> {
    let doc = roxmltree::Document::parse(svg)
        .map_err(|err| ConvertError::DocumentParse(err.to_string()))?;
    let root = doc.root_element();
    if root.tag_name().name() != "svg" {
        return Err(ConvertError::DocumentParse(format!(
            "root element is <{}>, expected <svg>",
            root.tag_name().name()
        )));
    }

    let view_box = parse_viewbox(root.attribute("viewBox"));
    let (width, height, origin) = match view_box {
        Some((min_x, min_y, w, h)) => (w, h, Matrix::translate(-min_x, -min_y)),
        None => (
            root.attribute("width")
                .and_then(parse_number)
                .filter(|v| *v > 0.0)
                .unwrap_or(DEFAULT_WIDTH),
            root.attribute("height")
                .and_then(parse_number)
                .filter(|v| *v > 0.0)
                .unwrap_or(DEFAULT_HEIGHT),
            Matrix::identity(),
        ),
    };

    let mut walker = Walker {
        cancel,
        diagnostics: Vec::new(),
        unsupported_tags: BTreeMap::new(),
    };
    let style = resolve_style(root, &Style::default());
    let ctm = walker.compose_transform(root, origin);
    let elements = walker.children(root, ctm, &style)?;

    Ok(ParsedDocument {
        width,
        height,
        elements,
        diagnostics: walker.diagnostics,
        unsupported_tags: walker.unsupported_tags,
    })
}

fn parse_viewbox(view_box: Option<&str>) -> Option<(f32, f32, f32, f32)> {
    let vb = view_box?;
    let mut it = vb
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty());
    let min_x = it.next()?.parse::<f32>().ok()?;
    let min_y = it.next()?.parse::<f32>().ok()?;
    let w = it.next()?.parse::<f32>().ok()?;
    let h = it.next()?.parse::<f32>().ok()?;
    if w <= 0.0 || h <= 0.0 {
        return None;
    }
    Some((min_x, min_y, w, h))
}

struct Walker<'c> {
    cancel: Option<&'c AtomicBool>,
    diagnostics: Vec<Diagnostic>,
    unsupported_tags: BTreeMap<String, usize>,
}

impl Walker<'_> {
    fn check_cancel(&self) -> Result<(), ConvertError> {
        match self.cancel {
            Some(flag) if flag.load(Ordering::Relaxed) => Err(ConvertError::Cancelled),
            _ => Ok(()),
        }
    }

    fn report(
        &mut self,
        kind: DiagnosticKind,
        node: roxmltree::Node<'_, '_>,
        message: impl Into<String>,
    ) {
        let diagnostic = Diagnostic::new(
            kind,
            node.tag_name().name(),
            node.attribute("id"),
            message,
        );
        tracing::warn!(
            kind = diagnostic.kind.as_str(),
            tag = %diagnostic.tag,
            id = ?diagnostic.id,
            "{}",
            diagnostic.message
        );
        self.diagnostics.push(diagnostic);
    }

    fn compose_transform(&mut self, node: roxmltree::Node<'_, '_>, parent: Matrix) -> Matrix {
        let Some(raw) = node.attribute("transform") else {
            return parent;
        };
        match try_parse_transform(raw) {
            Ok(local) => parent.mul(local),
            Err(err) => {
                self.report(DiagnosticKind::TransformParse, node, err.to_string());
                parent
            }
        }
    }

    fn children(
        &mut self,
        node: roxmltree::Node<'_, '_>,
        ctm: Matrix,
        style: &Style,
    ) -> Result<Vec<Element>, ConvertError> {
        let mut out = Vec::new();
        for child in node.children().filter(|n| n.is_element()) {
            self.check_cancel()?;
            if let Some(element) = self.element(child, ctm, style)? {
                out.push(element);
            }
        }
        Ok(out)
    }

    fn element(
        &mut self,
        node: roxmltree::Node<'_, '_>,
        ctm: Matrix,
        inherited: &Style,
    ) -> Result<Option<Element>, ConvertError> {
        let tag = node.tag_name().name();
        if NON_DRAWABLE_TAGS.contains(&tag) {
            return Ok(None);
        }
        let known = CONTAINER_TAGS.contains(&tag)
            || matches!(
                tag,
                "rect" | "circle" | "ellipse" | "line" | "polyline" | "polygon" | "text" | "path"
            );
        if !known {
            *self.unsupported_tags.entry(tag.to_string()).or_insert(0) += 1;
            return Ok(None);
        }

        let style = resolve_style(node, inherited);
        let mut ctm = self.compose_transform(node, ctm);

        if CONTAINER_TAGS.contains(&tag) {
            if tag == "svg" {
                // Nested viewports only shift their content.
                let x = attr(node, "x", 0.0).unwrap_or(0.0);
                let y = attr(node, "y", 0.0).unwrap_or(0.0);
                ctm = ctm.mul(Matrix::translate(x, y));
            }
            let children = self.children(node, ctm, &style)?;
            return Ok(Some(Element {
                tag: tag.to_string(),
                id: node.attribute("id").map(str::to_string),
                style,
                kind: ElementKind::Group { children },
            }));
        }

        let kind = match self.shape(node, tag, ctm) {
            Ok(Some(kind)) => kind,
            Ok(None) => return Ok(None),
            Err(message) => {
                self.report(DiagnosticKind::ElementParse, node, message);
                return Ok(None);
            }
        };

        let mut style = style;
        style.stroke_width *= ctm.scale_factor();
        style.font_size *= ctm.scale_factor();

        Ok(Some(Element {
            tag: tag.to_string(),
            id: node.attribute("id").map(str::to_string),
            style,
            kind,
        }))
    }

    /// `Err` is an element-level parse failure; `Ok(None)` a skip that was already
    /// reported (or needs no report).
    fn shape(
        &mut self,
        node: roxmltree::Node<'_, '_>,
        tag: &str,
        ctm: Matrix,
    ) -> Result<Option<ElementKind>, String> {
        let kind = match tag {
            "rect" => {
                let x = attr(node, "x", 0.0)?;
                let y = attr(node, "y", 0.0)?;
                let width = non_negative(node, "width")?;
                let height = non_negative(node, "height")?;
                let rx_attr = optional_attr(node, "rx")?;
                let ry_attr = optional_attr(node, "ry")?;
                let (rx, ry) = match (rx_attr, ry_attr) {
                    (Some(rx), Some(ry)) => (rx, ry),
                    (Some(rx), None) => (rx, rx),
                    (None, Some(ry)) => (ry, ry),
                    (None, None) => (0.0, 0.0),
                };
                ElementKind::Rect {
                    x,
                    y,
                    width,
                    height,
                    rx: rx.clamp(0.0, width / 2.0),
                    ry: ry.clamp(0.0, height / 2.0),
                    transform: ctm,
                }
            }
            "circle" => ElementKind::Circle {
                cx: attr(node, "cx", 0.0)?,
                cy: attr(node, "cy", 0.0)?,
                r: non_negative(node, "r")?,
                transform: ctm,
            },
            "ellipse" => ElementKind::Ellipse {
                cx: attr(node, "cx", 0.0)?,
                cy: attr(node, "cy", 0.0)?,
                rx: non_negative(node, "rx")?,
                ry: non_negative(node, "ry")?,
                transform: ctm,
            },
            "line" => {
                let start = ctm.apply_point(Point::new(
                    attr(node, "x1", 0.0)?,
                    attr(node, "y1", 0.0)?,
                ));
                let end = ctm.apply_point(Point::new(
                    attr(node, "x2", 0.0)?,
                    attr(node, "y2", 0.0)?,
                ));
                if start.distance(end) < MIN_LENGTH {
                    self.report(
                        DiagnosticKind::GeometryDegenerate,
                        node,
                        "line has zero length",
                    );
                    return Ok(None);
                }
                ElementKind::Line { start, end }
            }
            "polyline" | "polygon" => {
                let points: Vec<Point> = parse_points(node.attribute("points").unwrap_or(""))
                    .into_iter()
                    .map(|p| ctm.apply_point(p))
                    .collect();
                if points.len() < 2 {
                    return Err(format!(
                        "points needs at least two coordinate pairs, found {}",
                        points.len()
                    ));
                }
                if tag == "polygon" {
                    ElementKind::Polygon { points }
                } else {
                    ElementKind::Polyline { points }
                }
            }
            "text" => {
                let x = first_of_list(node, "x")?;
                let y = first_of_list(node, "y")?;
                ElementKind::Text {
                    position: ctm.apply_point(Point::new(x, y)),
                    content: flatten_text(node),
                }
            }
            "path" => {
                let d = node.attribute("d").unwrap_or("");
                let commands = parse_path(d, ctm).map_err(|err| format!("path data: {}", err))?;
                if commands.is_empty() {
                    self.report(
                        DiagnosticKind::GeometryDegenerate,
                        node,
                        "path has no drawing commands",
                    );
                    return Ok(None);
                }
                ElementKind::Path { commands }
            }
            _ => return Ok(None),
        };
        Ok(Some(kind))
    }
}

fn optional_attr(node: roxmltree::Node<'_, '_>, name: &str) -> Result<Option<f32>, String> {
    match node.attribute(name) {
        None => Ok(None),
        Some(raw) => parse_number(raw)
            .filter(|v| v.is_finite())
            .map(Some)
            .ok_or_else(|| format!("invalid {} '{}'", name, raw)),
    }
}

fn attr(node: roxmltree::Node<'_, '_>, name: &str, default: f32) -> Result<f32, String> {
    Ok(optional_attr(node, name)?.unwrap_or(default))
}

fn non_negative(node: roxmltree::Node<'_, '_>, name: &str) -> Result<f32, String> {
    let value = attr(node, name, 0.0)?;
    if value < 0.0 {
        return Err(format!("negative {} {}", name, value));
    }
    Ok(value)
}

/// `x`/`y` on text may be lists; only the first value positions the placeholder.
fn first_of_list(node: roxmltree::Node<'_, '_>, name: &str) -> Result<f32, String> {
    let Some(raw) = node.attribute(name) else {
        return Ok(0.0);
    };
    let first = raw
        .split(|c: char| c.is_whitespace() || c == ',')
        .find(|s| !s.is_empty())
        .unwrap_or("0");
    parse_number(first).ok_or_else(|| format!("invalid {} '{}'", name, raw))
}

/// Own text plus all descendant `tspan` text, whitespace-collapsed.
fn flatten_text(node: roxmltree::Node<'_, '_>) -> String {
    let raw: Vec<&str> = node
        .descendants()
        .filter(|n| n.is_text())
        .filter(|n| {
            n.parent()
                .is_some_and(|p| p == node || p.tag_name().name() == "tspan")
        })
        .filter_map(|n| n.text())
        .collect();
    raw.join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

fn parse_points(input: &str) -> Vec<Point> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();

    let Some(re) = RE
        .get_or_init(|| {
            Regex::new(r"([-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?)\s*,?\s*([-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?)").ok()
        })
        .as_ref()
    else {
        return Vec::new();
    };
    re.captures_iter(input)
        .filter_map(|c| {
            let x = c.get(1)?.as_str().parse::<f32>().ok()?;
            let y = c.get(2)?.as_str().parse::<f32>().ok()?;
            Some(Point::new(x, y))
        })
        .collect()
}
