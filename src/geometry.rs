use std::f32::consts::{FRAC_PI_2, PI, TAU};
use std::fmt;

use serde::Serialize;

use crate::classify::Role;
use crate::element::{Element, ElementKind, MIN_LENGTH};
use crate::options::{ArcMode, ConvertOptions, StylePreset};
use crate::path::{ArcSegment, CubicSegment, PathCommand};
use crate::style::{Paint, TextAnchor};
use crate::types::{Aabb, Point, Vec3};

/// Width of one placeholder glyph relative to the font size.
pub const TEXT_ADVANCE: f32 = 0.6;

const MIN_AREA: f32 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bevel {
    /// World units.
    pub width: f32,
    pub segments: u32,
    /// 0.0 is a chamfer, 1.0 a fully rounded profile.
    pub profile: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FillMode {
    Open,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CurveSegment {
    pub start: Vec3,
    pub cp1: Vec3,
    pub cp2: Vec3,
    pub end: Vec3,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Spline {
    pub segments: Vec<CurveSegment>,
    pub closed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape3D {
    /// Closed outline in the z=0 plane, extruded symmetrically.
    Extrusion { outline: Vec<Vec3> },
    /// One quad per stroked segment, each extruded like an outline.
    Ribbon { quads: Vec<[Vec3; 4]> },
    Curves { splines: Vec<Spline> },
    Billboard {
        center: Vec3,
        width: f32,
        height: f32,
        text: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Geometry3D {
    pub shape: Shape3D,
    /// Half-thickness: the solid spans `z` in `[-depth, depth]`.
    pub depth: f32,
    pub bevel: Bevel,
    pub fill_mode: FillMode,
    #[serde(skip)]
    pub skipped_segments: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Degenerate {
    pub reason: String,
}

impl Degenerate {
    fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Degenerate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "degenerate geometry: {}", self.reason)
    }
}

impl std::error::Error for Degenerate {}

/// Document-to-world mapping plus the knobs synthesis reads.
#[derive(Debug, Clone, Copy)]
pub struct SynthesisContext<'a> {
    pub doc_width: f32,
    pub doc_height: f32,
    pub options: &'a ConvertOptions,
}

impl SynthesisContext<'_> {
    /// Centers the document on the origin and flips Y so it points up.
    pub fn to_world(&self, p: Point) -> Vec3 {
        let s = self.options.scale_factor;
        Vec3::new(
            (p.x - self.doc_width / 2.0) * s,
            (self.doc_height / 2.0 - p.y) * s,
            0.0,
        )
    }

    pub fn extrusion_depth(&self, role: Role) -> f32 {
        let options = self.options;
        let base = options.base_depth();
        let multiplier = if options.use_element_specific_treatment {
            role_depth_multiplier(role)
        } else {
            1.0
        };
        let (lo, hi) = options.style_preset.depth_clamp();
        (base * multiplier).clamp(base * lo, base * hi) * options.importance.depth_factor()
    }

    pub fn bevel(&self, role: Role, depth: f32) -> Bevel {
        let preset = self.options.style_preset;
        let (fraction, segments, profile) = if self.options.use_element_specific_treatment {
            bevel_table(role, preset)
        } else {
            generic_bevel(preset)
        };
        Bevel {
            width: depth * fraction,
            segments,
            profile,
        }
    }
}

pub fn role_depth_multiplier(role: Role) -> f32 {
    match role {
        Role::PrimaryNode => 1.0,
        Role::SecondaryNode => 0.7,
        Role::Decoration => 0.5,
        Role::Connector => 0.4,
        Role::Text => 0.3,
    }
}

// (width as a fraction of depth, segments, profile)
fn generic_bevel(preset: StylePreset) -> (f32, u32, f32) {
    match preset {
        StylePreset::Technical => (0.05, 1, 0.5),
        StylePreset::Organic => (0.25, 4, 0.7),
        StylePreset::Professional => (0.1, 2, 0.5),
        StylePreset::Glossy => (0.2, 3, 0.6),
        StylePreset::Metal => (0.08, 2, 0.4),
    }
}

fn bevel_table(role: Role, preset: StylePreset) -> (f32, u32, f32) {
    let (width, segments, profile) = generic_bevel(preset);
    match (role, preset) {
        (Role::PrimaryNode, StylePreset::Professional) => (0.15, 3, 0.5),
        (Role::PrimaryNode, _) => (width, segments, profile),
        (Role::SecondaryNode, _) => (width * 0.8, segments, profile),
        (Role::Connector, StylePreset::Metal) => (0.1, 2, 1.0),
        (Role::Connector, _) => (width * 0.5, segments.max(2), 1.0),
        (Role::Text, StylePreset::Technical) => (0.02, 1, 0.5),
        (Role::Text, _) => (width * 0.4, 1, 0.5),
        (Role::Decoration, _) => (width * 0.6, segments, profile),
    }
}

/// Builds world-space geometry for one classified leaf element.
pub fn synthesize(
    element: &Element,
    role: Role,
    ctx: &SynthesisContext<'_>,
) -> Result<Geometry3D, Degenerate> {
    let depth = ctx.extrusion_depth(role);
    let bevel = ctx.bevel(role, depth);
    let scale = ctx.options.scale_factor;

    let mut skipped_segments = 0;
    let (shape, fill_mode, bevel) = match &element.kind {
        ElementKind::Rect { .. }
        | ElementKind::Circle { .. }
        | ElementKind::Ellipse { .. }
        | ElementKind::Polygon { .. } => {
            let outline = element.outline(ctx.options.corner_segments, ctx.options.circle_segments);
            if outline.len() < 3 || polygon_area(&outline).abs() < MIN_AREA {
                return Err(Degenerate::new("outline encloses no area"));
            }
            let outline = outline.into_iter().map(|p| ctx.to_world(p)).collect();
            (Shape3D::Extrusion { outline }, FillMode::Closed, bevel)
        }
        ElementKind::Line { start, end } => {
            let (quads, skipped) = ribbon(&[*start, *end], element.style.stroke_width, ctx);
            skipped_segments = skipped;
            if quads.is_empty() {
                return Err(Degenerate::new("line has zero length"));
            }
            (Shape3D::Ribbon { quads }, FillMode::Closed, bevel)
        }
        ElementKind::Polyline { points } => {
            let (quads, skipped) = ribbon(points, element.style.stroke_width, ctx);
            skipped_segments = skipped;
            if quads.is_empty() {
                return Err(Degenerate::new("every polyline segment has zero length"));
            }
            (Shape3D::Ribbon { quads }, FillMode::Closed, bevel)
        }
        ElementKind::Text { position, content } => {
            let chars = content.chars().count();
            let font_size = element.style.font_size;
            if chars == 0 || font_size <= 0.0 {
                return Err(Degenerate::new("text has no visible extent"));
            }
            let width = TEXT_ADVANCE * font_size * chars as f32;
            let left = match element.style.text_anchor {
                TextAnchor::Start => position.x,
                TextAnchor::Middle => position.x - width / 2.0,
                TextAnchor::End => position.x - width,
            };
            let center = ctx.to_world(Point::new(left + width / 2.0, position.y - font_size / 2.0));
            (
                Shape3D::Billboard {
                    center,
                    width: width * scale,
                    height: font_size * scale,
                    text: content.clone(),
                },
                FillMode::Closed,
                bevel,
            )
        }
        ElementKind::Path { commands } => {
            let splines = path_splines(commands, ctx);
            if splines.is_empty() {
                return Err(Degenerate::new("path draws no segments"));
            }
            let filled = !matches!(element.style.fill, Paint::None);
            if filled && splines.iter().any(|s| s.closed) {
                (Shape3D::Curves { splines }, FillMode::Closed, bevel)
            } else {
                let stroke_bevel = Bevel {
                    width: element.style.stroke_width * scale / 2.0,
                    ..bevel
                };
                (Shape3D::Curves { splines }, FillMode::Open, stroke_bevel)
            }
        }
        ElementKind::Group { .. } => {
            return Err(Degenerate::new("groups carry no geometry of their own"));
        }
    };

    Ok(Geometry3D {
        shape,
        depth,
        bevel,
        fill_mode,
        skipped_segments,
    })
}

/// Shoelace formula; positive for counter-clockwise in a y-up frame.
fn polygon_area(points: &[Point]) -> f32 {
    let n = points.len();
    let mut sum = 0.0;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        sum += a.x * b.y - b.x * a.y;
    }
    sum / 2.0
}

/// One quad per segment, offset along the segment normal by half the stroke width.
/// Returns the quads and the number of zero-length segments skipped.
fn ribbon(points: &[Point], stroke_width: f32, ctx: &SynthesisContext<'_>) -> (Vec<[Vec3; 4]>, usize) {
    let half = stroke_width.max(0.0) * ctx.options.scale_factor / 2.0;
    let mut quads = Vec::with_capacity(points.len().saturating_sub(1));
    let mut skipped = 0;
    for pair in points.windows(2) {
        if pair[0].distance(pair[1]) < MIN_LENGTH {
            skipped += 1;
            continue;
        }
        let a = ctx.to_world(pair[0]);
        let b = ctx.to_world(pair[1]);
        let dir = b.sub(a).normalized();
        let normal = Vec3::new(-dir.y, dir.x, 0.0).scale(half);
        quads.push([a.add(normal), b.add(normal), b.sub(normal), a.sub(normal)]);
    }
    if skipped > 0 {
        tracing::warn!(skipped, "zero-length stroke segments skipped");
    }
    (quads, skipped)
}

fn straight(a: Point, b: Point) -> CubicSegment {
    CubicSegment {
        start: a,
        cp1: a.lerp(b, 1.0 / 3.0),
        cp2: a.lerp(b, 2.0 / 3.0),
        end: b,
    }
}

struct SplineBuilder {
    segments: Vec<CubicSegment>,
    splines: Vec<(Vec<CubicSegment>, bool)>,
}

impl SplineBuilder {
    fn finish(&mut self, closed: bool) {
        if !self.segments.is_empty() {
            self.splines
                .push((std::mem::take(&mut self.segments), closed));
        }
    }
}

/// One spline per subpath, all segments promoted to cubics in world space.
fn path_splines(commands: &[PathCommand], ctx: &SynthesisContext<'_>) -> Vec<Spline> {
    let mut builder = SplineBuilder {
        segments: Vec::new(),
        splines: Vec::new(),
    };
    let mut cursor = Point::default();
    for cmd in commands {
        match cmd {
            PathCommand::MoveTo(points) => {
                builder.finish(false);
                let mut it = points.iter();
                if let Some(first) = it.next() {
                    cursor = *first;
                }
                for p in it {
                    builder.segments.push(straight(cursor, *p));
                    cursor = *p;
                }
            }
            PathCommand::LineTo(points) => {
                for p in points {
                    builder.segments.push(straight(cursor, *p));
                    cursor = *p;
                }
            }
            PathCommand::CubicCurve(segs) => {
                builder.segments.extend(segs.iter().copied());
                if let Some(last) = segs.last() {
                    cursor = last.end;
                }
            }
            PathCommand::QuadraticCurve(segs) => {
                builder.segments.extend(segs.iter().map(|q| q.to_cubic()));
                if let Some(last) = segs.last() {
                    cursor = last.end;
                }
            }
            PathCommand::Arc(segs) => {
                for seg in segs {
                    match ctx.options.arc_mode {
                        ArcMode::Interpolated => {
                            let samples = interpolated_arc(seg, ctx.options.arc_samples);
                            let mut prev = seg.start;
                            for p in samples {
                                builder.segments.push(straight(prev, p));
                                prev = p;
                            }
                        }
                        ArcMode::CenterSolved => builder
                            .segments
                            .extend(center_solved_arc(seg, ctx.options.arc_samples)),
                    }
                    cursor = seg.end;
                }
            }
            PathCommand::Close => {
                if let Some(first) = builder.segments.first() {
                    cursor = first.start;
                }
                builder.finish(true);
            }
        }
    }
    builder.finish(false);

    builder
        .splines
        .into_iter()
        .map(|(segments, closed)| Spline {
            segments: segments
                .into_iter()
                .map(|s| CurveSegment {
                    start: ctx.to_world(s.start),
                    cp1: ctx.to_world(s.cp1),
                    cp2: ctx.to_world(s.cp2),
                    end: ctx.to_world(s.end),
                })
                .collect(),
            closed,
        })
        .collect()
}

/// Samples a quarter-ellipse spanning the arc's endpoints, ignoring its radii.
/// The sweep flag picks which axis moves first. The last sample is `seg.end`.
pub fn interpolated_arc(seg: &ArcSegment, samples: usize) -> Vec<Point> {
    let n = samples.max(1);
    let dx = seg.end.x - seg.start.x;
    let dy = seg.end.y - seg.start.y;
    (1..=n)
        .map(|i| {
            if i == n {
                return seg.end;
            }
            let angle = FRAC_PI_2 * i as f32 / n as f32;
            let (along, across) = (libm::sinf(angle), 1.0 - libm::cosf(angle));
            let (fx, fy) = if seg.sweep {
                (along, across)
            } else {
                (across, along)
            };
            Point::new(seg.start.x + dx * fx, seg.start.y + dy * fy)
        })
        .collect()
}

/// Endpoint-to-center conversion (SVG 1.1 F.6.5), split into at least `pieces`
/// cubics and never more than a quarter turn per cubic.
pub fn center_solved_arc(seg: &ArcSegment, pieces: usize) -> Vec<CubicSegment> {
    let (x0, y0) = (seg.start.x, seg.start.y);
    let (x1, y1) = (seg.end.x, seg.end.y);
    let mut rx = seg.rx.abs();
    let mut ry = seg.ry.abs();
    if rx == 0.0 || ry == 0.0 || seg.start.distance(seg.end) < MIN_LENGTH {
        return vec![straight(seg.start, seg.end)];
    }

    let phi = seg.rotation.to_radians();
    let sin_phi = libm::sinf(phi);
    let cos_phi = libm::cosf(phi);

    let dx2 = (x0 - x1) / 2.0;
    let dy2 = (y0 - y1) / 2.0;
    let x1p = cos_phi * dx2 + sin_phi * dy2;
    let y1p = -sin_phi * dx2 + cos_phi * dy2;

    // Out-of-range radii scale up uniformly until the endpoints fit.
    let lambda = (x1p * x1p) / (rx * rx) + (y1p * y1p) / (ry * ry);
    if lambda > 1.0 {
        let s = libm::sqrtf(lambda);
        rx *= s;
        ry *= s;
    }

    let rx2 = rx * rx;
    let ry2 = ry * ry;
    let num = rx2 * ry2 - rx2 * y1p * y1p - ry2 * x1p * x1p;
    let den = rx2 * y1p * y1p + ry2 * x1p * x1p;
    let coef = if den != 0.0 {
        let sign = if seg.large_arc == seg.sweep { -1.0 } else { 1.0 };
        sign * libm::sqrtf((num / den).max(0.0))
    } else {
        0.0
    };
    let cxp = coef * (rx * y1p / ry);
    let cyp = coef * (-ry * x1p / rx);

    let cx = cos_phi * cxp - sin_phi * cyp + (x0 + x1) / 2.0;
    let cy = sin_phi * cxp + cos_phi * cyp + (y0 + y1) / 2.0;

    let angle = |ux: f32, uy: f32, vx: f32, vy: f32| {
        libm::atan2f(ux * vy - uy * vx, ux * vx + uy * vy)
    };
    let ux = (x1p - cxp) / rx;
    let uy = (y1p - cyp) / ry;
    let vx = (-x1p - cxp) / rx;
    let vy = (-y1p - cyp) / ry;

    let theta1 = angle(1.0, 0.0, ux, uy);
    let mut dtheta = angle(ux, uy, vx, vy);
    if !seg.sweep && dtheta > 0.0 {
        dtheta -= TAU;
    } else if seg.sweep && dtheta < 0.0 {
        dtheta += TAU;
    }

    let quarter_turns = libm::ceilf(dtheta.abs() / (PI / 2.0)).max(1.0) as usize;
    let count = pieces.max(quarter_turns);
    let delta = dtheta / count as f32;

    let map = |x: f32, y: f32| {
        let x = rx * x;
        let y = ry * y;
        Point::new(
            cx + cos_phi * x - sin_phi * y,
            cy + sin_phi * x + cos_phi * y,
        )
    };

    let mut out = Vec::with_capacity(count);
    let mut start = seg.start;
    for i in 0..count {
        let t1 = theta1 + delta * i as f32;
        let t2 = t1 + delta;
        let k = (4.0 / 3.0) * libm::tanf(delta / 4.0);
        let (s1, c1) = (libm::sinf(t1), libm::cosf(t1));
        let (s2, c2) = (libm::sinf(t2), libm::cosf(t2));
        let end = if i + 1 == count { seg.end } else { map(c2, s2) };
        out.push(CubicSegment {
            start,
            cp1: map(c1 - k * s1, s1 + k * c1),
            cp2: map(c2 + k * s2, s2 - k * c2),
            end,
        });
        start = end;
    }
    out
}

/// Triangle-free polygon mesh: faces are vertex index loops.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Mesh {
    pub vertices: Vec<Vec3>,
    pub faces: Vec<Vec<usize>>,
    pub edges: Vec<[usize; 2]>,
}

impl Mesh {
    /// Prism over a closed outline: bottom cap, top cap, one quad per side.
    fn push_prism(&mut self, outline: &[Vec3], depth: f32) {
        let n = outline.len();
        if n < 3 {
            return;
        }
        // Caps wind counter-clockwise seen from +Z.
        let ccw = signed_area_xy(outline) >= 0.0;
        let ordered: Vec<Vec3> = if ccw {
            outline.to_vec()
        } else {
            outline.iter().rev().copied().collect()
        };
        let base = self.vertices.len();
        self.vertices
            .extend(ordered.iter().map(|p| p.with_z(-depth)));
        self.vertices.extend(ordered.iter().map(|p| p.with_z(depth)));
        self.faces.push((0..n).rev().map(|i| base + i).collect());
        self.faces.push((0..n).map(|i| base + n + i).collect());
        for i in 0..n {
            let j = (i + 1) % n;
            self.faces
                .push(vec![base + i, base + j, base + n + j, base + n + i]);
        }
    }
}

fn signed_area_xy(points: &[Vec3]) -> f32 {
    let n = points.len();
    (0..n)
        .map(|i| {
            let a = points[i];
            let b = points[(i + 1) % n];
            a.x * b.y - b.x * a.y
        })
        .sum::<f32>()
        / 2.0
}

impl Geometry3D {
    /// World-space bounds; Z always spans `[-depth, depth]`.
    pub fn bounds(&self) -> Aabb {
        let mut out = Aabb::empty();
        let mut include = |p: Vec3| {
            out.include(p.with_z(-self.depth));
            out.include(p.with_z(self.depth));
        };
        match &self.shape {
            Shape3D::Extrusion { outline } => outline.iter().copied().for_each(&mut include),
            Shape3D::Ribbon { quads } => quads.iter().flatten().copied().for_each(&mut include),
            Shape3D::Curves { splines } => splines
                .iter()
                .flat_map(|s| s.segments.iter())
                .flat_map(|s| [s.start, s.cp1, s.cp2, s.end])
                .for_each(&mut include),
            Shape3D::Billboard {
                center,
                width,
                height,
                ..
            } => {
                let half = Vec3::new(width / 2.0, height / 2.0, 0.0);
                include(center.sub(half));
                include(center.add(half));
            }
        }
        out
    }

    /// Tessellates solids into prisms. Curves yield their control polygon as edges
    /// and billboards a single quad.
    pub fn to_mesh(&self) -> Mesh {
        let mut mesh = Mesh::default();
        match &self.shape {
            Shape3D::Extrusion { outline } => mesh.push_prism(outline, self.depth),
            Shape3D::Ribbon { quads } => {
                for quad in quads {
                    mesh.push_prism(quad, self.depth);
                }
            }
            Shape3D::Curves { splines } => {
                for spline in splines {
                    let first = mesh.vertices.len();
                    for (i, seg) in spline.segments.iter().enumerate() {
                        if i == 0 {
                            mesh.vertices.push(seg.start);
                        }
                        mesh.vertices.extend([seg.cp1, seg.cp2, seg.end]);
                    }
                    let last = mesh.vertices.len();
                    for i in first..last.saturating_sub(1) {
                        mesh.edges.push([i, i + 1]);
                    }
                }
            }
            Shape3D::Billboard {
                center,
                width,
                height,
                ..
            } => {
                let (hw, hh) = (width / 2.0, height / 2.0);
                mesh.vertices.extend([
                    center.add(Vec3::new(-hw, -hh, 0.0)),
                    center.add(Vec3::new(hw, -hh, 0.0)),
                    center.add(Vec3::new(hw, hh, 0.0)),
                    center.add(Vec3::new(-hw, hh, 0.0)),
                ]);
                mesh.faces.push(vec![0, 1, 2, 3]);
            }
        }
        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{DEFAULT_PRIMARY_THRESHOLD, classify_document};
    use crate::element::parse_document;
    use crate::options::{DepthProfile, Importance};

    fn synth_all(svg: &str, options: &ConvertOptions) -> Vec<Result<Geometry3D, Degenerate>> {
        let doc = parse_document(svg).unwrap();
        let ctx = SynthesisContext {
            doc_width: doc.width,
            doc_height: doc.height,
            options,
        };
        classify_document(&doc.elements, DEFAULT_PRIMARY_THRESHOLD)
            .iter()
            .map(|c| synthesize(c.element, c.role, &ctx))
            .collect()
    }

    fn synth_one(svg: &str) -> Geometry3D {
        synth_all(svg, &ConvertOptions::default())
            .remove(0)
            .unwrap()
    }

    fn near(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn world_mapping_centers_and_flips_y() {
        let options = ConvertOptions::default();
        let ctx = SynthesisContext {
            doc_width: 100.0,
            doc_height: 100.0,
            options: &options,
        };
        let w = ctx.to_world(Point::new(20.0, 20.0));
        assert!(near(w.x, -0.3) && near(w.y, 0.3) && w.z == 0.0);
    }

    #[test]
    fn rect_becomes_closed_extrusion_at_expected_center() {
        let g = synth_one(r#"<svg viewBox="0 0 100 100"><rect x="10" y="10" width="20" height="20"/></svg>"#);
        assert_eq!(g.fill_mode, FillMode::Closed);
        let center = g.bounds().center();
        assert!(near(center.x, -0.3) && near(center.y, 0.3) && near(center.z, 0.0));
    }

    #[test]
    fn depth_follows_role_multiplier_order() {
        let options = ConvertOptions {
            style_preset: StylePreset::Organic,
            ..ConvertOptions::default()
        };
        let doc = r#"<svg viewBox="0 0 400 400">
            <rect width="100" height="100"/>
            <rect width="10" height="10"/>
            <path d="M0 0 L50 50 Z"/>
            <line x2="40"/>
            <text>label</text>
        </svg>"#;
        let depths: Vec<f32> = synth_all(doc, &options)
            .into_iter()
            .map(|g| g.unwrap().depth)
            .collect();
        assert_eq!(depths.len(), 5);
        for pair in depths.windows(2) {
            assert!(pair[0] > pair[1], "{depths:?}");
        }
        assert!(near(depths[0], 0.1));
        assert!(near(depths[4], 0.03));
    }

    #[test]
    fn depth_is_clamped_then_scaled_by_importance() {
        let options = ConvertOptions {
            style_preset: StylePreset::Technical,
            importance: Importance::High,
            ..ConvertOptions::default()
        };
        let ctx = SynthesisContext {
            doc_width: 10.0,
            doc_height: 10.0,
            options: &options,
        };
        // Text: 0.3 clamps up to the technical floor of 0.4, then x1.2.
        assert!(near(ctx.extrusion_depth(Role::Text), 0.1 * 0.4 * 1.2));
        assert!(near(ctx.extrusion_depth(Role::PrimaryNode), 0.12));
    }

    #[test]
    fn low_importance_flattens_every_role() {
        let normal = ConvertOptions::default();
        let low = ConvertOptions {
            importance: Importance::Low,
            ..ConvertOptions::default()
        };
        let normal = SynthesisContext {
            doc_width: 10.0,
            doc_height: 10.0,
            options: &normal,
        };
        let low = SynthesisContext {
            options: &low,
            ..normal
        };
        assert!(near(low.extrusion_depth(Role::PrimaryNode), 0.075));
        assert!(near(low.extrusion_depth(Role::SecondaryNode), 0.07 * 0.75));
        for role in Role::ALL {
            assert!(near(
                low.extrusion_depth(role),
                normal.extrusion_depth(role) * 0.75
            ));
        }
    }

    #[test]
    fn generic_treatment_ignores_roles() {
        let options = ConvertOptions {
            use_element_specific_treatment: false,
            depth_profile: DepthProfile::ClarityPreserving,
            ..ConvertOptions::default()
        };
        let ctx = SynthesisContext {
            doc_width: 10.0,
            doc_height: 10.0,
            options: &options,
        };
        for role in Role::ALL {
            assert_eq!(ctx.extrusion_depth(role), 0.0005);
            assert_eq!(ctx.bevel(role, 1.0), ctx.bevel(Role::PrimaryNode, 1.0));
        }
    }

    #[test]
    fn circle_is_segmented_ngon() {
        let g = synth_one(r#"<svg viewBox="0 0 100 100"><circle cx="50" cy="50" r="10"/></svg>"#);
        match &g.shape {
            Shape3D::Extrusion { outline } => assert_eq!(outline.len(), 32),
            other => panic!("unexpected {other:?}"),
        }
        let b = g.bounds();
        assert!(near(b.size().x, 0.2) && near(b.size().y, 0.2));
    }

    #[test]
    fn polyline_skips_zero_length_segments() {
        let g = synth_one(r#"<svg><polyline points="0,0 0,0 10,0" stroke-width="4"/></svg>"#);
        assert_eq!(g.skipped_segments, 1);
        match &g.shape {
            Shape3D::Ribbon { quads } => {
                assert_eq!(quads.len(), 1);
                // Half stroke width each side: 4 * 0.01 / 2.
                assert!(near(quads[0][0].y - quads[0][3].y, 0.04));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn fully_degenerate_polyline_is_rejected() {
        let results = synth_all(
            r#"<svg><polyline points="3,3 3,3 3,3"/></svg>"#,
            &ConvertOptions::default(),
        );
        assert!(results[0].is_err());
    }

    #[test]
    fn zero_size_rect_is_degenerate() {
        let results = synth_all(r#"<svg><rect width="0" height="10"/></svg>"#, &ConvertOptions::default());
        assert!(results[0].is_err());
    }

    #[test]
    fn text_placeholder_size_and_anchor() {
        let g = synth_one(
            r#"<svg viewBox="0 0 100 100"><text x="50" y="50" font-size="10" text-anchor="middle">abcd</text></svg>"#,
        );
        match &g.shape {
            Shape3D::Billboard {
                center,
                width,
                height,
                ..
            } => {
                assert!(near(*width, 0.24));
                assert!(near(*height, 0.1));
                assert!(near(center.x, 0.0));
                assert!(near(center.y, 0.05));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn filled_closed_path_is_closed_and_stroked_path_is_open() {
        let options = ConvertOptions::default();
        let results = synth_all(
            r#"<svg><path d="M0 0 L10 0 L10 10 Z"/><path d="M0 0 Q5 5 10 0" fill="none" stroke-width="2"/></svg>"#,
            &options,
        );
        let closed = results[0].as_ref().unwrap();
        assert_eq!(closed.fill_mode, FillMode::Closed);
        match &closed.shape {
            Shape3D::Curves { splines } => {
                assert_eq!(splines.len(), 1);
                assert!(splines[0].closed);
                assert_eq!(splines[0].segments.len(), 3);
            }
            other => panic!("unexpected {other:?}"),
        }
        let open = results[1].as_ref().unwrap();
        assert_eq!(open.fill_mode, FillMode::Open);
        assert!(near(open.bevel.width, 0.01));
    }

    #[test]
    fn quadratic_controls_are_elevated() {
        let g = synth_one(r#"<svg viewBox="0 0 300 300"><path d="M0 0 Q150 300 300 0" fill="none"/></svg>"#);
        let Shape3D::Curves { splines } = &g.shape else {
            panic!("expected curves");
        };
        let seg = splines[0].segments[0];
        let options = ConvertOptions::default();
        let ctx = SynthesisContext {
            doc_width: 300.0,
            doc_height: 300.0,
            options: &options,
        };
        let cp1 = ctx.to_world(Point::new(100.0, 200.0));
        let cp2 = ctx.to_world(Point::new(200.0, 200.0));
        assert!(near(seg.cp1.x, cp1.x) && near(seg.cp1.y, cp1.y));
        assert!(near(seg.cp2.x, cp2.x) && near(seg.cp2.y, cp2.y));
    }

    #[test]
    fn interpolated_arc_samples_quarter_ellipse() {
        let seg = ArcSegment {
            start: Point::new(0.0, 0.0),
            end: Point::new(10.0, 10.0),
            rx: 10.0,
            ry: 10.0,
            rotation: 0.0,
            large_arc: false,
            sweep: true,
        };
        let samples = interpolated_arc(&seg, 4);
        assert_eq!(samples.len(), 4);
        assert_eq!(samples[3], seg.end);
        // Monotone in both axes, x leading under sweep.
        for pair in samples.windows(2) {
            assert!(pair[1].x >= pair[0].x && pair[1].y >= pair[0].y);
        }
        assert!(samples[0].x > samples[0].y);
    }

    #[test]
    fn center_solved_semicircle_stays_on_circle() {
        let seg = ArcSegment {
            start: Point::new(0.0, 0.0),
            end: Point::new(20.0, 0.0),
            rx: 10.0,
            ry: 10.0,
            rotation: 0.0,
            large_arc: false,
            sweep: true,
        };
        let cubics = center_solved_arc(&seg, 4);
        assert_eq!(cubics.len(), 4);
        assert_eq!(cubics[0].start, seg.start);
        assert_eq!(cubics[3].end, seg.end);
        for c in &cubics {
            let r = c.end.distance(Point::new(10.0, 0.0));
            assert!((r - 10.0).abs() < 1e-3, "{r}");
        }
    }

    #[test]
    fn arc_modes_both_reach_the_endpoint() {
        let svg = r#"<svg viewBox="0 0 100 100"><path d="M10 50 A20 20 0 0 1 50 50" fill="none"/></svg>"#;
        for mode in [ArcMode::Interpolated, ArcMode::CenterSolved] {
            let options = ConvertOptions {
                arc_mode: mode,
                ..ConvertOptions::default()
            };
            let g = synth_all(svg, &options).remove(0).unwrap();
            let Shape3D::Curves { splines } = &g.shape else {
                panic!("expected curves");
            };
            let last = splines[0].segments.last().unwrap();
            assert!(near(last.end.x, 0.0) && near(last.end.y, 0.0), "{mode:?}");
            assert_eq!(splines[0].segments.len(), 4);
        }
    }

    #[test]
    fn extrusion_mesh_is_a_closed_prism() {
        let g = synth_one(r#"<svg><rect width="10" height="10"/></svg>"#);
        let mesh = g.to_mesh();
        assert_eq!(mesh.vertices.len(), 8);
        assert_eq!(mesh.faces.len(), 6);
        assert!(mesh.vertices.iter().all(|v| near(v.z.abs(), g.depth)));
    }

    #[test]
    fn curve_mesh_is_control_polygon() {
        let g = synth_one(r#"<svg><path d="M0 0 C1 1 2 1 3 0" fill="none"/></svg>"#);
        let mesh = g.to_mesh();
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.edges, vec![[0, 1], [1, 2], [2, 3]]);
        assert!(mesh.faces.is_empty());
    }
}
