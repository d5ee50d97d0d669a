mod adapter;
mod classify;
mod debug;
mod element;
mod error;
mod geometry;
mod material;
mod options;
mod path;
mod scene;
mod style;
mod transform;
mod types;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use debug::{DebugLogger, DebugScope};
use serde_json::json;

pub use adapter::{JsonSceneAdapter, SCENE_FORMAT, SCENE_FORMAT_VERSION, SceneAdapter};
pub use classify::{Classified, DEFAULT_PRIMARY_THRESHOLD, Role, classify, classify_document};
pub use element::{Element, ElementKind, ParsedDocument, parse_document};
pub use error::{ConvertError, Diagnostic, DiagnosticKind};
pub use geometry::{
    Bevel, CurveSegment, Degenerate, FillMode, Geometry3D, Mesh, Shape3D, Spline,
    SynthesisContext, synthesize,
};
pub use material::{Material, MaterialCache, assign};
pub use options::{
    ArcMode, CameraMode, ConvertOptions, DepthProfile, Importance, ParseOptionError, StylePreset,
};
pub use path::{
    ArcSegment, CubicSegment, PathCommand, PathCommands, PathError, QuadSegment, parse_path,
};
pub use scene::{
    Camera, Light, LightKind, Projection, SceneDescription, SceneObject, compose, scene_bounds,
};
pub use style::{Paint, Style, TextAnchor};
pub use transform::{Matrix, TransformParseError, apply, parse_transform, try_parse_transform};
pub use types::{Aabb, Color, Point, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionStatus {
    /// Every drawable element became a scene object.
    Complete,
    /// A scene was produced but some elements were skipped or repaired.
    Partial,
    /// Nothing synthesizable; the scene holds only framing.
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub scene: SceneDescription,
    pub diagnostics: Vec<Diagnostic>,
    pub unsupported_tags: std::collections::BTreeMap<String, usize>,
    pub status: ConversionStatus,
}

impl Conversion {
    pub fn unsupported_tag_count(&self) -> usize {
        self.unsupported_tags.values().sum()
    }
}

/// Compiles SVG documents into scene descriptions. Cheap to share across threads.
pub struct Converter {
    options: ConvertOptions,
    pool: Arc<rayon::ThreadPool>,
    debug: Option<Arc<DebugLogger>>,
}

impl Converter {
    pub fn builder() -> ConverterBuilder {
        ConverterBuilder::new()
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    pub fn convert(&self, svg: &str) -> Result<Conversion, ConvertError> {
        self.convert_inner(svg, None)
    }

    /// Like `convert`, but gives up with `ConvertError::Cancelled` once `cancel` is set.
    /// The flag is polled between elements.
    pub fn convert_with_cancel(
        &self,
        svg: &str,
        cancel: &AtomicBool,
    ) -> Result<Conversion, ConvertError> {
        self.convert_inner(svg, Some(cancel))
    }

    // Parallel batch conversion on the converter's pool; results keep input order.
    pub fn convert_many<S>(&self, documents: &[S]) -> Vec<Result<Conversion, ConvertError>>
    where
        S: AsRef<str> + Sync,
    {
        use rayon::prelude::*;

        let mut results: Vec<(usize, Result<Conversion, ConvertError>)> =
            self.pool.install(|| {
                documents
                    .par_iter()
                    .enumerate()
                    .map(|(idx, svg)| (idx, self.convert_inner(svg.as_ref(), None)))
                    .collect()
            });
        results.sort_by_key(|(idx, _)| *idx);
        results.into_iter().map(|(_, res)| res).collect()
    }

    fn convert_inner(
        &self,
        svg: &str,
        cancel: Option<&AtomicBool>,
    ) -> Result<Conversion, ConvertError> {
        let options = &self.options;
        let mut debug = self.debug.as_deref().map(DebugLogger::scope);
        if let Some(scope) = &debug {
            scope.log_event(
                "convert.start",
                json!({
                    "bytes": svg.len(),
                    "preset": options.style_preset.as_str(),
                    "depth_profile": options.depth_profile.as_str(),
                }),
            );
        }

        let doc = element::parse_document_cancellable(svg, cancel)?;
        let mut diagnostics = doc.diagnostics.clone();
        if let Some(scope) = debug.as_mut() {
            for d in &diagnostics {
                scope.log_event("element.skipped", json!(d));
                scope.increment(&format!("diagnostic.{}", d.kind.as_str()), 1);
            }
        }

        let classified = classify_document(&doc.elements, options.primary_threshold);
        let ctx = SynthesisContext {
            doc_width: doc.width,
            doc_height: doc.height,
            options,
        };
        let mut materials = MaterialCache::new(options.style_preset);
        let mut objects = Vec::with_capacity(classified.len());

        for item in &classified {
            if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                return Err(ConvertError::Cancelled);
            }
            let element = item.element;
            match synthesize(element, item.role, &ctx) {
                Ok(geometry) => {
                    if geometry.skipped_segments > 0 {
                        diagnostics.push(degenerate(
                            debug.as_mut(),
                            element,
                            format!(
                                "{} zero-length segment(s) skipped",
                                geometry.skipped_segments
                            ),
                        ));
                    }
                    let material = materials.material_for(&element.style, item.role);
                    let name = element
                        .id
                        .clone()
                        .unwrap_or_else(|| format!("{}_{}", element.tag, item.depth_index));
                    tracing::debug!(
                        name = %name,
                        role = item.role.as_str(),
                        material,
                        depth = geometry.depth,
                        "synthesized object"
                    );
                    if let Some(scope) = debug.as_mut() {
                        scope.increment(&format!("role.{}", item.role.as_str()), 1);
                    }
                    objects.push(SceneObject {
                        name,
                        role: item.role,
                        material,
                        geometry,
                    });
                }
                Err(err) => {
                    diagnostics.push(degenerate(debug.as_mut(), element, err.reason));
                }
            }
        }

        let status = if objects.is_empty() {
            ConversionStatus::Empty
        } else if diagnostics.is_empty() {
            ConversionStatus::Complete
        } else {
            ConversionStatus::Partial
        };
        let material_hits = materials.hits();
        let scene = compose(objects, materials.into_materials(), options);

        if let Some(scope) = debug {
            scope.log_event(
                "convert.finish",
                json!({
                    "status": status,
                    "objects": scene.objects.len(),
                    "materials": scene.materials.len(),
                    "material_cache_hits": material_hits,
                    "diagnostics": diagnostics.len(),
                    "unsupported_tags": &doc.unsupported_tags,
                }),
            );
            scope.finish("convert");
        }

        Ok(Conversion {
            scene,
            diagnostics,
            unsupported_tags: doc.unsupported_tags,
            status,
        })
    }
}

fn degenerate(
    debug: Option<&mut DebugScope<'_>>,
    element: &Element,
    message: String,
) -> Diagnostic {
    let diagnostic = Diagnostic::new(
        DiagnosticKind::GeometryDegenerate,
        element.tag.as_str(),
        element.id.as_deref(),
        message,
    );
    tracing::warn!(
        kind = diagnostic.kind.as_str(),
        tag = %diagnostic.tag,
        id = ?diagnostic.id,
        "{}",
        diagnostic.message
    );
    if let Some(scope) = debug {
        scope.log_event("geometry.degenerate", json!(&diagnostic));
        scope.increment("diagnostic.geometry_degenerate", 1);
    }
    diagnostic
}

pub struct ConverterBuilder {
    options: ConvertOptions,
    threads: Option<usize>,
    debug_path: Option<PathBuf>,
}

impl Default for ConverterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConverterBuilder {
    pub fn new() -> Self {
        Self {
            options: ConvertOptions::default(),
            threads: None,
            debug_path: None,
        }
    }

    /// Replaces every option at once.
    pub fn options(mut self, options: ConvertOptions) -> Self {
        self.options = options;
        self
    }

    pub fn scale_factor(mut self, scale: f32) -> Self {
        self.options.scale_factor = scale;
        self
    }

    pub fn depth_profile(mut self, profile: DepthProfile) -> Self {
        self.options.depth_profile = profile;
        self
    }

    pub fn base_extrude_depth(mut self, depth: f32) -> Self {
        self.options.base_extrude_depth = Some(depth);
        self
    }

    pub fn style_preset(mut self, preset: StylePreset) -> Self {
        self.options.style_preset = preset;
        self
    }

    pub fn importance(mut self, importance: Importance) -> Self {
        self.options.importance = importance;
        self
    }

    pub fn use_element_specific_treatment(mut self, enabled: bool) -> Self {
        self.options.use_element_specific_treatment = enabled;
        self
    }

    pub fn primary_threshold(mut self, threshold: f32) -> Self {
        self.options.primary_threshold = threshold;
        self
    }

    pub fn corner_segments(mut self, segments: usize) -> Self {
        self.options.corner_segments = segments;
        self
    }

    pub fn circle_segments(mut self, segments: usize) -> Self {
        self.options.circle_segments = segments;
        self
    }

    pub fn arc_samples(mut self, samples: usize) -> Self {
        self.options.arc_samples = samples;
        self
    }

    pub fn arc_mode(mut self, mode: ArcMode) -> Self {
        self.options.arc_mode = mode;
        self
    }

    pub fn camera_mode(mut self, mode: CameraMode) -> Self {
        self.options.camera_mode = mode;
        self
    }

    /// Worker count for `convert_many`; rayon's default when unset.
    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    // JSONL event log shared by every conversion of the built converter.
    pub fn debug_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.debug_path = Some(path.into());
        self
    }

    pub fn build(self) -> Result<Converter, ConvertError> {
        self.options.validate()?;
        if self.threads == Some(0) {
            return Err(ConvertError::InvalidConfiguration(
                "threads must be at least 1".to_string(),
            ));
        }

        let mut pool = rayon::ThreadPoolBuilder::new();
        if let Some(threads) = self.threads {
            pool = pool.num_threads(threads);
        }
        let pool = pool
            .build()
            .map_err(|err| ConvertError::InvalidConfiguration(err.to_string()))?;

        let debug = match self.debug_path {
            Some(path) => Some(Arc::new(DebugLogger::new(path)?)),
            None => None,
        };

        Ok(Converter {
            options: self.options,
            pool: Arc::new(pool),
            debug,
        })
    }
}
