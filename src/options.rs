use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::ConvertError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StylePreset {
    Technical,
    Organic,
    Professional,
    Glossy,
    Metal,
}

impl StylePreset {
    pub const ALL: [StylePreset; 5] = [
        StylePreset::Technical,
        StylePreset::Organic,
        StylePreset::Professional,
        StylePreset::Glossy,
        StylePreset::Metal,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StylePreset::Technical => "technical",
            StylePreset::Organic => "organic",
            StylePreset::Professional => "professional",
            StylePreset::Glossy => "glossy",
            StylePreset::Metal => "metal",
        }
    }

    /// Allowed extrusion depth, as `(min, max)` multiples of the base depth.
    pub fn depth_clamp(self) -> (f32, f32) {
        match self {
            StylePreset::Technical => (0.4, 1.0),
            StylePreset::Organic => (0.3, 1.5),
            StylePreset::Professional => (0.4, 1.2),
            StylePreset::Glossy => (0.3, 1.3),
            StylePreset::Metal => (0.5, 1.2),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Importance {
    Low,
    Normal,
    High,
}

impl Importance {
    pub fn as_str(self) -> &'static str {
        match self {
            Importance::Low => "low",
            Importance::Normal => "normal",
            Importance::High => "high",
        }
    }

    pub fn depth_factor(self) -> f32 {
        match self {
            Importance::Low => 0.75,
            Importance::Normal => 1.0,
            Importance::High => 1.2,
        }
    }
}

/// Named families of base extrusion depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DepthProfile {
    Technical,
    /// Keeps extrusion and bevels as small as possible so the diagram reads flat.
    ClarityPreserving,
}

impl DepthProfile {
    pub fn as_str(self) -> &'static str {
        match self {
            DepthProfile::Technical => "technical",
            DepthProfile::ClarityPreserving => "clarity_preserving",
        }
    }

    pub fn base_depth(self) -> f32 {
        match self {
            DepthProfile::Technical => 0.1,
            DepthProfile::ClarityPreserving => 0.0005,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraMode {
    /// Orthographic for technical and professional presets, perspective otherwise.
    Auto,
    Orthographic,
    Perspective,
    Cinematic,
}

impl CameraMode {
    pub fn as_str(self) -> &'static str {
        match self {
            CameraMode::Auto => "auto",
            CameraMode::Orthographic => "orthographic",
            CameraMode::Perspective => "perspective",
            CameraMode::Cinematic => "cinematic",
        }
    }

    pub fn resolve(self, preset: StylePreset) -> CameraMode {
        match (self, preset) {
            (CameraMode::Auto, StylePreset::Technical | StylePreset::Professional) => {
                CameraMode::Orthographic
            }
            (CameraMode::Auto, _) => CameraMode::Perspective,
            (mode, _) => mode,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArcMode {
    /// Samples a quarter-ellipse interpolated between the arc's endpoints.
    Interpolated,
    /// Endpoint-to-center conversion (SVG 1.1 F.6.5), then sampled.
    CenterSolved,
}

impl ArcMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ArcMode::Interpolated => "interpolated",
            ArcMode::CenterSolved => "center_solved",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptionError {
    pub kind: &'static str,
    pub input: String,
}

impl fmt::Display for ParseOptionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {} '{}'", self.kind, self.input)
    }
}

impl std::error::Error for ParseOptionError {}

macro_rules! from_str_via_as_str {
    ($ty:ty, $kind:literal, [$($variant:expr),+ $(,)?]) => {
        impl FromStr for $ty {
            type Err = ParseOptionError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
                [$($variant),+]
                    .into_iter()
                    .find(|v| v.as_str() == wanted)
                    .ok_or_else(|| ParseOptionError {
                        kind: $kind,
                        input: s.to_string(),
                    })
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

from_str_via_as_str!(
    StylePreset,
    "style preset",
    [
        StylePreset::Technical,
        StylePreset::Organic,
        StylePreset::Professional,
        StylePreset::Glossy,
        StylePreset::Metal,
    ]
);
from_str_via_as_str!(
    Importance,
    "importance",
    [Importance::Low, Importance::Normal, Importance::High]
);
from_str_via_as_str!(
    DepthProfile,
    "depth profile",
    [DepthProfile::Technical, DepthProfile::ClarityPreserving]
);
from_str_via_as_str!(
    CameraMode,
    "camera mode",
    [
        CameraMode::Auto,
        CameraMode::Orthographic,
        CameraMode::Perspective,
        CameraMode::Cinematic,
    ]
);
from_str_via_as_str!(
    ArcMode,
    "arc mode",
    [ArcMode::Interpolated, ArcMode::CenterSolved]
);

/// Knobs for one conversion. Built through `ConverterBuilder`; `Default` gives the
/// reference configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertOptions {
    pub scale_factor: f32,
    pub depth_profile: DepthProfile,
    pub base_extrude_depth: Option<f32>,
    pub style_preset: StylePreset,
    pub importance: Importance,
    pub use_element_specific_treatment: bool,
    pub primary_threshold: f32,
    pub corner_segments: usize,
    pub circle_segments: usize,
    pub arc_samples: usize,
    pub arc_mode: ArcMode,
    pub camera_mode: CameraMode,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            scale_factor: 0.01,
            depth_profile: DepthProfile::Technical,
            base_extrude_depth: None,
            style_preset: StylePreset::Technical,
            importance: Importance::Normal,
            use_element_specific_treatment: true,
            primary_threshold: 50.0,
            corner_segments: 8,
            circle_segments: 32,
            arc_samples: 4,
            arc_mode: ArcMode::Interpolated,
            camera_mode: CameraMode::Auto,
        }
    }
}

impl ConvertOptions {
    /// Explicit override, else the depth profile's value.
    pub fn base_depth(&self) -> f32 {
        self.base_extrude_depth
            .unwrap_or_else(|| self.depth_profile.base_depth())
    }

    pub fn validate(&self) -> Result<(), ConvertError> {
        let invalid = |msg: String| Err(ConvertError::InvalidConfiguration(msg));
        if !(self.scale_factor.is_finite() && self.scale_factor > 0.0) {
            return invalid(format!(
                "scale_factor must be positive, got {}",
                self.scale_factor
            ));
        }
        if let Some(depth) = self.base_extrude_depth {
            if !(depth.is_finite() && depth >= 0.0) {
                return invalid(format!(
                    "base_extrude_depth must be non-negative, got {}",
                    depth
                ));
            }
        }
        if !(self.primary_threshold.is_finite() && self.primary_threshold >= 0.0) {
            return invalid(format!(
                "primary_threshold must be non-negative, got {}",
                self.primary_threshold
            ));
        }
        if self.corner_segments < 1 {
            return invalid("corner_segments must be at least 1".to_string());
        }
        if self.circle_segments < 3 {
            return invalid(format!(
                "circle_segments must be at least 3, got {}",
                self.circle_segments
            ));
        }
        if self.arc_samples < 1 {
            return invalid("arc_samples must be at least 1".to_string());
        }
        Ok(())
    }
}
